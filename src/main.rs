use std::path::Path;
use std::sync::Arc;

use assetd::asset::Resolver;
use assetd::config::{self, AppState};
use assetd::{logger, server};

const LISTEN_BACKLOG: i32 = 1024;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config::DEFAULT_CONFIG_PATH.to_string());
    let cfg = config::Config::load_from(&config_path)?;
    logger::init(&cfg)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let state = Arc::new(AppState::new(&cfg));

    if let Some(index_file) = cfg.assets.index_file.as_deref() {
        load_index(&state, Path::new(index_file));
    }

    let listener = server::create_reusable_listener(addr, LISTEN_BACKLOG)?;
    logger::log_server_start(&addr, &cfg);

    let shutdown = Arc::new(server::ShutdownSignal::new());
    server::start_signal_handler(Arc::clone(&shutdown));
    server::run(listener, Arc::clone(&state), shutdown).await;

    if let Some(index_file) = cfg.assets.index_file.as_deref() {
        match state.environment.save_index(Path::new(index_file)) {
            Ok(count) => logger::log_info(&format!("Saved {count} snapshots to {index_file}")),
            Err(e) => logger::log_error(&format!("Failed to save snapshot index: {e}")),
        }
    }
    Ok(())
}

fn load_index(state: &AppState, path: &Path) {
    if !path.exists() {
        return;
    }
    match state.environment.load_index(path) {
        Ok(count) => logger::log_info(&format!(
            "Loaded {count} snapshots from {}",
            path.display()
        )),
        Err(e) => {
            logger::log_warning(&format!("Ignoring snapshot index: {e}"));
            state.environment.expire_index();
        }
    }
}
