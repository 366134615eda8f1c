//! Logger module
//!
//! Logging for the asset server:
//! - Server lifecycle logging
//! - Served-asset lines with outcome and elapsed time
//! - Error and warning logging
//! - File-based logging support
//!
//! Before [`init`] runs, everything goes to stdout/stderr.

mod format;
pub mod writer;

pub use format::{LogFormat, ServedEntry};
pub use writer::LogOptions;

use crate::config::Config;
use std::net::SocketAddr;
use std::time::Duration;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(&LogOptions {
        access_log_file: config.logging.access_log_file.as_deref(),
        error_log_file: config.logging.error_log_file.as_deref(),
        access_log: config.logging.access_log,
        format: LogFormat::parse(&config.logging.format),
    })
}

/// Write to info/access log
pub fn write_info(message: &str) {
    match writer::get() {
        Some(w) => w.write_access(message),
        None => println!("{message}"),
    }
}

/// Write to error log
pub fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    write_info("======================================");
    write_info("Asset server started");
    write_info(&format!("Listening on: http://{addr}{}", config.assets.prefix));
    write_info(&format!("Asset root: {}", config.assets.root));
    write_info(&format!("Log level: {}", config.logging.level));
    if let Some(workers) = config.server.workers {
        write_info(&format!("Worker threads: {workers}"));
    }
    if let Some(ref path) = config.logging.access_log_file {
        write_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(&format!("Error log: {path}"));
    }
    write_info("======================================");
}

pub fn log_info(message: &str) {
    write_info(&format!("[INFO] {message}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(&format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(&format!("[WARN] {message}"));
}

/// Log a finished asset request
pub fn log_served(path: &str, status: u16, outcome: &str, elapsed: Duration) {
    let entry = ServedEntry::new(path, status, outcome, elapsed);
    match writer::get() {
        Some(w) if w.access_log() => w.write_access(&entry.format(w.format())),
        Some(_) => {}
        None => println!("{}", entry.format(LogFormat::Text)),
    }
}
