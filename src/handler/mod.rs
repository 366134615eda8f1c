//! Request handler module
//!
//! The asset delivery state machine, its in-band error rendering, and the
//! hyper-facing router that feeds it.

pub mod assets;
pub mod error_page;
pub mod request;
pub mod router;

// Re-export main entry points
pub use assets::{call, Outcome};
pub use error_page::ErrorRendering;
pub use request::AssetRequest;
pub use router::handle_request;
