//! HTTP protocol layer module
//!
//! Conditional caching, content types, bodies and response builders, kept
//! apart from the request state machine that drives them.

pub mod body;
pub mod cache;
pub mod mime;
pub mod response;

// Re-export commonly used types
pub use body::AssetBody;
pub use response::{
    build_304_response, build_403_response, build_404_response, build_405_response,
    build_500_response, build_asset_response, build_options_response, build_rendered_response,
};
