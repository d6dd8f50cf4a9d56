//! HTTP middleware module.
//!
//! ```ignore
//! use axum_helpers::http::create_cors_layer;
//!
//! let app = Router::new().layer(create_cors_layer(&cors_config)?);
//! ```

pub mod cors;

pub use cors::{create_cors_layer, create_permissive_cors_layer};
