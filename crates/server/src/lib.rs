//! Seven request layer.
//!
//! Maps JSON requests onto the progress engine and task catalog, and
//! serves them over stdio or a Unix socket.

#![warn(missing_docs)]

pub mod api;
pub mod config;
pub mod server;

pub use api::{Api, ApiError, ApiRequest, ApiResponse, Route};
pub use config::{ServerConfig, DEFAULT_ALLOWED_ORIGINS};
pub use server::{serve_lines, Server};
