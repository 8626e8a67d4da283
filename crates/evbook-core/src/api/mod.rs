//! REST API client for the charging service.
//!
//! Every call goes through the same pipeline: the request augmenter attaches
//! the bearer token, and the response guard ends the session when a guarded
//! endpoint answers 401.

pub mod client;
pub mod error;

pub use client::{ApiClient, ClientSettings};
pub use error::ApiError;
