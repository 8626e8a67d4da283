//! Authentication: the session and the store that owns it.
//!
//! This module provides:
//! - `Session` / `User`: the authenticated identity of this client
//! - `SessionStore`: login, signup and logout, mirrored into persisted storage
//! - `AuthPayload`: normalization of the two response shapes the auth API returns
//! - `AuthApi`: the seam through which the store reaches the network

pub mod error;
pub mod payload;
pub mod session;

pub use error::{AuthError, AuthOperation};
pub use payload::{AuthPayload, AuthRequest};
pub use session::{Session, SessionStore, User};

use async_trait::async_trait;

/// Transport used by [`SessionStore`] to reach the authentication endpoints.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn authenticate(&self, request: &AuthRequest) -> Result<AuthPayload, AuthError>;
}
