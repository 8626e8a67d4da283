//! The request pipeline around every API call.
//!
//! - `RequestAugmenter` attaches the bearer credential before a request
//! - `ResponseGuard` inspects the result and ends the session on a 401
//!   from a guarded endpoint, at most once per cooldown window
//! - `SessionTerminator` clears the session and schedules the redirect
//! - `Navigator` / `Router` represent the current view

pub mod augmenter;
pub mod navigator;
pub mod response;
pub mod terminator;

pub use augmenter::RequestAugmenter;
pub use navigator::{Navigator, Router};
pub use response::{GuardOutcome, PassReason, ResponseGuard};
pub use terminator::SessionTerminator;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::auth::AuthOperation;

/// Default cooldown before another termination may run
const DEFAULT_COOLDOWN_MS: u64 = 1000;

/// Default delay between termination and the sign-in redirect
const DEFAULT_REDIRECT_DELAY_MS: u64 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    pub cooldown_ms: u64,
    pub redirect_delay_ms: u64,
    pub sign_in_route: String,
    /// Routes under this prefix require a session
    pub protected_prefix: String,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: DEFAULT_COOLDOWN_MS,
            redirect_delay_ms: DEFAULT_REDIRECT_DELAY_MS,
            sign_in_route: "/login".to_string(),
            protected_prefix: "/dashboard".to_string(),
        }
    }
}

impl GuardConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn redirect_delay(&self) -> Duration {
        Duration::from_millis(self.redirect_delay_ms)
    }

    pub fn is_protected(&self, route: &str) -> bool {
        route.starts_with(&self.protected_prefix)
    }
}

/// Per-call record of an outbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    path: String,
    auth_endpoint: bool,
    credential: Option<String>,
}

impl RequestContext {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let auth_endpoint = [AuthOperation::Login, AuthOperation::Signup]
            .iter()
            .any(|op| path.contains(op.endpoint()));
        Self {
            path,
            auth_endpoint,
            credential: None,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// A 401 from login or signup rejects credentials, not a session
    pub fn is_auth_endpoint(&self) -> bool {
        self.auth_endpoint
    }

    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }
}

/// Run `task` after `delay` on the current runtime. Outside a runtime the
/// task runs immediately.
fn spawn_after<F>(delay: Duration, task: F) -> Option<JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => Some(handle.spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        })),
        Err(_) => {
            task();
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_context_detects_auth_endpoints() {
        assert!(RequestContext::new("/auth/login").is_auth_endpoint());
        assert!(RequestContext::new("/auth/signup").is_auth_endpoint());
        assert!(RequestContext::new("/api/v1/auth/login?next=%2F").is_auth_endpoint());
        assert!(!RequestContext::new("/bookings").is_auth_endpoint());
        assert!(!RequestContext::new("/auth/profile").is_auth_endpoint());
    }

    #[test]
    fn test_guard_config_defaults() {
        let config = GuardConfig::default();
        assert_eq!(config.cooldown(), Duration::from_millis(1000));
        assert_eq!(config.redirect_delay(), Duration::from_millis(100));
        assert!(config.is_protected("/dashboard"));
        assert!(config.is_protected("/dashboard/bookings"));
        assert!(!config.is_protected("/login"));
        assert!(!config.is_protected("/"));
    }

    #[test]
    fn test_guard_config_partial_json() {
        let config: GuardConfig = serde_json::from_str(r#"{"cooldown_ms": 250}"#).unwrap();
        assert_eq!(config.cooldown_ms, 250);
        assert_eq!(config.sign_in_route, "/login");
    }

    #[test]
    fn test_spawn_after_without_runtime_runs_inline() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;

        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        let handle = spawn_after(Duration::from_secs(60), move || flag.store(true, Ordering::SeqCst));
        assert!(handle.is_none());
        assert!(ran.load(Ordering::SeqCst));
    }
}
