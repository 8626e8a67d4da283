use std::fmt;

use thiserror::Error;

use crate::api::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOperation {
    Login,
    Signup,
}

impl AuthOperation {
    pub fn endpoint(&self) -> &'static str {
        match self {
            AuthOperation::Login => "/auth/login",
            AuthOperation::Signup => "/auth/signup",
        }
    }

    /// Message shown when the server gives no reason of its own
    pub fn failure_message(&self) -> &'static str {
        match self {
            AuthOperation::Login => "Login failed",
            AuthOperation::Signup => "Signup failed",
        }
    }
}

impl fmt::Display for AuthOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthOperation::Login => write!(f, "login"),
            AuthOperation::Signup => write!(f, "signup"),
        }
    }
}

#[derive(Error, Debug)]
pub enum AuthError {
    /// The server refused the credentials or registration
    #[error("{0}")]
    Rejected(String),

    #[error("No token received from server")]
    MissingToken,

    #[error("No user profile received from server")]
    MissingUser,

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl AuthError {
    /// Build a rejection from an error response body.
    /// Uses the payload's `message` field when present.
    pub fn rejected(operation: AuthOperation, body: &str) -> Self {
        let message = error_message(body)
            .unwrap_or_else(|| operation.failure_message().to_string());
        AuthError::Rejected(message)
    }
}

/// Extract `message` from an API error payload. Validation errors carry a
/// list of messages instead of a single string.
pub fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("message")? {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Array(items) => {
            let parts: Vec<&str> = items.iter().filter_map(|v| v.as_str()).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(", "))
            }
        }
        _ => None,
    }
}
