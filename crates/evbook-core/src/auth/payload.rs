use serde::{Deserialize, Serialize};

use super::{AuthError, AuthOperation, User};
use crate::models::deserialize_optional_id;

/// Body sent to the authentication endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum AuthRequest {
    Login {
        email: String,
        password: String,
    },
    Signup {
        email: String,
        password: String,
        name: String,
    },
}

impl AuthRequest {
    pub fn operation(&self) -> AuthOperation {
        match self {
            AuthRequest::Login { .. } => AuthOperation::Login,
            AuthRequest::Signup { .. } => AuthOperation::Signup,
        }
    }
}

/// Successful response from `/auth/login` or `/auth/signup`.
///
/// The backend has shipped two shapes: `{access_token, user: {..}}` and
/// `{token, id, email, name}`. Both deserialize into this struct;
/// [`AuthPayload::normalize`] picks the fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthPayload {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    user: Option<UserRecord>,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    id: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct UserRecord {
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    id: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

impl UserRecord {
    fn into_user(self) -> Option<User> {
        Some(User {
            id: self.id?,
            email: self.email?,
            name: self.name.unwrap_or_default(),
        })
    }
}

impl AuthPayload {
    /// Resolve the token and user profile.
    ///
    /// Token: `access_token`, then `token`. User: nested `user`, then the
    /// flat `id`/`email`/`name` fields. A user needs at least `id` and `email`.
    pub fn normalize(self) -> Result<(String, User), AuthError> {
        let token = non_empty(self.access_token)
            .or_else(|| non_empty(self.token))
            .ok_or(AuthError::MissingToken)?;

        let flat = UserRecord {
            id: self.id,
            email: self.email,
            name: self.name,
        };
        let user = self
            .user
            .and_then(UserRecord::into_user)
            .or_else(|| flat.into_user())
            .ok_or(AuthError::MissingUser)?;

        Ok((token, user))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> AuthPayload {
        serde_json::from_value(value).expect("payload should deserialize")
    }

    #[test]
    fn test_access_token_with_nested_user() {
        let (token, user) = payload(json!({
            "access_token": "T1",
            "user": {"id": "1", "email": "a@b.com", "name": "A"}
        }))
        .normalize()
        .expect("normalize");

        assert_eq!(token, "T1");
        assert_eq!(user.id, "1");
        assert_eq!(user.email, "a@b.com");
        assert_eq!(user.name, "A");
    }

    #[test]
    fn test_token_with_flat_user_and_numeric_id() {
        let (token, user) = payload(json!({
            "token": "T2",
            "id": 42,
            "email": "c@d.com",
            "name": "C"
        }))
        .normalize()
        .expect("normalize");

        assert_eq!(token, "T2");
        assert_eq!(user.id, "42");
        assert_eq!(user.name, "C");
    }

    #[test]
    fn test_access_token_preferred_over_token() {
        let (token, _) = payload(json!({
            "access_token": "A",
            "token": "B",
            "user": {"id": "1", "email": "a@b.com"}
        }))
        .normalize()
        .expect("normalize");
        assert_eq!(token, "A");
    }

    #[test]
    fn test_empty_access_token_falls_back() {
        let (token, _) = payload(json!({
            "access_token": "",
            "token": "B",
            "user": {"id": "1", "email": "a@b.com"}
        }))
        .normalize()
        .expect("normalize");
        assert_eq!(token, "B");
    }

    #[test]
    fn test_incomplete_nested_user_falls_back_to_flat() {
        let (_, user) = payload(json!({
            "token": "T",
            "user": {"name": "only a name"},
            "id": "7",
            "email": "flat@b.com"
        }))
        .normalize()
        .expect("normalize");
        assert_eq!(user.id, "7");
        assert_eq!(user.name, "");
    }

    #[test]
    fn test_missing_token() {
        let err = payload(json!({"user": {"id": "1", "email": "a@b.com"}}))
            .normalize()
            .unwrap_err();
        assert!(matches!(err, AuthError::MissingToken));
    }

    #[test]
    fn test_missing_user() {
        let err = payload(json!({"access_token": "T1"})).normalize().unwrap_err();
        assert!(matches!(err, AuthError::MissingUser));
    }

    #[test]
    fn test_request_bodies() {
        let login = AuthRequest::Login {
            email: "a@b.com".into(),
            password: "secret".into(),
        };
        assert_eq!(
            serde_json::to_value(&login).expect("serialize"),
            json!({"email": "a@b.com", "password": "secret"})
        );
        assert_eq!(login.operation(), AuthOperation::Login);

        let signup = AuthRequest::Signup {
            email: "a@b.com".into(),
            password: "secret".into(),
            name: "A".into(),
        };
        assert_eq!(
            serde_json::to_value(&signup).expect("serialize"),
            json!({"email": "a@b.com", "password": "secret", "name": "A"})
        );
        assert_eq!(signup.operation().endpoint(), "/auth/signup");
    }
}
