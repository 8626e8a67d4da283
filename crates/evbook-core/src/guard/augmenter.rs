use std::sync::Arc;

use reqwest::RequestBuilder;
use tracing::debug;

use super::RequestContext;
use crate::auth::SessionStore;

/// Attaches the current bearer credential to outbound requests.
pub struct RequestAugmenter {
    session: Arc<SessionStore>,
}

impl RequestAugmenter {
    pub fn new(session: Arc<SessionStore>) -> Self {
        Self { session }
    }

    /// Persisted token first, then the in-memory session. A token found only
    /// in memory is written back to storage.
    pub fn resolve_credential(&self) -> Option<String> {
        if let Some(token) = self.session.persisted_token() {
            return Some(token);
        }

        let token = self.session.token()?;
        debug!("Persisted token missing, restoring it from the session");
        self.session.mirror_token(&token);
        Some(token)
    }

    pub fn augment(&self, builder: RequestBuilder, ctx: &mut RequestContext) -> RequestBuilder {
        match self.resolve_credential() {
            Some(token) => {
                let builder = builder.bearer_auth(&token);
                ctx.credential = Some(token);
                builder
            }
            None => builder,
        }
    }
}
