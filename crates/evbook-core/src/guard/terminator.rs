use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::{spawn_after, GuardConfig, Navigator};
use crate::auth::SessionStore;

/// Ends the session and sends the user back to sign-in.
pub struct SessionTerminator {
    session: Arc<SessionStore>,
    navigator: Arc<dyn Navigator>,
    config: GuardConfig,
}

/// What a termination did besides clearing the session
#[derive(Debug)]
pub struct Termination {
    pub redirect: Option<JoinHandle<()>>,
    pub redirect_scheduled: bool,
}

impl SessionTerminator {
    pub fn new(session: Arc<SessionStore>, navigator: Arc<dyn Navigator>, config: GuardConfig) -> Self {
        Self {
            session,
            navigator,
            config,
        }
    }

    /// Clear the session, then schedule a redirect to the sign-in route if
    /// the current view needs a session. Never fails.
    pub fn terminate(&self) -> Termination {
        self.session.logout();

        let route = self.navigator.current_route();
        if !self.config.is_protected(&route) {
            debug!(route = %route, "Session ended outside the protected area, staying put");
            return Termination {
                redirect: None,
                redirect_scheduled: false,
            };
        }

        info!(route = %route, delay_ms = self.config.redirect_delay_ms, "Scheduling sign-in redirect");
        let navigator = self.navigator.clone();
        let sign_in = self.config.sign_in_route.clone();
        let redirect = spawn_after(self.config.redirect_delay(), move || navigator.redirect(&sign_in));

        Termination {
            redirect,
            redirect_scheduled: true,
        }
    }
}
