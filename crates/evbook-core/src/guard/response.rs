use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::StatusCode;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::{GuardConfig, Navigator, RequestContext, SessionTerminator};
use crate::auth::SessionStore;

/// Why a response did not end the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassReason {
    /// Transport failure; absence of a response says nothing about the session
    NoResponse,
    NotUnauthorized,
    AuthEndpoint,
    AlreadyTerminating,
    NoPersistedToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    PassThrough(PassReason),
    Terminated { redirect_scheduled: bool },
}

/// Turns a 401 on a guarded endpoint into a single session termination.
///
/// Several requests may be in flight when a token expires. The first 401
/// that passes every check claims the termination window; later ones observe
/// it and pass through until the cooldown has elapsed. The window expires on
/// its own, so no reset task is needed and a guard used outside a runtime
/// still terminates at most once per cooldown.
pub struct ResponseGuard {
    session: Arc<SessionStore>,
    terminator: SessionTerminator,
    claimed_at: Mutex<Option<Instant>>,
    cooldown: Duration,
    timers: Mutex<Vec<JoinHandle<()>>>,
}

impl ResponseGuard {
    pub fn new(session: Arc<SessionStore>, navigator: Arc<dyn Navigator>, config: GuardConfig) -> Self {
        let cooldown = config.cooldown();
        Self {
            terminator: SessionTerminator::new(session.clone(), navigator, config),
            session,
            claimed_at: Mutex::new(None),
            cooldown,
            timers: Mutex::new(Vec::new()),
        }
    }

    pub fn is_terminating(&self) -> bool {
        let claimed_at = self.claimed_at.lock().unwrap_or_else(|e| e.into_inner());
        self.within_cooldown(*claimed_at)
    }

    fn within_cooldown(&self, claimed_at: Option<Instant>) -> bool {
        claimed_at.is_some_and(|at| at.elapsed() < self.cooldown)
    }

    /// Claim the termination window. Only one caller per cooldown wins.
    fn try_claim(&self) -> bool {
        let mut claimed_at = self.claimed_at.lock().unwrap_or_else(|e| e.into_inner());
        if self.within_cooldown(*claimed_at) {
            return false;
        }
        *claimed_at = Some(Instant::now());
        true
    }

    /// Inspect the outcome of a request. `status` is `None` when no response
    /// was received.
    pub fn inspect(&self, ctx: &RequestContext, status: Option<StatusCode>) -> GuardOutcome {
        let outcome = self.evaluate(ctx, status);
        if let GuardOutcome::PassThrough(reason) = outcome {
            if status == Some(StatusCode::UNAUTHORIZED) {
                debug!(path = ctx.path(), ?reason, "Unauthorized response passed through");
            }
        }
        outcome
    }

    fn evaluate(&self, ctx: &RequestContext, status: Option<StatusCode>) -> GuardOutcome {
        let Some(status) = status else {
            return GuardOutcome::PassThrough(PassReason::NoResponse);
        };
        if status != StatusCode::UNAUTHORIZED {
            return GuardOutcome::PassThrough(PassReason::NotUnauthorized);
        }
        if ctx.is_auth_endpoint() {
            return GuardOutcome::PassThrough(PassReason::AuthEndpoint);
        }
        if self.is_terminating() {
            return GuardOutcome::PassThrough(PassReason::AlreadyTerminating);
        }
        if self.session.persisted_token().is_none() {
            return GuardOutcome::PassThrough(PassReason::NoPersistedToken);
        }
        if !self.try_claim() {
            return GuardOutcome::PassThrough(PassReason::AlreadyTerminating);
        }

        warn!(path = ctx.path(), "Session rejected by server, signing out");
        let termination = self.terminator.terminate();

        let mut timers = self.timers.lock().unwrap_or_else(|e| e.into_inner());
        timers.retain(|t| !t.is_finished());
        timers.extend(termination.redirect);

        GuardOutcome::Terminated {
            redirect_scheduled: termination.redirect_scheduled,
        }
    }
}

impl Drop for ResponseGuard {
    fn drop(&mut self) {
        let timers = self.timers.get_mut().unwrap_or_else(|e| e.into_inner());
        for timer in timers.drain(..) {
            timer.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::Router;
    use crate::storage::{MemoryStorage, Storage, TOKEN_KEY};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts redirects instead of moving anywhere
    struct CountingNavigator {
        route: String,
        redirects: AtomicUsize,
    }

    impl Navigator for CountingNavigator {
        fn current_route(&self) -> String {
            self.route.clone()
        }

        fn redirect(&self, _route: &str) {
            self.redirects.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Fixture {
        storage: Arc<MemoryStorage>,
        session: Arc<SessionStore>,
        navigator: Arc<CountingNavigator>,
        guard: ResponseGuard,
    }

    fn fixture(route: &str, token: Option<&str>) -> Fixture {
        let storage = Arc::new(MemoryStorage::new());
        if let Some(token) = token {
            storage.set(TOKEN_KEY, token).unwrap();
        }
        let session = Arc::new(SessionStore::new(storage.clone()));
        let navigator = Arc::new(CountingNavigator {
            route: route.to_string(),
            redirects: AtomicUsize::new(0),
        });
        let guard = ResponseGuard::new(session.clone(), navigator.clone(), GuardConfig::default());
        Fixture {
            storage,
            session,
            navigator,
            guard,
        }
    }

    fn unauthorized(fx: &Fixture, path: &str) -> GuardOutcome {
        fx.guard.inspect(&RequestContext::new(path), Some(StatusCode::UNAUTHORIZED))
    }

    #[tokio::test(start_paused = true)]
    async fn test_guarded_401_terminates_and_redirects() {
        let fx = fixture("/dashboard", Some("T1"));

        let outcome = unauthorized(&fx, "/bookings");

        assert_eq!(outcome, GuardOutcome::Terminated { redirect_scheduled: true });
        assert!(fx.guard.is_terminating());
        assert!(fx.storage.get(TOKEN_KEY).unwrap().is_none());
        assert!(!fx.session.is_authenticated());

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(fx.navigator.redirects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_401_within_cooldown_is_suppressed() {
        let fx = fixture("/dashboard/bookings", Some("T1"));

        let first = unauthorized(&fx, "/bookings");
        // Storage is repopulated to prove the flag alone suppresses the second
        fx.storage.set(TOKEN_KEY, "T1").unwrap();
        let second = unauthorized(&fx, "/stations");

        assert!(matches!(first, GuardOutcome::Terminated { .. }));
        assert_eq!(second, GuardOutcome::PassThrough(PassReason::AlreadyTerminating));

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(fx.navigator.redirects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flag_resets_after_cooldown() {
        let fx = fixture("/dashboard", Some("T1"));

        unauthorized(&fx, "/bookings");
        assert!(fx.guard.is_terminating());

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(!fx.guard.is_terminating());

        fx.storage.set(TOKEN_KEY, "T2").unwrap();
        assert!(matches!(unauthorized(&fx, "/bookings"), GuardOutcome::Terminated { .. }));
    }

    #[test]
    fn test_cooldown_holds_without_runtime() {
        let fx = fixture("/dashboard", Some("T1"));

        let first = unauthorized(&fx, "/bookings");
        fx.storage.set(TOKEN_KEY, "T1").unwrap();
        let second = unauthorized(&fx, "/stations");

        assert_eq!(first, GuardOutcome::Terminated { redirect_scheduled: true });
        assert_eq!(second, GuardOutcome::PassThrough(PassReason::AlreadyTerminating));
        assert!(fx.guard.is_terminating());
        // No runtime to schedule on, so the redirect already happened
        assert_eq!(fx.navigator.redirects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_401s_terminate_once() {
        let fx = Arc::new(fixture("/dashboard", Some("T1")));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let fx = fx.clone();
                tokio::spawn(async move { unauthorized(&fx, &format!("/bookings/{}", i)) })
            })
            .collect();
        let outcomes = futures::future::join_all(handles).await;

        let terminated = outcomes
            .into_iter()
            .map(|o| o.unwrap())
            .filter(|o| matches!(o, GuardOutcome::Terminated { .. }))
            .count();
        assert_eq!(terminated, 1);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(fx.navigator.redirects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_auth_endpoint_401_never_logs_out() {
        let fx = fixture("/dashboard", Some("T1"));

        assert_eq!(
            unauthorized(&fx, "/auth/login"),
            GuardOutcome::PassThrough(PassReason::AuthEndpoint)
        );
        assert_eq!(
            unauthorized(&fx, "/auth/signup"),
            GuardOutcome::PassThrough(PassReason::AuthEndpoint)
        );
        assert_eq!(fx.storage.get(TOKEN_KEY).unwrap().as_deref(), Some("T1"));
        assert!(!fx.guard.is_terminating());
    }

    #[tokio::test]
    async fn test_401_without_persisted_token_is_ignored() {
        let fx = fixture("/dashboard", None);

        assert_eq!(
            unauthorized(&fx, "/stations"),
            GuardOutcome::PassThrough(PassReason::NoPersistedToken)
        );
        assert!(!fx.guard.is_terminating());
        assert_eq!(fx.navigator.redirects.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_other_failures_pass_through() {
        let fx = fixture("/dashboard", Some("T1"));
        let ctx = RequestContext::new("/bookings");

        assert_eq!(
            fx.guard.inspect(&ctx, None),
            GuardOutcome::PassThrough(PassReason::NoResponse)
        );
        assert_eq!(
            fx.guard.inspect(&ctx, Some(StatusCode::FORBIDDEN)),
            GuardOutcome::PassThrough(PassReason::NotUnauthorized)
        );
        assert_eq!(
            fx.guard.inspect(&ctx, Some(StatusCode::OK)),
            GuardOutcome::PassThrough(PassReason::NotUnauthorized)
        );
        assert_eq!(fx.storage.get(TOKEN_KEY).unwrap().as_deref(), Some("T1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_termination_on_public_route_skips_redirect() {
        let fx = fixture("/", Some("T1"));

        assert_eq!(
            unauthorized(&fx, "/stations"),
            GuardOutcome::Terminated { redirect_scheduled: false }
        );
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(fx.navigator.redirects.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_router_lands_on_sign_in() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(TOKEN_KEY, "T1").unwrap();
        let session = Arc::new(SessionStore::new(storage));
        let router = Arc::new(Router::new("/dashboard/bookings"));
        let guard = ResponseGuard::new(session, router.clone(), GuardConfig::default());

        guard.inspect(&RequestContext::new("/bookings"), Some(StatusCode::UNAUTHORIZED));
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(router.current_route(), "/login");
    }
}
