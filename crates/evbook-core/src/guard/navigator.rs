use tokio::sync::watch;
use tracing::info;

/// The view the client is currently showing.
pub trait Navigator: Send + Sync {
    fn current_route(&self) -> String;

    /// Leave the current view for `route`
    fn redirect(&self, route: &str);
}

/// Tracks the current route and publishes every change.
pub struct Router {
    route: watch::Sender<String>,
}

impl Router {
    pub fn new(initial: impl Into<String>) -> Self {
        let (route, _) = watch::channel(initial.into());
        Self { route }
    }

    /// User-driven navigation
    pub fn navigate(&self, route: &str) {
        self.route.send_replace(route.to_string());
    }

    pub fn changes(&self) -> watch::Receiver<String> {
        self.route.subscribe()
    }
}

impl Navigator for Router {
    fn current_route(&self) -> String {
        self.route.borrow().clone()
    }

    fn redirect(&self, route: &str) {
        info!(from = %self.current_route(), to = route, "Redirecting");
        self.route.send_replace(route.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_router_tracks_and_publishes() {
        let router = Router::new("/");
        let mut changes = router.changes();

        router.navigate("/dashboard");
        assert_eq!(router.current_route(), "/dashboard");
        assert!(changes.has_changed().unwrap());
        assert_eq!(*changes.borrow_and_update(), "/dashboard");

        router.redirect("/login");
        assert_eq!(*changes.borrow_and_update(), "/login");
    }
}
