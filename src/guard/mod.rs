//! Route guard and navigation state.
//!
//! The console has two entry routes: the public login route and the guarded
//! root. Any path other than the login route is treated as protected.
//! [`Navigator`] tracks where the console currently is, and is shared with
//! the API gateway so an authorization failure anywhere can send the user
//! back to the login route.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::session::SessionStore;

pub const LOGIN_ROUTE: &str = "/login";
pub const ROOT_ROUTE: &str = "/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Protected(String),
}

impl Route {
    pub fn parse(path: &str) -> Self {
        let path = path.trim();
        if path == LOGIN_ROUTE {
            Route::Login
        } else if path.is_empty() {
            Route::root()
        } else {
            Route::Protected(path.to_string())
        }
    }

    pub fn root() -> Self {
        Route::Protected(ROOT_ROUTE.to_string())
    }

    pub fn path(&self) -> &str {
        match self {
            Route::Login => LOGIN_ROUTE,
            Route::Protected(path) => path,
        }
    }

    pub fn is_protected(&self) -> bool {
        matches!(self, Route::Protected(_))
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug)]
struct NavState {
    current: Route,
    history: Vec<Route>,
}

/// Shared handle to the current route.
#[derive(Debug, Clone)]
pub struct Navigator {
    state: Arc<Mutex<NavState>>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::starting_at(Route::root())
    }
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(route: Route) -> Self {
        Self {
            state: Arc::new(Mutex::new(NavState {
                current: route.clone(),
                history: vec![route],
            })),
        }
    }

    pub fn current(&self) -> Route {
        self.state.lock().current.clone()
    }

    /// Move to `route`. Returns `false` when already there, in which case
    /// nothing is recorded.
    pub fn navigate(&self, route: Route) -> bool {
        let mut state = self.state.lock();
        if state.current == route {
            return false;
        }
        debug!(from = %state.current, to = %route, "Navigating");
        state.history.push(route.clone());
        state.current = route;
        true
    }

    pub fn redirect_to_login(&self) -> bool {
        self.navigate(Route::Login)
    }

    pub fn history(&self) -> Vec<Route> {
        self.state.lock().history.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Authorized,
    Unauthorized,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Render(Route),
    Redirect(Route),
}

/// Decides whether a route may render based on the stored session.
///
/// The check is synchronous and never calls the network; token validity is
/// only learned from server responses through the gateway.
#[derive(Clone)]
pub struct RouteGuard {
    session: Arc<dyn SessionStore>,
    navigator: Navigator,
}

impl RouteGuard {
    pub fn new(session: Arc<dyn SessionStore>, navigator: Navigator) -> Self {
        Self { session, navigator }
    }

    pub fn state(&self) -> GuardState {
        if self.session.is_authenticated() {
            GuardState::Authorized
        } else {
            GuardState::Unauthorized
        }
    }

    pub fn check(&self, route: &Route) -> GuardDecision {
        match route {
            Route::Login => GuardDecision::Render(Route::Login),
            Route::Protected(_) => match self.state() {
                GuardState::Authorized => GuardDecision::Render(route.clone()),
                GuardState::Unauthorized => GuardDecision::Redirect(Route::Login),
            },
        }
    }

    /// Check `route` and move the navigator to wherever the decision lands.
    pub fn enter(&self, route: Route) -> GuardDecision {
        let decision = self.check(&route);
        match &decision {
            GuardDecision::Render(target) | GuardDecision::Redirect(target) => {
                self.navigator.navigate(target.clone());
            }
        }
        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemorySessionStore;

    fn guard_with(session: MemorySessionStore) -> (RouteGuard, Navigator) {
        let navigator = Navigator::new();
        let guard = RouteGuard::new(Arc::new(session), navigator.clone());
        (guard, navigator)
    }

    #[test]
    fn test_route_parse() {
        assert_eq!(Route::parse("/login"), Route::Login);
        assert_eq!(Route::parse(""), Route::root());
        assert_eq!(Route::parse("/users"), Route::Protected("/users".to_string()));
        assert!(Route::parse("/anything/else").is_protected());
    }

    #[test]
    fn test_no_token_redirects_every_protected_path() {
        let (guard, _) = guard_with(MemorySessionStore::new());
        assert_eq!(guard.state(), GuardState::Unauthorized);

        for path in ["/", "/users", "/users/5", "/settings"] {
            assert_eq!(
                guard.check(&Route::parse(path)),
                GuardDecision::Redirect(Route::Login),
                "path {} should redirect",
                path
            );
        }
    }

    #[test]
    fn test_token_renders_protected_content() {
        let (guard, _) = guard_with(MemorySessionStore::with_token("abc"));
        assert_eq!(guard.state(), GuardState::Authorized);
        assert_eq!(
            guard.check(&Route::root()),
            GuardDecision::Render(Route::root())
        );
    }

    #[test]
    fn test_login_route_is_public() {
        let (guard, _) = guard_with(MemorySessionStore::new());
        assert_eq!(guard.check(&Route::Login), GuardDecision::Render(Route::Login));
    }

    #[test]
    fn test_enter_moves_navigator() {
        let (guard, navigator) = guard_with(MemorySessionStore::new());
        guard.enter(Route::root());
        assert_eq!(navigator.current(), Route::Login);
    }

    #[test]
    fn test_repeated_redirects_are_idempotent() {
        let navigator = Navigator::new();
        assert!(navigator.redirect_to_login());
        assert!(!navigator.redirect_to_login());
        assert!(!navigator.redirect_to_login());

        assert_eq!(navigator.current(), Route::Login);
        assert_eq!(navigator.history(), vec![Route::root(), Route::Login]);
    }
}
