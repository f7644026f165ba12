//! Route table and access checks.
//!
//! Every page belongs to one [`GuardLevel`]. [`authorize`] decides, from the current
//! [`AuthState`], whether a page may render or where the caller should be sent instead.

use std::fmt;

use crate::auth::types::AuthState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Landing,
    Auth,
    Dashboard,
    Quests,
    Missions,
    SideHustle,
    Rewards,
    Admin,
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum GuardLevel {
    Public,
    Authenticated,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    /// Session lookup still running; show a spinner.
    Pending,
    RedirectToAuth,
    RedirectToDashboard,
}

impl Access {
    /// Path to navigate to, for the redirect variants.
    pub fn redirect_path(&self) -> Option<&'static str> {
        match self {
            Access::RedirectToAuth => Some(Route::Auth.path()),
            Access::RedirectToDashboard => Some(Route::Dashboard.path()),
            Access::Allow | Access::Pending => None,
        }
    }
}

impl Route {
    pub const ALL: [Route; 9] = [
        Route::Landing,
        Route::Auth,
        Route::Dashboard,
        Route::Quests,
        Route::Missions,
        Route::SideHustle,
        Route::Rewards,
        Route::Admin,
        Route::NotFound,
    ];

    /// Match a request path. Query strings and one trailing slash are ignored.
    pub fn from_path(path: &str) -> Route {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let path = if path.len() > 1 { path.strip_suffix('/').unwrap_or(path) } else { path };
        match path {
            "/" | "" => Route::Landing,
            "/auth" => Route::Auth,
            "/dashboard" => Route::Dashboard,
            "/quests" => Route::Quests,
            "/missions" => Route::Missions,
            "/side-hustle" => Route::SideHustle,
            "/rewards" => Route::Rewards,
            "/admin" => Route::Admin,
            _ => Route::NotFound,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Route::Landing => "/",
            Route::Auth => "/auth",
            Route::Dashboard => "/dashboard",
            Route::Quests => "/quests",
            Route::Missions => "/missions",
            Route::SideHustle => "/side-hustle",
            Route::Rewards => "/rewards",
            Route::Admin => "/admin",
            Route::NotFound => "*",
        }
    }

    pub fn guard_level(&self) -> GuardLevel {
        match self {
            Route::Landing | Route::Auth | Route::NotFound => GuardLevel::Public,
            Route::Dashboard | Route::Quests | Route::Missions | Route::SideHustle | Route::Rewards => {
                GuardLevel::Authenticated
            }
            Route::Admin => GuardLevel::Admin,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

pub fn authorize(route: Route, state: &AuthState) -> Access {
    let level = route.guard_level();
    if level == GuardLevel::Public {
        return Access::Allow;
    }
    if state.is_loading {
        return Access::Pending;
    }
    if !state.is_signed_in() {
        return Access::RedirectToAuth;
    }
    if level == GuardLevel::Admin && !state.is_admin {
        return Access::RedirectToDashboard;
    }
    Access::Allow
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::types::User;
    use chrono::Utc;
    use uuid::Uuid;

    fn state(loading: bool, signed_in: bool, admin: bool) -> AuthState {
        AuthState {
            user: signed_in.then(|| User {
                id: Uuid::new_v4(),
                email: "a@b.io".into(),
                created_at: Utc::now(),
                metadata: Default::default(),
            }),
            session: None,
            is_loading: loading,
            is_admin: admin,
        }
    }

    #[test]
    fn paths_round_trip() {
        for route in Route::ALL.iter().filter(|r| **r != Route::NotFound) {
            assert_eq!(Route::from_path(route.path()), *route);
        }
        assert_eq!(Route::from_path("/quests/"), Route::Quests);
        assert_eq!(Route::from_path("/rewards?tab=owned"), Route::Rewards);
        assert_eq!(Route::from_path("/settings"), Route::NotFound);
        assert_eq!(Route::from_path("/admin/users"), Route::NotFound);
    }

    #[test]
    fn public_pages_always_render() {
        for route in [Route::Landing, Route::Auth, Route::NotFound] {
            assert_eq!(authorize(route, &state(true, false, false)), Access::Allow);
            assert_eq!(authorize(route, &state(false, false, false)), Access::Allow);
        }
    }

    #[test]
    fn protected_pages_wait_then_redirect() {
        assert_eq!(authorize(Route::Quests, &state(true, false, false)), Access::Pending);
        assert_eq!(authorize(Route::Quests, &state(false, false, false)), Access::RedirectToAuth);
        assert_eq!(authorize(Route::Quests, &state(false, true, false)), Access::Allow);
    }

    #[test]
    fn admin_page_needs_admin_flag() {
        assert_eq!(authorize(Route::Admin, &state(true, true, false)), Access::Pending);
        assert_eq!(authorize(Route::Admin, &state(false, false, false)), Access::RedirectToAuth);
        let to_dash = authorize(Route::Admin, &state(false, true, false));
        assert_eq!(to_dash, Access::RedirectToDashboard);
        assert_eq!(to_dash.redirect_path(), Some("/dashboard"));
        assert_eq!(authorize(Route::Admin, &state(false, true, true)), Access::Allow);
    }
}
