//! Route-aware logout policy.
//!
//! Deciding what happens after a logout is a pure function of whether a
//! token was present and of the current path. Carrying the decision out is
//! left to a [`Navigator`](super::Navigator).

use serde::Serialize;

pub const ADMIN_ROOT: &str = "/admin";
const ADMIN_PREFIX: &str = "/admin/";
const ADMIN_DASHBOARD: &str = "/admin/dashboard";

/// Areas that render differently once the visitor is anonymous.
const RELOAD_PREFIXES: [&str; 2] = ["/rewards", "/artist-portal"];

/// Role that lands on the dashboard after signing in
pub const ADMIN_ROLE: &str = "ADMIN";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum LogoutAction {
    None,
    NavigateTo(String),
    ReloadPage,
}

fn in_reload_area(path: &str) -> bool {
    RELOAD_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

/// What to do after the token slot has been cleared.
pub fn logout_action(had_token: bool, path: &str) -> LogoutAction {
    // Anonymous visitors of these areas would otherwise reload forever.
    if !had_token && in_reload_area(path) {
        return LogoutAction::None;
    }

    if path == ADMIN_ROOT {
        LogoutAction::None
    } else if path.starts_with(ADMIN_PREFIX) {
        LogoutAction::NavigateTo(ADMIN_ROOT.to_string())
    } else if in_reload_area(path) {
        LogoutAction::ReloadPage
    } else {
        LogoutAction::None
    }
}

/// Where a freshly signed-in principal should go.
pub fn landing_path(role: Option<&str>) -> &'static str {
    match role {
        Some(ADMIN_ROLE) => ADMIN_DASHBOARD,
        _ => ADMIN_ROOT,
    }
}
