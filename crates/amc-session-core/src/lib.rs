//! Client-side session lifecycle for the AMC storefront and admin console.
//!
//! One bearer token is held locally. The [`auth::SessionController`] hands
//! out request headers and claims, refreshes the token against the auth
//! authority, and clears it (with a route-aware follow-up) once it stops
//! being valid.

pub mod api;
pub mod auth;
pub mod config;

#[cfg(test)]
mod tests;

pub use api::{ApiClient, ApiError, AuthApi};
pub use auth::{
    Claims, CredentialStore, LogoutAction, Navigator, PathNavigator, SessionController,
    SessionState, SessionWatcher,
};
pub use config::Config;
