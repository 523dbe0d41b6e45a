//! Authentication module for managing the bearer credential.
//!
//! This module provides:
//! - `CredentialStore`: the single durable slot holding the raw token
//! - `token`: offline decoding of the token's claims
//! - `policy`: what to do with the current page after a logout
//! - `SessionController`: refresh, expiry, and logout orchestration
//! - `SessionWatcher`: the periodic liveness loop driving the controller

pub mod controller;
pub mod error;
pub mod navigator;
pub mod policy;
pub mod store;
pub mod token;
pub mod watcher;

pub use controller::{SessionCheck, SessionController, SessionState};
pub use error::SessionError;
pub use navigator::{NavigationEvent, Navigator, PathNavigator};
pub use policy::{landing_path, logout_action, LogoutAction};
pub use store::{open_store, CredentialStore, FileStore, KeyringStore, MemoryStore, TOKEN_SLOT};
pub use token::Claims;
pub use watcher::SessionWatcher;
