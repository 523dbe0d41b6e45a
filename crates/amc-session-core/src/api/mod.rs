//! REST client module for the storefront's auth authority.
//!
//! This module provides the `ApiClient` used to obtain and renew the
//! bearer credential, and the `AuthApi` trait the session controller
//! depends on so tests can stand in for the remote side.

pub mod client;
pub mod error;

pub use client::{ApiClient, AuthApi};
pub use error::{ApiError, AuthEndpoint};
