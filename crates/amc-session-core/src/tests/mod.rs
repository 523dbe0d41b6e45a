//! Shared test doubles for unit tests

pub mod mocks;
