//! Test utilities and helpers for Parlor
//!
//! Shared fixtures and async helpers used across subsystem tests.

pub mod async_helpers;
pub mod fixtures;

pub use async_helpers::*;
pub use fixtures::*;
