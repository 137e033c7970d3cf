//! # API Shared
//!
//! Shared utilities and definitions for the Preflight REST API.
//!
//! Contains:
//! - Wire DTOs with OpenAPI schemas (`types` module)
//! - Shared services like `HealthService`
//! - Authentication utilities
//!
//! Used by the root REST binary; kept separate so alternative surfaces can
//! reuse the same wire types.

pub mod auth;
pub mod health;
pub mod types;

pub use health::HealthService;
pub use types::*;
