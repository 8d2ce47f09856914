//! # API Shared
//!
//! Wire types of the memosync webhook service.
//!
//! Contains:
//! - Response bodies for the webhook endpoint
//! - The shared `HealthService`
//!
//! Used by `api-rest` and by anything that talks to it.

pub mod health;
pub mod webhook;

pub use health::{HealthRes, HealthService};
pub use webhook::{ErrorRes, IgnoredRes, SyncedRes};
