//! Response bodies of the webhook endpoint.
//!
//! Every outcome other than a wrong method is JSON, including failures.

use memosync_core::{error_chain, SyncError};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A memo was mirrored into a new page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SyncedRes {
    /// Always `success`.
    pub status: String,
    pub memo_id: String,
    pub images_count: usize,
}

impl SyncedRes {
    pub fn new(memo_id: String, images_count: usize) -> Self {
        Self {
            status: "success".into(),
            memo_id,
            images_count,
        }
    }
}

/// The event type was not one the bridge acts on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct IgnoredRes {
    /// Always `ignored`.
    pub status: String,
}

impl Default for IgnoredRes {
    fn default() -> Self {
        Self {
            status: "ignored".into(),
        }
    }
}

/// Processing failed. `stack` carries the full error chain for debugging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
    pub stack: String,
}

impl From<&SyncError> for ErrorRes {
    fn from(err: &SyncError) -> Self {
        Self {
            error: err.to_string(),
            stack: error_chain(err),
        }
    }
}
