//! Space service
//!
//! Space duplication and Space variables.

use serde_json::json;
use tracing::debug;

use crate::client::Client;
use crate::error::SdkResult;
use crate::models::{DuplicateSpaceRequest, RepoId, SpaceVariable};

/// Service for Space operations
#[derive(Clone)]
pub struct SpaceService {
    client: Client,
}

impl SpaceService {
    /// Create a new Space service
    pub(crate) fn new(client: Client) -> Self {
        Self { client }
    }

    /// Copy `from` (code, settings, variables) into a new Space `to`
    pub async fn duplicate(&self, from: &RepoId, to: &RepoId, private: bool) -> SdkResult<()> {
        let request = DuplicateSpaceRequest {
            repository: to.to_string(),
            private,
        };
        self.client
            .post_no_content(&format!("/api/spaces/{}/duplicate", from), &request)
            .await
    }

    /// Add a variable; the hub rejects keys that already exist
    pub async fn add_variable(&self, space: &RepoId, key: &str, value: &str) -> SdkResult<()> {
        let variable = SpaceVariable {
            key: key.to_string(),
            value: value.to_string(),
        };
        self.client
            .post_no_content(&format!("/api/spaces/{}/variables", space), &variable)
            .await
    }

    /// Remove a variable
    pub async fn delete_variable(&self, space: &RepoId, key: &str) -> SdkResult<()> {
        self.client
            .delete_with_body(
                &format!("/api/spaces/{}/variables", space),
                &json!({ "key": key }),
            )
            .await
    }

    /// Set a variable, replacing an existing value.
    ///
    /// Only a conflict on the key triggers the delete-then-add fallback.
    pub async fn set_variable(&self, space: &RepoId, key: &str, value: &str) -> SdkResult<()> {
        match self.add_variable(space, key, value).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_conflict() => {
                debug!("Variable {} exists on {}, replacing it", key, space);
                self.delete_variable(space, key).await?;
                self.add_variable(space, key, value).await
            }
            Err(e) => Err(e),
        }
    }
}
