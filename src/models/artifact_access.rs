//! Admin artifact-access listings.

use serde::{Deserialize, Serialize};

use super::enums::ArtifactType;

/// A Power BI principal as embedded in other records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub email_address: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub user_principal_name: Option<String>,
}

impl User {
    /// Get the best available name for display.
    pub fn display_name_or_upn(&self) -> String {
        self.display_name
            .clone()
            .or_else(|| self.user_principal_name.clone())
            .or_else(|| self.email_address.clone())
            .unwrap_or_else(|| "Unknown User".to_string())
    }
}

/// One artifact a user can access, and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactAccessEntry {
    pub artifact_id: String,
    pub display_name: String,
    pub artifact_type: ArtifactType,
    pub access_right: String,
    #[serde(default)]
    pub share_type: Option<String>,
    #[serde(default)]
    pub sharer: Option<User>,
}

/// A single page of `GET /admin/users/{userId}/artifactAccess`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactAccessResponse {
    #[serde(rename = "ArtifactAccessEntities")]
    pub artifact_access_entities: Vec<ArtifactAccessEntry>,
    #[serde(default)]
    pub continuation_token: Option<String>,
    #[serde(default)]
    pub continuation_uri: Option<String>,
}

impl ArtifactAccessResponse {
    /// True when the server signalled more pages.
    pub fn has_more(&self) -> bool {
        self.continuation_token
            .as_deref()
            .is_some_and(|t| !t.is_empty())
    }
}
