//! `GET /admin/users/{userId}/artifactAccess`.

use crate::error::Result;
use crate::models::{ArtifactAccessEntry, ArtifactAccessResponse, ArtifactType};
use crate::pagination::{quote_continuation_token, ContinuationTokenPagination};
use crate::request::{encode_segment, parse_json, Request};

/// Artifacts a user can access, one page at a time. Needs an admin credential.
#[derive(Debug, Clone, PartialEq)]
pub struct GetUserArtifactAccessAsAdmin {
    pub user_id: String,
    pub artifact_types: Vec<ArtifactType>,
    /// Already quoted (`'token'`).
    pub continuation_token: Option<String>,
}

impl GetUserArtifactAccessAsAdmin {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            artifact_types: Vec::new(),
            continuation_token: None,
        }
    }

    pub fn artifact_types(mut self, types: impl IntoIterator<Item = ArtifactType>) -> Self {
        self.artifact_types = types.into_iter().collect();
        self
    }

    /// Resume from a raw continuation token returned by the server.
    pub fn continuation_token(mut self, token: &str) -> Self {
        self.continuation_token = Some(quote_continuation_token(token));
        self
    }
}

impl Request for GetUserArtifactAccessAsAdmin {
    type Output = ArtifactAccessResponse;

    fn endpoint(&self) -> String {
        format!(
            "/admin/users/{}/artifactAccess",
            encode_segment(&self.user_id)
        )
    }

    fn query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if !self.artifact_types.is_empty() {
            let types = self
                .artifact_types
                .iter()
                .map(ArtifactType::as_str)
                .collect::<Vec<_>>()
                .join(",");
            query.push(("artifactTypes".to_string(), types));
        }
        if let Some(token) = &self.continuation_token {
            query.push(("continuationToken".to_string(), token.clone()));
        }
        query
    }

    fn parse_response(&self, body: &str) -> Result<ArtifactAccessResponse> {
        parse_json(&self.endpoint(), body)
    }
}

impl ContinuationTokenPagination for GetUserArtifactAccessAsAdmin {
    type Item = ArtifactAccessEntry;

    fn with_only_continuation_token(&self, token: &str) -> Self {
        Self::new(self.user_id.clone()).continuation_token(token)
    }

    fn into_page(output: ArtifactAccessResponse) -> (Vec<ArtifactAccessEntry>, Option<String>) {
        (output.artifact_access_entities, output.continuation_token)
    }
}
