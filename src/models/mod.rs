//! Power BI data objects.
//!
//! Every record is deserialized 1:1 from the API's camelCase JSON. Required
//! fields must be present or parsing fails.

pub mod artifact_access;
pub mod dashboard;
pub mod embed_token;
pub mod enums;
pub mod group;
pub mod report;

use serde::Deserialize;

pub use artifact_access::{ArtifactAccessEntry, ArtifactAccessResponse, User};
pub use dashboard::{Dashboard, Dashboards};
pub use embed_token::EmbedToken;
pub use enums::{AccessLevel, ArtifactType, ConnectionAccountType, GroupExpand, ReportType};
pub use group::{Group, Groups};
pub use report::{Report, Reports};

/// OData list envelope (`{"@odata.context": ..., "value": [...]}`).
#[derive(Debug, Deserialize)]
pub(crate) struct ODataList<T> {
    pub value: Vec<T>,
}
