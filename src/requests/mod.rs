//! Request descriptors for the supported Power BI endpoints.

pub mod admin;
pub mod dashboards;
pub mod embed_token;
pub mod groups;
pub mod reports;

pub use admin::GetUserArtifactAccessAsAdmin;
pub use dashboards::{GetDashboardInGroup, GetDashboardsInGroup};
pub use embed_token::{DashboardsGenerateTokenInGroup, ReportsGenerateTokenInGroup};
pub use groups::{GetGroups, GetGroupsAsAdmin};
pub use reports::{GetReport, GetReportInGroup, GetReportsInGroup};
