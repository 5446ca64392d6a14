//! Reports.

use serde::{Deserialize, Serialize};

use super::enums::ReportType;

/// A Power BI report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,
    #[serde(default)]
    pub app_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub is_owned_by_me: bool,
    pub report_type: ReportType,
    pub dataset_id: String,
    pub dataset_workspace_id: String,
    pub web_url: String,
    pub embed_url: String,
    pub users: Vec<serde_json::Value>,
    pub subscriptions: Vec<serde_json::Value>,
    pub report_flags: i64,
}

impl Report {
    pub fn is_paginated(&self) -> bool {
        self.report_type == ReportType::PaginatedReport
    }
}

/// Reports in a group, in server order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Reports {
    pub reports: Vec<Report>,
}

impl Reports {
    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}

impl From<Vec<Report>> for Reports {
    fn from(reports: Vec<Report>) -> Self {
        Self { reports }
    }
}
