//! Embed token generation for dashboards and reports.

use reqwest::Method;
use serde_json::json;

use crate::error::Result;
use crate::models::{AccessLevel, EmbedToken};
use crate::request::{encode_segment, parse_json, Request};

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardsGenerateTokenInGroup {
    pub group_id: String,
    pub dashboard_id: String,
    pub access_level: AccessLevel,
}

impl DashboardsGenerateTokenInGroup {
    pub fn new(group_id: impl Into<String>, dashboard_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            dashboard_id: dashboard_id.into(),
            access_level: AccessLevel::default(),
        }
    }

    pub fn access_level(mut self, access_level: AccessLevel) -> Self {
        self.access_level = access_level;
        self
    }
}

impl Request for DashboardsGenerateTokenInGroup {
    type Output = EmbedToken;

    fn method(&self) -> Method {
        Method::POST
    }

    fn endpoint(&self) -> String {
        format!(
            "/groups/{}/dashboards/{}/GenerateToken",
            encode_segment(&self.group_id),
            encode_segment(&self.dashboard_id)
        )
    }

    fn body(&self) -> Option<serde_json::Value> {
        Some(json!({ "accessLevel": self.access_level }))
    }

    fn parse_response(&self, body: &str) -> Result<EmbedToken> {
        parse_json(&self.endpoint(), body)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportsGenerateTokenInGroup {
    pub group_id: String,
    pub report_id: String,
    pub access_level: AccessLevel,
}

impl ReportsGenerateTokenInGroup {
    pub fn new(group_id: impl Into<String>, report_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            report_id: report_id.into(),
            access_level: AccessLevel::default(),
        }
    }

    pub fn access_level(mut self, access_level: AccessLevel) -> Self {
        self.access_level = access_level;
        self
    }
}

impl Request for ReportsGenerateTokenInGroup {
    type Output = EmbedToken;

    fn method(&self) -> Method {
        Method::POST
    }

    fn endpoint(&self) -> String {
        format!(
            "/groups/{}/reports/{}/GenerateToken",
            encode_segment(&self.group_id),
            encode_segment(&self.report_id)
        )
    }

    fn body(&self) -> Option<serde_json::Value> {
        Some(json!({ "accessLevel": self.access_level }))
    }

    fn parse_response(&self, body: &str) -> Result<EmbedToken> {
        parse_json(&self.endpoint(), body)
    }
}
