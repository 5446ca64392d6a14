//! Report lookups.

use crate::error::Result;
use crate::models::{ConnectionAccountType, ODataList, Report, Reports};
use crate::request::{encode_segment, parse_json, Request};

#[derive(Debug, Clone, PartialEq)]
pub struct GetReportsInGroup {
    pub group_id: String,
}

impl GetReportsInGroup {
    pub fn new(group_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
        }
    }
}

impl Request for GetReportsInGroup {
    type Output = Reports;

    fn endpoint(&self) -> String {
        format!("/groups/{}/reports", encode_segment(&self.group_id))
    }

    fn parse_response(&self, body: &str) -> Result<Reports> {
        let list: ODataList<Report> = parse_json(&self.endpoint(), body)?;
        Ok(list.value.into())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetReportInGroup {
    pub group_id: String,
    pub report_id: String,
}

impl GetReportInGroup {
    pub fn new(group_id: impl Into<String>, report_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            report_id: report_id.into(),
        }
    }
}

impl Request for GetReportInGroup {
    type Output = Report;

    fn endpoint(&self) -> String {
        format!(
            "/groups/{}/reports/{}",
            encode_segment(&self.group_id),
            encode_segment(&self.report_id)
        )
    }

    fn parse_response(&self, body: &str) -> Result<Report> {
        parse_json(&self.endpoint(), body)
    }
}

/// A report from "My workspace". Only reachable by Azure users.
#[derive(Debug, Clone, PartialEq)]
pub struct GetReport {
    pub report_id: String,
}

impl GetReport {
    pub fn new(report_id: impl Into<String>) -> Self {
        Self {
            report_id: report_id.into(),
        }
    }
}

impl Request for GetReport {
    type Output = Report;

    fn endpoint(&self) -> String {
        format!("/reports/{}", encode_segment(&self.report_id))
    }

    fn restricted_account_types(&self) -> &'static [ConnectionAccountType] {
        &[
            ConnectionAccountType::ServicePrincipal,
            ConnectionAccountType::AdminServicePrincipal,
        ]
    }

    fn parse_response(&self, body: &str) -> Result<Report> {
        parse_json(&self.endpoint(), body)
    }
}
