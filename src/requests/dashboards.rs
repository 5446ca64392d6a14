//! Dashboard lookups.

use crate::error::Result;
use crate::models::{Dashboard, Dashboards, ODataList};
use crate::request::{encode_segment, parse_json, Request};

#[derive(Debug, Clone, PartialEq)]
pub struct GetDashboardsInGroup {
    pub group_id: String,
}

impl GetDashboardsInGroup {
    pub fn new(group_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
        }
    }
}

impl Request for GetDashboardsInGroup {
    type Output = Dashboards;

    fn endpoint(&self) -> String {
        format!("/groups/{}/dashboards", encode_segment(&self.group_id))
    }

    fn parse_response(&self, body: &str) -> Result<Dashboards> {
        let list: ODataList<Dashboard> = parse_json(&self.endpoint(), body)?;
        Ok(list.value.into())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetDashboardInGroup {
    pub group_id: String,
    pub dashboard_id: String,
}

impl GetDashboardInGroup {
    pub fn new(group_id: impl Into<String>, dashboard_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            dashboard_id: dashboard_id.into(),
        }
    }
}

impl Request for GetDashboardInGroup {
    type Output = Dashboard;

    fn endpoint(&self) -> String {
        format!(
            "/groups/{}/dashboards/{}",
            encode_segment(&self.group_id),
            encode_segment(&self.dashboard_id)
        )
    }

    fn parse_response(&self, body: &str) -> Result<Dashboard> {
        parse_json(&self.endpoint(), body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dashboards() {
        let body = r#"{"value": [
            {"id": "d1", "displayName": "Ops", "isReadOnly": false, "embedUrl": "https://app.powerbi.com/dashboardEmbed?dashboardId=d1"}
        ]}"#;
        let dashboards = GetDashboardsInGroup::new("g1").parse_response(body).unwrap();
        assert_eq!(dashboards.len(), 1);
        assert_eq!(dashboards.dashboards[0].display_name, "Ops");
    }

    #[test]
    fn test_dashboard_endpoint() {
        assert_eq!(
            GetDashboardInGroup::new("g1", "d1").endpoint(),
            "/groups/g1/dashboards/d1"
        );
    }
}
