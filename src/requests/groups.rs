//! `GET /groups` and `GET /admin/groups`.

use crate::error::{PowerBiError, Result};
use crate::models::{Group, GroupExpand, Groups, ODataList};
use crate::request::{parse_json, Request};

pub const DEFAULT_ADMIN_TOP: i64 = 1000;
pub const MAX_ADMIN_TOP: i64 = 5000;

/// Workspaces the caller has access to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GetGroups {
    pub top: Option<u32>,
    pub skip: Option<u32>,
    pub filter: Option<String>,
}

impl GetGroups {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn top(mut self, top: u32) -> Self {
        self.top = Some(top);
        self
    }

    pub fn skip(mut self, skip: u32) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }
}

impl Request for GetGroups {
    type Output = Groups;

    fn endpoint(&self) -> String {
        "/groups".to_string()
    }

    fn query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(filter) = &self.filter {
            query.push(("$filter".to_string(), filter.clone()));
        }
        if let Some(top) = self.top {
            query.push(("$top".to_string(), top.to_string()));
        }
        if let Some(skip) = self.skip {
            query.push(("$skip".to_string(), skip.to_string()));
        }
        query
    }

    fn parse_response(&self, body: &str) -> Result<Groups> {
        let list: ODataList<Group> = parse_json(&self.endpoint(), body)?;
        Ok(list.value.into())
    }
}

/// Every workspace in the organization. Needs an admin credential.
#[derive(Debug, Clone, PartialEq)]
pub struct GetGroupsAsAdmin {
    top: i64,
    expand: Vec<GroupExpand>,
    filter: Option<String>,
    skip: Option<u32>,
}

impl Default for GetGroupsAsAdmin {
    fn default() -> Self {
        Self {
            top: DEFAULT_ADMIN_TOP,
            expand: Vec::new(),
            filter: None,
            skip: None,
        }
    }
}

impl GetGroupsAsAdmin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `$top`, which must lie in `1..=5000`.
    pub fn top(mut self, top: i64) -> Result<Self> {
        if !(1..=MAX_ADMIN_TOP).contains(&top) {
            return Err(PowerBiError::InvalidArgument(
                "The $top parameter must be between 1 and 5000.".to_string(),
            ));
        }
        self.top = top;
        Ok(self)
    }

    /// Set `$expand` from option names, keeping their order.
    pub fn expand<I, S>(self, options: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let options = options
            .into_iter()
            .map(|o| o.as_ref().parse::<GroupExpand>())
            .collect::<Result<Vec<_>>>()?;
        Ok(self.expand_options(options))
    }

    pub fn expand_options(mut self, options: impl IntoIterator<Item = GroupExpand>) -> Self {
        self.expand = options.into_iter().collect();
        self
    }

    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn skip(mut self, skip: u32) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn top_value(&self) -> i64 {
        self.top
    }

    /// The comma-joined `$expand` value, or `None` when nothing is expanded.
    pub fn expand_value(&self) -> Option<String> {
        if self.expand.is_empty() {
            return None;
        }
        Some(
            self.expand
                .iter()
                .map(GroupExpand::as_str)
                .collect::<Vec<_>>()
                .join(","),
        )
    }
}

impl Request for GetGroupsAsAdmin {
    type Output = Groups;

    fn endpoint(&self) -> String {
        "/admin/groups".to_string()
    }

    fn query(&self) -> Vec<(String, String)> {
        let mut query = vec![("$top".to_string(), self.top.to_string())];
        if let Some(expand) = self.expand_value() {
            query.push(("$expand".to_string(), expand));
        }
        if let Some(filter) = &self.filter {
            query.push(("$filter".to_string(), filter.clone()));
        }
        if let Some(skip) = self.skip {
            query.push(("$skip".to_string(), skip.to_string()));
        }
        query
    }

    fn parse_response(&self, body: &str) -> Result<Groups> {
        let list: ODataList<Group> = parse_json(&self.endpoint(), body)?;
        Ok(list.value.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(query: &[(String, String)]) -> Vec<(&str, &str)> {
        query
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }

    #[test]
    fn test_get_groups_query() {
        assert!(GetGroups::new().query().is_empty());

        let request = GetGroups::new().filter("contains(name,'Sales')").top(10);
        assert_eq!(
            pairs(&request.query()),
            vec![("$filter", "contains(name,'Sales')"), ("$top", "10")]
        );
    }

    #[test]
    fn test_admin_defaults() {
        let request = GetGroupsAsAdmin::new();
        assert_eq!(request.endpoint(), "/admin/groups");
        assert_eq!(pairs(&request.query()), vec![("$top", "1000")]);
    }

    #[test]
    fn test_admin_empty_expand_omits_parameter() {
        let empty = GetGroupsAsAdmin::new().expand(Vec::<&str>::new()).unwrap();
        assert_eq!(empty.expand_value(), None);
        assert_eq!(pairs(&empty.query()), vec![("$top", "1000")]);

        let cleared = GetGroupsAsAdmin::new()
            .expand(["users"])
            .unwrap()
            .expand_options([]);
        assert!(cleared.query().iter().all(|(key, _)| key != "$expand"));
    }

    #[test]
    fn test_admin_top_bounds() {
        assert!(GetGroupsAsAdmin::new().top(1).is_ok());
        assert!(GetGroupsAsAdmin::new().top(5000).is_ok());

        for top in [0, -1, 5001] {
            let err = GetGroupsAsAdmin::new().top(top).unwrap_err();
            assert_eq!(
                err.to_string(),
                "Invalid argument: The $top parameter must be between 1 and 5000."
            );
        }
    }

    #[test]
    fn test_admin_expand_keeps_order() {
        let request = GetGroupsAsAdmin::new()
            .expand(["reports", "users", "workbooks"])
            .unwrap()
            .skip(20);
        assert_eq!(
            pairs(&request.query()),
            vec![
                ("$top", "1000"),
                ("$expand", "reports,users,workbooks"),
                ("$skip", "20"),
            ]
        );
    }

    #[test]
    fn test_admin_expand_rejects_unknown() {
        let err = GetGroupsAsAdmin::new()
            .expand(["users", "tables"])
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid argument: Invalid expand option: tables");
    }

    #[test]
    fn test_parse_groups() {
        let body = r#"{
            "@odata.context": "http://wabi/v1.0/myorg/$metadata#groups",
            "value": [
                {"id": "g1", "isReadOnly": false, "isOnDedicatedCapacity": false, "type": "Workspace", "name": "A"},
                {"id": "g2", "isReadOnly": true, "isOnDedicatedCapacity": true, "type": "Workspace", "name": "B"}
            ]
        }"#;
        let groups = GetGroups::new().parse_response(body).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups.find_by_name("B").unwrap().id, "g2");
    }
}
