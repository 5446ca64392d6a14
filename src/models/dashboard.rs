//! Dashboards.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub id: String,
    pub display_name: String,
    pub is_read_only: bool,
    pub embed_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Dashboards {
    pub dashboards: Vec<Dashboard>,
}

impl Dashboards {
    pub fn len(&self) -> usize {
        self.dashboards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dashboards.is_empty()
    }
}

impl From<Vec<Dashboard>> for Dashboards {
    fn from(dashboards: Vec<Dashboard>) -> Self {
        Self { dashboards }
    }
}
