//! Groups (workspaces).

use serde::{Deserialize, Serialize};

/// A Power BI workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub is_read_only: bool,
    pub is_on_dedicated_capacity: bool,
    #[serde(rename = "type")]
    pub group_type: String,
    pub name: String,
}

/// Groups returned by a listing endpoint, in server order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Groups {
    pub groups: Vec<Group>,
}

impl Groups {
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Find a group by its display name.
    pub fn find_by_name(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.name == name)
    }
}

impl From<Vec<Group>> for Groups {
    fn from(groups: Vec<Group>) -> Self {
        Self { groups }
    }
}

impl IntoIterator for Groups {
    type Item = Group;
    type IntoIter = std::vec::IntoIter<Group>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_iter()
    }
}
