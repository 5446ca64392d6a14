//! String-valued enumerations used by the Power BI API.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PowerBiError;

/// The kind of identity a connector authenticates as.
///
/// Determines which endpoints are reachable. `ServicePrinciple` and
/// `AdminServicePrinciple` are accepted as deprecated spellings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionAccountType {
    AzureUser,
    #[serde(alias = "ServicePrinciple")]
    ServicePrincipal,
    #[serde(alias = "AdminServicePrinciple")]
    AdminServicePrincipal,
}

impl ConnectionAccountType {
    pub const ALL: [ConnectionAccountType; 3] = [
        Self::AzureUser,
        Self::ServicePrincipal,
        Self::AdminServicePrincipal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AzureUser => "AzureUser",
            Self::ServicePrincipal => "ServicePrincipal",
            Self::AdminServicePrincipal => "AdminServicePrincipal",
        }
    }

    /// True for the client-credentials variants.
    pub fn is_service_principal(&self) -> bool {
        !matches!(self, Self::AzureUser)
    }
}

impl fmt::Display for ConnectionAccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnectionAccountType {
    type Err = PowerBiError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "AzureUser" => Ok(Self::AzureUser),
            "ServicePrincipal" | "ServicePrinciple" => Ok(Self::ServicePrincipal),
            "AdminServicePrincipal" | "AdminServicePrinciple" => Ok(Self::AdminServicePrincipal),
            other => Err(PowerBiError::InvalidArgument(format!(
                "Invalid ConnectionAccountType: {other}"
            ))),
        }
    }
}

/// Declares a fieldless enum whose wire form is a fixed string, with
/// `as_str`, `Display`, `FromStr` and serde support.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $label:literal {
            $($variant:ident => $value:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $value)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $value,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = PowerBiError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($value => Ok($name::$variant),)+
                    other => Err(PowerBiError::InvalidArgument(format!(
                        "Invalid {}: {}",
                        $label, other
                    ))),
                }
            }
        }
    };
}

string_enum! {
    /// Report flavour as reported by the API.
    ReportType, "ReportType" {
        PowerBIReport => "PowerBIReport",
        PaginatedReport => "PaginatedReport",
    }
}

string_enum! {
    /// Artifact kinds returned by admin artifact-access queries.
    ArtifactType, "ArtifactType" {
        Report => "Report",
        PaginatedReport => "PaginatedReport",
        Dashboard => "Dashboard",
        Dataset => "Dataset",
        Dataflow => "Dataflow",
        PersonalGroup => "PersonalGroup",
        Group => "Group",
        Workspace => "Workspace",
        Capacity => "Capacity",
        App => "App",
    }
}

string_enum! {
    /// Related entities that `GET /admin/groups` can expand inline.
    GroupExpand, "expand option" {
        Users => "users",
        Reports => "reports",
        Dashboards => "dashboards",
        Datasets => "datasets",
        Dataflows => "dataflows",
        Workbooks => "workbooks",
    }
}

string_enum! {
    /// Access level requested for an embed token.
    AccessLevel, "AccessLevel" {
        View => "View",
        Edit => "Edit",
        Create => "Create",
    }
}

impl Default for AccessLevel {
    fn default() -> Self {
        Self::View
    }
}
