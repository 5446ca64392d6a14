//! Lookup from API method names to request descriptors.
//!
//! Lets callers (the CLI, scripts, config-driven jobs) name an endpoint by
//! its identifier, e.g. `getReportInGroup`, and pass positional string
//! arguments. Required arguments come first, then optional ones; an empty
//! optional argument counts as absent.

use std::str::FromStr;

use crate::error::{PowerBiError, Result};
use crate::models::{AccessLevel, ArtifactType};
use crate::requests::{
    DashboardsGenerateTokenInGroup, GetDashboardInGroup, GetDashboardsInGroup, GetGroups,
    GetGroupsAsAdmin, GetReport, GetReportInGroup, GetReportsInGroup,
    GetUserArtifactAccessAsAdmin, ReportsGenerateTokenInGroup,
};

/// A request built from a method identifier.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    GetGroups(GetGroups),
    GetGroupsAsAdmin(GetGroupsAsAdmin),
    GetReportsInGroup(GetReportsInGroup),
    GetReportInGroup(GetReportInGroup),
    GetReport(GetReport),
    GetDashboardsInGroup(GetDashboardsInGroup),
    GetDashboardInGroup(GetDashboardInGroup),
    DashboardsGenerateTokenInGroup(DashboardsGenerateTokenInGroup),
    ReportsGenerateTokenInGroup(ReportsGenerateTokenInGroup),
    GetUserArtifactAccessAsAdmin(GetUserArtifactAccessAsAdmin),
}

struct Entry {
    name: &'static str,
    required: &'static [&'static str],
    optional: &'static [&'static str],
    build: fn(&[String]) -> Result<ApiCall>,
}

static REGISTRY: &[Entry] = &[
    Entry {
        name: "getGroups",
        required: &[],
        optional: &["filter", "top", "skip"],
        build: build_get_groups,
    },
    Entry {
        name: "getGroupsAsAdmin",
        required: &[],
        optional: &["top", "expand", "filter", "skip"],
        build: build_get_groups_as_admin,
    },
    Entry {
        name: "getReportsInGroup",
        required: &["groupId"],
        optional: &[],
        build: |args| Ok(ApiCall::GetReportsInGroup(GetReportsInGroup::new(&args[0]))),
    },
    Entry {
        name: "getReportInGroup",
        required: &["groupId", "reportId"],
        optional: &[],
        build: |args| {
            Ok(ApiCall::GetReportInGroup(GetReportInGroup::new(
                &args[0], &args[1],
            )))
        },
    },
    Entry {
        name: "getReport",
        required: &["reportId"],
        optional: &[],
        build: |args| Ok(ApiCall::GetReport(GetReport::new(&args[0]))),
    },
    Entry {
        name: "getDashboardsInGroup",
        required: &["groupId"],
        optional: &[],
        build: |args| {
            Ok(ApiCall::GetDashboardsInGroup(GetDashboardsInGroup::new(
                &args[0],
            )))
        },
    },
    Entry {
        name: "getDashboardInGroup",
        required: &["groupId", "dashboardId"],
        optional: &[],
        build: |args| {
            Ok(ApiCall::GetDashboardInGroup(GetDashboardInGroup::new(
                &args[0], &args[1],
            )))
        },
    },
    Entry {
        name: "dashboardsGenerateTokenInGroup",
        required: &["groupId", "dashboardId"],
        optional: &["accessLevel"],
        build: build_dashboards_generate_token,
    },
    Entry {
        name: "reportsGenerateTokenInGroup",
        required: &["groupId", "reportId"],
        optional: &["accessLevel"],
        build: build_reports_generate_token,
    },
    Entry {
        name: "getUserArtifactAccessAsAdmin",
        required: &["userId"],
        optional: &["artifactTypes", "continuationToken"],
        build: build_user_artifact_access,
    },
];

impl ApiCall {
    /// Build the request named `name` from positional `args`.
    pub fn from_method(name: &str, args: &[String]) -> Result<Self> {
        let entry = REGISTRY
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| PowerBiError::InvalidArgument(format!("Unknown method: {name}")))?;

        let min = entry.required.len();
        let max = min + entry.optional.len();
        if args.len() < min || args.len() > max {
            let params: Vec<&str> = entry
                .required
                .iter()
                .copied()
                .chain(entry.optional.iter().copied())
                .collect();
            return Err(PowerBiError::InvalidArgument(format!(
                "{name} expects {min} to {max} arguments ({}), got {}",
                params.join(", "),
                args.len()
            )));
        }

        if let Some(position) = args[..min].iter().position(|a| a.trim().is_empty()) {
            return Err(PowerBiError::InvalidArgument(format!(
                "{name}: {} must not be empty",
                entry.required[position]
            )));
        }

        (entry.build)(args)
    }

    pub fn method_name(&self) -> &'static str {
        match self {
            Self::GetGroups(_) => "getGroups",
            Self::GetGroupsAsAdmin(_) => "getGroupsAsAdmin",
            Self::GetReportsInGroup(_) => "getReportsInGroup",
            Self::GetReportInGroup(_) => "getReportInGroup",
            Self::GetReport(_) => "getReport",
            Self::GetDashboardsInGroup(_) => "getDashboardsInGroup",
            Self::GetDashboardInGroup(_) => "getDashboardInGroup",
            Self::DashboardsGenerateTokenInGroup(_) => "dashboardsGenerateTokenInGroup",
            Self::ReportsGenerateTokenInGroup(_) => "reportsGenerateTokenInGroup",
            Self::GetUserArtifactAccessAsAdmin(_) => "getUserArtifactAccessAsAdmin",
        }
    }
}

/// Every registered method with its parameter names, optional ones last.
pub fn methods() -> impl Iterator<Item = (&'static str, Vec<&'static str>)> {
    REGISTRY.iter().map(|e| {
        let params = e
            .required
            .iter()
            .copied()
            .chain(e.optional.iter().copied())
            .collect();
        (e.name, params)
    })
}

fn optional(args: &[String], index: usize) -> Option<&str> {
    args.get(index)
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
}

fn parse_number<T: FromStr>(param: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| {
        PowerBiError::InvalidArgument(format!("{param} must be a number, got '{value}'"))
    })
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn build_get_groups(args: &[String]) -> Result<ApiCall> {
    let mut request = GetGroups::new();
    if let Some(filter) = optional(args, 0) {
        request = request.filter(filter);
    }
    if let Some(top) = optional(args, 1) {
        request = request.top(parse_number("top", top)?);
    }
    if let Some(skip) = optional(args, 2) {
        request = request.skip(parse_number("skip", skip)?);
    }
    Ok(ApiCall::GetGroups(request))
}

fn build_get_groups_as_admin(args: &[String]) -> Result<ApiCall> {
    let mut request = GetGroupsAsAdmin::new();
    if let Some(top) = optional(args, 0) {
        request = request.top(parse_number("$top", top)?)?;
    }
    if let Some(expand) = optional(args, 1) {
        request = request.expand(split_list(expand))?;
    }
    if let Some(filter) = optional(args, 2) {
        request = request.filter(filter);
    }
    if let Some(skip) = optional(args, 3) {
        request = request.skip(parse_number("$skip", skip)?);
    }
    Ok(ApiCall::GetGroupsAsAdmin(request))
}

fn access_level(args: &[String], index: usize) -> Result<AccessLevel> {
    optional(args, index)
        .map(AccessLevel::from_str)
        .transpose()
        .map(Option::unwrap_or_default)
}

fn build_dashboards_generate_token(args: &[String]) -> Result<ApiCall> {
    let request = DashboardsGenerateTokenInGroup::new(&args[0], &args[1])
        .access_level(access_level(args, 2)?);
    Ok(ApiCall::DashboardsGenerateTokenInGroup(request))
}

fn build_reports_generate_token(args: &[String]) -> Result<ApiCall> {
    let request = ReportsGenerateTokenInGroup::new(&args[0], &args[1])
        .access_level(access_level(args, 2)?);
    Ok(ApiCall::ReportsGenerateTokenInGroup(request))
}

fn build_user_artifact_access(args: &[String]) -> Result<ApiCall> {
    let mut request = GetUserArtifactAccessAsAdmin::new(&args[0]);
    if let Some(types) = optional(args, 1) {
        let types = split_list(types)
            .map(ArtifactType::from_str)
            .collect::<Result<Vec<_>>>()?;
        request = request.artifact_types(types);
    }
    if let Some(token) = optional(args, 2) {
        request = request.continuation_token(token);
    }
    Ok(ApiCall::GetUserArtifactAccessAsAdmin(request))
}
