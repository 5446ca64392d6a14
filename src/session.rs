//! Session facade and the process-wide default connector.
//!
//! [`PowerBi`] wraps a shared [`Connector`] and offers one typed method per
//! endpoint. A default connector can be installed for code that does not
//! want to pass a session around; when none is set, one is built as a
//! service principal from the loaded configuration. Installing or resetting
//! the default while other tasks use it is the caller's business to order.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

use crate::auth::CredentialOverrides;
use crate::config::Config;
use crate::connector::Connector;
use crate::error::{PowerBiError, Result};
use crate::models::{
    AccessLevel, ArtifactAccessEntry, ArtifactType, ConnectionAccountType, Dashboard, Dashboards,
    EmbedToken, Groups, Report, Reports,
};
use crate::pagination::ContinuationTokenPagination;
use crate::registry::ApiCall;
use crate::request::Request;
use crate::requests::{
    DashboardsGenerateTokenInGroup, GetDashboardInGroup, GetDashboardsInGroup, GetGroups,
    GetGroupsAsAdmin, GetReport, GetReportInGroup, GetReportsInGroup,
    GetUserArtifactAccessAsAdmin, ReportsGenerateTokenInGroup,
};

static DEFAULT_CONNECTOR: Lazy<RwLock<Option<Arc<Connector>>>> = Lazy::new(|| RwLock::new(None));

/// The default connector, building a service principal from configuration
/// on first use.
pub fn connector() -> Result<Arc<Connector>> {
    if let Some(existing) = DEFAULT_CONNECTOR
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .as_ref()
    {
        return Ok(Arc::clone(existing));
    }

    let config = Config::load()
        .map_err(|e| PowerBiError::InvalidArgument(format!("configuration: {e:#}")))?;
    let built = Arc::new(Connector::service_principal(
        &config,
        CredentialOverrides::default(),
    )?);

    let mut slot = DEFAULT_CONNECTOR
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    // Another caller may have won the race while we were building.
    let connector = slot.get_or_insert_with(|| built);
    debug!("Default connector ready ({})", connector.account_type());
    Ok(Arc::clone(connector))
}

/// Install `connector` as the default.
pub fn set_connector(connector: Arc<Connector>) {
    info!("Default connector set to {}", connector.account_type());
    *DEFAULT_CONNECTOR
        .write()
        .unwrap_or_else(PoisonError::into_inner) = Some(connector);
}

/// Drop the default so the next `connector()` call rebuilds it.
pub fn reset_connector() {
    *DEFAULT_CONNECTOR
        .write()
        .unwrap_or_else(PoisonError::into_inner) = None;
}

/// A session on the default connector.
pub fn default_session() -> Result<PowerBi> {
    Ok(PowerBi::from_connector(connector()?))
}

/// Build a session for `account_type`.
pub fn create(
    account_type: ConnectionAccountType,
    config: &Config,
    overrides: CredentialOverrides,
) -> Result<PowerBi> {
    Ok(PowerBi::new(Connector::new(account_type, config, overrides)?))
}

pub fn service_principal(config: &Config, overrides: CredentialOverrides) -> Result<PowerBi> {
    create(ConnectionAccountType::ServicePrincipal, config, overrides)
}

pub fn admin_service_principal(config: &Config, overrides: CredentialOverrides) -> Result<PowerBi> {
    create(ConnectionAccountType::AdminServicePrincipal, config, overrides)
}

pub fn azure_user(config: &Config, overrides: CredentialOverrides) -> Result<PowerBi> {
    create(ConnectionAccountType::AzureUser, config, overrides)
}

/// Typed access to the Power BI REST API through one connector.
#[derive(Debug, Clone)]
pub struct PowerBi {
    connector: Arc<Connector>,
}

impl PowerBi {
    pub fn new(connector: Connector) -> Self {
        Self::from_connector(Arc::new(connector))
    }

    pub fn from_connector(connector: Arc<Connector>) -> Self {
        Self { connector }
    }

    pub fn connector(&self) -> &Arc<Connector> {
        &self.connector
    }

    pub async fn send<R: Request>(&self, request: &R) -> Result<R::Output> {
        self.connector.send(request).await
    }

    pub async fn get_all_pages<R: ContinuationTokenPagination>(
        &self,
        request: &R,
    ) -> Result<Vec<R::Item>> {
        self.connector.get_all_pages(request).await
    }

    pub async fn get_groups(&self) -> Result<Groups> {
        self.send(&GetGroups::new()).await
    }

    pub async fn get_groups_as_admin(&self, request: &GetGroupsAsAdmin) -> Result<Groups> {
        self.send(request).await
    }

    pub async fn get_reports_in_group(&self, group_id: &str) -> Result<Reports> {
        self.send(&GetReportsInGroup::new(group_id)).await
    }

    pub async fn get_report_in_group(&self, group_id: &str, report_id: &str) -> Result<Report> {
        self.send(&GetReportInGroup::new(group_id, report_id)).await
    }

    pub async fn get_report(&self, report_id: &str) -> Result<Report> {
        self.send(&GetReport::new(report_id)).await
    }

    pub async fn get_dashboards_in_group(&self, group_id: &str) -> Result<Dashboards> {
        self.send(&GetDashboardsInGroup::new(group_id)).await
    }

    pub async fn get_dashboard_in_group(
        &self,
        group_id: &str,
        dashboard_id: &str,
    ) -> Result<Dashboard> {
        self.send(&GetDashboardInGroup::new(group_id, dashboard_id))
            .await
    }

    pub async fn dashboards_generate_token_in_group(
        &self,
        group_id: &str,
        dashboard_id: &str,
        access_level: AccessLevel,
    ) -> Result<EmbedToken> {
        let request =
            DashboardsGenerateTokenInGroup::new(group_id, dashboard_id).access_level(access_level);
        self.send(&request).await
    }

    pub async fn reports_generate_token_in_group(
        &self,
        group_id: &str,
        report_id: &str,
        access_level: AccessLevel,
    ) -> Result<EmbedToken> {
        let request =
            ReportsGenerateTokenInGroup::new(group_id, report_id).access_level(access_level);
        self.send(&request).await
    }

    /// Every artifact `user_id` can access, across all pages.
    pub async fn get_user_artifact_access_as_admin(
        &self,
        user_id: &str,
        artifact_types: &[ArtifactType],
    ) -> Result<Vec<ArtifactAccessEntry>> {
        let request = GetUserArtifactAccessAsAdmin::new(user_id)
            .artifact_types(artifact_types.iter().copied());
        self.get_all_pages(&request).await
    }

    /// Send a registry call and return the response as JSON.
    pub async fn dispatch(&self, call: &ApiCall) -> Result<serde_json::Value> {
        debug!("Dispatching {}", call.method_name());
        match call {
            ApiCall::GetGroups(r) => to_json(self.send(r).await?),
            ApiCall::GetGroupsAsAdmin(r) => to_json(self.send(r).await?),
            ApiCall::GetReportsInGroup(r) => to_json(self.send(r).await?),
            ApiCall::GetReportInGroup(r) => to_json(self.send(r).await?),
            ApiCall::GetReport(r) => to_json(self.send(r).await?),
            ApiCall::GetDashboardsInGroup(r) => to_json(self.send(r).await?),
            ApiCall::GetDashboardInGroup(r) => to_json(self.send(r).await?),
            ApiCall::DashboardsGenerateTokenInGroup(r) => to_json(self.send(r).await?),
            ApiCall::ReportsGenerateTokenInGroup(r) => to_json(self.send(r).await?),
            ApiCall::GetUserArtifactAccessAsAdmin(r) => to_json(self.send(r).await?),
        }
    }
}

fn to_json<T: Serialize>(value: T) -> Result<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| PowerBiError::InvalidResponse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_connector(client_id: &str) -> Arc<Connector> {
        let config = Config::embedded().unwrap();
        Arc::new(
            Connector::service_principal(
                &config,
                CredentialOverrides::new("tenant", client_id, "secret"),
            )
            .unwrap(),
        )
    }

    // The only test touching the process-wide default.
    #[test]
    fn test_default_connector_set_and_reset() {
        set_connector(test_connector("first"));
        assert_eq!(connector().unwrap().client_id(), "first");

        set_connector(test_connector("second"));
        assert_eq!(default_session().unwrap().connector().client_id(), "second");

        reset_connector();
        assert!(DEFAULT_CONNECTOR.read().unwrap().is_none());
    }

    #[test]
    fn test_factories_tag_account_type() {
        let config = Config::embedded().unwrap();
        let overrides = CredentialOverrides::new("t", "c", "s");

        let session = admin_service_principal(&config, overrides.clone()).unwrap();
        assert_eq!(
            session.connector().account_type(),
            ConnectionAccountType::AdminServicePrincipal
        );

        let session = service_principal(&config, overrides).unwrap();
        assert_eq!(
            session.connector().account_type(),
            ConnectionAccountType::ServicePrincipal
        );
    }
}
