//! Shared helpers for the HTTP tests.

#![allow(dead_code)]

use serde_json::{json, Value};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use powerbi::auth::CredentialOverrides;
use powerbi::{Config, ConnectionAccountType, Connector};

pub const TENANT: &str = "contoso";
pub const TOKEN_PATH: &str = "/contoso/oauth2/token";

/// Embedded config with every endpoint pointed at `server`.
pub fn config_for(server: &MockServer) -> Config {
    let mut config = Config::embedded().unwrap();
    config.api.base_url = format!("{}/v1.0/myorg", server.uri());
    config.api.login_v1_host = server.uri();
    config.api.login_v2_host = server.uri();
    config.http.max_get_retries = 0;
    config
}

pub fn connector(server: &MockServer, account_type: ConnectionAccountType) -> Connector {
    connector_with(config_for(server), account_type)
}

pub fn connector_with(config: Config, account_type: ConnectionAccountType) -> Connector {
    let overrides = CredentialOverrides::new(TENANT, "client-id", "client-secret")
        .with_redirect_uri("http://localhost:28491/callback");
    Connector::new(account_type, &config, overrides).unwrap()
}

/// Mount a client-credentials token endpoint handing out `token`.
pub async fn mount_client_credentials(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body(token)))
        .mount(server)
        .await;
}

/// Azure AD v1 token response (`expires_in` is a string there).
pub fn token_body(token: &str) -> Value {
    json!({
        "token_type": "Bearer",
        "expires_in": "3599",
        "ext_expires_in": "3599",
        "resource": "https://analysis.windows.net/powerbi/api",
        "access_token": token
    })
}

pub fn api_path(endpoint: &str) -> String {
    format!("/v1.0/myorg{}", endpoint)
}

pub fn group_json(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "isReadOnly": false,
        "isOnDedicatedCapacity": false,
        "type": "Workspace",
        "name": name
    })
}

pub fn report_json(id: &str) -> Value {
    json!({
        "id": id,
        "name": format!("Report {id}"),
        "isOwnedByMe": true,
        "reportType": "PowerBIReport",
        "datasetId": "ds-1",
        "datasetWorkspaceId": "g-1",
        "webUrl": format!("https://app.powerbi.com/reports/{id}"),
        "embedUrl": format!("https://app.powerbi.com/reportEmbed?reportId={id}"),
        "users": [],
        "subscriptions": [],
        "reportFlags": 0
    })
}

pub fn artifact_json(n: usize) -> Value {
    json!({
        "artifactId": format!("artifact-{n}"),
        "displayName": format!("Artifact {n}"),
        "artifactType": "Report",
        "accessRight": "Read"
    })
}
