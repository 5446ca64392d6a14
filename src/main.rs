//! powerbi - command-line client for the Power BI REST API.

#![deny(clippy::all)]

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use powerbi::auth::callback_server::CallbackListener;
use powerbi::auth::CredentialOverrides;
use powerbi::models::{AccessLevel, ArtifactType, ConnectionAccountType};
use powerbi::requests::{GetGroups, GetGroupsAsAdmin};
use powerbi::{registry, ApiCall, Config, Connector, PowerBi, PowerBiError};

/// How long to wait for the browser to come back after sign-in.
const SIGN_IN_TIMEOUT: Duration = Duration::from_secs(300);

/// Power BI REST API client
#[derive(Parser)]
#[command(name = "powerbi")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ConnectionArgs {
    /// Account type: AzureUser, ServicePrincipal or AdminServicePrincipal
    #[arg(long, global = true, default_value = "ServicePrincipal", value_parser = parse_account_type)]
    account_type: ConnectionAccountType,

    /// Config file merged over the built-in defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Tenant id (requires --client-id and --client-secret)
    #[arg(long, global = true)]
    tenant: Option<String>,

    #[arg(long, global = true)]
    client_id: Option<String>,

    #[arg(long, global = true)]
    client_secret: Option<String>,

    /// Redirect URI for AzureUser sign-in
    #[arg(long, global = true)]
    redirect_uri: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List workspaces
    Groups {
        /// Use the admin endpoint (needs an admin credential)
        #[arg(long)]
        admin: bool,
        #[arg(long)]
        top: Option<i64>,
        /// Comma-separated expand options (admin only)
        #[arg(long, value_delimiter = ',')]
        expand: Vec<String>,
        #[arg(long)]
        filter: Option<String>,
    },

    /// List reports in a workspace
    Reports { group_id: String },

    /// List dashboards in a workspace
    Dashboards { group_id: String },

    /// Generate an embed token
    EmbedToken {
        #[command(subcommand)]
        target: EmbedTarget,
    },

    /// List every artifact a user can access (admin)
    ArtifactAccess {
        user_id: String,
        /// Comma-separated artifact types, e.g. Report,Dataset
        #[arg(long, value_delimiter = ',', value_parser = parse_artifact_type)]
        types: Vec<ArtifactType>,
    },

    /// Call an endpoint by method name, e.g. `call getReportInGroup <groupId> <reportId>`
    Call { method: String, args: Vec<String> },

    /// List the method names accepted by `call`
    Methods,
}

#[derive(Subcommand)]
enum EmbedTarget {
    Report {
        group_id: String,
        report_id: String,
        #[arg(long, default_value = "View", value_parser = parse_access_level)]
        access_level: AccessLevel,
    },
    Dashboard {
        group_id: String,
        dashboard_id: String,
        #[arg(long, default_value = "View", value_parser = parse_access_level)]
        access_level: AccessLevel,
    },
}

fn parse_account_type(value: &str) -> Result<ConnectionAccountType, String> {
    value.parse().map_err(|e: PowerBiError| e.to_string())
}

fn parse_artifact_type(value: &str) -> Result<ArtifactType, String> {
    value.parse().map_err(|e: PowerBiError| e.to_string())
}

fn parse_access_level(value: &str) -> Result<AccessLevel, String> {
    value.parse().map_err(|e: PowerBiError| e.to_string())
}

#[tokio::main]
async fn main() {
    // .env is optional
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    let cli = Cli::parse();
    let config = Config::load_from(cli.connection.config.as_deref());

    let level = config
        .as_ref()
        .map(|c| c.logging.level.clone())
        .unwrap_or_else(|_| "info".to_string());
    init_logging(&level);

    if let Err(e) = run(cli, config).await {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        if let Some(api_error) = e.downcast_ref::<PowerBiError>() {
            eprintln!("{}", api_error.user_message());
        }
        std::process::exit(1);
    }
}

fn init_logging(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli, config: Result<Config>) -> Result<()> {
    if let Commands::Methods = cli.command {
        for (name, params) in registry::methods() {
            println!("{} {}", name, params.join(" "));
        }
        return Ok(());
    }

    let config = config.context("Failed to load configuration")?;
    info!("Starting powerbi v{}", env!("CARGO_PKG_VERSION"));

    let args = cli.connection;
    let overrides = CredentialOverrides {
        tenant: args.tenant,
        client_id: args.client_id,
        client_secret: args.client_secret.map(Into::into),
        redirect_uri: args.redirect_uri,
    };
    let connector = Connector::new(args.account_type, &config, overrides)?;

    if connector.account_type() == ConnectionAccountType::AzureUser {
        sign_in(&connector).await?;
    }

    let session = PowerBi::new(connector);

    match cli.command {
        Commands::Groups {
            admin,
            top,
            expand,
            filter,
        } => {
            let groups = if admin {
                let mut request = GetGroupsAsAdmin::new().expand(&expand)?;
                if let Some(top) = top {
                    request = request.top(top)?;
                }
                if let Some(filter) = filter {
                    request = request.filter(filter);
                }
                session.get_groups_as_admin(&request).await?
            } else {
                let mut request = GetGroups::new();
                if let Some(top) = top {
                    let top = u32::try_from(top).context("--top must be positive")?;
                    request = request.top(top);
                }
                if let Some(filter) = filter {
                    request = request.filter(filter);
                }
                session.send(&request).await?
            };
            print_json(&groups)
        }
        Commands::Reports { group_id } => {
            print_json(&session.get_reports_in_group(&group_id).await?)
        }
        Commands::Dashboards { group_id } => {
            print_json(&session.get_dashboards_in_group(&group_id).await?)
        }
        Commands::EmbedToken { target } => {
            let token = match target {
                EmbedTarget::Report {
                    group_id,
                    report_id,
                    access_level,
                } => {
                    session
                        .reports_generate_token_in_group(&group_id, &report_id, access_level)
                        .await?
                }
                EmbedTarget::Dashboard {
                    group_id,
                    dashboard_id,
                    access_level,
                } => {
                    session
                        .dashboards_generate_token_in_group(&group_id, &dashboard_id, access_level)
                        .await?
                }
            };
            print_json(&token)
        }
        Commands::ArtifactAccess { user_id, types } => {
            let entries = session
                .get_user_artifact_access_as_admin(&user_id, &types)
                .await?;
            info!("{} artifacts", entries.len());
            print_json(&entries)
        }
        Commands::Call { method, args } => {
            let call = ApiCall::from_method(&method, &args)?;
            print_json(&session.dispatch(&call).await?)
        }
        Commands::Methods => Ok(()),
    }
}

/// Interactive Azure AD sign-in through the system browser.
async fn sign_in(connector: &Connector) -> Result<()> {
    let redirect_uri = connector
        .redirect_uri()
        .context("AzureUser sign-in needs a redirect_uri")?
        .to_string();

    // Listen before the browser can possibly redirect.
    let listener = CallbackListener::bind(&redirect_uri)?;
    let auth_url = connector.authorization_url(&[])?;

    eprintln!("Opening the browser to sign in. If it does not open, visit:\n{}", auth_url);
    if let Err(e) = open::that(auth_url.as_str()) {
        warn!("Failed to open browser: {}", e);
    }

    let callback_url = tokio::task::spawn_blocking(move || listener.wait(SIGN_IN_TIMEOUT))
        .await
        .context("Callback listener task failed")??;

    connector.handle_callback(&callback_url).await?;
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
