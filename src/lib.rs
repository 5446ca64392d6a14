//! Power BI REST API client.
//!
//! Connects as a service principal (client-credentials grant), an admin
//! service principal, or an Azure AD user (authorization-code grant), and
//! exposes typed requests for groups, reports, dashboards, embed tokens and
//! admin artifact-access queries.
//!
//! ```no_run
//! # async fn run() -> powerbi::Result<()> {
//! use powerbi::{auth::CredentialOverrides, Config};
//!
//! let config = Config::load().expect("configuration");
//! let session = powerbi::service_principal(&config, CredentialOverrides::default())?;
//! for group in session.get_groups().await? {
//!     println!("{} {}", group.id, group.name);
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod connector;
pub mod error;
pub mod guard;
pub mod models;
pub mod pagination;
pub mod registry;
pub mod request;
pub mod requests;
pub mod response_cache;
pub mod session;

pub use config::Config;
pub use connector::Connector;
pub use error::{AuthError, PowerBiError, Result};
pub use models::ConnectionAccountType;
pub use pagination::ContinuationTokenPagination;
pub use registry::ApiCall;
pub use request::Request;
pub use session::{
    admin_service_principal, azure_user, connector, create, default_session, reset_connector,
    service_principal, set_connector, PowerBi,
};
