//! Account-type checks and HTTP failure classification.

use reqwest::StatusCode;

use crate::error::{PowerBiError, Result};
use crate::models::ConnectionAccountType;
use crate::request::Request;

/// Reject `request` if `account_type` is in its restricted set.
///
/// Runs before any token acquisition or network I/O.
pub fn enforce_account_type_restrictions<R: Request + ?Sized>(
    account_type: ConnectionAccountType,
    request: &R,
) -> Result<()> {
    if request.restricted_account_types().contains(&account_type) {
        return Err(PowerBiError::AccountTypeRestricted {
            account_type,
            method: request.method(),
            endpoint: request.endpoint(),
        });
    }
    Ok(())
}

/// Map a non-2xx response to an error.
pub fn classify_failure(status: StatusCode, endpoint: &str, body: String) -> PowerBiError {
    if status == StatusCode::UNAUTHORIZED && endpoint.starts_with("/admin") {
        return PowerBiError::UnauthorizedAdminAccess {
            endpoint: endpoint.to_string(),
        };
    }

    PowerBiError::UpstreamRequestFailure {
        status: status.as_u16(),
        endpoint: endpoint.to_string(),
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Restricted;

    impl Request for Restricted {
        type Output = ();

        fn endpoint(&self) -> String {
            "/reports/r1".into()
        }

        fn restricted_account_types(&self) -> &'static [ConnectionAccountType] {
            &[
                ConnectionAccountType::ServicePrincipal,
                ConnectionAccountType::AdminServicePrincipal,
            ]
        }

        fn parse_response(&self, _body: &str) -> Result<()> {
            Ok(())
        }
    }

    struct Open;

    impl Request for Open {
        type Output = ();

        fn endpoint(&self) -> String {
            "/groups".into()
        }

        fn parse_response(&self, _body: &str) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_restricted_account_rejected() {
        let err =
            enforce_account_type_restrictions(ConnectionAccountType::ServicePrincipal, &Restricted)
                .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Account type 'ServicePrincipal' cannot access GET /reports/r1"
        );
    }

    #[test]
    fn test_allowed_account_passes() {
        assert!(
            enforce_account_type_restrictions(ConnectionAccountType::AzureUser, &Restricted)
                .is_ok()
        );
        for account_type in ConnectionAccountType::ALL {
            assert!(enforce_account_type_restrictions(account_type, &Open).is_ok());
        }
    }

    #[test]
    fn test_classify_admin_unauthorized() {
        let err = classify_failure(StatusCode::UNAUTHORIZED, "/admin/groups", String::new());
        assert!(matches!(
            err,
            PowerBiError::UnauthorizedAdminAccess { ref endpoint } if endpoint == "/admin/groups"
        ));
    }

    #[test]
    fn test_classify_other_failures() {
        let err = classify_failure(StatusCode::UNAUTHORIZED, "/groups", "denied".into());
        assert!(matches!(
            err,
            PowerBiError::UpstreamRequestFailure { status: 401, ref body, .. } if body == "denied"
        ));

        let err = classify_failure(StatusCode::FORBIDDEN, "/admin/groups", String::new());
        assert!(matches!(
            err,
            PowerBiError::UpstreamRequestFailure { status: 403, .. }
        ));
    }
}
