/*!
 * # Staff identity
 *
 * The dashboard runs behind a front end that already knows who is sitting at
 * the screen and forwards the display name in the `x-staff-name` header. This
 * module turns that name into a [`StaffUser`] carrying explicit permissions;
 * handlers check permissions and never compare names themselves.
 */

pub mod permissions;

use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::config::AppConfig;
use crate::errors::ServiceError;
pub use permissions::consts;

/// Header carrying the acting staff member's display name.
pub const STAFF_NAME_HEADER: &str = "x-staff-name";

/// The staff member behind a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct StaffUser {
    pub name: String,
    pub permissions: Vec<String>,
}

impl StaffUser {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }

    /// Fails with `Forbidden` unless the user holds `permission`.
    pub fn require(&self, permission: &str) -> Result<(), ServiceError> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(format!(
                "{} lacks permission {}",
                self.name, permission
            )))
        }
    }

    pub fn can_manage_requests(&self) -> bool {
        self.has_permission(consts::REQUESTS_MANAGE)
    }
}

/// Maps display names to permission sets.
#[derive(Debug, Clone)]
pub struct RoleResolver {
    recipients: Vec<String>,
}

impl RoleResolver {
    pub fn new<I, S>(recipients: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            recipients: recipients
                .into_iter()
                .map(|name| name.as_ref().trim().to_lowercase())
                .filter(|name| !name.is_empty())
                .collect(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.privileged_recipient_names())
    }

    /// Case-insensitive match against the configured recipients.
    pub fn is_recipient(&self, name: &str) -> bool {
        let name = name.trim().to_lowercase();
        self.recipients.iter().any(|recipient| *recipient == name)
    }

    pub fn resolve(&self, name: &str) -> StaffUser {
        let mut permissions: Vec<String> = permissions::STAFF_PERMISSIONS
            .iter()
            .map(|p| p.to_string())
            .collect();
        if self.is_recipient(name) {
            permissions.extend(
                permissions::RECIPIENT_PERMISSIONS
                    .iter()
                    .map(|p| p.to_string()),
            );
        }
        StaffUser {
            name: name.to_string(),
            permissions,
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for StaffUser
where
    S: Send + Sync,
    Arc<RoleResolver>: FromRef<S>,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let name = parts
            .headers
            .get(STAFF_NAME_HEADER)
            // Names are UTF-8 ("Céline"), which `HeaderValue::to_str` refuses.
            .and_then(|value| std::str::from_utf8(value.as_bytes()).ok())
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                ServiceError::Unauthorized(format!("missing {} header", STAFF_NAME_HEADER))
            })?;

        let resolver = Arc::<RoleResolver>::from_ref(state);
        Ok(resolver.resolve(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> RoleResolver {
        RoleResolver::new(["Céline", "Celine"])
    }

    #[test]
    fn recipients_match_case_insensitively_with_and_without_accent() {
        let r = resolver();
        assert!(r.is_recipient("céline"));
        assert!(r.is_recipient("CÉLINE"));
        assert!(r.is_recipient("celine"));
        assert!(r.is_recipient(" Celine "));
        assert!(!r.is_recipient("Celin"));
        assert!(!r.is_recipient("Alex"));
    }

    #[test]
    fn only_recipients_can_manage_requests() {
        let r = resolver();
        let alex = r.resolve("Alex");
        assert!(alex.has_permission(consts::REQUESTS_SUBMIT));
        assert!(alex.has_permission(consts::ORDERS_UPDATE));
        assert!(!alex.can_manage_requests());
        assert!(alex.require(consts::REQUESTS_MANAGE).is_err());

        let celine = r.resolve("CÉLINE");
        assert!(celine.can_manage_requests());
        assert_eq!(celine.name, "CÉLINE");
    }

    #[tokio::test]
    async fn extractor_requires_the_staff_header() {
        let state = Arc::new(resolver());
        let (mut parts, _) = axum::http::Request::builder()
            .uri("/")
            .body(())
            .unwrap()
            .into_parts();
        let err = StaffUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::UNAUTHORIZED);

        let (mut parts, _) = axum::http::Request::builder()
            .uri("/")
            .header(STAFF_NAME_HEADER, "Céline".as_bytes())
            .body(())
            .unwrap()
            .into_parts();
        let user = StaffUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert!(user.can_manage_requests());
    }
}
