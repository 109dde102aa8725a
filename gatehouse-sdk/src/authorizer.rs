use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use gatehouse_permission::PermissionCatalogue;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::context::RequestContext;
use crate::error::SdkError;

/// Role code whose holders pass every permission check
pub const DEVELOPER: &str = "developer";

const SEPARATOR: &str = ":";

/// Subject name of a user in a grant store
pub fn name_of_user(id: &str) -> String {
    format!("USER{}{}", SEPARATOR, id)
}

/// Subject name of a role in a grant store
pub fn name_of_role(code: &str) -> String {
    format!("ROLE{}{}", SEPARATOR, code)
}

pub fn name_of_developer() -> String {
    name_of_role(DEVELOPER)
}

/// The platform and organization a permission is checked against
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PermissionScope {
    /// `0` when the request carries no platform
    pub platform: u16,
    pub organization_id: Option<String>,
}

impl PermissionScope {
    pub fn new(platform: u16, organization_id: Option<String>) -> Self {
        Self {
            platform,
            organization_id,
        }
    }

    pub fn from_context(context: &RequestContext) -> Self {
        Self::new(
            context.platform().unwrap_or(0),
            context.organization_id().map(str::to_string),
        )
    }

    /// `code` qualified by this scope, e.g. `4:org-1:order.list`. Unset
    /// parts are left out.
    pub fn name(&self, code: &str) -> String {
        let mut parts = Vec::with_capacity(3);
        let platform = self.platform.to_string();
        if self.platform > 0 {
            parts.push(platform.as_str());
        }
        if let Some(organization) = self.organization_id.as_deref() {
            parts.push(organization);
        }
        parts.push(code);
        parts.join(SEPARATOR)
    }
}

/// What a user holds within one [`PermissionScope`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grants {
    developer: bool,
    codes: Vec<String>,
}

impl Grants {
    /// Granted permission codes. Branch codes grant every leaf beneath them.
    pub fn new<S: Into<String>>(codes: impl IntoIterator<Item = S>) -> Self {
        Self {
            developer: false,
            codes: codes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn developer() -> Self {
        Self {
            developer: true,
            codes: Vec::new(),
        }
    }

    pub fn is_developer(&self) -> bool {
        self.developer
    }

    pub fn codes(&self) -> &[String] {
        &self.codes
    }
}

/// Source of per-user grants, usually backed by the service's policy tables
#[async_trait]
pub trait GrantStore: Send + Sync {
    async fn grants(&self, user: &str, scope: &PermissionScope) -> Result<Grants, SdkError>;
}

/// In-process [`GrantStore`]
#[derive(Debug, Default)]
pub struct MemoryGrants {
    developers: DashSet<String>,
    codes: DashMap<String, Vec<String>>,
}

impl MemoryGrants {
    pub fn new() -> Self {
        Self::default()
    }

    /// Give `user` the developer role in every scope
    pub fn add_developer(&self, user: &str) {
        self.developers.insert(name_of_user(user));
    }

    /// Replace what `user` holds within `scope`
    pub fn grant<S: Into<String>>(
        &self,
        user: &str,
        scope: &PermissionScope,
        codes: impl IntoIterator<Item = S>,
    ) {
        self.codes.insert(
            scope.name(&name_of_user(user)),
            codes.into_iter().map(Into::into).collect(),
        );
    }

    pub fn revoke(&self, user: &str, scope: &PermissionScope) -> bool {
        self.codes.remove(&scope.name(&name_of_user(user))).is_some()
    }
}

#[async_trait]
impl GrantStore for MemoryGrants {
    async fn grants(&self, user: &str, scope: &PermissionScope) -> Result<Grants, SdkError> {
        if self.developers.contains(&name_of_user(user)) {
            return Ok(Grants::developer());
        }
        let codes = self
            .codes
            .get(&scope.name(&name_of_user(user)))
            .map(|codes| codes.value().clone())
            .unwrap_or_default();
        Ok(Grants::new(codes))
    }
}

/// The only failure a caller of [`Authorizer`] sees
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("forbidden")]
pub struct Forbidden;

/// Permission checks for authenticated requests.
///
/// Developers pass every check. Everyone else needs the code, or a branch
/// above it, granted within the request's platform and organization.
#[derive(Clone)]
pub struct Authorizer {
    catalogue: Arc<PermissionCatalogue>,
    grants: Arc<dyn GrantStore>,
}

impl fmt::Debug for Authorizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authorizer")
            .field("platforms", &self.catalogue.platforms())
            .finish_non_exhaustive()
    }
}

impl Authorizer {
    pub fn new(catalogue: Arc<PermissionCatalogue>, grants: Arc<dyn GrantStore>) -> Self {
        Self { catalogue, grants }
    }

    /// Check that the request may use `code`. A grant store failure is a
    /// denial.
    pub async fn authorize(&self, context: &RequestContext, code: &str) -> Result<(), Forbidden> {
        let scope = PermissionScope::from_context(context);
        let grants = self
            .grants
            .grants(context.user_id(), &scope)
            .await
            .map_err(|e| {
                warn!(error = %e, user = context.user_id(), "grant lookup failed");
                Forbidden
            })?;

        if context.can(code, &self.catalogue, &grants) {
            Ok(())
        } else {
            debug!(
                user = context.user_id(),
                permission = %scope.name(code),
                "permission denied"
            );
            Err(Forbidden)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatehouse_permission::platform::{GROUP, STORE};
    use gatehouse_permission::PermissionDefinition;
    use gatehouse_token::Claims;

    fn catalogue() -> Arc<PermissionCatalogue> {
        let definitions = vec![PermissionDefinition::group(
            "order",
            "Orders",
            vec![
                PermissionDefinition::leaf("list", "List").platforms([GROUP, STORE]),
                PermissionDefinition::leaf("refund", "Refund").platforms([STORE]),
            ],
        )];
        Arc::new(PermissionCatalogue::compile(&definitions, &[GROUP, STORE]).unwrap())
    }

    fn context(user: &str, platform: u16, organization: Option<&str>) -> RequestContext {
        let claims = Claims::builder("shop-api:api", user)
            .window(1_700_000_000, 60)
            .platform(platform)
            .organization_id(organization.map(str::to_string))
            .build()
            .unwrap();
        RequestContext::new(claims)
    }

    #[test]
    fn test_names() {
        assert_eq!(name_of_user("u1"), "USER:u1");
        assert_eq!(name_of_developer(), "ROLE:developer");

        let scope = PermissionScope::new(STORE, Some("org-1".to_string()));
        assert_eq!(scope.name("order.list"), "4:org-1:order.list");
        assert_eq!(PermissionScope::default().name("order.list"), "order.list");
    }

    #[tokio::test]
    async fn test_developer_bypasses_every_check() {
        let grants = Arc::new(MemoryGrants::new());
        grants.add_developer("dev");
        let authorizer = Authorizer::new(catalogue(), grants);

        let request = context("dev", 0, None);
        assert_eq!(authorizer.authorize(&request, "order.refund").await, Ok(()));
        assert_eq!(authorizer.authorize(&request, "not.defined").await, Ok(()));
    }

    #[tokio::test]
    async fn test_grants_are_scoped_to_platform_and_organization() {
        let grants = Arc::new(MemoryGrants::new());
        let shop = PermissionScope::new(STORE, Some("org-1".to_string()));
        grants.grant("u1", &shop, ["order.refund"]);
        let authorizer = Authorizer::new(catalogue(), grants);

        let request = context("u1", STORE, Some("org-1"));
        assert_eq!(authorizer.authorize(&request, "order.refund").await, Ok(()));
        assert_eq!(
            authorizer.authorize(&request, "order.list").await,
            Err(Forbidden)
        );

        let elsewhere = context("u1", STORE, Some("org-2"));
        assert_eq!(
            authorizer.authorize(&elsewhere, "order.refund").await,
            Err(Forbidden)
        );
        let other_user = context("u2", STORE, Some("org-1"));
        assert_eq!(
            authorizer.authorize(&other_user, "order.refund").await,
            Err(Forbidden)
        );
    }

    #[tokio::test]
    async fn test_branch_grant_covers_visible_leaves() {
        let grants = Arc::new(MemoryGrants::new());
        let group = PermissionScope::new(GROUP, Some("g-1".to_string()));
        grants.grant("u1", &group, ["order"]);
        let authorizer = Authorizer::new(catalogue(), grants.clone());

        let request = context("u1", GROUP, Some("g-1"));
        assert_eq!(authorizer.authorize(&request, "order.list").await, Ok(()));
        // refund is a store-only permission
        assert_eq!(
            authorizer.authorize(&request, "order.refund").await,
            Err(Forbidden)
        );

        assert!(grants.revoke("u1", &group));
        assert_eq!(
            authorizer.authorize(&request, "order.list").await,
            Err(Forbidden)
        );
    }

    struct BrokenGrants;

    #[async_trait]
    impl GrantStore for BrokenGrants {
        async fn grants(&self, _: &str, _: &PermissionScope) -> Result<Grants, SdkError> {
            Err(SdkError::Generic("policy table unavailable".to_string()))
        }
    }

    #[tokio::test]
    async fn test_grant_store_failure_denies() {
        let authorizer = Authorizer::new(catalogue(), Arc::new(BrokenGrants));
        let request = context("u1", STORE, None);
        assert_eq!(
            authorizer.authorize(&request, "order.list").await,
            Err(Forbidden)
        );
    }
}
