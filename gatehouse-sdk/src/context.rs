use gatehouse_permission::PermissionCatalogue;
use gatehouse_token::Claims;
use tokio::sync::OnceCell;

use crate::authorizer::Grants;
use crate::error::SdkError;
use crate::scope::{RoleScope, ScopeCache, TemporaryScope};

/// What the verification step learned about a request.
///
/// Built once per request by the authenticator and passed explicitly to
/// permission checks. Cached scopes are looked up at most once per request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    claims: Claims,
    refreshed_token: Option<String>,
    role: OnceCell<Option<RoleScope>>,
    temporary: OnceCell<Option<TemporaryScope>>,
}

impl RequestContext {
    pub fn new(claims: Claims) -> Self {
        Self {
            claims,
            refreshed_token: None,
            role: OnceCell::new(),
            temporary: OnceCell::new(),
        }
    }

    /// A context whose token was replaced during verification
    pub fn refreshed(claims: Claims, token: String) -> Self {
        Self {
            refreshed_token: Some(token),
            ..Self::new(claims)
        }
    }

    pub fn claims(&self) -> &Claims {
        &self.claims
    }

    pub fn user_id(&self) -> &str {
        &self.claims.subject
    }

    pub fn token_id(&self) -> &str {
        &self.claims.token_id
    }

    /// `None` when the token carries no platform
    pub fn platform(&self) -> Option<u16> {
        (self.claims.platform > 0).then_some(self.claims.platform)
    }

    pub fn organization_id(&self) -> Option<&str> {
        self.claims.organization_id.as_deref()
    }

    pub fn group_id(&self) -> Option<&str> {
        self.claims
            .group_id
            .as_deref()
            .filter(|group| !group.is_empty())
    }

    /// The token to hand back to the caller, if verification refreshed it
    pub fn refreshed_token(&self) -> Option<&str> {
        self.refreshed_token.as_deref()
    }

    /// Whether `grants` cover `code` on this request's platform. Developers
    /// hold every code.
    pub fn can(&self, code: &str, catalogue: &PermissionCatalogue, grants: &Grants) -> bool {
        if grants.is_developer() {
            return true;
        }
        catalogue
            .granted_codes(self.platform().unwrap_or(0), grants.codes())
            .iter()
            .any(|granted| granted == code)
    }

    /// The caller's cached role scope, fetched on first use
    pub async fn role(&self, cache: &ScopeCache) -> Result<Option<&RoleScope>, SdkError> {
        let role = self
            .role
            .get_or_try_init(|| cache.role(self.user_id()))
            .await?;
        Ok(role.as_ref())
    }

    /// The caller's temporary scope, fetched on first use
    pub async fn temporary(
        &self,
        cache: &ScopeCache,
    ) -> Result<Option<&TemporaryScope>, SdkError> {
        let temporary = self
            .temporary
            .get_or_try_init(|| cache.temporary(self.user_id()))
            .await?;
        Ok(temporary.as_ref())
    }
}
