use gatehouse_config::RevocationPolicy;
use gatehouse_token::strip_bearer;
use http::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::context::RequestContext;
use crate::error::{RefreshError, SdkError};
use crate::lifecycle::TokenManager;

/// The only failure a caller of [`Authenticator`] sees. Which check failed
/// is logged, never returned.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("unauthorized")]
pub struct Unauthorized;

/// Bearer-header authentication for incoming requests.
///
/// Verifies the token, rejects blacklisted token ids under the configured
/// [`RevocationPolicy`], and refreshes tokens that are inside their grace
/// window.
#[derive(Clone)]
pub struct Authenticator {
    tokens: Arc<TokenManager>,
    policy: RevocationPolicy,
    on_refresh: Option<RefreshHook>,
}

/// Called with the new context each time a request's token is replaced
pub type RefreshHook = Arc<dyn Fn(&RequestContext) + Send + Sync>;

impl fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authenticator")
            .field("tokens", &self.tokens)
            .field("policy", &self.policy)
            .field("on_refresh", &self.on_refresh.is_some())
            .finish()
    }
}

impl Authenticator {
    pub fn new(tokens: Arc<TokenManager>, policy: RevocationPolicy) -> Self {
        Self {
            tokens,
            policy,
            on_refresh: None,
        }
    }

    /// Run `hook` after every successful refresh, once the replacement
    /// token is known
    pub fn on_refresh(mut self, hook: RefreshHook) -> Self {
        self.on_refresh = Some(hook);
        self
    }

    pub fn policy(&self) -> RevocationPolicy {
        self.policy
    }

    /// Authenticate the token carried in the `Authorization` header
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<RequestContext, Unauthorized> {
        let token = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(strip_bearer)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                debug!("missing or unreadable authorization header");
                Unauthorized
            })?;

        self.authenticate_token(token).await
    }

    pub async fn authenticate_token(&self, token: &str) -> Result<RequestContext, Unauthorized> {
        self.authorize(token).await.map_err(|e| {
            debug!(error = %e, kind = ?e.kind(), "request rejected");
            Unauthorized
        })
    }

    async fn authorize(&self, token: &str) -> Result<RequestContext, SdkError> {
        let verification = self.tokens.verify(token)?;
        let refresh_needed = verification.refresh_needed();
        let claims = verification.claims;

        if self
            .tokens
            .is_revoked_with_policy(&claims.token_id, self.policy)
            .await
        {
            return Err(SdkError::Revoked);
        }

        if !refresh_needed {
            return Ok(RequestContext::new(claims));
        }

        if !claims.refreshable {
            return Err(RefreshError::NotRefreshable.into());
        }

        let refreshed = self.tokens.refresh(&claims, &[]).await?;
        let renewed = self.tokens.verify(&refreshed)?;
        let context = RequestContext::refreshed(renewed.claims, refreshed);
        if let Some(hook) = &self.on_refresh {
            hook(&context);
        }
        Ok(context)
    }

    /// Write a refreshed token into response headers. Returns whether a
    /// header was written.
    pub fn apply_refresh_header(
        context: &RequestContext,
        headers: &mut HeaderMap,
    ) -> Result<bool, SdkError> {
        let Some(token) = context.refreshed_token() else {
            return Ok(false);
        };

        let value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| SdkError::Generic(format!("invalid header value: {}", e)))?;
        headers.insert(AUTHORIZATION, value);
        Ok(true)
    }
}
