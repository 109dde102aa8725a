use gatehouse_config::{GatehouseConfig, RevocationPolicy};
use gatehouse_store::{HashWrite, KeySpace, RevocationStore, StoreError};
use gatehouse_token::{Claims, Clock, SecretResolver, TokenCodec, TokenError};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{RefreshError, SdkError};

/// Longest time a token id stays on the blacklist
pub const MAX_BLACKLIST_SECONDS: i64 = 7 * 86_400;

const RECORD_TOKEN: &str = "token";
const RECORD_CREATED_AT: &str = "created_at";
const BLACKLIST_JWT: &str = "jwt";

/// The part of [`GatehouseConfig`] the lifecycle manager reads
#[derive(Debug, Clone)]
pub struct LifecycleSettings {
    pub server_name: String,
    /// Issuer subject, before namespacing
    pub issuer: String,
    pub lifetime_minutes: i64,
    pub leeway_seconds: i64,
    pub grace_cap_seconds: i64,
    pub store_timeout: Duration,
}

impl LifecycleSettings {
    pub fn from_config(config: &GatehouseConfig) -> Self {
        Self {
            server_name: config.server_name.clone(),
            issuer: config.jwt.issuer.clone(),
            lifetime_minutes: config.jwt.lifetime_minutes,
            leeway_seconds: config.jwt.leeway_seconds,
            grace_cap_seconds: config.jwt.grace_cap_seconds,
            store_timeout: Duration::from_millis(config.auth.store_timeout_ms),
        }
    }
}

/// Parameters of a new token
///
/// ```
/// use gatehouse_sdk::IssueRequest;
///
/// let request = IssueRequest::new("u1")
///     .lifetime_minutes(60)
///     .refreshable(true)
///     .platform(4)
///     .organization_id("store-12")
///     .extension_field("locale", "en");
/// ```
#[derive(Debug, Clone, Default)]
pub struct IssueRequest {
    subject: String,
    issuer: Option<String>,
    lifetime_minutes: Option<i64>,
    refreshable: bool,
    platform: u16,
    organization_id: Option<String>,
    group_id: Option<String>,
    extension: Map<String, Value>,
}

impl IssueRequest {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            ..Self::default()
        }
    }

    /// Override the configured issuer subject. It is namespaced like the
    /// default.
    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn lifetime_minutes(mut self, minutes: i64) -> Self {
        self.lifetime_minutes = Some(minutes);
        self
    }

    pub fn refreshable(mut self, refreshable: bool) -> Self {
        self.refreshable = refreshable;
        self
    }

    pub fn platform(mut self, platform: u16) -> Self {
        self.platform = platform;
        self
    }

    pub fn organization_id(mut self, organization_id: impl Into<String>) -> Self {
        self.organization_id = Some(organization_id.into());
        self
    }

    pub fn group_id(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    pub fn extension(mut self, extension: Map<String, Value>) -> Self {
        self.extension = extension;
        self
    }

    pub fn extension_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extension.insert(key.into(), value.into());
        self
    }
}

/// Where a verified token stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    /// Within its validity window
    Valid,
    /// Past expiry but inside the grace window; eligible for refresh
    Expiring,
}

/// A token that passed verification
#[derive(Debug, Clone, PartialEq)]
pub struct Verification {
    pub claims: Claims,
    pub state: TokenState,
}

impl Verification {
    pub fn refresh_needed(&self) -> bool {
        self.state == TokenState::Expiring
    }
}

/// Issues, verifies, refreshes and revokes tokens.
///
/// Verification is local; refresh coordination and the blacklist go through
/// the [`RevocationStore`]. Every store round-trip is bounded by
/// `store_timeout`.
pub struct TokenManager {
    codec: TokenCodec,
    store: Arc<dyn RevocationStore>,
    keys: KeySpace,
    settings: LifecycleSettings,
}

impl fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenManager")
            .field("codec", &self.codec)
            .field("keys", &self.keys)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl TokenManager {
    pub fn new(
        config: &GatehouseConfig,
        store: Arc<dyn RevocationStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let codec = TokenCodec::with_clock(SecretResolver::new(config.jwt.secret.clone()), clock);
        Self::with_settings(
            codec,
            store,
            KeySpace::new(config.app_name.clone()),
            LifecycleSettings::from_config(config),
        )
    }

    pub fn with_settings(
        codec: TokenCodec,
        store: Arc<dyn RevocationStore>,
        keys: KeySpace,
        settings: LifecycleSettings,
    ) -> Self {
        Self {
            codec,
            store,
            keys,
            settings,
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn settings(&self) -> &LifecycleSettings {
        &self.settings
    }

    pub fn keys(&self) -> &KeySpace {
        &self.keys
    }

    fn now(&self) -> i64 {
        self.codec.clock().timestamp()
    }

    /// Prefix `raw` with the deployment namespace unless it already has it
    pub fn issuer(&self, raw: &str) -> String {
        let prefix = format!("{}:", self.settings.server_name);
        if raw.starts_with(&prefix) {
            raw.to_string()
        } else {
            format!("{}{}", prefix, raw)
        }
    }

    /// Post-expiry window in which `claims` can still be refreshed: half the
    /// original lifetime, capped.
    pub fn grace_seconds(&self, claims: &Claims) -> i64 {
        (claims.lifetime_seconds() / 2)
            .min(self.settings.grace_cap_seconds)
            .max(0)
    }

    /// Sign a new token valid from now for the requested lifetime
    pub fn issue(&self, request: IssueRequest) -> Result<String, SdkError> {
        let now = self.now();
        let lifetime = request
            .lifetime_minutes
            .unwrap_or(self.settings.lifetime_minutes);
        if lifetime <= 0 {
            return Err(TokenError::invalid_claims("exp", "lifetime must be positive").into());
        }
        let issuer = self.issuer(request.issuer.as_deref().unwrap_or(&self.settings.issuer));

        let claims = Claims::builder(issuer, request.subject)
            .window(now, lifetime.saturating_mul(60))
            .refreshable(request.refreshable)
            .platform(request.platform)
            .organization_id(request.organization_id)
            .group_id(request.group_id)
            .extension(request.extension)
            .build()?;

        let token = self.codec.encode(&claims)?;
        info!(sub = %claims.subject, exp = claims.expires_at, "token issued");
        Ok(token)
    }

    /// Sign caller-built claims as they are
    pub fn sign(&self, claims: &Claims) -> Result<String, SdkError> {
        Ok(self.codec.encode(claims)?)
    }

    pub fn verify(&self, token: &str) -> Result<Verification, SdkError> {
        self.verify_with(token, &[])
    }

    /// Verify `token`, preferring the first non-empty secret override.
    ///
    /// An expired token inside its grace window comes back as
    /// [`TokenState::Expiring`]; past the grace window it is
    /// [`TokenError::Expired`].
    pub fn verify_with(&self, token: &str, secrets: &[&str]) -> Result<Verification, SdkError> {
        let (claims, expired) = match self.codec.decode_with(token, secrets) {
            Ok(claims) => (claims, false),
            Err(TokenError::Expired { claims }) => (*claims, true),
            Err(e) => {
                debug!(error = %e, "token rejected");
                return Err(e.into());
            }
        };

        if !claims
            .issuer
            .starts_with(&format!("{}:", self.settings.server_name))
        {
            debug!(iss = %claims.issuer, "token issued by another deployment");
            return Err(TokenError::IssuedBeforeValid.into());
        }

        if !expired {
            return Ok(Verification {
                claims,
                state: TokenState::Valid,
            });
        }

        let grace_ends = claims.expires_at.saturating_add(self.grace_seconds(&claims));
        if self.now() < grace_ends {
            debug!(jti = %claims.token_id, "token expiring, refresh needed");
            Ok(Verification {
                claims,
                state: TokenState::Expiring,
            })
        } else {
            debug!(jti = %claims.token_id, "token past its grace window");
            Err(TokenError::Expired {
                claims: Box::new(claims),
            }
            .into())
        }
    }

    /// Exchange expiring claims for a fresh token.
    ///
    /// The first caller for an `issuer:subject` pair mints the token and
    /// publishes it in one atomic insert-if-absent write. Later callers read
    /// the published token back and get it while the record is younger than
    /// the leeway: the first positive value of `leeways`, else the configured
    /// one.
    pub async fn refresh(&self, claims: &Claims, leeways: &[i64]) -> Result<String, SdkError> {
        if !claims.refreshable {
            return Err(RefreshError::NotRefreshable.into());
        }

        let key = KeySpace::refresh(&claims.issuer, &claims.subject);

        let record = match self.timed(self.store.hget_all(&key)).await {
            Ok(record) => record,
            Err(e) => {
                warn!(key = %key, error = %e, "refresh record unreadable, minting a new token");
                HashMap::new()
            }
        };
        if !record.is_empty() {
            return self.converge(&key, &record, leeways);
        }

        let now = self.now();
        let lifetime = claims.lifetime_seconds();

        let mut renewed = claims.clone();
        renewed.token_id = String::new();
        renewed.issued_at = now;
        renewed.not_before = now;
        renewed.expires_at = now.saturating_add(lifetime);

        let token = self.codec.encode(&renewed)?;

        let fields = HashMap::from([
            (RECORD_TOKEN.to_string(), token.clone()),
            (RECORD_CREATED_AT.to_string(), now.to_string()),
        ]);
        let expire_at = renewed.expires_at.saturating_add(lifetime);

        match self
            .timed(self.store.hset_if_absent_expire_at(&key, fields, expire_at))
            .await
        {
            Ok(HashWrite::Written) => {
                info!(sub = %renewed.subject, exp = renewed.expires_at, "token refreshed");
                Ok(token)
            }
            Ok(HashWrite::Exists(record)) => {
                debug!(key = %key, "lost the refresh race");
                self.converge(&key, &record, leeways)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "refresh record not persisted");
                Err(RefreshError::PersistFailed(e.to_string()).into())
            }
        }
    }

    fn converge(
        &self,
        key: &str,
        record: &HashMap<String, String>,
        leeways: &[i64],
    ) -> Result<String, SdkError> {
        let token = record
            .get(RECORD_TOKEN)
            .ok_or_else(|| RefreshError::CorruptRecord(format!("{} has no token", key)))?;
        let created_at = record
            .get(RECORD_CREATED_AT)
            .and_then(|value| value.parse::<i64>().ok())
            .ok_or_else(|| RefreshError::CorruptRecord(format!("{} has no creation time", key)))?;

        let elapsed = (self.now() - created_at).abs();
        let leeway = leeways
            .iter()
            .copied()
            .find(|leeway| *leeway > 0)
            .unwrap_or(self.settings.leeway_seconds);

        if elapsed > leeway {
            debug!(key = %key, elapsed, leeway, "refresh record is stale");
            return Err(RefreshError::WindowExceeded { elapsed, leeway }.into());
        }

        Ok(token.clone())
    }

    /// Blacklist `token_id` until `until` (unix seconds), for at most seven
    /// days and at least one second.
    pub async fn revoke(&self, token_id: &str, until: i64) -> Result<(), SdkError> {
        if token_id.is_empty() {
            return Err(TokenError::invalid_claims("jti", "cannot be empty").into());
        }

        let now = self.now();
        let seconds = (until - now).min(MAX_BLACKLIST_SECONDS).max(1);
        let ttl = Duration::from_secs(seconds.unsigned_abs());

        self.timed(self.store.set(
            &self.blacklist_key(token_id),
            &now.to_string(),
            Some(ttl),
        ))
        .await?;

        info!(jti = %token_id, ttl = seconds, "token revoked");
        Ok(())
    }

    /// Blacklist the token behind `claims` until it could no longer be
    /// refreshed.
    pub async fn logout(&self, claims: &Claims) -> Result<(), SdkError> {
        let dead_at = claims.expires_at.saturating_add(self.grace_seconds(claims));
        self.revoke(&claims.token_id, dead_at).await
    }

    /// Whether `token_id` is on the blacklist. Store failures are returned
    /// as they are; see [`TokenManager::is_revoked_with_policy`].
    pub async fn is_revoked(&self, token_id: &str) -> Result<bool, StoreError> {
        self.timed(self.store.exists(&self.blacklist_key(token_id)))
            .await
    }

    /// [`TokenManager::is_revoked`] with store failures resolved by `policy`
    pub async fn is_revoked_with_policy(&self, token_id: &str, policy: RevocationPolicy) -> bool {
        match self.is_revoked(token_id).await {
            Ok(revoked) => revoked,
            Err(e) => {
                warn!(jti = %token_id, error = %e, ?policy, "blacklist check failed");
                policy == RevocationPolicy::FailClosed
            }
        }
    }

    fn blacklist_key(&self, token_id: &str) -> String {
        self.keys.blacklist([BLACKLIST_JWT, token_id])
    }

    async fn timed<T>(
        &self,
        operation: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        tokio::time::timeout(self.settings.store_timeout, operation)
            .await
            .map_err(|_| StoreError::Timeout)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatehouse_store::MemoryStore;
    use gatehouse_token::ManualClock;

    const START: i64 = 1_700_000_000;

    fn manager() -> (TokenManager, Arc<ManualClock>, Arc<MemoryStore>) {
        let clock = Arc::new(ManualClock::new(START));
        let store = Arc::new(MemoryStore::with_clock(clock.clone()));
        let config = GatehouseConfig::new("shop", "shop-api", "secret");
        let manager = TokenManager::new(&config, store.clone(), clock.clone());
        (manager, clock, store)
    }

    #[test]
    fn test_issuer_is_idempotent() {
        let (manager, _, _) = manager();
        assert_eq!(manager.issuer("api"), "shop-api:api");
        assert_eq!(manager.issuer("shop-api:api"), "shop-api:api");
        assert_eq!(manager.issuer(&manager.issuer("x")), "shop-api:x");
    }

    #[test]
    fn test_grace_is_half_the_lifetime_capped() {
        let (manager, _, _) = manager();
        let claims = Claims::builder("shop-api:api", "u1")
            .window(START, 3600)
            .build()
            .unwrap();
        assert_eq!(manager.grace_seconds(&claims), 1800);

        let long = Claims::builder("shop-api:api", "u1")
            .window(START, 120 * 86_400)
            .build()
            .unwrap();
        assert_eq!(manager.grace_seconds(&long), 30 * 86_400);
    }

    #[test]
    fn test_issue_then_verify_is_valid() {
        let (manager, _, _) = manager();
        let token = manager
            .issue(IssueRequest::new("u1").refreshable(true).platform(4))
            .unwrap();
        let verification = manager.verify(&token).unwrap();
        assert_eq!(verification.state, TokenState::Valid);
        assert!(!verification.refresh_needed());
        assert_eq!(verification.claims.issuer, "shop-api:api");
        assert_eq!(verification.claims.lifetime_seconds(), 120 * 60);
    }

    #[test]
    fn test_issue_rejects_unusable_lifetimes() {
        let (manager, _, _) = manager();
        for minutes in [0, -5] {
            assert!(matches!(
                manager.issue(IssueRequest::new("u1").lifetime_minutes(minutes)),
                Err(SdkError::Token(TokenError::InvalidClaims { field: "exp", .. }))
            ));
        }

        let token = manager
            .issue(IssueRequest::new("u1").lifetime_minutes(i64::MAX / 60))
            .unwrap();
        let claims = manager.verify(&token).unwrap().claims;
        assert_eq!(claims.expires_at, i64::MAX);
    }

    #[test]
    fn test_foreign_issuer_is_rejected() {
        let (manager, _, _) = manager();
        let claims = Claims::builder("other-api:api", "u1")
            .window(START, 3600)
            .build()
            .unwrap();
        let token = manager.sign(&claims).unwrap();
        assert!(matches!(
            manager.verify(&token),
            Err(SdkError::Token(TokenError::IssuedBeforeValid))
        ));
    }

    #[test]
    fn test_expiring_then_dead() {
        let (manager, clock, _) = manager();
        let token = manager
            .issue(IssueRequest::new("u1").lifetime_minutes(60))
            .unwrap();

        clock.advance_minutes(60);
        assert!(manager.verify(&token).unwrap().refresh_needed());

        clock.advance_minutes(29);
        assert!(manager.verify(&token).unwrap().refresh_needed());

        clock.advance_minutes(1);
        let err = manager.verify(&token).unwrap_err();
        assert!(matches!(err, SdkError::Token(TokenError::Expired { .. })));
    }

    #[tokio::test]
    async fn test_refresh_publishes_and_converges() {
        let (manager, clock, store) = manager();
        let token = manager
            .issue(IssueRequest::new("u1").lifetime_minutes(60).refreshable(true))
            .unwrap();
        clock.advance_minutes(61);
        let claims = manager.verify(&token).unwrap().claims;

        let first = manager.refresh(&claims, &[]).await.unwrap();
        let record = store.hget_all("shop-api:api:u1").await.unwrap();
        assert_eq!(record[RECORD_TOKEN], first);
        assert_eq!(record[RECORD_CREATED_AT], clock.timestamp().to_string());

        clock.advance_seconds(10);
        let second = manager.refresh(&claims, &[]).await.unwrap();
        assert_eq!(first, second);

        clock.advance_seconds(1);
        assert!(matches!(
            manager.refresh(&claims, &[]).await,
            Err(SdkError::Refresh(RefreshError::WindowExceeded {
                elapsed: 11,
                leeway: 10
            }))
        ));

        // first positive override wins
        assert_eq!(manager.refresh(&claims, &[0, 30, 5]).await.unwrap(), first);

        let renewed = manager.verify(&first).unwrap();
        assert_eq!(renewed.state, TokenState::Valid);
        assert_ne!(renewed.claims.token_id, claims.token_id);
        assert_eq!(renewed.claims.lifetime_seconds(), 3600);
    }

    #[tokio::test]
    async fn test_refresh_requires_refreshable_claims() {
        let (manager, clock, _) = manager();
        let token = manager
            .issue(IssueRequest::new("u1").lifetime_minutes(60))
            .unwrap();
        clock.advance_minutes(61);
        let claims = manager.verify(&token).unwrap().claims;
        assert!(matches!(
            manager.refresh(&claims, &[]).await,
            Err(SdkError::Refresh(RefreshError::NotRefreshable))
        ));
    }

    #[tokio::test]
    async fn test_corrupt_record() {
        let (manager, _, store) = manager();
        store
            .hset(
                "shop-api:api:u1",
                HashMap::from([(RECORD_TOKEN.to_string(), "t".to_string())]),
            )
            .await
            .unwrap();
        let claims = Claims::builder("shop-api:api", "u1")
            .window(START, 60)
            .refreshable(true)
            .build()
            .unwrap();
        assert!(matches!(
            manager.refresh(&claims, &[]).await,
            Err(SdkError::Refresh(RefreshError::CorruptRecord(_)))
        ));
    }

    #[tokio::test]
    async fn test_revoke_ttl() {
        let (manager, clock, _) = manager();
        let token = manager
            .issue(IssueRequest::new("u1").lifetime_minutes(60))
            .unwrap();
        let claims = manager.verify(&token).unwrap().claims;

        manager.logout(&claims).await.unwrap();
        assert!(manager.is_revoked(&claims.token_id).await.unwrap());

        // 60 minutes of validity plus 30 minutes of grace
        clock.advance_minutes(90);
        clock.advance_seconds(-1);
        assert!(manager.is_revoked(&claims.token_id).await.unwrap());
        clock.advance_seconds(1);
        assert!(!manager.is_revoked(&claims.token_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_revoke_is_capped_at_seven_days() {
        let (manager, clock, _) = manager();
        manager.revoke("jti-1", START + 30 * 86_400).await.unwrap();
        clock.advance_seconds(MAX_BLACKLIST_SECONDS - 1);
        assert!(manager.is_revoked("jti-1").await.unwrap());
        clock.advance_seconds(1);
        assert!(!manager.is_revoked("jti-1").await.unwrap());

        assert!(matches!(
            manager.revoke("", START + 60).await,
            Err(SdkError::Token(TokenError::InvalidClaims { field: "jti", .. }))
        ));
    }
}
