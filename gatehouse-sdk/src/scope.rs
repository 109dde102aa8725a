use gatehouse_config::GatehouseConfig;
use gatehouse_permission::platform;
use gatehouse_store::{KeySpace, RevocationStore, StoreError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::error::SdkError;

/// Predicates shared by the cached scope records
pub trait PlatformScope {
    fn platform(&self) -> u16;

    /// A scope without a platform was never selected
    fn is_selected(&self) -> bool {
        self.platform() > 0
    }

    fn is_platform(&self) -> bool {
        self.platform() == platform::PLATFORM
    }

    fn is_group(&self) -> bool {
        self.platform() == platform::GROUP
    }

    fn is_region(&self) -> bool {
        self.platform() == platform::REGION
    }

    fn is_store(&self) -> bool {
        self.platform() == platform::STORE
    }
}

/// The organization a user currently acts for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleScope {
    pub user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    /// Display name of the platform, group or store
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    pub platform: u16,
    /// Assumed for a limited time on behalf of someone else
    #[serde(default)]
    pub temporary: bool,
    /// The scope to return to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub back: Option<Box<RoleScope>>,
}

impl RoleScope {
    pub fn new(user: impl Into<String>, platform: u16, name: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            organization_id: None,
            name: name.into(),
            group_id: None,
            platform,
            temporary: false,
            back: None,
        }
    }

    pub fn organization_id(mut self, id: impl Into<String>) -> Self {
        self.organization_id = Some(id.into());
        self
    }

    pub fn group_id(mut self, id: impl Into<String>) -> Self {
        self.group_id = Some(id.into());
        self
    }

    pub fn temporary(mut self, temporary: bool) -> Self {
        self.temporary = temporary;
        self
    }

    pub fn back(mut self, previous: RoleScope) -> Self {
        self.back = Some(Box::new(previous));
        self
    }

    pub fn has_organization(&self) -> bool {
        self.organization_id.is_some()
    }

    pub fn has_group(&self) -> bool {
        self.group_id.is_some()
    }

    pub fn has_back(&self) -> bool {
        self.back.is_some()
    }
}

impl PlatformScope for RoleScope {
    fn platform(&self) -> u16 {
        self.platform
    }
}

/// An organization borrowed for a limited time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporaryScope {
    pub organization_id: String,
    pub organization: String,
    pub platform: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub back: Option<Box<TemporaryScope>>,
}

impl TemporaryScope {
    pub fn new(
        platform: u16,
        organization_id: impl Into<String>,
        organization: impl Into<String>,
    ) -> Self {
        Self {
            organization_id: organization_id.into(),
            organization: organization.into(),
            platform,
            group_id: None,
            back: None,
        }
    }

    pub fn group_id(mut self, id: impl Into<String>) -> Self {
        self.group_id = Some(id.into());
        self
    }

    pub fn back(mut self, previous: TemporaryScope) -> Self {
        self.back = Some(Box::new(previous));
        self
    }

    pub fn has_back(&self) -> bool {
        self.back.is_some()
    }
}

impl PlatformScope for TemporaryScope {
    fn platform(&self) -> u16 {
        self.platform
    }
}

/// Short-lived store cache of role and temporary scopes.
///
/// Entries live for the scope TTL and are extended on activity with
/// `touch_*`. Independent of token refresh.
#[derive(Clone)]
pub struct ScopeCache {
    store: Arc<dyn RevocationStore>,
    keys: KeySpace,
    ttl: Duration,
    timeout: Duration,
}

impl fmt::Debug for ScopeCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeCache")
            .field("keys", &self.keys)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl ScopeCache {
    pub fn new(
        store: Arc<dyn RevocationStore>,
        keys: KeySpace,
        ttl: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            keys,
            ttl,
            timeout,
        }
    }

    pub fn from_config(config: &GatehouseConfig, store: Arc<dyn RevocationStore>) -> Self {
        let minutes = config.scope_ttl_minutes().max(1).unsigned_abs();
        Self::new(
            store,
            KeySpace::new(config.app_name.clone()),
            Duration::from_secs(minutes * 60),
            Duration::from_millis(config.auth.store_timeout_ms),
        )
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn put_role(&self, scope: &RoleScope) -> Result<(), SdkError> {
        self.put(&self.keys.role(&scope.user), scope).await
    }

    pub async fn role(&self, user: &str) -> Result<Option<RoleScope>, SdkError> {
        self.get(&self.keys.role(user)).await
    }

    /// Extend the role scope TTL. `false` when nothing is cached.
    pub async fn touch_role(&self, user: &str) -> Result<bool, SdkError> {
        self.touch(&self.keys.role(user)).await
    }

    pub async fn clear_role(&self, user: &str) -> Result<bool, SdkError> {
        self.clear(&self.keys.role(user)).await
    }

    pub async fn put_temporary(&self, user: &str, scope: &TemporaryScope) -> Result<(), SdkError> {
        self.put(&self.keys.temporary(user), scope).await
    }

    pub async fn temporary(&self, user: &str) -> Result<Option<TemporaryScope>, SdkError> {
        self.get(&self.keys.temporary(user)).await
    }

    pub async fn touch_temporary(&self, user: &str) -> Result<bool, SdkError> {
        self.touch(&self.keys.temporary(user)).await
    }

    pub async fn clear_temporary(&self, user: &str) -> Result<bool, SdkError> {
        self.clear(&self.keys.temporary(user)).await
    }

    async fn put<T: Serialize>(&self, key: &str, scope: &T) -> Result<(), SdkError> {
        let value = serde_json::to_string(scope)?;
        self.timed(self.store.set(key, &value, Some(self.ttl)))
            .await?;
        debug!(key, "scope cached");
        Ok(())
    }

    async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, SdkError> {
        match self.timed(self.store.get(key)).await? {
            Some(value) => Ok(Some(serde_json::from_str(&value)?)),
            None => Ok(None),
        }
    }

    async fn touch(&self, key: &str) -> Result<bool, SdkError> {
        Ok(self.timed(self.store.expire(key, self.ttl)).await?)
    }

    async fn clear(&self, key: &str) -> Result<bool, SdkError> {
        Ok(self.timed(self.store.del(key)).await?)
    }

    async fn timed<T>(
        &self,
        operation: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        tokio::time::timeout(self.timeout, operation)
            .await
            .map_err(|_| StoreError::Timeout)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatehouse_store::MemoryStore;
    use gatehouse_token::ManualClock;

    fn cache() -> (ScopeCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_700_000_000));
        let store = Arc::new(MemoryStore::with_clock(clock.clone()));
        let config = GatehouseConfig::new("shop", "shop-api", "secret")
            .to_builder()
            .lifetime_minutes(30)
            .scope_ttl_minutes(60)
            .build()
            .unwrap();
        (ScopeCache::from_config(&config, store), clock)
    }

    #[test]
    fn test_default_ttl_is_twice_the_lifetime_in_hours() {
        let config = GatehouseConfig::new("shop", "shop-api", "secret")
            .to_builder()
            .lifetime_minutes(30)
            .build()
            .unwrap();
        let cache = ScopeCache::from_config(&config, Arc::new(MemoryStore::new()));
        assert_eq!(cache.ttl(), Duration::from_secs(60 * 3600));
    }

    #[test]
    fn test_predicates() {
        let store = RoleScope::new("u1", platform::STORE, "Corner shop")
            .organization_id("s1")
            .group_id("g1")
            .back(RoleScope::new("u1", platform::PLATFORM, "Console"));
        assert!(store.is_selected());
        assert!(store.is_store());
        assert!(store.has_group());
        assert!(store.has_organization());
        assert!(store.has_back());
        assert!(store.back.as_ref().unwrap().is_platform());

        let temporary = TemporaryScope::new(platform::GROUP, "g1", "Group");
        assert!(temporary.is_group());
        assert!(!temporary.is_region());
        assert!(!temporary.has_back());

        assert!(!RoleScope::new("u1", 0, "").is_selected());
    }

    #[tokio::test]
    async fn test_role_round_trip_and_ttl() {
        let (cache, clock) = cache();
        assert_eq!(cache.ttl(), Duration::from_secs(60 * 60));
        assert_eq!(cache.role("u1").await.unwrap(), None);
        assert!(!cache.touch_role("u1").await.unwrap());

        let scope = RoleScope::new("u1", platform::STORE, "Corner shop").organization_id("s1");
        cache.put_role(&scope).await.unwrap();
        assert_eq!(cache.role("u1").await.unwrap(), Some(scope.clone()));

        clock.advance_minutes(59);
        assert!(cache.touch_role("u1").await.unwrap());
        clock.advance_minutes(59);
        assert_eq!(cache.role("u1").await.unwrap(), Some(scope));

        clock.advance_minutes(1);
        assert_eq!(cache.role("u1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_temporary_is_kept_apart_from_role() {
        let (cache, _) = cache();
        let role = RoleScope::new("u1", platform::PLATFORM, "Console");
        let temporary = TemporaryScope::new(platform::STORE, "s9", "Borrowed shop");

        cache.put_role(&role).await.unwrap();
        cache.put_temporary("u1", &temporary).await.unwrap();

        assert_eq!(cache.temporary("u1").await.unwrap(), Some(temporary));
        assert!(cache.clear_temporary("u1").await.unwrap());
        assert_eq!(cache.temporary("u1").await.unwrap(), None);
        assert_eq!(cache.role("u1").await.unwrap(), Some(role));
        assert!(cache.clear_role("u1").await.unwrap());
    }
}
