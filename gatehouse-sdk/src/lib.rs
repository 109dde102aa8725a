//! # Gatehouse SDK
//!
//! Token lifecycle, request authentication and permission trees for services
//! that hand out bearer tokens.
//!
//! This crate combines functionality from:
//! - `gatehouse-token`: Signed claims, secrets and clocks
//! - `gatehouse-config`: Configuration management
//! - `gatehouse-store`: The revocation store seam
//! - `gatehouse-permission`: Permission catalogue compiler and filter
//!
//! ## Features
//!
//! - **Refresh coordination**: Concurrent requests holding the same expiring
//!   token converge on one replacement
//! - **Logout**: Token ids are blacklisted until the token could no longer be
//!   refreshed
//! - **Explicit revocation policy**: Blacklist lookups that fail are resolved
//!   by a named fail-closed/fail-open setting
//! - **Typed request context**: Verified claims and cached scopes without
//!   string-keyed lookups
//! - **Permission checks**: Grants scoped by platform and organization, with a
//!   developer bypass
//!
//! ## Usage
//!
//! ```no_run
//! use gatehouse_sdk::{Gatehouse, GatehouseConfig, IssueRequest};
//!
//! # async fn run() -> Result<(), gatehouse_sdk::SdkError> {
//! let gatehouse = Gatehouse::from_config(GatehouseConfig::new("shop", "shop-api", "s3cret"))?;
//!
//! let token = gatehouse
//!     .tokens()
//!     .issue(IssueRequest::new("u1").refreshable(true))?;
//!
//! let mut headers = http::HeaderMap::new();
//! headers.insert(http::header::AUTHORIZATION, format!("Bearer {}", token).parse().unwrap());
//! let context = gatehouse.authenticator().authenticate(&headers).await;
//! assert!(context.is_ok());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use tracing::info;

mod authenticator;
mod authorizer;
mod context;
mod error;
mod lifecycle;
pub mod password;
mod scope;

pub use authenticator::{Authenticator, RefreshHook, Unauthorized};
pub use authorizer::{
    name_of_developer, name_of_role, name_of_user, Authorizer, Forbidden, GrantStore, Grants,
    MemoryGrants, PermissionScope, DEVELOPER,
};
pub use context::RequestContext;
pub use error::{ErrorKind, RefreshError, SdkError};
pub use lifecycle::{
    IssueRequest, LifecycleSettings, TokenManager, TokenState, Verification,
    MAX_BLACKLIST_SECONDS,
};
pub use scope::{PlatformScope, RoleScope, ScopeCache, TemporaryScope};

// Re-export everything from the component crates
pub use gatehouse_config::{
    try_load_default_config, ConfigError, GatehouseConfig, GatehouseConfigBuilder, RevocationPolicy,
};
pub use gatehouse_permission::{
    load_definitions, platform, CompiledNode, Module, PermissionCatalogue, PermissionDefinition,
    PermissionError, PermissionView, SimplePermission,
};
pub use gatehouse_store::{HashWrite, KeySpace, MemoryStore, RevocationStore, StoreError};
pub use gatehouse_token::{
    generate_secret, strip_bearer, Claims, ClaimsBuilder, Clock, ManualClock, SecretResolver,
    SystemClock, TokenCodec, TokenError,
};

/// Everything a service needs, wired from one configuration
///
/// The permission catalogue is compiled once here and shared read-only.
#[derive(Debug, Clone)]
pub struct Gatehouse {
    config: GatehouseConfig,
    tokens: Arc<TokenManager>,
    catalogue: Arc<PermissionCatalogue>,
    scopes: ScopeCache,
    authenticator: Authenticator,
}

impl Gatehouse {
    /// Build with an in-memory store, the system clock and the catalogue
    /// named by `auth.permissions_file`, if any
    pub fn from_config(config: GatehouseConfig) -> Result<Self, SdkError> {
        GatehouseBuilder::new(config).build()
    }

    pub fn builder(config: GatehouseConfig) -> GatehouseBuilder {
        GatehouseBuilder::new(config)
    }

    pub fn config(&self) -> &GatehouseConfig {
        &self.config
    }

    pub fn tokens(&self) -> &Arc<TokenManager> {
        &self.tokens
    }

    pub fn catalogue(&self) -> &Arc<PermissionCatalogue> {
        &self.catalogue
    }

    pub fn scopes(&self) -> &ScopeCache {
        &self.scopes
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    /// Permission checks against the shared catalogue
    pub fn authorizer(&self, grants: Arc<dyn GrantStore>) -> Authorizer {
        Authorizer::new(self.catalogue.clone(), grants)
    }
}

/// Builder for [`Gatehouse`] instances
pub struct GatehouseBuilder {
    config: GatehouseConfig,
    store: Option<Arc<dyn RevocationStore>>,
    clock: Option<Arc<dyn Clock>>,
    definitions: Option<Vec<PermissionDefinition>>,
    on_refresh: Option<RefreshHook>,
}

impl GatehouseBuilder {
    pub fn new(config: GatehouseConfig) -> Self {
        Self {
            config,
            store: None,
            clock: None,
            definitions: None,
            on_refresh: None,
        }
    }

    /// Use a shared store instead of a private in-memory one
    pub fn store(mut self, store: Arc<dyn RevocationStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Use these definitions instead of `auth.permissions_file`
    pub fn definitions(mut self, definitions: Vec<PermissionDefinition>) -> Self {
        self.definitions = Some(definitions);
        self
    }

    /// See [`Authenticator::on_refresh`]
    pub fn on_refresh(mut self, hook: impl Fn(&RequestContext) + Send + Sync + 'static) -> Self {
        self.on_refresh = Some(Arc::new(hook));
        self
    }

    /// Validate the configuration, compile the catalogue and wire the
    /// components
    pub fn build(self) -> Result<Gatehouse, SdkError> {
        let config = self.config;
        config.validate()?;

        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock) as Arc<dyn Clock>);
        let store = self.store.unwrap_or_else(|| {
            Arc::new(MemoryStore::with_clock(clock.clone())) as Arc<dyn RevocationStore>
        });

        let definitions = match (self.definitions, &config.auth.permissions_file) {
            (Some(definitions), _) => definitions,
            (None, Some(path)) => load_definitions(path)?,
            (None, None) => Vec::new(),
        };
        let catalogue = Arc::new(PermissionCatalogue::compile(
            &definitions,
            &config.auth.platforms,
        )?);

        let tokens = Arc::new(TokenManager::new(&config, store.clone(), clock));
        let scopes = ScopeCache::from_config(&config, store);
        let mut authenticator = Authenticator::new(tokens.clone(), config.auth.revocation_policy);
        if let Some(hook) = self.on_refresh {
            authenticator = authenticator.on_refresh(hook);
        }

        info!(
            app = %config.app_name,
            server = %config.server_name,
            policy = ?config.auth.revocation_policy,
            "gatehouse ready"
        );

        Ok(Gatehouse {
            config,
            tokens,
            catalogue,
            scopes,
            authenticator,
        })
    }
}
