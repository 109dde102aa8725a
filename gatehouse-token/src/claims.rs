use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::error::TokenError;

const NONCE_LENGTH: usize = 32;

/// The payload of a signed token.
///
/// Registered fields use their standard short names on the wire (`iss`,
/// `sub`, `jti`, `iat`, `nbf`, `exp`). All timestamps are unix seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "iss")]
    pub issuer: String,

    #[serde(rename = "sub")]
    pub subject: String,

    /// Unique per issuance. Assigned by the codec when empty.
    #[serde(rename = "jti", default, skip_serializing_if = "String::is_empty")]
    pub token_id: String,

    #[serde(rename = "iat")]
    pub issued_at: i64,

    #[serde(rename = "nbf")]
    pub not_before: i64,

    #[serde(rename = "exp")]
    pub expires_at: i64,

    #[serde(rename = "ref", default, skip_serializing_if = "is_false")]
    pub refreshable: bool,

    /// Platform code, `0` when unset
    #[serde(rename = "plt", default, skip_serializing_if = "is_zero")]
    pub platform: u16,

    #[serde(rename = "org", default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,

    #[serde(rename = "clq", default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,

    #[serde(rename = "ext", default, skip_serializing_if = "Map::is_empty")]
    pub extension: Map<String, Value>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_zero(value: &u16) -> bool {
    *value == 0
}

impl Claims {
    /// Start building claims for `subject` issued by `issuer`
    pub fn builder(issuer: impl Into<String>, subject: impl Into<String>) -> ClaimsBuilder {
        ClaimsBuilder::new(issuer, subject)
    }

    /// Check the mandatory fields and the ordering
    /// `not_before <= issued_at <= expires_at`.
    pub fn validate(&self) -> Result<(), TokenError> {
        if self.issuer.is_empty() {
            return Err(TokenError::invalid_claims("iss", "cannot be empty"));
        }
        if self.subject.is_empty() {
            return Err(TokenError::invalid_claims("sub", "cannot be empty"));
        }
        if self.issued_at <= 0 {
            return Err(TokenError::invalid_claims("iat", "cannot be empty"));
        }
        if self.not_before <= 0 {
            return Err(TokenError::invalid_claims("nbf", "cannot be empty"));
        }
        if self.expires_at <= 0 {
            return Err(TokenError::invalid_claims("exp", "cannot be empty"));
        }
        if self.not_before > self.issued_at {
            return Err(TokenError::invalid_claims(
                "nbf",
                "cannot be later than the issue time",
            ));
        }
        if self.issued_at > self.expires_at {
            return Err(TokenError::invalid_claims(
                "exp",
                "cannot be earlier than the issue time",
            ));
        }
        Ok(())
    }

    /// Length of the validity window in seconds
    pub fn lifetime_seconds(&self) -> i64 {
        self.expires_at - self.issued_at
    }

    /// Derive a fresh token id from the issuer, subject, issue time and a
    /// random nonce.
    pub fn derive_token_id(&self) -> String {
        let nonce: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(NONCE_LENGTH)
            .map(char::from)
            .collect();

        let material = format!(
            "{}:{}:{}:{}",
            self.issuer, self.subject, self.issued_at, nonce
        );

        hex::encode(Sha256::digest(material.as_bytes()))
    }
}

/// Builder for [`Claims`]. `build` validates the result.
#[derive(Debug, Clone)]
pub struct ClaimsBuilder {
    claims: Claims,
}

impl ClaimsBuilder {
    pub fn new(issuer: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            claims: Claims {
                issuer: issuer.into(),
                subject: subject.into(),
                token_id: String::new(),
                issued_at: 0,
                not_before: 0,
                expires_at: 0,
                refreshable: false,
                platform: 0,
                organization_id: None,
                group_id: None,
                extension: Map::new(),
            },
        }
    }

    /// Set `iat` and `nbf` to `issued_at` and `exp` to `issued_at + lifetime_seconds`,
    /// saturating at `i64::MAX`
    pub fn window(mut self, issued_at: i64, lifetime_seconds: i64) -> Self {
        self.claims.issued_at = issued_at;
        self.claims.not_before = issued_at;
        self.claims.expires_at = issued_at.saturating_add(lifetime_seconds);
        self
    }

    pub fn issued_at(mut self, issued_at: i64) -> Self {
        self.claims.issued_at = issued_at;
        self
    }

    pub fn not_before(mut self, not_before: i64) -> Self {
        self.claims.not_before = not_before;
        self
    }

    pub fn expires_at(mut self, expires_at: i64) -> Self {
        self.claims.expires_at = expires_at;
        self
    }

    pub fn refreshable(mut self, refreshable: bool) -> Self {
        self.claims.refreshable = refreshable;
        self
    }

    pub fn platform(mut self, platform: u16) -> Self {
        self.claims.platform = platform;
        self
    }

    pub fn organization_id(mut self, organization_id: Option<String>) -> Self {
        self.claims.organization_id = organization_id;
        self
    }

    pub fn group_id(mut self, group_id: Option<String>) -> Self {
        self.claims.group_id = group_id;
        self
    }

    pub fn extension(mut self, extension: Map<String, Value>) -> Self {
        self.claims.extension = extension;
        self
    }

    pub fn extension_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.claims.extension.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> Result<Claims, TokenError> {
        self.claims.validate()?;
        Ok(self.claims)
    }
}
