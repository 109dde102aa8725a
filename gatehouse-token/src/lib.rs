//! # Gatehouse Token
//!
//! Signed, time-bounded bearer tokens for the Gatehouse engine.
//!
//! This crate issues and verifies HS256 JWTs (through `jsonwebtoken`)
//! carrying a [`Claims`] payload. It has no storage or networking
//! dependencies; refresh coordination and revocation live in
//! `gatehouse-sdk`.
//!
//! ## Features
//!
//! - Secret resolution: a configured default secret with per-call overrides
//! - Claims validation: issuer, subject and the validity window are mandatory
//! - Token ids: derived per issuance from a hashed random nonce
//! - Recoverable expiry: [`TokenError::Expired`] carries the decoded claims
//! - Injectable time through the [`Clock`] trait
//!
//! ## Usage
//!
//! ```no_run
//! use gatehouse_token::{Claims, SecretResolver, TokenCodec, TokenError};
//!
//! fn main() -> Result<(), TokenError> {
//!     let codec = TokenCodec::new(SecretResolver::new("YOUR_SECRET"));
//!     let now = chrono::Utc::now().timestamp();
//!
//!     let claims = Claims::builder("shop:api", "user123")
//!         .window(now, 60 * 60)
//!         .refreshable(true)
//!         .build()?;
//!
//!     let token = codec.encode(&claims)?;
//!     match codec.decode(&token) {
//!         Ok(claims) => println!("valid token for {}", claims.subject),
//!         Err(TokenError::Expired { claims }) => println!("expired token for {}", claims.subject),
//!         Err(e) => return Err(e),
//!     }
//!     Ok(())
//! }
//! ```

mod claims;
mod clock;
mod codec;
mod error;
mod secret;
mod utils;

pub use claims::{Claims, ClaimsBuilder};
pub use clock::{Clock, ManualClock, SystemClock};
pub use codec::TokenCodec;
pub use error::TokenError;
pub use secret::{generate_secret, SecretResolver, DEFAULT_SECRET_LENGTH};
pub use utils::strip_bearer;
