//! # Gatehouse
//!
//! Bearer token lifecycle and permission trees.
//!
//! Gatehouse issues signed, time-bounded session tokens, verifies them with a
//! grace window after expiry, coordinates concurrent refreshes through a
//! shared store so that racing requests converge on one replacement token,
//! and blacklists token ids on logout. Alongside, it compiles a nested
//! permission catalogue into platform-annotated trees and filters them per
//! request.
//!
//! This crate re-exports `gatehouse-sdk` and adds [`telemetry`] for binaries.
//!
//! ## Feature Flags
//!
//! - `toml`: Enables configuration and permission catalogue loading from TOML
//!   files (default)
//!
//! ## Basic Usage
//!
//! ```rust
//! use gatehouse::{Gatehouse, GatehouseConfig, IssueRequest, TokenState};
//!
//! # fn example() -> Result<(), gatehouse::SdkError> {
//! let config = GatehouseConfig::builder()
//!     .app_name("shop")
//!     .server_name("shop-api")
//!     .secret("s3cret")
//!     .lifetime_minutes(60)
//!     .build()?;
//! let gatehouse = Gatehouse::from_config(config)?;
//!
//! let token = gatehouse
//!     .tokens()
//!     .issue(IssueRequest::new("u1").refreshable(true))?;
//!
//! let verification = gatehouse.tokens().verify(&token)?;
//! assert_eq!(verification.state, TokenState::Valid);
//! # Ok(())
//! # }
//! ```
//!
//! ## Permission trees
//!
//! ```rust
//! use gatehouse::{platform, Gatehouse, GatehouseConfig, PermissionDefinition};
//!
//! # fn example() -> Result<(), gatehouse::SdkError> {
//! let definitions = vec![PermissionDefinition::group(
//!     "order",
//!     "Orders",
//!     vec![
//!         PermissionDefinition::leaf("list", "List").platforms([platform::GROUP]),
//!         PermissionDefinition::leaf("export", "Export").common(),
//!     ],
//! )];
//!
//! let config = GatehouseConfig::builder()
//!     .app_name("shop")
//!     .server_name("shop-api")
//!     .secret("s3cret")
//!     .platforms(vec![platform::GROUP, platform::STORE])
//!     .build()?;
//! let gatehouse = Gatehouse::builder(config).definitions(definitions).build()?;
//!
//! let granted = gatehouse
//!     .catalogue()
//!     .simple(platform::GROUP, &["order.list"], false);
//! assert_eq!(granted.len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! ```rust,no_run
//! use gatehouse::GatehouseConfig;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // From a JSON file
//! let config = GatehouseConfig::from_file("./gatehouse.json")?;
//!
//! // From environment variables
//! let config = GatehouseConfig::from_env("GATEHOUSE")?;
//!
//! // From environment variables, with the secret in a file
//! let config = GatehouseConfig::from_env_or_file("GATEHOUSE")?;
//! # Ok(())
//! # }
//! ```

pub mod telemetry;

pub use gatehouse_sdk::*;
