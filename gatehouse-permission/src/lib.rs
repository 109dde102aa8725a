//! # Gatehouse Permission
//!
//! Compiles a nested permission catalogue into platform-annotated trees and
//! filters them per request.
//!
//! ```
//! use gatehouse_permission::{platform, PermissionCatalogue, PermissionDefinition};
//!
//! # fn main() -> Result<(), gatehouse_permission::PermissionError> {
//! let definitions = vec![PermissionDefinition::group(
//!     "order",
//!     "Orders",
//!     vec![PermissionDefinition::leaf("list", "List").platforms([platform::GROUP])],
//! )];
//!
//! let catalogue = PermissionCatalogue::compile(&definitions, &[platform::GROUP])?;
//! let visible = catalogue.filter(platform::GROUP, &["order.list"], false);
//! assert_eq!(visible[0].children[0].code, "order.list");
//! # Ok(())
//! # }
//! ```

mod compile;
mod definition;
mod error;
mod filter;
mod load;

pub use compile::{CompiledNode, Module, PermissionCatalogue};
pub use definition::{platform, PermissionDefinition};
pub use error::PermissionError;
pub use filter::{expand, filter, flatten, PermissionView, SimplePermission};
pub use load::{load_definitions, parse_json, parse_toml};
