use serde::{Deserialize, Serialize};

/// Platform codes a permission leaf can be visible to
pub mod platform {
    /// Operator console
    pub const PLATFORM: u16 = 1;
    /// Group (clique) of organizations
    pub const GROUP: u16 = 2;
    /// Region scope, always available
    pub const REGION: u16 = 3;
    /// Single store
    pub const STORE: u16 = 4;

    /// Codes accepted in the configured default platform list
    pub const CONFIGURABLE: [u16; 3] = [PLATFORM, GROUP, STORE];

    pub fn is_known(code: u16) -> bool {
        matches!(code, PLATFORM | GROUP | REGION | STORE)
    }

    pub fn name(code: u16) -> Option<&'static str> {
        match code {
            PLATFORM => Some("platform"),
            GROUP => Some("group"),
            REGION => Some("region"),
            STORE => Some("store"),
            _ => None,
        }
    }
}

/// A node of the static permission catalogue.
///
/// The top level names modules, the bottom level names permissions, and
/// anything in between only groups. `common` and `platforms` mean something
/// only on leaves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionDefinition {
    /// Code segment, joined with the ancestors' segments by `.`
    pub code: String,
    pub name: String,
    /// Visible to every default platform
    #[serde(default)]
    pub common: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub platforms: Vec<u16>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<PermissionDefinition>,
}

impl PermissionDefinition {
    /// A leaf visible to the default platforms
    pub fn leaf(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            common: false,
            platforms: Vec::new(),
            children: Vec::new(),
        }
    }

    /// A branch grouping `children`
    pub fn group(
        code: impl Into<String>,
        name: impl Into<String>,
        children: Vec<PermissionDefinition>,
    ) -> Self {
        Self {
            children,
            ..Self::leaf(code, name)
        }
    }

    pub fn common(mut self) -> Self {
        self.common = true;
        self
    }

    pub fn platforms(mut self, platforms: impl Into<Vec<u16>>) -> Self {
        self.platforms = platforms.into();
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}
