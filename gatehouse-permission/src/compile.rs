use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

use crate::definition::{platform, PermissionDefinition};
use crate::error::PermissionError;

/// A catalogue node with its fully qualified code.
///
/// Only leaves carry `platforms`, and a compiled leaf's set is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledNode {
    pub code: String,
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub platforms: Vec<u16>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<CompiledNode>,
}

impl CompiledNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn visible_to(&self, platform: u16) -> bool {
        self.platforms.contains(&platform)
    }
}

/// The leaves of one top-level module visible to a platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Module {
    pub code: String,
    pub name: String,
    pub permissions: Vec<String>,
}

/// Immutable snapshot of the compiled permission catalogue.
///
/// Built once at startup and shared read-only between requests.
#[derive(Debug, Clone, Default)]
pub struct PermissionCatalogue {
    trees: Vec<CompiledNode>,
    platforms: Vec<u16>,
    modules: BTreeMap<u16, Vec<Module>>,
}

impl PermissionCatalogue {
    /// Compile `definitions` against the deployment's default platforms.
    ///
    /// The region platform is always added to the defaults. A leaf's
    /// platforms are the defaults when it is common, its own platforms when
    /// it lists any, and the defaults otherwise.
    ///
    /// # Errors
    ///
    /// [`PermissionError::InvalidPlatformConfig`] when a default platform is
    /// not configurable, [`PermissionError::EmptyCode`] when a node has no
    /// code.
    pub fn compile(
        definitions: &[PermissionDefinition],
        default_platforms: &[u16],
    ) -> Result<Self, PermissionError> {
        if let Some(code) = default_platforms
            .iter()
            .find(|code| !platform::CONFIGURABLE.contains(code))
        {
            return Err(PermissionError::InvalidPlatformConfig(*code));
        }

        let mut platforms = default_platforms.to_vec();
        platforms.push(platform::REGION);

        let trees = compile_nodes(definitions, &[], &platforms)?;

        let mut modules = BTreeMap::new();
        if !trees.is_empty() {
            for code in &platforms {
                modules.insert(*code, collect_modules(&trees, *code));
            }
        }

        info!(
            modules = trees.len(),
            leaves = count_leaves(&trees),
            platforms = ?platforms,
            "permission catalogue compiled"
        );

        Ok(Self {
            trees,
            platforms,
            modules,
        })
    }

    pub fn trees(&self) -> &[CompiledNode] {
        &self.trees
    }

    /// Default platforms including region
    pub fn platforms(&self) -> &[u16] {
        &self.platforms
    }

    /// Module view of a platform; empty for platforms outside the defaults
    pub fn modules(&self, platform: u16) -> &[Module] {
        self.modules
            .get(&platform)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Look up a node by its qualified code
    pub fn find(&self, code: &str) -> Option<&CompiledNode> {
        find_node(&self.trees, code)
    }
}

fn compile_nodes(
    definitions: &[PermissionDefinition],
    prefix: &[&str],
    default_platforms: &[u16],
) -> Result<Vec<CompiledNode>, PermissionError> {
    let mut nodes = Vec::with_capacity(definitions.len());

    for definition in definitions {
        if definition.code.is_empty() {
            return Err(PermissionError::EmptyCode(prefix.join(".")));
        }

        let mut codes = prefix.to_vec();
        codes.push(&definition.code);

        let children = compile_nodes(&definition.children, &codes, default_platforms)?;

        let platforms = if !children.is_empty() {
            Vec::new()
        } else if definition.common || definition.platforms.is_empty() {
            default_platforms.to_vec()
        } else {
            definition.platforms.clone()
        };

        nodes.push(CompiledNode {
            code: codes.join("."),
            name: definition.name.clone(),
            platforms,
            children,
        });
    }

    Ok(nodes)
}

fn collect_modules(trees: &[CompiledNode], platform: u16) -> Vec<Module> {
    trees
        .iter()
        .filter_map(|tree| {
            let mut permissions = Vec::new();
            collect_leaves(&tree.children, platform, &mut permissions);
            (!permissions.is_empty()).then(|| Module {
                code: tree.code.clone(),
                name: tree.name.clone(),
                permissions,
            })
        })
        .collect()
}

fn collect_leaves(nodes: &[CompiledNode], platform: u16, out: &mut Vec<String>) {
    for node in nodes {
        if !node.is_leaf() {
            collect_leaves(&node.children, platform, out);
        } else if node.visible_to(platform) {
            out.push(node.code.clone());
        }
    }
}

fn count_leaves(nodes: &[CompiledNode]) -> usize {
    nodes
        .iter()
        .map(|node| {
            if node.is_leaf() {
                1
            } else {
                count_leaves(&node.children)
            }
        })
        .sum()
}

fn find_node<'a>(nodes: &'a [CompiledNode], code: &str) -> Option<&'a CompiledNode> {
    for node in nodes {
        if node.code == code {
            return Some(node);
        }
        if code.starts_with(&format!("{}.", node.code)) {
            return find_node(&node.children, code);
        }
    }
    None
}
