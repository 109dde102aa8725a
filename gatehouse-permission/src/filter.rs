use serde::Serialize;
use std::collections::HashSet;

use crate::compile::{CompiledNode, PermissionCatalogue};

/// A node of a filtered tree. Platform gating is never exposed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionView {
    pub code: String,
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<PermissionView>,
}

impl PermissionView {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// A granted leaf without its ancestry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimplePermission {
    pub code: String,
    pub name: String,
}

/// Prune `tree` to what a request on `platform` holding `granted` may see.
///
/// A branch survives when any child survives. A leaf visible to a non-zero
/// `platform` survives when `allow_empty` is set or its code is granted. A
/// leaf that is not visible to `platform` still survives when its code is
/// explicitly granted and `allow_empty` is unset.
pub fn filter<S: AsRef<str>>(
    tree: &[CompiledNode],
    platform: u16,
    granted: &[S],
    allow_empty: bool,
) -> Vec<PermissionView> {
    let granted = granted_set(granted);
    prune(tree, &|node: &CompiledNode| {
        keep_leaf(node, platform, &granted, allow_empty)
    })
}

/// Leaves of [`filter`], flattened in tree order
pub fn flatten(views: &[PermissionView]) -> Vec<SimplePermission> {
    let mut out = Vec::new();
    flatten_into(views, &mut out);
    out
}

/// Like [`filter`], but a target naming a branch grants every leaf beneath
/// it that is visible to `platform`. Every leaf, inside a targeted branch or
/// not, is also kept when its own code is targeted.
pub fn expand<S: AsRef<str>>(
    tree: &[CompiledNode],
    platform: u16,
    targets: &[S],
) -> Vec<PermissionView> {
    let targets = granted_set(targets);
    expand_nodes(tree, platform, &targets, false)
}

impl PermissionCatalogue {
    /// [`filter`] over the compiled trees
    pub fn filter<S: AsRef<str>>(
        &self,
        platform: u16,
        granted: &[S],
        allow_empty: bool,
    ) -> Vec<PermissionView> {
        filter(self.trees(), platform, granted, allow_empty)
    }

    /// Filtered leaves as flat `{code, name}` pairs
    pub fn simple<S: AsRef<str>>(
        &self,
        platform: u16,
        granted: &[S],
        allow_empty: bool,
    ) -> Vec<SimplePermission> {
        flatten(&self.filter(platform, granted, allow_empty))
    }

    /// [`expand`] over the compiled trees
    pub fn expand<S: AsRef<str>>(&self, platform: u16, targets: &[S]) -> Vec<PermissionView> {
        expand(self.trees(), platform, targets)
    }

    /// Leaf codes granted by `targets`, with branch codes expanded
    pub fn granted_codes<S: AsRef<str>>(&self, platform: u16, targets: &[S]) -> Vec<String> {
        flatten(&self.expand(platform, targets))
            .into_iter()
            .map(|permission| permission.code)
            .collect()
    }
}

fn granted_set<S: AsRef<str>>(codes: &[S]) -> HashSet<&str> {
    codes.iter().map(AsRef::as_ref).collect()
}

fn keep_leaf(
    node: &CompiledNode,
    platform: u16,
    granted: &HashSet<&str>,
    allow_empty: bool,
) -> bool {
    if platform > 0 && node.visible_to(platform) {
        allow_empty || granted.contains(node.code.as_str())
    } else {
        // granted codes pass even when the platform does not match
        !allow_empty && granted.contains(node.code.as_str())
    }
}

fn prune(nodes: &[CompiledNode], keep: &dyn Fn(&CompiledNode) -> bool) -> Vec<PermissionView> {
    nodes
        .iter()
        .filter_map(|node| {
            if node.is_leaf() {
                keep(node).then(|| view(node, Vec::new()))
            } else {
                let children = prune(&node.children, keep);
                (!children.is_empty()).then(|| view(node, children))
            }
        })
        .collect()
}

fn expand_nodes(
    nodes: &[CompiledNode],
    platform: u16,
    targets: &HashSet<&str>,
    inherited: bool,
) -> Vec<PermissionView> {
    nodes
        .iter()
        .filter_map(|node| {
            if node.is_leaf() {
                // an ancestor grant only adds leaves, exact grants still apply
                let keep = (inherited && platform > 0 && node.visible_to(platform))
                    || keep_leaf(node, platform, targets, false);
                keep.then(|| view(node, Vec::new()))
            } else {
                let inherited = inherited || targets.contains(node.code.as_str());
                let children = expand_nodes(&node.children, platform, targets, inherited);
                (!children.is_empty()).then(|| view(node, children))
            }
        })
        .collect()
}

fn view(node: &CompiledNode, children: Vec<PermissionView>) -> PermissionView {
    PermissionView {
        code: node.code.clone(),
        name: node.name.clone(),
        children,
    }
}

fn flatten_into(views: &[PermissionView], out: &mut Vec<SimplePermission>) {
    for view in views {
        if view.is_leaf() {
            out.push(SimplePermission {
                code: view.code.clone(),
                name: view.name.clone(),
            });
        } else {
            flatten_into(&view.children, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::platform::{GROUP, STORE};
    use crate::definition::PermissionDefinition;

    const NONE: &[&str] = &[];

    fn catalogue() -> PermissionCatalogue {
        let definitions = vec![PermissionDefinition::group(
            "a",
            "A",
            vec![
                PermissionDefinition::leaf("b", "B").platforms([GROUP]),
                PermissionDefinition::leaf("c", "C").platforms([STORE]),
                PermissionDefinition::group(
                    "d",
                    "D",
                    vec![PermissionDefinition::leaf("e", "E").platforms([GROUP])],
                ),
            ],
        )];
        PermissionCatalogue::compile(&definitions, &[GROUP, STORE]).unwrap()
    }

    fn codes(views: &[PermissionView]) -> Vec<String> {
        flatten(views).into_iter().map(|p| p.code).collect()
    }

    #[test]
    fn test_filter_by_grant() {
        let tree = catalogue().filter(GROUP, &["a.b"], false);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].code, "a");
        assert_eq!(tree[0].children.len(), 1);
        assert_eq!(tree[0].children[0].code, "a.b");
    }

    #[test]
    fn test_filter_allow_empty_shows_everything_visible() {
        let catalogue = catalogue();
        assert_eq!(codes(&catalogue.filter(GROUP, NONE, true)), vec!["a.b", "a.d.e"]);
        assert_eq!(codes(&catalogue.filter(STORE, NONE, true)), vec!["a.c"]);
        assert!(catalogue.filter(0, NONE, true).is_empty());
    }

    #[test]
    fn test_branches_without_children_are_dropped() {
        let tree = catalogue().filter(STORE, &["a.b"], true);
        assert_eq!(codes(&tree), vec!["a.c"]);
        assert!(tree[0].children.iter().all(|child| child.code != "a.d"));
    }

    #[test]
    fn test_simple_flattens_leaves() {
        let simple = catalogue().simple(GROUP, &["a.b", "a.d.e"], false);
        assert_eq!(
            simple,
            vec![
                SimplePermission {
                    code: "a.b".to_string(),
                    name: "B".to_string()
                },
                SimplePermission {
                    code: "a.d.e".to_string(),
                    name: "E".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_expand_grants_subtree_of_targeted_branch() {
        let catalogue = catalogue();
        assert_eq!(catalogue.granted_codes(GROUP, &["a"]), vec!["a.b", "a.d.e"]);
        assert_eq!(catalogue.granted_codes(GROUP, &["a.d"]), vec!["a.d.e"]);
        // exact leaf codes still work outside a targeted branch
        assert_eq!(catalogue.granted_codes(STORE, &["a.c"]), vec!["a.c"]);
        assert!(catalogue.granted_codes(STORE, &["a.d"]).is_empty());
    }

    #[test]
    fn test_branch_grant_never_hides_an_exact_grant() {
        let catalogue = catalogue();
        assert_eq!(catalogue.granted_codes(GROUP, &["a.c"]), vec!["a.c"]);
        assert_eq!(
            catalogue.granted_codes(GROUP, &["a", "a.c"]),
            vec!["a.b", "a.c", "a.d.e"]
        );
    }
}
