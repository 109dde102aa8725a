use gatehouse::{
    platform, CompiledNode, PermissionCatalogue, PermissionDefinition, PermissionError,
    PermissionView,
};
use serde_json::json;

fn definitions() -> Vec<PermissionDefinition> {
    serde_json::from_value(json!([
        {
            "code": "a",
            "name": "Module A",
            "children": [
                { "code": "b", "name": "B", "platforms": [2] },
                { "code": "c", "name": "C", "platforms": [4], "common": true },
                {
                    "code": "d",
                    "name": "D",
                    "children": [
                        { "code": "e", "name": "E", "platforms": [1] },
                        { "code": "f", "name": "F" }
                    ]
                }
            ]
        },
        {
            "code": "report",
            "name": "Reports",
            "children": [
                { "code": "daily", "name": "Daily", "platforms": [4] }
            ]
        }
    ]))
    .unwrap()
}

fn compile() -> PermissionCatalogue {
    PermissionCatalogue::compile(&definitions(), &[platform::GROUP, platform::STORE]).unwrap()
}

fn leaves(nodes: &[CompiledNode], out: &mut Vec<CompiledNode>) {
    for node in nodes {
        if node.is_leaf() {
            out.push(node.clone());
        } else {
            assert!(node.platforms.is_empty(), "branch {} has platforms", node.code);
            leaves(&node.children, out);
        }
    }
}

fn codes(views: &[PermissionView]) -> Vec<String> {
    let mut out = Vec::new();
    for view in views {
        if view.is_leaf() {
            out.push(view.code.clone());
        } else {
            out.extend(codes(&view.children));
        }
    }
    out
}

#[test]
fn test_only_leaves_certify_access() {
    let catalogue = compile();
    let mut all = Vec::new();
    leaves(catalogue.trees(), &mut all);

    assert_eq!(all.len(), 5);
    assert!(all.iter().all(|leaf| !leaf.platforms.is_empty()));
}

#[test]
fn test_common_leaf_is_visible_to_every_default_platform() {
    let catalogue = compile();
    for code in catalogue.platforms() {
        let visible = catalogue.filter(*code, &[] as &[&str], true);
        assert!(
            codes(&visible).contains(&"a.c".to_string()),
            "a.c hidden from platform {}",
            code
        );
    }
    // its own platform list is ignored
    assert_eq!(
        catalogue.find("a.c").unwrap().platforms,
        vec![platform::GROUP, platform::STORE, platform::REGION]
    );
}

#[test]
fn test_filter_returns_granted_leaf_and_ancestors_only() {
    let catalogue = compile();
    let tree = catalogue.filter(platform::GROUP, &["a.b"], false);

    assert_eq!(
        tree,
        vec![PermissionView {
            code: "a".to_string(),
            name: "Module A".to_string(),
            children: vec![PermissionView {
                code: "a.b".to_string(),
                name: "B".to_string(),
                children: Vec::new(),
            }],
        }]
    );

    let serialized = serde_json::to_string(&tree).unwrap();
    assert!(!serialized.contains("platforms"));
}

#[test]
fn test_ungated_but_granted_leaf_still_passes() {
    // `a.d.e` is only visible to the platform console, yet an explicit grant
    // lets it through on the group platform
    let catalogue = compile();
    let tree = catalogue.filter(platform::GROUP, &["a.d.e"], false);
    assert_eq!(codes(&tree), vec!["a.d.e"]);

    // the catalogue view does not take that path
    let catalogue_view = catalogue.filter(platform::GROUP, &["a.d.e"], true);
    assert!(!codes(&catalogue_view).contains(&"a.d.e".to_string()));

    // nor does a request without a platform
    assert_eq!(codes(&catalogue.filter(0, &["a.b"], false)), vec!["a.b"]);
    assert!(catalogue.filter(0, &["a.b"], true).is_empty());
}

#[test]
fn test_catalogue_views_per_platform() {
    let catalogue = compile();

    assert_eq!(
        codes(&catalogue.filter(platform::STORE, &[] as &[&str], true)),
        vec!["a.c", "a.d.f", "report.daily"]
    );
    assert_eq!(
        codes(&catalogue.filter(platform::REGION, &[] as &[&str], true)),
        vec!["a.c", "a.d.f"]
    );
}

#[test]
fn test_modules() {
    let catalogue = compile();

    let store = catalogue.modules(platform::STORE);
    assert_eq!(store.len(), 2);
    assert_eq!(store[0].code, "a");
    assert_eq!(store[0].permissions, vec!["a.c", "a.d.f"]);
    assert_eq!(store[1].permissions, vec!["report.daily"]);

    let group = catalogue.modules(platform::GROUP);
    assert_eq!(group.len(), 1);
    assert_eq!(group[0].permissions, vec!["a.b", "a.c", "a.d.f"]);

    assert!(catalogue.modules(platform::PLATFORM).is_empty());
}

#[test]
fn test_simple_and_expand() {
    let catalogue = compile();

    let simple = catalogue.simple(platform::STORE, &["a.c", "report.daily", "a.b"], false);
    let simple: Vec<_> = simple.iter().map(|p| (p.code.as_str(), p.name.as_str())).collect();
    // a.b is granted but not visible to the store platform
    assert_eq!(
        simple,
        vec![("a.b", "B"), ("a.c", "C"), ("report.daily", "Daily")]
    );

    assert_eq!(
        catalogue.granted_codes(platform::STORE, &["a"]),
        vec!["a.c", "a.d.f"]
    );
    assert_eq!(
        catalogue.granted_codes(platform::STORE, &["a.d", "report.daily"]),
        vec!["a.d.f", "report.daily"]
    );
}

#[test]
fn test_region_cannot_be_configured() {
    assert!(matches!(
        PermissionCatalogue::compile(&definitions(), &[platform::REGION]),
        Err(PermissionError::InvalidPlatformConfig(3))
    ));
}
