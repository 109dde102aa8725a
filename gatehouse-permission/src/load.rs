use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::definition::PermissionDefinition;
use crate::error::PermissionError;

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonCatalogue {
    List(Vec<PermissionDefinition>),
    Table { permissions: Vec<PermissionDefinition> },
}

#[cfg(feature = "toml")]
#[derive(Deserialize)]
struct TomlCatalogue {
    #[serde(default)]
    permissions: Vec<PermissionDefinition>,
}

/// Read permission definitions from a JSON or TOML file.
///
/// JSON may be a bare array or an object with a `permissions` array. TOML
/// uses `[[permissions]]` tables. The format follows the file extension.
pub fn load_definitions(path: impl AsRef<Path>) -> Result<Vec<PermissionDefinition>, PermissionError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_lowercase();

    let definitions = match extension.as_str() {
        "json" => parse_json(&content)?,
        "toml" => parse_toml(&content)?,
        other => return Err(PermissionError::UnsupportedFormat(other.to_string())),
    };

    debug!(path = %path.display(), count = definitions.len(), "permission definitions loaded");
    Ok(definitions)
}

pub fn parse_json(content: &str) -> Result<Vec<PermissionDefinition>, PermissionError> {
    Ok(match serde_json::from_str(content)? {
        JsonCatalogue::List(definitions) => definitions,
        JsonCatalogue::Table { permissions } => permissions,
    })
}

#[cfg(feature = "toml")]
pub fn parse_toml(content: &str) -> Result<Vec<PermissionDefinition>, PermissionError> {
    let catalogue: TomlCatalogue = toml::from_str(content)?;
    Ok(catalogue.permissions)
}

#[cfg(not(feature = "toml"))]
pub fn parse_toml(_content: &str) -> Result<Vec<PermissionDefinition>, PermissionError> {
    Err(PermissionError::UnsupportedFormat("toml".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_parse_json_shapes() {
        let list = parse_json(r#"[{"code":"a","name":"A"}]"#).unwrap();
        let table = parse_json(r#"{"permissions":[{"code":"a","name":"A"}]}"#).unwrap();
        assert_eq!(list, table);
        assert!(parse_json("{").is_err());
    }

    #[cfg(feature = "toml")]
    #[test]
    fn test_load_toml_file() {
        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
[[permissions]]
code = "order"
name = "Orders"

[[permissions.children]]
code = "list"
name = "List"
platforms = [2, 4]

[[permissions.children]]
code = "export"
name = "Export"
common = true
"#
        )
        .unwrap();

        let definitions = load_definitions(file.path()).unwrap();
        assert_eq!(definitions.len(), 1);
        assert_eq!(definitions[0].children.len(), 2);
        assert_eq!(definitions[0].children[0].platforms, vec![2, 4]);
        assert!(definitions[0].children[1].common);
    }

    #[test]
    fn test_unknown_extension() {
        let file = Builder::new().suffix(".yaml").tempfile().unwrap();
        assert!(matches!(
            load_definitions(file.path()),
            Err(PermissionError::UnsupportedFormat(ext)) if ext == "yaml"
        ));
    }
}
