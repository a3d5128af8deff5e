//! Resolution and loading of the template configuration file.
//!
//! Candidate filenames are generated from a fixed supported-extension list,
//! tried at the source root first and then under `.config/`, in a fixed
//! preference order. The first candidate that exists wins: a parseable
//! document is returned together with its path, a null document stops
//! probing and means "no configuration", and a document that fails to parse
//! is a configuration error rather than a reason to keep probing.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, ScaffoldError};
use crate::template::config::TemplateConfig;

/// The supported configuration file extensions, in preference order.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[".json", ".yaml", ".yml"];

/// A successfully loaded configuration and where it came from.
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: TemplateConfig,
    /// The absolute path to the resolved configuration file.
    pub path: PathBuf,
}

/// Generate the candidate file names for a configuration base name.
pub fn candidate_files(name: &str) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for directory in ["", ".config"] {
        for extension in SUPPORTED_EXTENSIONS {
            let file_name = format!("{name}.config{extension}");
            files.push(if directory.is_empty() {
                PathBuf::from(file_name)
            } else {
                Path::new(directory).join(file_name)
            });
        }
    }

    files
}

/// Load the template configuration from a source directory.
///
/// Returns `Ok(None)` when no candidate exists (defaults apply downstream)
/// or when the first existing candidate holds a null document.
pub fn load_config(source: &Path, name: &str) -> Result<Option<LoadedConfig>> {
    for candidate in candidate_files(name) {
        let path = source.join(&candidate);

        if !path.is_file() {
            continue;
        }

        let content = fs::read_to_string(&path)?;

        let config = if path.extension().is_some_and(|ext| ext == "json") {
            parse_json(&path, &content)?
        } else {
            parse_yaml(&path, &content)?
        };

        // A present-but-null document means "no configuration"; probing
        // stops rather than continuing to later candidates.
        return Ok(config.map(|config| LoadedConfig { config, path }));
    }

    Ok(None)
}

fn parse_json(path: &Path, content: &str) -> Result<Option<TemplateConfig>> {
    let value: serde_json::Value =
        serde_json::from_str(content).map_err(|error| ScaffoldError::ConfigParse {
            path: path.to_path_buf(),
            message: error.to_string(),
        })?;

    if value.is_null() {
        return Ok(None);
    }

    serde_json::from_value(value)
        .map(Some)
        .map_err(|error| ScaffoldError::ConfigParse {
            path: path.to_path_buf(),
            message: error.to_string(),
        })
}

fn parse_yaml(path: &Path, content: &str) -> Result<Option<TemplateConfig>> {
    let value: serde_yaml::Value =
        serde_yaml::from_str(content).map_err(|error| ScaffoldError::ConfigParse {
            path: path.to_path_buf(),
            message: error.to_string(),
        })?;

    if value.is_null() {
        return Ok(None);
    }

    serde_yaml::from_value(value)
        .map(Some)
        .map_err(|error| ScaffoldError::ConfigParse {
            path: path.to_path_buf(),
            message: error.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn candidates_prefer_root_over_config_dir() {
        let files = candidate_files("scaffold");

        assert_eq!(files[0], PathBuf::from("scaffold.config.json"));
        assert_eq!(files[1], PathBuf::from("scaffold.config.yaml"));
        assert_eq!(files[2], PathBuf::from("scaffold.config.yml"));
        assert_eq!(files[3], PathBuf::from(".config/scaffold.config.json"));
        assert_eq!(files.len(), 6);
    }

    #[test]
    fn loads_first_existing_candidate() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("scaffold.config.yaml"),
            "exclude: [\"secret.txt\"]\n",
        )
        .unwrap();

        let loaded = load_config(temp.path(), "scaffold").unwrap().unwrap();

        assert_eq!(loaded.path, temp.path().join("scaffold.config.yaml"));
        assert_eq!(
            loaded.config.exclude.as_deref(),
            Some(&["secret.txt".to_string()][..])
        );
    }

    #[test]
    fn root_json_wins_over_yaml() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("scaffold.config.json"), r#"{"exclude":["a"]}"#).unwrap();
        fs::write(temp.path().join("scaffold.config.yaml"), "exclude: [b]\n").unwrap();

        let loaded = load_config(temp.path(), "scaffold").unwrap().unwrap();
        assert_eq!(loaded.config.exclude.as_deref(), Some(&["a".to_string()][..]));
    }

    #[test]
    fn config_dir_candidate_is_found() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(".config")).unwrap();
        fs::write(
            temp.path().join(".config/scaffold.config.json"),
            r#"{"include":["src/**"]}"#,
        )
        .unwrap();

        let loaded = load_config(temp.path(), "scaffold").unwrap().unwrap();
        assert_eq!(
            loaded.path,
            temp.path().join(".config/scaffold.config.json")
        );
    }

    #[test]
    fn missing_config_is_none() {
        let temp = TempDir::new().unwrap();
        assert!(load_config(temp.path(), "scaffold").unwrap().is_none());
    }

    #[test]
    fn null_document_stops_probing() {
        let temp = TempDir::new().unwrap();
        // An empty YAML file parses to null.
        fs::write(temp.path().join("scaffold.config.yaml"), "").unwrap();
        // A later candidate exists and would parse, but must not be reached.
        fs::create_dir(temp.path().join(".config")).unwrap();
        fs::write(
            temp.path().join(".config/scaffold.config.json"),
            r#"{"include":["src/**"]}"#,
        )
        .unwrap();

        assert!(load_config(temp.path(), "scaffold").unwrap().is_none());
    }

    #[test]
    fn unparseable_config_is_an_error() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("scaffold.config.json"), "{not json").unwrap();

        let result = load_config(temp.path(), "scaffold");
        assert!(matches!(
            result,
            Err(ScaffoldError::ConfigParse { .. })
        ));
    }
}
