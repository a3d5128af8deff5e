//! The declarative template configuration document.
//!
//! A template ships an optional `scaffold.config.{json,yaml,yml}` file
//! describing variables to gather, capabilities to request, which files to
//! include, exclude, or rename, and a post-install command. The document is
//! data, never code — dynamic behavior comes from `${var}` interpolation of
//! its string values against the run's variables.

use std::collections::HashMap;

use serde::Deserialize;

use crate::render::{render_content, Variables};
use crate::template::permissions::CapabilitySet;

/// A user-authored template configuration. Read-only after load.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemplateConfig {
    /// Variables to gather before rendering, in order.
    #[serde(default)]
    pub variables: Vec<VariableSpec>,

    /// Capabilities the template requests for this run.
    #[serde(default)]
    pub permissions: Option<CapabilitySet>,

    /// Files to include (glob patterns). Defaults to everything.
    #[serde(default)]
    pub include: Option<Vec<String>>,

    /// Files to exclude (glob patterns).
    #[serde(default)]
    pub exclude: Option<Vec<String>>,

    /// Relative source paths mapped to their renamed targets.
    #[serde(default)]
    pub rename: HashMap<String, String>,

    /// A command to run in the destination after rendering.
    #[serde(default)]
    pub install: Option<InstallSpec>,
}

/// One variable the template wants gathered.
#[derive(Debug, Clone, Deserialize)]
pub struct VariableSpec {
    /// The variable name used in `${name}` / `[[name]]` references.
    pub name: String,

    /// The prompt message; defaults to the variable name.
    #[serde(default)]
    pub prompt: Option<String>,

    /// The default value, also used in non-interactive runs.
    #[serde(default)]
    pub default: Option<String>,

    /// Choices for a select prompt.
    #[serde(default)]
    pub choices: Vec<String>,

    /// How the variable is asked for.
    #[serde(default)]
    pub kind: VariableKind,
}

impl VariableSpec {
    /// The message shown when prompting for this variable.
    pub fn message(&self) -> &str {
        self.prompt.as_deref().unwrap_or(&self.name)
    }
}

/// The prompt style for a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    #[default]
    Input,
    Confirm,
    Select,
}

/// The post-install command.
#[derive(Debug, Clone, Deserialize)]
pub struct InstallSpec {
    /// The program and its arguments.
    pub command: Vec<String>,
}

impl TemplateConfig {
    /// Interpolate the include patterns against the run variables.
    pub fn resolved_include(&self, variables: &Variables) -> Option<Vec<String>> {
        self.include
            .as_ref()
            .map(|patterns| interpolate_all(patterns, variables))
    }

    /// Interpolate the exclude patterns against the run variables.
    pub fn resolved_exclude(&self, variables: &Variables) -> Option<Vec<String>> {
        self.exclude
            .as_ref()
            .map(|patterns| interpolate_all(patterns, variables))
    }

    /// Interpolate the requested capability values against the run
    /// variables.
    pub fn resolved_permissions(&self, variables: &Variables) -> Option<CapabilitySet> {
        self.permissions.as_ref().map(|requested| CapabilitySet {
            env: interpolate_all(&requested.env, variables),
            ffi: interpolate_all(&requested.ffi, variables),
            read: interpolate_all(&requested.read, variables),
            run: interpolate_all(&requested.run, variables),
            write: interpolate_all(&requested.write, variables),
        })
    }

    /// The rename map with slash-normalized keys.
    pub fn normalized_rename(&self) -> HashMap<String, String> {
        self.rename
            .iter()
            .map(|(key, value)| (normalize_path_key(key), value.clone()))
            .collect()
    }

    /// Interpolate the install command against the run variables.
    pub fn resolved_install(&self, variables: &Variables) -> Option<Vec<String>> {
        self.install
            .as_ref()
            .map(|install| interpolate_all(&install.command, variables))
    }
}

fn interpolate_all(values: &[String], variables: &Variables) -> Vec<String> {
    values
        .iter()
        .map(|value| render_content(value, variables))
        .collect()
}

/// Normalize a rename key to the walker's slash-separated relative form.
fn normalize_path_key(key: &str) -> String {
    let normalized = key.replace('\\', "/");
    normalized
        .strip_prefix("./")
        .unwrap_or(&normalized)
        .trim_end_matches('/')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Variables {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn parses_full_yaml_document() {
        let yaml = r#"
variables:
  - name: project
    prompt: "Project name?"
    default: demo
  - name: ci
    kind: confirm
    default: "true"
permissions:
  run: [npm]
  env: [HOME]
include: ["**"]
exclude: ["docs/**"]
rename:
  "./old.txt": new.txt
install:
  command: [npm, install]
"#;
        let config: TemplateConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.variables.len(), 2);
        assert_eq!(config.variables[0].message(), "Project name?");
        assert_eq!(config.variables[1].kind, VariableKind::Confirm);
        assert_eq!(config.permissions.as_ref().unwrap().run, vec!["npm"]);
        assert_eq!(config.exclude.as_deref(), Some(&["docs/**".to_string()][..]));
        assert_eq!(config.install.unwrap().command, vec!["npm", "install"]);
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config: TemplateConfig = serde_json::from_str("{}").unwrap();
        assert!(config.variables.is_empty());
        assert!(config.permissions.is_none());
        assert!(config.include.is_none());
        assert!(config.rename.is_empty());
    }

    #[test]
    fn specs_interpolate_variables() {
        let config: TemplateConfig = serde_yaml::from_str(
            r#"
exclude: ["${flavor}/**"]
install:
  command: [echo, "${flavor}"]
"#,
        )
        .unwrap();

        let variables = vars(&[("flavor", "minimal")]);
        assert_eq!(
            config.resolved_exclude(&variables).unwrap(),
            vec!["minimal/**"]
        );
        assert_eq!(
            config.resolved_install(&variables).unwrap(),
            vec!["echo", "minimal"]
        );
    }

    #[test]
    fn rename_keys_are_normalized() {
        let config: TemplateConfig = serde_yaml::from_str(
            r#"
rename:
  "./a.md.template": a.md
  "dir\\file.txt": other.txt
"#,
        )
        .unwrap();

        let rename = config.normalized_rename();
        assert_eq!(rename.get("a.md.template"), Some(&"a.md".to_string()));
        assert_eq!(rename.get("dir/file.txt"), Some(&"other.txt".to_string()));
    }
}
