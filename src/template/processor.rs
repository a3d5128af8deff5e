//! The template processing state machine.
//!
//! A processor advances through `load → gather_variables →
//! resolve_permissions → render → install`. Every step except `render` is
//! idempotent or side-effect free; `render` writes the destination tree.
//!
//! Rendering walks the source with dot-files enabled, always excludes the
//! resolved configuration file itself, applies the rename map, strips a
//! trailing `.template` from target names, renders `.template` file
//! contents through `${}` substitution, copies everything else
//! byte-for-byte, and passes every target filename through the `[[]]`
//! substitution pass.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{Result, ScaffoldError};
use crate::matcher::MatchSpec;
use crate::render::{render_content, render_filename, Variables};
use crate::template::config::{TemplateConfig, VariableKind};
use crate::template::loader::{load_config, LoadedConfig};
use crate::template::permissions::{negotiate, Capability, CapabilitySet, PermissionBroker};
use crate::template::prompts::Prompter;
use crate::walker::WalkerBuilder;

/// Everything a processor needs to know about its run.
#[derive(Debug)]
pub struct BaseProps {
    /// The configuration file base name (normally `scaffold`).
    pub name: String,

    /// The absolute path to the template source directory.
    pub source: PathBuf,

    /// The absolute path to the destination directory.
    pub destination: PathBuf,

    /// Variables supplied by the caller (CLI flags); prompt output wins on
    /// conflict.
    pub initial_variables: Variables,

    /// The live granted capability set for this run.
    pub permissions: CapabilitySet,

    /// Whether prompting is allowed.
    pub interactive: bool,
}

/// Drives one template from load to install.
#[derive(Debug)]
pub struct TemplateProcessor {
    base: BaseProps,
    loaded: bool,
    config: Option<TemplateConfig>,
    config_path: Option<PathBuf>,
    variables: Option<Variables>,
}

impl TemplateProcessor {
    pub fn new(base: BaseProps) -> Self {
        Self {
            base,
            loaded: false,
            config: None,
            config_path: None,
            variables: None,
        }
    }

    /// The loaded configuration, if any.
    pub fn config(&self) -> Option<&TemplateConfig> {
        self.config.as_ref()
    }

    /// The current variables: gathered if available, initial otherwise.
    pub fn variables(&self) -> &Variables {
        self.variables
            .as_ref()
            .unwrap_or(&self.base.initial_variables)
    }

    /// The live granted capability set.
    pub fn permissions(&self) -> &CapabilitySet {
        &self.base.permissions
    }

    /// Resolve and load the template configuration. A second call is a
    /// no-op.
    pub fn load(&mut self) -> Result<()> {
        if self.loaded {
            return Ok(());
        }
        self.loaded = true;

        if let Some(LoadedConfig { config, path }) = load_config(&self.base.source, &self.base.name)?
        {
            tracing::debug!("loaded template config from {}", path.display());
            self.config = Some(config);
            self.config_path = Some(path);
        }

        Ok(())
    }

    /// Gather variables through the prompter, merging the results over the
    /// initial variables (prompt output wins on conflict). Without a
    /// configured variable step, or in a non-interactive run, the variables
    /// equal the initial set (with declared defaults filled in for
    /// non-interactive runs).
    pub fn gather_variables(&mut self, prompter: &mut dyn Prompter) -> Result<()> {
        let specs = match &self.config {
            Some(config) if !config.variables.is_empty() => config.variables.clone(),
            _ => {
                self.variables = Some(self.base.initial_variables.clone());
                return Ok(());
            }
        };

        let mut variables = self.base.initial_variables.clone();

        for spec in &specs {
            let value = if !self.base.interactive {
                match &spec.default {
                    Some(default) => default.clone(),
                    None => continue,
                }
            } else {
                match spec.kind {
                    VariableKind::Input => {
                        prompter.input(&spec.name, spec.message(), spec.default.as_deref())?
                    }
                    VariableKind::Confirm => {
                        let default = spec.default.as_deref() == Some("true");
                        prompter
                            .confirm(&spec.name, spec.message(), default)?
                            .to_string()
                    }
                    VariableKind::Select => {
                        if spec.choices.is_empty() {
                            continue;
                        }
                        let index = prompter.select(&spec.name, spec.message(), &spec.choices)?;
                        spec.choices[index].clone()
                    }
                }
            };

            variables.insert(spec.name.clone(), value);
        }

        self.variables = Some(variables);
        Ok(())
    }

    /// Negotiate the configured permission requests. Returns the granted
    /// delta for the caller to persist, or `None` when the configuration
    /// requests nothing.
    pub fn resolve_permissions(
        &mut self,
        broker: &mut dyn PermissionBroker,
    ) -> Result<Option<CapabilitySet>> {
        let requested = match &self.config {
            Some(config) => config.resolved_permissions(self.variables()),
            None => None,
        };

        let Some(requested) = requested else {
            return Ok(None);
        };

        let granted = negotiate(
            &requested,
            &mut self.base.permissions,
            &self.base.source,
            &self.base.destination,
            broker,
        );

        Ok(Some(granted))
    }

    /// Render the source tree into the destination.
    pub fn render(&self) -> Result<()> {
        let variables = self.variables().clone();
        let config = self.config.as_ref();

        let include: Vec<MatchSpec> = config
            .and_then(|config| config.resolved_include(&variables))
            .unwrap_or_else(|| vec!["**".to_string()])
            .into_iter()
            .map(MatchSpec::from)
            .collect();

        let mut exclude: Vec<String> = config
            .and_then(|config| config.resolved_exclude(&variables))
            .unwrap_or_default();

        // The configuration file itself never lands in the destination.
        if let Some(config_path) = &self.config_path {
            if let Ok(relative) = config_path.strip_prefix(&self.base.source) {
                exclude.push(path_to_slash(relative));
            }
        }

        let rename = config
            .map(|config| config.normalized_rename())
            .unwrap_or_default();

        let walker = WalkerBuilder::new(&self.base.source)
            .include(include)
            .exclude(exclude.into_iter().map(MatchSpec::from).collect())
            .dot(true)
            .build()?;

        fs::create_dir_all(&self.base.destination)?;

        for entry in walker.iter() {
            let entry = entry?;

            let relative = rename
                .get(&entry.relative)
                .cloned()
                .unwrap_or_else(|| entry.relative.clone());

            let stripped = relative.strip_suffix(".template").unwrap_or(&relative);
            let templated = render_filename(stripped, &variables);
            let target = self.base.destination.join(&templated);

            if entry.is_directory {
                fs::create_dir_all(&target)?;
                continue;
            }

            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }

            // `.template` files have their contents rendered; everything
            // else is copied byte-for-byte. The decision looks at the
            // source name, so a renamed target keeps its behavior.
            if entry.name.ends_with(".template") {
                let content = fs::read_to_string(&entry.absolute)?;
                fs::write(&target, render_content(&content, &variables))?;
            } else {
                fs::copy(&entry.absolute, &target)?;
            }
        }

        Ok(())
    }

    /// Run the configured post-install command, if any. The command's
    /// program must be covered by the granted `run` capability set — this
    /// is the run's only executable surface.
    pub fn install(&self) -> Result<()> {
        let command = match &self.config {
            Some(config) => config.resolved_install(self.variables()),
            None => None,
        };

        let Some(command) = command else {
            return Ok(());
        };
        let Some(program) = command.first() else {
            return Ok(());
        };

        if !self.base.permissions.contains(Capability::Run, program) {
            return Err(ScaffoldError::PermissionDenied {
                capability: Capability::Run.name().to_string(),
                value: program.clone(),
            });
        }

        tracing::info!("running install command: {}", command.join(" "));

        let status = Command::new(program)
            .args(&command[1..])
            .current_dir(&self.base.destination)
            .status()?;

        if !status.success() {
            return Err(ScaffoldError::Other(anyhow::anyhow!(
                "install command '{}' exited with {}",
                command.join(" "),
                status
            )));
        }

        Ok(())
    }
}

fn path_to_slash(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
