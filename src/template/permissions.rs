//! Capability sets and incremental permission negotiation.
//!
//! A template may request capabilities (environment variables, file reads
//! and writes, commands to run, libraries to load). Grants are persisted
//! per cache key, so a capability approved once for a specific repository
//! snapshot is never prompted for again — capability growth across runs is
//! monotonic.
//!
//! Prompting goes through the injectable [`PermissionBroker`] seam: the
//! terminal implementation asks the user, while tests plug in allow-all or
//! deny-all brokers.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A capability category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Env,
    Ffi,
    Read,
    Run,
    Write,
}

impl Capability {
    /// All categories, in the order they are negotiated and persisted.
    pub const ALL: [Capability; 5] = [
        Capability::Env,
        Capability::Ffi,
        Capability::Read,
        Capability::Run,
        Capability::Write,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Capability::Env => "env",
            Capability::Ffi => "ffi",
            Capability::Read => "read",
            Capability::Run => "run",
            Capability::Write => "write",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The capabilities granted to (or requested by) a template, one list per
/// category. Ordered, not deduplicated by contract; callers treat the
/// lists as sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySet {
    #[serde(default)]
    pub env: Vec<String>,
    #[serde(default)]
    pub ffi: Vec<String>,
    #[serde(default)]
    pub read: Vec<String>,
    #[serde(default)]
    pub run: Vec<String>,
    #[serde(default)]
    pub write: Vec<String>,
}

impl CapabilitySet {
    pub fn get(&self, capability: Capability) -> &[String] {
        match capability {
            Capability::Env => &self.env,
            Capability::Ffi => &self.ffi,
            Capability::Read => &self.read,
            Capability::Run => &self.run,
            Capability::Write => &self.write,
        }
    }

    fn get_mut(&mut self, capability: Capability) -> &mut Vec<String> {
        match capability {
            Capability::Env => &mut self.env,
            Capability::Ffi => &mut self.ffi,
            Capability::Read => &mut self.read,
            Capability::Run => &mut self.run,
            Capability::Write => &mut self.write,
        }
    }

    pub fn contains(&self, capability: Capability, value: &str) -> bool {
        self.get(capability).iter().any(|v| v == value)
    }

    /// Add a value to a category unless it is already present.
    pub fn insert(&mut self, capability: Capability, value: impl Into<String>) {
        let value = value.into();
        let list = self.get_mut(capability);
        if !list.iter().any(|v| *v == value) {
            list.push(value);
        }
    }

    pub fn is_empty(&self) -> bool {
        Capability::ALL
            .iter()
            .all(|capability| self.get(*capability).is_empty())
    }

    /// Load a persisted set; a missing or unreadable file yields the empty
    /// set.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    /// Persist the set as JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string(self)?.as_bytes())?;
        Ok(())
    }
}

/// The seam through which capability requests reach the user (or the
/// operating environment).
pub trait PermissionBroker {
    /// Ask for one capability grant; `true` means granted.
    fn request(&mut self, capability: Capability, value: &str) -> bool;
}

/// Prompts the user on the terminal for each request.
#[derive(Debug, Default)]
pub struct TerminalBroker;

impl PermissionBroker for TerminalBroker {
    fn request(&mut self, capability: Capability, value: &str) -> bool {
        let question = match capability {
            Capability::Env => format!("Allow the template to read the environment variable '{value}'?"),
            Capability::Ffi => format!("Allow the template to load the library '{value}'?"),
            Capability::Read => format!("Allow the template to read '{value}'?"),
            Capability::Run => format!("Allow the template to run the command '{value}'?"),
            Capability::Write => format!("Allow the template to write '{value}'?"),
        };

        dialoguer::Confirm::new()
            .with_prompt(question)
            .default(false)
            .interact()
            .unwrap_or(false)
    }
}

/// Grants everything. Used by tests.
#[derive(Debug, Default)]
pub struct AllowAllBroker;

impl PermissionBroker for AllowAllBroker {
    fn request(&mut self, _capability: Capability, _value: &str) -> bool {
        true
    }
}

/// Denies everything. Used in non-interactive runs and tests.
#[derive(Debug, Default)]
pub struct DenyAllBroker;

impl PermissionBroker for DenyAllBroker {
    fn request(&mut self, _capability: Capability, _value: &str) -> bool {
        false
    }
}

/// Negotiate the delta between requested and already-granted capabilities.
///
/// Read or write access to the known source and destination paths is
/// implicitly allowed and excluded from the returned grant set. Every other
/// requested value is reported in the returned set unconditionally, so
/// callers can persist and display it; a broker request is only issued for
/// values absent from `granted`, and its outcome mutates `granted` (the
/// live set) without changing what is reported for this run.
pub fn negotiate(
    requested: &CapabilitySet,
    granted: &mut CapabilitySet,
    source: &Path,
    destination: &Path,
    broker: &mut dyn PermissionBroker,
) -> CapabilitySet {
    let implicit = [
        source.to_string_lossy().into_owned(),
        destination.to_string_lossy().into_owned(),
    ];

    let mut reported = CapabilitySet::default();

    for capability in Capability::ALL {
        for value in requested.get(capability) {
            let implicitly_allowed = matches!(capability, Capability::Read | Capability::Write)
                && implicit.iter().any(|path| path == value);

            if implicitly_allowed {
                continue;
            }

            reported.get_mut(capability).push(value.clone());

            if granted.contains(capability, value) {
                continue;
            }

            if broker.request(capability, value) {
                granted.insert(capability, value.clone());
            }
        }
    }

    reported
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Records every request it sees, granting all of them.
    #[derive(Default)]
    struct RecordingBroker {
        requests: Vec<(Capability, String)>,
    }

    impl PermissionBroker for RecordingBroker {
        fn request(&mut self, capability: Capability, value: &str) -> bool {
            self.requests.push((capability, value.to_string()));
            true
        }
    }

    fn paths() -> (PathBuf, PathBuf) {
        (PathBuf::from("/tmp/source"), PathBuf::from("/tmp/dest"))
    }

    #[test]
    fn source_and_destination_are_implicitly_allowed() {
        let (source, destination) = paths();
        let requested = CapabilitySet {
            read: vec!["/tmp/source".into(), "/etc/hosts".into()],
            write: vec!["/tmp/dest".into()],
            ..Default::default()
        };

        let mut granted = CapabilitySet::default();
        let mut broker = RecordingBroker::default();
        let reported = negotiate(&requested, &mut granted, &source, &destination, &mut broker);

        // The implicit paths never appear in the reported delta and are
        // never prompted for.
        assert_eq!(reported.read, vec!["/etc/hosts".to_string()]);
        assert!(reported.write.is_empty());
        assert_eq!(broker.requests.len(), 1);
    }

    #[test]
    fn already_granted_values_are_not_reprompted() {
        let (source, destination) = paths();
        let requested = CapabilitySet {
            env: vec!["HOME".into()],
            ..Default::default()
        };

        let mut granted = CapabilitySet {
            env: vec!["HOME".into()],
            ..Default::default()
        };
        let mut broker = RecordingBroker::default();
        let reported = negotiate(&requested, &mut granted, &source, &destination, &mut broker);

        assert!(broker.requests.is_empty());
        // Still reported, so the persisted file keeps the full set.
        assert_eq!(reported.env, vec!["HOME".to_string()]);
    }

    #[test]
    fn granted_values_accumulate_in_live_set() {
        let (source, destination) = paths();
        let requested = CapabilitySet {
            run: vec!["npm".into()],
            env: vec!["USER".into()],
            ..Default::default()
        };

        let mut granted = CapabilitySet::default();
        negotiate(
            &requested,
            &mut granted,
            &source,
            &destination,
            &mut AllowAllBroker,
        );

        assert!(granted.contains(Capability::Run, "npm"));
        assert!(granted.contains(Capability::Env, "USER"));
    }

    #[test]
    fn denied_values_stay_out_of_live_set_but_are_reported() {
        let (source, destination) = paths();
        let requested = CapabilitySet {
            run: vec!["rm".into()],
            ..Default::default()
        };

        let mut granted = CapabilitySet::default();
        let reported = negotiate(
            &requested,
            &mut granted,
            &source,
            &destination,
            &mut DenyAllBroker,
        );

        assert!(!granted.contains(Capability::Run, "rm"));
        assert_eq!(reported.run, vec!["rm".to_string()]);
    }

    #[test]
    fn per_category_checks_do_not_cross_categories() {
        let (source, destination) = paths();
        // "npm" is granted for env, but requested for run: a prompt must
        // still be issued for the run category.
        let requested = CapabilitySet {
            run: vec!["npm".into()],
            ..Default::default()
        };
        let mut granted = CapabilitySet {
            env: vec!["npm".into()],
            ..Default::default()
        };

        let mut broker = RecordingBroker::default();
        negotiate(&requested, &mut granted, &source, &destination, &mut broker);

        assert_eq!(broker.requests.len(), 1);
        assert_eq!(broker.requests[0].0, Capability::Run);
    }

    #[test]
    fn load_missing_file_yields_empty_set() {
        let set = CapabilitySet::load(Path::new("/not/a/real/permissions.json"));
        assert!(set.is_empty());
    }

    #[test]
    fn save_and_load_round_trip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("key.json");

        let set = CapabilitySet {
            env: vec!["HOME".into()],
            run: vec!["git".into()],
            ..Default::default()
        };
        set.save(&path).unwrap();

        let loaded = CapabilitySet::load(&path);
        assert_eq!(loaded, set);
    }

    #[test]
    fn insert_deduplicates() {
        let mut set = CapabilitySet::default();
        set.insert(Capability::Env, "HOME");
        set.insert(Capability::Env, "HOME");
        assert_eq!(set.env.len(), 1);
    }
}
