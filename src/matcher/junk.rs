//! Classification of OS and editor junk files.
//!
//! These are artifacts like `.DS_Store` and `Thumbs.db` that no template
//! author wants copied into a freshly scaffolded project. The list mirrors
//! the conventional junk set used by scaffolding tools.

/// Names that are junk when matched exactly.
const EXACT: &[&str] = &[
    ".DS_Store",
    ".AppleDouble",
    ".LSOverride",
    "__MACOSX",
    "Thumbs.db",
    "ehthumbs.db",
    "Desktop.ini",
    "npm-debug.log",
    "Icon\r",
];

/// Check whether a file or directory name is OS/editor junk.
pub fn is_junk(name: &str) -> bool {
    if EXACT.contains(&name) {
        return true;
    }

    // macOS resource forks.
    if name.starts_with("._") {
        return true;
    }

    // Editor backup and swap files.
    if name.ends_with('~') {
        return true;
    }
    if name.starts_with('.') && name.ends_with(".swp") {
        return true;
    }

    // KDE directory metadata.
    if name.ends_with(".directory") {
        return true;
    }

    // macOS Spotlight and Trash metadata, possibly nested in a path.
    if name.starts_with(".Spotlight-V100") || name.contains(".Trashes") {
        return true;
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_common_junk() {
        assert!(is_junk(".DS_Store"));
        assert!(is_junk("Thumbs.db"));
        assert!(is_junk("Desktop.ini"));
        assert!(is_junk("__MACOSX"));
        assert!(is_junk("._resource"));
        assert!(is_junk("notes.txt~"));
        assert!(is_junk(".main.rs.swp"));
        assert!(is_junk(".directory"));
        assert!(is_junk("folder.directory"));
        assert!(is_junk(".Spotlight-V100"));
    }

    #[test]
    fn regular_names_are_not_junk() {
        assert!(!is_junk("main.rs"));
        assert!(!is_junk("README.md"));
        assert!(!is_junk(".gitignore"));
        assert!(!is_junk("swap.swp"));
        assert!(!is_junk("directory"));
    }
}
