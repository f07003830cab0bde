//! Directory name rules for gallery discovery.
//!
//! Decides which directories the scanner never enters (dotfiles, system and
//! cache folders) and in which order sibling directories are explored, so
//! photo folders are reached before the result cap truncates a scan.

use std::collections::HashSet;

/// System and cache directory names skipped by default (compared lowercased).
pub const DEFAULT_SKIP_DIRS: &[&str] = &[
    "appdata",
    "application data",
    "local",
    "roaming",
    "locallow",
    "cache",
    "caches",
    ".cache",
    "temp",
    "tmp",
    ".tmp",
    "program data",
    "program files",
    "program files (x86)",
    "windows",
    "system volume information",
    "$recycle.bin",
    "node_modules",
    ".git",
    ".svn",
    "__pycache__",
];

const PHOTO_NAMES: &[&str] = &["pictures", "photos", "images", "mes images", "photo", "image"];
const PHOTO_PREFIXES: &[&str] = &["pic", "photo", "image"];
const USER_FOLDER_NAMES: &[&str] = &[
    "desktop",
    "bureau",
    "documents",
    "downloads",
    "téléchargements",
];

/// Photo-like folders: explored first.
pub const PRIORITY_PHOTOS: u8 = 0;
/// Common user folders (desktop, documents, downloads).
pub const PRIORITY_USER: u8 = 1;
pub const PRIORITY_OTHER: u8 = 2;

#[derive(Debug, Clone)]
pub struct FolderClassifier {
    skip: HashSet<String>,
}

impl Default for FolderClassifier {
    fn default() -> Self {
        Self::with_skip_dirs(DEFAULT_SKIP_DIRS.iter().copied())
    }
}

impl FolderClassifier {
    /// Build a classifier with a custom deny-set instead of [`DEFAULT_SKIP_DIRS`].
    pub fn with_skip_dirs<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            skip: names
                .into_iter()
                .map(|n| n.as_ref().trim().to_lowercase())
                .collect(),
        }
    }

    /// True for dot-directories and names in the deny-set.
    pub fn should_skip(&self, name: &str) -> bool {
        let name = name.trim().to_lowercase();
        name.starts_with('.') || self.skip.contains(&name)
    }

    /// Exploration priority; lower is explored earlier.
    pub fn priority(&self, name: &str) -> u8 {
        let name = name.to_lowercase();
        if PHOTO_NAMES.contains(&name.as_str()) {
            return PRIORITY_PHOTOS;
        }
        if USER_FOLDER_NAMES.contains(&name.as_str()) {
            return PRIORITY_USER;
        }
        if PHOTO_PREFIXES.iter().any(|p| name.starts_with(p)) {
            return PRIORITY_PHOTOS;
        }
        PRIORITY_OTHER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dot_directories_are_skipped() {
        let c = FolderClassifier::default();
        assert!(c.should_skip(".config"));
        assert!(c.should_skip(".thumbnails"));
        assert!(c.should_skip("."));
    }

    #[test]
    fn deny_set_is_case_insensitive() {
        let c = FolderClassifier::default();
        for name in DEFAULT_SKIP_DIRS {
            assert!(c.should_skip(name), "{name} should be skipped");
        }
        assert!(c.should_skip("AppData"));
        assert!(c.should_skip("Program Files (x86)"));
        assert!(c.should_skip("  node_modules "));
    }

    #[test]
    fn ordinary_directories_are_kept() {
        let c = FolderClassifier::default();
        assert!(!c.should_skip("Pictures"));
        assert!(!c.should_skip("Holidays 2023"));
        assert!(!c.should_skip("cached-thoughts"));
    }

    #[test]
    fn custom_skip_dirs_replace_defaults() {
        let c = FolderClassifier::with_skip_dirs(["Thumbs"]);
        assert!(c.should_skip("thumbs"));
        assert!(!c.should_skip("AppData"));
        assert!(c.should_skip(".hidden"));
    }

    #[test]
    fn photo_folders_come_first() {
        let c = FolderClassifier::default();
        assert_eq!(c.priority("Pictures"), 0);
        assert_eq!(c.priority("Photos"), 0);
        assert_eq!(c.priority("Mes Images"), 0);
        assert_eq!(c.priority("Photography"), 0);
        assert_eq!(c.priority("pics-2020"), 0);
        assert_eq!(c.priority("ImageDump"), 0);
    }

    #[test]
    fn user_folders_come_second() {
        let c = FolderClassifier::default();
        assert_eq!(c.priority("Desktop"), 1);
        assert_eq!(c.priority("Documents"), 1);
        assert_eq!(c.priority("Downloads"), 1);
        assert_eq!(c.priority("Téléchargements"), 1);
        assert_eq!(c.priority("Bureau"), 1);
    }

    #[test]
    fn everything_else_is_last() {
        let c = FolderClassifier::default();
        assert_eq!(c.priority("src"), 2);
        assert_eq!(c.priority("Music"), 2);
        assert_eq!(c.priority("epic"), 2);
    }
}
