//! Root containment checks.
//!
//! Every path handed back to a caller must resolve to the scan root or
//! something below it. [`PathGuard::is_within_root`] compares fully resolved
//! forms, so `..` components and symlinks pointing outside the tree are
//! rejected even when the literal string looks contained. Dangling symlinks
//! are followed too: a link to a target that does not exist yet is judged by
//! where it points, not by where it sits.

use std::collections::VecDeque;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum GuardError {
    #[error("Parent-directory segment in requested path: {0}")]
    ParentSegment(String),
    #[error("Path escapes the scan root: {0}")]
    OutsideRoot(PathBuf),
}

/// Containment check against a fixed root directory.
#[derive(Debug, Clone)]
pub struct PathGuard {
    root: PathBuf,
}

impl PathGuard {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// True iff `candidate` canonically equals the root or lies below it.
    pub fn is_within_root(&self, candidate: &Path) -> bool {
        let (Ok(root), Ok(target)) = (resolve(&self.root), resolve(candidate)) else {
            return false;
        };
        // `starts_with` compares whole components, so `/home/al` never
        // matches a root of `/home/a`.
        target.starts_with(&root)
    }

    /// Join a `/`-separated relative path onto the root and check it.
    ///
    /// Backslashes are treated as separators and surrounding slashes are
    /// ignored. A `..` segment is refused before the filesystem is consulted.
    pub fn join_guarded(&self, relative: &str) -> Result<PathBuf, GuardError> {
        let normalized = relative.replace('\\', "/");
        let segments: Vec<&str> = normalized
            .trim_matches('/')
            .split('/')
            .filter(|s| !s.is_empty() && *s != ".")
            .collect();

        if segments.contains(&"..") {
            return Err(GuardError::ParentSegment(relative.to_string()));
        }

        let candidate = segments
            .iter()
            .fold(self.root.clone(), |path, segment| path.join(segment));

        if !self.is_within_root(&candidate) {
            return Err(GuardError::OutsideRoot(candidate));
        }
        Ok(candidate)
    }
}

/// Symlinks followed while resolving one path before giving up.
const MAX_SYMLINK_HOPS: usize = 40;

/// One pending step of [`resolve`].
enum Step {
    Prefix(OsString),
    RootDir,
    Parent,
    Name(OsString),
}

fn steps(path: &Path) -> VecDeque<Step> {
    path.components()
        .filter_map(|component| match component {
            Component::Prefix(prefix) => Some(Step::Prefix(prefix.as_os_str().to_os_string())),
            Component::RootDir => Some(Step::RootDir),
            Component::CurDir => None,
            Component::ParentDir => Some(Step::Parent),
            Component::Normal(name) => Some(Step::Name(name.to_os_string())),
        })
        .collect()
}

/// Resolve `path` the way `realpath -m` does.
///
/// Components are applied left to right. Every symlink met on the way is
/// followed, dangling ones included, so a link whose target does not exist
/// yet still resolves to where it points. Components that do not exist are
/// applied lexically. Symlink loops and unreadable components are errors.
fn resolve(path: &Path) -> io::Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut pending = steps(&absolute);
    let mut resolved = PathBuf::new();
    let mut hops = 0;

    while let Some(step) = pending.pop_front() {
        match step {
            Step::Prefix(prefix) => resolved = PathBuf::from(prefix),
            Step::RootDir => resolved.push(Component::RootDir.as_os_str()),
            Step::Parent => {
                resolved.pop();
            }
            Step::Name(name) => {
                resolved.push(&name);
                match fs::symlink_metadata(&resolved) {
                    Ok(meta) if meta.file_type().is_symlink() => {
                        hops += 1;
                        if hops > MAX_SYMLINK_HOPS {
                            return Err(io::Error::other(format!(
                                "too many levels of symbolic links: {}",
                                path.display()
                            )));
                        }
                        let target = fs::read_link(&resolved)?;
                        resolved.pop();
                        // An absolute target starts with a root step and replaces `resolved`.
                        for next in steps(&target).into_iter().rev() {
                            pending.push_front(next);
                        }
                    }
                    Ok(_) => {}
                    Err(err)
                        if matches!(
                            err.kind(),
                            io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
                        ) => {}
                    Err(err) => return Err(err),
                }
            }
        }
    }
    Ok(resolved)
}
