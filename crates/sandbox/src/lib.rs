//! Path confinement for tool-driven filesystem access.
//!
//! Core principle: **every file or command operation a model requests is
//! resolved against a fixed output root, and anything that escapes it is
//! rejected.** This crate is the sole security boundary between the model
//! and the host filesystem.

mod error;

pub use error::{Error, Result};

use std::path::{Component, Path, PathBuf};

/// A fixed output root that model-supplied paths are resolved against.
///
/// The root is canonicalized once at construction; the process is expected
/// to keep it for its whole lifetime. Inputs are model-controlled and are
/// checked on every call, never cached.
#[derive(Debug, Clone)]
pub struct Sandbox {
    root: PathBuf,
}

impl Sandbox {
    /// Create a sandbox rooted at `root`, creating the directory if needed.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        std::fs::create_dir_all(root).map_err(|source| Error::Root {
            root: root.to_path_buf(),
            source,
        })?;
        let root = root.canonicalize().map_err(|source| Error::Root {
            root: root.to_path_buf(),
            source,
        })?;
        Ok(Self { root })
    }

    /// The canonicalized root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a model-supplied path to an absolute path under the root.
    ///
    /// The join is normalized lexically (the target may not exist yet, so
    /// `canonicalize` is not an option), folding `.` and `..` components.
    /// Any path that does not land on the root or a descendant of it fails
    /// with [`Error::Escape`]. Absolute inputs are subject to the same
    /// check, so `/etc/passwd` is an escape rather than a bypass.
    pub fn resolve(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();
        let joined = self.root.join(path);
        let normalized = normalize(&joined);

        if normalized.starts_with(&self.root) {
            Ok(normalized)
        } else {
            Err(Error::Escape {
                path: path.to_path_buf(),
            })
        }
    }
}

/// Fold `.` and `..` components without touching the filesystem.
///
/// `..` at the top of the stack pops the previous component; leading `..`
/// above the filesystem root is dropped, which still fails the prefix check
/// in [`Sandbox::resolve`].
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sandbox() -> (TempDir, Sandbox) {
        let dir = TempDir::new().unwrap();
        let sandbox = Sandbox::new(dir.path()).unwrap();
        (dir, sandbox)
    }

    #[test]
    fn resolves_relative_paths() {
        let (_dir, sandbox) = sandbox();
        let resolved = sandbox.resolve("src/main.rs").unwrap();
        assert_eq!(resolved, sandbox.root().join("src/main.rs"));
    }

    #[test]
    fn resolves_root_itself() {
        let (_dir, sandbox) = sandbox();
        assert_eq!(sandbox.resolve(".").unwrap(), sandbox.root());
        assert_eq!(sandbox.resolve("").unwrap(), sandbox.root());
    }

    #[test]
    fn rejects_plain_parent_escape() {
        let (_dir, sandbox) = sandbox();
        assert!(matches!(
            sandbox.resolve("../x"),
            Err(Error::Escape { .. })
        ));
    }

    #[test]
    fn rejects_nested_parent_escape() {
        let (_dir, sandbox) = sandbox();
        assert!(matches!(
            sandbox.resolve("a/../../x"),
            Err(Error::Escape { .. })
        ));
    }

    #[test]
    fn rejects_absolute_paths_outside_root() {
        let (_dir, sandbox) = sandbox();
        assert!(matches!(
            sandbox.resolve("/etc/passwd"),
            Err(Error::Escape { .. })
        ));
    }

    #[test]
    fn accepts_parent_segments_that_stay_inside() {
        let (_dir, sandbox) = sandbox();
        let resolved = sandbox.resolve("a/b/../c").unwrap();
        assert_eq!(resolved, sandbox.root().join("a/c"));
    }

    #[test]
    fn rejects_sibling_directory_with_shared_prefix() {
        // A lexical starts_with on strings would accept `<root>-evil`;
        // component-wise prefix matching must not.
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("out");
        let sandbox = Sandbox::new(&root).unwrap();
        assert!(matches!(
            sandbox.resolve("../out-evil/x"),
            Err(Error::Escape { .. })
        ));
    }
}
