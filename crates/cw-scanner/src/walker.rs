//! Workspace traversal for manifest files.
//!
//! This module provides [`ModuleWalker`], which uses the `ignore` crate to
//! walk a workspace and report every directory containing a manifest file.
//!
//! # Features
//!
//! - Prunes configured directories (`node_modules`, `.git`, ...) before descending
//! - Optionally respects `.gitignore` and `.ignore` patterns
//! - Records per-entry failures instead of aborting the walk
//! - Converts paths to UTF-8 [`Utf8PathBuf`](camino::Utf8PathBuf)

use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use ignore::WalkBuilder;

use cw_core::{DiscoveryConfig, ModuleRoot};

use crate::error::ScanError;

/// Result of one discovery pass.
#[derive(Debug, Default)]
pub struct DiscoveryReport {
    /// Module roots found, sorted and free of duplicates.
    pub roots: Vec<ModuleRoot>,

    /// Entries that could not be read. The walk continued past each one.
    pub errors: Vec<ScanError>,

    /// Number of manifest files seen, including any that mapped to the same root.
    pub manifests_found: usize,
}

impl DiscoveryReport {
    /// Returns `true` if no entry failed during the walk.
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A walker that discovers module roots in a workspace.
///
/// # Examples
///
/// ```no_run
/// use cw_core::DiscoveryConfig;
/// use cw_scanner::ModuleWalker;
///
/// # fn example() -> Result<(), cw_scanner::ScanError> {
/// let walker = ModuleWalker::new(&DiscoveryConfig::default())?;
/// let report = walker.discover();
///
/// for root in &report.roots {
///     println!("Module: {root}");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ModuleWalker {
    /// Canonical workspace root.
    root: Utf8PathBuf,
    manifest_name: String,
    ignore_dirs: Arc<[String]>,
    respect_gitignore: bool,
    follow_links: bool,
}

impl ModuleWalker {
    /// Creates a walker for the configured workspace.
    ///
    /// The workspace root is canonicalized so that discovered roots are
    /// absolute and comparable with paths reported by the watcher.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Config`] if the root path doesn't exist or
    /// isn't a directory.
    pub fn new(config: &DiscoveryConfig) -> Result<Self, ScanError> {
        let root = &config.workspace_root;
        if !root.exists() {
            return Err(ScanError::config(format!(
                "root path does not exist: {root}"
            )));
        }
        if !root.is_dir() {
            return Err(ScanError::config(format!(
                "root path is not a directory: {root}"
            )));
        }

        let root = root
            .canonicalize_utf8()
            .map_err(|e| ScanError::config(format!("cannot resolve {root}: {e}")))?;

        Ok(Self {
            root,
            manifest_name: config.manifest_name.clone(),
            ignore_dirs: config.ignore_dirs.iter().cloned().collect(),
            respect_gitignore: config.respect_gitignore,
            follow_links: config.follow_links,
        })
    }

    /// Returns the canonical workspace root being walked.
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Walks the workspace and collects every module root.
    ///
    /// Entries that fail to read are logged, recorded in the report and
    /// skipped; the walk itself never fails once the walker exists.
    #[must_use]
    pub fn discover(&self) -> DiscoveryReport {
        let mut report = DiscoveryReport::default();

        for result in self.build_walker() {
            let entry = match result {
                Ok(entry) => entry,
                Err(error) => {
                    tracing::warn!(error = %error, "Skipping unreadable entry during discovery");
                    report.errors.push(ScanError::Walk(error));
                    continue;
                }
            };

            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }
            if entry.file_name() != self.manifest_name.as_str() {
                continue;
            }

            let path = entry.path();
            let Some(manifest) = Utf8Path::from_path(path) else {
                tracing::warn!(path = %path.display(), "Skipping non-UTF-8 manifest path");
                report.errors.push(ScanError::NonUtf8Path(path.to_owned()));
                continue;
            };

            report.manifests_found += 1;
            if let Some(root) = ModuleRoot::from_manifest(manifest) {
                tracing::trace!(root = %root, "Found module");
                report.roots.push(root);
            }
        }

        report.roots.sort_unstable();
        report.roots.dedup();

        tracing::debug!(
            root = %self.root,
            modules = report.roots.len(),
            errors = report.errors.len(),
            "Discovery complete"
        );

        report
    }

    /// Builds the ignore walker with configured settings.
    fn build_walker(&self) -> ignore::Walk {
        let ignore_dirs = Arc::clone(&self.ignore_dirs);

        WalkBuilder::new(&self.root)
            // Hidden directories may hold modules; pruning is explicit below
            .standard_filters(false)
            .git_ignore(self.respect_gitignore)
            .git_exclude(self.respect_gitignore)
            .ignore(self.respect_gitignore)
            .parents(self.respect_gitignore)
            .follow_links(self.follow_links)
            .require_git(false)
            .filter_entry(move |entry| {
                let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
                if !is_dir || entry.depth() == 0 {
                    return true;
                }
                let name = entry.file_name();
                !ignore_dirs.iter().any(|d| name == d.as_str())
            })
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn workspace() -> (TempDir, Utf8PathBuf) {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let path = Utf8PathBuf::from_path_buf(dir.path().canonicalize().expect("canonicalize"))
            .expect("Invalid path");
        (dir, path)
    }

    fn touch(path: &Utf8Path) {
        fs::create_dir_all(path.parent().expect("parent")).expect("Failed to create dirs");
        fs::write(path, "module example\n").expect("Failed to write file");
    }

    fn config_for(root: &Utf8Path) -> DiscoveryConfig {
        DiscoveryConfig {
            workspace_root: root.to_owned(),
            ..DiscoveryConfig::default()
        }
    }

    #[test]
    fn test_missing_root_is_config_error() {
        let config = DiscoveryConfig {
            workspace_root: Utf8PathBuf::from("/nonexistent/workspace"),
            ..DiscoveryConfig::default()
        };
        let err = ModuleWalker::new(&config).unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_file_root_is_config_error() {
        let (_dir, root) = workspace();
        touch(&root.join("go.mod"));
        let err = ModuleWalker::new(&config_for(&root.join("go.mod"))).unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }

    #[test]
    fn test_discovers_nested_modules_sorted() {
        let (_dir, root) = workspace();
        touch(&root.join("svc/b/go.mod"));
        touch(&root.join("svc/a/go.mod"));
        touch(&root.join("go.mod"));
        touch(&root.join("svc/a/go.sum"));

        let report = ModuleWalker::new(&config_for(&root)).unwrap().discover();

        assert!(report.is_complete());
        assert_eq!(report.manifests_found, 3);
        assert_eq!(
            report.roots,
            vec![
                ModuleRoot::new(root.clone()),
                ModuleRoot::new(root.join("svc/a")),
                ModuleRoot::new(root.join("svc/b")),
            ]
        );
    }

    #[test]
    fn test_ignore_dirs_are_pruned() {
        let (_dir, root) = workspace();
        touch(&root.join("app/go.mod"));
        touch(&root.join("node_modules/pkg/go.mod"));
        touch(&root.join("app/.git/modules/go.mod"));

        let report = ModuleWalker::new(&config_for(&root)).unwrap().discover();
        assert_eq!(report.roots, vec![ModuleRoot::new(root.join("app"))]);
    }

    #[test]
    fn test_hidden_directories_are_walked() {
        let (_dir, root) = workspace();
        touch(&root.join(".tools/gen/go.mod"));

        let report = ModuleWalker::new(&config_for(&root)).unwrap().discover();
        assert_eq!(report.roots, vec![ModuleRoot::new(root.join(".tools/gen"))]);
    }

    #[test]
    fn test_gitignore_only_when_enabled() {
        let (_dir, root) = workspace();
        touch(&root.join("kept/go.mod"));
        touch(&root.join("third_party/dep/go.mod"));
        fs::write(root.join(".gitignore"), "third_party/\n").expect("Failed to write file");

        let all = ModuleWalker::new(&config_for(&root)).unwrap().discover();
        assert_eq!(all.roots.len(), 2);

        let config = DiscoveryConfig {
            respect_gitignore: true,
            ..config_for(&root)
        };
        let filtered = ModuleWalker::new(&config).unwrap().discover();
        assert_eq!(filtered.roots, vec![ModuleRoot::new(root.join("kept"))]);
    }

    #[test]
    fn test_custom_manifest_name() {
        let (_dir, root) = workspace();
        touch(&root.join("a/go.mod"));
        touch(&root.join("b/Cargo.toml"));

        let config = DiscoveryConfig {
            manifest_name: "Cargo.toml".to_owned(),
            ..config_for(&root)
        };
        let report = ModuleWalker::new(&config).unwrap().discover();
        assert_eq!(report.roots, vec![ModuleRoot::new(root.join("b"))]);
    }

    #[test]
    fn test_root_is_canonicalized() {
        let (_dir, root) = workspace();
        fs::create_dir_all(root.join("sub")).expect("Failed to create dirs");

        let config = config_for(&root.join("sub/.."));
        let walker = ModuleWalker::new(&config).unwrap();
        assert_eq!(walker.root(), root);
    }
}
