//! Manifest validation against the file system.
//!
//! Two directions are checked: every file the configuration names must exist,
//! and every file under a watched directory must be named by some module.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use indexmap::IndexSet;
use log::{debug, error, info};
use walkdir::WalkDir;

use crate::{config::Config, error::Result, manifest::GroupManifest};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Problem {
    /// A configured path does not exist under the root
    MissingFile { path: PathBuf },
    /// A file under a watched directory that no module uses
    Orphan { path: PathBuf },
    /// A projection lists a module that is not configured
    UnknownProjectionModule { module: String },
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFile { path } => {
                write!(f, "{} does not exist in the local file structure", path.display())
            }
            Self::Orphan { path } => write!(
                f,
                "{} exists in the local file structure but isn't used by any module",
                path.display()
            ),
            Self::UnknownProjectionModule { module } => {
                write!(f, "projection lists unknown module `{module}`")
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub checked_files: usize,
    pub problems: Vec<Problem>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Every path the configuration names, relative to the root, in first-seen
/// order. Group references are expanded.
fn referenced_files(config: &Config, manifest: &GroupManifest) -> Result<IndexSet<PathBuf>> {
    let group_names: Vec<&str> = manifest.group_names().collect();
    let mut files: IndexSet<PathBuf> = manifest
        .merge_files_for("<manifest>", &group_names)?
        .into_iter()
        .map(PathBuf::from)
        .collect();

    for module in &config.modules {
        if let Some(explicit) = &module.files {
            files.extend(explicit.iter().map(PathBuf::from));
        }
    }
    Ok(files)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.'))
}

fn find_orphans(
    root: &Path,
    watched: &Path,
    referenced: &IndexSet<PathBuf>,
    wrappers: &IndexSet<PathBuf>,
) -> Vec<Problem> {
    let mut orphans = Vec::new();
    let entries = WalkDir::new(root.join(watched))
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!("Skipping unreadable entry: {e}");
                None
            }
        });

    for entry in entries {
        if !entry.file_type().is_file() || is_hidden(entry.path()) {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        if !referenced.contains(relative) && !wrappers.contains(relative) {
            orphans.push(Problem::Orphan {
                path: relative.to_path_buf(),
            });
        }
    }
    orphans
}

/// Check the configuration against the tree under `config.root`.
///
/// Configuration errors such as unknown group references are returned as
/// `Err`; file-system mismatches are collected into the report.
pub fn validate(config: &Config) -> Result<ValidationReport> {
    let manifest = GroupManifest::new(config.groups.clone());
    let referenced = referenced_files(config, &manifest)?;
    let wrappers: IndexSet<PathBuf> = config
        .modules
        .iter()
        .flat_map(|m| [m.prefix.clone(), m.suffix.clone()])
        .collect();

    let mut report = ValidationReport::default();

    for path in referenced.iter().chain(wrappers.iter()) {
        report.checked_files += 1;
        if !config.root.join(path).is_file() {
            report.problems.push(Problem::MissingFile { path: path.clone() });
        }
    }

    for watched in &config.watched_dirs {
        report.problems.extend(find_orphans(
            &config.root,
            watched,
            &referenced,
            &wrappers,
        ));
    }

    let known: IndexSet<&str> = config.modules.iter().map(|m| m.name.as_str()).collect();
    for projection in std::iter::once(&config.test_bundles).chain(&config.projections) {
        for module in &projection.modules {
            if !known.contains(module.as_str()) {
                report.problems.push(Problem::UnknownProjectionModule {
                    module: module.clone(),
                });
            }
        }
    }

    for problem in &report.problems {
        error!("{problem}");
    }
    if report.is_ok() {
        info!("All {} files were detected successfully", report.checked_files);
    }
    Ok(report)
}
