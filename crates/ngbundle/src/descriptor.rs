//! Module descriptors: how one named output bundle is assembled.

use std::path::{Path, PathBuf};

use log::debug;
use serde::Deserialize;

use crate::{
    error::{BuildError, Result},
    manifest::GroupManifest,
};

/// A `[[modules]]` entry as written in the configuration file.
///
/// `files` and `group` are alternatives; when both are present the explicit
/// file list wins.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleEntry {
    pub name: String,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub files: Option<Vec<String>>,
    pub prefix: PathBuf,
    pub suffix: PathBuf,
}

/// Where a descriptor's fragments come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceList {
    ByGroup(String),
    Explicit(Vec<String>),
}

/// A fully resolved module descriptor.
///
/// The source list is resolved against the manifest when the descriptor is
/// built, so `files` is always non-empty and in assembly order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDescriptor {
    pub name: String,
    pub source: SourceList,
    pub files: Vec<PathBuf>,
    pub prefix: PathBuf,
    pub suffix: PathBuf,
}

impl ModuleDescriptor {
    pub fn from_entry(entry: &ModuleEntry, manifest: &GroupManifest) -> Result<Self> {
        let source = match (&entry.files, &entry.group) {
            (Some(files), _) => SourceList::Explicit(files.clone()),
            (None, Some(group)) => SourceList::ByGroup(group.clone()),
            (None, None) => return Err(BuildError::EmptySourceList(entry.name.clone())),
        };

        let files: Vec<PathBuf> = match &source {
            SourceList::Explicit(files) => files.iter().map(PathBuf::from).collect(),
            SourceList::ByGroup(group) => manifest
                .files_for(&entry.name, group)?
                .into_iter()
                .map(PathBuf::from)
                .collect(),
        };

        if files.is_empty() {
            return Err(BuildError::EmptySourceList(entry.name.clone()));
        }

        debug!(
            "Module '{}' resolved to {} source files ({:?})",
            entry.name,
            files.len(),
            source
        );

        Ok(Self {
            name: entry.name.clone(),
            source,
            files,
            prefix: entry.prefix.clone(),
            suffix: entry.suffix.clone(),
        })
    }

    /// Every path the assembler will read, in read order
    pub fn read_order(&self) -> impl Iterator<Item = &Path> {
        std::iter::once(self.prefix.as_path())
            .chain(self.files.iter().map(PathBuf::as_path))
            .chain(std::iter::once(self.suffix.as_path()))
    }
}

/// Resolve every configured entry, failing on the first bad one.
pub fn resolve_all(
    entries: &[ModuleEntry],
    manifest: &GroupManifest,
) -> Result<Vec<ModuleDescriptor>> {
    entries
        .iter()
        .map(|entry| ModuleDescriptor::from_entry(entry, manifest))
        .collect()
}
