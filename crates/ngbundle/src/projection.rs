//! Projections: copies of finalized artifacts into secondary directories.
//!
//! The test-bundle projection copies only unminified artifacts; the
//! documentation projection also carries the minified file and its map.

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, info};
use serde::Deserialize;

use crate::{
    error::{BuildError, Result},
    finalizer::{ensure_dir, full_file_name, map_file_name, min_file_name},
};

pub const DEFAULT_TEST_BUNDLES_DIR: &str = "test-bundles";

/// One projection step as configured
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Projection {
    /// Target directory; relative paths are taken from the output root
    pub dir: PathBuf,
    #[serde(default)]
    pub modules: Vec<String>,
    #[serde(default)]
    pub include_minified: bool,
}

impl Projection {
    pub fn test_bundles(modules: Vec<String>) -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_TEST_BUNDLES_DIR),
            modules,
            include_minified: false,
        }
    }

    fn file_names(&self, module: &str) -> Vec<String> {
        let mut names = vec![full_file_name(module)];
        if self.include_minified {
            names.push(min_file_name(module));
            names.push(map_file_name(module));
        }
        names
    }

    /// Copy the allow-listed artifacts from `out_dir`.
    ///
    /// Every source is checked before the first copy, so a missing artifact
    /// leaves the target untouched.
    pub fn apply(&self, out_dir: &Path) -> Result<Vec<PathBuf>> {
        let target = out_dir.join(&self.dir);

        let mut pairs = Vec::new();
        for module in &self.modules {
            for name in self.file_names(module) {
                let from = out_dir.join(&name);
                if !from.is_file() {
                    return Err(BuildError::MissingArtifact {
                        module: module.clone(),
                        path: from,
                    });
                }
                pairs.push((from, target.join(name)));
            }
        }

        ensure_dir(&target)?;

        let mut copied = Vec::with_capacity(pairs.len());
        for (from, to) in pairs {
            fs::copy(&from, &to).map_err(|source| BuildError::OutputWriteFailure {
                path: to.clone(),
                source,
            })?;
            debug!("Copied {} -> {}", from.display(), to.display());
            copied.push(to);
        }

        info!(
            "Projected {} modules into {}",
            self.modules.len(),
            target.display()
        );
        Ok(copied)
    }
}
