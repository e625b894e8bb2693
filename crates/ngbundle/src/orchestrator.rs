//! Build orchestration: per-module pipelines, then projections.
//!
//! Each module runs assemble -> substitute -> finalize on its own. Nothing is
//! shared between modules, so the pipelines may run on scoped threads. All of
//! them are joined before any projection starts, and a single failure skips
//! the projections entirely.

use std::{
    path::{Path, PathBuf},
    thread,
};

use log::{debug, info};

use crate::{
    assembler,
    config::Config,
    descriptor::{self, ModuleDescriptor},
    error::Result,
    finalizer::{self, FinalizedModule},
    manifest::GroupManifest,
    minify::Minifier,
    version::VersionRecord,
};

/// Everything one invocation wrote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub version: VersionRecord,
    pub out_dir: PathBuf,
    pub modules: Vec<FinalizedModule>,
    pub projected: Vec<PathBuf>,
}

#[derive(Debug)]
pub struct BundleOrchestrator<'a> {
    config: &'a Config,
    minifier: &'a dyn Minifier,
}

impl<'a> BundleOrchestrator<'a> {
    pub fn new(config: &'a Config, minifier: &'a dyn Minifier) -> Self {
        Self { config, minifier }
    }

    pub fn build(&self) -> Result<BuildReport> {
        let version = VersionRecord::parse(&self.config.version, &self.config.code_name);
        let manifest = GroupManifest::new(self.config.groups.clone());
        let descriptors = descriptor::resolve_all(&self.config.modules, &manifest)?;
        let out_dir = self.config.output_dir();

        info!(
            "Building {} modules at version {version} into {}",
            descriptors.len(),
            out_dir.display()
        );
        finalizer::ensure_dir(&out_dir)?;

        let modules = if self.config.parallel {
            self.run_parallel(&descriptors, &version, &out_dir)
        } else {
            self.run_sequential(&descriptors, &version, &out_dir)
        }?;

        let mut projected = Vec::new();
        for projection in std::iter::once(&self.config.test_bundles).chain(&self.config.projections)
        {
            projected.extend(projection.apply(&out_dir)?);
        }

        info!(
            "Build finished: {} modules, {} projected files",
            modules.len(),
            projected.len()
        );
        Ok(BuildReport {
            version,
            out_dir,
            modules,
            projected,
        })
    }

    fn build_module(
        &self,
        descriptor: &ModuleDescriptor,
        version: &VersionRecord,
        out_dir: &Path,
    ) -> Result<FinalizedModule> {
        debug!("Assembling module '{}'", descriptor.name);
        let text = assembler::assemble(descriptor, &self.config.root, version)?;
        finalizer::finalize(&descriptor.name, &text, out_dir, self.minifier)
    }

    fn run_sequential(
        &self,
        descriptors: &[ModuleDescriptor],
        version: &VersionRecord,
        out_dir: &Path,
    ) -> Result<Vec<FinalizedModule>> {
        descriptors
            .iter()
            .map(|descriptor| self.build_module(descriptor, version, out_dir))
            .collect()
    }

    /// One scoped thread per module, joined before returning.
    ///
    /// Results are collected in descriptor order, so the reported error is the
    /// first failing module in configuration order regardless of timing.
    fn run_parallel(
        &self,
        descriptors: &[ModuleDescriptor],
        version: &VersionRecord,
        out_dir: &Path,
    ) -> Result<Vec<FinalizedModule>> {
        thread::scope(|scope| {
            let handles: Vec<_> = descriptors
                .iter()
                .map(|descriptor| {
                    scope.spawn(move || self.build_module(descriptor, version, out_dir))
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| match handle.join() {
                    Ok(result) => result,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        })
    }
}

/// Build with the given configuration and minifier
pub fn build(config: &Config, minifier: &dyn Minifier) -> Result<BuildReport> {
    BundleOrchestrator::new(config, minifier).build()
}
