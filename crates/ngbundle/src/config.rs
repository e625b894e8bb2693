//! Layered configuration.
//!
//! Layers, each overriding the previous one:
//! 1. built-in defaults
//! 2. user config (`<config dir>/ngbundle/ngbundle.toml`), scalar settings only
//! 3. project config (`--config` or `./ngbundle.toml`)
//! 4. `NGBUNDLE_*` environment variables
//! 5. command line overrides

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use etcetera::{BaseStrategy, choose_base_strategy};
use indexmap::IndexMap;
use log::{debug, warn};
use serde::Deserialize;

use crate::{descriptor::ModuleEntry, projection::Projection};

pub const CONFIG_FILE_NAME: &str = "ngbundle.toml";
const APP_DIR_NAME: &str = "ngbundle";

const ENV_OUT_DIR: &str = "NGBUNDLE_OUT_DIR";
const ENV_VERSION: &str = "NGBUNDLE_VERSION";
const ENV_CODE_NAME: &str = "NGBUNDLE_CODE_NAME";
const ENV_PARALLEL: &str = "NGBUNDLE_PARALLEL";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TestBundlesSection {
    dir: Option<PathBuf>,
    #[serde(default)]
    modules: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ValidateSection {
    #[serde(default)]
    watched_dirs: Vec<PathBuf>,
}

/// One configuration file as written on disk
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    root: Option<PathBuf>,
    out_dir: Option<PathBuf>,
    version: Option<String>,
    code_name: Option<String>,
    parallel: Option<bool>,
    groups: Option<IndexMap<String, Vec<String>>>,
    modules: Option<Vec<ModuleEntry>>,
    test_bundles: Option<TestBundlesSection>,
    projections: Option<Vec<Projection>>,
    validate: Option<ValidateSection>,
}

impl ConfigFile {
    fn has_project_sections(&self) -> bool {
        self.groups.is_some()
            || self.modules.is_some()
            || self.test_bundles.is_some()
            || self.projections.is_some()
            || self.validate.is_some()
            || self.root.is_some()
    }
}

/// Command line values that win over every other layer
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub out_dir: Option<PathBuf>,
    pub version: Option<String>,
    pub code_name: Option<String>,
    pub sequential: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base directory for every relative source path
    pub root: PathBuf,
    /// Output root; relative values are taken from `root`
    pub out_dir: PathBuf,
    /// Raw version string, parsed into a `VersionRecord` at build time
    pub version: String,
    pub code_name: String,
    /// Run module pipelines on separate threads
    pub parallel: bool,
    pub groups: IndexMap<String, Vec<String>>,
    pub modules: Vec<ModuleEntry>,
    pub test_bundles: Projection,
    /// Extra projections, run after the test bundles
    pub projections: Vec<Projection>,
    /// Directories whose every file must belong to some module
    pub watched_dirs: Vec<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            out_dir: PathBuf::from("build"),
            version: "0.0.0".to_owned(),
            code_name: "snapshot".to_owned(),
            parallel: true,
            groups: IndexMap::new(),
            modules: Vec::new(),
            test_bundles: Projection::test_bundles(Vec::new()),
            projections: Vec::new(),
            watched_dirs: Vec::new(),
        }
    }
}

impl Config {
    /// Load every layer. `project` is the `--config` path, if any.
    pub fn load(project: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(user_path) = user_config_path() {
            if user_path.is_file() {
                config.merge_user_file(&user_path)?;
            }
        }

        match project {
            Some(path) => {
                if !path.is_file() {
                    bail!("Config file not found: {}", path.display());
                }
                config.merge_project_file(path)?;
            }
            None => {
                let default_path = PathBuf::from(CONFIG_FILE_NAME);
                if default_path.is_file() {
                    config.merge_project_file(&default_path)?;
                } else {
                    debug!("No {CONFIG_FILE_NAME} in the working directory");
                }
            }
        }

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse a project config file on its own, with no other layers.
    pub fn from_project_file(path: &Path) -> Result<Self> {
        let mut config = Self::default();
        config.merge_project_file(path)?;
        Ok(config)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.join(&self.out_dir)
    }

    fn merge_user_file(&mut self, path: &Path) -> Result<()> {
        let file = read_config_file(path)?;
        if file.has_project_sections() {
            warn!(
                "Ignoring project sections in user config {}; only scalar settings apply",
                path.display()
            );
        }
        self.merge_scalars(file.out_dir, file.version, file.code_name, file.parallel);
        Ok(())
    }

    fn merge_project_file(&mut self, path: &Path) -> Result<()> {
        let file = read_config_file(path)?;
        let base = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

        self.root = match file.root {
            Some(root) => base.join(root),
            None => base,
        };
        self.merge_scalars(file.out_dir, file.version, file.code_name, file.parallel);

        if let Some(groups) = file.groups {
            self.groups = groups;
        }
        if let Some(modules) = file.modules {
            self.modules = modules;
        }
        if let Some(section) = file.test_bundles {
            if let Some(dir) = section.dir {
                self.test_bundles.dir = dir;
            }
            self.test_bundles.modules = section.modules;
        }
        if let Some(projections) = file.projections {
            self.projections = projections;
        }
        if let Some(section) = file.validate {
            self.watched_dirs = section.watched_dirs;
        }

        debug!(
            "Loaded project config {} ({} groups, {} modules)",
            path.display(),
            self.groups.len(),
            self.modules.len()
        );
        Ok(())
    }

    fn merge_scalars(
        &mut self,
        out_dir: Option<PathBuf>,
        version: Option<String>,
        code_name: Option<String>,
        parallel: Option<bool>,
    ) {
        if let Some(out_dir) = out_dir {
            self.out_dir = out_dir;
        }
        if let Some(version) = version {
            self.version = version;
        }
        if let Some(code_name) = code_name {
            self.code_name = code_name;
        }
        if let Some(parallel) = parallel {
            self.parallel = parallel;
        }
    }

    /// Apply `NGBUNDLE_*` variables read through `lookup`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let parallel = lookup(ENV_PARALLEL).and_then(|raw| {
            let parsed = parse_bool(&raw);
            if parsed.is_none() {
                warn!("Ignoring {ENV_PARALLEL}={raw:?}: expected a boolean");
            }
            parsed
        });
        self.merge_scalars(
            lookup(ENV_OUT_DIR).map(PathBuf::from),
            lookup(ENV_VERSION),
            lookup(ENV_CODE_NAME),
            parallel,
        );
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        self.merge_scalars(
            overrides.out_dir,
            overrides.version,
            overrides.code_name,
            overrides.sequential.then_some(false),
        );
    }
}

fn read_config_file(path: &Path) -> Result<ConfigFile> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file {}", path.display()))
}

fn user_config_path() -> Option<PathBuf> {
    match choose_base_strategy() {
        Ok(strategy) => Some(
            strategy
                .config_dir()
                .join(APP_DIR_NAME)
                .join(CONFIG_FILE_NAME),
        ),
        Err(e) => {
            debug!("No user config directory: {e}");
            None
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    const PROJECT: &str = r#"
out_dir = "dist"
version = "1.8.3-local"

[groups]
angularSrc = ["src/minErr.js", "src/Angular.js"]
angularLoader = ["@angularSrc", "src/loader.js"]

[[modules]]
name = "angular"
group = "angularSrc"
prefix = "src/angular.prefix"
suffix = "src/angular.suffix"

[[modules]]
name = "angular-mocks"
files = ["src/ngMock/angular-mocks.js", "src/ngMock/browserTrigger.js"]
prefix = "src/module.prefix"
suffix = "src/module.suffix"

[test_bundles]
modules = ["angular-mocks"]

[[projections]]
dir = "docs"
modules = ["angular"]
include_minified = true

[validate]
watched_dirs = ["src/ngMock"]
"#;

    fn write_project(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_project_file_sections() {
        let dir = TempDir::new().unwrap();
        let config = Config::from_project_file(&write_project(&dir, PROJECT)).unwrap();

        assert_eq!(config.root, dir.path());
        assert_eq!(config.output_dir(), dir.path().join("dist"));
        assert_eq!(config.version, "1.8.3-local");
        assert_eq!(config.code_name, "snapshot");
        assert_eq!(
            config.groups.keys().collect::<Vec<_>>(),
            vec!["angularSrc", "angularLoader"]
        );
        assert_eq!(config.modules.len(), 2);
        assert_eq!(config.modules[0].group.as_deref(), Some("angularSrc"));
        assert_eq!(config.modules[1].files.as_ref().map(Vec::len), Some(2));
        assert_eq!(config.test_bundles.dir, PathBuf::from("test-bundles"));
        assert_eq!(config.test_bundles.modules, vec!["angular-mocks"]);
        assert!(config.projections[0].include_minified);
        assert_eq!(config.watched_dirs, vec![PathBuf::from("src/ngMock")]);
    }

    #[test]
    fn test_root_is_relative_to_config_file() {
        let dir = TempDir::new().unwrap();
        let config =
            Config::from_project_file(&write_project(&dir, "root = \"angular.js\"\n")).unwrap();
        assert_eq!(config.root, dir.path().join("angular.js"));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let dir = TempDir::new().unwrap();
        let err = Config::from_project_file(&write_project(&dir, "outdir = \"x\"\n")).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse config file"));
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(Config::load(Some(&dir.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn test_env_overrides_file() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::from_project_file(&write_project(&dir, PROJECT)).unwrap();

        let env: HashMap<&str, &str> = [
            ("NGBUNDLE_VERSION", "2.0.0"),
            ("NGBUNDLE_CODE_NAME", "zen"),
            ("NGBUNDLE_PARALLEL", "no"),
        ]
        .into_iter()
        .collect();
        config.apply_env(|key| env.get(key).map(|v| (*v).to_owned()));

        assert_eq!(config.version, "2.0.0");
        assert_eq!(config.code_name, "zen");
        assert!(!config.parallel);
        assert_eq!(config.out_dir, PathBuf::from("dist"));
    }

    #[test]
    fn test_bad_env_bool_is_ignored() {
        let mut config = Config::default();
        config.apply_env(|key| (key == "NGBUNDLE_PARALLEL").then(|| "maybe".to_owned()));
        assert!(config.parallel);
    }

    #[test]
    fn test_overrides_win_over_env() {
        let mut config = Config::default();
        config.apply_env(|key| (key == "NGBUNDLE_VERSION").then(|| "2.0.0".to_owned()));
        config.apply_overrides(ConfigOverrides {
            version: Some("3.1.4".to_owned()),
            sequential: true,
            ..ConfigOverrides::default()
        });
        assert_eq!(config.version, "3.1.4");
        assert!(!config.parallel);
    }
}
