//! Artifact finalization: writes the full, minified and map artifacts of one
//! module.

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, info};
use sha2::{Digest, Sha256};

use crate::{
    error::{BuildError, Result},
    minify::Minifier,
};

/// Paths written for one module, plus the digest of the unminified artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedModule {
    pub name: String,
    pub full_path: PathBuf,
    pub min_path: PathBuf,
    pub map_path: PathBuf,
    pub sha256: String,
}

pub fn full_file_name(name: &str) -> String {
    format!("{name}.js")
}

pub fn min_file_name(name: &str) -> String {
    format!("{name}.min.js")
}

pub fn map_file_name(name: &str) -> String {
    format!("{name}.min.js.map")
}

/// Create `dir` and its parents. Succeeds when it already exists.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|source| BuildError::OutputWriteFailure {
        path: dir.to_path_buf(),
        source,
    })
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|source| BuildError::OutputWriteFailure {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Wrote {} ({} bytes)", path.display(), contents.len());
    Ok(())
}

fn hex_digest(contents: &str) -> String {
    format!("{:x}", Sha256::digest(contents.as_bytes()))
}

/// Write `name.js`, `name.min.js` and `name.min.js.map` into `out_dir`.
///
/// The unminified file is written before minification starts, so a transform
/// failure leaves it on disk next to no minified sibling.
pub fn finalize(
    name: &str,
    text: &str,
    out_dir: &Path,
    minifier: &dyn Minifier,
) -> Result<FinalizedModule> {
    ensure_dir(out_dir)?;

    let full_name = full_file_name(name);
    let full_path = out_dir.join(&full_name);
    write_file(&full_path, text)?;

    let minified = minifier.minify(text, &full_name)?;

    let map_name = map_file_name(name);
    let min_path = out_dir.join(min_file_name(name));
    let map_path = out_dir.join(&map_name);

    let mut min_code = minified.code;
    if !min_code.ends_with('\n') {
        min_code.push('\n');
    }
    min_code.push_str("//# sourceMappingURL=");
    min_code.push_str(&map_name);
    min_code.push('\n');

    write_file(&min_path, &min_code)?;
    write_file(&map_path, &minified.map)?;

    let sha256 = hex_digest(text);
    info!("Finalized {name} ({})", &sha256[..12]);

    Ok(FinalizedModule {
        name: name.to_owned(),
        full_path,
        min_path,
        map_path,
        sha256,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;
    use crate::minify::MinifiedOutput;

    /// Returns the input unchanged with a fixed map
    #[derive(Debug)]
    struct Passthrough;

    impl Minifier for Passthrough {
        fn minify(&self, source: &str, source_label: &str) -> Result<MinifiedOutput> {
            Ok(MinifiedOutput {
                code: source.to_owned(),
                map: format!(r#"{{"version":3,"sources":["{source_label}"],"mappings":""}}"#),
            })
        }
    }

    #[derive(Debug)]
    struct Rejecting;

    impl Minifier for Rejecting {
        fn minify(&self, _source: &str, source_label: &str) -> Result<MinifiedOutput> {
            Err(BuildError::TransformFailure {
                label: source_label.to_owned(),
                message: "Unexpected token".to_owned(),
            })
        }
    }

    fn listing(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_writes_exactly_three_files() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("build/nested");

        let result = finalize("angular-route", "var a = 1;", &out, &Passthrough).unwrap();

        assert_eq!(
            listing(&out),
            vec!["angular-route.js", "angular-route.min.js", "angular-route.min.js.map"]
        );
        assert_eq!(fs::read_to_string(&result.full_path).unwrap(), "var a = 1;");
        assert_eq!(
            fs::read_to_string(&result.min_path).unwrap(),
            "var a = 1;\n//# sourceMappingURL=angular-route.min.js.map\n"
        );
        assert!(
            fs::read_to_string(&result.map_path)
                .unwrap()
                .contains(r#""sources":["angular-route.js"]"#)
        );
        assert_eq!(result.sha256, hex_digest("var a = 1;"));
    }

    #[test]
    fn test_existing_out_dir_is_fine() {
        let dir = TempDir::new().unwrap();
        finalize("a", "1;", dir.path(), &Passthrough).unwrap();
        finalize("a", "2;", dir.path(), &Passthrough).unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("a.js")).unwrap(), "2;");
    }

    #[test]
    fn test_transform_failure_leaves_no_minified_artifact() {
        let dir = TempDir::new().unwrap();
        let err = finalize("broken", "var = ;", dir.path(), &Rejecting).unwrap_err();

        assert!(matches!(err, BuildError::TransformFailure { .. }));
        assert_eq!(listing(dir.path()), vec!["broken.js"]);
    }

    #[test]
    fn test_unwritable_out_dir_is_output_write_failure() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "").unwrap();

        let err = finalize("a", "1;", &blocker.join("out"), &Passthrough).unwrap_err();
        assert!(matches!(err, BuildError::OutputWriteFailure { .. }));
    }
}
