//! Bundle assembly: prefix, fragments and suffix joined into one text.

use std::{fs, path::Path};

use log::debug;

use crate::{
    descriptor::ModuleDescriptor,
    error::{BuildError, Result},
    placeholder,
    version::VersionRecord,
};

/// Separator placed between consecutive fragments so a fragment without a
/// trailing terminator never runs into the next one.
pub const FRAGMENT_SEPARATOR: &str = "\n";

fn read_fragment(root: &Path, relative: &Path) -> Result<String> {
    let path = root.join(relative);
    fs::read_to_string(&path).map_err(|source| BuildError::MissingSourceFile { path, source })
}

/// Concatenate a descriptor's fragments, without substitution.
///
/// Result is `prefix + "\n" + join(files, "\n") + "\n" + suffix`.
pub fn concatenate(descriptor: &ModuleDescriptor, root: &Path) -> Result<String> {
    let fragments = descriptor
        .read_order()
        .map(|relative| read_fragment(root, relative))
        .collect::<Result<Vec<_>>>()?;

    debug!(
        "Read {} fragments for module '{}'",
        fragments.len(),
        descriptor.name
    );
    Ok(fragments.join(FRAGMENT_SEPARATOR))
}

/// Assemble the unminified text of one module.
///
/// Substitution runs on the concatenated whole rather than per fragment.
pub fn assemble(
    descriptor: &ModuleDescriptor,
    root: &Path,
    version: &VersionRecord,
) -> Result<String> {
    let joined = concatenate(descriptor, root)?;
    Ok(placeholder::substitute(&joined, version))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;
    use crate::descriptor::SourceList;

    fn write(dir: &TempDir, name: &str, content: &str) {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn descriptor(files: &[&str]) -> ModuleDescriptor {
        ModuleDescriptor {
            name: "angular".to_owned(),
            source: SourceList::Explicit(files.iter().map(|f| (*f).to_owned()).collect()),
            files: files.iter().map(PathBuf::from).collect(),
            prefix: PathBuf::from("src/angular.prefix"),
            suffix: PathBuf::from("src/angular.suffix"),
        }
    }

    #[test]
    fn test_concatenation_law() {
        let dir = TempDir::new().unwrap();
        write(&dir, "src/angular.prefix", "(function(window) {");
        write(&dir, "src/a.js", "var a = 1;\n");
        write(&dir, "src/b.js", "var b = 2");
        write(&dir, "src/angular.suffix", "})(window);");

        let text = concatenate(&descriptor(&["src/a.js", "src/b.js"]), dir.path()).unwrap();
        assert_eq!(
            text,
            "(function(window) {\nvar a = 1;\n\nvar b = 2\n})(window);"
        );
    }

    #[test]
    fn test_assemble_substitutes_after_joining() {
        let dir = TempDir::new().unwrap();
        write(&dir, "src/angular.prefix", "(function(){");
        write(&dir, "src/a.js", r#"var x = "NG_VERSION_FULL";"#);
        write(&dir, "src/angular.suffix", "})();");

        let text = assemble(
            &descriptor(&["src/a.js"]),
            dir.path(),
            &VersionRecord::parse("9.9.9", "snapshot"),
        )
        .unwrap();
        insta::assert_snapshot!(text, @r#"
        (function(){
        var x = "9.9.9";
        })();
        "#);
    }

    #[test]
    fn test_missing_fragment_is_fatal() {
        let dir = TempDir::new().unwrap();
        write(&dir, "src/angular.prefix", "");
        write(&dir, "src/angular.suffix", "");

        let err = concatenate(&descriptor(&["src/gone.js"]), dir.path()).unwrap_err();
        match err {
            BuildError::MissingSourceFile { path, .. } => {
                assert_eq!(path, dir.path().join("src/gone.js"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_suffix_is_fatal() {
        let dir = TempDir::new().unwrap();
        write(&dir, "src/angular.prefix", "");
        write(&dir, "src/a.js", "");

        let err = concatenate(&descriptor(&["src/a.js"]), dir.path()).unwrap_err();
        assert!(matches!(err, BuildError::MissingSourceFile { .. }));
    }
}
