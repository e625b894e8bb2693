//! Minification collaborator.
//!
//! The finalizer hands over source text plus a label and gets back minified
//! code with a source map rooted at that label. Any rejection is fatal.

use std::{fmt, path::PathBuf};

use log::debug;
use oxc_allocator::Allocator;
use oxc_codegen::{Codegen, CodegenOptions};
use oxc_minifier::{Minifier as OxcMinifierPass, MinifierOptions};
use oxc_parser::Parser;
use oxc_span::SourceType;

use crate::error::{BuildError, Result};

/// Output of one minification run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinifiedOutput {
    pub code: String,
    /// Source map JSON whose single source is the label passed in
    pub map: String,
}

/// Seam between the finalizer and the code transformer.
pub trait Minifier: fmt::Debug + Send + Sync {
    fn minify(&self, source: &str, source_label: &str) -> Result<MinifiedOutput>;
}

/// Compress, mangle and print with oxc.
///
/// Input is parsed as a classic script, since release bundles are loaded with
/// plain `<script>` tags.
#[derive(Debug, Default, Clone, Copy)]
pub struct OxcMinifier;

impl Minifier for OxcMinifier {
    fn minify(&self, source: &str, source_label: &str) -> Result<MinifiedOutput> {
        let allocator = Allocator::default();
        let parsed = Parser::new(&allocator, source, SourceType::cjs()).parse();

        if parsed.panicked || !parsed.errors.is_empty() {
            let message = parsed.errors.first().map_or_else(
                || "parser aborted".to_owned(),
                std::string::ToString::to_string,
            );
            return Err(BuildError::TransformFailure {
                label: source_label.to_owned(),
                message,
            });
        }

        let mut program = parsed.program;
        let minified = OxcMinifierPass::new(MinifierOptions::default()).build(&allocator, &mut program);

        let printed = Codegen::new()
            .with_options(CodegenOptions {
                source_map_path: Some(PathBuf::from(source_label)),
                ..CodegenOptions::minify()
            })
            .with_scoping(minified.scoping)
            .build(&program);

        let Some(map) = printed.map else {
            return Err(BuildError::TransformFailure {
                label: source_label.to_owned(),
                message: "no source map was produced".to_owned(),
            });
        };

        debug!(
            "Minified {source_label}: {} -> {} bytes",
            source.len(),
            printed.code.len()
        );

        Ok(MinifiedOutput {
            code: printed.code,
            map: map.to_json_string(),
        })
    }
}
