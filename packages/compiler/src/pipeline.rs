//! Glues Lexer → Parser → Inspector → Generator into one entry point per
//! compilation unit (spec §2 "Data flows strictly forward").

use crate::annotation_parser::DEFAULT_ANNOTATION_PREFIX;
use crate::declaration::DeclarationRecord;
use crate::error::PipelineError;
use crate::generator::Generator;
use crate::inspector::{GraphReport, Inspector};
use crate::lexer::Lexer;
use crate::parser::Parser as ExprParser;
use crate::template::TemplateBundle;

/// Everything the pipeline needs for one file: its raw text, the
/// declaration dictionary delivered by the external structural decoder, and
/// the template bundle the Generator renders through.
pub struct CompilationUnit<'a> {
    pub file: String,
    pub source: &'a str,
    pub declarations: Vec<DeclarationRecord>,
    pub templates: TemplateBundle,
    /// Annotation family this unit's source was written against (spec §4.2,
    /// `Config::annotation_prefix`); `"weaver"` unless the project renamed
    /// its property wrapper.
    pub annotation_prefix: String,
}

impl<'a> CompilationUnit<'a> {
    /// Convenience constructor for the common case: the default `Weaver`
    /// annotation family.
    pub fn new(
        file: impl Into<String>,
        source: &'a str,
        declarations: Vec<DeclarationRecord>,
        templates: TemplateBundle,
    ) -> Self {
        CompilationUnit {
            file: file.into(),
            source,
            declarations,
            templates,
            annotation_prefix: DEFAULT_ANNOTATION_PREFIX.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledFile {
    pub outputs: Vec<(String, String)>,
}

/// Runs one compilation unit end to end. Fails fast: the first error from
/// any stage aborts the unit (spec §7 propagation policy). When the
/// Inspector reports multiple graph violations, every one is logged before
/// the first is returned as the unit's error, so the driver's diagnostics
/// aren't silently truncated to one finding.
pub fn compile_unit(unit: &CompilationUnit) -> Result<CompiledFile, PipelineError> {
    tracing::debug!(file = %unit.file, "lexing");
    let lexer = Lexer::with_prefix(unit.file.clone(), unit.source, unit.annotation_prefix.clone());
    let tokens = lexer.tokenize(&unit.declarations)?;

    tracing::debug!(file = %unit.file, token_count = tokens.len(), "parsing");
    let mut parser = ExprParser::new(unit.file.clone(), &tokens);
    let ast = parser.parse()?;

    tracing::debug!(file = %unit.file, "inspecting");
    match Inspector::inspect(&ast)? {
        GraphReport::Ok => {}
        GraphReport::Errors(errors) => {
            for error in &errors {
                tracing::warn!(file = %unit.file, %error, "invalid dependency graph");
            }
            let first = errors.into_iter().next().expect("GraphReport::Errors is never empty");
            return Err(PipelineError::from(first));
        }
    }

    tracing::debug!(file = %unit.file, "generating");
    let outputs = Generator::generate(&ast, &unit.templates)?;
    Ok(CompiledFile { outputs })
}
