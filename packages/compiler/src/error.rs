//! Error taxonomy (spec §7).
//!
//! Every component fails fast on the first error it detects. Each error
//! carries its originating file/line so the CLI can render
//! `file:line: message` without re-deriving position information.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("invalid annotation text: {0}")]
    InvalidAnnotation(String),
    #[error("invalid scope: {0}")]
    InvalidScope(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{file}:{line}: invalid annotation ({cause})")]
pub struct LexerError {
    pub line: usize,
    pub file: String,
    pub cause: TokenError,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParserError {
    #[error("{file}:{line}: unexpected token")]
    UnexpectedToken { line: usize, file: String },
    #[error("{file}: unexpected end of file")]
    UnexpectedEOF { file: String },
    #[error("{file}:{line}: unknown dependency `{name}`")]
    UnknownDependency { line: usize, file: String, name: String },
    #[error("{file}:{line}: dependency `{name}` declared twice")]
    DependencyDoubleDeclaration { line: usize, file: String, name: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidGraphCause {
    #[error("cyclic dependency")]
    CyclicDependency,
    #[error("unresolvable dependency")]
    UnresolvableDependency,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InspectorError {
    #[error("invalid AST: {expr}{}", file.as_deref().map(|f| format!(" ({f})")).unwrap_or_default())]
    InvalidAST { expr: String, file: Option<String> },
    #[error("{file}:{line}: `{name}: {r#type}` {cause}")]
    InvalidGraph { line: usize, file: String, name: String, r#type: String, cause: InvalidGraphCause },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeneratorError {
    #[error("invalid template path: {0}")]
    InvalidTemplatePath(String),
}

/// The pipeline-wide error, unioning every component error kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Lexer(#[from] LexerError),
    #[error(transparent)]
    Parser(#[from] ParserError),
    #[error(transparent)]
    Inspector(#[from] InspectorError),
    #[error(transparent)]
    Generator(#[from] GeneratorError),
}

impl PipelineError {
    /// Exit code per spec §6: `1` for any user-visible pipeline error.
    pub fn exit_code(&self) -> i32 {
        1
    }
}
