//! The typed AST the Parser builds (spec §3 "AST node (`Expr`)").

use crate::model::{AccessLevel, ConfigurationAttribute, Scope};

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    File { types: Vec<Expr>, imports: Vec<String> },
    TypeDeclaration {
        name: String,
        access: AccessLevel,
        line: usize,
        children: Vec<Expr>,
        /// Configuration attached to the type itself (e.g. `isIsolated`).
        config: Vec<ConfigurationAttribute>,
    },
    RegisterAnnotation {
        name: String,
        concrete: String,
        abstract_: String,
        scope: Scope,
        access: AccessLevel,
        line: usize,
        config: Vec<ConfigurationAttribute>,
    },
    ReferenceAnnotation { name: String, abstract_: String, access: AccessLevel, line: usize },
    ParameterAnnotation {
        name: String,
        abstract_: String,
        expected_params: usize,
        access: AccessLevel,
        line: usize,
    },
    ConfigurationAnnotation { target: Option<String>, attribute: ConfigurationAttribute, line: usize },
}

impl Expr {
    /// The dependency name this node declares, if it is a dependency
    /// annotation (as opposed to a nested type or a configuration node).
    pub fn dependency_name(&self) -> Option<&str> {
        match self {
            Expr::RegisterAnnotation { name, .. }
            | Expr::ReferenceAnnotation { name, .. }
            | Expr::ParameterAnnotation { name, .. } => Some(name),
            _ => None,
        }
    }

    /// The declared access level of a dependency annotation, if this is one.
    pub fn dependency_access(&self) -> Option<AccessLevel> {
        match self {
            Expr::RegisterAnnotation { access, .. }
            | Expr::ReferenceAnnotation { access, .. }
            | Expr::ParameterAnnotation { access, .. } => Some(*access),
            _ => None,
        }
    }

    pub fn line(&self) -> usize {
        match self {
            Expr::File { .. } => 0,
            Expr::TypeDeclaration { line, .. }
            | Expr::RegisterAnnotation { line, .. }
            | Expr::ReferenceAnnotation { line, .. }
            | Expr::ParameterAnnotation { line, .. }
            | Expr::ConfigurationAnnotation { line, .. } => *line,
        }
    }
}
