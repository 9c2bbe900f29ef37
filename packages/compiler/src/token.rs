//! Lexer output (spec §3 "Token").

use serde::{Deserialize, Serialize};

use crate::model::{ConfigurationAttribute, DependencyKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TokenPayload {
    InjectableType { name: String, access: crate::model::AccessLevel },
    EndOfInjectableType,
    AnyDeclaration { name: String },
    EndOfAnyDeclaration,
    RegisterAnnotation {
        name: String,
        concrete: Option<String>,
        abstract_: Option<String>,
        access: crate::model::AccessLevel,
    },
    ReferenceAnnotation { name: String, abstract_: Option<String>, access: crate::model::AccessLevel },
    ParameterAnnotation {
        name: String,
        abstract_: Option<String>,
        expected_params: usize,
        access: crate::model::AccessLevel,
    },
    ConfigurationAnnotation { target: Option<String>, attribute: ConfigurationAttribute },
    ImportDeclaration { text: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub payload: TokenPayload,
    pub byte_offset: usize,
    pub byte_length: usize,
    /// 0-based internally; rendered as 1-based in user-facing messages.
    pub line: usize,
}

impl Token {
    pub fn new(payload: TokenPayload, byte_offset: usize, byte_length: usize, line: usize) -> Self {
        Token { payload, byte_offset, byte_length, line }
    }

    /// 1-based line number for user-facing error messages.
    pub fn display_line(&self) -> usize {
        self.line + 1
    }

    pub fn dependency_kind(&self) -> Option<DependencyKind> {
        match &self.payload {
            TokenPayload::RegisterAnnotation { .. } => Some(DependencyKind::Registration),
            TokenPayload::ReferenceAnnotation { .. } => Some(DependencyKind::Reference),
            TokenPayload::ParameterAnnotation { .. } => Some(DependencyKind::Parameter),
            _ => None,
        }
    }

    pub fn dependency_name(&self) -> Option<&str> {
        match &self.payload {
            TokenPayload::RegisterAnnotation { name, .. }
            | TokenPayload::ReferenceAnnotation { name, .. }
            | TokenPayload::ParameterAnnotation { name, .. } => Some(name.as_str()),
            _ => None,
        }
    }
}

/// Per-line byte-range index over source text, used to translate a byte
/// offset into a 0-based line number without rescanning the text per token.
pub struct LineIndex {
    /// Byte offset where each line starts, in ascending order.
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(i + 1);
            }
        }
        LineIndex { line_starts }
    }

    /// 0-based line number containing `byte_offset`.
    pub fn line_at(&self, byte_offset: usize) -> usize {
        match self.line_starts.binary_search(&byte_offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_index_finds_correct_line() {
        let index = LineIndex::new("abc\ndef\nghi");
        assert_eq!(index.line_at(0), 0);
        assert_eq!(index.line_at(4), 1);
        assert_eq!(index.line_at(9), 2);
    }
}
