//! Turns a declaration dictionary + source text into a token stream (spec
//! §4.2).

use crate::annotation_parser::{self, ParsedAnnotation, DEFAULT_ANNOTATION_PREFIX};
use crate::declaration::{DeclarationKind, DeclarationRecord};
use crate::error::LexerError;
use crate::token::{LineIndex, Token, TokenPayload};

pub struct Lexer<'a> {
    file: String,
    line_index: LineIndex,
    source: &'a str,
    /// Annotation family recognized as a Weaver annotation (spec §4.2),
    /// matched case-insensitively; defaults to `"weaver"` but a project may
    /// rename its property wrapper via `weaver.config.json`.
    prefix: String,
}

impl<'a> Lexer<'a> {
    pub fn new(file: impl Into<String>, source: &'a str) -> Self {
        Lexer::with_prefix(file, source, DEFAULT_ANNOTATION_PREFIX)
    }

    pub fn with_prefix(file: impl Into<String>, source: &'a str, prefix: impl Into<String>) -> Self {
        Lexer { file: file.into(), line_index: LineIndex::new(source), source, prefix: prefix.into() }
    }

    pub fn tokenize(&self, declarations: &[DeclarationRecord]) -> Result<Vec<Token>, LexerError> {
        let mut tokens = Vec::new();
        for line in self.source.lines() {
            if let Some(text) = line.trim_start().strip_prefix("import") {
                if text.is_empty() || text.starts_with(' ') {
                    tokens.push(Token::new(
                        TokenPayload::ImportDeclaration { text: line.trim().to_string() },
                        0,
                        line.len(),
                        0,
                    ));
                }
            }
        }

        for declaration in declarations {
            self.tokenize_declaration(declaration, &mut tokens)?;
        }

        tokens.sort_by_key(|t| t.byte_offset);
        Ok(tokens)
    }

    fn tokenize_declaration(
        &self,
        declaration: &DeclarationRecord,
        out: &mut Vec<Token>,
    ) -> Result<(), LexerError> {
        let line = self.line_index.line_at(declaration.offset);

        match declaration.kind {
            DeclarationKind::Class | DeclarationKind::Struct => {
                let access = crate::model::AccessLevel::parse(
                    declaration.accessibility.as_deref().unwrap_or(""),
                );
                out.push(Token::new(
                    TokenPayload::InjectableType { name: declaration.name.clone(), access },
                    declaration.offset,
                    declaration.length,
                    line,
                ));
                self.tokenize_type_level_config(declaration, line, out)?;
                for child in &declaration.substructure {
                    self.tokenize_declaration(child, out)?;
                }
                if declaration.has_body() {
                    let end_offset = declaration.offset + declaration.length.saturating_sub(1);
                    out.push(Token::new(
                        TokenPayload::EndOfInjectableType,
                        end_offset,
                        0,
                        self.line_index.line_at(end_offset),
                    ));
                }
            }
            DeclarationKind::Enum | DeclarationKind::Extension => {
                out.push(Token::new(
                    TokenPayload::AnyDeclaration { name: declaration.name.clone() },
                    declaration.offset,
                    declaration.length,
                    line,
                ));
                for child in &declaration.substructure {
                    self.tokenize_declaration(child, out)?;
                }
                if declaration.has_body() {
                    let end_offset = declaration.offset + declaration.length.saturating_sub(1);
                    out.push(Token::new(
                        TokenPayload::EndOfAnyDeclaration,
                        end_offset,
                        0,
                        self.line_index.line_at(end_offset),
                    ));
                }
            }
            DeclarationKind::VarInstance => {
                self.tokenize_variable(declaration, line, out)?;
            }
        }
        Ok(())
    }

    /// Type-level configuration, e.g. `@Weaver(isIsolated: true)` attached
    /// directly to a class/struct declaration rather than to one of its
    /// dependencies.
    fn tokenize_type_level_config(
        &self,
        declaration: &DeclarationRecord,
        line: usize,
        out: &mut Vec<Token>,
    ) -> Result<(), LexerError> {
        for text in declaration.custom_attribute_texts() {
            let parsed =
                annotation_parser::parse_annotation(text, &self.prefix).map_err(|cause| LexerError {
                    line: line + 1,
                    file: self.file.clone(),
                    cause,
                })?;
            let Some(parsed) = parsed else { continue };
            if annotation_parser::dependency_kind(&parsed).is_some() {
                // A dependency-kind annotation on a type itself is malformed;
                // the variable-level path handles dependency annotations.
                continue;
            }
            let attributes = annotation_parser::configuration_attributes(&parsed)
                .map_err(|cause| LexerError { line: line + 1, file: self.file.clone(), cause })?;
            for attribute in attributes {
                out.push(Token::new(
                    TokenPayload::ConfigurationAnnotation { target: None, attribute },
                    declaration.offset,
                    declaration.length,
                    line,
                ));
            }
        }
        Ok(())
    }

    fn tokenize_variable(
        &self,
        declaration: &DeclarationRecord,
        line: usize,
        out: &mut Vec<Token>,
    ) -> Result<(), LexerError> {
        for text in declaration.custom_attribute_texts() {
            let parsed =
                annotation_parser::parse_annotation(text, &self.prefix).map_err(|cause| LexerError {
                    line: line + 1,
                    file: self.file.clone(),
                    cause,
                })?;
            let Some(parsed) = parsed else { continue };

            self.emit_dependency_tokens(declaration, &parsed, line, out).map_err(|cause| {
                LexerError { line: line + 1, file: self.file.clone(), cause }
            })?;
        }
        Ok(())
    }

    fn emit_dependency_tokens(
        &self,
        declaration: &DeclarationRecord,
        parsed: &ParsedAnnotation,
        line: usize,
        out: &mut Vec<Token>,
    ) -> Result<(), crate::error::TokenError> {
        use crate::model::DependencyKind;

        let name = declaration.name.clone();
        let abstract_ = annotation_parser::extract_type(parsed)
            .or_else(|| declaration.typename.clone());
        let kind = annotation_parser::dependency_kind(parsed).ok_or_else(|| {
            crate::error::TokenError::InvalidAnnotation(format!("@{}(...)", parsed.prefix))
        })?;
        let access = crate::model::AccessLevel::parse(declaration.accessibility.as_deref().unwrap_or(""));

        let payload = match kind {
            DependencyKind::Registration => TokenPayload::RegisterAnnotation {
                name: name.clone(),
                concrete: abstract_.clone(),
                abstract_: abstract_.clone(),
                access,
            },
            DependencyKind::Reference => {
                TokenPayload::ReferenceAnnotation { name: name.clone(), abstract_: abstract_.clone(), access }
            }
            DependencyKind::Parameter => TokenPayload::ParameterAnnotation {
                name: name.clone(),
                abstract_: abstract_.clone(),
                expected_params: parsed.expected_params.max(1),
                access,
            },
        };

        out.push(Token::new(payload, declaration.offset, declaration.length, line));

        let attributes = annotation_parser::configuration_attributes(parsed)?;
        for attribute in attributes {
            out.push(Token::new(
                TokenPayload::ConfigurationAnnotation { target: Some(name.clone()), attribute },
                declaration.offset,
                declaration.length,
                line,
            ));
        }
        Ok(())
    }
}
