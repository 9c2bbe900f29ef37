//! Recursive-descent parser folding the token stream into an `Expr` AST
//! (spec §4.3).
//!
//! ```text
//! File          := Import* TopDecl*
//! TopDecl       := InjectableType | AnyDeclaration
//! InjectableType:= InjectableTypeTok Body EndInjectableTypeTok
//! Body          := ( InjectableType | AnyDeclaration | Annotation )*
//! Annotation    := Register | Reference | Parameter | Configuration
//! ```

use std::collections::HashSet;

use crate::ast::Expr;
use crate::error::ParserError;
use crate::model::{CompositeType, ConfigurationAttribute, Scope};
use crate::token::{Token, TokenPayload};
use crate::type_parser::parse_type;

pub struct Parser<'a> {
    file: String,
    tokens: &'a [Token],
    cursor: usize,
}

impl<'a> Parser<'a> {
    pub fn new(file: impl Into<String>, tokens: &'a [Token]) -> Self {
        Parser { file: file.into(), tokens, cursor: 0 }
    }

    pub fn parse(&mut self) -> Result<Expr, ParserError> {
        let mut imports = Vec::new();
        while let Some(Token { payload: TokenPayload::ImportDeclaration { text }, .. }) = self.peek() {
            imports.push(text.clone());
            self.cursor += 1;
        }

        let mut types = Vec::new();
        self.parse_body_into(&mut types, None)?;

        if self.cursor != self.tokens.len() {
            return Err(self.unexpected_token());
        }

        Ok(Expr::File { types, imports })
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.cursor)
    }

    fn unexpected_token(&self) -> ParserError {
        match self.peek() {
            Some(t) => ParserError::UnexpectedToken { line: t.display_line(), file: self.file.clone() },
            None => ParserError::UnexpectedEOF { file: self.file.clone() },
        }
    }

    /// Parses a sequence of top-level-or-body items into `out`, stopping at
    /// end of stream or at a terminator (an `EndOfInjectableType` belonging
    /// to the enclosing frame). `AnyDeclaration` wrappers are transparent:
    /// their own tokens produce no `Expr`, but nested items inside them are
    /// still appended to `out` in document order.
    fn parse_body_into(&mut self, out: &mut Vec<Expr>, in_type: Option<&mut HashSet<String>>) -> Result<(), ParserError> {
        let mut declared_names = in_type;
        loop {
            match self.peek().map(|t| &t.payload) {
                None => return Ok(()),
                Some(TokenPayload::EndOfInjectableType) | Some(TokenPayload::EndOfAnyDeclaration) => {
                    return Ok(());
                }
                Some(TokenPayload::InjectableType { .. }) => {
                    let expr = self.parse_injectable_type()?;
                    out.push(expr);
                }
                Some(TokenPayload::AnyDeclaration { .. }) => {
                    self.cursor += 1;
                    self.parse_body_into(out, None)?;
                    self.expect_end_of_any_declaration()?;
                }
                Some(TokenPayload::RegisterAnnotation { .. })
                | Some(TokenPayload::ReferenceAnnotation { .. })
                | Some(TokenPayload::ParameterAnnotation { .. }) => {
                    let expr = self.parse_dependency_annotation(declared_names.as_deref_mut())?;
                    out.push(expr);
                }
                Some(TokenPayload::ConfigurationAnnotation { .. }) => {
                    let expr = self.parse_configuration_annotation(out, declared_names.as_deref())?;
                    if let Some(expr) = expr {
                        out.push(expr);
                    }
                }
                Some(TokenPayload::ImportDeclaration { .. }) => {
                    // Imports only legally appear before the first TopDecl;
                    // anywhere else is an unexpected token.
                    return Err(self.unexpected_token());
                }
            }
        }
    }

    fn expect_end_of_any_declaration(&mut self) -> Result<(), ParserError> {
        match self.peek().map(|t| &t.payload) {
            Some(TokenPayload::EndOfAnyDeclaration) => {
                self.cursor += 1;
                Ok(())
            }
            // A body-less `enum`/`extension` (no tokens emitted for its
            // end) simply has nothing to consume.
            _ => Ok(()),
        }
    }

    fn parse_injectable_type(&mut self) -> Result<Expr, ParserError> {
        let Some(Token { payload: TokenPayload::InjectableType { name, access }, line, .. }) = self.peek().cloned()
        else {
            return Err(self.unexpected_token());
        };
        self.cursor += 1;

        let mut children = Vec::new();
        let mut declared_names = HashSet::new();
        let mut type_config = Vec::new();

        loop {
            match self.peek().map(|t| &t.payload) {
                None => return Err(ParserError::UnexpectedEOF { file: self.file.clone() }),
                Some(TokenPayload::EndOfInjectableType) => {
                    self.cursor += 1;
                    break;
                }
                Some(TokenPayload::ConfigurationAnnotation { target: None, .. }) => {
                    // Type-level configuration, e.g. `isIsolated`.
                    if let Some(Token {
                        payload: TokenPayload::ConfigurationAnnotation { attribute, .. }, ..
                    }) = self.peek().cloned()
                    {
                        type_config.push(attribute);
                        self.cursor += 1;
                    }
                }
                _ => {
                    let before = self.cursor;
                    self.parse_one_body_item(&mut children, &mut declared_names)?;
                    debug_assert!(self.cursor > before);
                }
            }
        }

        Ok(Expr::TypeDeclaration { name, access, line, children, config: type_config })
    }

    /// Parses exactly one body item (nested type, transparent any-decl, or
    /// dependency/configuration annotation) into `children`.
    fn parse_one_body_item(
        &mut self,
        children: &mut Vec<Expr>,
        declared_names: &mut HashSet<String>,
    ) -> Result<(), ParserError> {
        match self.peek().map(|t| &t.payload) {
            Some(TokenPayload::InjectableType { .. }) => {
                children.push(self.parse_injectable_type()?);
                Ok(())
            }
            Some(TokenPayload::AnyDeclaration { .. }) => {
                self.cursor += 1;
                self.parse_body_into(children, Some(declared_names))?;
                self.expect_end_of_any_declaration()
            }
            Some(TokenPayload::RegisterAnnotation { .. })
            | Some(TokenPayload::ReferenceAnnotation { .. })
            | Some(TokenPayload::ParameterAnnotation { .. }) => {
                children.push(self.parse_dependency_annotation(Some(declared_names))?);
                Ok(())
            }
            Some(TokenPayload::ConfigurationAnnotation { .. }) => {
                if let Some(expr) = self.parse_configuration_annotation(children, Some(declared_names))? {
                    children.push(expr);
                }
                Ok(())
            }
            Some(TokenPayload::ImportDeclaration { .. }) | Some(TokenPayload::EndOfAnyDeclaration) | None => {
                Err(self.unexpected_token())
            }
            Some(TokenPayload::EndOfInjectableType) => unreachable!("handled by caller"),
        }
    }

    fn parse_dependency_annotation(
        &mut self,
        declared_names: Option<&mut HashSet<String>>,
    ) -> Result<Expr, ParserError> {
        let token = self.peek().cloned().expect("checked by caller");
        self.cursor += 1;
        let line = token.display_line();

        let name = token.dependency_name().unwrap_or("").to_string();

        if let Some(declared_names) = declared_names {
            if !declared_names.insert(name.clone()) {
                return Err(ParserError::DependencyDoubleDeclaration {
                    line,
                    file: self.file.clone(),
                    name,
                });
            }
        }

        let expr = match token.payload {
            TokenPayload::RegisterAnnotation { name, concrete, abstract_, access } => {
                let concrete_text = concrete.unwrap_or_default();
                let abstract_text = abstract_.unwrap_or_else(|| concrete_text.clone());
                Expr::RegisterAnnotation {
                    name,
                    concrete: render_or_raw(&concrete_text),
                    abstract_: render_or_raw(&abstract_text),
                    scope: Scope::Container,
                    access,
                    line,
                    config: Vec::new(),
                }
            }
            TokenPayload::ReferenceAnnotation { name, abstract_, access } => Expr::ReferenceAnnotation {
                name,
                abstract_: render_or_raw(&abstract_.unwrap_or_default()),
                access,
                line,
            },
            TokenPayload::ParameterAnnotation { name, abstract_, expected_params, access } => {
                Expr::ParameterAnnotation {
                    name,
                    abstract_: render_or_raw(&abstract_.unwrap_or_default()),
                    expected_params,
                    access,
                    line,
                }
            }
            _ => unreachable!("caller only dispatches dependency payloads here"),
        };
        Ok(expr)
    }

    /// Consumes a `ConfigurationAnnotation` token and folds it into the
    /// most recently produced dependency node sharing its `target` name.
    /// Returns `Ok(None)` (folded) on success, or the node itself if it has
    /// no target (shouldn't occur within a body — type-level config is
    /// consumed by `parse_injectable_type` directly).
    fn parse_configuration_annotation(
        &mut self,
        siblings: &mut [Expr],
        declared_names: Option<&HashSet<String>>,
    ) -> Result<Option<Expr>, ParserError> {
        let Some(Token { payload: TokenPayload::ConfigurationAnnotation { target, attribute }, line, .. }) =
            self.peek().cloned()
        else {
            return Err(self.unexpected_token());
        };
        self.cursor += 1;
        let line = line + 1;

        let Some(target_name) = target else {
            return Ok(Some(Expr::ConfigurationAnnotation { target: None, attribute, line }));
        };

        if let Some(declared_names) = declared_names {
            if !declared_names.contains(&target_name) {
                return Err(ParserError::UnknownDependency { line, file: self.file.clone(), name: target_name });
            }
        }

        let mut applied = false;
        for sibling in siblings.iter_mut() {
            if sibling.dependency_name() == Some(target_name.as_str()) {
                apply_configuration(sibling, &attribute);
                applied = true;
                break;
            }
        }
        if !applied {
            return Err(ParserError::UnknownDependency { line, file: self.file.clone(), name: target_name });
        }
        Ok(None)
    }
}

fn render_or_raw(text: &str) -> String {
    match parse_type(text) {
        Some(t) => t.to_string(),
        None => text.to_string(),
    }
}

fn apply_configuration(expr: &mut Expr, attribute: &ConfigurationAttribute) {
    if let Expr::RegisterAnnotation { scope, config, .. } = expr {
        if attribute.name == "scope" {
            if let crate::model::ConfigValue::Enum(value) = &attribute.value {
                if let Ok(parsed) = Scope::parse(value) {
                    *scope = parsed;
                    return;
                }
            }
        }
        config.push(attribute.clone());
    }
}

/// Renders a parsed abstract/concrete type as `CompositeType`, falling back
/// to the raw text when it fails to parse (defensive; the Lexer only ever
/// produces text it extracted from a `type:` argument, which should always
/// be a valid type expression).
pub fn parse_composite(text: &str) -> CompositeType {
    parse_type(text).unwrap_or_else(|| CompositeType::named(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AccessLevel;

    fn tok(payload: TokenPayload, line: usize) -> Token {
        Token::new(payload, 0, 0, line)
    }

    #[test]
    fn parses_a_simple_type_with_registration_and_reference() {
        let tokens = vec![
            tok(TokenPayload::InjectableType { name: "Foo".into(), access: AccessLevel::Default }, 0),
            tok(
                TokenPayload::RegisterAnnotation {
                    name: "bar".into(),
                    concrete: Some("Bar".into()),
                    abstract_: Some("Bar".into()),
                    access: AccessLevel::Default,
                },
                1,
            ),
            tok(
                TokenPayload::ConfigurationAnnotation {
                    target: Some("bar".into()),
                    attribute: ConfigurationAttribute {
                        name: "scope".into(),
                        value: crate::model::ConfigValue::Enum("graph".into()),
                    },
                },
                1,
            ),
            tok(
                TokenPayload::ReferenceAnnotation {
                    name: "logger".into(),
                    abstract_: Some("Logger".into()),
                    access: AccessLevel::Default,
                },
                2,
            ),
            tok(TokenPayload::EndOfInjectableType, 3),
        ];

        let mut parser = Parser::new("Foo.swift", &tokens);
        let ast = parser.parse().unwrap();

        let Expr::File { types, .. } = ast else { panic!("expected File") };
        assert_eq!(types.len(), 1);
        let Expr::TypeDeclaration { name, children, .. } = &types[0] else { panic!() };
        assert_eq!(name, "Foo");
        assert_eq!(children.len(), 2);
        let Expr::RegisterAnnotation { scope, .. } = &children[0] else { panic!("expected registration") };
        assert_eq!(*scope, Scope::Graph);
    }

    #[test]
    fn rejects_double_declared_dependency_name() {
        let tokens = vec![
            tok(TokenPayload::InjectableType { name: "Foo".into(), access: AccessLevel::Default }, 0),
            tok(
                TokenPayload::RegisterAnnotation {
                    name: "repo".into(),
                    concrete: Some("Repo".into()),
                    abstract_: Some("Repo".into()),
                    access: AccessLevel::Default,
                },
                1,
            ),
            tok(
                TokenPayload::ReferenceAnnotation {
                    name: "repo".into(),
                    abstract_: Some("Repo".into()),
                    access: AccessLevel::Default,
                },
                2,
            ),
            tok(TokenPayload::EndOfInjectableType, 3),
        ];
        let mut parser = Parser::new("Foo.swift", &tokens);
        let err = parser.parse().unwrap_err();
        assert!(matches!(err, ParserError::DependencyDoubleDeclaration { .. }));
    }

    #[test]
    fn rejects_configuration_targeting_unknown_dependency() {
        let tokens = vec![
            tok(TokenPayload::InjectableType { name: "Foo".into(), access: AccessLevel::Default }, 0),
            tok(
                TokenPayload::ConfigurationAnnotation {
                    target: Some("missing".into()),
                    attribute: ConfigurationAttribute {
                        name: "scope".into(),
                        value: crate::model::ConfigValue::Enum("graph".into()),
                    },
                },
                1,
            ),
            tok(TokenPayload::EndOfInjectableType, 2),
        ];
        let mut parser = Parser::new("Foo.swift", &tokens);
        let err = parser.parse().unwrap_err();
        assert!(matches!(err, ParserError::UnknownDependency { .. }));
    }

    #[test]
    fn premature_eof_inside_open_body_is_an_error() {
        let tokens = vec![tok(TokenPayload::InjectableType { name: "Foo".into(), access: AccessLevel::Default }, 0)];
        let mut parser = Parser::new("Foo.swift", &tokens);
        let err = parser.parse().unwrap_err();
        assert!(matches!(err, ParserError::UnexpectedEOF { .. }));
    }
}
