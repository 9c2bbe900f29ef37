//! Lexer integration tests (spec §8: token-stream offsets, line numbers,
//! malformed-annotation errors).

use weaver_compiler::declaration::{AttributeRecord, DeclarationKind, DeclarationRecord};
use weaver_compiler::lexer::Lexer;
use weaver_compiler::token::TokenPayload;

fn var_decl(name: &str, annotation: &str, offset: usize) -> DeclarationRecord {
    DeclarationRecord {
        kind: DeclarationKind::VarInstance,
        name: name.to_string(),
        typename: None,
        offset,
        length: annotation.len(),
        accessibility: None,
        attributes: vec![AttributeRecord {
            name: "source.decl.attribute.custom".to_string(),
            text: Some(annotation.to_string()),
        }],
        substructure: Vec::new(),
        body_offset: None,
    }
}

#[test]
fn token_stream_is_ordered_by_byte_offset() {
    let source = "class Widget {\n@Weaver(.registration, type: Service.self, scope: .graph) var service: Service\n@Weaver(.reference) var logger: Logger\n}";
    let class = DeclarationRecord {
        kind: DeclarationKind::Class,
        name: "Widget".to_string(),
        typename: None,
        offset: 0,
        length: source.len(),
        accessibility: None,
        attributes: Vec::new(),
        substructure: vec![
            var_decl("service", "@Weaver(.registration, type: Service.self, scope: .graph)", 16),
            var_decl("logger", "@Weaver(.reference)", 96),
        ],
        body_offset: Some(13),
    };

    let lexer = Lexer::new("Widget.swift", source);
    let tokens = lexer.tokenize(&[class]).unwrap();

    let offsets: Vec<usize> = tokens.iter().map(|t| t.byte_offset).collect();
    let mut sorted = offsets.clone();
    sorted.sort_unstable();
    assert_eq!(offsets, sorted, "tokens must be ordered by byte offset");

    assert!(tokens.iter().any(|t| matches!(t.payload, TokenPayload::RegisterAnnotation { .. })));
    assert!(tokens.iter().any(|t| matches!(t.payload, TokenPayload::ReferenceAnnotation { .. })));
}

#[test]
fn parameterized_annotation_expected_params_reaches_the_token() {
    let source = "class Widget {\n@WeaverP1(.parameter, type: Int.self) var count: Int\n}";
    let class = DeclarationRecord {
        kind: DeclarationKind::Class,
        name: "Widget".to_string(),
        typename: None,
        offset: 0,
        length: source.len(),
        accessibility: None,
        attributes: Vec::new(),
        substructure: vec![var_decl("count", "@WeaverP1(.parameter, type: Int.self)", 16)],
        body_offset: Some(13),
    };

    let lexer = Lexer::new("Widget.swift", source);
    let tokens = lexer.tokenize(&[class]).unwrap();

    let param = tokens
        .iter()
        .find_map(|t| match &t.payload {
            TokenPayload::ParameterAnnotation { expected_params, .. } => Some(*expected_params),
            _ => None,
        })
        .expect("expected a ParameterAnnotation token");
    assert_eq!(param, 1);
}

#[test]
fn malformed_annotation_is_an_invalid_annotation_lexer_error() {
    let source = "class Widget {\n@Weaver(.registration, type: Service.self\n}";
    let class = DeclarationRecord {
        kind: DeclarationKind::Class,
        name: "Widget".to_string(),
        typename: None,
        offset: 0,
        length: source.len(),
        accessibility: None,
        attributes: Vec::new(),
        substructure: vec![var_decl("service", "@Weaver(.registration, type: Service.self", 16)],
        body_offset: Some(13),
    };

    let lexer = Lexer::new("Widget.swift", source);
    assert!(lexer.tokenize(&[class]).is_err());
}
