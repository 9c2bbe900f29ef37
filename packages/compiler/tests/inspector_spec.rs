//! Inspector integration tests (spec §8 scenario 2 "Unresolvable reference",
//! plus I3 access compatibility and I4 scope monotonicity).

use weaver_compiler::declaration::{AttributeRecord, DeclarationKind, DeclarationRecord};
use weaver_compiler::error::{InspectorError, InvalidGraphCause};
use weaver_compiler::inspector::{GraphReport, Inspector};
use weaver_compiler::lexer::Lexer;
use weaver_compiler::parser::Parser as ExprParser;

fn var_decl(name: &str, annotation: &str, offset: usize, accessibility: Option<&str>) -> DeclarationRecord {
    DeclarationRecord {
        kind: DeclarationKind::VarInstance,
        name: name.to_string(),
        typename: None,
        offset,
        length: annotation.len(),
        accessibility: accessibility.map(str::to_string),
        attributes: vec![AttributeRecord {
            name: "source.decl.attribute.custom".to_string(),
            text: Some(annotation.to_string()),
        }],
        substructure: Vec::new(),
        body_offset: None,
    }
}

fn class_decl(
    name: &str,
    offset: usize,
    length: usize,
    accessibility: Option<&str>,
    children: Vec<DeclarationRecord>,
) -> DeclarationRecord {
    DeclarationRecord {
        kind: DeclarationKind::Class,
        name: name.to_string(),
        typename: None,
        offset,
        length,
        accessibility: accessibility.map(str::to_string),
        attributes: Vec::new(),
        substructure: children,
        body_offset: Some(offset + 6),
    }
}

fn inspect_source(source: &str, declarations: Vec<DeclarationRecord>) -> GraphReport {
    let lexer = Lexer::new("Test.swift", source);
    let tokens = lexer.tokenize(&declarations).unwrap();
    let mut parser = ExprParser::new("Test.swift", &tokens);
    let ast = parser.parse().unwrap();
    Inspector::inspect(&ast).unwrap()
}

#[test]
fn top_level_unresolvable_reference_is_reported_with_its_name_and_type() {
    let leaf = class_decl(
        "Leaf",
        0,
        50,
        None,
        vec![var_decl("logger", "@Weaver(.reference)", 10, None)],
    );
    let source = "class Leaf {\n@Weaver(.reference) var logger: Logger\n}";
    let report = inspect_source(source, vec![leaf]);

    match report {
        GraphReport::Errors(errors) => {
            assert_eq!(errors.len(), 1);
            assert!(matches!(
                &errors[0],
                InspectorError::InvalidGraph { name, cause: InvalidGraphCause::UnresolvableDependency, .. }
                if name == "logger"
            ));
        }
        GraphReport::Ok => panic!("expected an unresolvable reference"),
    }
}

#[test]
fn a_public_dependency_on_an_internal_type_violates_access_compatibility() {
    let service = class_decl(
        "Service",
        0,
        80,
        Some("internal"),
        vec![var_decl(
            "repo",
            "@Weaver(.registration, type: Repo.self, scope: .container)",
            10,
            Some("public"),
        )],
    );
    let source = "class Service {\npublic @Weaver(.registration, type: Repo.self, scope: .container) var repo: Repo\n}";
    let report = inspect_source(source, vec![service]);

    match report {
        GraphReport::Errors(errors) => {
            assert!(errors.iter().any(|e| matches!(e, InspectorError::InvalidGraph { name, .. } if name == "repo")));
        }
        GraphReport::Ok => panic!("expected an access-compatibility violation"),
    }
}

#[test]
fn container_scope_depending_on_a_transient_registration_violates_scope_monotonicity() {
    let cache = class_decl(
        "Cache",
        60,
        60,
        None,
        vec![var_decl(
            "conn",
            "@Weaver(.registration, type: Connection.self, scope: .transient)",
            70,
            None,
        )],
    );
    let root = class_decl(
        "Root",
        0,
        60,
        None,
        vec![var_decl(
            "cache",
            "@Weaver(.registration, type: Cache.self, scope: .container)",
            10,
            None,
        )],
    );
    let source = "class Root {\n@Weaver(.registration, type: Cache.self, scope: .container) var cache: Cache\n}\nclass Cache {\n@Weaver(.registration, type: Connection.self, scope: .transient) var conn: Connection\n}";
    let report = inspect_source(source, vec![root, cache]);

    match report {
        GraphReport::Errors(errors) => {
            assert!(errors.iter().any(|e| matches!(e, InspectorError::InvalidGraph { name, .. } if name == "cache")));
        }
        GraphReport::Ok => panic!("expected a scope-monotonicity violation"),
    }
}
