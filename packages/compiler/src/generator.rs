//! Walks a validated AST and emits host-language source through the
//! template engine (spec §4.5).

use serde_json::json;

use crate::ast::Expr;
use crate::error::GeneratorError;
use crate::graph::Graph;
use crate::model::{DependencyKind, Scope};
use crate::template::TemplateBundle;

pub const CONTAINER_TEMPLATE_PATH: &str = "container.mustache";
pub const RESOLVER_TEMPLATE_PATH: &str = "resolver.mustache";

const DEFAULT_CONTAINER_TEMPLATE: &str = "\
// Generated by weaverc. Do not edit.
extension {{type_name}} {
    static func buildContainer(parent: Resolver? = nil) -> Container {
        let container = Container(parent: parent)
{{#each registrations}}\
        container.register(InstanceKey(abstractType: \"{{abstract_type}}\"), scope: .{{scope}}) { resolver in
            {{concrete_type}}({{builder_args}})
        }
{{/each}}\
        return container
    }
}
";

const DEFAULT_RESOLVER_TEMPLATE: &str = "\
extension {{type_name}} {
{{#each dependencies}}\
    func resolve{{pascal_name}}() -> {{abstract_type}} {
        resolver.resolve(InstanceKey(abstractType: \"{{abstract_type}}\"))
    }
{{/each}}\
}
";

pub fn default_template_bundle() -> TemplateBundle {
    let mut bundle = TemplateBundle::new();
    bundle.insert(CONTAINER_TEMPLATE_PATH, DEFAULT_CONTAINER_TEMPLATE);
    bundle.insert(RESOLVER_TEMPLATE_PATH, DEFAULT_RESOLVER_TEMPLATE);
    bundle
}

pub struct Generator;

impl Generator {
    /// Emits one `(path, text)` pair per `TypeDeclaration`, walked in the
    /// AST's own document order.
    pub fn generate(file: &Expr, templates: &TemplateBundle) -> Result<Vec<(String, String)>, GeneratorError> {
        let Expr::File { types, .. } = file else {
            return Ok(Vec::new());
        };
        let graph = Graph::build(file);
        let container_template = templates.get(CONTAINER_TEMPLATE_PATH)?;
        let resolver_template = templates.get(RESOLVER_TEMPLATE_PATH)?;

        let mut outputs = Vec::new();
        let mut type_decls = Vec::new();
        collect_type_declarations(types, &mut type_decls);

        for type_decl in type_decls {
            let Expr::TypeDeclaration { name, children, .. } = type_decl else { continue };
            let context = build_context(name, children, &graph);
            let mut text = container_template.render(&context);
            text.push('\n');
            text.push_str(&resolver_template.render(&context));
            outputs.push((format!("{name}.generated.swift"), text));
        }
        Ok(outputs)
    }
}

fn collect_type_declarations<'a>(exprs: &'a [Expr], out: &mut Vec<&'a Expr>) {
    for expr in exprs {
        if let Expr::TypeDeclaration { children, .. } = expr {
            out.push(expr);
            collect_type_declarations(children, out);
        }
    }
}

fn build_context(type_name: &str, children: &[Expr], graph: &Graph) -> serde_json::Value {
    let mut registrations = Vec::new();
    let mut dependencies = Vec::new();

    for child in children {
        let Some(dep_name) = child.dependency_name() else { continue };
        let Some(node) = graph.node(type_name, dep_name) else { continue };

        dependencies.push(json!({
            "name": dep_name,
            "pascal_name": pascal_case(dep_name),
            "abstract_type": node.abstract_type.to_string(),
            "kind": format!("{:?}", node.kind).to_lowercase(),
            "expected_params": node.expected_params,
        }));

        if node.kind == DependencyKind::Registration {
            let scope = node.scope.unwrap_or(Scope::Transient);
            registrations.push(json!({
                "name": dep_name,
                "abstract_type": node.abstract_type.to_string(),
                "concrete_type": node.concrete_type.as_ref().map(|c| c.to_string()).unwrap_or_default(),
                "scope": scope_text(scope),
                "is_weak": scope == Scope::Weak,
                "is_lazy": scope == Scope::Lazy,
                "builder_args": "resolver: resolver",
            }));
        }
    }

    json!({
        "type_name": type_name,
        "registrations": registrations,
        "dependencies": dependencies,
    })
}

fn scope_text(scope: Scope) -> &'static str {
    match scope {
        Scope::Transient => "transient",
        Scope::Graph => "graph",
        Scope::Container => "container",
        Scope::Weak => "weak",
        Scope::Lazy => "lazy",
    }
}

fn pascal_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::{AttributeRecord, DeclarationKind, DeclarationRecord};
    use crate::lexer::Lexer;
    use crate::parser::Parser as ExprParser;

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

    fn parse_source(source: &str, declarations: Vec<DeclarationRecord>) -> Expr {
        let lexer = Lexer::new("Test.swift", source);
        let tokens = lexer.tokenize(&declarations).unwrap();
        let mut parser = ExprParser::new("Test.swift", &tokens);
        parser.parse().unwrap()
    }

    #[test]
    fn generates_one_file_per_type_in_document_order() {
        let class = DeclarationRecord {
            kind: DeclarationKind::Class,
            name: "Root".to_string(),
            typename: None,
            offset: 0,
            length: 120,
            accessibility: None,
            attributes: Vec::new(),
            substructure: vec![var_decl(
                "logger",
                "@Weaver(.registration, type: Logger.self, scope: .container)",
                10,
            )],
            body_offset: Some(6),
        };
        let source = "class Root {\n@Weaver(.registration, type: Logger.self, scope: .container) var logger: Logger\n}";
        let ast = parse_source(source, vec![class]);

        let bundle = default_template_bundle();
        let outputs = Generator::generate(&ast, &bundle).unwrap();
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].0, "Root.generated.swift");
        assert!(outputs[0].1.contains("Logger"));
        assert!(outputs[0].1.contains(".container"));
    }

    #[test]
    fn generation_is_deterministic() {
        let class = DeclarationRecord {
            kind: DeclarationKind::Class,
            name: "Root".to_string(),
            typename: None,
            offset: 0,
            length: 80,
            accessibility: None,
            attributes: Vec::new(),
            substructure: vec![var_decl("logger", "@Weaver(.reference)", 10)],
            body_offset: Some(6),
        };
        let source = "class Root {\n@Weaver(.reference) var logger: Logger\n}";
        let ast = parse_source(source, vec![class]);
        let bundle = default_template_bundle();

        let first = Generator::generate(&ast, &bundle).unwrap();
        let second = Generator::generate(&ast, &bundle).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn missing_template_path_is_an_error() {
        let ast = Expr::File { types: Vec::new(), imports: Vec::new() };
        let empty_bundle = TemplateBundle::new();
        assert!(Generator::generate(&ast, &empty_bundle).is_err());
    }
}
