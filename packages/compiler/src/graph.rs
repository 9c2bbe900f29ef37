//! The dependency graph derived from a validated AST (spec §3 "Graph").
//!
//! The graph holds no independent state: it is rebuilt from an `Expr::File`
//! each time the Inspector runs. Nodes are keyed by `(enclosingType,
//! dependencyName)`; the parent-chain index records, for every type name,
//! its ordered list of enclosing types (nearest first) up to the file root.

use indexmap::IndexMap;

use crate::ast::Expr;
use crate::model::{AccessLevel, CompositeType, DependencyKind, Scope};
use crate::parser::parse_composite;

/// Structural identity of one graph node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub enclosing_type: String,
    pub dependency_name: String,
}

#[derive(Debug, Clone)]
pub struct ResolvedDependency {
    pub id: NodeId,
    pub kind: DependencyKind,
    /// Present only for registrations; references/parameters have no scope
    /// of their own; they inherit whatever scope resolves them.
    pub scope: Option<Scope>,
    pub abstract_type: CompositeType,
    pub concrete_type: Option<CompositeType>,
    pub access: AccessLevel,
    pub line: usize,
    pub expected_params: usize,
}

/// Everything known about one `TypeDeclaration` independent of its
/// dependencies.
#[derive(Debug, Clone)]
pub struct TypeInfo {
    pub name: String,
    pub access: AccessLevel,
    pub line: usize,
    /// Nearest enclosing type first, file root last.
    pub ancestors: Vec<String>,
    /// Dependency names declared directly on this type, in document order
    /// (this is also the type's "own dependency set" used to approximate
    /// the build graph's edges per I2).
    pub own_dependencies: Vec<String>,
}

#[derive(Debug, Default)]
pub struct Graph {
    pub nodes: IndexMap<NodeId, ResolvedDependency>,
    pub types: IndexMap<String, TypeInfo>,
}

impl Graph {
    pub fn build(file: &Expr) -> Graph {
        let Expr::File { types, .. } = file else {
            return Graph::default();
        };
        let mut graph = Graph::default();
        for type_decl in types {
            graph.walk_type(type_decl, &[], AccessLevel::Public);
        }
        graph
    }

    fn walk_type(&mut self, expr: &Expr, ancestors: &[String], enclosing_access: AccessLevel) {
        let Expr::TypeDeclaration { name, access, line, children, .. } = expr else { return };
        let effective_access = access.resolve(enclosing_access);

        let mut own_dependencies = Vec::new();
        for child in children {
            if let Some(dep_name) = child.dependency_name() {
                own_dependencies.push(dep_name.to_string());
                let node = self.resolved_dependency(name, child, effective_access);
                self.nodes.insert(node.id.clone(), node);
            }
        }

        self.types.insert(
            name.clone(),
            TypeInfo {
                name: name.clone(),
                access: effective_access,
                line: *line,
                ancestors: ancestors.to_vec(),
                own_dependencies,
            },
        );

        let mut child_ancestors = Vec::with_capacity(ancestors.len() + 1);
        child_ancestors.push(name.clone());
        child_ancestors.extend_from_slice(ancestors);

        for child in children {
            if matches!(child, Expr::TypeDeclaration { .. }) {
                self.walk_type(child, &child_ancestors, effective_access);
            }
        }
    }

    fn resolved_dependency(&self, enclosing_type: &str, expr: &Expr, enclosing_access: AccessLevel) -> ResolvedDependency {
        let id = NodeId {
            enclosing_type: enclosing_type.to_string(),
            dependency_name: expr.dependency_name().unwrap_or_default().to_string(),
        };
        let access = expr.dependency_access().unwrap_or(AccessLevel::Default).resolve(enclosing_access);
        match expr {
            Expr::RegisterAnnotation { abstract_, concrete, scope, line, .. } => ResolvedDependency {
                id,
                kind: DependencyKind::Registration,
                scope: Some(*scope),
                abstract_type: parse_composite(abstract_),
                concrete_type: Some(parse_composite(concrete)),
                access,
                line: *line,
                expected_params: 0,
            },
            Expr::ReferenceAnnotation { abstract_, line, .. } => ResolvedDependency {
                id,
                kind: DependencyKind::Reference,
                scope: None,
                abstract_type: parse_composite(abstract_),
                concrete_type: None,
                access,
                line: *line,
                expected_params: 0,
            },
            Expr::ParameterAnnotation { abstract_, expected_params, line, .. } => ResolvedDependency {
                id,
                kind: DependencyKind::Parameter,
                scope: None,
                abstract_type: parse_composite(abstract_),
                concrete_type: None,
                access,
                line: *line,
                expected_params: *expected_params,
            },
            _ => unreachable!("only dependency-kind Exprs are passed here"),
        }
    }

    pub fn node(&self, enclosing_type: &str, dependency_name: &str) -> Option<&ResolvedDependency> {
        self.nodes.get(&NodeId {
            enclosing_type: enclosing_type.to_string(),
            dependency_name: dependency_name.to_string(),
        })
    }

    pub fn ancestors_of(&self, type_name: &str) -> &[String] {
        self.types.get(type_name).map(|t| t.ancestors.as_slice()).unwrap_or(&[])
    }
}
