//! Builds the dependency graph from an AST and proves I1-I4 (spec §4.4).

use crate::ast::Expr;
use crate::error::{InspectorError, InvalidGraphCause};
use crate::graph::{Graph, ResolvedDependency};
use crate::model::DependencyKind;
use crate::scc::Tarjan;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphReport {
    Ok,
    Errors(Vec<InspectorError>),
}

impl GraphReport {
    pub fn is_ok(&self) -> bool {
        matches!(self, GraphReport::Ok)
    }
}

pub struct Inspector;

impl Inspector {
    /// Builds the graph and checks every invariant, collecting every
    /// violation rather than failing fast on the first one — it is the
    /// Lexer/Parser that fail fast; the Inspector reports everything wrong
    /// with a given graph in one pass so the driver can print them all.
    pub fn inspect(file: &Expr) -> Result<GraphReport, InspectorError> {
        if !matches!(file, Expr::File { .. }) {
            return Err(InspectorError::InvalidAST { expr: "expected File".to_string(), file: None });
        }
        let graph = Graph::build(file);

        let mut errors = Vec::new();
        errors.extend(check_resolvability(&graph));
        errors.extend(check_acyclicity(&graph));
        errors.extend(check_access_compatibility(&graph));
        errors.extend(check_scope_monotonicity(&graph));

        if errors.is_empty() {
            Ok(GraphReport::Ok)
        } else {
            Ok(GraphReport::Errors(errors))
        }
    }
}

/// (I1) Every `reference`/`parameter` obligation must be satisfiable by an
/// ancestor registration, parameter, or forwarded reference of the same
/// name and abstract type.
fn check_resolvability(graph: &Graph) -> Vec<InspectorError> {
    let mut errors = Vec::new();
    for node in graph.nodes.values() {
        if node.kind != DependencyKind::Reference {
            continue;
        }
        let ancestors = graph.ancestors_of(&node.id.enclosing_type);
        let resolved = ancestors.iter().any(|ancestor| {
            graph
                .node(ancestor, &node.id.dependency_name)
                .map(|candidate| matches_obligation(node, candidate))
                .unwrap_or(false)
        });
        if !resolved {
            errors.push(InspectorError::InvalidGraph {
                line: node.line,
                file: graph.types.get(&node.id.enclosing_type).map(|t| t.name.clone()).unwrap_or_default(),
                name: node.id.dependency_name.clone(),
                r#type: node.abstract_type.to_string(),
                cause: InvalidGraphCause::UnresolvableDependency,
            });
        }
    }
    errors
}

fn matches_obligation(reference: &ResolvedDependency, candidate: &ResolvedDependency) -> bool {
    match candidate.kind {
        DependencyKind::Registration => {
            candidate.concrete_type.as_ref().map(|c| c.head_name_or_full()) == Some(reference.abstract_type.head_name_or_full())
                || candidate.abstract_type == reference.abstract_type
        }
        DependencyKind::Parameter | DependencyKind::Reference => candidate.abstract_type == reference.abstract_type,
    }
}

/// (I2) Acyclicity of the build graph restricted to registrations: an edge
/// from registration `(T, name)` to every registration declared on the type
/// its concrete type names (the "own dependency set" approximation, spec
/// §4.4).
fn check_acyclicity(graph: &Graph) -> Vec<InspectorError> {
    let registrations: Vec<_> =
        graph.nodes.values().filter(|n| n.kind == DependencyKind::Registration).collect();
    if registrations.is_empty() {
        return Vec::new();
    }

    let index_of = |id: &crate::graph::NodeId| registrations.iter().position(|n| &n.id == id);

    let mut edges = Vec::new();
    for (i, node) in registrations.iter().enumerate() {
        let Some(concrete) = &node.concrete_type else { continue };
        let Some(target_type) = concrete.head_name() else { continue };
        let Some(target_info) = graph.types.get(target_type) else { continue };
        for dep_name in &target_info.own_dependencies {
            if let Some(target_node) = graph.node(target_type, dep_name) {
                if target_node.kind != DependencyKind::Registration {
                    continue;
                }
                if let Some(j) = index_of(&target_node.id) {
                    edges.push((i, j));
                }
            }
        }
    }

    let tarjan = Tarjan::new(registrations.len(), &edges);
    let mut errors = Vec::new();
    for component in tarjan.strongly_connected_components() {
        let is_self_loop = component.len() == 1 && edges.contains(&(component[0], component[0]));
        if component.len() > 1 || is_self_loop {
            // Deterministic representative: lexically first node (lowest
            // original node index, since registrations are collected in
            // the graph's document order).
            let representative = *component.iter().min().unwrap();
            let node = registrations[representative];
            errors.push(InspectorError::InvalidGraph {
                line: node.line,
                file: node.id.enclosing_type.clone(),
                name: node.id.dependency_name.clone(),
                r#type: node.abstract_type.to_string(),
                cause: InvalidGraphCause::CyclicDependency,
            });
        }
    }
    errors
}

/// (I3) A dependency's declared access level must not exceed its enclosing
/// type's effective access level.
fn check_access_compatibility(graph: &Graph) -> Vec<InspectorError> {
    let mut errors = Vec::new();
    for node in graph.nodes.values() {
        let Some(type_info) = graph.types.get(&node.id.enclosing_type) else { continue };
        if !node.access.is_no_wider_than(type_info.access) {
            errors.push(InspectorError::InvalidGraph {
                line: node.line,
                file: node.id.enclosing_type.clone(),
                name: node.id.dependency_name.clone(),
                r#type: node.abstract_type.to_string(),
                cause: InvalidGraphCause::UnresolvableDependency,
            });
        }
    }
    errors
}

/// (I4) A `container`-scoped registration may not depend, within its own
/// type body, on a `transient`-scoped registration — unless that dependency
/// is itself a parameter or an explicit reference resolved at a wider
/// scope. "Depend on" is the same sibling-within-the-target approximation
/// used for I2.
fn check_scope_monotonicity(graph: &Graph) -> Vec<InspectorError> {
    let mut errors = Vec::new();
    for node in graph.nodes.values() {
        if node.kind != DependencyKind::Registration {
            continue;
        }
        let Some(scope) = node.scope else { continue };
        if !scope.is_container_lifetime() {
            continue;
        }
        let Some(concrete) = &node.concrete_type else { continue };
        let Some(target_type) = concrete.head_name() else { continue };
        let Some(target_info) = graph.types.get(target_type) else { continue };

        for dep_name in &target_info.own_dependencies {
            let Some(dep) = graph.node(target_type, dep_name) else { continue };
            if dep.kind != DependencyKind::Registration {
                // Parameters and references are exempt from monotonicity:
                // they're resolved at the call site, not captured eagerly.
                continue;
            }
            if dep.scope == Some(crate::model::Scope::Transient) {
                errors.push(InspectorError::InvalidGraph {
                    line: node.line,
                    file: node.id.enclosing_type.clone(),
                    name: node.id.dependency_name.clone(),
                    r#type: node.abstract_type.to_string(),
                    cause: InvalidGraphCause::UnresolvableDependency,
                });
            }
        }
    }
    errors
}

impl crate::model::CompositeType {
    /// `head_name()` when applicable, otherwise the full rendered string —
    /// used for loose comparisons where a generic/tuple type is compared
    /// against a plain named one declared elsewhere.
    fn head_name_or_full(&self) -> String {
        self.head_name().map(str::to_string).unwrap_or_else(|| self.to_string())
    }
}
