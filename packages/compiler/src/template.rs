//! The minimal templating layer the Generator renders through (spec §4.5).
//!
//! Templates are flat text with `{{name}}` placeholders and a single
//! looping form, `{{#each xs}}…{{/each}}`. Rendering is pure: the same
//! template and context produce bit-identical output every time, and
//! `{{#each}}` iterates in the context array's own order (the AST's
//! document order, by construction of the caller).

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::GeneratorError;

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Text(String),
    Var(String),
    Each { binding: String, body: Vec<Node> },
}

/// A parsed template, ready to render against any number of contexts.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    nodes: Vec<Node>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Template, GeneratorError> {
        let mut scanner = Scanner { text: source, pos: 0 };
        let nodes = scanner.parse_nodes(None)?;
        Ok(Template { nodes })
    }

    pub fn render(&self, context: &Value) -> String {
        let mut out = String::new();
        render_nodes(&self.nodes, context, &mut out);
        out
    }
}

struct Scanner<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn parse_nodes(&mut self, closing_binding: Option<&str>) -> Result<Vec<Node>, GeneratorError> {
        let mut nodes = Vec::new();
        loop {
            let rest = &self.text[self.pos..];
            let Some(tag_start) = rest.find("{{") else {
                if !rest.is_empty() {
                    nodes.push(Node::Text(rest.to_string()));
                }
                self.pos = self.text.len();
                if closing_binding.is_some() {
                    return Err(GeneratorError::InvalidTemplatePath("<unterminated #each>".to_string()));
                }
                return Ok(nodes);
            };
            if tag_start > 0 {
                nodes.push(Node::Text(rest[..tag_start].to_string()));
            }
            let after_open = &rest[tag_start + 2..];
            let Some(tag_end) = after_open.find("}}") else {
                return Err(GeneratorError::InvalidTemplatePath("<unterminated {{ }}>".to_string()));
            };
            let tag = after_open[..tag_end].trim();
            self.pos += tag_start + 2 + tag_end + 2;

            if let Some(binding) = tag.strip_prefix("#each ") {
                let binding = binding.trim().to_string();
                let body = self.parse_nodes(Some(&binding))?;
                nodes.push(Node::Each { binding, body });
            } else if tag.starts_with("/each") {
                return match closing_binding {
                    Some(_) => Ok(nodes),
                    None => Err(GeneratorError::InvalidTemplatePath("<unmatched /each>".to_string())),
                };
            } else {
                nodes.push(Node::Var(tag.to_string()));
            }
        }
    }
}

fn render_nodes(nodes: &[Node], context: &Value, out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Var(name) => {
                if let Some(value) = lookup(context, name) {
                    out.push_str(&value_to_text(value));
                }
            }
            Node::Each { binding, body } => {
                if let Some(Value::Array(items)) = lookup(context, binding) {
                    for item in items {
                        render_nodes(body, item, out);
                    }
                }
            }
        }
    }
}

fn lookup<'a>(context: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = context;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// A set of named templates addressed by path, as delivered to the
/// Generator by its caller (spec §4.5 "a template bundle addressed by
/// path"); out of core scope is how the driver populates one.
#[derive(Debug, Clone, Default)]
pub struct TemplateBundle {
    templates: BTreeMap<String, String>,
}

impl TemplateBundle {
    pub fn new() -> Self {
        TemplateBundle::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, source: impl Into<String>) {
        self.templates.insert(path.into(), source.into());
    }

    pub fn get(&self, path: &str) -> Result<Template, GeneratorError> {
        let source = self
            .templates
            .get(path)
            .ok_or_else(|| GeneratorError::InvalidTemplatePath(path.to_string()))?;
        Template::parse(source)
    }
}
