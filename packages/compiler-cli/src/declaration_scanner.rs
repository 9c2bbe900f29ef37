//! Minimal regex/line-based stand-in for the structural source decoder the
//! Lexer treats as an opaque external collaborator (see
//! `weaver_compiler::declaration`'s module doc). A production deployment
//! would back this with a real SourceKit-like service; this scanner covers
//! the common declaration shapes (annotated `var` properties nested in
//! `class`/`struct`/`enum`/`extension` bodies, one header per line, the
//! opening brace on the header's own line) well enough to drive compilation
//! end to end.

use once_cell::sync::Lazy;
use regex::Regex;

use weaver_compiler::declaration::{AttributeRecord, DeclarationKind, DeclarationRecord};

static TYPE_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:(public|open|internal|fileprivate|private)\s+)?(?:final\s+)?(class|struct|enum|extension)\s+([A-Za-z_][A-Za-z0-9_]*)",
    )
    .unwrap()
});

static VAR_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:(public|open|internal|fileprivate|private)\s+)?(?:lazy\s+)?var\s+([A-Za-z_][A-Za-z0-9_]*)\s*:\s*([A-Za-z_][A-Za-z0-9_<>\[\],\.\? ]*)",
    )
    .unwrap()
});

struct OpenFrame {
    kind: DeclarationKind,
    name: String,
    offset: usize,
    accessibility: Option<String>,
    attributes: Vec<AttributeRecord>,
    substructure: Vec<DeclarationRecord>,
    /// Brace depth immediately after this frame's own opening brace.
    depth_after_open: i32,
}

pub struct DeclarationScanner;

impl DeclarationScanner {
    /// Scans `source` into a forest of top-level declaration records.
    /// Headers are matched line by line; nesting is recovered by tracking
    /// brace depth across the whole file.
    pub fn scan(source: &str) -> Vec<DeclarationRecord> {
        let mut stack: Vec<OpenFrame> = Vec::new();
        let mut roots: Vec<DeclarationRecord> = Vec::new();
        let mut pending_attrs: Vec<String> = Vec::new();
        let mut pending_offset: Option<usize> = None;
        let mut depth: i32 = 0;
        let mut offset = 0usize;

        for raw_line in source.split_inclusive('\n') {
            let line = raw_line.strip_suffix('\n').unwrap_or(raw_line);
            let trimmed = line.trim_start();
            let indent = line.len() - trimmed.len();
            let line_offset = offset + indent;
            let content = trimmed.trim_end();

            if content.starts_with('@') && content.contains('(') && content.ends_with(')') {
                pending_attrs.push(content.to_string());
                pending_offset.get_or_insert(line_offset);
            } else if let Some(caps) = TYPE_HEADER.captures(content) {
                let kind = match &caps[2] {
                    "class" => DeclarationKind::Class,
                    "struct" => DeclarationKind::Struct,
                    "enum" => DeclarationKind::Enum,
                    _ => DeclarationKind::Extension,
                };
                let attributes = drain_attributes(&mut pending_attrs);
                pending_offset = None;

                if let Some(brace_col) = content.find('{') {
                    let frame_depth = depth + 1;
                    stack.push(OpenFrame {
                        kind,
                        name: caps[3].to_string(),
                        offset: line_offset,
                        accessibility: caps.get(1).map(|m| m.as_str().to_string()),
                        attributes,
                        substructure: Vec::new(),
                        depth_after_open: frame_depth,
                    });
                    depth = frame_depth;
                    for (i, c) in content[brace_col + 1..].char_indices() {
                        match c {
                            '{' => depth += 1,
                            '}' => {
                                depth -= 1;
                                let end = line_offset + brace_col + 1 + i;
                                close_frames_at(&mut stack, &mut roots, depth, end);
                            }
                            _ => {}
                        }
                    }
                }
                // A header with no opening brace on its own line is skipped:
                // this scanner doesn't guess where an unseen body ends.
            } else if let Some(caps) = VAR_HEADER.captures(content) {
                let attrs = drain_attributes(&mut pending_attrs);
                let var_offset = pending_offset.take().unwrap_or(line_offset);
                let record = DeclarationRecord {
                    kind: DeclarationKind::VarInstance,
                    name: caps[2].to_string(),
                    typename: Some(caps[3].trim().to_string()),
                    offset: var_offset,
                    length: (line_offset + content.len()).saturating_sub(var_offset).max(1),
                    accessibility: caps.get(1).map(|m| m.as_str().to_string()),
                    attributes: attrs,
                    substructure: Vec::new(),
                    body_offset: None,
                };
                match stack.last_mut() {
                    Some(frame) => frame.substructure.push(record),
                    None => roots.push(record),
                }
            } else {
                if !content.is_empty() {
                    pending_attrs.clear();
                    pending_offset = None;
                }
                for (i, c) in content.char_indices() {
                    match c {
                        '{' => depth += 1,
                        '}' => {
                            depth -= 1;
                            close_frames_at(&mut stack, &mut roots, depth, line_offset + i);
                        }
                        _ => {}
                    }
                }
            }

            offset += raw_line.len();
        }

        roots
    }
}

fn drain_attributes(pending: &mut Vec<String>) -> Vec<AttributeRecord> {
    pending
        .drain(..)
        .map(|text| AttributeRecord { name: "source.decl.attribute.custom".to_string(), text: Some(text) })
        .collect()
}

/// Closes every open frame whose body ends exactly at `depth` (normally just
/// the innermost one — a single `}` cannot legally close more than one
/// well-nested frame, but the loop tolerates `"}}"`-on-one-line style too).
fn close_frames_at(stack: &mut Vec<OpenFrame>, roots: &mut Vec<DeclarationRecord>, depth: i32, end_offset: usize) {
    while let Some(top) = stack.last() {
        if top.depth_after_open - 1 != depth {
            break;
        }
        let frame = stack.pop().expect("stack.last() just returned Some");
        let record = DeclarationRecord {
            kind: frame.kind,
            name: frame.name,
            typename: None,
            offset: frame.offset,
            length: end_offset.saturating_sub(frame.offset) + 1,
            accessibility: frame.accessibility,
            attributes: frame.attributes,
            substructure: frame.substructure,
            body_offset: Some(frame.offset),
        };
        match stack.last_mut() {
            Some(parent) => parent.substructure.push(record),
            None => roots.push(record),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_a_class_with_a_registration_and_a_reference() {
        let source = "class Widget {\n  @Weaver(.registration, type: Service.self, scope: .graph) var service: Service\n  @Weaver(.reference) var logger: Logger\n}\n";
        let decls = DeclarationScanner::scan(source);

        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].kind, DeclarationKind::Class);
        assert_eq!(decls[0].name, "Widget");
        assert!(decls[0].has_body());
        assert_eq!(decls[0].substructure.len(), 2);
        assert_eq!(decls[0].substructure[0].name, "service");
        assert_eq!(decls[0].substructure[1].name, "logger");
    }

    #[test]
    fn nested_types_are_recovered_via_brace_depth() {
        let source = "class Outer {\n  class Inner {\n    @Weaver(.reference) var logger: Logger\n  }\n}\n";
        let decls = DeclarationScanner::scan(source);

        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].name, "Outer");
        assert_eq!(decls[0].substructure.len(), 1);
        assert_eq!(decls[0].substructure[0].name, "Inner");
        assert_eq!(decls[0].substructure[0].substructure.len(), 1);
        assert_eq!(decls[0].substructure[0].substructure[0].name, "logger");
    }

    #[test]
    fn access_modifiers_are_captured_on_types_and_properties() {
        let source = "public class Service {\n  public var repo: Repo\n}\n";
        let decls = DeclarationScanner::scan(source);
        assert_eq!(decls[0].accessibility.as_deref(), Some("public"));
        assert_eq!(decls[0].substructure[0].accessibility.as_deref(), Some("public"));
    }
}
