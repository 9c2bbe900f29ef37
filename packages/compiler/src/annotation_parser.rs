//! Parses the call expression inside a `@Weaver(...)`-shaped annotation.
//!
//! Per spec §9's design note, this is a purpose-built recursive-descent
//! parser over the substring rather than a re-invocation of the external
//! structural decoder — the grammar is small and closed: a name, optional
//! digit suffix, then a parenthesized, comma-separated argument list of
//! `.enumValue`, `keyword: value` pairs, or bare positional values.

use crate::error::TokenError;
use crate::model::{ConfigValue, ConfigurationAttribute, DependencyKind};

/// One parsed argument inside `@Weaver(...)`.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    /// A lone `.enumValue`, e.g. `.registration`.
    Positional(String),
    /// `keyword: value`.
    Keyword { keyword: String, value: ArgumentValue },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArgumentValue {
    /// `.enumValue` or bare identifier, e.g. `.graph`.
    EnumOrIdent(String),
    /// A string literal's contents.
    String(String),
    /// A boolean literal.
    Bool(bool),
    /// Anything else, kept verbatim for `customBuilder`-style closures.
    Raw(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedAnnotation {
    pub prefix: String,
    /// Expected positional-parameter count, from a numeric suffix on the
    /// annotation name (`WeaverP2` => `2`); `0` when absent or `P0`.
    pub expected_params: usize,
    pub arguments: Vec<Argument>,
}

/// Default annotation prefix family, matched case-insensitively (spec
/// §4.2). Projects may rename their property wrapper via
/// `weaver.config.json`'s `annotationPrefix`, in which case callers pass
/// that value instead.
pub const DEFAULT_ANNOTATION_PREFIX: &str = "weaver";

/// Parses `@Weaver(.registration, type: T.self, scope: .graph)`-shaped text,
/// where `prefix` names the annotation family to recognize (case-
/// insensitively). Returns `Ok(None)` when the text doesn't start with the
/// recognized annotation prefix (skip silently, per spec §4.2); returns
/// `Err` only for text that does match the prefix but is otherwise
/// malformed.
pub fn parse_annotation(text: &str, prefix: &str) -> Result<Option<ParsedAnnotation>, TokenError> {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix('@') else {
        return Ok(None);
    };

    let name_end = rest.find('(').unwrap_or(rest.len());
    let name = &rest[..name_end];

    let Some(expected_params) = match_prefix_and_suffix(name, prefix) else {
        return Ok(None);
    };

    let Some(open) = rest.find('(') else {
        return Err(TokenError::InvalidAnnotation(text.to_string()));
    };
    let Some(close) = find_matching_close(rest, open) else {
        return Err(TokenError::InvalidAnnotation(text.to_string()));
    };
    let args_text = &rest[open + 1..close];

    let arguments = split_top_level(args_text)
        .into_iter()
        .map(|raw| parse_argument(raw.trim()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| TokenError::InvalidAnnotation(text.to_string()))?;

    Ok(Some(ParsedAnnotation { prefix: prefix.to_string(), expected_params, arguments }))
}

/// Matches `Weaver`/`WeaverPN` case-insensitively, returning the expected
/// parameter count (`P0` and no suffix are equivalent, per spec §9 Open
/// Questions).
fn match_prefix_and_suffix(name: &str, prefix: &str) -> Option<usize> {
    let lower = name.to_ascii_lowercase();
    let stripped = lower.strip_prefix(&prefix.to_ascii_lowercase())?;
    if stripped.is_empty() {
        return Some(0);
    }
    let digits = stripped.strip_prefix('p')?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse::<usize>().ok()
}

fn find_matching_close(text: &str, open_index: usize) -> Option<usize> {
    let mut depth = 0i32;
    for (i, c) in text.char_indices().skip(open_index) {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Splits a comma-separated argument list at top level only, respecting
/// balanced `(...)` so that nested closures/tuples aren't split internally.
fn split_top_level(text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();
    for c in text.chars() {
        match c {
            '(' | '[' | '{' => {
                depth += 1;
                current.push(c);
            }
            ')' | ']' | '}' => {
                depth -= 1;
                current.push(c);
            }
            ',' if depth == 0 => {
                parts.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    parts.push(current);
    parts
}

fn parse_argument(raw: &str) -> Result<Argument, ()> {
    if raw.is_empty() {
        return Err(());
    }
    if let Some(colon) = find_top_level_colon(raw) {
        let keyword = raw[..colon].trim().to_string();
        let value_text = raw[colon + 1..].trim();
        return Ok(Argument::Keyword { keyword, value: parse_value(value_text) });
    }
    if raw.starts_with('.') {
        return Ok(Argument::Positional(raw.trim_start_matches('.').to_string()));
    }
    Err(())
}

fn find_top_level_colon(text: &str) -> Option<usize> {
    let mut depth = 0i32;
    for (i, c) in text.char_indices() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            ':' if depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

fn parse_value(text: &str) -> ArgumentValue {
    if text == "true" {
        return ArgumentValue::Bool(true);
    }
    if text == "false" {
        return ArgumentValue::Bool(false);
    }
    if (text.starts_with('"') && text.ends_with('"') && text.len() >= 2)
        || (text.starts_with('\'') && text.ends_with('\'') && text.len() >= 2)
    {
        return ArgumentValue::String(text[1..text.len() - 1].to_string());
    }
    if let Some(stripped) = text.strip_prefix('.') {
        if !stripped.contains(['(', ' ']) {
            return ArgumentValue::EnumOrIdent(stripped.to_string());
        }
    }
    ArgumentValue::Raw(text.to_string())
}

/// Strips a trailing `.self` off a type reference, per spec §4.2
/// ("extract `type:` (stripping `.self`)").
pub fn strip_dot_self(text: &str) -> &str {
    text.strip_suffix(".self").unwrap_or(text).trim()
}

/// Determines `Dependency::Kind` from a parsed annotation's arguments, via
/// either a keyword argument (`kind: .reference`, not used by Weaver itself
/// but supported for forward compatibility) or the first lone positional
/// enum value (`.registration` / `.reference` / `.parameter`).
pub fn dependency_kind(parsed: &ParsedAnnotation) -> Option<DependencyKind> {
    for arg in &parsed.arguments {
        if let Argument::Positional(value) = arg {
            return match value.as_str() {
                "registration" => Some(DependencyKind::Registration),
                "reference" => Some(DependencyKind::Reference),
                "parameter" => Some(DependencyKind::Parameter),
                _ => None,
            };
        }
    }
    None
}

/// Extracts the `type:` argument, with `.self` stripped.
pub fn extract_type(parsed: &ParsedAnnotation) -> Option<String> {
    parsed.arguments.iter().find_map(|arg| match arg {
        Argument::Keyword { keyword, value } if keyword == "type" => match value {
            ArgumentValue::Raw(raw) => Some(strip_dot_self(raw).to_string()),
            ArgumentValue::EnumOrIdent(v) => Some(v.clone()),
            _ => None,
        },
        _ => None,
    })
}

/// Every remaining keyword argument (other than `type`) as a
/// `ConfigurationAttribute`, validated against the closed set of known
/// configuration keys.
pub fn configuration_attributes(
    parsed: &ParsedAnnotation,
) -> Result<Vec<ConfigurationAttribute>, TokenError> {
    let mut attributes = Vec::new();
    for arg in &parsed.arguments {
        if let Argument::Keyword { keyword, value } = arg {
            if keyword == "type" {
                continue;
            }
            if !crate::model::is_known_configuration_key(keyword) {
                return Err(TokenError::InvalidAnnotation(keyword.clone()));
            }
            let value = match value {
                ArgumentValue::Bool(b) => ConfigValue::Bool(*b),
                ArgumentValue::String(s) => ConfigValue::String(s.clone()),
                ArgumentValue::EnumOrIdent(s) => ConfigValue::Enum(s.clone()),
                ArgumentValue::Raw(s) => ConfigValue::String(s.clone()),
            };
            attributes.push(ConfigurationAttribute { name: keyword.clone(), value });
        }
    }
    Ok(attributes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_registration_annotation() {
        let parsed = parse_annotation(
            "@Weaver(.registration, type: Logger.self, scope: .graph, customBuilder: make)",
            DEFAULT_ANNOTATION_PREFIX,
        )
        .unwrap()
        .unwrap();
        assert_eq!(parsed.expected_params, 0);
        assert_eq!(dependency_kind(&parsed), Some(DependencyKind::Registration));
        assert_eq!(extract_type(&parsed).as_deref(), Some("Logger"));
        let attrs = configuration_attributes(&parsed).unwrap();
        assert!(attrs.iter().any(|a| a.name == "scope"));
        assert!(attrs.iter().any(|a| a.name == "customBuilder"));
    }

    #[test]
    fn parses_parameterized_annotation_suffix() {
        let parsed = parse_annotation("@WeaverP1(.parameter, type: Int.self)", DEFAULT_ANNOTATION_PREFIX)
            .unwrap()
            .unwrap();
        assert_eq!(parsed.expected_params, 1);
        assert_eq!(dependency_kind(&parsed), Some(DependencyKind::Parameter));
    }

    #[test]
    fn p0_and_bare_suffix_are_equivalent() {
        let a = parse_annotation("@WeaverP0(.reference)", DEFAULT_ANNOTATION_PREFIX).unwrap().unwrap();
        let b = parse_annotation("@Weaver(.reference)", DEFAULT_ANNOTATION_PREFIX).unwrap().unwrap();
        assert_eq!(a.expected_params, b.expected_params);
    }

    #[test]
    fn non_weaver_annotations_are_skipped_silently() {
        assert_eq!(parse_annotation("@objc", DEFAULT_ANNOTATION_PREFIX).unwrap(), None);
        assert_eq!(parse_annotation("@available(iOS 13, *)", DEFAULT_ANNOTATION_PREFIX).unwrap(), None);
    }

    #[test]
    fn unknown_configuration_key_is_rejected() {
        let parsed = parse_annotation("@Weaver(.registration, type: T.self, bogus: true)", DEFAULT_ANNOTATION_PREFIX)
            .unwrap()
            .unwrap();
        assert!(configuration_attributes(&parsed).is_err());
    }

    #[test]
    fn unbalanced_parens_is_an_error() {
        assert!(parse_annotation("@Weaver(.registration, type: T.self", DEFAULT_ANNOTATION_PREFIX).is_err());
    }

    #[test]
    fn a_renamed_annotation_prefix_is_recognized_and_the_default_name_is_not() {
        let parsed = parse_annotation("@Inject(.registration, type: Logger.self)", "Inject").unwrap().unwrap();
        assert_eq!(dependency_kind(&parsed), Some(DependencyKind::Registration));
        assert_eq!(parse_annotation("@Weaver(.registration, type: Logger.self)", "Inject").unwrap(), None);
    }
}
