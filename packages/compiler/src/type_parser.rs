//! Parses `CompositeType` expressions from raw text (spec §4.1).
//!
//! This is a small hand-rolled recursive-descent parser over a trimmed
//! string, not a full expression lexer — the grammar is closed and tiny
//! (tuples, closures, optionals, named types with balanced generics), so a
//! single-pass char scanner is enough. Shaped after the teacher's
//! expression-parser scanner (`advance`/`peek` over a byte index).

use crate::model::CompositeType;

pub fn parse_type(text: &str) -> Option<CompositeType> {
    let trimmed = text.trim();
    let mut scanner = Scanner::new(trimmed);
    let parsed = scanner.parse_type()?;
    scanner.skip_whitespace();
    if scanner.at_end() {
        Some(parsed)
    } else {
        None
    }
}

struct Scanner<'a> {
    chars: Vec<char>,
    index: usize,
    _source: &'a str,
}

impl<'a> Scanner<'a> {
    fn new(source: &'a str) -> Self {
        Scanner { chars: source.chars().collect(), index: 0, _source: source }
    }

    fn at_end(&self) -> bool {
        self.index >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.index).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.index += 1;
        }
        c
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.advance();
        }
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_whitespace();
        if self.peek() == Some(c) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Entry point: try tuple, then closure, then optional-sugar, then named.
    fn parse_type(&mut self) -> Option<CompositeType> {
        self.skip_whitespace();

        if self.peek() == Some('(') {
            let checkpoint = self.index;
            if let Some(components) = self.try_parse_parenthesized_list() {
                self.skip_whitespace();
                if self.eat_arrow() {
                    let return_type = self.parse_type()?;
                    return Some(CompositeType::Closure {
                        params: components,
                        return_type: Box::new(return_type),
                    });
                }
                if components.len() == 1 {
                    // A single parenthesized, non-arrow expression is just
                    // that inner type — not a one-tuple.
                    return self.maybe_optional(components.into_iter().next().unwrap());
                }
                return self.maybe_optional(CompositeType::Tuple(components));
            }
            self.index = checkpoint;
        }

        let named = self.parse_named()?;
        self.maybe_optional(named)
    }

    fn maybe_optional(&mut self, inner: CompositeType) -> Option<CompositeType> {
        self.skip_whitespace();
        if self.peek() == Some('?') {
            self.advance();
            return Some(CompositeType::Optional(Box::new(inner)));
        }
        Some(inner)
    }

    fn eat_arrow(&mut self) -> bool {
        self.skip_whitespace();
        let checkpoint = self.index;
        if self.peek() == Some('-') {
            self.advance();
            if self.peek() == Some('>') {
                self.advance();
                return true;
            }
        }
        self.index = checkpoint;
        false
    }

    /// Parses `( T, U, … )`, respecting nested `<…>`/`(…)` balance. Returns
    /// `None` (leaving `self.index` unspecified) if the parens aren't
    /// balanced or don't close the list — caller restores the checkpoint.
    fn try_parse_parenthesized_list(&mut self) -> Option<Vec<CompositeType>> {
        if !self.eat('(') {
            return None;
        }
        let mut components = Vec::new();
        self.skip_whitespace();
        if self.eat(')') {
            return Some(components);
        }
        loop {
            let component = self.parse_type()?;
            components.push(component);
            self.skip_whitespace();
            if self.eat(',') {
                continue;
            }
            if self.eat(')') {
                break;
            }
            return None;
        }
        Some(components)
    }

    /// `Name<Generics?>`. Generic lists are comma-separated at the top
    /// level; nested `<…>`/`(…)` must balance (enforced by recursing into
    /// `parse_type`, which itself balances parens).
    fn parse_named(&mut self) -> Option<CompositeType> {
        self.skip_whitespace();
        let start = self.index;
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_' || c == '.') {
            self.advance();
        }
        if self.index == start {
            return None;
        }
        let name: String = self.chars[start..self.index].iter().collect();

        let mut generics = Vec::new();
        if self.eat('<') {
            self.skip_whitespace();
            if !self.eat('>') {
                loop {
                    generics.push(self.parse_type()?);
                    self.skip_whitespace();
                    if self.eat(',') {
                        continue;
                    }
                    if self.eat('>') {
                        break;
                    }
                    return None;
                }
            }
        }

        if name == "Optional" && generics.len() == 1 {
            return Some(CompositeType::Optional(Box::new(generics.into_iter().next().unwrap())));
        }

        Some(CompositeType::Named { name, generics })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_named_type() {
        assert_eq!(parse_type("Logger"), Some(CompositeType::named("Logger")));
    }

    #[test]
    fn parses_generic_type() {
        let parsed = parse_type("Array<Int>").unwrap();
        assert_eq!(parsed.to_string(), "Array<Int>");
    }

    #[test]
    fn parses_optional_sugar_and_keyword_form_to_same_ast() {
        let sugar = parse_type("Logger?").unwrap();
        let keyword = parse_type("Optional<Logger>").unwrap();
        assert_eq!(sugar, keyword);
    }

    #[test]
    fn parses_tuple() {
        let parsed = parse_type("(Int, String)").unwrap();
        assert_eq!(parsed.to_string(), "(Int, String)");
    }

    #[test]
    fn parses_closure() {
        let parsed = parse_type("(Int, String) -> Optional<Result<A, B>>").unwrap();
        assert_eq!(parsed.to_string(), "(Int, String) -> Optional<Result<A, B>>");
    }

    #[test]
    fn parse_is_whitespace_insensitive() {
        let a = parse_type("  ( Int ,String )  ->Bool").unwrap();
        let b = parse_type("(Int,String)->Bool").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_unbalanced_generics() {
        assert!(parse_type("Array<Int").is_none());
    }
}
