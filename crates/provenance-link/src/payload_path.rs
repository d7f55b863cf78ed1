//! Payload path expressions
//!
//! A payload path names the sub-portion of a link's canonical document that a
//! signature covers. Supported forms:
//!
//! - `@` selects the whole document
//! - `meta.process.name` walks object fields
//! - `signatures[0]` indexes into arrays
//! - `[version,meta]` builds a list from several expressions
//!
//! Missing fields and out-of-range indices select `null`.
//!
//! Paths arrive inside transported signatures, so expression length and
//! multiselect nesting are bounded.

use crate::error::{LinkError, Result};
use serde_json::Value;

/// Maximum accepted expression length in bytes
pub const MAX_LEN: usize = 4096;

/// Maximum nesting of multiselect lists
pub const MAX_DEPTH: usize = 128;

/// Parsed payload path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadPath {
    /// The whole document
    Current,
    /// Field and index accessors applied in order
    Path(Vec<Accessor>),
    /// A list built from each inner path
    MultiSelect(Vec<PayloadPath>),
}

/// Single step of a path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accessor {
    Field(String),
    Index(usize),
}

impl PayloadPath {
    /// Parse a payload path expression
    pub fn parse(input: &str) -> Result<Self> {
        if input.len() > MAX_LEN {
            return Err(LinkError::InvalidPayloadPath(format!(
                "expression is {} bytes, limit is {}",
                input.len(),
                MAX_LEN
            )));
        }
        let mut parser = Parser {
            input,
            chars: input.char_indices().peekable(),
            depth: 0,
        };
        let path = parser.expression()?;
        parser.skip_whitespace();
        if let Some((pos, c)) = parser.chars.next() {
            return Err(parser.error(format!("unexpected '{}' at {}", c, pos)));
        }
        Ok(path)
    }

    /// Select this path from a document
    pub fn select(&self, document: &Value) -> Value {
        match self {
            PayloadPath::Current => document.clone(),
            PayloadPath::Path(accessors) => {
                let mut current = document;
                for accessor in accessors {
                    let next = match accessor {
                        Accessor::Field(name) => current.get(name.as_str()),
                        Accessor::Index(i) => current.get(*i),
                    };
                    match next {
                        Some(value) => current = value,
                        None => return Value::Null,
                    }
                }
                current.clone()
            }
            PayloadPath::MultiSelect(paths) => {
                Value::Array(paths.iter().map(|p| p.select(document)).collect())
            }
        }
    }
}

struct Parser<'a> {
    input: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    depth: usize,
}

impl Parser<'_> {
    fn error(&self, reason: String) -> LinkError {
        LinkError::InvalidPayloadPath(format!("'{}': {}", self.input, reason))
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.chars.peek(), Some((_, c)) if c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn expression(&mut self) -> Result<PayloadPath> {
        self.skip_whitespace();
        match self.chars.peek() {
            Some((_, '@')) => {
                self.chars.next();
                Ok(PayloadPath::Current)
            }
            Some((_, '[')) => {
                self.chars.next();
                if self.depth == MAX_DEPTH {
                    return Err(self.error(format!("multiselect nested deeper than {}", MAX_DEPTH)));
                }
                self.depth += 1;
                let selected = self.multi_select();
                self.depth -= 1;
                selected
            }
            Some(_) => self.path(),
            None => Err(self.error("empty expression".into())),
        }
    }

    fn multi_select(&mut self) -> Result<PayloadPath> {
        let mut paths = Vec::new();
        loop {
            paths.push(self.expression()?);
            self.skip_whitespace();
            match self.chars.next() {
                Some((_, ',')) => continue,
                Some((_, ']')) => break,
                Some((pos, c)) => {
                    return Err(self.error(format!("expected ',' or ']' at {}, got '{}'", pos, c)))
                }
                None => return Err(self.error("unterminated multiselect list".into())),
            }
        }
        Ok(PayloadPath::MultiSelect(paths))
    }

    fn path(&mut self) -> Result<PayloadPath> {
        let mut accessors = vec![Accessor::Field(self.identifier()?)];
        loop {
            match self.chars.peek() {
                Some((_, '.')) => {
                    self.chars.next();
                    accessors.push(Accessor::Field(self.identifier()?));
                }
                Some((_, '[')) => {
                    self.chars.next();
                    accessors.push(Accessor::Index(self.index()?));
                }
                _ => break,
            }
        }
        Ok(PayloadPath::Path(accessors))
    }

    fn identifier(&mut self) -> Result<String> {
        let mut ident = String::new();
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                ident.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(self.error(format!("invalid identifier '{}'", ident)));
        }
        Ok(ident)
    }

    fn index(&mut self) -> Result<usize> {
        let mut digits = String::new();
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_ascii_digit() {
                digits.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        match self.chars.next() {
            Some((_, ']')) => {}
            _ => return Err(self.error("expected ']' after index".into())),
        }
        digits
            .parse()
            .map_err(|_| self.error(format!("invalid index '{}'", digits)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document() -> Value {
        json!({
            "version": "1.0.0",
            "meta": { "mapId": "m1", "process": { "name": "p1" }, "tags": ["a", "b"] },
            "signatures": []
        })
    }

    #[test]
    fn test_current_selects_everything() {
        let path = PayloadPath::parse("@").unwrap();
        assert_eq!(path.select(&document()), document());
    }

    #[test]
    fn test_nested_fields() {
        let path = PayloadPath::parse("meta.process.name").unwrap();
        assert_eq!(path.select(&document()), json!("p1"));
    }

    #[test]
    fn test_index() {
        let path = PayloadPath::parse("meta.tags[1]").unwrap();
        assert_eq!(path.select(&document()), json!("b"));

        let path = PayloadPath::parse("meta.tags[7]").unwrap();
        assert_eq!(path.select(&document()), Value::Null);
    }

    #[test]
    fn test_missing_field_is_null() {
        let path = PayloadPath::parse("meta.nothing.here").unwrap();
        assert_eq!(path.select(&document()), Value::Null);
    }

    #[test]
    fn test_multi_select() {
        let path = PayloadPath::parse("[version, meta.mapId]").unwrap();
        assert_eq!(path.select(&document()), json!(["1.0.0", "m1"]));
    }

    #[test]
    fn test_nested_multi_select() {
        let path = PayloadPath::parse("[version,[meta.mapId,@]]").unwrap();
        let selected = path.select(&document());
        assert_eq!(selected[1][0], json!("m1"));
        assert_eq!(selected[1][1], document());
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |depth: usize| format!("{}version{}", "[".repeat(depth), "]".repeat(depth));

        let path = PayloadPath::parse(&nested(MAX_DEPTH)).unwrap();
        let mut selected = path.select(&document());
        for _ in 0..MAX_DEPTH {
            selected = selected[0].clone();
        }
        assert_eq!(selected, json!("1.0.0"));

        assert!(matches!(
            PayloadPath::parse(&nested(MAX_DEPTH + 1)),
            Err(LinkError::InvalidPayloadPath(_))
        ));
        assert!(matches!(
            PayloadPath::parse(&"[".repeat(200_000)),
            Err(LinkError::InvalidPayloadPath(_))
        ));
    }

    #[test]
    fn test_length_limit() {
        let long = format!("meta.{}", "a".repeat(MAX_LEN));
        let err = PayloadPath::parse(&long).unwrap_err();

        assert!(matches!(err, LinkError::InvalidPayloadPath(_)));
        assert!(err.to_string().len() < 200);
    }

    #[test]
    fn test_malformed_paths() {
        for input in ["", "meta.", "[version", "[version,]", "meta..x", "tags[x]", "1abc", "a b"] {
            assert!(
                matches!(PayloadPath::parse(input), Err(LinkError::InvalidPayloadPath(_))),
                "expected '{}' to be rejected",
                input
            );
        }
    }
}
