//! Python literal parsing for notebook parameter cells
//!
//! Parameter cells written by papermill look like:
//!
//! ```text
//! # Parameters
//! alpha = 0.6
//! model = "sklearn.ensemble.RandomForestClassifier"
//! params = {'n_estimators': 50, 'max_depth': None}
//! ```
//!
//! Supported literals: integers, floats (including `inf` and `nan`
//! spellings used by `repr`), single- and double-quoted strings, `True`,
//! `False`, `None`, lists, tuples and dicts. Tuples become JSON arrays and
//! non-string dict keys are stringified.

use serde_json::{Map, Number, Value};

use crate::{Error, Result};

struct Parser<'a> {
    chars: Vec<char>,
    pos: usize,
    source: &'a str,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            source,
        }
    }

    fn error(&self, msg: &str) -> Error {
        Error::ParseError(format!("{msg} at offset {} in {:?}", self.pos, self.source))
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    /// Skip spaces and tabs; with `newlines`, also line breaks and comments.
    fn skip_blank(&mut self, newlines: bool) {
        while let Some(c) = self.peek() {
            match c {
                ' ' | '\t' | '\r' => self.pos += 1,
                '\n' if newlines => self.pos += 1,
                '#' if newlines => {
                    while self.peek().is_some_and(|c| c != '\n') {
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }
    }

    fn skip_line(&mut self) {
        while let Some(c) = self.peek() {
            self.pos += 1;
            if c == '\n' {
                break;
            }
        }
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        if self.peek() == Some(expected) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(&format!("expected '{expected}'")))
        }
    }

    fn identifier(&mut self) -> Option<String> {
        let start = self.pos;
        if !self.peek().is_some_and(|c| c.is_alphabetic() || c == '_') {
            return None;
        }
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.pos += 1;
        }
        Some(self.chars[start..self.pos].iter().collect())
    }

    fn value(&mut self) -> Result<Value> {
        // Inside brackets, values may span lines.
        self.skip_blank(true);
        match self.peek() {
            Some('[') => self.sequence('[', ']'),
            Some('(') => self.sequence('(', ')'),
            Some('{') => self.dict(),
            Some(quote @ ('\'' | '"')) => self.string(quote).map(Value::String),
            Some(c) if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') => self.number(),
            Some(_) => self.keyword(),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn keyword(&mut self) -> Result<Value> {
        let start = self.pos;
        match self.identifier().as_deref() {
            Some("True") => Ok(Value::Bool(true)),
            Some("False") => Ok(Value::Bool(false)),
            Some("None") => Ok(Value::Null),
            Some(word @ ("inf" | "nan")) => Ok(Value::String(word.to_string())),
            _ => {
                self.pos = start;
                Err(self.error("unsupported expression"))
            }
        }
    }

    fn sequence(&mut self, open: char, close: char) -> Result<Value> {
        self.expect(open)?;
        let mut items = Vec::new();
        loop {
            self.skip_blank(true);
            if self.peek() == Some(close) {
                self.pos += 1;
                return Ok(Value::Array(items));
            }
            items.push(self.value()?);
            self.skip_blank(true);
            match self.peek() {
                Some(',') => self.pos += 1,
                Some(c) if c == close => {}
                _ => return Err(self.error(&format!("expected ',' or '{close}'"))),
            }
        }
    }

    fn dict(&mut self) -> Result<Value> {
        self.expect('{')?;
        let mut map = Map::new();
        loop {
            self.skip_blank(true);
            if self.peek() == Some('}') {
                self.pos += 1;
                return Ok(Value::Object(map));
            }
            let key = match self.value()? {
                Value::String(s) => s,
                other => other.to_string(),
            };
            self.skip_blank(true);
            self.expect(':')?;
            let value = self.value()?;
            map.insert(key, value);
            self.skip_blank(true);
            match self.peek() {
                Some(',') => self.pos += 1,
                Some('}') => {}
                _ => return Err(self.error("expected ',' or '}'")),
            }
        }
    }

    fn string(&mut self, quote: char) -> Result<String> {
        self.expect(quote)?;
        let mut out = String::new();
        loop {
            let Some(c) = self.peek() else {
                return Err(self.error("unterminated string"));
            };
            self.pos += 1;
            match c {
                c if c == quote => return Ok(out),
                '\\' => {
                    let Some(escaped) = self.peek() else {
                        return Err(self.error("unterminated string"));
                    };
                    self.pos += 1;
                    match escaped {
                        'n' => out.push('\n'),
                        't' => out.push('\t'),
                        'r' => out.push('\r'),
                        '0' => out.push('\0'),
                        '\\' | '\'' | '"' => out.push(escaped),
                        other => {
                            out.push('\\');
                            out.push(other);
                        }
                    }
                }
                '\n' => return Err(self.error("newline in string")),
                c => out.push(c),
            }
        }
    }

    fn number(&mut self) -> Result<Value> {
        let start = self.pos;
        if matches!(self.peek(), Some('-' | '+')) {
            self.pos += 1;
        }
        if self.chars[self.pos..].starts_with(&['i', 'n', 'f']) {
            self.pos += 3;
            // JSON has no infinity; keep the Python spelling.
            let text: String = self.chars[start..self.pos].iter().collect();
            return Ok(Value::String(text));
        }
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '_'))
            || (matches!(self.peek(), Some('-' | '+'))
                && matches!(
                    self.pos.checked_sub(1).and_then(|i| self.chars.get(i)).copied(),
                    Some('e' | 'E')
                ))
        {
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos]
            .iter()
            .filter(|&&c| c != '_')
            .collect();
        if let Ok(n) = text.parse::<i64>() {
            return Ok(Value::from(n));
        }
        text.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| {
                self.pos = start;
                self.error("invalid number")
            })
    }
}

/// Parse a single Python literal.
///
/// # Errors
///
/// Returns [`Error::ParseError`] if `source` is not exactly one supported
/// literal.
pub fn parse_literal(source: &str) -> Result<Value> {
    let mut parser = Parser::new(source);
    let value = parser.value()?;
    parser.skip_blank(true);
    if parser.at_end() {
        Ok(value)
    } else {
        Err(parser.error("trailing characters"))
    }
}

/// Parse `name = <literal>` assignments from a parameters cell.
///
/// Statements that are not simple literal assignments are skipped with a
/// warning, so one unusual line does not hide the others. Later
/// assignments to the same name win.
#[must_use]
pub fn parse_assignments(source: &str) -> Map<String, Value> {
    let mut parser = Parser::new(source);
    let mut params = Map::new();

    loop {
        parser.skip_blank(true);
        if parser.at_end() {
            break;
        }
        let line_start = parser.pos;
        match assignment(&mut parser) {
            Ok((name, value)) => {
                params.insert(name, value);
            }
            Err(err) => {
                tracing::warn!(error = %err, "skipping parameter statement");
                parser.pos = line_start;
                parser.skip_line();
            }
        }
    }
    params
}

fn assignment(parser: &mut Parser<'_>) -> Result<(String, Value)> {
    let name = parser
        .identifier()
        .ok_or_else(|| parser.error("expected a name"))?;
    parser.skip_blank(false);
    parser.expect('=')?;
    let value = parser.value()?;
    parser.skip_blank(false);
    match parser.peek() {
        None | Some('\n' | '#' | ';') => {
            if parser.peek() == Some(';') {
                parser.pos += 1;
            }
            Ok((name, value))
        }
        Some(_) => Err(parser.error("unexpected characters after value")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalars() {
        assert_eq!(parse_literal("42").unwrap(), json!(42));
        assert_eq!(parse_literal("-1.5e-3").unwrap(), json!(-0.0015));
        assert_eq!(parse_literal("'it\\'s'").unwrap(), json!("it's"));
        assert_eq!(parse_literal("\"x\"").unwrap(), json!("x"));
        assert_eq!(parse_literal("True").unwrap(), json!(true));
        assert_eq!(parse_literal("None").unwrap(), Value::Null);
        assert_eq!(parse_literal("1_000").unwrap(), json!(1000));
    }

    #[test]
    fn test_containers() {
        assert_eq!(
            parse_literal("{'a': [1, 2], 'b': (3,), 1: None}").unwrap(),
            json!({"a": [1, 2], "b": [3], "1": null})
        );
        assert_eq!(parse_literal("[]").unwrap(), json!([]));
    }

    #[test]
    fn test_rejects_expressions() {
        assert!(parse_literal("foo(1)").is_err());
        assert!(parse_literal("1 + 2").is_err());
        assert!(parse_literal("'open").is_err());
    }

    #[test]
    fn test_assignments() {
        let source = "# Parameters\nalpha = 0.6\nmodel = 'svc'\n\nx = compute()\ngrid = {\n    'C': [1, 10],\n}\nalpha = 0.7  # override\n";
        let params = parse_assignments(source);
        assert_eq!(params.get("alpha"), Some(&json!(0.7)));
        assert_eq!(params.get("model"), Some(&json!("svc")));
        assert_eq!(params.get("grid"), Some(&json!({"C": [1, 10]})));
        assert!(!params.contains_key("x"));
    }
}
