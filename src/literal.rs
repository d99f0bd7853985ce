//! Constant literal values and their source rendering.

use std::fmt;

use serde::Serialize;

const INDENT: &str = "    ";

/// A constant value as written in source
///
/// Dictionaries keep their pairs in source order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Literal {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Literal>),
    Tuple(Vec<Literal>),
    Set(Vec<Literal>),
    Dict(Vec<(Literal, Literal)>),
}

impl Literal {
    /// Shorthand for a string literal
    pub fn str(value: impl Into<String>) -> Self {
        Literal::Str(value.into())
    }

    /// Source text for this value
    ///
    /// Scalars render inline. Non-empty containers put one element per line,
    /// indented four spaces, each followed by a comma:
    ///
    /// ```
    /// use semantic_rewrite::Literal;
    /// assert_eq!(Literal::List(vec![Literal::Int(42)]).render(), "[\n    42,\n]");
    /// ```
    pub fn render(&self) -> String {
        match self {
            Literal::None => "None".to_string(),
            Literal::Bool(true) => "True".to_string(),
            Literal::Bool(false) => "False".to_string(),
            Literal::Int(value) => value.to_string(),
            Literal::Float(value) => render_float(*value),
            Literal::Str(value) => quote(value),
            Literal::List(items) => render_items("[", "]", "[]", items.iter().map(Literal::render)),
            Literal::Tuple(items) => render_items("(", ")", "()", items.iter().map(Literal::render)),
            Literal::Set(items) => render_items("{", "}", "set()", items.iter().map(Literal::render)),
            Literal::Dict(pairs) => render_items(
                "{",
                "}",
                "{}",
                pairs
                    .iter()
                    .map(|(key, value)| format!("{}: {}", key.render(), value.render())),
            ),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

fn render_items(
    open: &str,
    close: &str,
    empty: &str,
    items: impl Iterator<Item = String>,
) -> String {
    let mut out = String::from(open);
    out.push('\n');
    let mut any = false;

    for item in items {
        any = true;
        for (index, line) in item.split('\n').enumerate() {
            if index > 0 {
                out.push('\n');
            }
            out.push_str(INDENT);
            out.push_str(line);
        }
        out.push_str(",\n");
    }

    if !any {
        return empty.to_string();
    }
    out.push_str(close);
    out
}

fn render_float(value: f64) -> String {
    if value.is_nan() {
        "float('nan')".to_string()
    } else if value.is_infinite() {
        if value > 0.0 {
            "float('inf')".to_string()
        } else {
            "float('-inf')".to_string()
        }
    } else if value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else if value.abs() >= 1e16 || value.abs() < 1e-4 {
        format!("{:e}", value)
    } else {
        value.to_string()
    }
}

/// Quote a string the way a repr would: single quotes unless the text
/// contains a single quote and no double quote
fn quote(value: &str) -> String {
    let delimiter = if value.contains('\'') && !value.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut out = String::with_capacity(value.len() + 2);
    out.push(delimiter);
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == delimiter => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push(delimiter);
    out
}
