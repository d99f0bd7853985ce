//! Python syntax-tree provider backed by tree-sitter.
//!
//! Only the statement structure the entity tree needs is kept: classes,
//! functions, assignments, imports and expression statements, each reduced to
//! line-granular positions plus rendered text.

use tree_sitter::{Node, Parser};

use crate::error::{Error, Result};
use crate::language::Language;
use crate::literal::Literal;
use crate::syntax::{SyntaxKind, SyntaxNode, SyntaxProvider};

/// [`SyntaxProvider`] for Python source
#[derive(Debug, Default, Clone, Copy)]
pub struct PythonProvider;

impl PythonProvider {
    pub fn new() -> Self {
        Self
    }

    fn parser(&self) -> Result<Parser> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .map_err(|e| Error::Language(e.to_string()))?;
        Ok(parser)
    }
}

impl SyntaxProvider for PythonProvider {
    fn language(&self) -> Language {
        Language::Python
    }

    fn parse_source(&self, source: &str, source_name: &str) -> Result<SyntaxNode> {
        let tree = self
            .parser()?
            .parse(source, None)
            .ok_or_else(|| Error::Parse {
                source_name: source_name.to_string(),
                reason: "parser produced no tree".to_string(),
            })?;

        let root = tree.root_node();
        if root.has_error() {
            tracing::warn!(source = source_name, "syntax errors found, using partial tree");
        }

        let mut module = positioned(SyntaxKind::Module, root, source);
        module.from_line = 1;
        module.col_offset = 0;
        module.children = statements(root, source);
        Ok(module)
    }

    fn parse_literal(&self, text: &str) -> Option<Literal> {
        let tree = self.parser().ok()?.parse(text, None)?;
        let root = tree.root_node();
        if root.has_error() {
            return None;
        }

        let statements = named_children(root);
        let [statement] = statements.as_slice() else {
            return None;
        };
        if statement.kind() != "expression_statement" {
            return None;
        }
        let expressions = named_children(*statement);
        let [expression] = expressions.as_slice() else {
            return None;
        };
        literal(*expression, text)
    }
}

fn text<'a>(node: Node, source: &'a str) -> &'a str {
    source.get(node.byte_range()).unwrap_or("")
}

/// Named children with comments removed
fn named_children(node: Node) -> Vec<Node> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect()
}

fn positioned(kind: SyntaxKind, node: Node, source: &str) -> SyntaxNode {
    let start = node.start_position();
    let end = node.end_position();
    // A node ending at column 0 ends on the previous line's terminator
    let last_row = if end.column == 0 && end.row > start.row {
        end.row - 1
    } else {
        end.row
    };

    let mut snapshot = SyntaxNode::new(kind, start.row + 1, last_row + 1, start.column);
    snapshot.rendered = text(node, source).trim_end().to_string();

    let rendered_end = node.start_byte() + snapshot.rendered.len();
    let line_start = source
        .get(..rendered_end)
        .and_then(|head| head.rfind('\n'))
        .map_or(0, |newline| newline + 1);
    snapshot.end_column = rendered_end.saturating_sub(line_start);
    snapshot
}

fn statements(block: Node, source: &str) -> Vec<SyntaxNode> {
    named_children(block)
        .into_iter()
        .map(|child| statement(child, source))
        .collect()
}

fn statement(node: Node, source: &str) -> SyntaxNode {
    match node.kind() {
        "class_definition" => definition(SyntaxKind::Class, node, source),
        "function_definition" => definition(SyntaxKind::Function, node, source),
        "decorated_definition" => decorated(node, source),
        "expression_statement" => expression_statement(node, source),
        "import_statement" | "import_from_statement" | "future_import_statement" => {
            import(node, source)
        }
        _ => positioned(SyntaxKind::Other, node, source),
    }
}

fn definition(kind: SyntaxKind, node: Node, source: &str) -> SyntaxNode {
    let mut snapshot = positioned(kind, node, source);
    snapshot.name = node
        .child_by_field_name("name")
        .map(|name| text(name, source).to_string());
    // The header ends at its own colon; colons nested in annotations are
    // not direct children
    let mut cursor = node.walk();
    snapshot.body_line = node
        .children(&mut cursor)
        .find(|child| child.kind() == ":")
        .map(|colon| colon.start_position().row + 2);
    if let Some(body) = node.child_by_field_name("body") {
        snapshot.children = statements(body, source);
    }
    snapshot
}

/// A decorated class or function starts at its first decorator
fn decorated(node: Node, source: &str) -> SyntaxNode {
    let Some(inner) = node.child_by_field_name("definition") else {
        return positioned(SyntaxKind::Other, node, source);
    };
    let kind = match inner.kind() {
        "class_definition" => SyntaxKind::Class,
        "function_definition" => SyntaxKind::Function,
        _ => SyntaxKind::Other,
    };

    let mut snapshot = definition(kind, inner, source);
    let outer = positioned(kind, node, source);
    snapshot.from_line = outer.from_line;
    snapshot.col_offset = outer.col_offset;
    snapshot.rendered = outer.rendered;
    snapshot
}

fn expression_statement(node: Node, source: &str) -> SyntaxNode {
    let parts = named_children(node);
    if let [part] = parts.as_slice() {
        if part.kind() == "assignment" && part.child_by_field_name("right").is_some() {
            return assignment(node, *part, source);
        }
        if part.kind() == "assignment" {
            // Bare annotation (`x: int`) binds nothing
            return positioned(SyntaxKind::Other, node, source);
        }
    }

    let mut snapshot = positioned(SyntaxKind::Expression, node, source);
    snapshot.name = leading_identifier(&snapshot.rendered);
    snapshot
}

/// `a = b = value` yields targets `[a, b]` and the final value
fn assignment(statement: Node, assign: Node, source: &str) -> SyntaxNode {
    let mut snapshot = positioned(SyntaxKind::Assign, statement, source);
    let mut current = assign;

    loop {
        if let Some(left) = current.child_by_field_name("left") {
            snapshot.targets.push(expression(left, source));
        }
        match current.child_by_field_name("right") {
            Some(right) if right.kind() == "assignment" => current = right,
            Some(right) => {
                snapshot.value = Some(Box::new(expression(right, source)));
                break;
            }
            None => break,
        }
    }
    snapshot
}

fn expression(node: Node, source: &str) -> SyntaxNode {
    let mut snapshot = positioned(SyntaxKind::Expression, node, source);
    if node.kind() == "identifier" {
        snapshot.name = Some(snapshot.rendered.clone());
    }
    snapshot
}

fn import(node: Node, source: &str) -> SyntaxNode {
    let mut snapshot = positioned(SyntaxKind::Import, node, source);
    let mut cursor = node.walk();

    for name in node.children_by_field_name("name", &mut cursor) {
        let bound = match name.kind() {
            "aliased_import" => name
                .child_by_field_name("name")
                .map(|inner| text(inner, source))
                .unwrap_or_else(|| text(name, source)),
            _ => text(name, source),
        };
        snapshot.import_names.push(bound.to_string());
    }

    if snapshot.import_names.is_empty()
        && named_children(node)
            .iter()
            .any(|child| child.kind() == "wildcard_import")
    {
        snapshot.import_names.push("*".to_string());
    }
    snapshot
}

fn leading_identifier(rendered: &str) -> Option<String> {
    let ident: String = rendered
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    match ident.chars().next() {
        Some(first) if !first.is_ascii_digit() => Some(ident),
        _ => None,
    }
}

fn literal(node: Node, source: &str) -> Option<Literal> {
    match node.kind() {
        "integer" => parse_int(text(node, source)).map(Literal::Int),
        "float" => text(node, source)
            .replace('_', "")
            .parse::<f64>()
            .ok()
            .map(Literal::Float),
        "true" => Some(Literal::Bool(true)),
        "false" => Some(Literal::Bool(false)),
        "none" => Some(Literal::None),
        "string" => parse_string(text(node, source)).map(Literal::Str),
        "concatenated_string" => {
            let mut joined = String::new();
            for part in named_children(node) {
                joined.push_str(&parse_string(text(part, source))?);
            }
            Some(Literal::Str(joined))
        }
        "list" => elements(node, source).map(Literal::List),
        "tuple" => elements(node, source).map(Literal::Tuple),
        "set" => elements(node, source).map(Literal::Set),
        "dictionary" => {
            let mut pairs = Vec::new();
            for pair in named_children(node) {
                if pair.kind() != "pair" {
                    return None;
                }
                let key = literal(pair.child_by_field_name("key")?, source)?;
                let value = literal(pair.child_by_field_name("value")?, source)?;
                pairs.push((key, value));
            }
            Some(Literal::Dict(pairs))
        }
        "parenthesized_expression" => match named_children(node).as_slice() {
            [inner] => literal(*inner, source),
            _ => None,
        },
        "unary_operator" => {
            let operator = text(node.child_by_field_name("operator")?, source);
            match (operator, literal(node.child_by_field_name("argument")?, source)?) {
                ("-", Literal::Int(value)) => value.checked_neg().map(Literal::Int),
                ("-", Literal::Float(value)) => Some(Literal::Float(-value)),
                ("+", value @ (Literal::Int(_) | Literal::Float(_))) => Some(value),
                _ => None,
            }
        }
        _ => None,
    }
}

fn elements(node: Node, source: &str) -> Option<Vec<Literal>> {
    named_children(node)
        .into_iter()
        .map(|child| literal(child, source))
        .collect()
}

fn parse_int(raw: &str) -> Option<i64> {
    let digits = raw.replace('_', "").to_ascii_lowercase();
    let (radix, body) = if let Some(hex) = digits.strip_prefix("0x") {
        (16, hex.to_string())
    } else if let Some(oct) = digits.strip_prefix("0o") {
        (8, oct.to_string())
    } else if let Some(bin) = digits.strip_prefix("0b") {
        (2, bin.to_string())
    } else {
        (10, digits)
    };
    i64::from_str_radix(&body, radix).ok()
}

/// Decode a plain or raw string literal; bytes and f-strings are not constants
fn parse_string(raw: &str) -> Option<String> {
    let prefix: String = raw.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    let prefix_lower = prefix.to_ascii_lowercase();
    if prefix_lower.contains('b') || prefix_lower.contains('f') {
        return None;
    }
    let is_raw = prefix_lower.contains('r');

    let quoted = &raw[prefix.len()..];
    let delimiter = ["'''", "\"\"\"", "'", "\""]
        .into_iter()
        .find(|d| quoted.starts_with(d) && quoted.len() >= 2 * d.len() && quoted.ends_with(d))?;
    let body = &quoted[delimiter.len()..quoted.len() - delimiter.len()];

    if is_raw {
        Some(body.to_string())
    } else {
        unescape(body)
    }
}

fn unescape(body: &str) -> Option<String> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escaped = chars.next()?;
        match escaped {
            '\n' => {}
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            '0' => out.push('\0'),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'v' => out.push('\x0b'),
            'x' => out.push(hex_char(&mut chars, 2)?),
            'u' => out.push(hex_char(&mut chars, 4)?),
            'U' => out.push(hex_char(&mut chars, 8)?),
            other => {
                // Unknown escapes are kept verbatim
                out.push('\\');
                out.push(other);
            }
        }
    }
    Some(out)
}

fn hex_char(chars: &mut impl Iterator<Item = char>, width: usize) -> Option<char> {
    let digits: String = chars.take(width).collect();
    if digits.len() != width {
        return None;
    }
    char::from_u32(u32::from_str_radix(&digits, 16).ok()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "import datetime
from os import path as p, sep

ONE = 1

class Lair(
        Underground):
    '''Doc.'''
    depth = 3

    def dig(self):
        return self.depth

@decorator
def send():
    pass

print('done')
a[0] = b = {'k': [1, 2]}  # trailing
";

    fn parse() -> SyntaxNode {
        PythonProvider::new().parse_source(SOURCE, "test.py").unwrap()
    }

    #[test]
    fn test_statement_kinds() {
        let module = parse();
        let kinds: Vec<SyntaxKind> = module.children().iter().map(|c| c.kind).collect();

        assert_eq!(
            kinds,
            vec![
                SyntaxKind::Import,
                SyntaxKind::Import,
                SyntaxKind::Assign,
                SyntaxKind::Class,
                SyntaxKind::Function,
                SyntaxKind::Expression,
                SyntaxKind::Assign,
            ]
        );
    }

    #[test]
    fn test_import_names() {
        let module = parse();
        assert_eq!(module.children()[0].import_names, vec!["datetime"]);
        assert_eq!(module.children()[1].import_names, vec!["path", "sep"]);
    }

    #[test]
    fn test_class_positions_and_children() {
        let module = parse();
        let class = &module.children()[3];

        assert_eq!(class.name.as_deref(), Some("Lair"));
        assert_eq!(class.from_line, 6);
        assert_eq!(class.to_line, 12);
        assert_eq!(class.col_offset, 0);
        assert_eq!(class.body_line, Some(8));

        let names: Vec<Option<&str>> = class
            .children()
            .iter()
            .map(|c| c.name.as_deref())
            .collect();
        assert_eq!(names, vec![None, None, Some("dig")]);
        assert_eq!(class.children()[1].kind, SyntaxKind::Assign);
    }

    #[test]
    fn test_decorated_definition_starts_at_decorator() {
        let module = parse();
        let function = &module.children()[4];

        assert_eq!(function.kind, SyntaxKind::Function);
        assert_eq!(function.name.as_deref(), Some("send"));
        assert_eq!(function.from_line, 14);
        assert_eq!(function.body_line, Some(16));
        assert!(function.render().starts_with("@decorator"));
    }

    #[test]
    fn test_chained_assignment() {
        let module = parse();
        let assign = &module.children()[6];

        let targets: Vec<&str> = assign.targets.iter().map(|t| t.render()).collect();
        assert_eq!(targets, vec!["a[0]", "b"]);
        assert_eq!(assign.targets[0].name, None);
        assert_eq!(assign.targets[1].name.as_deref(), Some("b"));

        let value = assign.value.as_ref().unwrap();
        assert_eq!(value.render(), "{'k': [1, 2]}");
        assert_eq!(value.col_offset, 11);
        assert_eq!(value.end_column, 24);
    }

    #[test]
    fn test_expression_name() {
        let module = parse();
        assert_eq!(module.children()[5].name.as_deref(), Some("print"));
    }

    #[test]
    fn test_parse_literal_nested() {
        let provider = PythonProvider::new();
        let text = "{\n    'some_key': 42,\n    'other_key': {\n\n\n        'baz': 'quux'\n    }  #some comment\n\n\n}";

        let value = provider.parse_literal(text).unwrap();
        assert_eq!(
            value,
            Literal::Dict(vec![
                (Literal::str("some_key"), Literal::Int(42)),
                (
                    Literal::str("other_key"),
                    Literal::Dict(vec![(Literal::str("baz"), Literal::str("quux"))]),
                ),
            ])
        );
    }

    #[test]
    fn test_parse_literal_scalars() {
        let provider = PythonProvider::new();
        assert_eq!(provider.parse_literal("-0x10"), Some(Literal::Int(-16)));
        assert_eq!(provider.parse_literal("1_000"), Some(Literal::Int(1000)));
        assert_eq!(provider.parse_literal("2.5"), Some(Literal::Float(2.5)));
        assert_eq!(provider.parse_literal("None"), Some(Literal::None));
        assert_eq!(provider.parse_literal("'a\\tb'"), Some(Literal::str("a\tb")));
        assert_eq!(provider.parse_literal("r'a\\tb'"), Some(Literal::str("a\\tb")));
        assert_eq!(provider.parse_literal("'a' \"b\""), Some(Literal::str("ab")));
        assert_eq!(
            provider.parse_literal("(1,)"),
            Some(Literal::Tuple(vec![Literal::Int(1)]))
        );
    }

    #[test]
    fn test_parse_literal_rejects_non_constants() {
        let provider = PythonProvider::new();
        assert_eq!(provider.parse_literal("settings.BASE_PAY"), None);
        assert_eq!(provider.parse_literal("f'{x}'"), None);
        assert_eq!(provider.parse_literal("[1, y]"), None);
        assert_eq!(provider.parse_literal("x = 1"), None);
        assert_eq!(provider.parse_literal("1\n2"), None);
    }
}
