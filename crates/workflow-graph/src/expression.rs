//! Expression references
//!
//! String fields in node data may embed references to runtime values with
//! `{{ ... }}`. A reference path starts with a scope tag:
//!
//! - `$input.<nodeIdOrAlias>.<field>...` reads an upstream node's output
//! - `$vars.<name>...` reads a workflow variable
//! - `$item...` reads the element of the innermost enclosing loop
//!
//! Segments after the scope are identifiers (`[A-Za-z0-9_-]`). Numeric
//! segments index into arrays at resolution time.
//!
//! ```ignore
//! let refs = extract_references("Hi {{$vars.name}}!")?;
//! assert_eq!(refs[0].scope, Scope::Vars);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::ops::Range;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Text substituted for a reference whose value is missing
pub const UNDEFINED: &str = "undefined";

/// Root of a reference path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Scope {
    #[serde(rename = "$input")]
    Input,
    #[serde(rename = "$vars")]
    Vars,
    #[serde(rename = "$item")]
    Item,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Input => "$input",
            Scope::Vars => "$vars",
            Scope::Item => "$item",
        }
    }

    fn parse(tag: &str) -> Option<Self> {
        match tag {
            "$input" => Some(Scope::Input),
            "$vars" => Some(Scope::Vars),
            "$item" => Some(Scope::Item),
            _ => None,
        }
    }

    /// Whether the scope tag alone is a complete reference
    fn stands_alone(&self) -> bool {
        matches!(self, Scope::Item)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One parsed `{{ ... }}` occurrence
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpressionRef {
    pub scope: Scope,
    /// Segments after the scope tag
    pub path: Vec<String>,
    /// The occurrence as written, delimiters included
    pub raw: String,
    /// Byte range of `raw` within the field
    pub span: Range<usize>,
}

impl ExpressionRef {
    /// Canonical dotted path, e.g. `$input.n1.title`
    pub fn path_string(&self) -> String {
        let mut out = self.scope.as_str().to_string();
        for segment in &self.path {
            out.push('.');
            out.push_str(segment);
        }
        out
    }

    /// Node id or alias of an `$input` reference
    pub fn input_node(&self) -> Option<&str> {
        match self.scope {
            Scope::Input => self.path.first().map(String::as_str),
            _ => None,
        }
    }

    /// First output field of an `$input` reference
    pub fn input_field(&self) -> Option<&str> {
        match self.scope {
            Scope::Input => self.path.get(1).map(String::as_str),
            _ => None,
        }
    }

    /// Variable name of a `$vars` reference
    pub fn variable_name(&self) -> Option<&str> {
        match self.scope {
            Scope::Vars => self.path.first().map(String::as_str),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyntaxErrorKind {
    /// `{{` without a closing `}}`
    Unterminated,
    /// `}}` outside any reference
    UnmatchedClose,
    /// `{{` inside a reference
    Nested,
    /// `{{}}` or only whitespace between the delimiters
    EmptyPath,
    /// First segment is not `$input`, `$vars` or `$item`
    UnknownScope,
    /// Empty segment or a character outside `[A-Za-z0-9_-]`
    InvalidSegment,
    /// `$input` or `$vars` with nothing after it
    MissingPath,
}

impl SyntaxErrorKind {
    fn description(&self) -> &'static str {
        match self {
            SyntaxErrorKind::Unterminated => "unterminated '{{'",
            SyntaxErrorKind::UnmatchedClose => "'}}' without matching '{{'",
            SyntaxErrorKind::Nested => "nested '{{' inside a reference",
            SyntaxErrorKind::EmptyPath => "empty reference",
            SyntaxErrorKind::UnknownScope => "reference must start with $input, $vars or $item",
            SyntaxErrorKind::InvalidSegment => "invalid path segment",
            SyntaxErrorKind::MissingPath => "scope needs a name after it",
        }
    }
}

/// A malformed reference
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{} at byte {}", .kind.description(), .offset)]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    /// Byte offset of the offending delimiter or reference
    pub offset: usize,
}

impl SyntaxError {
    fn new(kind: SyntaxErrorKind, offset: usize) -> Self {
        Self { kind, offset }
    }
}

/// Parse every reference in a string field
///
/// Text without delimiters yields an empty list. The first malformed
/// occurrence fails the whole field.
pub fn extract_references(field: &str) -> Result<Vec<ExpressionRef>, SyntaxError> {
    let mut refs = Vec::new();
    let mut pos = 0;

    while pos < field.len() {
        let rest = &field[pos..];
        let next_open = rest.find(OPEN);
        let next_close = rest.find(CLOSE);

        let open = match (next_open, next_close) {
            (None, None) => break,
            (None, Some(close)) => {
                return Err(SyntaxError::new(SyntaxErrorKind::UnmatchedClose, pos + close))
            }
            (Some(open), Some(close)) if close < open => {
                return Err(SyntaxError::new(SyntaxErrorKind::UnmatchedClose, pos + close))
            }
            (Some(open), _) => pos + open,
        };

        let body_start = open + OPEN.len();
        let close = match field[body_start..].find(CLOSE) {
            Some(c) => body_start + c,
            None => return Err(SyntaxError::new(SyntaxErrorKind::Unterminated, open)),
        };
        if let Some(inner) = field[body_start..close].find(OPEN) {
            return Err(SyntaxError::new(SyntaxErrorKind::Nested, body_start + inner));
        }

        let end = close + CLOSE.len();
        let (scope, path) = parse_path(&field[body_start..close], open)?;
        refs.push(ExpressionRef {
            scope,
            path,
            raw: field[open..end].to_string(),
            span: open..end,
        });
        pos = end;
    }

    Ok(refs)
}

fn parse_path(body: &str, offset: usize) -> Result<(Scope, Vec<String>), SyntaxError> {
    let body = body.trim();
    if body.is_empty() {
        return Err(SyntaxError::new(SyntaxErrorKind::EmptyPath, offset));
    }

    let mut segments = body.split('.');
    let head = segments.next().unwrap_or_default();
    let scope =
        Scope::parse(head).ok_or_else(|| SyntaxError::new(SyntaxErrorKind::UnknownScope, offset))?;

    let mut path = Vec::new();
    for segment in segments {
        if !is_valid_segment(segment) {
            return Err(SyntaxError::new(SyntaxErrorKind::InvalidSegment, offset));
        }
        path.push(segment.to_string());
    }

    if path.is_empty() && !scope.stands_alone() {
        return Err(SyntaxError::new(SyntaxErrorKind::MissingPath, offset));
    }
    Ok((scope, path))
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Runtime values a reference can read
///
/// Implemented by whatever runs a workflow; [`ExecutionContext`] is a plain
/// map-backed version.
pub trait ScopeSource {
    /// Output of an upstream node, by id or alias
    fn input(&self, node: &str) -> Option<&Value>;
    /// A workflow variable
    fn variable(&self, name: &str) -> Option<&Value>;
    /// Element of the innermost enclosing loop
    fn item(&self) -> Option<&Value>;
}

/// Map-backed [`ScopeSource`]
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    outputs: HashMap<String, Value>,
    aliases: HashMap<String, String>,
    variables: HashMap<String, Value>,
    item: Option<Value>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a node's output
    pub fn with_input(mut self, node_id: impl Into<String>, output: Value) -> Self {
        self.outputs.insert(node_id.into(), output);
        self
    }

    /// Make a node's output reachable through its alias too
    pub fn with_alias(mut self, alias: impl Into<String>, node_id: impl Into<String>) -> Self {
        self.aliases.insert(alias.into(), node_id.into());
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: Value) -> Self {
        self.variables.insert(name.into(), value);
        self
    }

    pub fn with_vars<I, K>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        self.variables
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v)));
        self
    }

    /// Enter a loop iteration; replaces any outer item
    pub fn with_item(mut self, item: Value) -> Self {
        self.item = Some(item);
        self
    }
}

impl ScopeSource for ExecutionContext {
    fn input(&self, node: &str) -> Option<&Value> {
        self.outputs.get(node).or_else(|| {
            self.aliases
                .get(node)
                .and_then(|id| self.outputs.get(id))
        })
    }

    fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    fn item(&self) -> Option<&Value> {
        self.item.as_ref()
    }
}

/// The value a single reference points at
pub fn lookup<'a, S: ScopeSource>(reference: &ExpressionRef, source: &'a S) -> Option<&'a Value> {
    let (root, rest) = match reference.scope {
        Scope::Input => {
            let (node, rest) = reference.path.split_first()?;
            (source.input(node)?, rest)
        }
        Scope::Vars => {
            let (name, rest) = reference.path.split_first()?;
            (source.variable(name)?, rest)
        }
        Scope::Item => (source.item()?, reference.path.as_slice()),
    };

    rest.iter().try_fold(root, |value, segment| match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// A field with its references substituted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolved {
    pub value: String,
    /// Paths of references that had no value
    pub missing: Vec<String>,
}

/// Substitute every reference in a field
///
/// Strings are inserted as-is; other values as compact JSON. A reference
/// with no value becomes [`UNDEFINED`] and is listed in `missing`. A field
/// with malformed syntax is returned unchanged.
pub fn resolve<S: ScopeSource>(field: &str, source: &S) -> Resolved {
    let refs = match extract_references(field) {
        Ok(refs) => refs,
        Err(e) => {
            log::debug!("Leaving malformed field as literal text: {}", e);
            return Resolved {
                value: field.to_string(),
                missing: Vec::new(),
            };
        }
    };

    let mut value = String::with_capacity(field.len());
    let mut missing = Vec::new();
    let mut last = 0;
    for reference in &refs {
        value.push_str(&field[last..reference.span.start]);
        match lookup(reference, source) {
            Some(Value::String(s)) => value.push_str(s),
            Some(other) => value.push_str(&other.to_string()),
            None => {
                value.push_str(UNDEFINED);
                missing.push(reference.path_string());
            }
        }
        last = reference.span.end;
    }
    value.push_str(&field[last..]);

    Resolved { value, missing }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_vars_reference() {
        let refs = extract_references("Hi {{$vars.name}}!").unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].scope, Scope::Vars);
        assert_eq!(refs[0].path, vec!["name"]);
        assert_eq!(refs[0].raw, "{{$vars.name}}");
        assert_eq!(refs[0].span, 3..17);
    }

    #[test]
    fn test_no_references() {
        assert!(extract_references("no refs here").unwrap().is_empty());
        assert!(extract_references("").unwrap().is_empty());
        assert!(extract_references("a { single } brace").unwrap().is_empty());
    }

    #[test]
    fn test_several_references_with_whitespace() {
        let refs =
            extract_references("Hello {{ $vars.name }}, score {{$input.extract1.count}} ({{$item}})")
                .unwrap();
        let paths: Vec<String> = refs.iter().map(|r| r.path_string()).collect();
        assert_eq!(paths, vec!["$vars.name", "$input.extract1.count", "$item"]);
        assert_eq!(refs[1].input_node(), Some("extract1"));
        assert_eq!(refs[1].input_field(), Some("count"));
        assert_eq!(refs[0].variable_name(), Some("name"));
    }

    #[test]
    fn test_unterminated() {
        let err = extract_references("{{unterminated").unwrap_err();
        assert_eq!(err, SyntaxError::new(SyntaxErrorKind::Unterminated, 0));

        let err = extract_references("ok {{$vars.a}} then {{$vars.b").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::Unterminated);
        assert_eq!(err.offset, 20);
    }

    #[test]
    fn test_malformed_references() {
        let cases = [
            ("stray }} here", SyntaxErrorKind::UnmatchedClose),
            ("{{$vars.a}} }}", SyntaxErrorKind::UnmatchedClose),
            ("{{$vars.{{$item}}}}", SyntaxErrorKind::Nested),
            ("{{}}", SyntaxErrorKind::EmptyPath),
            ("{{   }}", SyntaxErrorKind::EmptyPath),
            ("{{name}}", SyntaxErrorKind::UnknownScope),
            ("{{$env.HOME}}", SyntaxErrorKind::UnknownScope),
            ("{{$vars..name}}", SyntaxErrorKind::InvalidSegment),
            ("{{$vars.name.}}", SyntaxErrorKind::InvalidSegment),
            ("{{$vars.first name}}", SyntaxErrorKind::InvalidSegment),
            ("{{$input}}", SyntaxErrorKind::MissingPath),
            ("{{$vars}}", SyntaxErrorKind::MissingPath),
        ];
        for (text, kind) in cases {
            let err = extract_references(text).unwrap_err();
            assert_eq!(err.kind, kind, "{}", text);
        }
    }

    #[test]
    fn test_syntax_error_message() {
        let err = extract_references("x {{$vars}}").unwrap_err();
        assert_eq!(err.to_string(), "scope needs a name after it at byte 2");
    }

    fn context() -> ExecutionContext {
        ExecutionContext::new()
            .with_input("n1", json!({"title": "Example", "status": 200, "tags": ["a", "b"]}))
            .with_alias("home", "n1")
            .with_variable("name", json!("Ada"))
            .with_vars([("limits", json!({"max": 3}))])
            .with_item(json!({"sku": "X-1"}))
    }

    #[test]
    fn test_resolve_substitutes_values() {
        let ctx = context();
        let resolved = resolve(
            "{{$vars.name}} saw {{$input.home.title}} ({{$input.n1.status}}) {{$item.sku}}",
            &ctx,
        );
        assert_eq!(resolved.value, "Ada saw Example (200) X-1");
        assert!(resolved.missing.is_empty());
    }

    #[test]
    fn test_resolve_non_string_values_as_json() {
        let ctx = context();
        let resolved = resolve("{{$vars.limits}} {{$input.n1.tags}} {{$input.n1.tags.1}}", &ctx);
        assert_eq!(resolved.value, r#"{"max":3} ["a","b"] b"#);
    }

    #[test]
    fn test_resolve_missing_values() {
        let ctx = context();
        let resolved = resolve("{{$vars.nope}}/{{$input.n1.title.deep}}/{{$input.n9.x}}", &ctx);
        assert_eq!(resolved.value, "undefined/undefined/undefined");
        assert_eq!(
            resolved.missing,
            vec!["$vars.nope", "$input.n1.title.deep", "$input.n9.x"]
        );

        let resolved = resolve("{{$item}}", &ExecutionContext::new());
        assert_eq!(resolved.value, "undefined");
        assert_eq!(resolved.missing, vec!["$item"]);
    }

    #[test]
    fn test_resolve_invalid_syntax_is_literal() {
        let resolved = resolve("price {{$vars.cost", &context());
        assert_eq!(resolved.value, "price {{$vars.cost");
        assert!(resolved.missing.is_empty());
    }

    #[test]
    fn test_innermost_item_wins() {
        let ctx = context().with_item(json!({"sku": "inner"}));
        assert_eq!(resolve("{{$item.sku}}", &ctx).value, "inner");
    }

    #[test]
    fn test_lookup_returns_typed_value() {
        let ctx = context();
        let refs = extract_references("{{$input.n1.status}}").unwrap();
        assert_eq!(lookup(&refs[0], &ctx), Some(&json!(200)));
    }
}
