//! Test-case data model and the external JSON representation
//!
//! A test case is a 3-element record: function name, argument list, expected
//! outcome. The same representation is used for the seed suite file and for
//! parsed suite-augmentation output.

use anyhow::{Context, Result};
use serde_json::Value;
use std::fmt;
use std::path::Path;

/// What a test case expects from the candidate
#[derive(Debug, Clone, PartialEq)]
pub enum Expected {
    /// A concrete value, compared by structural equality
    Value(Value),
    /// The invocation must fail with an exception of this kind
    Raises(String),
}

impl Expected {
    /// Whether a raised exception kind satisfies this expectation.
    /// Qualified names are tolerated (`builtins.ValueError` matches `ValueError`).
    pub fn matches_raised(&self, kind: &str) -> bool {
        match self {
            Expected::Raises(want) => kind == want || kind.ends_with(&format!(".{}", want)),
            Expected::Value(_) => false,
        }
    }
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::Value(v) => write!(f, "{}", v),
            Expected::Raises(kind) => write!(f, "raises {}", kind),
        }
    }
}

/// A single input/output test case
#[derive(Debug, Clone, PartialEq)]
pub struct TestCase {
    pub function: String,
    pub args: Vec<Value>,
    pub expected: Expected,
}

impl TestCase {
    pub fn new(function: impl Into<String>, args: Vec<Value>, expected: Expected) -> Self {
        Self {
            function: function.into(),
            args,
            expected,
        }
    }

    /// Call signature for diagnostics: `add(2, 3)`
    pub fn signature(&self) -> String {
        let args: Vec<String> = self.args.iter().map(|a| a.to_string()).collect();
        format!("{}({})", self.function, args.join(", "))
    }

    /// One-line rendering for prompt feedback: `add(2, 3) → 5`
    pub fn render(&self) -> String {
        format!("{} → {}", self.signature(), self.expected)
    }
}

/// An ordered, append-only collection of test cases.
///
/// Seeded by the caller and extended by suite augmentation; cases are never
/// removed, so every case is evaluated on every subsequent attempt.
#[derive(Debug, Clone, Default)]
pub struct TestSuite {
    cases: Vec<TestCase>,
}

impl TestSuite {
    pub fn new(seed: Vec<TestCase>) -> Self {
        Self { cases: seed }
    }

    pub fn extend(&mut self, additional: Vec<TestCase>) {
        self.cases.extend(additional);
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TestCase> {
        self.cases.iter()
    }

    /// Full suite rendering for the retry prompt, one line per case.
    pub fn render(&self) -> String {
        self.cases
            .iter()
            .map(|c| c.render())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Parse a single external-representation case: `[function, [args...], expected]`
/// where `expected` is a plain value or `{"raises": "KindName"}`.
fn parse_case(value: &Value) -> Option<TestCase> {
    let triple = value.as_array()?;
    if triple.len() != 3 {
        return None;
    }
    let function = triple[0].as_str()?;
    if function.is_empty() {
        return None;
    }
    let args = triple[1].as_array()?.clone();
    let expected = parse_expected(&triple[2])?;
    Some(TestCase::new(function, args, expected))
}

fn parse_expected(value: &Value) -> Option<Expected> {
    if let Some(obj) = value.as_object() {
        if obj.len() == 1 {
            if let Some(kind) = obj.get("raises").and_then(Value::as_str) {
                if kind.is_empty() {
                    return None;
                }
                return Some(Expected::Raises(kind.to_string()));
            }
        }
    }
    Some(Expected::Value(value.clone()))
}

/// Parse a full list of cases from an already-deserialized JSON value.
///
/// Strict shape check: anything that is not an array of well-formed 3-element
/// records yields `None`; no partial recovery.
pub fn parse_cases(value: &Value) -> Option<Vec<TestCase>> {
    let items = value.as_array()?;
    let mut cases = Vec::with_capacity(items.len());
    for item in items {
        cases.push(parse_case(item)?);
    }
    Some(cases)
}

/// Load the seed suite from a JSON file.
pub fn load_seed_file(path: &Path) -> Result<Vec<TestCase>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read test file {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("Test file {} is not valid JSON", path.display()))?;
    parse_cases(&value).with_context(|| {
        format!(
            "Test file {} must be a JSON list of [function, [args], expected] records",
            path.display()
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_cases_basic() {
        let value = json!([["add", [2, 3], 5], ["add", [-1, 1], 0]]);
        let cases = parse_cases(&value).unwrap();
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].function, "add");
        assert_eq!(cases[0].args, vec![json!(2), json!(3)]);
        assert_eq!(cases[0].expected, Expected::Value(json!(5)));
    }

    #[test]
    fn test_parse_cases_raises_marker() {
        let value = json!([["divide", [1, 0], { "raises": "ZeroDivisionError" }]]);
        let cases = parse_cases(&value).unwrap();
        assert_eq!(
            cases[0].expected,
            Expected::Raises("ZeroDivisionError".to_string())
        );
    }

    #[test]
    fn test_parse_cases_rejects_bad_shapes() {
        // Not a list
        assert!(parse_cases(&json!({"add": 5})).is_none());
        // Wrong arity
        assert!(parse_cases(&json!([["add", [2, 3]]])).is_none());
        // Args not a list
        assert!(parse_cases(&json!([["add", 2, 5]])).is_none());
        // Function name not a string
        assert!(parse_cases(&json!([[7, [2, 3], 5]])).is_none());
        // One bad record poisons the whole list (no partial recovery)
        assert!(parse_cases(&json!([["add", [2, 3], 5], ["oops"]])).is_none());
    }

    #[test]
    fn test_expected_object_without_raises_is_a_value() {
        let value = json!([["lookup", ["k"], { "found": true }]]);
        let cases = parse_cases(&value).unwrap();
        assert_eq!(cases[0].expected, Expected::Value(json!({"found": true})));
    }

    #[test]
    fn test_matches_raised_tolerates_qualified_names() {
        let expected = Expected::Raises("ValueError".to_string());
        assert!(expected.matches_raised("ValueError"));
        assert!(expected.matches_raised("builtins.ValueError"));
        assert!(!expected.matches_raised("TypeError"));
        assert!(!expected.matches_raised("MyValueError"));
    }

    #[test]
    fn test_signature_and_render() {
        let case = TestCase::new("reverse_string", vec![json!("hello")], Expected::Value(json!("olleh")));
        assert_eq!(case.signature(), r#"reverse_string("hello")"#);
        assert_eq!(case.render(), r#"reverse_string("hello") → "olleh""#);
    }

    #[test]
    fn test_suite_render_one_line_per_case() {
        let mut suite = TestSuite::new(vec![TestCase::new(
            "add",
            vec![json!(2), json!(3)],
            Expected::Value(json!(5)),
        )]);
        suite.extend(vec![TestCase::new(
            "add",
            vec![json!(-1), json!(1)],
            Expected::Value(json!(0)),
        )]);
        assert_eq!(suite.len(), 2);
        assert_eq!(suite.render(), "add(2, 3) → 5\nadd(-1, 1) → 0");
    }
}
