//! Lexical hallucination detection
//!
//! Generated code sometimes references APIs that do not exist. This filter is
//! a deliberately coarse substring check against a denylist of known-invalid
//! constructs. It is a lexical signal, not semantic analysis, and will flag
//! matches inside comments or strings too. That limitation is accepted; do
//! not try to make it smarter here.

/// Constructs the generation service is known to invent.
const DEFAULT_DENYLIST: &[&str] = &[
    "xyz(",
    "nonexistent_",
    "fake_function",
    "magic_method",
    "foobar",
];

/// The default denylist as owned strings, for use where callers may override it.
pub fn default_denylist() -> Vec<String> {
    DEFAULT_DENYLIST.iter().map(|s| s.to_string()).collect()
}

/// Return the denylist entries present in `source`, preserving denylist order.
pub fn scan(source: &str, denylist: &[String]) -> Vec<String> {
    denylist
        .iter()
        .filter(|token| source.contains(token.as_str()))
        .cloned()
        .collect()
}
