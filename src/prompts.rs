//! Prompt construction for candidate generation and suite augmentation

pub const SYSTEM_PROMPT: &str = "You are an expert Python programmer.";

/// Output-length caps per call site.
pub const CANDIDATE_MAX_TOKENS: u32 = 1000;
pub const AUGMENT_MAX_TOKENS: u32 = 350;

/// Remediation instruction for denylist matches found in the previous
/// candidate. Empty when there is nothing to remove.
pub fn hallucination_feedback(matches: &[String]) -> String {
    if matches.is_empty() {
        String::new()
    } else {
        format!(
            "The previous code contains invalid references: [{}]. Remove them.",
            matches.join(", ")
        )
    }
}

/// First-attempt prompt: just the problem plus any filter feedback.
pub fn first_attempt(problem: &str, filter_feedback: &str) -> String {
    format!(
        "{}\n{}\nReturn only valid Python code.",
        problem, filter_feedback
    )
}

/// Retry prompt: previous code verbatim, the full current suite one line per
/// case, filter feedback, and the instruction to return a corrected module.
pub fn retry(previous_code: &str, suite_render: &str, filter_feedback: &str) -> String {
    format!(
        "The previous code did not pass all tests.\n\
         Previous code:\n{}\n\
         Full test context:\n{}\n\
         {}\n\
         Rewrite the module to pass all tests. Return only valid Python code.",
        previous_code, suite_render, filter_feedback
    )
}

/// Augmentation request: 3-7 extra edge-case tests in the external JSON
/// representation.
pub fn augmentation(problem: &str, suite_render: &str) -> String {
    format!(
        "Problem: {}\n\
         Existing tests:\n{}\n\
         Generate 3-7 additional edge-case test cases as a JSON list of \
         3-element lists: [function_name, [args...], expected_output]. \
         Use {{\"raises\": \"ExceptionName\"}} as the expected output for cases \
         that must fail. Return ONLY the JSON list.",
        problem, suite_render
    )
}
