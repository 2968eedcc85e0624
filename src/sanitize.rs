//! Best-effort extraction of candidate source from a generation response
//!
//! Responses often arrive wrapped in markdown fences, sometimes with a bare
//! language-tag line on top. Extraction is intentionally simple: take the
//! first fenced block if fences are present, else the whole text. Anything
//! that still fails to load downstream is reported as a load fault rather
//! than guessed at further.

/// Language tags the service is known to emit as a bare first line.
const LANGUAGE_TAGS: &[&str] = &["python", "python3", "py", "rust", "javascript", "js", "json", "text"];

/// Strip fencing and a leading language tag, returning raw candidate source.
pub fn extract_code(response: &str) -> String {
    let mut body = if response.contains("```") {
        let parts: Vec<&str> = response.split("```").collect();
        if parts.len() >= 3 {
            // First fenced block
            parts[1]
        } else {
            // Unbalanced fence: take whatever follows it
            parts[parts.len() - 1]
        }
    } else {
        response
    };

    if let Some(first_newline) = body.find('\n') {
        let first_line = body[..first_newline].trim();
        if LANGUAGE_TAGS.contains(&first_line.to_lowercase().as_str()) {
            body = &body[first_newline + 1..];
        }
    }

    body.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_response_passes_through() {
        let response = "def add(a, b):\n    return a + b";
        assert_eq!(extract_code(response), response);
    }

    #[test]
    fn test_fenced_block_with_language_tag() {
        let response = "Here you go:\n```python\ndef add(a, b):\n    return a + b\n```\nHope that helps!";
        assert_eq!(extract_code(response), "def add(a, b):\n    return a + b");
    }

    #[test]
    fn test_multiple_fenced_blocks_takes_first() {
        let response = "```python\nfirst = 1\n```\nand also\n```python\nsecond = 2\n```";
        assert_eq!(extract_code(response), "first = 1");
    }

    #[test]
    fn test_unbalanced_fence_takes_tail() {
        let response = "```python\ndef add(a, b):\n    return a + b";
        assert_eq!(extract_code(response), "def add(a, b):\n    return a + b");
    }

    #[test]
    fn test_bare_language_line_without_fences() {
        let response = "Python\ndef add(a, b):\n    return a + b";
        assert_eq!(extract_code(response), "def add(a, b):\n    return a + b");
    }

    #[test]
    fn test_code_starting_with_import_is_kept() {
        // "import" is not a language tag; the first line must survive
        let response = "import math\nprint(math.pi)";
        assert_eq!(extract_code(response), response);
    }
}
