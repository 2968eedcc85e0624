//! Suite augmentation
//!
//! Asks the generation service for additional edge-case tests each round.
//! Augmentation is strictly best-effort: one call, strict shape validation,
//! and any kind of failure silently degrades to "no new tests this round."

use crate::client::Generate;
use crate::prompts;
use crate::sanitize;
use crate::suite::{self, TestCase, TestSuite};
use serde_json::Value;

/// Request extra edge-case tests for `problem` beyond `existing`. Never
/// fails; a service error or malformed response yields an empty vec.
pub async fn propose_more<G: Generate>(
    client: &G,
    problem: &str,
    existing: &TestSuite,
) -> Vec<TestCase> {
    let prompt = prompts::augmentation(problem, &existing.render());
    let response = match client
        .complete(prompts::SYSTEM_PROMPT, &prompt, prompts::AUGMENT_MAX_TOKENS)
        .await
    {
        Ok(text) => text,
        Err(_) => return Vec::new(),
    };

    parse_proposed(&response)
}

/// Parse a textual response into validated cases; anything that is not a
/// well-formed list parses to nothing.
fn parse_proposed(response: &str) -> Vec<TestCase> {
    let body = sanitize::extract_code(response);
    let Ok(value) = serde_json::from_str::<Value>(&body) else {
        return Vec::new();
    };
    suite::parse_cases(&value).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suite::Expected;
    use anyhow::anyhow;
    use serde_json::json;
    use std::sync::Mutex;

    /// Scripted generation service for tests.
    struct Scripted {
        responses: Mutex<Vec<Result<String, String>>>,
    }

    impl Scripted {
        fn one(response: &str) -> Self {
            Self {
                responses: Mutex::new(vec![Ok(response.to_string())]),
            }
        }

        fn failing() -> Self {
            Self {
                responses: Mutex::new(vec![Err("service unreachable".to_string())]),
            }
        }
    }

    impl Generate for Scripted {
        async fn complete(&self, _system: &str, _user: &str, _max_tokens: u32) -> anyhow::Result<String> {
            match self.responses.lock().unwrap().pop() {
                Some(Ok(text)) => Ok(text),
                Some(Err(e)) => Err(anyhow!(e)),
                None => Err(anyhow!("no scripted response left")),
            }
        }
    }

    fn seed() -> TestSuite {
        TestSuite::new(vec![TestCase::new(
            "add",
            vec![json!(2), json!(3)],
            Expected::Value(json!(5)),
        )])
    }

    #[tokio::test]
    async fn test_propose_more_parses_valid_list() {
        let client = Scripted::one(r#"[["add", [0, 0], 0], ["add", [-5, 5], 0]]"#);
        let cases = propose_more(&client, "add two numbers", &seed()).await;
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[1].args, vec![json!(-5), json!(5)]);
    }

    #[tokio::test]
    async fn test_propose_more_strips_fences() {
        let client = Scripted::one("```json\n[[\"add\", [1, 1], 2]]\n```");
        let cases = propose_more(&client, "add two numbers", &seed()).await;
        assert_eq!(cases.len(), 1);
    }

    #[tokio::test]
    async fn test_propose_more_degrades_on_garbage() {
        let client = Scripted::one("Sure! Here are some great edge cases to consider...");
        assert!(propose_more(&client, "add two numbers", &seed()).await.is_empty());
    }

    #[tokio::test]
    async fn test_propose_more_degrades_on_non_list() {
        let client = Scripted::one(r#"{"tests": [["add", [1, 1], 2]]}"#);
        assert!(propose_more(&client, "add two numbers", &seed()).await.is_empty());
    }

    #[tokio::test]
    async fn test_propose_more_degrades_on_service_error() {
        let client = Scripted::failing();
        assert!(propose_more(&client, "add two numbers", &seed()).await.is_empty());
    }

    #[tokio::test]
    async fn test_propose_more_rejects_partially_bad_list() {
        // One malformed record rejects the whole response
        let client = Scripted::one(r#"[["add", [1, 1], 2], ["broken"]]"#);
        assert!(propose_more(&client, "add two numbers", &seed()).await.is_empty());
    }
}
