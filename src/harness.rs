//! Candidate evaluation against the running test suite
//!
//! Every case is always evaluated, with no short-circuit on the first
//! failure, so the verdict carries complete diagnostics for the next
//! feedback prompt.

use crate::runtime::{CandidateRuntime, Invocation, ModuleHandle};
use crate::suite::{Expected, TestSuite};

/// The outcome of one candidate evaluation. Built once, never mutated.
#[derive(Debug, Clone, Default)]
pub struct VerdictReport {
    pub passed: bool,
    pub score: usize,
    pub total: usize,
    pub failures: Vec<String>,
    pub hallucinations: Vec<String>,
}

impl VerdictReport {
    /// The verdict written to the attempt record: `"N/M tests passed"` when
    /// everything passed, otherwise the newline-joined failure lines.
    pub fn summary(&self) -> String {
        if self.passed {
            format!("{}/{} tests passed", self.score, self.total)
        } else {
            self.failures.join("\n")
        }
    }

    pub fn with_hallucinations(mut self, hallucinations: Vec<String>) -> Self {
        self.hallucinations = hallucinations;
        self
    }
}

/// Evaluate a loaded candidate against the full suite, in suite order.
pub fn evaluate<R: CandidateRuntime>(
    runtime: &R,
    handle: &ModuleHandle,
    suite: &TestSuite,
) -> VerdictReport {
    let mut failures = Vec::new();
    let mut score = 0usize;

    for case in suite.iter() {
        match runtime.invoke(handle, &case.function, &case.args) {
            Invocation::Returned(actual) => match &case.expected {
                Expected::Value(expected) if &actual == expected => score += 1,
                _ => failures.push(format!(
                    "{} → {}, expected {}",
                    case.signature(),
                    actual,
                    case.expected
                )),
            },
            Invocation::Raised { kind, .. } => {
                if case.expected.matches_raised(&kind) {
                    score += 1;
                } else {
                    failures.push(format!(
                        "{} → raised {}, expected {}",
                        case.signature(),
                        kind,
                        case.expected
                    ));
                }
            }
            // Invocation breakdowns count against this case only; the
            // harness itself never fails.
            Invocation::Fault(message) => failures.push(format!(
                "{} → {}, expected {}",
                case.signature(),
                message,
                case.expected
            )),
        }
    }

    VerdictReport {
        passed: failures.is_empty(),
        score,
        total: suite.len(),
        failures,
        hallucinations: Vec::new(),
    }
}
