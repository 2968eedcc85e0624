//! The generation-verification-feedback loop
//!
//! Drives attempts through a fixed progression: resume from the ledger,
//! optionally grow the suite, request a candidate, sanitize it, execute it,
//! and decide. Candidate misbehavior of any kind (generation failures, code
//! that will not load, failing tests) only consumes attempts; the loop itself
//! fails only when the ledger cannot be read or written.

use crate::augment;
use crate::client::Generate;
use crate::config::RunConfig;
use crate::filter;
use crate::harness::{self, VerdictReport};
use crate::ledger::{Attempt, Ledger};
use crate::prompts;
use crate::runtime::CandidateRuntime;
use crate::sanitize;
use crate::suite::{TestCase, TestSuite};
use anyhow::Result;

/// Where the loop currently is. One attempt walks Resuming → … → Deciding and
/// then either terminates or comes back around through Retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Resuming,
    GeneratingSuite,
    RequestingCandidate,
    Sanitizing,
    Executing,
    Deciding,
    Retrying,
    Succeeded,
    Exhausted,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Succeeded | Phase::Exhausted)
    }
}

/// How a run ended.
#[derive(Debug)]
pub enum Outcome {
    /// A candidate passed every test with no denylist matches.
    Succeeded { attempt: u32, verdict: VerdictReport },
    /// The attempt ceiling was reached; the last verdict (if any candidate
    /// got far enough to produce one) is carried for reporting.
    Exhausted {
        last_attempt: u32,
        verdict: Option<VerdictReport>,
    },
}

pub struct Orchestrator<G, R> {
    client: G,
    runtime: R,
    ledger: Ledger,
    problem: String,
    suite: TestSuite,
    denylist: Vec<String>,
    max_attempts: u32,
    phase: Phase,
}

impl<G: Generate, R: CandidateRuntime> Orchestrator<G, R> {
    pub fn new(
        client: G,
        runtime: R,
        ledger: Ledger,
        problem: impl Into<String>,
        seed: Vec<TestCase>,
        config: &RunConfig,
    ) -> Self {
        Self {
            client,
            runtime,
            ledger,
            problem: problem.into(),
            suite: TestSuite::new(seed),
            denylist: config.denylist.clone(),
            max_attempts: config.max_attempts,
            phase: Phase::Idle,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The running suite, seed plus everything augmentation has added.
    pub fn suite(&self) -> &TestSuite {
        &self.suite
    }

    fn enter(&mut self, phase: Phase) {
        self.phase = phase;
    }

    /// Run attempts until a candidate succeeds or the ceiling is reached.
    /// Only ledger I/O failures abort the run.
    pub async fn run(&mut self) -> Result<Outcome> {
        self.enter(Phase::Resuming);
        let (last, mut previous_code) = self.ledger.resume()?;
        if last > 0 {
            println!("Resuming after attempt {}.", last);
        }
        let mut attempt = last + 1;
        let mut last_verdict: Option<VerdictReport> = None;

        while attempt <= self.max_attempts {
            println!("\n=== Attempt {} ===", attempt);

            // Suite growth is skipped on the very first attempt: with no
            // previous candidate there is nothing to probe for edge cases yet.
            if previous_code.is_some() {
                self.enter(Phase::GeneratingSuite);
                let added =
                    augment::propose_more(&self.client, &self.problem, &self.suite).await;
                println!("Added {} additional edge-case tests.", added.len());
                self.suite.extend(added);
            }

            // Filter feedback is computed from the previous attempt's code,
            // so the service is told what to remove from its last output.
            let prior_matches = previous_code
                .as_deref()
                .map(|code| filter::scan(code, &self.denylist))
                .unwrap_or_default();
            if !prior_matches.is_empty() {
                println!("⚠️  Hallucinations detected: [{}]", prior_matches.join(", "));
            }
            let feedback = prompts::hallucination_feedback(&prior_matches);

            self.enter(Phase::RequestingCandidate);
            let user_prompt = match previous_code.as_deref() {
                Some(code) => prompts::retry(code, &self.suite.render(), &feedback),
                None => prompts::first_attempt(&self.problem, &feedback),
            };
            let raw = match self
                .client
                .complete(
                    prompts::SYSTEM_PROMPT,
                    &user_prompt,
                    prompts::CANDIDATE_MAX_TOKENS,
                )
                .await
            {
                Ok(text) => text,
                Err(err) => {
                    // Generation fault: no candidate this round. The slot is
                    // still consumed and the fault is recorded.
                    let message = format!("Generation failed: {:#}", err);
                    eprintln!("{}", message);
                    self.ledger.append(&Attempt::new(attempt, "", message))?;
                    attempt += 1;
                    self.enter(Phase::Retrying);
                    continue;
                }
            };

            self.enter(Phase::Sanitizing);
            let code = sanitize::extract_code(&raw);

            self.enter(Phase::Executing);
            let handle = match self.runtime.load(&code) {
                Ok(handle) => handle,
                Err(fault) => {
                    let message = format!("Import error: {}", fault.message);
                    println!("{}", message);
                    self.ledger
                        .append(&Attempt::new(attempt, code.clone(), message))?;
                    previous_code = Some(code);
                    attempt += 1;
                    self.enter(Phase::Retrying);
                    continue;
                }
            };

            self.enter(Phase::Deciding);
            let current_matches = filter::scan(&code, &self.denylist);
            let verdict = harness::evaluate(&self.runtime, &handle, &self.suite)
                .with_hallucinations(current_matches.clone());
            println!("Test result:\n{}", verdict.summary());

            self.ledger
                .append(&Attempt::new(attempt, code.clone(), verdict.summary()))?;

            if verdict.passed && current_matches.is_empty() {
                println!(
                    "\n✅ All tests pass with no hallucinations. Finished after {} attempt(s).",
                    attempt
                );
                self.enter(Phase::Succeeded);
                return Ok(Outcome::Succeeded { attempt, verdict });
            }

            if verdict.passed {
                println!("Tests pass but hallucinated constructs remain. Retrying...");
            } else {
                println!("Candidate failed. Retrying with feedback...");
            }
            previous_code = Some(code);
            last_verdict = Some(verdict);
            attempt += 1;
            self.enter(Phase::Retrying);
        }

        println!("\n⚠️  Max attempts reached. The candidate may still fail some tests.");
        self.enter(Phase::Exhausted);
        Ok(Outcome::Exhausted {
            last_attempt: attempt.saturating_sub(1),
            verdict: last_verdict,
        })
    }
}
