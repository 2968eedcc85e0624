use anyhow::{bail, Context, Result};
use clap::Parser;
use crucible::client::GenerationClient;
use crucible::config::RunConfig;
use crucible::ledger::Ledger;
use crucible::orchestrate::{Orchestrator, Outcome};
use crucible::runtime::PythonRuntime;
use crucible::suite;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "crucible",
    about = "A test-driven, self-correcting code generation loop",
    version
)]
struct Args {
    /// File containing the natural-language problem statement
    problem: PathBuf,

    /// JSON file with the seed test cases: [[function, [args], expected], ...]
    tests: PathBuf,

    /// Model identifier sent to the generation service
    #[arg(short, long)]
    model: Option<String>,

    /// Maximum number of attempts before giving up
    #[arg(short = 'a', long)]
    max_attempts: Option<u32>,

    /// Directory for attempt records (also the resume source)
    #[arg(short, long, default_value = "logs")]
    log_dir: PathBuf,

    /// Directory the candidate source is written to before execution
    #[arg(short, long, default_value = ".")]
    work_dir: PathBuf,

    /// Python interpreter used to run candidates
    #[arg(long, default_value = "python3")]
    python: String,

    /// Optional JSON config file (model, timeouts, denylist, ...)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => RunConfig::load(path),
        None => RunConfig::default(),
    };
    if let Some(model) = args.model {
        config.model = model;
    }
    if let Some(max_attempts) = args.max_attempts {
        config.max_attempts = max_attempts;
    }

    let problem = std::fs::read_to_string(&args.problem)
        .with_context(|| format!("Failed to read problem file {}", args.problem.display()))?;
    let problem = problem.trim().to_string();
    if problem.is_empty() {
        bail!("Problem file {} is empty", args.problem.display());
    }

    let seed = suite::load_seed_file(&args.tests)?;
    if seed.is_empty() {
        bail!("Test file {} contains no test cases", args.tests.display());
    }

    let Some(api_key) = RunConfig::api_key() else {
        bail!("No API key found. Set OPENROUTER_API_KEY or OPENAI_API_KEY.");
    };

    let client = GenerationClient::new(
        &config.endpoint,
        api_key,
        &config.model,
        Duration::from_secs(config.request_timeout_secs),
    )?;
    let runtime = PythonRuntime::new(
        &args.work_dir,
        &args.python,
        Duration::from_secs(config.case_timeout_secs),
    );
    let ledger = Ledger::open(&args.log_dir)?;

    println!(
        "🔥 crucible: {} seed test(s), model {}, up to {} attempt(s)",
        seed.len(),
        client.model(),
        config.max_attempts
    );

    let mut orchestrator = Orchestrator::new(client, runtime, ledger, problem, seed, &config);
    match orchestrator.run().await? {
        Outcome::Succeeded { attempt, verdict } => {
            println!(
                "Succeeded at attempt {} ({}/{} tests).",
                attempt, verdict.score, verdict.total
            );
            Ok(())
        }
        Outcome::Exhausted {
            last_attempt,
            verdict,
        } => {
            if let Some(verdict) = verdict {
                eprintln!(
                    "Gave up after attempt {} ({}/{} tests passing).",
                    last_attempt, verdict.score, verdict.total
                );
            } else {
                eprintln!("Gave up after attempt {} with no runnable candidate.", last_attempt);
            }
            std::process::exit(1);
        }
    }
}
