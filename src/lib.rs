//! Crucible library crate
//!
//! Exposes the loop's modules so integration tests and external tooling can
//! exercise them without going through CLI startup.

pub mod augment;
pub mod client;
pub mod config;
pub mod filter;
pub mod harness;
pub mod ledger;
pub mod orchestrate;
pub mod prompts;
pub mod runtime;
pub mod sanitize;
pub mod suite;
pub mod util;
