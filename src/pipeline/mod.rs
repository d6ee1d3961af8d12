//! Pipeline orchestration and the run result
//!
//! This module contains:
//! - `Orchestrator`: sequences the stages of one run
//! - `RunResult`: counters, flags and outcome of a finished run
//! - `RunFailure`: the unrecoverable conditions that end a run early

mod orchestrator;
mod run_result;

pub use orchestrator::{Orchestrator, OrchestratorSettings};
pub use run_result::{DeliveryStatus, RunFailure, RunResult};
