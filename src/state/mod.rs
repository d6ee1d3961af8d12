//! State module for tracking run progress
//!
//! # Components
//!
//! - `RunStage`: the stages of one digest run (start, fetching, ..., done, failed)
//! - `StageTracker`: applies forward-only transitions and reports invalid ones

mod run_stage;

pub use run_stage::{RunStage, StageTracker};
