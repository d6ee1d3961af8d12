//! Shared run policies
//!
//! - `RetryPolicy`: bounded exponential backoff used by the summarizer and
//!   the delivery client
//! - `RunDeadline`: the single wall-clock budget carried through one run

mod deadline;
mod retry;

pub use deadline::RunDeadline;
pub use retry::RetryPolicy;
