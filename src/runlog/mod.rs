//! Run statistics for the trace agent.
//!
//! Counts what each tracking run consumed and produced so operators can
//! check coverage across invocations.

pub mod log;

// Re-export commonly used types
pub use log::{
    create_shared_log, create_shared_log_with_persistence, RunLog, RunStats, SharedRunLog,
};
