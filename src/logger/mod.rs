//! Activity logging: a dedicated thread drains a bounded channel of
//! [`ActivityEvent`]s and writes them out as JSONL, mirroring to colored stdout
//! when the `cli` feature is on.

pub mod activity;
pub mod jsonl;

pub use activity::{ActivityEvent, Severity};
pub use jsonl::ActivityLogger;
