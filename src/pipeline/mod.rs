//! Concurrent rendering pipeline.
//!
//! [`plan::plan_tasks`] enumerates tasks, [`scheduler::Scheduler`] runs them on a worker pool,
//! [`tracker::FileTracker`] records in-flight files and [`cancel::CancellationController`]
//! cleans up after an interrupt.

/// Interrupt handling.
pub mod cancel;
/// Task enumeration.
pub mod plan;
/// Worker pool and run summary.
pub mod scheduler;
/// In-flight file registry.
pub mod tracker;
