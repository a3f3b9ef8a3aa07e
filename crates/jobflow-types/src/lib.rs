//! # jobflow-types
//!
//! Shared domain types for the jobflow scheduling facade.
//!
//! This crate defines the data structures exchanged between a host process,
//! the registration facade, and the scheduling engine seam:
//! - Declarations: immutable job descriptions supplied at configuration time
//! - Options: execution options and run-every modifiers
//! - Triggers: one-shot schedule points, recurrence name sets, job queries
//!
//! ## Usage
//!
//! ```rust
//! use jobflow_types::{handler, JobDeclaration};
//!
//! let decl = JobDeclaration::new("nightly-report", handler(|_ctx| async { Ok(()) }))
//!     .with_every("0 0 3 * * *");
//! assert_eq!(decl.name, "nightly-report");
//! ```

mod declaration;
mod options;
mod trigger;

pub use declaration::{handler, HandlerFuture, JobContext, JobDeclaration, JobHandler};
pub use options::{JobOptions, JobPriority, PriorityLevel, RunEveryOptions};
pub use trigger::{JobHandle, JobNames, JobQuery, ScheduleWhen};
