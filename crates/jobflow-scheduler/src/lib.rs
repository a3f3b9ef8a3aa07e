//! # jobflow-scheduler
//!
//! Deferred job registration and a runtime control plane over an external
//! scheduling engine.
//!
//! A host declares its background jobs once, at configuration time. The
//! service validates each declaration, registers its handler with the engine
//! right away, and parks its triggers, grouped by identical trigger text,
//! until the engine reports that its backing store is usable. At that moment
//! the whole batch is applied exactly once, in a fixed order. Afterwards the
//! same service answers ad-hoc requests: run a job now, on an interval, at a
//! point in time, or enable/disable/cancel persisted jobs.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use jobflow_scheduler::{JobService, ServiceConfig};
//! use jobflow_types::{handler, JobDeclaration};
//!
//! let jobs = vec![
//!     JobDeclaration::new("rollup", handler(|_ctx| async { Ok(()) }))
//!         .with_every("0 0 * * * *"),
//!     JobDeclaration::new("welcome-mail", handler(|_ctx| async { Ok(()) }))
//!         .with_schedule("in 5 minutes"),
//! ];
//!
//! let service = JobService::new(engine, ServiceConfig::default(), jobs).await?;
//! service.start().await?;
//!
//! let hnd = service.run_now("rollup", None).await?;
//! ```

mod applier;
mod config;
mod error;
mod pending;
mod service;
mod validate;

pub use config::ServiceConfig;
pub use error::{ControlPlaneError, ServiceError};
pub use service::JobService;
pub use validate::{validate_declaration, DeclarationError};
