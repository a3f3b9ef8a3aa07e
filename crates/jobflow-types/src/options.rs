//! Execution options and run-every modifiers.
//!
//! Option structs are serde-deserializable so hosts can load them from
//! configuration. Unknown keys are dropped during deserialization, which
//! keeps forward-compatible configs working without an open map type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Named priority levels understood by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityLevel {
    Lowest,
    Low,
    Normal,
    High,
    Highest,
}

/// Job priority, either a named level or a raw number.
///
/// Named levels map onto the engine's numeric scale, so `"highest"` and `20`
/// describe the same priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobPriority {
    Named(PriorityLevel),
    Numeric(i64),
}

impl JobPriority {
    /// The numeric value the engine stores for this priority.
    pub fn as_number(self) -> i64 {
        match self {
            JobPriority::Named(PriorityLevel::Lowest) => -20,
            JobPriority::Named(PriorityLevel::Low) => -10,
            JobPriority::Named(PriorityLevel::Normal) => 0,
            JobPriority::Named(PriorityLevel::High) => 10,
            JobPriority::Named(PriorityLevel::Highest) => 20,
            JobPriority::Numeric(n) => n,
        }
    }
}

/// Execution options attached to a job declaration.
///
/// Every field is optional; `None` leaves the engine default in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobOptions {
    /// Maximum number of job instances running at once.
    #[serde(default)]
    pub concurrency: Option<u32>,

    /// Maximum number of locks held for this job.
    #[serde(default)]
    pub lock_limit: Option<u32>,

    /// Lock lifetime in milliseconds before a lease expires.
    #[serde(default)]
    pub lock_lifetime_ms: Option<u64>,

    /// Dispatch priority relative to other jobs.
    #[serde(default)]
    pub priority: Option<JobPriority>,

    /// Whether the engine persists the handler result.
    #[serde(default)]
    pub should_save_result: Option<bool>,
}

/// Modifiers for ad-hoc recurrence registration (run-every).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunEveryOptions {
    /// IANA timezone the interval is evaluated in.
    #[serde(default)]
    pub timezone: Option<String>,

    /// Skip the immediate first run the engine would otherwise perform.
    #[serde(default)]
    pub skip_immediate: Option<bool>,

    /// Do not run before this point.
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,

    /// Do not run after this point.
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,

    /// Days of the week to skip, in the engine's textual format.
    #[serde(default)]
    pub skip_days: Option<String>,
}
