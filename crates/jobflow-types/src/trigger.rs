//! Trigger shapes: one-shot schedule points, recurrence name sets, job
//! queries, and the opaque handle the engine returns.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// When a one-shot job should run.
///
/// Either an absolute point in time or a relative/textual expression the
/// engine parses itself (e.g. `"in 1 minute"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScheduleWhen {
    At(DateTime<Utc>),
    Expr(String),
}

impl From<DateTime<Utc>> for ScheduleWhen {
    fn from(at: DateTime<Utc>) -> Self {
        ScheduleWhen::At(at)
    }
}

impl From<&str> for ScheduleWhen {
    fn from(expr: &str) -> Self {
        ScheduleWhen::Expr(expr.to_string())
    }
}

impl From<String> for ScheduleWhen {
    fn from(expr: String) -> Self {
        ScheduleWhen::Expr(expr)
    }
}

impl fmt::Display for ScheduleWhen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleWhen::At(at) => write!(f, "{}", at.to_rfc3339()),
            ScheduleWhen::Expr(expr) => f.write_str(expr),
        }
    }
}

/// One job name or a list of names sharing a trigger.
///
/// The engine accepts both shapes and the distinction is observable in its
/// call log: deferred absolute schedules are issued per name while grouped
/// expressions carry the full list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobNames {
    One(String),
    Many(Vec<String>),
}

impl JobNames {
    /// Number of names carried.
    pub fn len(&self) -> usize {
        match self {
            JobNames::One(_) => 1,
            JobNames::Many(names) => names.len(),
        }
    }

    /// True when no name is carried (an empty list).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over the carried names.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let names: Vec<&str> = match self {
            JobNames::One(name) => vec![name.as_str()],
            JobNames::Many(names) => names.iter().map(String::as_str).collect(),
        };
        names.into_iter()
    }
}

impl From<&str> for JobNames {
    fn from(name: &str) -> Self {
        JobNames::One(name.to_string())
    }
}

impl From<String> for JobNames {
    fn from(name: String) -> Self {
        JobNames::One(name)
    }
}

impl From<Vec<String>> for JobNames {
    fn from(names: Vec<String>) -> Self {
        JobNames::Many(names)
    }
}

impl fmt::Display for JobNames {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobNames::One(name) => f.write_str(name),
            JobNames::Many(names) => f.write_str(&names.join(", ")),
        }
    }
}

/// Typed filter describing which persisted jobs an operation targets.
///
/// All fields are optional; an empty query matches every job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobQuery {
    /// Match jobs registered under this name.
    #[serde(default)]
    pub name: Option<String>,

    /// Match jobs with this exact recurrence expression.
    #[serde(default)]
    pub every: Option<String>,

    /// Match jobs by their disabled flag.
    #[serde(default)]
    pub disabled: Option<bool>,
}

impl JobQuery {
    /// Query selecting jobs by name only.
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }
}

/// Opaque reference to a scheduled job instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobHandle(Uuid);

impl JobHandle {
    /// Mint a fresh handle.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying id.
    pub fn id(&self) -> Uuid {
        self.0
    }
}

impl Default for JobHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
