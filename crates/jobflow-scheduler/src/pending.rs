//! Pending trigger aggregation.
//!
//! During registration every valid declaration drops its triggers here,
//! grouped by the exact text of the trigger expression. Grouping is literal:
//! no normalization, so expressions differing only in whitespace form
//! distinct groups. Insertion order is preserved within and across groups so
//! the later drain reproduces declaration order.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

/// Triggers accumulated before the engine is ready.
///
/// Written by the registration phase only, read by the drain only, dead
/// afterwards.
#[derive(Debug, Default)]
pub(crate) struct PendingTriggers {
    /// Recurrence expression -> job names, in declaration order.
    pub(crate) every: IndexMap<String, Vec<String>>,
    /// Absolute one-shot points, in declaration order.
    pub(crate) at_points: Vec<(DateTime<Utc>, String)>,
    /// Schedule expression -> job names. Distinct namespace from `every`:
    /// the same text means a different thing in each.
    pub(crate) at_exprs: IndexMap<String, Vec<String>>,
}

impl PendingTriggers {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_interval(&mut self, expression: &str, name: &str) {
        self.every
            .entry(expression.to_string())
            .or_default()
            .push(name.to_string());
    }

    pub(crate) fn add_point(&mut self, at: DateTime<Utc>, name: &str) {
        self.at_points.push((at, name.to_string()));
    }

    pub(crate) fn add_expression(&mut self, expression: &str, name: &str) {
        self.at_exprs
            .entry(expression.to_string())
            .or_default()
            .push(name.to_string());
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.every.is_empty() && self.at_points.is_empty() && self.at_exprs.is_empty()
    }
}
