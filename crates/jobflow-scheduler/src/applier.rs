//! One-shot application of the aggregated triggers.

use tracing::{debug, warn};

use jobflow_engine::Engine;
use jobflow_types::{JobNames, ScheduleWhen};

use crate::pending::PendingTriggers;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ApplierState {
    AwaitingReadiness,
    /// Terminal. The pending collections have been drained.
    Applied,
}

/// Drains [`PendingTriggers`] into batched engine calls, once.
///
/// The readiness subscription that drives `apply` is one-shot by
/// construction; the state guard here is a safety net so even a duplicate
/// invocation cannot re-issue registrations.
///
/// Drain order is fixed: absolute points first, then expression-keyed
/// schedule groups, then interval groups. A failing call is logged and the
/// drain continues; partial scheduling beats none.
pub(crate) struct DeferredApplier {
    state: ApplierState,
    pending: PendingTriggers,
}

impl DeferredApplier {
    pub(crate) fn new(pending: PendingTriggers) -> Self {
        Self {
            state: ApplierState::AwaitingReadiness,
            pending,
        }
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> ApplierState {
        self.state
    }

    pub(crate) async fn apply(&mut self, engine: &dyn Engine) {
        if self.state == ApplierState::Applied {
            return;
        }
        self.state = ApplierState::Applied;
        let pending = std::mem::take(&mut self.pending);

        for (at, name) in pending.at_points {
            debug!(job = %name, at = %at, "applying deferred schedule");
            if let Err(err) = engine
                .schedule_once(ScheduleWhen::At(at), JobNames::One(name.clone()), None)
                .await
            {
                warn!(job = %name, error = %err, "deferred schedule failed");
            }
        }

        for (expr, names) in pending.at_exprs {
            let group = JobNames::Many(names);
            debug!(jobs = %group, when = %expr, "applying deferred schedule group");
            if let Err(err) = engine
                .schedule_once(ScheduleWhen::Expr(expr.clone()), group, None)
                .await
            {
                warn!(when = %expr, error = %err, "deferred schedule group failed");
            }
        }

        for (interval, names) in pending.every {
            let group = JobNames::Many(names);
            debug!(jobs = %group, interval = %interval, "applying deferred recurrence group");
            if let Err(err) = engine
                .schedule_recurring(&interval, group, None, None)
                .await
            {
                warn!(interval = %interval, error = %err, "deferred recurrence group failed");
            }
        }
    }
}
