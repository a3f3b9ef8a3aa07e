//! Engine adapter trait and the one-shot readiness signal.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{broadcast, oneshot};

use jobflow_types::{
    JobHandle, JobHandler, JobNames, JobOptions, JobQuery, RunEveryOptions, ScheduleWhen,
};

use crate::EngineError;

/// Contract the facade consumes against an external scheduling engine.
///
/// Implementations own persistence, locking, distributed execution, and
/// trigger parsing. The facade calls this surface and nothing else.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Register a callable for a job name. May be called repeatedly for the
    /// same name; the last registration wins.
    async fn define_handler(
        &self,
        name: &str,
        options: Option<JobOptions>,
        handler: JobHandler,
    ) -> Result<(), EngineError>;

    /// Register a recurring trigger for one or more job names.
    ///
    /// Fails when the engine cannot parse `interval`.
    async fn schedule_recurring(
        &self,
        interval: &str,
        names: JobNames,
        data: Option<Value>,
        options: Option<RunEveryOptions>,
    ) -> Result<JobHandle, EngineError>;

    /// Schedule one or more job names to run once at `when`.
    async fn schedule_once(
        &self,
        when: ScheduleWhen,
        names: JobNames,
        data: Option<Value>,
    ) -> Result<JobHandle, EngineError>;

    /// Queue a single job for immediate execution.
    async fn run_immediately(&self, name: &str, data: Option<Value>)
        -> Result<JobHandle, EngineError>;

    /// Mark matching jobs enabled. Returns the number of jobs affected;
    /// zero is a normal outcome.
    async fn set_enabled(&self, query: JobQuery) -> Result<u64, EngineError>;

    /// Mark matching jobs disabled. Returns the number of jobs affected.
    async fn set_disabled(&self, query: JobQuery) -> Result<u64, EngineError>;

    /// Remove matching persisted jobs. Returns the number removed.
    async fn remove(&self, query: JobQuery) -> Result<u64, EngineError>;

    /// Subscribe to asynchronous error events not tied to any one call
    /// (e.g. background lock contention).
    fn subscribe_errors(&self) -> broadcast::Receiver<EngineError>;

    /// Claim the engine's readiness signal.
    ///
    /// The signal fires at most once ever, when the backing store becomes
    /// usable. It is claimable once; later claims receive a signal that
    /// never fires, so a late subscriber can never observe a second
    /// readiness transition.
    fn ready_signal(&self) -> ReadySignal;

    /// Start timing and executing scheduled jobs.
    async fn start(&self) -> Result<(), EngineError>;

    /// Stop the engine.
    async fn stop(&self) -> Result<(), EngineError>;
}

/// Create a connected notifier/signal pair.
pub fn ready_channel() -> (ReadyNotifier, ReadySignal) {
    let (tx, rx) = oneshot::channel();
    (ReadyNotifier { tx: Some(tx) }, ReadySignal { rx: Some(rx) })
}

/// Receiving half of the readiness handshake.
///
/// `wait` completes when the notifier fires. A signal created with
/// [`ReadySignal::never`], or whose notifier was dropped unfired, pends
/// forever instead of completing.
pub struct ReadySignal {
    rx: Option<oneshot::Receiver<()>>,
}

impl ReadySignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        Self { rx: None }
    }

    /// Wait for the readiness transition.
    pub async fn wait(self) {
        match self.rx {
            Some(rx) => {
                if rx.await.is_err() {
                    // Notifier dropped without firing: readiness never
                    // happened and never will.
                    std::future::pending::<()>().await;
                }
            }
            None => std::future::pending::<()>().await,
        }
    }
}

/// Sending half of the readiness handshake. Firing consumes the sender, so
/// a second `notify` is a no-op.
pub struct ReadyNotifier {
    tx: Option<oneshot::Sender<()>>,
}

impl ReadyNotifier {
    /// Fire the signal. Returns true when this call performed the
    /// transition, false when it already happened or nobody is waiting.
    pub fn notify(&mut self) -> bool {
        match self.tx.take() {
            Some(tx) => tx.send(()).is_ok(),
            None => false,
        }
    }

    /// True once the transition has been fired.
    pub fn is_spent(&self) -> bool {
        self.tx.is_none()
    }
}
