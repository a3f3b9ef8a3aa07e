//! Call-recording mock engine for testing.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

use jobflow_types::{
    JobHandle, JobHandler, JobNames, JobOptions, JobQuery, RunEveryOptions, ScheduleWhen,
};

use crate::adapter::{ready_channel, Engine, ReadyNotifier, ReadySignal};
use crate::EngineError;

/// One recorded engine call, including the exact name shape it carried.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    DefineHandler {
        name: String,
        options: Option<JobOptions>,
    },
    ScheduleRecurring {
        interval: String,
        names: JobNames,
        data: Option<Value>,
        options: Option<RunEveryOptions>,
    },
    ScheduleOnce {
        when: ScheduleWhen,
        names: JobNames,
        data: Option<Value>,
    },
    RunImmediately {
        name: String,
        data: Option<Value>,
    },
    SetEnabled {
        query: JobQuery,
    },
    SetDisabled {
        query: JobQuery,
    },
    Remove {
        query: JobQuery,
    },
    Start,
    Stop,
}

/// In-memory engine double.
///
/// Records every call in order, returns one fixed [`JobHandle`] for all
/// successful scheduling calls, and lets tests inject failures per job name
/// and drive readiness and error events by hand.
pub struct MockEngine {
    calls: Mutex<Vec<EngineCall>>,
    handlers: Mutex<HashMap<String, JobHandler>>,
    handle: JobHandle,
    fail_on: Mutex<HashMap<String, String>>,
    matched: Mutex<HashSet<String>>,
    errors_tx: broadcast::Sender<EngineError>,
    notifier: Mutex<ReadyNotifier>,
    signal: Mutex<Option<ReadySignal>>,
}

impl MockEngine {
    pub fn new() -> Self {
        let (notifier, signal) = ready_channel();
        let (errors_tx, _) = broadcast::channel(16);
        Self {
            calls: Mutex::new(Vec::new()),
            handlers: Mutex::new(HashMap::new()),
            handle: JobHandle::new(),
            fail_on: Mutex::new(HashMap::new()),
            matched: Mutex::new(HashSet::new()),
            errors_tx,
            notifier: Mutex::new(notifier),
            signal: Mutex::new(Some(signal)),
        }
    }

    /// The handle every successful scheduling call returns.
    pub fn handle(&self) -> JobHandle {
        self.handle
    }

    /// Snapshot of the recorded calls, in order.
    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Make scheduling calls carrying `name` fail with `message`.
    pub fn fail_with(&self, name: impl Into<String>, message: impl Into<String>) {
        self.fail_on
            .lock()
            .unwrap()
            .insert(name.into(), message.into());
    }

    /// Seed a persisted job so enable/disable/remove queries match it.
    pub fn add_matching_job(&self, name: impl Into<String>) {
        self.matched.lock().unwrap().insert(name.into());
    }

    /// Fire the readiness transition. Returns true the first time only.
    pub fn fire_ready(&self) -> bool {
        self.notifier.lock().unwrap().notify()
    }

    /// Emit an asynchronous engine error event.
    pub fn emit_error(&self, err: EngineError) {
        let _ = self.errors_tx.send(err);
    }

    /// The handler currently registered for `name`, if any.
    pub fn handler_for(&self, name: &str) -> Option<JobHandler> {
        self.handlers.lock().unwrap().get(name).cloned()
    }

    fn record(&self, call: EngineCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn failure_for(&self, names: &JobNames) -> Option<EngineError> {
        let fail_on = self.fail_on.lock().unwrap();
        names
            .iter()
            .find_map(|name| fail_on.get(name))
            .map(|message| EngineError::Rejected(message.clone()))
    }

    fn count_matching(&self, query: &JobQuery) -> u64 {
        let matched = self.matched.lock().unwrap();
        match &query.name {
            Some(name) => u64::from(matched.contains(name)),
            None => matched.len() as u64,
        }
    }
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Engine for MockEngine {
    async fn define_handler(
        &self,
        name: &str,
        options: Option<JobOptions>,
        handler: JobHandler,
    ) -> Result<(), EngineError> {
        self.record(EngineCall::DefineHandler {
            name: name.to_string(),
            options,
        });
        // Last registration wins.
        self.handlers
            .lock()
            .unwrap()
            .insert(name.to_string(), handler);
        Ok(())
    }

    async fn schedule_recurring(
        &self,
        interval: &str,
        names: JobNames,
        data: Option<Value>,
        options: Option<RunEveryOptions>,
    ) -> Result<JobHandle, EngineError> {
        let failure = self.failure_for(&names);
        self.record(EngineCall::ScheduleRecurring {
            interval: interval.to_string(),
            names,
            data,
            options,
        });
        match failure {
            Some(err) => Err(err),
            None => Ok(self.handle),
        }
    }

    async fn schedule_once(
        &self,
        when: ScheduleWhen,
        names: JobNames,
        data: Option<Value>,
    ) -> Result<JobHandle, EngineError> {
        let failure = self.failure_for(&names);
        self.record(EngineCall::ScheduleOnce { when, names, data });
        match failure {
            Some(err) => Err(err),
            None => Ok(self.handle),
        }
    }

    async fn run_immediately(
        &self,
        name: &str,
        data: Option<Value>,
    ) -> Result<JobHandle, EngineError> {
        let failure = self.failure_for(&JobNames::One(name.to_string()));
        self.record(EngineCall::RunImmediately {
            name: name.to_string(),
            data,
        });
        match failure {
            Some(err) => Err(err),
            None => Ok(self.handle),
        }
    }

    async fn set_enabled(&self, query: JobQuery) -> Result<u64, EngineError> {
        let count = self.count_matching(&query);
        self.record(EngineCall::SetEnabled { query });
        Ok(count)
    }

    async fn set_disabled(&self, query: JobQuery) -> Result<u64, EngineError> {
        let count = self.count_matching(&query);
        self.record(EngineCall::SetDisabled { query });
        Ok(count)
    }

    async fn remove(&self, query: JobQuery) -> Result<u64, EngineError> {
        let removed = {
            let mut matched = self.matched.lock().unwrap();
            match &query.name {
                Some(name) => u64::from(matched.remove(name)),
                None => {
                    let count = matched.len() as u64;
                    matched.clear();
                    count
                }
            }
        };
        self.record(EngineCall::Remove { query });
        Ok(removed)
    }

    fn subscribe_errors(&self) -> broadcast::Receiver<EngineError> {
        self.errors_tx.subscribe()
    }

    fn ready_signal(&self) -> ReadySignal {
        self.signal
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(ReadySignal::never)
    }

    async fn start(&self) -> Result<(), EngineError> {
        self.record(EngineCall::Start);
        Ok(())
    }

    async fn stop(&self) -> Result<(), EngineError> {
        self.record(EngineCall::Stop);
        Ok(())
    }
}
