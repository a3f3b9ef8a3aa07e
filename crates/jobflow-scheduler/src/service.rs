//! The job service: construction-time registration, readiness-gated drain,
//! lifecycle bracketing, and the runtime control plane.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use jobflow_engine::{Engine, EngineError};
use jobflow_types::{
    JobDeclaration, JobHandle, JobNames, JobQuery, RunEveryOptions, ScheduleWhen,
};

use crate::applier::DeferredApplier;
use crate::pending::PendingTriggers;
use crate::validate;
use crate::{ControlPlaneError, ServiceConfig, ServiceError};

/// Facade over a scheduling engine.
///
/// Construction consumes the host's job declarations: each valid declaration
/// gets its handler registered with the engine immediately, and its triggers
/// parked until the engine's one-time readiness signal, at which point the
/// whole aggregated batch is applied exactly once. After construction the
/// service answers ad-hoc control-plane requests; those go straight to the
/// engine, each as one short-lived call, safe to issue concurrently.
pub struct JobService {
    engine: Arc<dyn Engine>,
    config: ServiceConfig,
    shutdown: CancellationToken,
    is_running: AtomicBool,
    applied_rx: watch::Receiver<bool>,
    drain_task: Mutex<Option<JoinHandle<()>>>,
    forward_task: Mutex<Option<JoinHandle<()>>>,
}

impl JobService {
    /// Register `jobs` with `engine` and arm the deferred trigger drain.
    ///
    /// Declarations failing validation are skipped with a warning; a failing
    /// `define_handler` call is surfaced as-is (no retry).
    pub async fn new(
        engine: Arc<dyn Engine>,
        config: ServiceConfig,
        jobs: Vec<JobDeclaration>,
    ) -> Result<Self, ServiceError> {
        let shutdown = CancellationToken::new();

        let forward_task = if config.forward_engine_errors {
            Some(Self::spawn_error_forwarder(
                engine.subscribe_errors(),
                shutdown.clone(),
            ))
        } else {
            None
        };

        let pending = match Self::register_declarations(engine.as_ref(), jobs).await {
            Ok(pending) => pending,
            Err(err) => {
                shutdown.cancel();
                return Err(err.into());
            }
        };

        if !pending.is_empty() {
            debug!("deferred trigger registrations armed");
        }

        let (applied_tx, applied_rx) = watch::channel(false);
        let ready = engine.ready_signal();
        let drain_engine = engine.clone();
        let token = shutdown.clone();
        let drain_task = tokio::spawn(async move {
            let mut applier = DeferredApplier::new(pending);
            tokio::select! {
                _ = token.cancelled() => return,
                _ = ready.wait() => {}
            }
            debug!("engine is ready");
            applier.apply(drain_engine.as_ref()).await;
            let _ = applied_tx.send(true);
        });

        Ok(Self {
            engine,
            config,
            shutdown,
            is_running: AtomicBool::new(false),
            applied_rx,
            drain_task: Mutex::new(Some(drain_task)),
            forward_task: Mutex::new(forward_task),
        })
    }

    /// Validate each declaration in order; register the handler for each
    /// valid one, then record its triggers. Handler registration always
    /// precedes trigger aggregation for the same declaration.
    async fn register_declarations(
        engine: &dyn Engine,
        jobs: Vec<JobDeclaration>,
    ) -> Result<PendingTriggers, EngineError> {
        let mut pending = PendingTriggers::new();
        for decl in jobs {
            if let Err(reason) = validate::validate_declaration(&decl) {
                warn!(job = %decl.name, %reason, "skipping invalid job declaration");
                continue;
            }
            let JobDeclaration {
                name,
                handler,
                options,
                schedule,
                every,
            } = decl;

            debug!(job = %name, "defining job handler");
            engine.define_handler(&name, options, handler).await?;

            match schedule {
                Some(ScheduleWhen::At(at)) => pending.add_point(at, &name),
                Some(ScheduleWhen::Expr(expr)) => pending.add_expression(&expr, &name),
                None => {}
            }
            if let Some(every) = every {
                pending.add_interval(&every, &name);
            }
        }
        Ok(pending)
    }

    /// Forward asynchronous engine errors to the log channel. No caller is
    /// waiting on these, so they never surface through a result.
    fn spawn_error_forwarder(
        mut events: tokio::sync::broadcast::Receiver<EngineError>,
        token: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    event = events.recv() => match event {
                        Ok(err) => error!(error = %err, "engine error"),
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "engine error events lagged");
                        }
                        Err(RecvError::Closed) => break,
                    },
                }
            }
        })
    }

    /// Start the engine. Call after construction, once.
    pub async fn start(&self) -> Result<(), ServiceError> {
        if self.is_running.swap(true, Ordering::SeqCst) {
            return Err(ServiceError::AlreadyRunning);
        }
        self.engine.start().await?;
        info!("job service started");
        Ok(())
    }

    /// Stop the engine and cancel a still-pending drain.
    ///
    /// Waits up to `shutdown_timeout_secs` for an in-flight drain to finish
    /// before stopping the engine.
    pub async fn stop(&self) -> Result<(), ServiceError> {
        if !self.is_running.swap(false, Ordering::SeqCst) {
            return Err(ServiceError::NotRunning);
        }
        self.shutdown.cancel();

        let drain = self.drain_task.lock().unwrap().take();
        if let Some(handle) = drain {
            let timeout = Duration::from_secs(self.config.shutdown_timeout_secs);
            if tokio::time::timeout(timeout, handle).await.is_err() {
                warn!("timed out waiting for deferred registration drain");
            }
        }
        if let Some(handle) = self.forward_task.lock().unwrap().take() {
            handle.abort();
        }

        self.engine.stop().await?;
        info!("job service stopped");
        Ok(())
    }

    /// Whether `start` has been called without a matching `stop`.
    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::SeqCst)
    }

    /// Wait until the deferred registrations have been applied.
    ///
    /// Also returns when the service shuts down before the engine ever
    /// became ready, in which case nothing was applied.
    pub async fn applied(&self) {
        let mut rx = self.applied_rx.clone();
        let _ = rx.wait_for(|applied| *applied).await;
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Register a recurring trigger for one or more job names.
    ///
    /// Success returns the engine's opaque handle unchanged; an engine
    /// rejection comes back with code `RUNEVERY_ERROR` and the engine's
    /// message preserved.
    pub async fn run_every(
        &self,
        interval: &str,
        names: impl Into<JobNames>,
        data: Option<Value>,
        options: Option<RunEveryOptions>,
    ) -> Result<JobHandle, ControlPlaneError> {
        let names = names.into();
        validate::require_expression("interval", interval)?;
        validate::require_names(&names)?;
        if let Some(options) = &options {
            validate::require_timezone(options)?;
        }

        debug!(jobs = %names, %interval, "run job every interval");
        self.engine
            .schedule_recurring(interval, names, data, options)
            .await
            .map_err(|err| ControlPlaneError::RunEvery(err.to_string()))
    }

    /// Schedule one or more job names to run once at `when`.
    pub async fn run_at(
        &self,
        when: impl Into<ScheduleWhen>,
        names: impl Into<JobNames>,
        data: Option<Value>,
    ) -> Result<JobHandle, ControlPlaneError> {
        let when = when.into();
        let names = names.into();
        if let ScheduleWhen::Expr(expr) = &when {
            validate::require_expression("schedule", expr)?;
        }
        validate::require_names(&names)?;

        debug!(jobs = %names, %when, "run job at");
        self.engine
            .schedule_once(when, names, data)
            .await
            .map_err(|err| ControlPlaneError::RunAt(err.to_string()))
    }

    /// Queue a job for immediate execution.
    pub async fn run_now(
        &self,
        name: &str,
        data: Option<Value>,
    ) -> Result<JobHandle, ControlPlaneError> {
        validate::require_name(name)?;

        debug!(job = %name, "run job now");
        self.engine
            .run_immediately(name, data)
            .await
            .map_err(|err| ControlPlaneError::RunNow(err.to_string()))
    }

    /// Disable jobs registered under `name`, preventing them from running.
    ///
    /// The engine's count passes through unwrapped; zero affected is a
    /// normal outcome, not an error.
    pub async fn disable(&self, name: &str) -> Result<u64, EngineError> {
        debug!(job = %name, "disable job");
        self.engine.set_disabled(JobQuery::by_name(name)).await
    }

    /// Enable jobs registered under `name`.
    pub async fn enable(&self, name: &str) -> Result<u64, EngineError> {
        debug!(job = %name, "enable job");
        self.engine.set_enabled(JobQuery::by_name(name)).await
    }

    /// Remove persisted jobs matching `query`. Returns the removed count.
    pub async fn cancel(&self, query: JobQuery) -> Result<u64, EngineError> {
        debug!(?query, "cancel jobs");
        self.engine.remove(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use jobflow_engine::{EngineCall, MockEngine};
    use jobflow_types::{handler, JobOptions};

    fn decl(name: &str) -> JobDeclaration {
        JobDeclaration::new(name, handler(|_ctx| async { Ok(()) }))
    }

    async fn service_with(
        engine: &Arc<MockEngine>,
        jobs: Vec<JobDeclaration>,
    ) -> JobService {
        JobService::new(engine.clone(), ServiceConfig::default(), jobs)
            .await
            .unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_defines_handlers_in_declaration_order() {
        let engine = Arc::new(MockEngine::new());
        let options = JobOptions {
            concurrency: Some(2),
            ..Default::default()
        };

        let _service = service_with(
            &engine,
            vec![decl("first"), decl("second").with_options(options.clone())],
        )
        .await;

        let calls = engine.calls();
        assert_eq!(
            calls[0],
            EngineCall::DefineHandler {
                name: "first".to_string(),
                options: None,
            }
        );
        assert_eq!(
            calls[1],
            EngineCall::DefineHandler {
                name: "second".to_string(),
                options: Some(options),
            }
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_invalid_declaration_is_excluded() {
        let engine = Arc::new(MockEngine::new());

        let service = service_with(
            &engine,
            vec![decl("").with_every("* * * * *"), decl("valid")],
        )
        .await;

        engine.fire_ready();
        service.applied().await;

        let calls = engine.calls();
        // Only the valid declaration reached the engine, and nothing was
        // aggregated for the invalid one.
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0],
            EngineCall::DefineHandler {
                name: "valid".to_string(),
                options: None,
            }
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_deferred_schedules_drain_on_ready() {
        let engine = Arc::new(MockEngine::new());
        let at = Utc::now();

        let service = service_with(
            &engine,
            vec![
                decl("mail-welcome").with_schedule("in 1 minute"),
                decl("mail-report").with_schedule(at),
                decl("mail-digest").with_schedule("in 1 minute"),
            ],
        )
        .await;

        // Nothing drains before readiness.
        assert_eq!(engine.calls().len(), 3);

        engine.fire_ready();
        service.applied().await;

        let calls = engine.calls();
        // Absolute point first, then one combined expression call.
        assert_eq!(
            calls[3],
            EngineCall::ScheduleOnce {
                when: ScheduleWhen::At(at),
                names: JobNames::One("mail-report".to_string()),
                data: None,
            }
        );
        assert_eq!(
            calls[4],
            EngineCall::ScheduleOnce {
                when: ScheduleWhen::Expr("in 1 minute".to_string()),
                names: JobNames::Many(vec![
                    "mail-welcome".to_string(),
                    "mail-digest".to_string()
                ]),
                data: None,
            }
        );
        assert_eq!(calls.len(), 5);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_every_groups_share_one_call() {
        let engine = Arc::new(MockEngine::new());

        let service = service_with(
            &engine,
            vec![
                decl("tick").with_every("* * * * *"),
                decl("tock").with_every("* * * * *"),
            ],
        )
        .await;

        engine.fire_ready();
        service.applied().await;

        let calls = engine.calls();
        assert_eq!(
            calls[2],
            EngineCall::ScheduleRecurring {
                interval: "* * * * *".to_string(),
                names: JobNames::Many(vec!["tick".to_string(), "tock".to_string()]),
                data: None,
                options: None,
            }
        );
        assert_eq!(calls.len(), 3);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_duplicate_readiness_signal_is_noop() {
        let engine = Arc::new(MockEngine::new());

        let service = service_with(&engine, vec![decl("tick").with_every("* * * * *")]).await;

        assert!(engine.fire_ready());
        service.applied().await;
        let after_first = engine.calls().len();

        assert!(!engine.fire_ready());
        service.applied().await;
        assert_eq!(engine.calls().len(), after_first);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_run_every_returns_engine_handle() {
        let engine = Arc::new(MockEngine::new());
        let service = service_with(&engine, vec![decl("log")]).await;

        let handle = service
            .run_every(
                "* * * * *",
                "log",
                Some(serde_json::json!({ "test": true })),
                None,
            )
            .await
            .unwrap();

        assert_eq!(handle, engine.handle());
        assert_eq!(
            engine.calls().last().unwrap(),
            &EngineCall::ScheduleRecurring {
                interval: "* * * * *".to_string(),
                names: JobNames::One("log".to_string()),
                data: Some(serde_json::json!({ "test": true })),
                options: None,
            }
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_run_every_wraps_engine_rejection() {
        let engine = Arc::new(MockEngine::new());
        engine.fail_with("log", "boom");
        let service = service_with(&engine, vec![decl("log")]).await;

        let err = service.run_every("* * * * *", "log", None, None).await.unwrap_err();

        assert_eq!(err.code(), "RUNEVERY_ERROR");
        assert_eq!(err.message(), "boom");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_run_every_rejects_bad_input_before_engine() {
        let engine = Arc::new(MockEngine::new());
        let service = service_with(&engine, vec![]).await;
        let baseline = engine.calls().len();

        let empty_names = service
            .run_every("* * * * *", Vec::<String>::new(), None, None)
            .await
            .unwrap_err();
        assert_eq!(empty_names.code(), "VALIDATION_ERROR");

        let bad_tz = service
            .run_every(
                "* * * * *",
                "log",
                None,
                Some(RunEveryOptions {
                    timezone: Some("Nowhere/Nothing".to_string()),
                    ..Default::default()
                }),
            )
            .await
            .unwrap_err();
        assert_eq!(bad_tz.code(), "VALIDATION_ERROR");

        assert_eq!(engine.calls().len(), baseline);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_run_at_accepts_expression_date_and_list() {
        let engine = Arc::new(MockEngine::new());
        let service = service_with(&engine, vec![decl("log")]).await;
        let at = Utc::now();

        service
            .run_at("in 1 minute", "log", Some(serde_json::json!({})))
            .await
            .unwrap();
        service.run_at(at, "log", None).await.unwrap();
        service
            .run_at("* * * * *", vec!["log".to_string()], None)
            .await
            .unwrap();

        let calls = engine.calls();
        let n = calls.len();
        assert_eq!(
            calls[n - 3],
            EngineCall::ScheduleOnce {
                when: ScheduleWhen::Expr("in 1 minute".to_string()),
                names: JobNames::One("log".to_string()),
                data: Some(serde_json::json!({})),
            }
        );
        assert_eq!(
            calls[n - 2],
            EngineCall::ScheduleOnce {
                when: ScheduleWhen::At(at),
                names: JobNames::One("log".to_string()),
                data: None,
            }
        );
        assert_eq!(
            calls[n - 1],
            EngineCall::ScheduleOnce {
                when: ScheduleWhen::Expr("* * * * *".to_string()),
                names: JobNames::Many(vec!["log".to_string()]),
                data: None,
            }
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_run_at_wraps_engine_rejection() {
        let engine = Arc::new(MockEngine::new());
        engine.fail_with("log", "boom");
        let service = service_with(&engine, vec![decl("log")]).await;

        let err = service.run_at("in 1 minute", "log", None).await.unwrap_err();
        assert_eq!(err.code(), "RUNAT_ERROR");
        assert_eq!(err.message(), "boom");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_run_now() {
        let engine = Arc::new(MockEngine::new());
        let service = service_with(&engine, vec![decl("log")]).await;

        let handle = service.run_now("log", None).await.unwrap();
        assert_eq!(handle, engine.handle());

        engine.fail_with("log", "boom");
        let err = service.run_now("log", None).await.unwrap_err();
        assert_eq!(err.code(), "RUNNOW_ERROR");
        assert_eq!(err.message(), "boom");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_enable_disable_pass_counts_through() {
        let engine = Arc::new(MockEngine::new());
        engine.add_matching_job("known");
        let service = service_with(&engine, vec![]).await;

        assert_eq!(service.disable("known").await.unwrap(), 1);
        assert_eq!(service.disable("unknown").await.unwrap(), 0);
        assert_eq!(service.enable("known").await.unwrap(), 1);
        assert_eq!(service.enable("unknown").await.unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_cancel_returns_removed_count() {
        let engine = Arc::new(MockEngine::new());
        engine.add_matching_job("stale");
        let service = service_with(&engine, vec![]).await;

        assert_eq!(service.cancel(JobQuery::by_name("stale")).await.unwrap(), 1);
        assert_eq!(service.cancel(JobQuery::by_name("stale")).await.unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_lifecycle_start_stop() {
        let engine = Arc::new(MockEngine::new());
        let service = service_with(&engine, vec![]).await;

        assert!(!service.is_running());
        service.start().await.unwrap();
        assert!(service.is_running());

        let again = service.start().await;
        assert!(matches!(again, Err(ServiceError::AlreadyRunning)));

        service.stop().await.unwrap();
        assert!(!service.is_running());

        let again = service.stop().await;
        assert!(matches!(again, Err(ServiceError::NotRunning)));

        let calls = engine.calls();
        assert!(calls.contains(&EngineCall::Start));
        assert!(calls.contains(&EngineCall::Stop));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_stop_cancels_unfired_drain() {
        let engine = Arc::new(MockEngine::new());
        let service = service_with(
            &engine,
            vec![decl("never-applied").with_every("* * * * *")],
        )
        .await;

        service.start().await.unwrap();
        service.stop().await.unwrap();

        // Readiness never fired, so no trigger registration was issued.
        let calls = engine.calls();
        assert!(!calls
            .iter()
            .any(|call| matches!(call, EngineCall::ScheduleRecurring { .. })));

        // applied() must not hang once the drain is cancelled.
        service.applied().await;
    }
}
