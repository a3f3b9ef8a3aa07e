//! Job declarations and handler callables.
//!
//! A `JobDeclaration` describes one named background job: the callable the
//! engine dispatches to, optional execution options, and optional recurrence
//! triggers. Declarations are built once at host configuration time and
//! consumed during registration.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::{JobOptions, ScheduleWhen};

/// Payload handed to a job handler when a job instance fires.
#[derive(Debug, Clone)]
pub struct JobContext {
    /// Name the job was registered under.
    pub name: String,
    /// Data attached to this job instance, if any.
    pub data: Option<serde_json::Value>,
}

/// Boxed future returned by a job handler.
pub type HandlerFuture = BoxFuture<'static, anyhow::Result<()>>;

/// Type-erased async callable invoked by the engine for each job instance.
///
/// Handlers are shared (`Arc`) so a declaration stays cheap to clone and the
/// same callable can be re-registered under the engine's last-wins semantics.
pub type JobHandler = Arc<dyn Fn(JobContext) -> HandlerFuture + Send + Sync>;

/// Wrap an async closure into a [`JobHandler`].
///
/// ```rust
/// use jobflow_types::handler;
///
/// let h = handler(|ctx| async move {
///     println!("running {}", ctx.name);
///     Ok(())
/// });
/// ```
pub fn handler<F, Fut>(f: F) -> JobHandler
where
    F: Fn(JobContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |ctx| Box::pin(f(ctx)))
}

/// Host-supplied description of one background job.
///
/// `name` is the key the engine uses for handler dispatch. Multiple
/// declarations may intentionally share a name; the engine keeps the last
/// registered handler. `schedule` and `every` attach optional one-shot and
/// recurring triggers that are applied once the engine reports readiness.
#[derive(Clone)]
pub struct JobDeclaration {
    /// Unique dispatch key for the engine.
    pub name: String,
    /// Callable invoked when a job instance fires.
    pub handler: JobHandler,
    /// Execution options forwarded to the engine verbatim.
    pub options: Option<JobOptions>,
    /// One-shot trigger: an absolute point or a textual expression.
    pub schedule: Option<ScheduleWhen>,
    /// Recurrence expression, e.g. a cron-like pattern.
    pub every: Option<String>,
}

impl JobDeclaration {
    /// Create a declaration with just a name and a handler.
    pub fn new(name: impl Into<String>, handler: JobHandler) -> Self {
        Self {
            name: name.into(),
            handler,
            options: None,
            schedule: None,
            every: None,
        }
    }

    /// Attach execution options.
    pub fn with_options(mut self, options: JobOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// Attach a one-shot schedule trigger.
    pub fn with_schedule(mut self, when: impl Into<ScheduleWhen>) -> Self {
        self.schedule = Some(when.into());
        self
    }

    /// Attach a recurrence trigger.
    pub fn with_every(mut self, expression: impl Into<String>) -> Self {
        self.every = Some(expression.into());
        self
    }
}

impl fmt::Debug for JobDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobDeclaration")
            .field("name", &self.name)
            .field("options", &self.options)
            .field("schedule", &self.schedule)
            .field("every", &self.every)
            .field("handler", &"<async fn>")
            .finish()
    }
}
