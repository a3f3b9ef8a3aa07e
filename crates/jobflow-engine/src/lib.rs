//! # jobflow-engine
//!
//! The seam between the jobflow facade and the external scheduling engine.
//!
//! The facade never touches engine internals (persistence, locking, cron
//! parsing); it only calls the [`Engine`] trait defined here. The crate also
//! ships [`MockEngine`], a call-recording test double used by the facade's
//! own tests and by hosts that want to test job wiring without a backing
//! store.

mod adapter;
mod error;
mod mock;

pub use adapter::{ready_channel, Engine, ReadyNotifier, ReadySignal};
pub use error::EngineError;
pub use mock::{EngineCall, MockEngine};
