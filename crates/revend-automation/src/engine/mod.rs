//! Automation execution engine.
//!
//! The engine is assembled leaf-first: pure condition evaluation, the
//! action dispatcher over the collaborator traits, the graph walker, the
//! delay scheduler for timed suspensions, and the dispatching [`Engine`]
//! that fans one event out over all matching automations.

mod actions;
mod config;
mod dispatcher;
mod evaluator;
mod scheduler;
mod template;
mod walker;

pub use actions::{ActionDispatcher, ActionOutcome};
pub use config::{EngineConfig, EngineConfigBuilder};
pub use dispatcher::{AutomationRun, DispatchReport, Engine};
pub use evaluator::evaluate;
pub use scheduler::{Continuation, ContinuationId, DelayScheduler, TimerScheduler};
pub use walker::{StepOutcome, WalkOutcome, WalkResult, WalkStep, Walker};
