//! Prelude module for convenient imports.
//!
//! This module re-exports commonly used types for ergonomic imports:
//!
//! ```rust
//! use revend_automation::prelude::*;
//! ```

pub use crate::definition::{
    ActionDef, Automation, AutomationId, AutomationMetadata, BranchLabel, CompareOp, ConditionDef,
    CreateTicketAction, DelayDef, DelayUnit, Edge, FieldCondition, LogicOperator, Node, NodeId,
    NodeKind, SendNotificationAction, TagAction, TransitionStatusAction, TriggerDef,
    UpdateFieldAction,
};
pub use crate::engine::{
    ActionDispatcher, ActionOutcome, AutomationRun, Continuation, ContinuationId, DelayScheduler,
    DispatchReport, Engine, EngineConfig, StepOutcome, TimerScheduler, WalkOutcome, WalkResult,
    WalkStep, Walker,
};
pub use crate::error::{AutomationError, AutomationResult};
pub use crate::graph::AutomationGraph;
pub use crate::service::AutomationService;
pub use crate::store::{AutomationStore, MemoryAutomationStore};
