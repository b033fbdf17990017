#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod definition;
pub mod engine;
mod error;
mod graph;
mod service;
pub mod store;

#[doc(hidden)]
pub mod prelude;

pub use error::{AutomationError, AutomationResult};
pub use graph::AutomationGraph;
pub use service::AutomationService;

/// Tracing target for automation operations.
pub const TRACING_TARGET: &str = "revend_automation";
