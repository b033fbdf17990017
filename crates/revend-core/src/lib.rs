#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

//! # Revend Core
//!
//! This crate provides the shared domain vocabulary for the revend backend.
//! It defines tenant and entity identifiers, domain events with their field
//! snapshots, and the collaborator traits through which the automation engine
//! performs side effects, without depending on any concrete implementation.

mod entity;
mod error;
mod event;
mod snapshot;
mod tenant;

pub mod effect;

#[cfg(feature = "test-utils")]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub mod mock;

pub use entity::{EntityId, EntityKind, EntityRef, NewTicket};
pub use error::{BoxedError, Error, ErrorKind, Result};
pub use event::{DomainEvent, EventKind};
pub use snapshot::EventSnapshot;
pub use tenant::{ActorId, TenantId};
