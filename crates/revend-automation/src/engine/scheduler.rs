//! Delay scheduling for deferred walk continuations.
//!
//! A delay node suspends a walk. The walker packages everything needed to
//! resume into a [`Continuation`] and hands it to a [`DelayScheduler`];
//! once the delay elapses the continuation comes back to the engine, which
//! resumes the walk at the delay node's successor with the *original*
//! event snapshot.

use std::str::FromStr;
use std::time::Duration;

use derive_more::{Debug, Display, From, Into};
use jiff::{SignedDuration, Timestamp};
use revend_core::DomainEvent;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::TRACING_TARGET;
use crate::definition::{AutomationId, NodeId};
use crate::error::AutomationResult;

/// Unique identifier for a scheduled continuation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Debug, Display, From, Into)]
#[debug("{_0}")]
#[display("{_0}")]
#[serde(transparent)]
pub struct ContinuationId(Uuid);

impl ContinuationId {
    /// Creates a new random continuation ID.
    #[inline]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a continuation ID from an existing UUID.
    #[inline]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[inline]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ContinuationId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for ContinuationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

impl AsRef<Uuid> for ContinuationId {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

/// A suspended walk, captured at a delay node.
///
/// The continuation carries the event exactly as it was dispatched, so a
/// resumed walk evaluates against the snapshot taken when the event fired,
/// not against current entity state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Continuation {
    /// Unique ID of this continuation.
    pub id: ContinuationId,
    /// The automation the suspended walk belongs to.
    pub automation_id: AutomationId,
    /// The node the walk resumes at: the delay node's successor.
    pub resume_node: NodeId,
    /// The original event, snapshot included.
    pub event: DomainEvent,
    /// When the walk becomes due.
    pub resume_at: Timestamp,
}

impl Continuation {
    /// Captures a suspended walk due after the given delay.
    pub fn new(
        automation_id: AutomationId,
        resume_node: NodeId,
        event: DomainEvent,
        delay: Duration,
    ) -> Self {
        let delay = SignedDuration::try_from(delay).unwrap_or(SignedDuration::MAX);
        Self {
            id: ContinuationId::new(),
            automation_id,
            resume_node,
            event,
            resume_at: Timestamp::now()
                .saturating_add(delay)
                .unwrap_or(Timestamp::MAX),
        }
    }

    /// Returns whether the continuation is due.
    pub fn is_ready(&self) -> bool {
        Timestamp::now() >= self.resume_at
    }

    /// Returns the time left until the continuation is due.
    pub fn delay_remaining(&self) -> Duration {
        let remaining = self.resume_at.duration_since(Timestamp::now());
        Duration::try_from(remaining).unwrap_or(Duration::ZERO)
    }
}

/// Scheduling of deferred walk continuations.
///
/// Scheduling is best-effort: implementations are not required to survive
/// a process restart, and accepting a continuation is no guarantee it will
/// come due.
#[async_trait::async_trait]
pub trait DelayScheduler: Send + Sync {
    /// Accepts a continuation for later resumption.
    async fn schedule(&self, continuation: Continuation) -> AutomationResult<ContinuationId>;
}

/// In-process timer-backed [`DelayScheduler`].
///
/// Each accepted continuation gets its own timer task. When the timer
/// elapses the continuation is pushed onto the channel handed out by
/// [`TimerScheduler::new`]; cancelling the token drops all pending timers
/// without firing them. Continuations do not survive a restart.
#[derive(Debug, Clone)]
pub struct TimerScheduler {
    tx: mpsc::UnboundedSender<Continuation>,
    cancel_token: CancellationToken,
}

impl TimerScheduler {
    /// Creates a scheduler and the channel its due continuations arrive on.
    pub fn new(cancel_token: CancellationToken) -> (Self, mpsc::UnboundedReceiver<Continuation>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, cancel_token }, rx)
    }
}

#[async_trait::async_trait]
impl DelayScheduler for TimerScheduler {
    async fn schedule(&self, continuation: Continuation) -> AutomationResult<ContinuationId> {
        let id = continuation.id;
        let delay = continuation.delay_remaining();
        tracing::info!(
            target: TRACING_TARGET,
            continuation_id = %id,
            automation_id = %continuation.automation_id,
            resume_node = %continuation.resume_node,
            resume_in = ?delay,
            "Scheduled delayed continuation"
        );

        let tx = self.tx.clone();
        let cancel_token = self.cancel_token.clone();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                () = cancel_token.cancelled() => {
                    tracing::debug!(
                        target: TRACING_TARGET,
                        continuation_id = %continuation.id,
                        "Dropped pending continuation on shutdown"
                    );
                }
                () = tokio::time::sleep(delay) => {
                    if tx.send(continuation).is_err() {
                        tracing::warn!(
                            target: TRACING_TARGET,
                            continuation_id = %id,
                            "Continuation came due but the receiver is gone"
                        );
                    }
                }
            }
        });

        Ok(id)
    }
}
