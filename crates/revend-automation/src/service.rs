//! Embeddable automation service.

use std::fmt;
use std::sync::Arc;

use derive_more::Deref;
use revend_core::effect::{EntityStore, Notifier};
use revend_core::{ActorId, DomainEvent};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::TRACING_TARGET;
use crate::engine::{ActionDispatcher, Continuation, Engine, EngineConfig, TimerScheduler};
use crate::store::AutomationStore;

/// The automation service: an [`Engine`] plus the background worker that
/// resumes delayed walks.
///
/// This service derefs to the underlying [`Engine`], so `dispatch` and
/// `resume` are available directly on it. Emitting code paths should use
/// [`AutomationService::on_domain_event`] instead, which hands the event
/// off without blocking the caller.
#[derive(Deref)]
pub struct AutomationService {
    #[deref]
    engine: Engine,
    cancel_token: CancellationToken,
    resume_worker: JoinHandle<()>,
}

impl fmt::Debug for AutomationService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutomationService")
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

impl AutomationService {
    /// Starts the service over the given store and collaborators.
    ///
    /// Spawns the resume worker onto the current Tokio runtime, so this
    /// must be called from within one.
    #[must_use]
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn AutomationStore>,
        entities: Arc<dyn EntityStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self::build(config, store, ActionDispatcher::new(entities, notifier))
    }

    /// Same as [`AutomationService::new`], with an actor id recorded on
    /// entity writes made by automations.
    #[must_use]
    pub fn with_actor(
        config: EngineConfig,
        store: Arc<dyn AutomationStore>,
        entities: Arc<dyn EntityStore>,
        notifier: Arc<dyn Notifier>,
        actor: ActorId,
    ) -> Self {
        let actions = ActionDispatcher::new(entities, notifier).with_actor(actor);
        Self::build(config, store, actions)
    }

    fn build(
        config: EngineConfig,
        store: Arc<dyn AutomationStore>,
        actions: ActionDispatcher,
    ) -> Self {
        let cancel_token = CancellationToken::new();
        let (scheduler, due) = TimerScheduler::new(cancel_token.child_token());
        let engine = Engine::new(config, store, actions, Arc::new(scheduler));
        let worker = ResumeWorker {
            engine: engine.clone(),
            due,
            cancel_token: cancel_token.clone(),
        };
        let resume_worker = tokio::spawn(worker.run());
        tracing::info!(target: TRACING_TARGET, "Automation service started");
        Self {
            engine,
            cancel_token,
            resume_worker,
        }
    }

    /// Returns a reference to the underlying engine.
    #[must_use]
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Accepts a domain event for automation processing.
    ///
    /// Fire-and-forget: the event is handed to a background dispatch and
    /// this method returns immediately. Emitters must call this only
    /// after the entity write that produced the event has succeeded, so
    /// a rule failure can never undo or block that write.
    pub fn on_domain_event(&self, event: DomainEvent) {
        let engine = self.engine.clone();
        tokio::spawn(async move {
            match engine.dispatch(&event).await {
                Ok(report) if report.is_empty() => {}
                Ok(report) => tracing::debug!(
                    target: TRACING_TARGET,
                    automations = report.runs.len(),
                    failed = report.failed(),
                    "Background dispatch finished"
                ),
                Err(err) => tracing::error!(
                    target: TRACING_TARGET,
                    error = %err,
                    "Background dispatch failed"
                ),
            }
        });
    }

    /// Stops the service.
    ///
    /// Pending delay timers are dropped without firing; their suspended
    /// walks are lost. Dispatches already running are left to finish on
    /// the runtime.
    pub async fn shutdown(self) {
        self.cancel_token.cancel();
        if let Err(err) = self.resume_worker.await {
            tracing::warn!(
                target: TRACING_TARGET,
                error = %err,
                "Resume worker ended abnormally"
            );
        }
        tracing::info!(target: TRACING_TARGET, "Automation service stopped");
    }
}

/// Background worker feeding due continuations back into the engine.
struct ResumeWorker {
    engine: Engine,
    due: mpsc::UnboundedReceiver<Continuation>,
    cancel_token: CancellationToken,
}

impl ResumeWorker {
    async fn run(mut self) {
        tracing::debug!(target: TRACING_TARGET, "Resume worker started");
        loop {
            tokio::select! {
                biased;
                () = self.cancel_token.cancelled() => break,
                maybe = self.due.recv() => {
                    let Some(continuation) = maybe else { break };
                    self.spawn_resume(continuation);
                }
            }
        }
        tracing::debug!(target: TRACING_TARGET, "Resume worker stopped");
    }

    /// Resumes in its own task so a slow walk never delays other timers.
    fn spawn_resume(&self, continuation: Continuation) {
        let engine = self.engine.clone();
        tokio::spawn(async move {
            let continuation_id = continuation.id;
            match engine.resume(continuation).await {
                Ok(Some(walk)) => tracing::info!(
                    target: TRACING_TARGET,
                    continuation_id = %continuation_id,
                    outcome = ?walk.outcome,
                    "Resumed automation walk"
                ),
                Ok(None) => {}
                Err(err) => tracing::warn!(
                    target: TRACING_TARGET,
                    continuation_id = %continuation_id,
                    error = %err,
                    "Resumed walk failed"
                ),
            }
        });
    }
}
