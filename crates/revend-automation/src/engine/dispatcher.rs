//! Event dispatch across a tenant's automation catalog.

use std::fmt;
use std::sync::Arc;

use futures::future::join_all;
use revend_core::DomainEvent;
use tokio::sync::Semaphore;

use super::actions::ActionDispatcher;
use super::config::EngineConfig;
use super::scheduler::{Continuation, DelayScheduler};
use super::walker::{WalkResult, Walker};
use crate::TRACING_TARGET;
use crate::definition::{Automation, AutomationId};
use crate::error::{AutomationError, AutomationResult};
use crate::store::AutomationStore;

/// One automation's outcome within a dispatch.
#[derive(Debug)]
pub struct AutomationRun {
    /// The automation that was walked.
    pub automation_id: AutomationId,
    /// The walk's record, or the error that aborted it.
    pub result: AutomationResult<WalkResult>,
}

impl AutomationRun {
    /// Returns whether the run aborted or recorded any action failure.
    pub fn is_failure(&self) -> bool {
        match &self.result {
            Ok(walk) => walk.has_failures(),
            Err(_) => true,
        }
    }
}

/// Everything that happened in response to one dispatched event.
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// One entry per automation selected for the event.
    pub runs: Vec<AutomationRun>,
}

impl DispatchReport {
    /// Returns whether no automation was selected.
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Returns the number of runs without any failure.
    pub fn succeeded(&self) -> usize {
        self.runs.iter().filter(|run| !run.is_failure()).count()
    }

    /// Returns the number of runs that aborted or partially failed.
    pub fn failed(&self) -> usize {
        self.runs.iter().filter(|run| run.is_failure()).count()
    }
}

/// The automation engine: selects rules for events and walks them.
///
/// Each selected automation is walked in its own task; a bounded permit
/// pool caps how many walks run at once. Walks are isolated from each
/// other: one automation's error never touches another's run, and a
/// failed run never blocks or undoes the entity mutation that emitted
/// the event.
#[derive(Clone)]
pub struct Engine {
    config: EngineConfig,
    store: Arc<dyn AutomationStore>,
    actions: ActionDispatcher,
    scheduler: Arc<dyn DelayScheduler>,
    walk_permits: Arc<Semaphore>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Creates an engine over the given store, collaborators and scheduler.
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn AutomationStore>,
        actions: ActionDispatcher,
        scheduler: Arc<dyn DelayScheduler>,
    ) -> Self {
        let walk_permits = Arc::new(Semaphore::new(config.max_concurrent_walks));
        tracing::info!(
            target: TRACING_TARGET,
            max_concurrent_walks = config.max_concurrent_walks,
            "Automation engine ready"
        );
        Self {
            config,
            store,
            actions,
            scheduler,
            walk_permits,
        }
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns how many walks can start right now.
    pub fn available_slots(&self) -> usize {
        self.walk_permits.available_permits()
    }

    /// Dispatches one domain event to the tenant's matching automations.
    ///
    /// Every enabled automation whose trigger matches the event kind is
    /// walked in its own task. The returned report has one entry per
    /// automation; per-automation errors land in the report, an `Err`
    /// from this method means the catalog itself could not be read.
    #[tracing::instrument(
        skip_all,
        target = TRACING_TARGET,
        name = "automation.dispatch",
        fields(tenant_id = %event.tenant_id, event = %event.kind, entity = %event.entity)
    )]
    pub async fn dispatch(&self, event: &DomainEvent) -> AutomationResult<DispatchReport> {
        let automations = self.store.load_enabled(event.tenant_id, event.kind).await?;
        if automations.is_empty() {
            tracing::debug!(
                target: TRACING_TARGET,
                "No enabled automations match the event"
            );
            return Ok(DispatchReport::default());
        }

        let mut ids = Vec::with_capacity(automations.len());
        let mut handles = Vec::with_capacity(automations.len());
        for automation in automations {
            let permit = self
                .walk_permits
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| AutomationError::Internal("walk permit pool closed".into()))?;
            ids.push(automation.id);

            let engine = self.clone();
            let event = event.clone();
            handles.push(tokio::spawn(async move {
                let _permit = permit;
                engine.walk_automation(&automation, &event).await
            }));
        }

        let mut report = DispatchReport::default();
        for (automation_id, joined) in ids.into_iter().zip(join_all(handles).await) {
            let result = joined.unwrap_or_else(|err| {
                Err(AutomationError::Internal(format!(
                    "walk task panicked: {err}"
                )))
            });
            if let Err(err) = &result {
                tracing::error!(
                    target: TRACING_TARGET,
                    automation_id = %automation_id,
                    error = %err,
                    "Automation walk aborted"
                );
            }
            report.runs.push(AutomationRun {
                automation_id,
                result,
            });
        }

        tracing::info!(
            target: TRACING_TARGET,
            automations = report.runs.len(),
            failed = report.failed(),
            "Dispatched event to automations"
        );
        Ok(report)
    }

    /// Resumes a due continuation.
    ///
    /// Returns `Ok(None)` without walking anything when the automation
    /// was deleted or disabled while the continuation was pending.
    #[tracing::instrument(
        skip_all,
        target = TRACING_TARGET,
        name = "automation.resume",
        fields(
            continuation_id = %continuation.id,
            automation_id = %continuation.automation_id,
            tenant_id = %continuation.event.tenant_id
        )
    )]
    pub async fn resume(&self, continuation: Continuation) -> AutomationResult<Option<WalkResult>> {
        let tenant_id = continuation.event.tenant_id;
        let Some(automation) = self.store.load(tenant_id, continuation.automation_id).await?
        else {
            tracing::info!(
                target: TRACING_TARGET,
                "Automation deleted while its continuation was pending, skipping"
            );
            return Ok(None);
        };
        if !automation.enabled {
            tracing::info!(
                target: TRACING_TARGET,
                "Automation disabled while its continuation was pending, skipping"
            );
            return Ok(None);
        }

        let _permit = self
            .walk_permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| AutomationError::Internal("walk permit pool closed".into()))?;
        let graph = automation.compile()?;
        let result = Walker::new(&graph, &self.actions, self.scheduler.as_ref())
            .resume(continuation.resume_node, &continuation.event)
            .await?;
        Ok(Some(result))
    }

    async fn walk_automation(
        &self,
        automation: &Automation,
        event: &DomainEvent,
    ) -> AutomationResult<WalkResult> {
        let graph = automation.compile()?;
        Walker::new(&graph, &self.actions, self.scheduler.as_ref())
            .run(event)
            .await
    }
}
