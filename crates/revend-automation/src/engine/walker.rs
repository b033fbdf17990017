//! Sequential graph walking.
//!
//! A walk starts at an automation's trigger node and follows edges one
//! node at a time. Conditions pick the outgoing branch and actions execute
//! against the collaborators; a delay suspends the walk into a scheduled
//! continuation. Action failures are recorded on the result and the walk
//! carries on; only structural problems abort it.

use std::collections::HashSet;

use revend_core::DomainEvent;
use serde::{Deserialize, Serialize};

use super::actions::{ActionDispatcher, ActionOutcome};
use super::evaluator::evaluate;
use super::scheduler::{Continuation, ContinuationId, DelayScheduler};
use crate::TRACING_TARGET;
use crate::definition::{AutomationId, NodeId, NodeKind};
use crate::error::{AutomationError, AutomationResult};
use crate::graph::AutomationGraph;

/// What happened at one node of a walk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepOutcome {
    /// The trigger matched and the walk started.
    Triggered,
    /// A condition evaluated and picked a branch.
    Branched {
        /// Whether the condition held.
        matched: bool,
    },
    /// An action ran and its side effect was applied.
    ActionExecuted,
    /// An action was skipped by tenant configuration.
    ActionSkipped,
    /// An action failed; the walk continued past it.
    ActionFailed {
        /// The failure, rendered for the report.
        message: String,
    },
    /// A delay suspended the walk into a continuation.
    Deferred {
        /// ID of the scheduled continuation.
        continuation_id: ContinuationId,
    },
}

/// One visited node and what happened there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkStep {
    /// The node that was visited.
    pub node_id: NodeId,
    /// What happened at the node.
    #[serde(flatten)]
    pub outcome: StepOutcome,
}

/// How a walk ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WalkOutcome {
    /// The walk reached a node with no successor.
    Completed,
    /// The walk suspended at a delay node.
    Deferred {
        /// ID of the scheduled continuation.
        continuation_id: ContinuationId,
    },
    /// A condition picked a branch with no edge; nothing further to do.
    DeadBranch,
    /// A node was about to be visited twice; the walk stopped instead.
    CycleDetected,
    /// The event did not match the trigger; nothing ran.
    NotTriggered,
}

/// The full record of one walk through one automation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkResult {
    /// The automation that was walked.
    pub automation_id: AutomationId,
    /// Every node visited, in walk order.
    pub steps: Vec<WalkStep>,
    /// How the walk ended.
    #[serde(flatten)]
    pub outcome: WalkOutcome,
}

impl WalkResult {
    /// Returns whether any action on the walk failed.
    pub fn has_failures(&self) -> bool {
        self.steps
            .iter()
            .any(|step| matches!(step.outcome, StepOutcome::ActionFailed { .. }))
    }
}

/// Walks one compiled automation graph for one event.
///
/// The walker is strictly sequential: one node at a time, each action
/// awaited before the next edge is followed. Concurrency lives a level
/// up, where independent automations get independent walkers.
#[derive(Clone, Copy)]
pub struct Walker<'a> {
    graph: &'a AutomationGraph,
    actions: &'a ActionDispatcher,
    scheduler: &'a dyn DelayScheduler,
}

impl<'a> Walker<'a> {
    /// Creates a walker over a compiled graph.
    pub fn new(
        graph: &'a AutomationGraph,
        actions: &'a ActionDispatcher,
        scheduler: &'a dyn DelayScheduler,
    ) -> Self {
        Self {
            graph,
            actions,
            scheduler,
        }
    }

    /// Walks the graph from its trigger for the given event.
    ///
    /// The trigger is re-checked against the event kind even though the
    /// selection layer already filtered on it; a mismatch ends the walk
    /// as [`WalkOutcome::NotTriggered`] without running anything.
    #[tracing::instrument(
        skip_all,
        target = TRACING_TARGET,
        name = "automation.walk",
        fields(automation_id = %self.graph.automation_id(), tenant_id = %self.graph.tenant_id())
    )]
    pub async fn run(&self, event: &DomainEvent) -> AutomationResult<WalkResult> {
        let trigger_id = self.graph.trigger();
        let Some(NodeKind::Trigger(trigger)) = self.graph.node(trigger_id).map(|node| &node.kind)
        else {
            return Err(AutomationError::InvalidGraph(format!(
                "node {trigger_id} is not the trigger it was compiled as"
            )));
        };

        if !trigger.matches(event.kind) {
            tracing::warn!(
                target: TRACING_TARGET,
                automation_id = %self.graph.automation_id(),
                expected = %trigger.event,
                received = %event.kind,
                "Event kind does not match the automation trigger"
            );
            return Ok(self.finish(Vec::new(), WalkOutcome::NotTriggered));
        }

        let steps = vec![WalkStep {
            node_id: trigger_id,
            outcome: StepOutcome::Triggered,
        }];
        match self.graph.next(trigger_id) {
            Some(start) => self.walk_from(start, event, steps).await,
            // A trigger with no outgoing edge is a valid no-op automation.
            None => Ok(self.finish(steps, WalkOutcome::Completed)),
        }
    }

    /// Resumes a suspended walk at a delay node's successor.
    ///
    /// The caller supplies the event captured when the walk was suspended;
    /// evaluation sees the original snapshot, not current entity state.
    #[tracing::instrument(
        skip_all,
        target = TRACING_TARGET,
        name = "automation.walk_resume",
        fields(automation_id = %self.graph.automation_id(), node_id = %node_id)
    )]
    pub async fn resume(
        &self,
        node_id: NodeId,
        event: &DomainEvent,
    ) -> AutomationResult<WalkResult> {
        if !self.graph.contains_node(node_id) {
            return Err(AutomationError::InvalidGraph(format!(
                "resume node {node_id} no longer exists in the automation"
            )));
        }
        self.walk_from(node_id, event, Vec::new()).await
    }

    async fn walk_from(
        &self,
        start: NodeId,
        event: &DomainEvent,
        mut steps: Vec<WalkStep>,
    ) -> AutomationResult<WalkResult> {
        let mut visited = HashSet::new();
        let mut current = Some(start);

        while let Some(node_id) = current {
            if !visited.insert(node_id) {
                tracing::warn!(
                    target: TRACING_TARGET,
                    automation_id = %self.graph.automation_id(),
                    node_id = %node_id,
                    "Walk revisited a node, stopping"
                );
                return Ok(self.finish(steps, WalkOutcome::CycleDetected));
            }
            let Some(node) = self.graph.node(node_id) else {
                return Err(AutomationError::InvalidGraph(format!(
                    "walk reached node {node_id} which does not exist"
                )));
            };

            match &node.kind {
                NodeKind::Trigger(_) => {
                    return Err(AutomationError::InvalidGraph(format!(
                        "trigger node {node_id} reached mid-walk"
                    )));
                }
                NodeKind::Condition(condition) => {
                    let matched = evaluate(&condition.conditions, condition.logic, event);
                    steps.push(WalkStep {
                        node_id,
                        outcome: StepOutcome::Branched { matched },
                    });
                    match self.graph.branch(node_id, matched) {
                        Some(next) => current = Some(next),
                        None => {
                            tracing::debug!(
                                target: TRACING_TARGET,
                                automation_id = %self.graph.automation_id(),
                                node_id = %node_id,
                                matched,
                                "Branch has no successor, walk ends"
                            );
                            return Ok(self.finish(steps, WalkOutcome::DeadBranch));
                        }
                    }
                }
                NodeKind::Action(action) => {
                    let outcome = match self.actions.execute(node_id, action, event).await {
                        Ok(ActionOutcome::Executed) => StepOutcome::ActionExecuted,
                        Ok(ActionOutcome::Skipped) => StepOutcome::ActionSkipped,
                        Err(err) => {
                            tracing::warn!(
                                target: TRACING_TARGET,
                                automation_id = %self.graph.automation_id(),
                                node_id = %node_id,
                                error = %err,
                                "Automation action failed, walk continues"
                            );
                            StepOutcome::ActionFailed {
                                message: err.to_string(),
                            }
                        }
                    };
                    steps.push(WalkStep { node_id, outcome });
                    current = self.graph.next(node_id);
                }
                NodeKind::Delay(delay) => {
                    let Some(resume_node) = self.graph.next(node_id) else {
                        tracing::debug!(
                            target: TRACING_TARGET,
                            automation_id = %self.graph.automation_id(),
                            node_id = %node_id,
                            "Delay node has no successor, nothing to defer"
                        );
                        return Ok(self.finish(steps, WalkOutcome::Completed));
                    };
                    let continuation = Continuation::new(
                        self.graph.automation_id(),
                        resume_node,
                        event.clone(),
                        delay.as_duration(),
                    );
                    let continuation_id = self.scheduler.schedule(continuation).await?;
                    steps.push(WalkStep {
                        node_id,
                        outcome: StepOutcome::Deferred { continuation_id },
                    });
                    return Ok(self.finish(steps, WalkOutcome::Deferred { continuation_id }));
                }
            }
        }

        Ok(self.finish(steps, WalkOutcome::Completed))
    }

    fn finish(&self, steps: Vec<WalkStep>, outcome: WalkOutcome) -> WalkResult {
        WalkResult {
            automation_id: self.graph.automation_id(),
            steps,
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use revend_core::mock::{MockEntityStore, MockNotifier};
    use revend_core::{EntityId, EntityKind, EntityRef, EventKind, EventSnapshot, TenantId};
    use serde_json::json;

    use super::*;
    use crate::definition::{
        ActionDef, Automation, BranchLabel, CompareOp, ConditionDef, DelayDef, DelayUnit,
        FieldCondition, SendNotificationAction, TagAction, TriggerDef,
    };

    /// Scheduler that records continuations instead of timing them.
    #[derive(Debug, Default)]
    struct RecordingScheduler {
        scheduled: Mutex<Vec<Continuation>>,
    }

    impl RecordingScheduler {
        fn scheduled(&self) -> Vec<Continuation> {
            self.scheduled.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl DelayScheduler for RecordingScheduler {
        async fn schedule(&self, continuation: Continuation) -> AutomationResult<ContinuationId> {
            let id = continuation.id;
            self.scheduled.lock().unwrap().push(continuation);
            Ok(id)
        }
    }

    struct Fixture {
        store: Arc<MockEntityStore>,
        notifier: Arc<MockNotifier>,
        actions: ActionDispatcher,
        scheduler: RecordingScheduler,
    }

    impl Fixture {
        fn new() -> Self {
            Self::with_notifier(MockNotifier::new())
        }

        fn with_notifier(notifier: MockNotifier) -> Self {
            let store = Arc::new(MockEntityStore::new());
            let notifier = Arc::new(notifier);
            let actions = ActionDispatcher::new(store.clone(), notifier.clone());
            Self {
                store,
                notifier,
                actions,
                scheduler: RecordingScheduler::default(),
            }
        }

        fn walker<'a>(&'a self, graph: &'a AutomationGraph) -> Walker<'a> {
            Walker::new(graph, &self.actions, &self.scheduler)
        }
    }

    fn risk_event(score: i64) -> DomainEvent {
        DomainEvent::new(
            TenantId::new(),
            EventKind::CustomerRiskChanged,
            EntityRef::new(EntityKind::Customer, EntityId::new()),
            EventSnapshot::new(json!({"customer": {"riskScore": score}})),
        )
    }

    fn high_risk_condition() -> ConditionDef {
        ConditionDef::all(vec![FieldCondition::new(
            "customer.riskScore",
            CompareOp::GreaterThan,
            json!(80),
        )])
    }

    /// Trigger, high-risk condition, `high-risk` tag on the true branch.
    fn risk_automation() -> (Automation, NodeId) {
        let mut automation = Automation::new(TenantId::new());
        let trigger = automation.add_node(TriggerDef::new(EventKind::CustomerRiskChanged));
        let condition = automation.add_node(high_risk_condition());
        let tag = automation.add_node(ActionDef::AddTag(TagAction::new("high-risk")));
        automation.connect(trigger, condition);
        automation.connect_branch(condition, tag, BranchLabel::True);
        (automation, condition)
    }

    #[tokio::test]
    async fn test_walk_tags_high_risk_customers() {
        let fixture = Fixture::new();
        let (automation, _) = risk_automation();
        let graph = automation.compile().expect("compile failed");

        let result = fixture
            .walker(&graph)
            .run(&risk_event(90))
            .await
            .expect("walk failed");

        assert_eq!(result.outcome, WalkOutcome::Completed);
        assert!(!result.has_failures());
        assert_eq!(result.steps.len(), 3);
        assert_eq!(result.steps[0].outcome, StepOutcome::Triggered);
        assert_eq!(result.steps[1].outcome, StepOutcome::Branched { matched: true });
        assert_eq!(result.steps[2].outcome, StepOutcome::ActionExecuted);
        assert_eq!(fixture.store.tags_added(), vec!["high-risk".to_owned()]);
    }

    #[tokio::test]
    async fn test_walk_ends_cleanly_on_missing_branch() {
        let fixture = Fixture::new();
        let (automation, condition) = risk_automation();
        let graph = automation.compile().expect("compile failed");

        let result = fixture
            .walker(&graph)
            .run(&risk_event(50))
            .await
            .expect("walk failed");

        assert_eq!(result.outcome, WalkOutcome::DeadBranch);
        assert_eq!(
            result.steps.last().map(|step| &step.outcome),
            Some(&StepOutcome::Branched { matched: false })
        );
        assert_eq!(result.steps.last().map(|step| step.node_id), Some(condition));
        assert_eq!(fixture.store.call_count(), 0);
    }

    #[tokio::test]
    async fn test_walk_takes_the_false_branch_when_wired() {
        let fixture = Fixture::new();
        let (mut automation, condition) = risk_automation();
        let routine = automation.add_node(ActionDef::AddTag(TagAction::new("routine")));
        automation.connect_branch(condition, routine, BranchLabel::False);
        let graph = automation.compile().expect("compile failed");

        let result = fixture
            .walker(&graph)
            .run(&risk_event(50))
            .await
            .expect("walk failed");

        assert_eq!(result.outcome, WalkOutcome::Completed);
        assert_eq!(fixture.store.tags_added(), vec!["routine".to_owned()]);
    }

    #[tokio::test]
    async fn test_event_mismatch_runs_nothing() {
        let fixture = Fixture::new();
        let (automation, _) = risk_automation();
        let graph = automation.compile().expect("compile failed");
        let event = DomainEvent::new(
            TenantId::new(),
            EventKind::TicketCreated,
            EntityRef::new(EntityKind::Ticket, EntityId::new()),
            EventSnapshot::new(json!({})),
        );

        let result = fixture.walker(&graph).run(&event).await.expect("walk failed");

        assert_eq!(result.outcome, WalkOutcome::NotTriggered);
        assert!(result.steps.is_empty());
        assert_eq!(fixture.store.call_count(), 0);
    }

    #[tokio::test]
    async fn test_trigger_without_successor_is_a_noop() {
        let fixture = Fixture::new();
        let mut automation = Automation::new(TenantId::new());
        automation.add_node(TriggerDef::new(EventKind::CustomerRiskChanged));
        let graph = automation.compile().expect("compile failed");

        let result = fixture
            .walker(&graph)
            .run(&risk_event(90))
            .await
            .expect("walk failed");

        assert_eq!(result.outcome, WalkOutcome::Completed);
        assert_eq!(result.steps.len(), 1);
        assert_eq!(fixture.store.call_count(), 0);
    }

    #[tokio::test]
    async fn test_action_failure_does_not_stop_the_walk() {
        let fixture = Fixture::with_notifier(MockNotifier::failing());
        let mut automation = Automation::new(TenantId::new());
        let trigger = automation.add_node(TriggerDef::new(EventKind::CustomerRiskChanged));
        let notify = automation.add_node(ActionDef::SendNotification(
            SendNotificationAction::new("risk_alert"),
        ));
        let tag = automation.add_node(ActionDef::AddTag(TagAction::new("high-risk")));
        automation.connect(trigger, notify);
        automation.connect(notify, tag);
        let graph = automation.compile().expect("compile failed");

        let result = fixture
            .walker(&graph)
            .run(&risk_event(90))
            .await
            .expect("walk failed");

        assert_eq!(result.outcome, WalkOutcome::Completed);
        assert!(result.has_failures());
        assert!(matches!(
            result.steps[1].outcome,
            StepOutcome::ActionFailed { .. }
        ));
        assert_eq!(result.steps[2].outcome, StepOutcome::ActionExecuted);
        assert_eq!(fixture.store.tags_added(), vec!["high-risk".to_owned()]);
    }

    #[tokio::test]
    async fn test_cycle_stops_after_one_visit_per_node() {
        let fixture = Fixture::new();
        let mut automation = Automation::new(TenantId::new());
        let trigger = automation.add_node(TriggerDef::new(EventKind::CustomerRiskChanged));
        let first = automation.add_node(ActionDef::AddTag(TagAction::new("first")));
        let second = automation.add_node(ActionDef::AddTag(TagAction::new("second")));
        automation.connect(trigger, first);
        automation.connect(first, second);
        automation.connect(second, first);
        let graph = automation.compile().expect("compile failed");

        let result = fixture
            .walker(&graph)
            .run(&risk_event(90))
            .await
            .expect("walk failed");

        assert_eq!(result.outcome, WalkOutcome::CycleDetected);
        assert_eq!(
            fixture.store.tags_added(),
            vec!["first".to_owned(), "second".to_owned()]
        );
    }

    #[tokio::test]
    async fn test_delay_defers_with_the_original_event() {
        let fixture = Fixture::new();
        let mut automation = Automation::new(TenantId::new());
        let trigger = automation.add_node(TriggerDef::new(EventKind::TicketCreated));
        let delay = automation.add_node(DelayDef::new(24, DelayUnit::Hours));
        let notify = automation.add_node(ActionDef::SendNotification(
            SendNotificationAction::new("ticket_reminder"),
        ));
        automation.connect(trigger, delay);
        automation.connect(delay, notify);
        let graph = automation.compile().expect("compile failed");
        let event = DomainEvent::new(
            TenantId::new(),
            EventKind::TicketCreated,
            EntityRef::new(EntityKind::Ticket, EntityId::new()),
            EventSnapshot::new(json!({"ticket": {"status": "open"}})),
        );

        let result = fixture.walker(&graph).run(&event).await.expect("walk failed");

        let scheduled = fixture.scheduler.scheduled();
        assert_eq!(scheduled.len(), 1);
        assert_eq!(scheduled[0].resume_node, notify);
        assert_eq!(scheduled[0].event, event);
        assert!(scheduled[0].delay_remaining() > Duration::from_secs(23 * 3_600));
        assert_eq!(
            result.outcome,
            WalkOutcome::Deferred {
                continuation_id: scheduled[0].id
            }
        );
        assert_eq!(fixture.notifier.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_delay_without_successor_completes() {
        let fixture = Fixture::new();
        let mut automation = Automation::new(TenantId::new());
        let trigger = automation.add_node(TriggerDef::new(EventKind::TicketCreated));
        let delay = automation.add_node(DelayDef::new(1, DelayUnit::Minutes));
        automation.connect(trigger, delay);
        let graph = automation.compile().expect("compile failed");
        let event = DomainEvent::new(
            TenantId::new(),
            EventKind::TicketCreated,
            EntityRef::new(EntityKind::Ticket, EntityId::new()),
            EventSnapshot::new(json!({})),
        );

        let result = fixture.walker(&graph).run(&event).await.expect("walk failed");

        assert_eq!(result.outcome, WalkOutcome::Completed);
        assert!(fixture.scheduler.scheduled().is_empty());
    }

    #[tokio::test]
    async fn test_resume_runs_from_the_saved_node() {
        let fixture = Fixture::new();
        let mut automation = Automation::new(TenantId::new());
        let trigger = automation.add_node(TriggerDef::new(EventKind::TicketCreated));
        let delay = automation.add_node(DelayDef::new(24, DelayUnit::Hours));
        let notify = automation.add_node(ActionDef::SendNotification(
            SendNotificationAction::new("ticket_reminder"),
        ));
        automation.connect(trigger, delay);
        automation.connect(delay, notify);
        let graph = automation.compile().expect("compile failed");
        let event = DomainEvent::new(
            TenantId::new(),
            EventKind::TicketCreated,
            EntityRef::new(EntityKind::Ticket, EntityId::new()),
            EventSnapshot::new(json!({"ticket": {"status": "open"}})),
        );

        let result = fixture
            .walker(&graph)
            .resume(notify, &event)
            .await
            .expect("resume failed");

        assert_eq!(result.outcome, WalkOutcome::Completed);
        assert_eq!(result.steps.len(), 1);
        assert_eq!(result.steps[0].outcome, StepOutcome::ActionExecuted);
        assert_eq!(fixture.notifier.sent_count(), 1);
    }

    #[tokio::test]
    async fn test_resume_rejects_an_unknown_node() {
        let fixture = Fixture::new();
        let (automation, _) = risk_automation();
        let graph = automation.compile().expect("compile failed");

        let err = fixture
            .walker(&graph)
            .resume(NodeId::new(), &risk_event(90))
            .await
            .expect_err("resume should fail");

        assert!(matches!(err, AutomationError::InvalidGraph(_)));
    }
}
