use std::sync::Arc;

use futures::FutureExt;
use statig::prelude::*;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, warn, Instrument};

use super::types::{AuditStatus, SessionError, SessionState};
use crate::audit::{AuditService, PathStep};
use crate::quid6::SymptomResult;
use crate::telemetry::generate_correlation_id;
use crate::workflow::{WorkflowEngine, WorkflowNode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Select(usize),
    Advance,
    CompleteAssessment(SymptomResult),
    Back,
    Restart,
    /// Collect the key of a finished audit task
    PollAudit,
}

/// Shared storage of the session state machine.
///
/// `path` is never empty and its last step is always the current node.
struct SessionMachine {
    id: String,
    engine: WorkflowEngine,
    audit: Arc<AuditService>,
    path: Vec<PathStep>,
    pending_selection: Option<usize>,
    symptom_result: Option<SymptomResult>,
    // Per terminal occurrence; reset when the machine leaves `completed`.
    audit_requested: bool,
    audit_task: Option<JoinHandle<String>>,
    audit_done: Arc<Notify>,
    audit_key: Option<String>,
    audit_failed: bool,
    /// Result of the last event; `Ok(false)` means it was a no-op
    reply: Result<bool, SessionError>,
}

impl SessionMachine {
    fn new(engine: WorkflowEngine, audit: Arc<AuditService>) -> Self {
        let start = PathStep::new(engine.initial_node().clone());
        Self {
            id: generate_correlation_id(),
            engine,
            audit,
            path: vec![start],
            pending_selection: None,
            symptom_result: None,
            audit_requested: false,
            audit_task: None,
            audit_done: Arc::new(Notify::new()),
            audit_key: None,
            audit_failed: false,
            reply: Ok(false),
        }
    }

    fn current_node(&self) -> &WorkflowNode {
        &self.path[self.path.len() - 1].node
    }

    fn is_busy(&self) -> bool {
        self.audit_task
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    fn ensure_idle(&self) -> Result<(), SessionError> {
        if self.is_busy() {
            return Err(SessionError::AuditInFlight);
        }
        Ok(())
    }
}

#[state_machine(initial = "State::active()")]
impl SessionMachine {
    #[state]
    fn active(&mut self, event: &SessionEvent) -> Outcome<State> {
        match event {
            SessionEvent::Select(index) => {
                self.reply = self.select(*index);
                Handled
            }
            SessionEvent::Advance => {
                let moved = self.advance();
                self.after_move(moved)
            }
            SessionEvent::CompleteAssessment(result) => {
                let moved = self.complete_assessment(*result);
                self.after_move(moved)
            }
            SessionEvent::Back => {
                self.reply = self.back();
                Handled
            }
            SessionEvent::Restart => {
                self.restart();
                self.reply = Ok(true);
                Handled
            }
            SessionEvent::PollAudit => Handled,
        }
    }

    #[state(entry_action = "enter_completed", exit_action = "exit_completed")]
    fn completed(&mut self, event: &SessionEvent) -> Outcome<State> {
        match event {
            // A result node has no options and no assessment; these only report why.
            SessionEvent::Select(index) => {
                self.reply = self.select(*index);
                Handled
            }
            SessionEvent::Advance => {
                self.reply = self.advance();
                Handled
            }
            SessionEvent::CompleteAssessment(result) => {
                self.reply = self.complete_assessment(*result);
                Handled
            }
            SessionEvent::Back => match self.back() {
                Ok(true) => {
                    self.reply = Ok(true);
                    Transition(State::active())
                }
                other => {
                    self.reply = other;
                    Handled
                }
            },
            SessionEvent::Restart => {
                self.restart();
                self.reply = Ok(true);
                Transition(State::active())
            }
            SessionEvent::PollAudit => {
                self.poll_audit();
                Handled
            }
        }
    }

    #[action]
    fn enter_completed(&mut self) {
        let Some(recommendation) = self.current_node().recommendation() else {
            return;
        };
        info!(
            session_id = %self.id,
            recommendation = %recommendation,
            steps = self.path.len(),
            "Scheduling workflow completed"
        );

        if self.audit_requested {
            return;
        }
        self.audit_requested = true;

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(session_id = %self.id, "No async runtime available, audit record not created");
            self.audit_failed = true;
            return;
        };

        let audit = Arc::clone(&self.audit);
        let path = self.path.clone();
        let symptom_result = self.symptom_result;
        let done = Arc::new(Notify::new());
        self.audit_done = Arc::clone(&done);
        let span = info_span!("audit_create", session.id = %self.id);

        self.audit_task = Some(runtime.spawn(
            async move {
                let key = audit.create_record(&path, recommendation, symptom_result).await;
                done.notify_one();
                key
            }
            .instrument(span),
        ));
    }

    /// Leaving a result node ends that occurrence; a running task is detached.
    #[action]
    fn exit_completed(&mut self) {
        self.audit_requested = false;
        self.audit_task = None;
        self.audit_key = None;
        self.audit_failed = false;
    }
}

impl SessionMachine {
    fn after_move(&mut self, moved: Result<bool, SessionError>) -> Outcome<State> {
        let entered_result = moved.is_ok() && self.current_node().is_terminal();
        self.reply = moved;
        if entered_result {
            Transition(State::completed())
        } else {
            Handled
        }
    }

    fn select(&mut self, index: usize) -> Result<bool, SessionError> {
        let node = self.current_node();
        let count = node.options().len();
        if index >= count {
            return Err(SessionError::InvalidOption {
                node_id: node.id.clone(),
                index,
                count,
            });
        }
        self.pending_selection = Some(index);
        Ok(true)
    }

    fn advance(&mut self) -> Result<bool, SessionError> {
        self.ensure_idle()?;
        let index = self.pending_selection.ok_or(SessionError::NoSelection)?;

        let next = self
            .engine
            .transition(&self.current_node().id, index)?
            .clone();

        let last = self.path.len() - 1;
        self.path[last].selected_option_index = Some(index);
        self.path.push(PathStep::new(next));
        self.pending_selection = None;
        Ok(true)
    }

    fn complete_assessment(&mut self, result: SymptomResult) -> Result<bool, SessionError> {
        self.ensure_idle()?;
        let current = self.current_node();
        if !current.is_symptom_assessment() {
            return Err(SessionError::NotAtSymptomAssessment {
                node_id: current.id.clone(),
            });
        }

        let next = self
            .engine
            .resolve_symptom_assessment(result.diagnosis)?
            .clone();

        let last = self.path.len() - 1;
        let step = &mut self.path[last];
        step.node.prompt = format!(
            "{} - {} (Stress score: {}, Urge score: {})",
            step.node.prompt, result.diagnosis, result.stress_score, result.urge_score
        );

        info!(
            session_id = %self.id,
            diagnosis = %result.diagnosis,
            stress_score = result.stress_score,
            urge_score = result.urge_score,
            next = %next.id,
            "Symptom assessment completed"
        );

        self.symptom_result = Some(result);
        self.path.push(PathStep::new(next));
        self.pending_selection = None;
        Ok(true)
    }

    fn back(&mut self) -> Result<bool, SessionError> {
        self.ensure_idle()?;
        if self.path.len() <= 1 {
            return Ok(false);
        }
        self.path.pop();

        let last = self.path.len() - 1;
        if self.path[last].node.is_symptom_assessment() {
            if let Some(original) = self.engine.node(&self.path[last].node.id) {
                self.path[last].node.prompt = original.prompt.clone();
            }
            self.symptom_result = None;
        }
        self.pending_selection = self.path[last].selected_option_index.take();

        debug!(session_id = %self.id, node = %self.current_node().id, "Stepped back");
        Ok(true)
    }

    fn restart(&mut self) {
        self.path = vec![PathStep::new(self.engine.initial_node().clone())];
        self.pending_selection = None;
        self.symptom_result = None;
        debug!(session_id = %self.id, "Session restarted");
    }

    fn poll_audit(&mut self) {
        let Some(task) = self.audit_task.as_mut() else {
            return;
        };
        if !task.is_finished() {
            return;
        }
        match task.now_or_never() {
            Some(Ok(key)) => {
                self.audit_key = Some(key);
                self.audit_task = None;
            }
            Some(Err(e)) => {
                warn!(session_id = %self.id, error = %e, "Audit creation task did not complete");
                self.audit_failed = true;
                self.audit_task = None;
            }
            // Finished but the coop budget is spent; the next poll collects it.
            None => {}
        }
    }

    fn audit_status(&self) -> AuditStatus {
        if let Some(key) = &self.audit_key {
            AuditStatus::Ready(key.clone())
        } else if self.audit_task.is_some() {
            AuditStatus::Pending
        } else if self.audit_failed {
            AuditStatus::Unavailable
        } else {
            AuditStatus::NotRequested
        }
    }
}

/// Single-actor traversal of the scheduling workflow.
pub struct SchedulingSession {
    machine: StateMachine<SessionMachine>,
}

impl SchedulingSession {
    pub fn new(engine: WorkflowEngine, audit: Arc<AuditService>) -> Self {
        let machine = SessionMachine::new(engine, audit).state_machine();
        debug!(session_id = %machine.inner().id, "Scheduling session started");
        Self { machine }
    }

    fn storage(&self) -> &SessionMachine {
        self.machine.inner()
    }

    fn dispatch(&mut self, event: SessionEvent) -> Result<bool, SessionError> {
        self.machine.handle(&event);
        self.storage().reply.clone()
    }

    pub fn id(&self) -> &str {
        &self.storage().id
    }

    pub fn current_node(&self) -> &WorkflowNode {
        self.storage().current_node()
    }

    pub fn path(&self) -> &[PathStep] {
        &self.storage().path
    }

    pub fn pending_selection(&self) -> Option<usize> {
        self.storage().pending_selection
    }

    pub fn symptom_result(&self) -> Option<&SymptomResult> {
        self.storage().symptom_result.as_ref()
    }

    pub fn audit_requested(&self) -> bool {
        self.storage().audit_requested
    }

    pub fn state(&self) -> SessionState {
        match self.machine.state() {
            State::Completed { .. } => self
                .current_node()
                .recommendation()
                .map(|recommendation| SessionState::Completed { recommendation })
                .unwrap_or(SessionState::Active),
            _ => SessionState::Active,
        }
    }

    /// True while this occurrence's audit creation is still running
    pub fn is_busy(&self) -> bool {
        self.storage().is_busy()
    }

    /// Current audit status, collecting the key of a task that has finished
    pub fn audit_status(&mut self) -> AuditStatus {
        self.machine.handle(&SessionEvent::PollAudit);
        self.storage().audit_status()
    }

    /// Wait for the in-flight audit creation, if any, and collect its key
    pub async fn settle_audit(&mut self) -> AuditStatus {
        let mut signalled = false;
        loop {
            self.machine.handle(&SessionEvent::PollAudit);
            let storage = self.storage();
            let Some(task) = &storage.audit_task else {
                break;
            };
            if signalled || task.is_finished() {
                // The task signals just before it returns
                tokio::task::yield_now().await;
            } else {
                let done = Arc::clone(&storage.audit_done);
                done.notified().await;
                signalled = true;
            }
        }
        self.storage().audit_status()
    }

    /// Stage an option on the current node without moving
    pub fn select_option(&mut self, index: usize) -> Result<(), SessionError> {
        self.dispatch(SessionEvent::Select(index)).map(|_| ())
    }

    /// Move forward along the staged option
    pub fn advance(&mut self) -> Result<&WorkflowNode, SessionError> {
        self.dispatch(SessionEvent::Advance)?;
        Ok(self.current_node())
    }

    /// Resolve the current symptom-assessment node with a scored result
    pub fn complete_symptom_assessment(
        &mut self,
        result: SymptomResult,
    ) -> Result<&WorkflowNode, SessionError> {
        self.dispatch(SessionEvent::CompleteAssessment(result))?;
        Ok(self.current_node())
    }

    /// Step back one node. Returns false at the root, where it is a no-op.
    pub fn back(&mut self) -> Result<bool, SessionError> {
        self.dispatch(SessionEvent::Back)
    }

    /// Back to the start node. An in-flight audit task is left to finish; its key is discarded.
    pub fn restart(&mut self) {
        self.machine.handle(&SessionEvent::Restart);
    }
}
