//! The perceive, decide, act loop.
//!
//! Each turn the driver hands the model the conversation so far plus the
//! current element listing, validates the structured reply, executes it
//! through the [`ActionChannel`] and feeds the outcome back. Only one model
//! call and one action are ever in flight.

use crate::agent::config::GuideConfig;
use crate::agent::model::{ChatMessage, Model, ModelRequest};
use crate::agent::session::{
    GuideSession, PlanStep, SessionEvent, SessionEventType, SessionLog, SessionStatus,
};
use crate::dom::page::{PageLocation, SnapshotSource};
use crate::dom::snapshot::DomSnapshot;
use crate::error::Result;
use crate::guide::executor::ActionChannel;
use crate::protocol::action::{Action, ExecutionResult};
use crate::protocol::envelope::{AgentTurn, CurrentState, agent_output_schema};
use crate::protocol::prompt;
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Text of the `done` action synthesized when the step budget runs out
pub const GIVE_UP_MESSAGE: &str = "Failed to complete the task, too many attempts";

/// Wait before the second attempt at reading the page
const SNAPSHOT_RETRY_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    AwaitingModel,
    Validating,
    Executing,
    Terminated,
}

/// What the host UI renders while a guide runs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuideSignal {
    pub is_guiding: bool,
    /// The agent's current `next_goal`, or the task before the first turn
    pub instruction: Option<String>,
}

impl GuideSignal {
    fn guiding(instruction: impl Into<String>) -> Self {
        Self {
            is_guiding: true,
            instruction: Some(instruction.into()),
        }
    }
}

/// A task to guide the user through
#[derive(Debug, Clone, PartialEq)]
pub struct GuideTask {
    pub instructions: String,
    pub plan: Vec<String>,
    /// Session to continue after a pause
    pub resume: Option<Uuid>,
    /// 1-based plan steps already done before the resume
    pub completed_steps: Vec<usize>,
}

impl GuideTask {
    pub fn new(instructions: impl Into<String>) -> Self {
        Self {
            instructions: instructions.into(),
            plan: Vec::new(),
            resume: None,
            completed_steps: Vec::new(),
        }
    }

    pub fn with_plan<I, S>(mut self, steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.plan = steps.into_iter().map(Into::into).collect();
        self
    }

    pub fn resuming(mut self, session_id: Uuid) -> Self {
        self.resume = Some(session_id);
        self
    }

    pub fn with_completed_steps(mut self, numbers: impl IntoIterator<Item = usize>) -> Self {
        self.completed_steps = numbers.into_iter().collect();
        self
    }
}

/// One executed action
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepRecord {
    /// 1-based turn number the action belongs to
    pub step: usize,
    pub action: Action,
    pub result: ExecutionResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_state: Option<CurrentState>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// The agent returned `done`
    Done { success: bool, text: String },
    /// No `done` within the configured number of turns
    StepBudget,
    /// The host cancelled the session
    Cancelled,
    /// The host paused the session; it can be resumed with [`GuideTask::resuming`]
    Paused,
}

#[derive(Debug, Clone)]
pub struct GuideOutcome {
    pub session_id: Uuid,
    pub termination: Termination,
    pub steps: Vec<StepRecord>,
    pub plan: Vec<PlanStep>,
    /// Model calls made
    pub turns: usize,
}

impl GuideOutcome {
    pub fn success(&self) -> bool {
        matches!(self.termination, Termination::Done { success: true, .. })
    }

    /// Final message for the user, if the session finished
    pub fn text(&self) -> Option<&str> {
        match &self.termination {
            Termination::Done { text, .. } => Some(text),
            Termination::StepBudget => Some(GIVE_UP_MESSAGE),
            Termination::Cancelled | Termination::Paused => None,
        }
    }

    /// Task continuing this session, with the plan and its progress carried over
    pub fn resume_task(&self, instructions: impl Into<String>) -> GuideTask {
        let completed = self
            .plan
            .iter()
            .enumerate()
            .filter(|(_, step)| step.completed)
            .map(|(i, _)| i + 1);
        GuideTask::new(instructions)
            .with_plan(self.plan.iter().map(|step| step.description.clone()))
            .with_completed_steps(completed)
            .resuming(self.session_id)
    }
}

/// Host-side controls for a running guide
#[derive(Debug, Clone, Default)]
pub struct GuideHandle {
    cancel: CancellationToken,
    pause: CancellationToken,
}

impl GuideHandle {
    /// Stop the session; a running model call is abandoned
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Stop the session so it can be resumed later
    pub fn pause(&self) {
        self.pause.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled() || self.pause.is_cancelled()
    }
}

struct Run {
    session: GuideSession,
    steps: Vec<StepRecord>,
    turns: usize,
}

/// Orchestrates one guide session.
///
/// Cancelling or pausing through the [`GuideHandle`] is permanent for this
/// driver; resume with a new driver and [`GuideTask::resuming`].
pub struct GuideDriver {
    config: GuideConfig,
    model: Arc<dyn Model>,
    source: Arc<dyn SnapshotSource>,
    channel: Box<dyn ActionChannel>,
    log: Arc<dyn SessionLog>,
    state: DriverState,
    signal: watch::Sender<GuideSignal>,
    handle: GuideHandle,
}

impl GuideDriver {
    pub fn new(
        config: GuideConfig,
        model: Arc<dyn Model>,
        source: Arc<dyn SnapshotSource>,
        channel: Box<dyn ActionChannel>,
        log: Arc<dyn SessionLog>,
    ) -> Self {
        let (signal, _) = watch::channel(GuideSignal::default());
        Self {
            config,
            model,
            source,
            channel,
            log,
            state: DriverState::Idle,
            signal,
            handle: GuideHandle::default(),
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn handle(&self) -> GuideHandle {
        self.handle.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<GuideSignal> {
        self.signal.subscribe()
    }

    /// Drive `task` to termination.
    ///
    /// Model failures, invalid actions and a page that cannot be read before
    /// the first turn end the session as abandoned and are returned as
    /// errors. Later read failures are reported to the model instead. The
    /// pointer indicator is removed on every exit path.
    pub async fn run(&mut self, task: GuideTask) -> Result<GuideOutcome> {
        let mut session = GuideSession::new(&task.instructions, &task.plan);
        if let Some(id) = task.resume {
            session.id = id;
            session.complete_steps(&task.completed_steps);
        }
        let mut run = Run {
            session,
            steps: Vec::new(),
            turns: 0,
        };

        if task.resume.is_some() {
            log::info!("Resuming guide session {}", run.session.id);
            self.mark_in_progress(&mut run.session, true).await;
        } else {
            log::info!(
                "Guide session {} started: {}",
                run.session.id,
                task.instructions
            );
            if let Err(e) = self
                .log
                .set_status(&run.session.id, SessionStatus::Started)
                .await
            {
                log::warn!("Failed to record status for {}: {}", run.session.id, e);
            }
            let data = json!({
                "instructions": task.instructions,
                "steps": run.session.steps,
            });
            self.emit(&run.session.id, SessionEventType::SessionStarted, data)
                .await;
        }
        self.signal
            .send_replace(GuideSignal::guiding(task.instructions.clone()));

        let result = self.drive(&mut run, &task).await;

        self.channel.teardown().await;
        self.transition(DriverState::Terminated);
        self.signal.send_replace(GuideSignal::default());

        match result {
            Ok(termination) => {
                self.close(&mut run.session, &termination).await;
                Ok(GuideOutcome {
                    session_id: run.session.id,
                    termination,
                    steps: run.steps,
                    plan: run.session.steps,
                    turns: run.turns,
                })
            }
            Err(e) => {
                log::error!("Guide session {} abandoned: {}", run.session.id, e);
                let data = json!({ "error": e.to_string() });
                self.finish(
                    &mut run.session,
                    SessionEventType::Abandoned,
                    SessionStatus::Abandoned,
                    data,
                )
                .await;
                Err(e)
            }
        }
    }

    async fn drive(&mut self, run: &mut Run, task: &GuideTask) -> Result<Termination> {
        let system_prompt =
            prompt::system_prompt(&self.config.mailbox_name, self.config.user_email.as_deref());
        let schema = agent_output_schema();

        let mut snapshot = self.read_page().await?;
        let mut messages = vec![ChatMessage::user(prompt::initial_message(
            &task.instructions,
            &plan_lines(&run.session.steps),
            &location_of(&snapshot),
            &snapshot,
            task.resume.is_some(),
        ))];

        loop {
            if let Some(stop) = self.stop_requested() {
                return Ok(stop);
            }

            if run.turns >= self.config.max_steps {
                log::warn!(
                    "No done action after {} steps, giving up",
                    self.config.max_steps
                );
                self.transition(DriverState::Executing);
                let action = Action::give_up(GIVE_UP_MESSAGE);
                let result = self.channel.execute(&snapshot, &action).await;
                let step = run.turns + 1;
                self.record(run, step, action, result, None).await;
                return Ok(Termination::StepBudget);
            }

            self.transition(DriverState::AwaitingModel);
            let request = ModelRequest {
                system_prompt: system_prompt.clone(),
                messages: messages.clone(),
                schema: schema.clone(),
                screenshot: self.screenshot().await,
            };

            let model = self.model.clone();
            let cancel = self.handle.cancel.clone();
            let pause = self.handle.pause.clone();
            let raw = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(Termination::Cancelled),
                _ = pause.cancelled() => return Ok(Termination::Paused),
                raw = model.next_turn(&request) => raw?,
            };
            run.turns += 1;

            self.transition(DriverState::Validating);
            let turn = AgentTurn::from_value(raw)?;
            messages.push(ChatMessage::assistant(serde_json::to_string(&turn)?));

            if let Some(numbers) = &turn.current_state.completed_steps {
                if run.session.complete_steps(numbers) {
                    log::debug!("Plan steps completed: {:?}", numbers);
                }
            }
            self.signal
                .send_replace(GuideSignal::guiding(turn.current_state.next_goal.clone()));

            self.transition(DriverState::Executing);
            let actions = turn.actions();
            let total = actions.len();
            let mut last = None;
            let mut interruption = None;

            let step = run.turns;
            for (i, action) in actions.iter().enumerate() {
                log::info!("Step {}: {}", step, action);
                let result = self.channel.execute(&snapshot, action).await;
                self.record(
                    run,
                    step,
                    action.clone(),
                    result.clone(),
                    Some(turn.current_state.clone()),
                )
                .await;

                if let ExecutionResult::Terminated { success, text } = &result {
                    return Ok(Termination::Done {
                        success: *success,
                        text: text.clone(),
                    });
                }

                let failed = result.is_failure();
                last = Some((action, result, i + 1));
                let remaining = i + 1 < total;

                if failed {
                    if remaining {
                        interruption = Some("it failed");
                    }
                    break;
                }

                if remaining {
                    match self.read_page().await {
                        Ok(fresh) => {
                            let changed = fresh.fingerprint() != snapshot.fingerprint();
                            snapshot = fresh;
                            if changed {
                                log::debug!("Page changed mid-sequence, dropping the rest");
                                interruption = Some("the page changed");
                                break;
                            }
                        }
                        Err(e) => {
                            log::warn!("Page unreadable mid-sequence: {}", e);
                            interruption = Some("the page could not be read");
                            break;
                        }
                    }
                }
            }

            let unreadable = match self.read_page().await {
                Ok(fresh) => {
                    snapshot = fresh;
                    None
                }
                Err(e) => {
                    log::warn!("Page unreadable after step {}: {}", step, e);
                    Some(e)
                }
            };
            if let Some((action, result, executed)) = last {
                let mut feedback = match &unreadable {
                    None => prompt::action_feedback(
                        action,
                        &result,
                        &location_of(&snapshot),
                        &snapshot,
                    ),
                    Some(e) => {
                        prompt::unreadable_page_feedback(action, &result, &e.to_string(), &snapshot)
                    }
                };
                if let Some(reason) = interruption {
                    feedback = format!(
                        "Action sequence interrupted after {} of {} actions because {}.\n{}",
                        executed, total, reason, feedback
                    );
                }
                messages.push(ChatMessage::tool(feedback));
            }
        }
    }

    fn stop_requested(&self) -> Option<Termination> {
        if self.handle.cancel.is_cancelled() {
            Some(Termination::Cancelled)
        } else if self.handle.pause.is_cancelled() {
            Some(Termination::Paused)
        } else {
            None
        }
    }

    /// Snapshot the page, retrying once after a short wait; a click may have
    /// started a navigation that is still committing
    async fn read_page(&self) -> Result<DomSnapshot> {
        match self.source.snapshot().await {
            Ok(snapshot) => Ok(snapshot),
            Err(e) => {
                log::debug!("Snapshot failed, retrying: {}", e);
                tokio::time::sleep(SNAPSHOT_RETRY_DELAY).await;
                self.source.snapshot().await
            }
        }
    }

    async fn screenshot(&self) -> Option<String> {
        if !self.config.capture_screenshot {
            return None;
        }
        match self.source.screenshot().await {
            Ok(screenshot) => screenshot,
            Err(e) => {
                log::warn!("Screenshot failed, continuing without: {}", e);
                None
            }
        }
    }

    fn transition(&mut self, next: DriverState) {
        log::debug!("Driver state {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    async fn record(
        &self,
        run: &mut Run,
        step: usize,
        action: Action,
        result: ExecutionResult,
        current_state: Option<CurrentState>,
    ) {
        if run.session.status == SessionStatus::Started {
            self.mark_in_progress(&mut run.session, false).await;
        }

        let record = StepRecord {
            step,
            action,
            result,
            current_state,
        };
        match serde_json::to_value(&record) {
            Ok(data) => {
                self.emit(&run.session.id, SessionEventType::StepAdded, data)
                    .await
            }
            Err(e) => log::warn!("Failed to serialize step {}: {}", step, e),
        }
        run.steps.push(record);
    }

    async fn mark_in_progress(&self, session: &mut GuideSession, resumed: bool) {
        session.status = SessionStatus::InProgress;
        if let Err(e) = self
            .log
            .set_status(&session.id, SessionStatus::InProgress)
            .await
        {
            log::warn!("Failed to record status for {}: {}", session.id, e);
        }
        let data = json!({ "status": SessionStatus::InProgress, "resumed": resumed });
        self.emit(&session.id, SessionEventType::StatusChanged, data)
            .await;
    }

    async fn close(&self, session: &mut GuideSession, termination: &Termination) {
        match termination {
            Termination::Done { success, text } => {
                log::info!("Guide session {} done (success: {})", session.id, success);
                let data = json!({ "success": success, "text": text });
                self.finish(session, SessionEventType::Completed, SessionStatus::Completed, data)
                    .await;
            }
            Termination::StepBudget => {
                let data = json!({ "success": false, "text": GIVE_UP_MESSAGE });
                self.finish(session, SessionEventType::Completed, SessionStatus::Completed, data)
                    .await;
            }
            Termination::Cancelled => {
                log::info!("Guide session {} cancelled", session.id);
                let data = json!({ "reason": "cancelled" });
                self.finish(session, SessionEventType::Abandoned, SessionStatus::Abandoned, data)
                    .await;
            }
            Termination::Paused => {
                log::info!("Guide session {} paused", session.id);
                self.finish(session, SessionEventType::Paused, SessionStatus::Paused, Value::Null)
                    .await;
            }
        }
    }

    /// Record the closing event, then the status; a closed session accepts
    /// no further events
    async fn finish(
        &self,
        session: &mut GuideSession,
        event_type: SessionEventType,
        status: SessionStatus,
        data: Value,
    ) {
        self.emit(&session.id, event_type, data).await;
        session.status = status;
        if let Err(e) = self.log.set_status(&session.id, status).await {
            log::warn!("Failed to record status for {}: {}", session.id, e);
        }
    }

    async fn emit(&self, session_id: &Uuid, event_type: SessionEventType, data: Value) {
        if let Err(e) = self
            .log
            .append(session_id, SessionEvent::new(event_type, data))
            .await
        {
            log::warn!(
                "Failed to record {:?} for session {}: {}",
                event_type,
                session_id,
                e
            );
        }
    }
}

/// Plan as shown to the model, with finished steps marked
fn plan_lines(steps: &[PlanStep]) -> Vec<String> {
    steps
        .iter()
        .map(|step| {
            if step.completed {
                format!("{} (completed)", step.description)
            } else {
                step.description.clone()
            }
        })
        .collect()
}

fn location_of(snapshot: &DomSnapshot) -> PageLocation {
    PageLocation {
        url: snapshot.url.clone(),
        title: snapshot.title.clone(),
    }
}
