//! Scripted collaborators for monitor unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::config::ServiceConfig;
use crate::model::{
    ActionState, ApprovalDecision, DisplayStage, Execution, ExecutionId, ExecutionStatus,
    StageState,
};
use crate::monitor::{MonitorError, MonitorOutcome, PendingApproval, TerminalStatus};
use crate::operator::{Operator, OperatorError};
use crate::render::Presenter;
use crate::service::{PipelineService, ServiceError};

/// Scripted reply: `Err(0)` is a transport failure, any other code an HTTP status.
pub type Reply<T> = Result<T, u16>;

fn to_error(code: u16) -> ServiceError {
    if code == 0 {
        ServiceError::Transport("connection reset".into())
    } else {
        ServiceError::Status {
            status: code,
            message: "scripted".into(),
        }
    }
}

/// Replies handed out in order; the last one repeats forever.
struct Script<T>(VecDeque<Reply<T>>);

impl<T: Clone> Script<T> {
    fn next(&mut self, what: &str) -> Result<T, ServiceError> {
        let reply = if self.0.len() > 1 {
            self.0.pop_front()
        } else {
            self.0.front().cloned()
        };
        reply
            .unwrap_or_else(|| panic!("no scripted reply for {what}"))
            .map_err(to_error)
    }
}

impl<T> Default for Script<T> {
    fn default() -> Self {
        Script(VecDeque::new())
    }
}

#[derive(Debug, Clone)]
pub struct SubmittedApproval {
    pub stage: String,
    pub action: String,
    pub token: String,
    pub decision: ApprovalDecision,
}

#[derive(Default)]
pub struct ScriptedService {
    pipelines: Vec<String>,
    executions: Mutex<Script<Vec<Execution>>>,
    statuses: Mutex<Script<ExecutionStatus>>,
    states: Mutex<Script<Vec<StageState>>>,
    approval_replies: Mutex<Script<()>>,
    calls: Mutex<HashMap<&'static str, usize>>,
    approvals: Mutex<Vec<SubmittedApproval>>,
}

impl ScriptedService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pipelines(mut self, names: Vec<&str>) -> Self {
        self.pipelines = names.into_iter().map(str::to_string).collect();
        self
    }

    pub fn executions(self, replies: Vec<Reply<Vec<Execution>>>) -> Self {
        *self.executions.lock().unwrap() = Script(replies.into());
        self
    }

    pub fn statuses(self, replies: Vec<Reply<ExecutionStatus>>) -> Self {
        *self.statuses.lock().unwrap() = Script(replies.into());
        self
    }

    pub fn states(self, replies: Vec<Reply<Vec<StageState>>>) -> Self {
        *self.states.lock().unwrap() = Script(replies.into());
        self
    }

    pub fn approval_replies(self, replies: Vec<Reply<()>>) -> Self {
        *self.approval_replies.lock().unwrap() = Script(replies.into());
        self
    }

    pub fn calls(&self, what: &str) -> usize {
        self.calls.lock().unwrap().get(what).copied().unwrap_or(0)
    }

    pub fn approvals(&self) -> Vec<SubmittedApproval> {
        self.approvals.lock().unwrap().clone()
    }

    fn record(&self, what: &'static str) {
        *self.calls.lock().unwrap().entry(what).or_default() += 1;
    }
}

#[async_trait::async_trait]
impl PipelineService for ScriptedService {
    async fn list_pipelines(&self) -> Result<Vec<String>, ServiceError> {
        self.record("list_pipelines");
        Ok(self.pipelines.clone())
    }

    async fn list_executions(&self, _pipeline: &str, _limit: u32) -> Result<Vec<Execution>, ServiceError> {
        self.record("list_executions");
        self.executions.lock().unwrap().next("list_executions")
    }

    async fn get_execution(
        &self,
        _pipeline: &str,
        execution_id: &ExecutionId,
    ) -> Result<Execution, ServiceError> {
        self.record("get_execution");
        let status = self.statuses.lock().unwrap().next("get_execution")?;
        Ok(Execution {
            id: execution_id.clone(),
            status,
        })
    }

    async fn get_pipeline_state(&self, _pipeline: &str) -> Result<Vec<StageState>, ServiceError> {
        self.record("get_pipeline_state");
        self.states.lock().unwrap().next("get_pipeline_state")
    }

    async fn submit_approval(
        &self,
        _pipeline: &str,
        stage: &str,
        action: &str,
        token: &str,
        decision: &ApprovalDecision,
    ) -> Result<(), ServiceError> {
        self.record("submit_approval");
        {
            let mut replies = self.approval_replies.lock().unwrap();
            if !replies.0.is_empty() {
                replies.next("submit_approval")?;
            }
        }
        self.approvals.lock().unwrap().push(SubmittedApproval {
            stage: stage.to_string(),
            action: action.to_string(),
            token: token.to_string(),
            decision: decision.clone(),
        });
        Ok(())
    }
}

/// Operator answering from fixed queues.
#[derive(Default)]
pub struct ScriptedOperator {
    selection: Option<String>,
    confirms: Mutex<VecDeque<bool>>,
    texts: Mutex<VecDeque<String>>,
    asked: Mutex<usize>,
}

impl ScriptedOperator {
    pub fn answering(confirms: Vec<bool>, texts: Vec<&str>) -> Self {
        Self {
            confirms: Mutex::new(confirms.into()),
            texts: Mutex::new(texts.into_iter().map(str::to_string).collect()),
            ..Self::default()
        }
    }

    pub fn selecting(mut self, name: &str) -> Self {
        self.selection = Some(name.to_string());
        self
    }

    /// Number of confirmation prompts shown.
    pub fn confirms(&self) -> usize {
        *self.asked.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl Operator for ScriptedOperator {
    async fn select_pipeline(&self, _names: &[String]) -> Result<String, OperatorError> {
        self.selection.clone().ok_or(OperatorError::InputClosed)
    }

    async fn confirm(&self, _prompt: &str, _default: bool) -> Result<bool, OperatorError> {
        *self.asked.lock().unwrap() += 1;
        self.confirms
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(OperatorError::InputClosed)
    }

    async fn read_text(&self, _prompt: &str) -> Result<String, OperatorError> {
        self.texts
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(OperatorError::InputClosed)
    }
}

#[derive(Default)]
pub struct RecordingPresenter {
    pub waiting: usize,
    pub renders: Vec<Vec<DisplayStage>>,
    pub approvals: Vec<PendingApproval>,
    pub finished: Vec<TerminalStatus>,
    pub fatal: Vec<String>,
}

impl Presenter for RecordingPresenter {
    fn header(&mut self, _pipeline: &str, _service: &ServiceConfig) {}

    fn waiting(&mut self, _pipeline: &str, _latest: &Execution) {
        self.waiting += 1;
    }

    fn render(
        &mut self,
        _pipeline: &str,
        _execution: &ExecutionId,
        _status: ExecutionStatus,
        stages: &[DisplayStage],
    ) {
        self.renders.push(stages.to_vec());
    }

    fn approval_required(&mut self, pending: &PendingApproval) {
        self.approvals.push(pending.clone());
    }

    fn finished(&mut self, outcome: &MonitorOutcome) {
        self.finished.push(outcome.status);
    }

    fn fatal(&mut self, error: &MonitorError) {
        self.fatal.push(error.to_string());
    }
}

pub fn exec(id: &str, status: ExecutionStatus) -> Execution {
    Execution {
        id: ExecutionId::from(id),
        status,
    }
}

pub fn stage(
    name: &str,
    exec: Option<&str>,
    status: ExecutionStatus,
    actions: Vec<ActionState>,
) -> StageState {
    StageState {
        name: name.to_string(),
        latest_execution_id: exec.map(ExecutionId::from),
        status,
        actions,
    }
}

pub fn action(
    name: &str,
    category: Option<&str>,
    status: ExecutionStatus,
    token: Option<&str>,
) -> ActionState {
    ActionState {
        name: name.to_string(),
        category: category.map(str::to_string),
        status,
        approval_token: token.map(str::to_string),
    }
}
