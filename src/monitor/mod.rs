//! Pipeline execution monitor.
//!
//! A [`MonitorSession`] waits for an in-progress execution, then polls its
//! stage state, renders it, handles manual approvals and stops once the
//! execution reaches a terminal status. The session never exits the
//! process; it returns a [`MonitorOutcome`] or a [`MonitorError`] and the
//! host maps either to an exit code.

pub mod approval;
pub mod correlate;
pub mod fetcher;
pub mod terminal;
pub mod tracker;

#[cfg(test)]
pub(crate) mod fake;

use thiserror::Error;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::config::MonitorConfig;
use crate::model::{DisplayStage, ExecutionStatus};
use crate::operator::{Operator, OperatorError};
use crate::render::Presenter;
use crate::retry::{RetryExhausted, RetryPolicy};
use crate::service::{PipelineService, ServiceError};

pub use self::approval::{ApprovalGate, ApprovalPolicy, PendingApproval};
pub use self::correlate::correlate;
pub use self::fetcher::StateFetcher;
pub use self::terminal::{MonitorOutcome, TerminalStatus};
pub use self::tracker::ExecutionTracker;

/// Fatal conditions that end a monitoring session.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// No pipelines, unknown pipeline, or a pipeline without executions.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A remote read kept failing after the retry budget was spent.
    #[error("{call} failed after {attempts} attempt(s): {source}")]
    FetchExhausted {
        call: &'static str,
        attempts: u32,
        #[source]
        source: ServiceError,
    },

    /// The approval decision could not be recorded. Never retried.
    #[error("failed to submit approval for action '{action}' in stage '{stage}': {source}")]
    ApprovalSubmission {
        stage: String,
        action: String,
        #[source]
        source: ServiceError,
    },

    #[error("operator interaction failed: {0}")]
    Operator(#[from] OperatorError),
}

impl MonitorError {
    pub(crate) fn fetch(call: &'static str, e: RetryExhausted) -> Self {
        MonitorError::FetchExhausted {
            call,
            attempts: e.attempts,
            source: e.last_error,
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            MonitorError::Configuration(_) => 3,
            MonitorError::FetchExhausted { .. } => 4,
            MonitorError::ApprovalSubmission { .. } => 5,
            MonitorError::Operator(_) => 6,
        }
    }
}

/// States of the monitoring loop. `Terminal` is absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Polling,
    Rendering,
    AwaitingApproval,
    Terminal(TerminalStatus),
}

/// One monitoring session over one pipeline.
pub struct MonitorSession<'a> {
    config: &'a MonitorConfig,
    service: &'a dyn PipelineService,
    operator: &'a dyn Operator,
    presenter: &'a mut dyn Presenter,
}

impl<'a> MonitorSession<'a> {
    pub fn new(
        config: &'a MonitorConfig,
        service: &'a dyn PipelineService,
        operator: &'a dyn Operator,
        presenter: &'a mut dyn Presenter,
    ) -> Self {
        Self {
            config,
            service,
            operator,
            presenter,
        }
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(&self.config.retry)
    }

    /// Resolve the pipeline to monitor.
    ///
    /// A requested name must exist; without one the operator picks from the
    /// listed pipelines.
    pub async fn choose_pipeline(&mut self, requested: Option<&str>) -> Result<String, MonitorError> {
        let service = self.service;
        let pipelines = self
            .retry_policy()
            .run("list_pipelines", || service.list_pipelines())
            .await
            .map_err(|e| MonitorError::fetch("list_pipelines", e))?;

        if pipelines.is_empty() {
            return Err(MonitorError::Configuration(
                "no pipelines found; check the service endpoint and credentials".into(),
            ));
        }

        match requested {
            Some(name) if pipelines.iter().any(|p| p == name) => Ok(name.to_string()),
            Some(name) => Err(MonitorError::Configuration(format!(
                "pipeline '{name}' not found"
            ))),
            None => Ok(self.operator.select_pipeline(&pipelines).await?),
        }
    }

    /// Monitor `pipeline` until its tracked execution is terminal.
    pub async fn run(&mut self, pipeline: &str) -> Result<MonitorOutcome, MonitorError> {
        let session_id = uuid::Uuid::new_v4();
        let span = info_span!("monitor", session = %session_id, %pipeline);
        let result = self.run_inner(pipeline).instrument(span).await;
        match &result {
            Ok(outcome) => self.presenter.finished(outcome),
            Err(e) => self.presenter.fatal(e),
        }
        result
    }

    async fn run_inner(&mut self, pipeline: &str) -> Result<MonitorOutcome, MonitorError> {
        let service = self.service;
        let config = self.config;

        self.presenter.header(pipeline, &config.service);

        let tracker = ExecutionTracker::new(service, self.retry_policy(), config.polling.idle_interval());
        let execution = tracker
            .await_active_execution(pipeline, &mut *self.presenter)
            .await?;

        // Fixed for the whole session.
        let tracked = execution.id;
        let mut status = execution.status;

        let fetcher = StateFetcher::new(service, self.retry_policy());
        let mut gate = ApprovalGate::new(service, &config.approval);
        let mut display: Vec<DisplayStage> = Vec::new();
        let mut polls: u64 = 0;
        let mut state = MonitorState::Polling;

        loop {
            debug!(?state, execution = %tracked, "monitor state");
            state = match state {
                MonitorState::Polling => {
                    let stages = fetcher.fetch_state(pipeline).await?;
                    display = correlate(&tracked, &stages);
                    polls += 1;
                    MonitorState::Rendering
                }
                MonitorState::Rendering => {
                    self.presenter.render(pipeline, &tracked, status, &display);

                    if gate.next_pending(&display).is_some() {
                        MonitorState::AwaitingApproval
                    } else {
                        status = fetcher.fetch_status(pipeline, &tracked).await?;
                        match TerminalStatus::classify(status) {
                            Some(terminal) => MonitorState::Terminal(terminal),
                            None => {
                                if status == ExecutionStatus::Unknown {
                                    warn!(execution = %tracked, "execution status not recognised, still polling");
                                }
                                tokio::time::sleep(config.polling.poll_interval()).await;
                                MonitorState::Polling
                            }
                        }
                    }
                }
                MonitorState::AwaitingApproval => {
                    if let Some(pending) = gate.next_pending(&display) {
                        self.presenter.approval_required(&pending);
                        gate.resolve(pipeline, pending, self.operator).await?;
                    }
                    MonitorState::Rendering
                }
                MonitorState::Terminal(terminal) => {
                    info!(execution = %tracked, status = %terminal, polls, "execution finished");
                    return Ok(MonitorOutcome {
                        pipeline: pipeline.to_string(),
                        execution_id: tracked,
                        status: terminal,
                        polls,
                        approvals_submitted: gate.submitted(),
                    });
                }
            };
        }
    }
}
