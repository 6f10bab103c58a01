//! Remote pipeline-orchestration service.
//!
//! The monitor only talks to the service through [`PipelineService`], so the
//! HTTP client in [`http`] can be swapped for a scripted fake in tests.

pub mod http;

use thiserror::Error;

use crate::model::{ApprovalDecision, Execution, ExecutionId, StageState};

pub use self::http::HttpPipelineService;

/// Errors from a single remote call.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Connection, TLS or timeout failure before a response arrived.
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered with a non-success HTTP status.
    #[error("service returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body did not match the expected shape.
    #[error("malformed response: {0}")]
    Decode(String),

    /// The request could not be built (bad endpoint URL or header value).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ServiceError {
    /// Whether retrying the same call later might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ServiceError::Transport(_) => true,
            ServiceError::Status { status, .. } => *status == 429 || *status >= 500,
            ServiceError::Decode(_) | ServiceError::InvalidRequest(_) => false,
        }
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ServiceError::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            ServiceError::Status {
                status: status.as_u16(),
                message: e.to_string(),
            }
        } else {
            ServiceError::Transport(e.to_string())
        }
    }
}

/// Operations the monitor needs from the pipeline service.
#[async_trait::async_trait]
pub trait PipelineService: Send + Sync {
    /// Names of all pipelines visible to the configured credentials.
    async fn list_pipelines(&self) -> Result<Vec<String>, ServiceError>;

    /// Most recent executions of `pipeline`, newest first.
    async fn list_executions(
        &self,
        pipeline: &str,
        limit: u32,
    ) -> Result<Vec<Execution>, ServiceError>;

    /// Current status of one execution.
    async fn get_execution(
        &self,
        pipeline: &str,
        execution_id: &ExecutionId,
    ) -> Result<Execution, ServiceError>;

    /// Full stage/action state of `pipeline` in one call.
    async fn get_pipeline_state(&self, pipeline: &str) -> Result<Vec<StageState>, ServiceError>;

    /// Record an approval decision for the action holding `token`.
    async fn submit_approval(
        &self,
        pipeline: &str,
        stage: &str,
        action: &str,
        token: &str,
        decision: &ApprovalDecision,
    ) -> Result<(), ServiceError>;
}
