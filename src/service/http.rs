//! reqwest client for the pipeline service's JSON HTTP gateway.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Response, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{PipelineService, ServiceError};
use crate::config::ServiceConfig;
use crate::model::{
    ActionState, ApprovalDecision, Execution, ExecutionId, ExecutionStatus, StageState,
};

const PROFILE_HEADER: &str = "x-pipewatch-profile";
const REGION_HEADER: &str = "x-pipewatch-region";

/// Longest error body kept in a [`ServiceError::Status`] message.
const MAX_ERROR_BODY: usize = 512;

/// Pipeline service reached over HTTP.
pub struct HttpPipelineService {
    client: Client,
    base: Url,
}

impl HttpPipelineService {
    /// Build a client from the `[service]` configuration section.
    ///
    /// Every request is bounded by `request_timeout_secs`, so a hung
    /// service surfaces as a transient transport error.
    pub fn new(config: &ServiceConfig) -> Result<Self, ServiceError> {
        let base = Url::parse(&config.endpoint)
            .map_err(|e| ServiceError::InvalidRequest(format!("endpoint {}: {e}", config.endpoint)))?;
        if base.cannot_be_a_base() {
            return Err(ServiceError::InvalidRequest(format!(
                "endpoint {} cannot carry a path",
                config.endpoint
            )));
        }

        let mut headers = HeaderMap::new();
        if let Some(token) = &config.auth_token {
            headers.insert(AUTHORIZATION, header_value(&format!("Bearer {token}"))?);
        }
        if let Some(profile) = &config.profile {
            headers.insert(PROFILE_HEADER, header_value(profile)?);
        }
        if let Some(region) = &config.region {
            headers.insert(REGION_HEADER, header_value(region)?);
        }

        let client = Client::builder()
            .timeout(config.request_timeout())
            .default_headers(headers)
            .build()?;

        Ok(Self { client, base })
    }

    /// Append percent-encoded path segments to the base URL.
    fn url(&self, segments: &[&str]) -> Result<Url, ServiceError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ServiceError::InvalidRequest("endpoint cannot carry a path".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: Url) -> Result<T, ServiceError> {
        debug!(%url, "GET");
        let response = check_status(self.client.get(url).send().await?).await?;
        Ok(response.json::<T>().await?)
    }
}

fn header_value(raw: &str) -> Result<HeaderValue, ServiceError> {
    HeaderValue::from_str(raw).map_err(|e| ServiceError::InvalidRequest(format!("header value: {e}")))
}

async fn check_status(response: Response) -> Result<Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let mut message = response.text().await.unwrap_or_default();
    if message.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !message.is_char_boundary(cut) {
            cut -= 1;
        }
        message.truncate(cut);
    }
    Err(ServiceError::Status {
        status: status.as_u16(),
        message,
    })
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListPipelinesResponse {
    #[serde(default)]
    pipelines: Vec<PipelineSummary>,
}

#[derive(Debug, Deserialize)]
struct PipelineSummary {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListExecutionsResponse {
    #[serde(default)]
    pipeline_execution_summaries: Vec<ExecutionSummary>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetExecutionResponse {
    pipeline_execution: ExecutionSummary,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExecutionSummary {
    pipeline_execution_id: String,
    status: String,
}

impl From<ExecutionSummary> for Execution {
    fn from(s: ExecutionSummary) -> Self {
        Execution {
            id: ExecutionId::new(s.pipeline_execution_id),
            status: ExecutionStatus::from_remote(&s.status),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PipelineStateResponse {
    #[serde(default)]
    stage_states: Vec<StageStateDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StageStateDto {
    stage_name: String,
    latest_execution: Option<StageExecutionDto>,
    #[serde(default)]
    action_states: Vec<ActionStateDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StageExecutionDto {
    pipeline_execution_id: String,
    status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActionStateDto {
    action_name: String,
    category: Option<String>,
    latest_execution: Option<ActionExecutionDto>,
}

#[derive(Debug, Deserialize)]
struct ActionExecutionDto {
    status: String,
    token: Option<String>,
}

impl From<StageStateDto> for StageState {
    fn from(dto: StageStateDto) -> Self {
        let (latest_execution_id, status) = match dto.latest_execution {
            Some(exec) => (
                Some(ExecutionId::new(exec.pipeline_execution_id)),
                ExecutionStatus::from_remote(&exec.status),
            ),
            None => (None, ExecutionStatus::Unknown),
        };
        StageState {
            name: dto.stage_name,
            latest_execution_id,
            status,
            actions: dto.action_states.into_iter().map(ActionState::from).collect(),
        }
    }
}

impl From<ActionStateDto> for ActionState {
    fn from(dto: ActionStateDto) -> Self {
        let (status, approval_token) = match dto.latest_execution {
            Some(exec) => (ExecutionStatus::from_remote(&exec.status), exec.token),
            None => (ExecutionStatus::Unknown, None),
        };
        ActionState {
            name: dto.action_name,
            category: dto.category,
            status,
            approval_token,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApprovalRequest<'a> {
    stage_name: &'a str,
    action_name: &'a str,
    token: &'a str,
    result: ApprovalResult<'a>,
}

#[derive(Debug, Serialize)]
struct ApprovalResult<'a> {
    status: &'static str,
    summary: &'a str,
}

// ---------------------------------------------------------------------------
// PipelineService
// ---------------------------------------------------------------------------

#[async_trait::async_trait]
impl PipelineService for HttpPipelineService {
    async fn list_pipelines(&self) -> Result<Vec<String>, ServiceError> {
        let body: ListPipelinesResponse = self.get_json(self.url(&["pipelines"])?).await?;
        Ok(body.pipelines.into_iter().map(|p| p.name).collect())
    }

    async fn list_executions(
        &self,
        pipeline: &str,
        limit: u32,
    ) -> Result<Vec<Execution>, ServiceError> {
        let mut url = self.url(&["pipelines", pipeline, "executions"])?;
        url.query_pairs_mut()
            .append_pair("maxResults", &limit.to_string());
        let body: ListExecutionsResponse = self.get_json(url).await?;
        Ok(body
            .pipeline_execution_summaries
            .into_iter()
            .map(Execution::from)
            .collect())
    }

    async fn get_execution(
        &self,
        pipeline: &str,
        execution_id: &ExecutionId,
    ) -> Result<Execution, ServiceError> {
        let url = self.url(&["pipelines", pipeline, "executions", execution_id.as_str()])?;
        let body: GetExecutionResponse = self.get_json(url).await?;
        Ok(body.pipeline_execution.into())
    }

    async fn get_pipeline_state(&self, pipeline: &str) -> Result<Vec<StageState>, ServiceError> {
        let url = self.url(&["pipelines", pipeline, "state"])?;
        let body: PipelineStateResponse = self.get_json(url).await?;
        Ok(body.stage_states.into_iter().map(StageState::from).collect())
    }

    async fn submit_approval(
        &self,
        pipeline: &str,
        stage: &str,
        action: &str,
        token: &str,
        decision: &ApprovalDecision,
    ) -> Result<(), ServiceError> {
        let url = self.url(&["pipelines", pipeline, "approvals"])?;
        let request = ApprovalRequest {
            stage_name: stage,
            action_name: action,
            token,
            result: ApprovalResult {
                status: decision.result_status(),
                summary: &decision.summary,
            },
        };
        debug!(%url, %stage, %action, result = decision.result_status(), "POST approval");
        check_status(self.client.post(url).json(&request).send().await?).await?;
        Ok(())
    }
}
