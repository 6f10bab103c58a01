//! Fetches pipeline state and execution status for the main loop.

use super::MonitorError;
use crate::model::{ExecutionId, ExecutionStatus, StageState};
use crate::retry::RetryPolicy;
use crate::service::PipelineService;

/// Remote reads made on every poll cycle, each retried on transient failure.
pub struct StateFetcher<'a> {
    service: &'a dyn PipelineService,
    retry: RetryPolicy,
}

impl<'a> StateFetcher<'a> {
    pub fn new(service: &'a dyn PipelineService, retry: RetryPolicy) -> Self {
        Self { service, retry }
    }

    /// Full stage graph of `pipeline`, unfiltered.
    pub async fn fetch_state(&self, pipeline: &str) -> Result<Vec<StageState>, MonitorError> {
        self.retry
            .run("get_pipeline_state", || self.service.get_pipeline_state(pipeline))
            .await
            .map_err(|e| MonitorError::fetch("get_pipeline_state", e))
    }

    /// Current status of the tracked execution, read separately from stage state.
    pub async fn fetch_status(
        &self,
        pipeline: &str,
        execution: &ExecutionId,
    ) -> Result<ExecutionStatus, MonitorError> {
        let current = self
            .retry
            .run("get_execution", || self.service.get_execution(pipeline, execution))
            .await
            .map_err(|e| MonitorError::fetch("get_execution", e))?;
        Ok(current.status)
    }
}
