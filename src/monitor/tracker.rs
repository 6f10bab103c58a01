//! Finds the execution to monitor.

use std::time::Duration;

use tracing::{debug, info};

use super::MonitorError;
use crate::model::{Execution, ExecutionStatus};
use crate::render::Presenter;
use crate::retry::RetryPolicy;
use crate::service::PipelineService;

pub struct ExecutionTracker<'a> {
    service: &'a dyn PipelineService,
    retry: RetryPolicy,
    idle_interval: Duration,
}

impl<'a> ExecutionTracker<'a> {
    pub fn new(service: &'a dyn PipelineService, retry: RetryPolicy, idle_interval: Duration) -> Self {
        Self {
            service,
            retry,
            idle_interval,
        }
    }

    /// Wait until the most recent execution of `pipeline` is in progress and return it.
    ///
    /// Waits indefinitely while the latest execution is finished. A pipeline
    /// with no executions at all is a configuration problem and fails at once.
    pub async fn await_active_execution(
        &self,
        pipeline: &str,
        presenter: &mut dyn Presenter,
    ) -> Result<Execution, MonitorError> {
        let mut polls: u64 = 0;
        loop {
            polls += 1;
            let executions = self
                .retry
                .run("list_executions", || self.service.list_executions(pipeline, 1))
                .await
                .map_err(|e| MonitorError::fetch("list_executions", e))?;

            let Some(latest) = executions.into_iter().next() else {
                return Err(MonitorError::Configuration(format!(
                    "pipeline '{pipeline}' has no executions"
                )));
            };

            if latest.status == ExecutionStatus::InProgress {
                info!(%pipeline, execution = %latest.id, polls, "tracking execution");
                return Ok(latest);
            }

            debug!(%pipeline, execution = %latest.id, status = %latest.status, "no active execution");
            presenter.waiting(pipeline, &latest);
            tokio::time::sleep(self.idle_interval).await;
        }
    }
}
