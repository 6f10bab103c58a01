//! Manual-approval gate.
//!
//! Finds approval actions waiting on the tracked execution, asks the
//! operator for a decision and submits it. Each `(stage, action, token)`
//! is handled at most once per session, even while the service still
//! reports the action as in progress after the decision went through.

use std::collections::HashSet;

use tracing::{info, warn};

use super::MonitorError;
use crate::config::ApprovalConfig;
use crate::model::{ActionKind, ApprovalDecision, DisplayAction, DisplayStage, DisplayStatus};
use crate::operator::Operator;
use crate::service::PipelineService;

/// Decides which actions are manual approvals.
#[derive(Debug, Clone)]
pub struct ApprovalPolicy {
    categories: Vec<String>,
    names: Vec<String>,
}

impl ApprovalPolicy {
    pub fn new(config: &ApprovalConfig) -> Self {
        Self {
            categories: config.action_categories.clone(),
            names: config.action_names.clone(),
        }
    }

    pub fn classify(&self, action: &DisplayAction) -> ActionKind {
        let by_category = action
            .category
            .as_ref()
            .is_some_and(|c| self.categories.iter().any(|x| x == c));
        let by_name = self.names.iter().any(|n| *n == action.name);
        if by_category || by_name {
            ActionKind::ManualApproval
        } else {
            ActionKind::Standard
        }
    }
}

/// One approval action occurrence waiting for a decision.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PendingApproval {
    pub stage: String,
    pub action: String,
    pub token: String,
}

pub struct ApprovalGate<'a> {
    service: &'a dyn PipelineService,
    policy: ApprovalPolicy,
    handled: HashSet<PendingApproval>,
}

impl<'a> ApprovalGate<'a> {
    pub fn new(service: &'a dyn PipelineService, config: &ApprovalConfig) -> Self {
        Self {
            service,
            policy: ApprovalPolicy::new(config),
            handled: HashSet::new(),
        }
    }

    /// Number of decisions submitted so far.
    pub fn submitted(&self) -> usize {
        self.handled.len()
    }

    /// First in-progress approval action that has not been handled yet.
    pub fn next_pending(&self, stages: &[DisplayStage]) -> Option<PendingApproval> {
        for stage in stages {
            for action in &stage.actions {
                if action.status != DisplayStatus::InProgress
                    || self.policy.classify(action) != ActionKind::ManualApproval
                {
                    continue;
                }
                let Some(token) = &action.approval_token else {
                    // The service has not issued the token yet; the next poll will see it.
                    continue;
                };
                let pending = PendingApproval {
                    stage: stage.name.clone(),
                    action: action.name.clone(),
                    token: token.clone(),
                };
                if !self.handled.contains(&pending) {
                    return Some(pending);
                }
            }
        }
        None
    }

    /// Ask the operator about `pending` and submit the answer once.
    ///
    /// A failed submission is fatal: the token may already be consumed.
    pub async fn resolve(
        &mut self,
        pipeline: &str,
        pending: PendingApproval,
        operator: &dyn Operator,
    ) -> Result<ApprovalDecision, MonitorError> {
        let approved = operator
            .confirm(
                &format!(
                    "Approve action '{}' in stage '{}'?",
                    pending.action, pending.stage
                ),
                true,
            )
            .await?;
        let summary = operator.read_text("Approval summary").await?;
        let decision = ApprovalDecision { approved, summary };

        // Recorded before the call so nothing can send this token twice.
        self.handled.insert(pending.clone());

        self.service
            .submit_approval(
                pipeline,
                &pending.stage,
                &pending.action,
                &pending.token,
                &decision,
            )
            .await
            .map_err(|source| {
                warn!(stage = %pending.stage, action = %pending.action, error = %source, "approval submission failed");
                MonitorError::ApprovalSubmission {
                    stage: pending.stage.clone(),
                    action: pending.action.clone(),
                    source,
                }
            })?;

        info!(
            %pipeline,
            stage = %pending.stage,
            action = %pending.action,
            result = decision.result_status(),
            "approval submitted"
        );
        Ok(decision)
    }
}
