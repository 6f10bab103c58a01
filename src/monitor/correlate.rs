//! Maps raw pipeline state onto the tracked execution.
//!
//! The service reports each stage's most recent run, which may belong to an
//! earlier execution. Anything not bound to the tracked execution is shown
//! as not yet run, whatever its raw status says.

use crate::model::{
    ActionState, DisplayAction, DisplayStage, DisplayStatus, ExecutionId, ExecutionStatus,
    StageState,
};

/// Correlate raw stage state with the tracked execution.
///
/// Pure: the same inputs always yield the same output.
pub fn correlate(tracked: &ExecutionId, stages: &[StageState]) -> Vec<DisplayStage> {
    stages.iter().map(|stage| correlate_stage(tracked, stage)).collect()
}

fn correlate_stage(tracked: &ExecutionId, stage: &StageState) -> DisplayStage {
    // Actions carry no execution id of their own; they inherit the stage's.
    let current = stage.latest_execution_id.as_ref() == Some(tracked);

    let status = if current {
        display_status(stage.status)
    } else {
        DisplayStatus::NotYetRun
    };

    DisplayStage {
        name: stage.name.clone(),
        status,
        actions: stage
            .actions
            .iter()
            .map(|action| correlate_action(current, action))
            .collect(),
    }
}

fn correlate_action(current: bool, action: &ActionState) -> DisplayAction {
    let status = if current {
        display_status(action.status)
    } else {
        DisplayStatus::NotYetRun
    };
    let approval_token = match status {
        DisplayStatus::InProgress => action.approval_token.clone(),
        _ => None,
    };
    DisplayAction {
        name: action.name.clone(),
        category: action.category.clone(),
        status,
        approval_token,
    }
}

fn display_status(raw: ExecutionStatus) -> DisplayStatus {
    match raw {
        ExecutionStatus::Succeeded => DisplayStatus::Completed,
        ExecutionStatus::InProgress => DisplayStatus::InProgress,
        ExecutionStatus::Failed => DisplayStatus::Failed,
        ExecutionStatus::Stopped | ExecutionStatus::Unknown => DisplayStatus::NotYetRun,
    }
}
