//! Pipeline domain types shared by the service client, the monitor and the presenter.
//!
//! Raw state (`Execution`, `StageState`, `ActionState`) is re-fetched every
//! poll cycle and never persisted. Display types are what the correlator
//! produces from raw state for one tracked execution.

use std::fmt;

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

/// Opaque identifier of one pipeline execution.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ExecutionId(String);

impl ExecutionId {
    pub fn new(id: impl Into<String>) -> Self {
        ExecutionId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ExecutionId {
    fn from(s: &str) -> Self {
        ExecutionId(s.to_string())
    }
}

impl From<String> for ExecutionId {
    fn from(s: String) -> Self {
        ExecutionId(s)
    }
}

/// Lifecycle status of an execution, stage or action as reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionStatus {
    InProgress,
    Succeeded,
    Failed,
    Stopped,
    Unknown,
}

impl ExecutionStatus {
    /// Parse a status string from the remote service.
    ///
    /// `Superseded` and `Cancelled` executions make no further progress and
    /// are folded into `Stopped`. `Stopping` is still moving and anything the
    /// service adds later is `Unknown`.
    pub fn from_remote(raw: &str) -> Self {
        match raw {
            "InProgress" => ExecutionStatus::InProgress,
            "Succeeded" => ExecutionStatus::Succeeded,
            "Failed" => ExecutionStatus::Failed,
            "Stopped" | "Superseded" | "Cancelled" => ExecutionStatus::Stopped,
            _ => ExecutionStatus::Unknown,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ExecutionStatus::Succeeded | ExecutionStatus::Failed | ExecutionStatus::Stopped
        )
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionStatus::InProgress => write!(f, "InProgress"),
            ExecutionStatus::Succeeded => write!(f, "Succeeded"),
            ExecutionStatus::Failed => write!(f, "Failed"),
            ExecutionStatus::Stopped => write!(f, "Stopped"),
            ExecutionStatus::Unknown => write!(f, "Unknown"),
        }
    }
}

/// One run instance of a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    pub id: ExecutionId,
    pub status: ExecutionStatus,
}

// ---------------------------------------------------------------------------
// Raw stage / action state
// ---------------------------------------------------------------------------

/// Current state of one stage, exactly as the service reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageState {
    pub name: String,
    /// Execution the stage last ran for. `None` if the stage never ran.
    pub latest_execution_id: Option<ExecutionId>,
    pub status: ExecutionStatus,
    pub actions: Vec<ActionState>,
}

/// Current state of one action inside a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionState {
    pub name: String,
    /// Action category as reported by the service (e.g. `Approval`, `Build`).
    pub category: Option<String>,
    pub status: ExecutionStatus,
    /// Single-use approval token; only present while an approval action waits.
    pub approval_token: Option<String>,
}

/// Classification of an action for the approval gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Standard,
    ManualApproval,
}

/// Operator's answer to an approval prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalDecision {
    pub approved: bool,
    pub summary: String,
}

impl ApprovalDecision {
    /// Result string the service expects.
    pub fn result_status(&self) -> &'static str {
        if self.approved {
            "Approved"
        } else {
            "Rejected"
        }
    }
}

// ---------------------------------------------------------------------------
// Display state
// ---------------------------------------------------------------------------

/// Status of a stage or action relative to the tracked execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayStatus {
    NotYetRun,
    InProgress,
    Completed,
    Failed,
}

impl fmt::Display for DisplayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayStatus::NotYetRun => write!(f, "not yet run"),
            DisplayStatus::InProgress => write!(f, "in progress"),
            DisplayStatus::Completed => write!(f, "completed"),
            DisplayStatus::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayStage {
    pub name: String,
    pub status: DisplayStatus,
    pub actions: Vec<DisplayAction>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayAction {
    pub name: String,
    pub category: Option<String>,
    pub status: DisplayStatus,
    /// Carried only when the action belongs to the tracked execution and is in progress.
    pub approval_token: Option<String>,
}
