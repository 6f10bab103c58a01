//! Terminal execution statuses and the outcome reported to the caller.

use std::fmt;

use crate::model::{ExecutionId, ExecutionStatus};

/// How the tracked execution ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalStatus {
    Succeeded,
    Failed,
    Stopped,
}

impl TerminalStatus {
    /// `None` while the execution can still make progress.
    pub fn classify(status: ExecutionStatus) -> Option<Self> {
        match status {
            ExecutionStatus::Succeeded => Some(TerminalStatus::Succeeded),
            ExecutionStatus::Failed => Some(TerminalStatus::Failed),
            ExecutionStatus::Stopped => Some(TerminalStatus::Stopped),
            ExecutionStatus::InProgress | ExecutionStatus::Unknown => None,
        }
    }

    pub fn exit_code(self) -> u8 {
        match self {
            TerminalStatus::Succeeded => 0,
            TerminalStatus::Failed => 1,
            TerminalStatus::Stopped => 2,
        }
    }
}

impl fmt::Display for TerminalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminalStatus::Succeeded => write!(f, "succeeded"),
            TerminalStatus::Failed => write!(f, "failed"),
            TerminalStatus::Stopped => write!(f, "stopped"),
        }
    }
}

/// Result of a monitoring session that reached a terminal status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorOutcome {
    pub pipeline: String,
    pub execution_id: ExecutionId,
    pub status: TerminalStatus,
    /// Poll cycles run against the tracked execution.
    pub polls: u64,
    pub approvals_submitted: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(
            TerminalStatus::classify(ExecutionStatus::Succeeded),
            Some(TerminalStatus::Succeeded)
        );
        assert_eq!(
            TerminalStatus::classify(ExecutionStatus::Failed),
            Some(TerminalStatus::Failed)
        );
        assert_eq!(
            TerminalStatus::classify(ExecutionStatus::Stopped),
            Some(TerminalStatus::Stopped)
        );
        assert_eq!(TerminalStatus::classify(ExecutionStatus::InProgress), None);
        assert_eq!(TerminalStatus::classify(ExecutionStatus::Unknown), None);
    }

    #[test]
    fn test_exit_codes_are_distinct() {
        let codes = [
            TerminalStatus::Succeeded.exit_code(),
            TerminalStatus::Failed.exit_code(),
            TerminalStatus::Stopped.exit_code(),
        ];
        assert_eq!(codes, [0, 1, 2]);
    }
}
