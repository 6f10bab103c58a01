//! pipewatch -- terminal monitor for pipeline executions.
//!
//! This crate tracks the in-progress execution of a pipeline on a remote
//! orchestration service, renders its stage/action progress, and gates
//! manual approvals through the operator.

pub mod config;
pub mod model;
pub mod monitor;
pub mod operator;
pub mod render;
pub mod retry;
pub mod service;

pub use config::MonitorConfig;
pub use monitor::{MonitorError, MonitorOutcome, MonitorSession, TerminalStatus};
pub use service::{HttpPipelineService, PipelineService, ServiceError};
