//! Terminal rendering of monitor progress.

use std::io::{self, Stdout, Write};

use tracing::debug;

use crate::config::ServiceConfig;
use crate::model::{DisplayStage, DisplayStatus, Execution, ExecutionId, ExecutionStatus};
use crate::monitor::{MonitorError, MonitorOutcome, PendingApproval, TerminalStatus};

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";
const HIDE_CURSOR: &str = "\x1b[?25l";
const SHOW_CURSOR: &str = "\x1b[?25h";

/// Display surface for a monitoring session.
pub trait Presenter: Send {
    /// Session banner: which pipeline and which service it runs against.
    fn header(&mut self, pipeline: &str, service: &ServiceConfig);

    /// The latest execution is not running yet.
    fn waiting(&mut self, pipeline: &str, latest: &Execution);

    /// Full snapshot of the tracked execution.
    fn render(
        &mut self,
        pipeline: &str,
        execution: &ExecutionId,
        status: ExecutionStatus,
        stages: &[DisplayStage],
    );

    fn approval_required(&mut self, pending: &PendingApproval);

    fn finished(&mut self, outcome: &MonitorOutcome);

    fn fatal(&mut self, error: &MonitorError);
}

/// ANSI terminal presenter that redraws the whole screen on each snapshot.
pub struct TerminalPresenter<W: Write + Send = Stdout> {
    out: W,
    redraw: bool,
}

impl TerminalPresenter<Stdout> {
    pub fn stdout() -> Self {
        Self {
            out: io::stdout(),
            redraw: true,
        }
    }
}

impl<W: Write + Send> TerminalPresenter<W> {
    /// Plain output without cursor control, for pipes and tests.
    pub fn plain(out: W) -> Self {
        Self { out, redraw: false }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn clear(&mut self) -> io::Result<()> {
        if self.redraw {
            write!(self.out, "{HIDE_CURSOR}{CLEAR_SCREEN}")?;
        }
        Ok(())
    }

    fn restore_cursor(&mut self) -> io::Result<()> {
        if self.redraw {
            write!(self.out, "{SHOW_CURSOR}")?;
        }
        Ok(())
    }

    fn draw(&mut self, f: impl FnOnce(&mut Self) -> io::Result<()>) {
        let result = f(self).and_then(|_| self.out.flush());
        if let Err(e) = result {
            debug!(error = %e, "failed to write to terminal");
        }
    }
}

fn stage_line(stage: &DisplayStage) -> String {
    match stage.status {
        DisplayStatus::Completed => format!("✅ Stage {} has completed", stage.name),
        DisplayStatus::InProgress => format!("⏳ Stage {} is in progress", stage.name),
        DisplayStatus::Failed => format!("❌ Stage {} has failed", stage.name),
        DisplayStatus::NotYetRun => format!("·  Stage {} not yet run", stage.name),
    }
}

fn action_marker(status: DisplayStatus) -> &'static str {
    match status {
        DisplayStatus::Completed => "✅",
        DisplayStatus::InProgress => "⏳",
        DisplayStatus::Failed => "❌",
        DisplayStatus::NotYetRun => "· ",
    }
}

impl<W: Write + Send> Presenter for TerminalPresenter<W> {
    fn header(&mut self, pipeline: &str, service: &ServiceConfig) {
        self.draw(|p| {
            writeln!(p.out, "Pipeline monitor for {pipeline}")?;
            writeln!(p.out, "  Endpoint: {}", service.endpoint)?;
            writeln!(
                p.out,
                "  Profile:  {}",
                service.profile.as_deref().unwrap_or("default credentials")
            )?;
            if let Some(region) = &service.region {
                writeln!(p.out, "  Region:   {region}")?;
            }
            Ok(())
        });
    }

    fn waiting(&mut self, pipeline: &str, latest: &Execution) {
        self.draw(|p| {
            p.clear()?;
            writeln!(p.out, "Monitoring pipeline: {pipeline}")?;
            writeln!(
                p.out,
                "Warning: no active execution detected (latest {} is {}), polling for an in-progress execution",
                latest.id, latest.status
            )
        });
    }

    fn render(
        &mut self,
        pipeline: &str,
        execution: &ExecutionId,
        status: ExecutionStatus,
        stages: &[DisplayStage],
    ) {
        self.draw(|p| {
            p.clear()?;
            writeln!(p.out, "Monitoring pipeline: {pipeline}")?;
            writeln!(p.out, "Execution {execution}: {status}")?;
            writeln!(
                p.out,
                "Last refreshed {}",
                chrono::Local::now().format("%H:%M:%S")
            )?;
            writeln!(p.out)?;
            for stage in stages {
                writeln!(p.out, "{}", stage_line(stage))?;
                if stage.status == DisplayStatus::NotYetRun {
                    continue;
                }
                for action in &stage.actions {
                    writeln!(
                        p.out,
                        "    {} Action {} {}",
                        action_marker(action.status),
                        action.name,
                        action.status
                    )?;
                }
            }
            Ok(())
        });
    }

    fn approval_required(&mut self, pending: &PendingApproval) {
        self.draw(|p| {
            p.restore_cursor()?;
            writeln!(p.out)?;
            writeln!(
                p.out,
                "Manual approval required: action '{}' in stage '{}'",
                pending.action, pending.stage
            )
        });
    }

    fn finished(&mut self, outcome: &MonitorOutcome) {
        self.draw(|p| {
            p.restore_cursor()?;
            writeln!(p.out)?;
            match outcome.status {
                TerminalStatus::Succeeded => writeln!(
                    p.out,
                    "✅ Pipeline {} execution {} has completed successfully",
                    outcome.pipeline, outcome.execution_id
                ),
                TerminalStatus::Failed => writeln!(
                    p.out,
                    "❌ Pipeline {} execution {} has failed",
                    outcome.pipeline, outcome.execution_id
                ),
                TerminalStatus::Stopped => writeln!(
                    p.out,
                    "⛔ Pipeline {} execution {} has been stopped",
                    outcome.pipeline, outcome.execution_id
                ),
            }
        });
    }

    fn fatal(&mut self, error: &MonitorError) {
        self.draw(|p| {
            p.restore_cursor()?;
            writeln!(p.out)?;
            writeln!(p.out, "❌ {error}")
        });
    }
}
