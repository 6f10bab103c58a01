use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pipewatch::config::LoggingConfig;
use pipewatch::operator::TerminalOperator;
use pipewatch::render::TerminalPresenter;
use pipewatch::retry::RetryPolicy;
use pipewatch::{
    HttpPipelineService, MonitorConfig, MonitorError, MonitorSession, PipelineService,
};

#[derive(Parser)]
#[command(
    name = "pipewatch",
    about = "Terminal monitor for pipeline executions with manual-approval gating",
    version,
    long_about = None
)]
struct Cli {
    /// Configuration file (default: $PIPEWATCH_CONFIG, then ./pipewatch.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Pipeline service base URL
    #[arg(long, global = true, env = "PIPEWATCH_ENDPOINT")]
    endpoint: Option<String>,

    /// Credential profile forwarded to the service
    #[arg(short, long, global = true)]
    profile: Option<String>,

    /// Region forwarded to the service
    #[arg(short, long, global = true)]
    region: Option<String>,

    /// Emit JSON log lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Follow the active execution of a pipeline until it finishes
    #[command(alias = "status")]
    Monitor {
        /// Pipeline to monitor; prompts for one if omitted
        #[arg(long)]
        pipeline: Option<String>,
    },

    /// List pipelines visible to the configured credentials
    Pipelines,
}

impl Cli {
    fn apply_overrides(&self, config: &mut MonitorConfig) {
        if let Some(endpoint) = &self.endpoint {
            config.service.endpoint = endpoint.clone();
        }
        if let Some(profile) = &self.profile {
            config.service.profile = Some(profile.clone());
        }
        if let Some(region) = &self.region {
            config.service.region = Some(region.clone());
        }
        if self.log_json {
            config.logging.json = true;
        }
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Run `f` with a stderr subscriber at `warn` (or `RUST_LOG`) so warnings
/// raised before the configured subscriber exists still reach the user.
fn with_bootstrap_logging<T>(f: impl FnOnce() -> T) -> T {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::with_default(subscriber, f)
}

fn configure(cli: &Cli) -> Result<MonitorConfig> {
    let mut config = with_bootstrap_logging(|| MonitorConfig::resolve(cli.config.as_deref()))
        .context("failed to load configuration")?;
    cli.apply_overrides(&mut config);
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn startup_error(e: anyhow::Error) -> MonitorError {
    MonitorError::Configuration(format!("{e:#}"))
}

async fn run(cli: Cli) -> Result<ExitCode, MonitorError> {
    let config = configure(&cli).map_err(startup_error)?;

    init_tracing(&config.logging);

    let service = HttpPipelineService::new(&config.service)
        .context("failed to create pipeline service client")
        .map_err(startup_error)?;

    match cli.command {
        Commands::Pipelines => {
            let pipelines = RetryPolicy::new(&config.retry)
                .run("list_pipelines", || service.list_pipelines())
                .await
                .map_err(|e| MonitorError::FetchExhausted {
                    call: "list_pipelines",
                    attempts: e.attempts,
                    source: e.last_error,
                })?;
            if pipelines.is_empty() {
                println!("No pipelines found.");
            } else {
                for name in pipelines {
                    println!("{name}");
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Monitor { pipeline } => {
            let operator = TerminalOperator;
            let mut presenter = TerminalPresenter::stdout();
            let mut session = MonitorSession::new(&config, &service, &operator, &mut presenter);

            let pipeline = session.choose_pipeline(pipeline.as_deref()).await?;

            tracing::info!(%pipeline, "starting monitor");
            // The presenter has already reported the outcome or the fatal error.
            let code = match session.run(&pipeline).await {
                Ok(outcome) => outcome.status.exit_code(),
                Err(e) => e.exit_code(),
            };
            Ok(ExitCode::from(code))
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}
