use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use devstudio::approval::{ApprovalGate, TerminalNotifier};
use devstudio::cancellation::CancellationToken;
use devstudio::config::StudioConfig;
use devstudio::context::InboundRequest;
use devstudio::events::LoggingEventSink;
use devstudio::ideas::GeminiClient;
use devstudio::observability::{init_tracing, run_summary, LogFormat, DEFAULT_LOG_DIRECTIVE};
use devstudio::pipeline::PipelineBuilder;

#[derive(Parser)]
#[command(name = "devstudio", version, about)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Design, plan and generate an application for a goal
    Run {
        /// What the application should do
        #[arg(long)]
        goal: String,
        /// Project name
        #[arg(long, default_value = devstudio::context::DEFAULT_PROJECT_NAME)]
        project_name: String,
        /// Existing specification to build on
        #[arg(long)]
        current_spec: Option<String>,
        /// Approve every plan without prompting
        #[arg(long)]
        auto_approve: bool,
        /// Seconds to wait for an approval decision
        #[arg(long)]
        approval_timeout_secs: Option<f64>,
        /// JSON configuration file
        #[arg(long, env = "DEVSTUDIO_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Print the effective configuration
    Config {
        /// JSON configuration file
        #[arg(long, env = "DEVSTUDIO_CONFIG")]
        config: Option<PathBuf>,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<StudioConfig> {
    let mut config = match path {
        Some(path) => StudioConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => StudioConfig::default(),
    };
    config.apply_env().context("reading environment")?;
    Ok(config)
}

async fn run(
    goal: String,
    project_name: String,
    current_spec: Option<String>,
    auto_approve: bool,
    approval_timeout_secs: Option<f64>,
    config: Option<PathBuf>,
) -> anyhow::Result<bool> {
    let mut config = load_config(config.as_ref())?;
    if auto_approve {
        config.approval.auto_approve = true;
    }
    if approval_timeout_secs.is_some() {
        config.approval.timeout_seconds = approval_timeout_secs;
    }
    config.validate()?;

    let generator = GeminiClient::new(config.gemini.clone())
        .context("set GEMINI_API_KEY or gemini.api_key in the config file")?;

    let mut gate = if config.approval.auto_approve {
        ApprovalGate::auto_approve()
    } else {
        ApprovalGate::new(Arc::new(TerminalNotifier::stdio()))
    };
    if let Some(window) = config.approval.timeout() {
        gate = gate.with_timeout(window);
    }

    let pipeline = PipelineBuilder::studio(Arc::new(generator), config.retry.clone())
        .approval_gate(gate)
        .events(Arc::new(LoggingEventSink::debug()))
        .build()?;

    let mut request = InboundRequest::new(goal, project_name);
    if let Some(spec) = current_spec {
        request = request.with_current_spec(spec);
    }

    let cancel = Arc::new(CancellationToken::new());
    let on_interrupt = Arc::clone(&cancel);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel("interrupted");
        }
    });

    let run = pipeline.execute(request, cancel).await;
    tracing::info!(summary = %run_summary(&run), "Run finished");

    let output = run.to_output();
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(output.is_complete())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let format = if cli.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    if let Err(e) = init_tracing(format, DEFAULT_LOG_DIRECTIVE) {
        eprintln!("devstudio: {e}");
    }

    let result = match cli.cmd {
        Command::Run {
            goal,
            project_name,
            current_spec,
            auto_approve,
            approval_timeout_secs,
            config,
        } => {
            run(
                goal,
                project_name,
                current_spec,
                auto_approve,
                approval_timeout_secs,
                config,
            )
            .await
        }
        Command::Config { config } => load_config(config.as_ref()).and_then(|config| {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(true)
        }),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("devstudio: {e:#}");
            ExitCode::from(2)
        }
    }
}
