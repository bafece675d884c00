//! Update the recording path of a running OBS instance.
//!
//! Uses the recording-folder request directly and, once the path is set,
//! makes sure the replay buffer is running. The replay-buffer step is
//! best-effort: a server with the feature disabled only earns a diagnostic.

use anyhow::Result;
use clap::Parser;
use obs_recpath::client::ObsClient;
use obs_recpath::config;
use obs_recpath::sequencer::{run_plan, OperationPlan, PathUpdate, ReplayOutcome, RunReport};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "set-rec-path", version)]
#[command(about = "Update the recording path of a running OBS instance over obs-websocket")]
struct Cli {
    /// Directory OBS should write finished recordings into
    #[arg(value_name = "RECORD_PATH")]
    record_path: String,

    /// Profile to switch to before updating the path
    #[arg(value_name = "PROFILE")]
    profile: Option<String>,

    /// obs-websocket host (default 127.0.0.1)
    #[arg(value_name = "HOST")]
    host: Option<String>,

    /// obs-websocket port (default 4444)
    #[arg(value_name = "PORT")]
    port: Option<String>,

    /// obs-websocket password (default none)
    #[arg(value_name = "PASSWORD")]
    password: Option<String>,
}

fn run(cli: &Cli) -> Result<()> {
    let config = config::resolve_from_cli(
        cli.host.as_deref(),
        cli.port.as_deref(),
        cli.password.as_deref(),
        cli.profile.as_deref(),
    );

    let mut client = ObsClient::connect(&config)?;
    match client.server_version() {
        Ok(version) => println!("Connected to obs-websocket {version} at {}", config.address()),
        Err(error) => println!(
            "Connected to {} (GetVersion not available: {error:#})",
            config.address()
        ),
    }

    let plan = OperationPlan {
        record_path: cli.record_path.clone(),
        profile: config.profile.clone(),
        per_category_first: false,
        ensure_replay_buffer: true,
    };

    let outcome = run_plan(&mut client, &plan);
    client.close();
    print_report(&outcome?);
    Ok(())
}

fn print_report(report: &RunReport) {
    if let PathUpdate::Folder(folder) = &report.path {
        println!("Recording path set via recording folder");
        println!("  rec-folder = {folder}");
    }
    match &report.replay {
        ReplayOutcome::Started => println!("Replay buffer started"),
        ReplayOutcome::AlreadyActive => println!("Replay buffer already active"),
        ReplayOutcome::Unavailable(reason) => {
            eprintln!("Replay buffer unavailable: {reason}");
        }
        ReplayOutcome::Skipped => {}
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Failed to set recording path: {error:#}");
            ExitCode::FAILURE
        }
    }
}
