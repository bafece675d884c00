//! Update the recording path of a running OBS instance, oldest-server first.
//!
//! Tries the per-category profile parameters (simple and advanced output)
//! and drops down to the plain recording-folder request when the server does
//! not know them. Connection parameters are positional with loopback
//! defaults; no credentials file is involved.

use anyhow::Result;
use clap::Parser;
use obs_recpath::client::ObsClient;
use obs_recpath::config;
use obs_recpath::sequencer::{run_plan, OperationPlan, PathUpdate, RunReport};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "set-rec-path-compat", version)]
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
        per_category_first: true,
        ensure_replay_buffer: false,
    };

    let outcome = run_plan(&mut client, &plan);
    client.close();
    let report = outcome?;
    print_report(&report, &plan);
    Ok(())
}

fn print_report(report: &RunReport, plan: &OperationPlan) {
    if report.fell_back(plan) {
        println!("Per-category parameters not supported by this server; used the recording folder request instead.");
    }
    match &report.path {
        PathUpdate::PerCategory {
            simple_output,
            advanced_output,
        } => {
            println!("Recording path set via profile parameters");
            println!("  SimpleOutput.FilePath = {simple_output}");
            println!("  AdvOut.RecFilePath    = {advanced_output}");
        }
        PathUpdate::Folder(folder) => {
            println!("Recording path set via recording folder");
            println!("  rec-folder = {folder}");
        }
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
