//! Update the recording path of a running OBS instance, reading connection
//! credentials from a JSON keys file.
//!
//! The file is located via `--keys=<path>`, then the `OBS_KEYS_FILE`
//! environment variable, then `~/.obs/keys.json`; exactly one file is read.
//! Positional HOST/PORT/PASSWORD arguments override individual fields, but a
//! value that itself looks like a flag is ignored in favor of the file.

use anyhow::Result;
use clap::Parser;
use obs_recpath::client::ObsClient;
use obs_recpath::config::{self, Credentials, CredentialsError};
use obs_recpath::sequencer::{run_plan, OperationPlan, PathUpdate, ReplayOutcome, RunReport};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "set-rec-path-keys", version)]
#[command(about = "Update the recording path of a running OBS instance over obs-websocket")]
struct Cli {
    /// Directory OBS should write finished recordings into
    #[arg(value_name = "RECORD_PATH")]
    record_path: String,

    /// Profile to switch to before updating the path
    #[arg(value_name = "PROFILE")]
    profile: Option<String>,

    /// Override the OBS_HOST value from the keys file
    #[arg(value_name = "HOST", allow_hyphen_values = true)]
    host: Option<String>,

    /// Override the OBS_PORT value from the keys file
    #[arg(value_name = "PORT", allow_hyphen_values = true)]
    port: Option<String>,

    /// Override the OBS_PASSWORD value from the keys file
    #[arg(value_name = "PASSWORD", allow_hyphen_values = true)]
    password: Option<String>,

    /// Credentials file to read instead of $OBS_KEYS_FILE or ~/.obs/keys.json
    #[arg(long, value_name = "PATH")]
    keys: Option<PathBuf>,
}

fn run(cli: &Cli) -> Result<()> {
    let keys_path = config::keys_file_path(cli.keys.clone())?;
    let credentials = Credentials::load(&keys_path)?;
    let config = config::resolve_with_credentials(
        &credentials,
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
            if error.downcast_ref::<CredentialsError>().is_some() {
                eprintln!("{}", config::remediation_hint());
            }
            ExitCode::FAILURE
        }
    }
}
