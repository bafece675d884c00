//! Point a running OBS Studio instance's recordings at a new directory.
//!
//! Talks to OBS over the obs-websocket v4 protocol:
//! - resolve connection parameters from CLI arguments, an optional JSON
//!   credentials file, and compiled-in defaults
//! - optionally switch the current profile first
//! - update the recording path, falling back from the per-category profile
//!   parameters to the plain recording-folder request on older servers
//! - optionally make sure the replay buffer is running
//!
//! The three binaries in `src/bin/` are thin wrappers over these modules.

pub mod client;
pub mod config;
pub mod sequencer;

pub use client::{ObsClient, RequestRejected};
pub use config::{ConnectionConfig, Credentials, CredentialsError};
pub use sequencer::{run_plan, OperationPlan, PathUpdate, ReplayOutcome, RunReport};
