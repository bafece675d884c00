//! Connection parameter resolution.
//!
//! Connection parameters come from up to three layers: positional CLI
//! arguments, a JSON credentials file, and compiled-in defaults. A positional
//! value wins only when it is present, non-empty, and does not itself look
//! like a flag; there is no partial mixing within a single field.

use serde::Deserialize;
use serde_json::Value;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Host used when neither the CLI nor a credentials file supplies one.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// obs-websocket v4's default listen port.
pub const DEFAULT_PORT: &str = "4444";

/// Environment variable naming an alternate credentials file.
pub const KEYS_PATH_ENV: &str = "OBS_KEYS_FILE";

/// Resolved parameters for one control-channel session.
///
/// Built once per run and immutable afterwards. `password` is always a
/// defined string; empty means "no password", which is distinct from the
/// credentials file lacking the field entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: String,
    pub password: String,
    /// Profile to switch to before touching any settings.
    pub profile: Option<String>,
}

impl ConnectionConfig {
    /// `host:port`, as shown in diagnostics.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// A positional argument only counts when it is non-empty and not flag-like.
fn positional_override(arg: Option<&str>) -> Option<&str> {
    arg.filter(|value| !value.is_empty() && !value.starts_with("--"))
}

fn profile_override(profile: Option<&str>) -> Option<String> {
    profile
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

/// Resolve from positional arguments alone, with compiled-in defaults.
pub fn resolve_from_cli(
    host: Option<&str>,
    port: Option<&str>,
    password: Option<&str>,
    profile: Option<&str>,
) -> ConnectionConfig {
    ConnectionConfig {
        host: positional_override(host).unwrap_or(DEFAULT_HOST).to_string(),
        port: positional_override(port).unwrap_or(DEFAULT_PORT).to_string(),
        password: positional_override(password).unwrap_or("").to_string(),
        profile: profile_override(profile),
    }
}

/// Resolve with a credentials file as the base layer. Positional values win
/// per field; everything else comes from the file.
pub fn resolve_with_credentials(
    credentials: &Credentials,
    host: Option<&str>,
    port: Option<&str>,
    password: Option<&str>,
    profile: Option<&str>,
) -> ConnectionConfig {
    ConnectionConfig {
        host: positional_override(host)
            .unwrap_or(&credentials.host)
            .to_string(),
        port: positional_override(port)
            .unwrap_or(&credentials.port)
            .to_string(),
        password: positional_override(password)
            .unwrap_or(&credentials.password)
            .to_string(),
        profile: profile_override(profile),
    }
}

/// Why a credentials file could not be used. Each failure mode is its own
/// variant so the caller can report exactly what to fix.
#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("credentials file not found: {0}")]
    NotFound(PathBuf),
    #[error("credentials file {path} could not be read: {source}")]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("credentials file {path} is not valid JSON: {source}")]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("credentials file {0} is missing a non-empty OBS_HOST")]
    MissingHost(PathBuf),
    #[error("credentials file {0} is missing a non-empty OBS_PORT")]
    MissingPort(PathBuf),
    #[error("credentials file {0} is missing OBS_PASSWORD (an empty string is fine)")]
    MissingPassword(PathBuf),
    #[error("could not determine the home directory for the default credentials file")]
    NoHomeDirectory,
}

/// Raw on-disk shape. `OBS_PORT` is accepted as either a string or a number.
#[derive(Debug, Deserialize)]
struct RawCredentials {
    #[serde(rename = "OBS_HOST")]
    host: Option<String>,
    #[serde(rename = "OBS_PORT")]
    port: Option<Value>,
    #[serde(rename = "OBS_PASSWORD")]
    password: Option<String>,
}

/// Validated contents of a credentials file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub host: String,
    pub port: String,
    pub password: String,
}

impl Credentials {
    /// Read and validate one credentials file. No merging across files.
    pub fn load(path: &Path) -> Result<Self, CredentialsError> {
        if !path.exists() {
            return Err(CredentialsError::NotFound(path.to_path_buf()));
        }
        let contents = fs::read_to_string(path).map_err(|source| CredentialsError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let raw: RawCredentials =
            serde_json::from_str(&contents).map_err(|source| CredentialsError::Malformed {
                path: path.to_path_buf(),
                source,
            })?;

        let host = match raw.host {
            Some(host) if !host.is_empty() => host,
            _ => return Err(CredentialsError::MissingHost(path.to_path_buf())),
        };
        let port = match raw.port {
            Some(Value::String(port)) if !port.is_empty() => port,
            Some(Value::Number(port)) => port.to_string(),
            _ => return Err(CredentialsError::MissingPort(path.to_path_buf())),
        };
        // Present-but-empty is a deliberate "no password"; absent is an error.
        let password = match raw.password {
            Some(password) => password,
            None => return Err(CredentialsError::MissingPassword(path.to_path_buf())),
        };

        Ok(Self {
            host,
            port,
            password,
        })
    }
}

/// Default location: ~/.obs/keys.json
pub fn default_keys_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".obs").join("keys.json"))
}

/// Pick the one credentials file to read: explicit `--keys` flag, then the
/// environment override, then the default path. First match wins.
pub fn keys_file_path(explicit: Option<PathBuf>) -> Result<PathBuf, CredentialsError> {
    resolve_keys_path(explicit, env::var_os(KEYS_PATH_ENV).map(PathBuf::from))
}

fn resolve_keys_path(
    explicit: Option<PathBuf>,
    env_override: Option<PathBuf>,
) -> Result<PathBuf, CredentialsError> {
    if let Some(path) = explicit {
        return Ok(path);
    }
    if let Some(path) = env_override {
        return Ok(path);
    }
    default_keys_path().ok_or(CredentialsError::NoHomeDirectory)
}

/// What to tell the operator when the credentials file is unusable.
pub fn remediation_hint() -> String {
    let default_path = default_keys_path()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "$HOME/.obs/keys.json".to_string());
    format!(
        "Create a credentials file at {default_path} (or point {KEYS_PATH_ENV} or --keys at one):\n\
         {{\n  \"OBS_HOST\": \"127.0.0.1\",\n  \"OBS_PORT\": \"4444\",\n  \"OBS_PASSWORD\": \"\"\n}}"
    )
}
