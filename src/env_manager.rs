use crate::config::{BRAVE_API_KEY_VAR, CALENDARS_VAR, CRM_PATH_VAR, STATE_FILE_VAR};
use log::{debug, info, warn, LevelFilter};
use std::env;
use std::path::PathBuf;

// Names of environment variables read at startup
pub const CONFIG_ENV_VARS: &[&str] = &[CALENDARS_VAR, CRM_PATH_VAR, BRAVE_API_KEY_VAR, STATE_FILE_VAR];

pub const LOG_LEVEL_VAR: &str = "MEETPREP_LOG_LEVEL";

/// Load a `.env` file from the working directory or its parents, if present.
/// Variables already set in the environment win. Runs before the logger is
/// up, so the outcome is returned for [`log_env_file`].
pub fn load_env_file() -> Result<PathBuf, dotenvy::Error> {
    dotenvy::dotenv()
}

pub fn log_env_file(result: &Result<PathBuf, dotenvy::Error>) {
    match result {
        Ok(path) => info!("Loaded environment from {:?}", path),
        Err(e) if e.not_found() => debug!("No .env file found"),
        Err(e) => warn!("Failed to load .env file: {}", e),
    }
}

/// Log level from the verbosity flag, falling back to `MEETPREP_LOG_LEVEL`.
pub fn log_level(verbose: u8) -> Option<LevelFilter> {
    match verbose {
        0 => env::var(LOG_LEVEL_VAR).ok().and_then(|v| v.trim().parse().ok()),
        1 => Some(LevelFilter::Info),
        _ => Some(LevelFilter::Debug),
    }
}

/// Names of the configuration variables currently set, for debug output.
/// Values are never logged.
pub fn present_vars() -> Vec<&'static str> {
    CONFIG_ENV_VARS
        .iter()
        .copied()
        .filter(|var| env::var(var).is_ok_and(|v| !v.trim().is_empty()))
        .collect()
}
