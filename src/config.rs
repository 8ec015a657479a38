use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const CALENDARS_VAR: &str = "CALENDARS";
pub const CRM_PATH_VAR: &str = "CRM_PATH";
pub const BRAVE_API_KEY_VAR: &str = "BRAVE_API_KEY";
pub const STATE_FILE_VAR: &str = "STATE_FILE";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub calendars: Vec<String>,
    pub crm_path: PathBuf,
    pub state_file: PathBuf,
    pub http_timeout_secs: u64,
    pub notify: NotifyConfig,
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Minutes from now until the auto window opens.
    pub lead_minutes: i64,
    /// Length of the auto window in minutes.
    pub window_minutes: i64,
    pub preview_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub brave_api_key: Option<String>,
    pub results_per_attendee: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            calendars: Vec::new(),
            crm_path: PathBuf::from("./crm/"),
            state_file: PathBuf::from(".prep_state.json"),
            http_timeout_secs: 30,
            notify: NotifyConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self { lead_minutes: 30, window_minutes: 30, preview_count: 10 }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { brave_api_key: None, results_per_attendee: 3 }
    }
}

impl Config {
    /// Defaults, then the config file (if any), then environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match get_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Config::default(),
            },
        };
        config.apply_env(|name| env::var(name).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(calendars) = var(CALENDARS_VAR) {
            self.calendars = calendars
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(crm_path) = var(CRM_PATH_VAR).filter(|v| !v.trim().is_empty()) {
            self.crm_path = PathBuf::from(crm_path);
        }
        if let Some(state_file) = var(STATE_FILE_VAR).filter(|v| !v.trim().is_empty()) {
            self.state_file = PathBuf::from(state_file);
        }
        if let Some(key) = var(BRAVE_API_KEY_VAR).filter(|v| !v.trim().is_empty()) {
            self.search.brave_api_key = Some(key);
        }
    }

    pub fn brave_api_key(&self) -> Option<&str> {
        self.search.brave_api_key.as_deref().filter(|k| !k.trim().is_empty())
    }
}

pub fn get_config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "meetprep", "meetprep").map(|dirs| dirs.config_dir().join("config.toml"))
}
