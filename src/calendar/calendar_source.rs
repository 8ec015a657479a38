//! Calendar feed retrieval.
//
// A source is either a remote feed (http, https, webcal) or a local file.
// Failing sources are reported as warnings and never stop the others.

use crate::calendar::calendar_import::parse_calendar;
use crate::calendar::calendar_types::Event;
use crate::calendar::CalendarError;
use log::{debug, info, warn};
use reqwest::Client;
use std::fmt;
use std::path::PathBuf;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarSource {
    Remote(Url),
    Local(PathBuf),
}

impl CalendarSource {
    /// Parse one entry of the configured source list. Blank entries are skipped.
    pub fn parse(entry: &str) -> Option<Result<Self, CalendarError>> {
        let entry = entry.trim();
        if entry.is_empty() {
            return None;
        }

        let invalid = |reason: String| CalendarError::InvalidSource(entry.to_string(), reason);
        let lower = entry.to_ascii_lowercase();

        let source = if lower.starts_with("http://") || lower.starts_with("https://") {
            Url::parse(entry).map(CalendarSource::Remote).map_err(|e| invalid(e.to_string()))
        } else if lower.starts_with("webcal://") {
            Url::parse(&format!("https://{}", &entry["webcal://".len()..]))
                .map(CalendarSource::Remote)
                .map_err(|e| invalid(e.to_string()))
        } else if lower.starts_with("file://") {
            Url::parse(entry).map_err(|e| invalid(e.to_string())).and_then(|url| {
                url.to_file_path()
                    .map(CalendarSource::Local)
                    .map_err(|_| invalid("not a local path".to_string()))
            })
        } else {
            Ok(CalendarSource::Local(PathBuf::from(entry)))
        };

        Some(source)
    }

    /// Fetch the whole feed as text.
    pub async fn fetch(&self, client: &Client) -> Result<String, CalendarError> {
        match self {
            CalendarSource::Remote(url) => {
                debug!("Fetching calendar feed {}", url);
                let response = client
                    .get(url.clone())
                    .send()
                    .await
                    .and_then(|r| r.error_for_status())
                    .map_err(|e| CalendarError::FetchFailed(self.to_string(), e.to_string()))?;
                response.text().await.map_err(|e| CalendarError::FetchFailed(self.to_string(), e.to_string()))
            }
            CalendarSource::Local(path) => {
                debug!("Reading calendar file {}", path.display());
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|e| CalendarError::FetchFailed(self.to_string(), e.to_string()))
            }
        }
    }
}

impl fmt::Display for CalendarSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalendarSource::Remote(url) => write!(f, "{}", url),
            CalendarSource::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceWarning {
    pub source: String,
    pub message: String,
}

impl fmt::Display for SourceWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed to fetch {}: {}", self.source, self.message)
    }
}

#[derive(Debug, Default)]
pub struct Collected {
    pub events: Vec<Event>,
    pub warnings: Vec<SourceWarning>,
}

/// Parse the configured entries, dropping blanks. Invalid entries become
/// warnings rather than errors.
pub fn parse_sources<S: AsRef<str>>(entries: &[S]) -> (Vec<CalendarSource>, Vec<SourceWarning>) {
    let mut sources = Vec::new();
    let mut warnings = Vec::new();
    for entry in entries {
        match CalendarSource::parse(entry.as_ref()) {
            Some(Ok(source)) => sources.push(source),
            Some(Err(e)) => {
                warn!("{}", e);
                let message = match e {
                    CalendarError::InvalidSource(_, reason) => format!("invalid source: {}", reason),
                    other => other.to_string(),
                };
                warnings.push(SourceWarning { source: entry.as_ref().trim().to_string(), message });
            }
            None => {}
        }
    }
    (sources, warnings)
}

/// Fetch every source in order and tokenize what arrives.
pub async fn collect_events(sources: &[CalendarSource], client: &Client) -> Collected {
    let mut collected = Collected::default();
    for source in sources {
        match source.fetch(client).await {
            Ok(text) => {
                let events = parse_calendar(&text);
                info!("Read {} event(s) from {}", events.len(), source);
                collected.events.extend(events);
            }
            Err(e) => {
                warn!("{}", e);
                let message = match &e {
                    CalendarError::FetchFailed(_, message) => message.clone(),
                    other => other.to_string(),
                };
                collected.warnings.push(SourceWarning { source: source.to_string(), message });
            }
        }
    }
    collected
}
