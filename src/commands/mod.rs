use crate::briefing::{research_query, Research};
use crate::calendar::{collect_events, filter_upcoming, parse_sources, Attendee, CalendarError, RelevantEvent};
use crate::config::Config;
use crate::contacts::ContactStore;
use crate::web_search::BraveSearch;
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use log::{info, warn};
use reqwest::Client;
use std::time::Duration;

pub mod auto;
pub mod check;
pub mod next;

/// Everything a command needs for one run.
pub struct CommandContext {
    pub config: Config,
    pub now: NaiveDateTime,
    pub research: bool,
    pub client: Client,
}

impl CommandContext {
    pub fn new(config: Config, now: NaiveDateTime, research: bool) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs.max(1)))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { config, now, research, client })
    }

    /// Fetch every configured calendar and keep the relevant events. Sources
    /// that fail are reported and skipped.
    pub async fn load_upcoming(&self) -> Result<Vec<RelevantEvent>> {
        let (sources, mut warnings) = parse_sources(&self.config.calendars);
        if sources.is_empty() && warnings.is_empty() {
            return Err(CalendarError::NoSources.into());
        }

        let collected = collect_events(&sources, &self.client).await;
        warnings.extend(collected.warnings);
        for warning in &warnings {
            println!("Warning: {}", warning);
        }

        let upcoming = filter_upcoming(&collected.events, self.now);
        info!(
            "{} of {} event(s) are upcoming meetings with attendees",
            upcoming.len(),
            collected.events.len()
        );
        Ok(upcoming)
    }

    /// Web search results per attendee, empty unless research was requested
    /// and an API key is configured.
    pub async fn gather_research(&self, attendees: &[Attendee], contacts: &dyn ContactStore) -> Vec<Research> {
        if !self.research {
            return Vec::new();
        }
        let Some(api_key) = self.config.brave_api_key() else {
            warn!("--research needs BRAVE_API_KEY; skipping web search");
            return Vec::new();
        };
        let search = match BraveSearch::new(api_key, Duration::from_secs(self.config.http_timeout_secs.max(1))) {
            Ok(search) => search,
            Err(e) => {
                warn!("Web search unavailable: {}", e);
                return Vec::new();
            }
        };

        let mut research = Vec::new();
        for attendee in attendees {
            let query = research_query(attendee, contacts);
            match search.search(&query, self.config.search.results_per_attendee).await {
                Ok(hits) => research.push(Research { attendee: attendee.clone(), hits }),
                Err(e) => warn!("Web search for '{}' failed: {:#}", query, e),
            }
        }
        research
    }
}
