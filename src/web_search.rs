use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const BRAVE_SEARCH_URL: &str = "https://api.search.brave.com/res/v1/web/search";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct BraveResponse {
    #[serde(default)]
    web: Option<BraveWeb>,
}

#[derive(Debug, Default, Deserialize)]
struct BraveWeb {
    #[serde(default)]
    results: Vec<SearchHit>,
}

/// Client for the Brave web search API. Results are returned in the order
/// the API gives them.
pub struct BraveSearch {
    client: Client,
    api_key: String,
}

impl BraveSearch {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(anyhow!("BRAVE_API_KEY is not set"));
        }
        let client = Client::builder().timeout(timeout).build().context("Failed to create HTTP client")?;
        Ok(Self { client, api_key })
    }

    pub async fn search(&self, query: &str, count: usize) -> Result<Vec<SearchHit>> {
        info!("Searching the web for: {}", query);
        let count = count.to_string();
        let response = self
            .client
            .get(BRAVE_SEARCH_URL)
            .header("X-Subscription-Token", &self.api_key)
            .header("Accept", "application/json")
            .query(&[("q", query), ("count", count.as_str())])
            .send()
            .await
            .context("Search request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Search API returned {}: {}", status, body));
        }

        let parsed: BraveResponse = response.json().await.context("Failed to parse search response")?;
        let hits = parse_hits(parsed);
        debug!("Search returned {} result(s)", hits.len());
        Ok(hits)
    }
}

fn parse_hits(response: BraveResponse) -> Vec<SearchHit> {
    response.web.map(|web| web.results).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_response() {
        let body = r#"{
            "query": {"original": "acme"},
            "web": {"results": [
                {"title": "Acme Corp", "url": "https://acme.example", "description": "Widgets", "age": "1d"},
                {"title": "Acme News", "url": "https://news.example/acme"}
            ]}
        }"#;
        let response: BraveResponse = serde_json::from_str(body).unwrap();
        let hits = parse_hits(response);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].description.as_deref(), Some("Widgets"));
        assert_eq!(hits[1].url, "https://news.example/acme");
    }

    #[test]
    fn test_response_without_web_section() {
        let response: BraveResponse = serde_json::from_str(r#"{"type": "search"}"#).unwrap();
        assert!(parse_hits(response).is_empty());
    }

    #[test]
    fn test_blank_key_is_rejected() {
        assert!(BraveSearch::new("  ", Duration::from_secs(5)).is_err());
    }
}
