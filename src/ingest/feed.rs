/// VIC Emergency incident feed client.
///
/// Retrieves the public incident JSON from the VIC Emergency data endpoint.
/// The payload is `{ "results": [ … ] }` with camelCase records; every field
/// is optional here because the feed omits fields freely. Records that fail
/// to deserialize individually are warned about and skipped rather than
/// failing the whole fetch — one malformed incident must not blind the
/// monitor to the rest of the state.
///
/// Feed endpoint: https://data.emergency.vic.gov.au/Show?pageId=getIncidentJSON
use std::time::Duration;

use serde::Deserialize;

use crate::config::{Config, USER_AGENT};
use crate::logging::{self, Subsystem};
use crate::model::FeedError;

use super::IncidentSource;

// ---------------------------------------------------------------------------
// Feed response structures
// ---------------------------------------------------------------------------

/// Top-level feed response.
#[derive(Debug, Deserialize)]
struct FeedResponse {
    #[serde(default)]
    results: Vec<serde_json::Value>,
}

/// One raw incident as the feed reports it. Field names follow the feed's
/// camelCase; everything is optional and defaulted at the snapshot boundary.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RawIncident {
    pub incident_no: Option<u64>,
    pub incident_type: Option<String>,
    pub category1: Option<String>,
    pub category2: Option<String>,
    pub name: Option<String>,
    pub incident_location: Option<String>,
    pub municipality: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub incident_status: Option<String>,
    pub origin_status: Option<String>,
    pub incident_size: Option<String>,
    pub last_update_date_time: Option<String>,
    pub resource_count: Option<u32>,
    pub territory: Option<String>,
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parses a feed response body into raw incidents.
///
/// A body that is not the expected envelope is a `ParseError`. Individual
/// records that fail to deserialize are skipped with a warning.
pub fn parse_feed_body(body: &str) -> Result<Vec<RawIncident>, FeedError> {
    let response: FeedResponse =
        serde_json::from_str(body).map_err(|e| FeedError::ParseError(e.to_string()))?;

    let mut incidents = Vec::with_capacity(response.results.len());
    for item in response.results {
        match serde_json::from_value::<RawIncident>(item) {
            Ok(incident) => incidents.push(incident),
            Err(e) => {
                logging::warn(
                    Subsystem::Feed,
                    None,
                    &format!("skipping malformed incident record: {}", e),
                );
            }
        }
    }

    Ok(incidents)
}

// ---------------------------------------------------------------------------
// HTTP client
// ---------------------------------------------------------------------------

pub struct FeedClient {
    url: String,
    client: reqwest::blocking::Client,
}

impl FeedClient {
    /// Builds a client with the configured endpoint and timeout.
    pub fn new(config: &Config) -> Result<FeedClient, FeedError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| FeedError::RequestError(e.to_string()))?;

        Ok(FeedClient {
            url: config.api_url.clone(),
            client,
        })
    }
}

impl IncidentSource for FeedClient {
    fn origin(&self) -> &str {
        &self.url
    }

    fn fetch_incidents(&self) -> Result<Vec<RawIncident>, FeedError> {
        let response = self
            .client
            .get(&self.url)
            .header("Accept", "application/json")
            .send()
            .map_err(|e| FeedError::RequestError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::HttpError(status.as_u16()));
        }

        let body = response
            .text()
            .map_err(|e| FeedError::RequestError(e.to_string()))?;

        parse_feed_body(&body)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
