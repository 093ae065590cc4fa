/// Webhook change notifications.
///
/// POSTs a JSON payload describing the cycle's status changes to a configured
/// URL. The payload is self-contained: receivers need no access to the state
/// file or the feed.
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::{Config, USER_AGENT};
use crate::model::ChangeRecord;
use crate::report;

use super::Notifier;

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct WebhookPayload {
    pub source: &'static str,
    pub generated_at: DateTime<Utc>,
    pub change_count: usize,
    pub changes: Vec<WebhookChange>,
}

#[derive(Debug, Serialize)]
pub struct WebhookChange {
    pub incident_id: u64,
    pub change: &'static str,
    pub previous_status: Option<String>,
    pub current_status: String,
    pub postcode: String,
    #[serde(rename = "type")]
    pub type_label: String,
    pub location_name: String,
    pub update_time: String,
}

/// Builds the payload for a set of changes. Separate from delivery so tests
/// can assert on the schema without a receiver.
pub fn build_payload(changes: &[ChangeRecord], generated_at: DateTime<Utc>) -> WebhookPayload {
    WebhookPayload {
        source: "vicmon-service",
        generated_at,
        change_count: changes.len(),
        changes: changes
            .iter()
            .map(|c| WebhookChange {
                incident_id: c.incident_id,
                change: c.kind.label(),
                previous_status: c.previous_origin_status.clone(),
                current_status: c.current_origin_status.clone(),
                postcode: c.incident.postcode.clone(),
                type_label: report::type_label(&c.incident),
                location_name: c.incident.location_name.clone(),
                update_time: c.incident.update_time.format("%Y-%m-%d %H:%M:%S").to_string(),
            })
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

pub struct WebhookNotifier {
    url: String,
    client: reqwest::blocking::Client,
}

impl WebhookNotifier {
    pub fn new(url: String, config: &Config) -> Result<WebhookNotifier, Box<dyn std::error::Error>> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(WebhookNotifier { url, client })
    }
}

impl Notifier for WebhookNotifier {
    fn target(&self) -> &str {
        &self.url
    }

    fn notify(&self, changes: &[ChangeRecord]) -> Result<(), Box<dyn std::error::Error>> {
        let payload = build_payload(changes, Utc::now());

        let response = self.client.post(&self.url).json(&payload).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP error: {}", status.as_u16()).into());
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ChangeKind, IncidentRecord};
    use chrono::TimeZone;

    fn upgrade_change() -> ChangeRecord {
        let incident = IncidentRecord {
            incident_id: 1001,
            postcode: "3156".to_string(),
            incident_status: "Responding".to_string(),
            category: "Bush Fire".to_string(),
            origin_status: "GOING".to_string(),
            location_name: "BURWOOD HWY, FERNTREE GULLY".to_string(),
            update_time: Utc
                .with_ymd_and_hms(2024, 11, 2, 14, 30, 0)
                .unwrap()
                .naive_utc(),
            municipality: "KNOX".to_string(),
            latitude: -37.8866,
            longitude: 145.2950,
        };
        ChangeRecord {
            incident_id: 1001,
            kind: ChangeKind::Upgrade,
            previous_origin_status: Some("CONTAINED".to_string()),
            current_origin_status: "GOING".to_string(),
            incident,
        }
    }

    #[test]
    fn test_payload_schema() {
        let generated_at = Utc.with_ymd_and_hms(2024, 11, 2, 15, 0, 0).unwrap();
        let payload = build_payload(&[upgrade_change()], generated_at);

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["source"], "vicmon-service");
        assert_eq!(json["change_count"], 1);

        let change = &json["changes"][0];
        assert_eq!(change["incident_id"], 1001);
        assert_eq!(change["change"], "UPGRADE");
        assert_eq!(change["previous_status"], "CONTAINED");
        assert_eq!(change["current_status"], "GOING");
        assert_eq!(change["postcode"], "3156");
        assert_eq!(change["type"], "Responding - Bush Fire - GOING");
        assert_eq!(change["update_time"], "2024-11-02 14:30:00");
    }

    #[test]
    fn test_new_incident_has_null_previous_status() {
        let mut change = upgrade_change();
        change.kind = ChangeKind::New;
        change.previous_origin_status = None;

        let payload = build_payload(&[change], Utc::now());
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json["changes"][0]["previous_status"].is_null());
        assert_eq!(json["changes"][0]["change"], "NEW");
    }
}
