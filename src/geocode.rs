/// Postcode resolution for incident locations.
///
/// Resolution cascades through cheap strategies first:
///   1. suburb extracted from the location string → registry lookup;
///   2. municipality name → registry lookup;
///   3. every plausible suburb-shaped part of the location → registry lookup;
///   4. Nominatim reverse geocode of the coordinates (online mode only,
///      rate-limited, cached by rounded coordinates);
///   5. nearest registry locality by Haversine distance.
///
/// Every strategy is best-effort. An incident the cascade cannot place keeps
/// an empty postcode; nothing here aborts a cycle.
use std::collections::HashMap;
use std::sync::LazyLock;
use std::thread;
use std::time::{Duration, Instant};

use regex::Regex;
use serde::Deserialize;

use crate::config::USER_AGENT;
use crate::localities;
use crate::logging::{self, Subsystem};
use crate::model::IncidentRecord;

/// Nominatim usage policy: at most one request per second.
const NOMINATIM_MIN_DELAY: Duration = Duration::from_millis(1100);

const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/reverse";

// ---------------------------------------------------------------------------
// Location string patterns
// ---------------------------------------------------------------------------

/// "5.2KM SW OF GELLIBRAND" → capture "GELLIBRAND".
static DISTANCE_OF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\d+\.?\d*\s*KM\s+[NSEW]+\s+OF\s+(.+)").unwrap());

/// Trailing state qualifiers: "LORNE VIC 3232" → "LORNE".
static VIC_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+(VIC|VICTORIA)\b.*$").unwrap());

/// Distance prefix to strip when scanning parts.
static DISTANCE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\d+\.?\d*\s*KM\s+[NSEW]+\s+OF\s+").unwrap());

/// Road-type suffixes stripped when a part might be "SUBURB ROAD".
static ROAD_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\s+(ROAD|RD|STREET|ST|AVENUE|AVE|HIGHWAY|HWY|DRIVE|DR|LANE|LN|COURT|CT|PLACE|PL|CRESCENT|CR|BOULEVARD|BLVD)$",
    )
    .unwrap()
});

/// Extracts the most likely suburb name from a feed location string.
///
/// Handles the three shapes the feed actually produces: a bare suburb, a
/// "street, SUBURB" pair, and a "X.XKM DIR OF SUBURB" distance description.
pub fn extract_suburb(location: &str) -> Option<String> {
    let location = location.trim();
    if location.is_empty() {
        return None;
    }

    if let Some(captures) = DISTANCE_OF.captures(location) {
        return Some(captures[1].trim().to_uppercase());
    }

    if let Some((_, after_comma)) = location.rsplit_once(',') {
        let suburb = VIC_SUFFIX.replace(after_comma.trim(), "").trim().to_uppercase();
        if !suburb.is_empty() {
            return Some(suburb);
        }
    }

    Some(location.to_uppercase())
}

/// Every suburb-shaped fragment of a location string, for the scan strategy.
/// Distance prefixes and road-type suffixes are stripped; fragments shorter
/// than three characters are noise ("ST", "RD") and dropped.
pub fn extract_location_parts(location: &str) -> Vec<String> {
    if location.trim().is_empty() {
        return Vec::new();
    }

    let upper = location.to_uppercase();
    let mut parts = Vec::new();

    for delimiter in [",", " - ", "/", " AT ", " NEAR "] {
        for part in upper.split(delimiter) {
            let part = DISTANCE_PREFIX.replace(part.trim(), "");
            let clean = ROAD_SUFFIX.replace(part.trim(), "").trim().to_string();
            if clean.len() > 2 && !parts.contains(&clean) {
                parts.push(clean);
            }
        }
    }

    parts
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

pub struct PostcodeResolver {
    client: Option<reqwest::blocking::Client>,
    cache: HashMap<String, String>,
    last_request: Option<Instant>,
}

impl PostcodeResolver {
    /// Builds a resolver. With `online` false (or if the HTTP client cannot
    /// be constructed) resolution is registry-only and never touches the
    /// network.
    pub fn new(online: bool, timeout_secs: u64) -> PostcodeResolver {
        let client = if online {
            match reqwest::blocking::Client::builder()
                .user_agent(USER_AGENT)
                .timeout(Duration::from_secs(timeout_secs))
                .build()
            {
                Ok(client) => Some(client),
                Err(e) => {
                    logging::warn(
                        Subsystem::Geocode,
                        None,
                        &format!("cannot build geocoding client, staying offline: {}", e),
                    );
                    None
                }
            }
        } else {
            None
        };

        PostcodeResolver {
            client,
            cache: HashMap::new(),
            last_request: None,
        }
    }

    /// Runs the cascade for one incident. `None` means unresolved; the caller
    /// leaves the postcode empty.
    pub fn resolve(&mut self, incident: &IncidentRecord) -> Option<String> {
        if let Some(suburb) = extract_suburb(&incident.location_name) {
            if let Some(postcode) = localities::postcode_for_locality(&suburb) {
                return Some(postcode.to_string());
            }
        }

        if let Some(postcode) = localities::postcode_for_locality(&incident.municipality) {
            return Some(postcode.to_string());
        }

        for part in extract_location_parts(&incident.location_name) {
            if let Some(postcode) = localities::postcode_for_locality(&part) {
                return Some(postcode.to_string());
            }
        }

        if incident.latitude != 0.0 && incident.longitude != 0.0 {
            if let Some(postcode) = self.reverse_geocode(incident.latitude, incident.longitude) {
                return Some(postcode);
            }
            if let Some(postcode) = localities::nearest_postcode(incident.latitude, incident.longitude)
            {
                return Some(postcode.to_string());
            }
        }

        None
    }

    /// Nominatim reverse lookup, cached by coordinates rounded to 4 decimal
    /// places (about 10 m, well under a postcode's extent). Results outside
    /// the Victorian postcode range are discarded.
    fn reverse_geocode(&mut self, latitude: f64, longitude: f64) -> Option<String> {
        let client = self.client.as_ref()?;

        let cache_key = format!("{:.4},{:.4}", latitude, longitude);
        if let Some(postcode) = self.cache.get(&cache_key) {
            return Some(postcode.clone());
        }

        // Pace requests to stay inside the usage policy.
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < NOMINATIM_MIN_DELAY {
                thread::sleep(NOMINATIM_MIN_DELAY - elapsed);
            }
        }
        self.last_request = Some(Instant::now());

        let result = client
            .get(NOMINATIM_URL)
            .query(&[
                ("format", "jsonv2"),
                ("lat", &latitude.to_string()),
                ("lon", &longitude.to_string()),
                ("addressdetails", "1"),
            ])
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json::<ReverseResponse>());

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                logging::warn(
                    Subsystem::Geocode,
                    None,
                    &format!(
                        "reverse geocode failed for ({:.4}, {:.4}): {}",
                        latitude, longitude, e
                    ),
                );
                return None;
            }
        };

        let postcode = response.address.and_then(|a| a.postcode)?;
        if !localities::is_valid_vic_postcode(&postcode) {
            logging::debug(
                Subsystem::Geocode,
                None,
                &format!("discarding non-Victorian postcode '{}'", postcode),
            );
            return None;
        }

        self.cache.insert(cache_key, postcode.clone());
        Some(postcode)
    }
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    address: Option<ReverseAddress>,
}

#[derive(Debug, Deserialize)]
struct ReverseAddress {
    postcode: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn incident(location: &str, municipality: &str, lat: f64, lon: f64) -> IncidentRecord {
        IncidentRecord {
            incident_id: 1,
            postcode: String::new(),
            incident_status: "Responding".to_string(),
            category: "Fire".to_string(),
            origin_status: "GOING".to_string(),
            location_name: location.to_string(),
            update_time: Utc
                .with_ymd_and_hms(2024, 11, 2, 14, 0, 0)
                .unwrap()
                .naive_utc(),
            municipality: municipality.to_string(),
            latitude: lat,
            longitude: lon,
        }
    }

    fn offline_resolver() -> PostcodeResolver {
        PostcodeResolver::new(false, 5)
    }

    // --- Suburb extraction --------------------------------------------------

    #[test]
    fn test_extract_suburb_from_street_comma_suburb() {
        assert_eq!(
            extract_suburb("BURWOOD HWY, FERNTREE GULLY"),
            Some("FERNTREE GULLY".to_string())
        );
    }

    #[test]
    fn test_extract_suburb_from_distance_description() {
        assert_eq!(
            extract_suburb("5.2KM SW OF GELLIBRAND"),
            Some("GELLIBRAND".to_string())
        );
        assert_eq!(extract_suburb("12KM N OF OMEO"), Some("OMEO".to_string()));
    }

    #[test]
    fn test_extract_suburb_strips_vic_suffix() {
        assert_eq!(
            extract_suburb("MAIN ST, LORNE VIC 3232"),
            Some("LORNE".to_string())
        );
        assert_eq!(
            extract_suburb("HIGH ST, COLAC VICTORIA"),
            Some("COLAC".to_string())
        );
    }

    #[test]
    fn test_extract_suburb_bare_name_passes_through() {
        assert_eq!(extract_suburb("marysville"), Some("MARYSVILLE".to_string()));
        assert_eq!(extract_suburb(""), None);
        assert_eq!(extract_suburb("   "), None);
    }

    #[test]
    fn test_extract_location_parts_strips_road_suffixes() {
        let parts = extract_location_parts("KINGLAKE RD, WHITTLESEA");
        assert!(parts.contains(&"KINGLAKE".to_string()));
        assert!(parts.contains(&"WHITTLESEA".to_string()));
    }

    #[test]
    fn test_extract_location_parts_drops_short_noise() {
        // "ST" alone must not survive as a candidate suburb.
        let parts = extract_location_parts("ST, HEALESVILLE");
        assert!(parts.contains(&"HEALESVILLE".to_string()));
        assert!(!parts.contains(&"ST".to_string()));
    }

    // --- Cascade (offline) --------------------------------------------------

    #[test]
    fn test_resolves_from_location_suburb() {
        let mut resolver = offline_resolver();
        let postcode = resolver.resolve(&incident("BURWOOD HWY, FERNTREE GULLY", "", 0.0, 0.0));
        assert_eq!(postcode.as_deref(), Some("3156"));
    }

    #[test]
    fn test_resolves_from_distance_pattern() {
        let mut resolver = offline_resolver();
        let postcode = resolver.resolve(&incident("5.2KM SW OF GELLIBRAND", "", 0.0, 0.0));
        assert_eq!(postcode.as_deref(), Some("3239"));
    }

    #[test]
    fn test_falls_back_to_municipality() {
        // Location is an unregistered suburb; municipality is in the registry.
        let mut resolver = offline_resolver();
        let postcode = resolver.resolve(&incident("SOME FIRE TRACK", "MANSFIELD", 0.0, 0.0));
        assert_eq!(postcode.as_deref(), Some("3722"));
    }

    #[test]
    fn test_falls_back_to_location_part_scan() {
        let mut resolver = offline_resolver();
        let postcode = resolver.resolve(&incident("TRACK 7 NEAR BRIGHT", "NOWHERE SHIRE", 0.0, 0.0));
        assert_eq!(postcode.as_deref(), Some("3741"));
    }

    #[test]
    fn test_falls_back_to_nearest_registry_locality() {
        // Nothing textual matches; coordinates sit just outside the Ferntree
        // Gully centroid. Offline mode skips Nominatim and goes straight to
        // the nearest-registry strategy.
        let mut resolver = offline_resolver();
        let postcode = resolver.resolve(&incident("UNMAPPED GULLY", "", -37.8900, 145.3010));
        assert_eq!(postcode.as_deref(), Some("3156"));
    }

    #[test]
    fn test_unresolvable_incident_yields_none() {
        let mut resolver = offline_resolver();
        let postcode = resolver.resolve(&incident("UNMAPPED GULLY", "", 0.0, 0.0));
        assert_eq!(postcode, None);
    }

    #[test]
    fn test_offline_resolver_has_no_client() {
        let resolver = offline_resolver();
        assert!(resolver.client.is_none());
    }
}
