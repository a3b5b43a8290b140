//! Provider payload shapes and the helpers that normalize them

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Keys the upstream providers use for an event's start time, in the order
/// they are tried.
const START_KEYS: [&str; 6] =
    ["date", "datetime", "dateTime", "scheduled_at", "start_date", "event_date"];

/// Opaque list of provider events. The wagering core never looks inside.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderPayload {
    pub response: Vec<Value>,
}

impl ProviderPayload {
    pub fn new(response: Vec<Value>) -> Self {
        Self { response }
    }

    pub fn len(&self) -> usize {
        self.response.len()
    }

    pub fn is_empty(&self) -> bool {
        self.response.is_empty()
    }
}

/// Flatten an API-SPORTS `response` field into a list of events. The MMA API
/// sometimes groups fights into an object of arrays instead of a flat array.
pub(crate) fn response_items(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items.clone(),
        Value::Object(map) => map
            .values()
            .filter_map(|v| v.as_array())
            .flatten()
            .cloned()
            .collect(),
        _ => Vec::new(),
    }
}

/// Lowercased status text of an event. Providers nest it as
/// `status.long` / `status.short` or ship a bare string.
pub(crate) fn status_text(event: &Value) -> String {
    let status = &event["status"];
    status["long"]
        .as_str()
        .or_else(|| status["short"].as_str())
        .or_else(|| status.as_str())
        .unwrap_or_default()
        .to_lowercase()
}

pub(crate) fn is_live(event: &Value, markers: &[&str]) -> bool {
    let status = status_text(event);
    markers.iter().any(|m| status.contains(m))
}

pub(crate) fn has_start_key(event: &Value) -> bool {
    START_KEYS.iter().any(|k| !event[*k].is_null())
}

/// Start time of an event, from whichever key the provider used.
pub(crate) fn event_start(event: &Value) -> Option<DateTime<Utc>> {
    for key in START_KEYS {
        if let Some(text) = event[key].as_str() {
            if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
                return Some(parsed.with_timezone(&Utc));
            }
            if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
                if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
                    return Some(Utc.from_utc_datetime(&midnight));
                }
            }
        }
    }
    None
}

/// Keep events that start at or after `now`. Events without any start field
/// are kept (the provider may omit it for placeholder cards); events with an
/// unparsable start are dropped.
pub(crate) fn retain_upcoming(events: Vec<Value>, now: DateTime<Utc>) -> Vec<Value> {
    events
        .into_iter()
        .filter(|e| match event_start(e) {
            Some(start) => start >= now,
            None => !has_start_key(e),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    #[test]
    fn test_response_items_flattens_object_of_arrays() {
        let grouped = json!({"card_a": [{"id": 1}], "card_b": [{"id": 2}, {"id": 3}]});
        assert_eq!(response_items(&grouped).len(), 3);

        let flat = json!([{"id": 1}]);
        assert_eq!(response_items(&flat).len(), 1);

        assert!(response_items(&json!(null)).is_empty());
    }

    #[test]
    fn test_status_text_handles_nested_and_bare_shapes() {
        assert_eq!(status_text(&json!({"status": {"long": "In Play"}})), "in play");
        assert_eq!(status_text(&json!({"status": {"short": "LIVE"}})), "live");
        assert_eq!(status_text(&json!({"status": "In Progress"})), "in progress");
        assert_eq!(status_text(&json!({})), "");
    }

    #[test]
    fn test_is_live_matches_marker_substrings() {
        let event = json!({"status": {"long": "Game is live now"}});
        assert!(is_live(&event, &["live", "in play"]));
        assert!(!is_live(&event, &["running"]));
    }

    #[test]
    fn test_event_start_tries_provider_keys() {
        let rfc = json!({"scheduled_at": "2026-09-01T18:00:00+00:00"});
        assert!(event_start(&rfc).is_some());

        let date_only = json!({"date": "2026-09-01"});
        assert!(event_start(&date_only).is_some());

        assert!(event_start(&json!({"date": "soon"})).is_none());
        assert!(event_start(&json!({})).is_none());
    }

    #[test]
    fn test_retain_upcoming_drops_past_and_unparsable_dates() {
        let now = Utc::now();
        let future = (now + Duration::days(2)).to_rfc3339();
        let past = (now - Duration::days(2)).to_rfc3339();

        let events = vec![
            json!({"id": "future", "date": future}),
            json!({"id": "past", "date": past}),
            json!({"id": "broken", "date": "???"}),
            json!({"id": "undated"}),
        ];

        let kept = retain_upcoming(events, now);
        let ids: Vec<_> = kept.iter().map(|e| e["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["future", "undated"]);
    }
}
