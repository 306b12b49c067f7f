use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike};
use chrono_tz::Tz;
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

pub const DEFAULT_COLOR: &str = "#3788d8";

/// Wall-clock zone of the practice. Layout rows and day columns are in this zone.
pub const PRACTICE_TIME_ZONE: Tz = chrono_tz::Europe::Vienna;

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// A single booking as delivered by the practice backend.
///
/// `start` and `end` are `None` when the upstream value is missing or cannot be
/// parsed. Such events are carried along untouched; the layout code turns them
/// into `NaN` geometry instead of failing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    #[serde(deserialize_with = "deserialize_id", alias = "_id")]
    pub id: String,
    #[serde(
        default,
        deserialize_with = "deserialize_timestamp",
        serialize_with = "serialize_timestamp",
        alias = "start_time"
    )]
    pub start: Option<NaiveDateTime>,
    #[serde(
        default,
        deserialize_with = "deserialize_timestamp",
        serialize_with = "serialize_timestamp",
        alias = "end_time"
    )]
    pub end: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub title: String,
    #[serde(default, deserialize_with = "deserialize_text_id", alias = "staff_id")]
    pub staff_id: String,
    #[serde(default, deserialize_with = "deserialize_text", alias = "staff_name")]
    pub staff_name: String,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_id",
        skip_serializing_if = "Option::is_none",
        alias = "room_id"
    )]
    pub room_id: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        alias = "room_name"
    )]
    pub room_name: Option<String>,
    #[serde(default = "default_color", deserialize_with = "deserialize_color")]
    pub color: String,
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

/// Pixel geometry of one event inside a day column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutRect {
    pub event_id: String,
    pub top: f64,
    pub height: f64,
    pub stack_index: usize,
    pub stack_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayColumn {
    pub date: NaiveDate,
    pub rects: Vec<LayoutRect>,
}

impl CalendarEvent {
    /// Builds an event with the default color and no room or metadata.
    pub fn new<S: Into<String>>(
        id: S,
        start: NaiveDateTime,
        end: NaiveDateTime,
        title: S,
    ) -> Self {
        Self {
            id: id.into(),
            start: Some(start),
            end: Some(end),
            title: title.into(),
            staff_id: String::new(),
            staff_name: String::new(),
            room_id: None,
            room_name: None,
            color: default_color(),
            metadata: Map::new(),
        }
    }

    #[must_use]
    pub fn starts_on(&self, date: NaiveDate) -> bool {
        self.start.is_some_and(|start| start.date() == date)
    }

    /// Minutes between `start` and `end`, taken from the raw millisecond
    /// difference. `NaN` if either timestamp is invalid.
    #[must_use]
    pub fn duration_minutes(&self) -> f64 {
        match (self.start, self.end) {
            (Some(start), Some(end)) => {
                end.signed_duration_since(start).num_milliseconds() as f64 / 60_000.0
            }
            _ => f64::NAN,
        }
    }

    /// `NaN` if `start` is invalid.
    #[must_use]
    pub fn minutes_from_midnight(&self) -> f64 {
        self.start.map_or(f64::NAN, |start| {
            f64::from(start.hour() * 60 + start.minute())
        })
    }
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

/// Parses the timestamp shapes the backend is known to emit into practice
/// local time.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    parse_timestamp_in(raw, PRACTICE_TIME_ZONE)
}

/// Instants carrying an offset (`Z`, `+01:00`) are moved into `zone`, so
/// `2024-03-04T23:30:00Z` is `2024-03-05 00:30` in Vienna. Timestamps without
/// an offset are taken to be wall-clock time in `zone` already.
pub fn parse_timestamp_in(raw: &str, zone: Tz) -> Option<NaiveDateTime> {
    let raw = raw.trim();

    if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
        return Some(with_offset.with_timezone(&zone).naive_local());
    }

    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()?
                .and_hms_opt(0, 0, 0)
        })
}

/// Epoch milliseconds as practice local time.
pub fn from_epoch_millis(millis: i64, zone: Tz) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_millis(millis).map(|utc| utc.with_timezone(&zone).naive_local())
}

fn deserialize_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<NaiveDateTime>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(raw) => parse_timestamp(&raw),
        Value::Number(millis) => millis
            .as_i64()
            .and_then(|millis| from_epoch_millis(millis, PRACTICE_TIME_ZONE)),
        _ => None,
    })
}

fn serialize_timestamp<S: Serializer>(
    timestamp: &Option<NaiveDateTime>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match timestamp {
        Some(timestamp) => {
            serializer.collect_str(&timestamp.format("%Y-%m-%dT%H:%M:%S"))
        }
        None => serializer.serialize_none(),
    }
}

fn id_from_value(value: Value) -> Option<Result<String, String>> {
    match value {
        Value::Null => None,
        Value::String(id) => Some(Ok(id)),
        Value::Number(id) => Some(Ok(id.to_string())),
        other => Some(Err(format!("expected string or number id, got {other}"))),
    }
}

fn deserialize_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    id_from_value(Value::deserialize(deserializer)?)
        .ok_or_else(|| D::Error::custom("id must not be null"))?
        .map_err(D::Error::custom)
}

fn deserialize_optional_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    id_from_value(Value::deserialize(deserializer)?)
        .transpose()
        .map_err(D::Error::custom)
}

fn deserialize_text_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(deserialize_optional_id(deserializer)?.unwrap_or_default())
}

fn deserialize_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn deserialize_color<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?
        .filter(|color| !color.trim().is_empty())
        .unwrap_or_else(default_color))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn at(date: &str) -> NaiveDateTime {
        parse_timestamp(date).unwrap()
    }

    #[test]
    fn deserializes_backend_booking() {
        let event: CalendarEvent = serde_json::from_value(json!({
            "id": 17,
            "start": "2024-03-04T09:00:00",
            "end": "2024-03-04T09:30:00",
            "title": "Checkup",
            "staffId": 3,
            "staffName": "Dr. Huber",
            "roomName": "Room 2",
            "patientId": "p-88"
        }))
        .unwrap();

        assert_eq!(event.id, "17");
        assert_eq!(event.start, Some(at("2024-03-04 09:00")));
        assert_eq!(event.staff_id, "3");
        assert_eq!(event.room_id, None);
        assert_eq!(event.room_name.as_deref(), Some("Room 2"));
        assert_eq!(event.color, DEFAULT_COLOR);
        assert_eq!(event.metadata.get("patientId"), Some(&json!("p-88")));
    }

    #[test]
    fn accepts_snake_case_fields_and_null_color() {
        let event: CalendarEvent = serde_json::from_value(json!({
            "id": "a",
            "start_time": "2024-03-04 10:15",
            "end_time": "2024-03-04 11:00",
            "staff_id": "s1",
            "staff_name": "Nurse Berger",
            "room_id": 4,
            "color": null
        }))
        .unwrap();

        assert_eq!(event.start, Some(at("2024-03-04T10:15:00")));
        assert_eq!(event.staff_name, "Nurse Berger");
        assert_eq!(event.room_id.as_deref(), Some("4"));
        assert_eq!(event.color, DEFAULT_COLOR);
        assert!(event.metadata.is_empty());
    }

    #[test]
    fn invalid_timestamps_become_none() {
        let event: CalendarEvent = serde_json::from_value(json!({
            "id": "x",
            "start": "not a date",
            "end": null
        }))
        .unwrap();

        assert_eq!(event.start, None);
        assert_eq!(event.end, None);
        assert!(event.duration_minutes().is_nan());
        assert!(event.minutes_from_midnight().is_nan());
        assert!(!event.starts_on(NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()));
    }

    #[test]
    fn offsets_are_moved_into_practice_time() {
        assert_eq!(
            parse_timestamp("2024-03-04T09:00:00+01:00"),
            Some(at("2024-03-04 09:00"))
        );
        assert_eq!(
            parse_timestamp("2024-03-04T23:30:00.000Z"),
            Some(at("2024-03-05 00:30"))
        );
        // Summer time is two hours ahead of UTC.
        assert_eq!(
            parse_timestamp("2024-07-01T07:00:00Z"),
            Some(at("2024-07-01 09:00"))
        );
        assert_eq!(parse_timestamp("2024-03-04"), Some(at("2024-03-04 00:00")));
        assert_eq!(
            parse_timestamp_in("2024-03-04T09:00:00Z", chrono_tz::UTC),
            Some(at("2024-03-04 09:00"))
        );
    }

    #[test]
    fn epoch_millis_are_practice_time() {
        // 2024-03-04T09:00:00Z
        let event: CalendarEvent = serde_json::from_value(json!({
            "id": "e",
            "start": 1_709_542_800_000_i64,
        }))
        .unwrap();
        assert_eq!(event.start, Some(at("2024-03-04 10:00")));
    }

    #[test]
    fn utc_booking_after_local_midnight_lands_on_next_day() {
        let event: CalendarEvent = serde_json::from_value(json!({
            "id": "late",
            "start": "2024-03-04T23:30:00.000Z",
            "end": "2024-03-05T00:00:00.000Z",
        }))
        .unwrap();

        assert!(event.starts_on(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()));
        assert!(!event.starts_on(NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()));
        assert_eq!(event.minutes_from_midnight(), 30.0);
    }

    #[test]
    fn accepts_document_store_id() {
        let event: CalendarEvent = serde_json::from_value(json!({
            "_id": "65f0",
            "start": "2024-03-04T09:00:00",
        }))
        .unwrap();
        assert_eq!(event.id, "65f0");
    }

    #[test]
    fn missing_id_is_rejected() {
        let result = serde_json::from_value::<CalendarEvent>(json!({ "title": "no id" }));
        assert!(result.is_err());
    }

    #[test]
    fn serializes_back_with_metadata_flattened() {
        let mut event = CalendarEvent::new(
            "1",
            at("2024-03-04 09:00"),
            at("2024-03-04 09:45"),
            "Lab",
        );
        event.metadata.insert("icd".into(), json!("Z00.0"));

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["start"], json!("2024-03-04T09:00:00"));
        assert_eq!(value["icd"], json!("Z00.0"));
        assert!(value.get("roomId").is_none());
        assert_eq!(event.duration_minutes(), 45.0);
    }
}
