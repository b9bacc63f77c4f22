use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Millis(i64),
    Text(String),
}

/// Accepts RFC 3339, zone-less ISO 8601 (read as UTC) and epoch milliseconds.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn resolve<E: serde::de::Error>(raw: RawTimestamp) -> Result<DateTime<Utc>, E> {
    match raw {
        RawTimestamp::Millis(ms) => Utc
            .timestamp_millis_opt(ms)
            .single()
            .ok_or_else(|| E::custom(format!("timestamp out of range: {ms}"))),
        RawTimestamp::Text(text) => {
            parse_timestamp(&text).ok_or_else(|| E::custom(format!("invalid timestamp: {text}")))
        }
    }
}

pub fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    resolve(RawTimestamp::deserialize(deserializer)?)
}

pub fn deserialize_optional_timestamp<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawTimestamp>::deserialize(deserializer)? {
        Some(raw) => resolve(raw).map(Some),
        None => Ok(None),
    }
}

/// Short "time elapsed" label shown next to each inbox entry.
pub fn elapsed_label(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(created_at);

    if elapsed < Duration::minutes(1) {
        "just now".to_string()
    } else if elapsed < Duration::hours(1) {
        format!("{} min ago", elapsed.num_minutes())
    } else if elapsed < Duration::days(1) {
        plural(elapsed.num_hours(), "hour")
    } else if elapsed < Duration::days(7) {
        plural(elapsed.num_days(), "day")
    } else {
        created_at.format("%Y-%m-%d").to_string()
    }
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{count} {unit}s ago")
    }
}
