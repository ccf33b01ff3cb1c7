//! RFC 3339 serde helpers for message and dialog timestamps.
//!
//! Used via `#[serde(with = "crate::utils::time")]` on
//! [`time::OffsetDateTime`] fields so sink-facing records serialize to
//! readable timestamps.

use serde::{Deserialize, Deserializer, Serializer};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Deserialize an RFC 3339 formatted string into an OffsetDateTime.
pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    OffsetDateTime::parse(&s, &Rfc3339).map_err(serde::de::Error::custom)
}

/// Serialize an OffsetDateTime into an RFC 3339 formatted string.
pub fn serialize<S>(datetime: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let s = datetime
        .format(&Rfc3339)
        .map_err(serde::ser::Error::custom)?;
    serializer.serialize_str(&s)
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};
    use time::macros::datetime;

    #[derive(Serialize, Deserialize)]
    struct Stamped {
        #[serde(with = "super")]
        at: time::OffsetDateTime,
    }

    #[test]
    fn roundtrip() {
        let stamped = Stamped {
            at: datetime!(2024-11-05 12:30:00 UTC),
        };
        let json = serde_json::to_string(&stamped).unwrap();
        assert!(json.contains("2024-11-05T12:30:00Z"));
        let back: Stamped = serde_json::from_str(&json).unwrap();
        assert_eq!(back.at, stamped.at);
    }
}
