//! Timestamp encoding for receipt and chunk metadata.
//!
//! Timestamps are written as RFC 3339 in UTC so the index compares them as plain instants.
//! Reading also accepts the offset-less `YYYY-MM-DD HH:MM:SS` form receipt parsers commonly
//! emit, taken as UTC.

use serde::{Deserialize, Deserializer, Serializer};
use time::{
	OffsetDateTime, PrimitiveDateTime, UtcOffset, format_description::well_known::Rfc3339,
	macros::format_description,
};

pub fn serialize<S>(value: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	let formatted = value.to_offset(UtcOffset::UTC).format(&Rfc3339).map_err(serde::ser::Error::custom)?;

	serializer.serialize_str(&formatted)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
where
	D: Deserializer<'de>,
{
	let raw = String::deserialize(deserializer)?;

	parse_timestamp(&raw)
		.ok_or_else(|| serde::de::Error::custom(format!("Unrecognized timestamp {raw:?}.")))
}

/// RFC 3339, or a naive date-time with a space or `T` separator, normalized to UTC.
pub fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
	let raw = raw.trim();

	if let Ok(parsed) = OffsetDateTime::parse(raw, &Rfc3339) {
		return Some(parsed.to_offset(UtcOffset::UTC));
	}

	let naive = raw.replacen('T', " ", 1);

	PrimitiveDateTime::parse(&naive, format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"))
		.ok()
		.map(PrimitiveDateTime::assume_utc)
}

#[cfg(test)]
mod tests {
	use time::macros::datetime;

	use super::*;

	#[test]
	fn offsets_are_normalized_to_utc() {
		assert_eq!(parse_timestamp("2023-12-13T13:04:00-05:00"), Some(datetime!(2023-12-13 18:04 UTC)));
		assert_eq!(
			parse_timestamp("2023-12-13T18:04:00-05:00").map(|ts| ts.offset()),
			Some(UtcOffset::UTC)
		);
	}

	#[test]
	fn naive_timestamps_are_read_as_utc() {
		assert_eq!(parse_timestamp("2023-12-13 18:04:00"), Some(datetime!(2023-12-13 18:04 UTC)));
		assert_eq!(parse_timestamp("2023-12-13T18:04:00"), Some(datetime!(2023-12-13 18:04 UTC)));
		assert_eq!(parse_timestamp("December 13"), None);
	}

	#[test]
	fn writes_rfc3339_in_utc() {
		let mut out = Vec::new();
		let mut serializer = serde_json::Serializer::new(&mut out);

		serialize(&datetime!(2023-12-13 13:04 -05:00), &mut serializer).expect("Failed to serialize.");

		assert_eq!(String::from_utf8(out).expect("Expected UTF-8."), "\"2023-12-13T18:04:00Z\"");
	}
}
