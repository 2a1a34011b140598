//! Point payload schema.
//!
//! A payload is the JSON form of [`ChunkMeta`] (decimals as strings, timestamps as RFC 3339)
//! plus float mirrors of the two amounts so the index can range-filter on them.

use std::collections::HashMap;

use qdrant_client::qdrant::{Value, value::Kind};
use rust_decimal::prelude::ToPrimitive;
use serde_json::{Map, Number, Value as JsonValue};
use uuid::Uuid;

use tally_domain::ChunkMeta;

use crate::{Error, Result};

pub const VIEW: &str = "view";
pub const MERCHANT_NAME: &str = "merchant_name";
pub const MERCHANT_NORMALIZED: &str = "merchant_normalized";
pub const TRANSACTION_TS: &str = "transaction_ts";
pub const CATEGORIES: &str = "categories";
pub const PAYMENT_METHOD: &str = "payment_method";
pub const CONTENT: &str = "content";
pub const TOTAL_VALUE: &str = "total_value";
pub const ITEM_PRICE_VALUE: &str = "item_price_value";
pub const FLAG_HAS_TIP: &str = "flags.has_tip";
pub const FLAG_HAS_DISCOUNT: &str = "flags.has_discount";
pub const FLAG_HAS_LOYALTY: &str = "flags.has_loyalty";
pub const FLAG_HAS_WARRANTY: &str = "flags.has_warranty";

/// Point ids must be UUIDs; chunk ids are arbitrary strings.
pub fn point_id(chunk_id: &str) -> String {
	Uuid::new_v5(&Uuid::NAMESPACE_OID, chunk_id.as_bytes()).to_string()
}

pub fn encode(chunk: &ChunkMeta) -> Result<HashMap<String, Value>> {
	let JsonValue::Object(mut map) =
		serde_json::to_value(chunk).map_err(|err| Error::InvalidPayload(err.to_string()))?
	else {
		return Err(Error::InvalidPayload("Chunk did not serialize to an object.".to_string()));
	};

	map.insert(TOTAL_VALUE.to_string(), float(chunk.totals.total.to_f64()));

	if let Some(item) = &chunk.item {
		map.insert(ITEM_PRICE_VALUE.to_string(), float(item.price.to_f64()));
	}

	Ok(map.into_iter().map(|(key, value)| (key, Value::from(value))).collect())
}

pub fn decode(payload: &HashMap<String, Value>) -> Result<ChunkMeta> {
	let map: Map<String, JsonValue> =
		payload.iter().map(|(key, value)| (key.clone(), to_json(value))).collect();

	serde_json::from_value(JsonValue::Object(map)).map_err(|err| Error::InvalidPayload(err.to_string()))
}

pub fn payload_str<'a>(payload: &'a HashMap<String, Value>, key: &str) -> Option<&'a str> {
	match &payload.get(key)?.kind {
		Some(Kind::StringValue(text)) => Some(text),
		_ => None,
	}
}

fn float(value: Option<f64>) -> JsonValue {
	value.and_then(Number::from_f64).map(JsonValue::Number).unwrap_or(JsonValue::Null)
}

fn to_json(value: &Value) -> JsonValue {
	match &value.kind {
		None | Some(Kind::NullValue(_)) => JsonValue::Null,
		Some(Kind::BoolValue(flag)) => JsonValue::Bool(*flag),
		Some(Kind::IntegerValue(number)) => JsonValue::from(*number),
		Some(Kind::DoubleValue(number)) => float(Some(*number)),
		Some(Kind::StringValue(text)) => JsonValue::String(text.clone()),
		Some(Kind::ListValue(list)) => JsonValue::Array(list.values.iter().map(to_json).collect()),
		Some(Kind::StructValue(object)) => JsonValue::Object(
			object.fields.iter().map(|(key, value)| (key.clone(), to_json(value))).collect(),
		),
	}
}

#[cfg(test)]
mod tests {
	use rust_decimal::Decimal;
	use time::macros::datetime;

	use super::*;
	use tally_domain::{Category, ChunkFlags, ChunkView, ItemRef, PaymentMethod, Totals};

	fn item_chunk() -> ChunkMeta {
		ChunkMeta {
			chunk_id: "r-1:item_detail:0".to_string(),
			receipt_id: "r-1".to_string(),
			view: ChunkView::ItemDetail,
			merchant_name: "Best Buy".to_string(),
			merchant_normalized: "best buy".to_string(),
			transaction_ts: datetime!(2023-11-24 08:30 UTC),
			totals: Totals {
				subtotal: Some(Decimal::new(49_999, 2)),
				tax: Decimal::new(4_000, 2),
				tip: Decimal::ZERO,
				discount: Decimal::ZERO,
				total: Decimal::new(53_999, 2),
			},
			payment_method: PaymentMethod::Credit,
			categories: vec![Category::Electronics],
			item: Some(ItemRef {
				index: 0,
				name: "Headphones".to_string(),
				price: Decimal::new(49_999, 2),
				category: Category::Electronics,
				has_warranty: true,
				is_return: false,
			}),
			flags: ChunkFlags { has_warranty: true, ..ChunkFlags::default() },
			content: "Headphones $499.99 at Best Buy".to_string(),
		}
	}

	#[test]
	fn payload_carries_filterable_mirrors() {
		let payload = encode(&item_chunk()).expect("Failed to encode payload.");

		assert_eq!(payload_str(&payload, MERCHANT_NORMALIZED), Some("best buy"));
		assert_eq!(payload_str(&payload, PAYMENT_METHOD), Some("credit"));
		assert!(matches!(
			payload.get(ITEM_PRICE_VALUE).and_then(|value| value.kind.as_ref()),
			Some(Kind::DoubleValue(price)) if (*price - 499.99).abs() < 1e-9
		));
		assert_eq!(decode(&payload).expect("Failed to decode payload."), item_chunk());
	}

	#[test]
	fn decode_rejects_incomplete_payloads() {
		let mut payload = HashMap::new();

		payload.insert(MERCHANT_NAME.to_string(), Value::from("Costco".to_string()));

		assert!(matches!(decode(&payload), Err(Error::InvalidPayload(_))));
	}

	#[test]
	fn point_ids_are_stable_uuids() {
		assert_eq!(point_id("r-1:receipt_summary"), point_id("r-1:receipt_summary"));
		assert_ne!(point_id("r-1:receipt_summary"), point_id("r-2:receipt_summary"));
		assert!(Uuid::parse_str(&point_id("r-1:receipt_summary")).is_ok());
	}
}
