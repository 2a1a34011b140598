use rust_decimal::Decimal;
use time::macros::datetime;

use tally_domain::{Category, ChunkFlags, ChunkMeta, ChunkView, PaymentMethod, Totals};
use tally_storage::payload;

fn summary_chunk() -> ChunkMeta {
	ChunkMeta {
		chunk_id: "r-9:receipt_summary".to_string(),
		receipt_id: "r-9".to_string(),
		view: ChunkView::ReceiptSummary,
		merchant_name: "Costco Wholesale".to_string(),
		merchant_normalized: "costco wholesale".to_string(),
		transaction_ts: datetime!(2023-07-04 16:20 UTC),
		totals: Totals {
			subtotal: Some(Decimal::new(18_000, 2)),
			tax: Decimal::new(1_440, 2),
			tip: Decimal::ZERO,
			discount: Decimal::new(500, 2),
			total: Decimal::new(18_940, 2),
		},
		payment_method: PaymentMethod::Debit,
		categories: vec![Category::Groceries, Category::Electronics],
		item: None,
		flags: ChunkFlags { has_discount: true, has_loyalty: true, ..ChunkFlags::default() },
		content: "Costco Wholesale receipt".to_string(),
	}
}

#[test]
fn summary_payload_keeps_exact_decimals() {
	let payload = payload::encode(&summary_chunk()).expect("Failed to encode payload.");
	let decoded = payload::decode(&payload).expect("Failed to decode payload.");

	assert_eq!(decoded.totals.total.to_string(), "189.40");
	assert!(decoded.item.is_none());
	assert!(!payload.contains_key(payload::ITEM_PRICE_VALUE));
	assert!(payload.contains_key(payload::TOTAL_VALUE));
	assert_eq!(payload::payload_str(&payload, payload::TRANSACTION_TS), Some("2023-07-04T16:20:00Z"));
	assert_eq!(payload::payload_str(&payload, payload::VIEW), Some("receipt_summary"));
}
