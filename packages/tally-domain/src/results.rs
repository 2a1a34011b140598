use std::{cmp::Ordering, collections::HashSet};

use rust_decimal::Decimal;
use serde::Serialize;
use time::OffsetDateTime;

use crate::{
	chunk::{ChunkView, ScoredChunk},
	receipt::{Category, InvariantViolation, PaymentMethod, Totals},
};

/// One distinct receipt, however many of its chunks matched.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReceiptHit {
	pub receipt_id: String,
	pub merchant_name: String,
	pub merchant_normalized: String,
	#[serde(with = "crate::time_serde")]
	pub transaction_ts: OffsetDateTime,
	pub totals: Totals,
	pub payment_method: PaymentMethod,
	/// Best chunk score for this receipt.
	pub score: f32,
	pub matched_views: Vec<ChunkView>,
}

/// One distinct matched line item, keyed by receipt and position.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ItemHit {
	pub receipt_id: String,
	pub index: u32,
	pub name: String,
	pub price: Decimal,
	pub category: Category,
	pub has_warranty: bool,
	pub is_return: bool,
	pub merchant_name: String,
	#[serde(with = "crate::time_serde")]
	pub transaction_ts: OffsetDateTime,
	pub score: f32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ResultSet {
	/// Distinct receipts in rank order.
	pub receipts: Vec<ReceiptHit>,
	/// Distinct items from item-detail chunks, in rank order.
	pub items: Vec<ItemHit>,
}
impl ResultSet {
	/// Ranks the chunks and collapses them onto receipts and items.
	pub fn from_chunks(mut chunks: Vec<ScoredChunk>) -> Self {
		rank(&mut chunks);

		let mut receipts: Vec<ReceiptHit> = Vec::new();
		let mut items = Vec::new();
		let mut seen_items = HashSet::new();

		for scored in chunks {
			let chunk = scored.chunk;

			match receipts.iter_mut().find(|hit| hit.receipt_id == chunk.receipt_id) {
				Some(hit) =>
					if !hit.matched_views.contains(&chunk.view) {
						hit.matched_views.push(chunk.view);
					},
				None => receipts.push(ReceiptHit {
					receipt_id: chunk.receipt_id.clone(),
					merchant_name: chunk.merchant_name.clone(),
					merchant_normalized: chunk.merchant_normalized.clone(),
					transaction_ts: chunk.transaction_ts,
					totals: chunk.totals,
					payment_method: chunk.payment_method,
					score: scored.score,
					matched_views: vec![chunk.view],
				}),
			}

			if chunk.view != ChunkView::ItemDetail {
				continue;
			}

			let Some(item) = chunk.item else {
				continue;
			};

			if !seen_items.insert((chunk.receipt_id.clone(), item.index)) {
				continue;
			}

			items.push(ItemHit {
				receipt_id: chunk.receipt_id,
				index: item.index,
				name: item.name,
				price: item.price,
				category: item.category,
				has_warranty: item.has_warranty,
				is_return: item.is_return,
				merchant_name: chunk.merchant_name,
				transaction_ts: chunk.transaction_ts,
				score: scored.score,
			});
		}

		Self { receipts, items }
	}

	pub fn is_empty(&self) -> bool {
		self.receipts.is_empty()
	}

	pub fn receipt_ids(&self) -> Vec<&str> {
		self.receipts.iter().map(|hit| hit.receipt_id.as_str()).collect()
	}

	/// Receipts whose stored totals do not reconcile. Totals are reported, never altered.
	pub fn integrity_violations(&self, tolerance: Decimal) -> Vec<InvariantViolation> {
		self.receipts.iter().filter_map(|hit| hit.totals.check(&hit.receipt_id, tolerance)).collect()
	}
}

/// Score descending, then newer transactions first, then chunk id for a stable order.
pub fn rank(chunks: &mut [ScoredChunk]) {
	chunks.sort_by(compare);
}

pub fn compare(left: &ScoredChunk, right: &ScoredChunk) -> Ordering {
	right
		.score
		.total_cmp(&left.score)
		.then_with(|| right.chunk.transaction_ts.cmp(&left.chunk.transaction_ts))
		.then_with(|| left.chunk.chunk_id.cmp(&right.chunk.chunk_id))
}

#[cfg(test)]
mod tests {
	use time::macros::datetime;

	use super::*;
	use crate::chunk::{ChunkFlags, ChunkMeta, ItemRef};

	fn scored(
		receipt_id: &str,
		view: ChunkView,
		item_index: Option<u32>,
		score: f32,
		ts: OffsetDateTime,
	) -> ScoredChunk {
		let chunk_id = match item_index {
			Some(index) => format!("{receipt_id}:{}:{index}", view.as_str()),
			None => format!("{receipt_id}:{}", view.as_str()),
		};

		ScoredChunk {
			score,
			chunk: ChunkMeta {
				chunk_id,
				receipt_id: receipt_id.to_string(),
				view,
				merchant_name: "Costco".to_string(),
				merchant_normalized: "costco".to_string(),
				transaction_ts: ts,
				totals: Totals { total: Decimal::new(5_000, 2), ..Totals::default() },
				payment_method: PaymentMethod::Debit,
				categories: vec![Category::Groceries],
				item: item_index.map(|index| ItemRef {
					index,
					name: format!("Item {index}"),
					price: Decimal::new(250, 2),
					category: Category::Groceries,
					has_warranty: false,
					is_return: false,
				}),
				flags: ChunkFlags::default(),
				content: String::new(),
			},
		}
	}

	#[test]
	fn ties_break_on_recency() {
		let mut chunks = vec![
			scored("old", ChunkView::ReceiptSummary, None, 0.5, datetime!(2023-01-01 0:00 UTC)),
			scored("new", ChunkView::ReceiptSummary, None, 0.5, datetime!(2023-06-01 0:00 UTC)),
			scored("best", ChunkView::ReceiptSummary, None, 0.9, datetime!(2022-01-01 0:00 UTC)),
		];

		rank(&mut chunks);

		let order: Vec<_> = chunks.iter().map(|c| c.chunk.receipt_id.as_str()).collect();

		assert_eq!(order, vec!["best", "new", "old"]);
		assert_eq!(compare(&chunks[0], &chunks[1]), Ordering::Less);
	}

	#[test]
	fn receipts_and_items_collapse_once() {
		let ts = datetime!(2023-12-13 12:00 UTC);
		let chunks = vec![
			scored("r1", ChunkView::ReceiptSummary, None, 0.9, ts),
			scored("r1", ChunkView::ItemDetail, Some(0), 0.8, ts),
			scored("r1", ChunkView::ItemDetail, Some(1), 0.7, ts),
			scored("r1", ChunkView::MerchantInfo, None, 0.6, ts),
			scored("r2", ChunkView::ItemDetail, Some(0), 0.5, ts),
		];
		let results = ResultSet::from_chunks(chunks);

		assert_eq!(results.receipt_ids(), vec!["r1", "r2"]);
		assert_eq!(results.items.len(), 3);
		assert_eq!(
			results.receipts[0].matched_views,
			vec![ChunkView::ReceiptSummary, ChunkView::ItemDetail, ChunkView::MerchantInfo]
		);
		assert_eq!(results.receipts[0].score, 0.9);
	}

	#[test]
	fn deduplication_is_idempotent() {
		let ts = datetime!(2023-12-13 12:00 UTC);
		let chunks = vec![
			scored("r1", ChunkView::ReceiptSummary, None, 0.9, ts),
			scored("r1", ChunkView::ItemDetail, Some(0), 0.8, ts),
			scored("r2", ChunkView::PaymentMethod, None, 0.4, ts),
		];
		let once = ResultSet::from_chunks(chunks.clone());
		let twice = ResultSet::from_chunks(chunks.iter().chain(chunks.iter()).cloned().collect());

		assert_eq!(once, twice);
	}

	#[test]
	fn unbalanced_totals_are_reported() {
		let mut chunk = scored("r1", ChunkView::ReceiptSummary, None, 0.9, datetime!(2023-12-13 12:00 UTC));

		chunk.chunk.totals = Totals {
			subtotal: Some(Decimal::new(1_000, 2)),
			tax: Decimal::ZERO,
			tip: Decimal::ZERO,
			discount: Decimal::ZERO,
			total: Decimal::new(2_000, 2),
		};

		let results = ResultSet::from_chunks(vec![chunk]);
		let violations = results.integrity_violations(Decimal::ONE);

		assert_eq!(violations.len(), 1);
		assert_eq!(violations[0].receipt_id, "r1");
		assert_eq!(results.receipts[0].totals.total, Decimal::new(2_000, 2));
	}
}
