use std::collections::BTreeSet;

use tally_domain::{ChunkFlags, ChunkMeta, ChunkView, ItemRef, Receipt, money::format_currency};

/// Every view of one receipt: a summary, one chunk per line item, one per category, the merchant
/// and the payment.
pub fn chunk_receipt(receipt: &Receipt) -> Vec<ChunkMeta> {
	let categories: Vec<_> =
		receipt.items.iter().map(|item| item.category).collect::<BTreeSet<_>>().into_iter().collect();
	let date = receipt.transaction_ts.date();
	let total = format_currency(receipt.total);
	let base = ChunkMeta {
		chunk_id: format!("{}:{}", receipt.id, ChunkView::ReceiptSummary.as_str()),
		receipt_id: receipt.id.clone(),
		view: ChunkView::ReceiptSummary,
		merchant_name: receipt.merchant_name.clone(),
		merchant_normalized: receipt.merchant_normalized(),
		transaction_ts: receipt.transaction_ts,
		totals: receipt.totals(),
		payment_method: receipt.payment_method,
		categories: categories.clone(),
		item: None,
		flags: ChunkFlags {
			has_tip: receipt.has_tip,
			has_discount: receipt.has_discount,
			has_loyalty: receipt.has_loyalty,
			has_warranty: receipt.has_warranty_item,
		},
		content: format!(
			"Receipt from {} on {date}: {} items, total {total}.",
			receipt.merchant_name,
			receipt.items.len()
		),
	};
	let mut chunks = Vec::with_capacity(receipt.items.len() + categories.len() + 3);

	for (index, item) in receipt.items.iter().enumerate() {
		chunks.push(ChunkMeta {
			chunk_id: format!("{}:{}:{index}", receipt.id, ChunkView::ItemDetail.as_str()),
			view: ChunkView::ItemDetail,
			categories: vec![item.category],
			item: Some(ItemRef {
				index: index as u32,
				name: item.name.clone(),
				price: item.price,
				category: item.category,
				has_warranty: item.has_warranty,
				is_return: item.is_return,
			}),
			content: format!(
				"{} {} from {} ({}).",
				item.name,
				format_currency(item.price),
				receipt.merchant_name,
				item.category.as_str()
			),
			..base.clone()
		});
	}

	for category in &categories {
		let names: Vec<_> = receipt
			.items
			.iter()
			.filter(|item| item.category == *category)
			.map(|item| item.name.as_str())
			.collect();

		chunks.push(ChunkMeta {
			chunk_id: format!("{}:{}:{}", receipt.id, ChunkView::CategoryGroup.as_str(), category.as_str()),
			view: ChunkView::CategoryGroup,
			categories: vec![*category],
			content: format!(
				"{} purchases at {}: {}.",
				category.as_str(),
				receipt.merchant_name,
				names.join(", ")
			),
			..base.clone()
		});
	}

	chunks.push(ChunkMeta {
		chunk_id: format!("{}:{}", receipt.id, ChunkView::MerchantInfo.as_str()),
		view: ChunkView::MerchantInfo,
		content: format!(
			"{} {}",
			receipt.merchant_name,
			receipt.address.as_deref().unwrap_or_default()
		)
		.trim()
		.to_string(),
		..base.clone()
	});
	chunks.push(ChunkMeta {
		chunk_id: format!("{}:{}", receipt.id, ChunkView::PaymentMethod.as_str()),
		view: ChunkView::PaymentMethod,
		content: format!(
			"Paid {total} by {} at {}.",
			receipt.payment_method.as_str(),
			receipt.merchant_name
		),
		..base.clone()
	});
	chunks.push(base);

	chunks
}

#[cfg(test)]
mod tests {
	use rust_decimal::Decimal;

	use super::*;
	use crate::fixtures::sample_receipts;

	#[test]
	fn one_chunk_per_view_item_and_category() {
		let receipts = sample_receipts();
		let receipt = receipts.iter().find(|receipt| receipt.id == "cvs-1205").expect("Missing fixture.");
		let chunks = chunk_receipt(receipt);
		let count = |view: ChunkView| chunks.iter().filter(|chunk| chunk.view == view).count();

		assert_eq!(count(ChunkView::ReceiptSummary), 1);
		assert_eq!(count(ChunkView::ItemDetail), 3);
		assert_eq!(count(ChunkView::CategoryGroup), 2);
		assert_eq!(count(ChunkView::MerchantInfo), 1);
		assert_eq!(count(ChunkView::PaymentMethod), 1);
	}

	#[test]
	fn every_view_carries_receipt_totals_and_merchant() {
		let receipts = sample_receipts();
		let receipt = &receipts[0];

		for chunk in chunk_receipt(receipt) {
			assert_eq!(chunk.receipt_id, "wf-1213");
			assert_eq!(chunk.merchant_normalized, "whole foods");
			assert_eq!(chunk.totals.total, Decimal::new(14_256, 2));
		}
	}

	#[test]
	fn chunk_ids_are_unique() {
		let receipts = sample_receipts();
		let ids: BTreeSet<_> = receipts.iter().flat_map(chunk_receipt).map(|chunk| chunk.chunk_id).collect();
		let total: usize = receipts.iter().map(|receipt| chunk_receipt(receipt).len()).sum();

		assert_eq!(ids.len(), total);
	}
}
