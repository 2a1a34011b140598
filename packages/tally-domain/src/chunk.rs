use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::receipt::{Category, PaymentMethod, Totals};

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkView {
	ReceiptSummary,
	ItemDetail,
	CategoryGroup,
	MerchantInfo,
	PaymentMethod,
}
impl ChunkView {
	pub const ALL: [Self; 5] = [
		Self::ReceiptSummary,
		Self::ItemDetail,
		Self::CategoryGroup,
		Self::MerchantInfo,
		Self::PaymentMethod,
	];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::ReceiptSummary => "receipt_summary",
			Self::ItemDetail => "item_detail",
			Self::CategoryGroup => "category_group",
			Self::MerchantInfo => "merchant_info",
			Self::PaymentMethod => "payment_method",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|view| view.as_str() == raw)
	}
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ItemRef {
	/// Position of the line item within its receipt.
	pub index: u32,
	pub name: String,
	pub price: Decimal,
	pub category: Category,
	pub has_warranty: bool,
	pub is_return: bool,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ChunkFlags {
	pub has_tip: bool,
	pub has_discount: bool,
	pub has_loyalty: bool,
	pub has_warranty: bool,
}

/// One indexed view of a receipt with everything filtering needs denormalized onto it.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ChunkMeta {
	pub chunk_id: String,
	pub receipt_id: String,
	pub view: ChunkView,
	pub merchant_name: String,
	pub merchant_normalized: String,
	#[serde(with = "crate::time_serde")]
	pub transaction_ts: OffsetDateTime,
	pub totals: Totals,
	pub payment_method: PaymentMethod,
	pub categories: Vec<Category>,
	/// Present on `item_detail` chunks only.
	pub item: Option<ItemRef>,
	pub flags: ChunkFlags,
	pub content: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScoredChunk {
	/// Cosine similarity; higher is better.
	pub score: f32,
	pub chunk: ChunkMeta,
}
