//! Metadata predicates applied alongside vector similarity.

use serde::Serialize;

use crate::{
	chunk::{ChunkMeta, ChunkView},
	query::{AggregationBasis, AmountBound, Feature, QueryParameters},
	receipt::{Category, PaymentMethod},
	temporal::DateRange,
};

/// Clauses dropped when a filter comes back empty, least certain first. Merchant and date are
/// never dropped.
const WIDENING_ORDER: [ClauseKind; 4] =
	[ClauseKind::Amount, ClauseKind::Feature, ClauseKind::Payment, ClauseKind::Category];

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClauseKind {
	Merchant,
	DateRange,
	Category,
	Amount,
	Payment,
	Feature,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountField {
	ReceiptTotal,
	ItemPrice,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "clause", rename_all = "snake_case")]
pub enum FilterClause {
	/// Exact match on the canonical normalized merchant.
	Merchant { normalized: String },
	/// Closed range on the transaction timestamp.
	DateRange { range: DateRange },
	Category { categories: Vec<Category>, keywords: Vec<String> },
	Amount { field: AmountField, bounds: Vec<AmountBound> },
	Payment { method: PaymentMethod },
	Feature { feature: Feature },
}
impl FilterClause {
	pub fn kind(&self) -> ClauseKind {
		match self {
			Self::Merchant { .. } => ClauseKind::Merchant,
			Self::DateRange { .. } => ClauseKind::DateRange,
			Self::Category { .. } => ClauseKind::Category,
			Self::Amount { .. } => ClauseKind::Amount,
			Self::Payment { .. } => ClauseKind::Payment,
			Self::Feature { .. } => ClauseKind::Feature,
		}
	}

	pub fn matches(&self, chunk: &ChunkMeta) -> bool {
		match self {
			Self::Merchant { normalized } => chunk.merchant_normalized == *normalized,
			Self::DateRange { range } => range.contains(chunk.transaction_ts),
			Self::Category { categories, keywords } => {
				let by_category = match &chunk.item {
					Some(item) => categories.contains(&item.category),
					None => chunk.categories.iter().any(|category| categories.contains(category)),
				};

				by_category || contains_keyword(chunk, keywords)
			},
			Self::Amount { field: AmountField::ReceiptTotal, bounds } =>
				bounds.iter().all(|bound| bound.admits(chunk.totals.total)),
			// Item bounds only ever admit item chunks.
			Self::Amount { field: AmountField::ItemPrice, bounds } => chunk
				.item
				.as_ref()
				.is_some_and(|item| bounds.iter().all(|bound| bound.admits(item.price))),
			Self::Payment { method } => chunk.payment_method == *method,
			Self::Feature { feature } => match feature {
				Feature::Warranty => match &chunk.item {
					Some(item) => item.has_warranty,
					None => chunk.flags.has_warranty,
				},
				Feature::Tip => chunk.flags.has_tip,
				Feature::Discount => chunk.flags.has_discount,
				Feature::Loyalty => chunk.flags.has_loyalty,
			},
		}
	}
}

/// Conjunction of clauses. An empty filter matches everything.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ChunkFilter {
	pub clauses: Vec<FilterClause>,
}
impl ChunkFilter {
	pub fn from_parameters(params: &QueryParameters) -> Self {
		let mut clauses = Vec::new();

		if let Some(normalized) = params.merchant.normalized() {
			clauses.push(FilterClause::Merchant { normalized: normalized.to_string() });
		}
		if let Some(range) = params.temporal.range() {
			clauses.push(FilterClause::DateRange { range: *range });
		}
		if let Some(category) = &params.category {
			clauses.push(FilterClause::Category {
				categories: category.categories.clone(),
				keywords: category.keywords.clone(),
			});
		}
		if !params.amount.is_empty() {
			let field = match params.basis {
				AggregationBasis::Receipts => AmountField::ReceiptTotal,
				AggregationBasis::Items => AmountField::ItemPrice,
			};

			clauses.push(FilterClause::Amount { field, bounds: params.amount.clone() });
		}
		if let Some(method) = params.payment {
			clauses.push(FilterClause::Payment { method });
		}
		if let Some(feature) = params.feature {
			clauses.push(FilterClause::Feature { feature });
		}

		Self { clauses }
	}

	pub fn is_empty(&self) -> bool {
		self.clauses.is_empty()
	}

	pub fn has(&self, kind: ClauseKind) -> bool {
		self.clauses.iter().any(|clause| clause.kind() == kind)
	}

	pub fn get(&self, kind: ClauseKind) -> Option<&FilterClause> {
		self.clauses.iter().find(|clause| clause.kind() == kind)
	}

	pub fn matches(&self, chunk: &ChunkMeta) -> bool {
		self.clauses.iter().all(|clause| clause.matches(chunk))
	}

	/// Views worth searching under this filter. Item price bounds restrict to item chunks.
	pub fn views(&self) -> Option<Vec<ChunkView>> {
		match self.get(ClauseKind::Amount) {
			Some(FilterClause::Amount { field: AmountField::ItemPrice, .. }) =>
				Some(vec![ChunkView::ItemDetail]),
			_ => None,
		}
	}

	/// The filter with its least certain droppable clause removed, or `None` when only merchant
	/// and date clauses remain.
	pub fn widen(&self) -> Option<(Self, ClauseKind)> {
		let dropped = WIDENING_ORDER.into_iter().find(|kind| self.has(*kind))?;
		let clauses =
			self.clauses.iter().filter(|clause| clause.kind() != dropped).cloned().collect();

		Some((Self { clauses }, dropped))
	}
}

fn contains_keyword(chunk: &ChunkMeta, keywords: &[String]) -> bool {
	if keywords.is_empty() {
		return false;
	}

	let haystack = match &chunk.item {
		Some(item) => padded_words(&format!("{} {}", item.name, chunk.content)),
		None => padded_words(&chunk.content),
	};

	keywords.iter().any(|keyword| {
		let needle = padded_words(keyword);

		!needle.trim().is_empty() && haystack.contains(&needle)
	})
}

/// Lowercase words joined and wrapped by single spaces, so containment only matches whole
/// tokens the way the index's full-text match does.
fn padded_words(text: &str) -> String {
	let words: Vec<String> = text
		.split(|ch: char| !ch.is_alphanumeric())
		.filter(|word| !word.is_empty())
		.map(str::to_lowercase)
		.collect();

	format!(" {} ", words.join(" "))
}

#[cfg(test)]
mod tests {
	use rust_decimal::Decimal;
	use time::macros::{date, datetime};

	use super::*;
	use crate::{
		chunk::{ChunkFlags, ItemRef},
		query::AmountOp,
		receipt::Totals,
	};

	fn chunk(view: ChunkView, item: Option<ItemRef>) -> ChunkMeta {
		ChunkMeta {
			chunk_id: "r1:0".to_string(),
			receipt_id: "r1".to_string(),
			view,
			merchant_name: "Whole Foods Market".to_string(),
			merchant_normalized: "whole foods".to_string(),
			transaction_ts: datetime!(2023-12-13 10:30 UTC),
			totals: Totals {
				subtotal: Some(Decimal::new(13_200, 2)),
				tax: Decimal::new(1_056, 2),
				tip: Decimal::ZERO,
				discount: Decimal::ZERO,
				total: Decimal::new(14_256, 2),
			},
			payment_method: PaymentMethod::Credit,
			categories: vec![Category::Groceries],
			item,
			flags: ChunkFlags { has_loyalty: true, ..ChunkFlags::default() },
			content: "Whole Foods Market receipt with organic milk".to_string(),
		}
	}

	fn item(price: i64) -> ItemRef {
		ItemRef {
			index: 0,
			name: "Organic Milk".to_string(),
			price: Decimal::new(price, 2),
			category: Category::Groceries,
			has_warranty: false,
			is_return: false,
		}
	}

	fn strict_filter() -> ChunkFilter {
		ChunkFilter {
			clauses: vec![
				FilterClause::Merchant { normalized: "whole foods".to_string() },
				FilterClause::DateRange {
					range: DateRange::days(date!(2023 - 12 - 01), date!(2023 - 12 - 31)),
				},
				FilterClause::Category { categories: vec![Category::Groceries], keywords: Vec::new() },
				FilterClause::Amount {
					field: AmountField::ReceiptTotal,
					bounds: vec![AmountBound { op: AmountOp::Gt, value: Decimal::new(500, 0) }],
				},
			],
		}
	}

	#[test]
	fn clauses_are_conjunctive() {
		let summary = chunk(ChunkView::ReceiptSummary, None);
		let filter = strict_filter();

		assert!(!filter.matches(&summary));

		let (widened, dropped) = filter.widen().expect("Expected a droppable clause.");

		assert_eq!(dropped, ClauseKind::Amount);
		assert!(widened.matches(&summary));
		assert!(ChunkFilter::default().matches(&summary));
	}

	#[test]
	fn widening_keeps_merchant_and_date() {
		let (once, first) = strict_filter().widen().expect("Expected a droppable clause.");
		let (twice, second) = once.widen().expect("Expected a droppable clause.");

		assert_eq!(first, ClauseKind::Amount);
		assert_eq!(second, ClauseKind::Category);
		assert!(twice.has(ClauseKind::Merchant));
		assert!(twice.has(ClauseKind::DateRange));
		assert!(twice.widen().is_none());
	}

	#[test]
	fn item_price_bounds_only_admit_items() {
		let filter = ChunkFilter {
			clauses: vec![FilterClause::Amount {
				field: AmountField::ItemPrice,
				bounds: vec![AmountBound { op: AmountOp::Gt, value: Decimal::new(5, 0) }],
			}],
		};

		assert!(!filter.matches(&chunk(ChunkView::ReceiptSummary, None)));
		assert!(!filter.matches(&chunk(ChunkView::ItemDetail, Some(item(499)))));
		assert!(filter.matches(&chunk(ChunkView::ItemDetail, Some(item(649)))));
		assert_eq!(filter.views(), Some(vec![ChunkView::ItemDetail]));
	}

	#[test]
	fn category_set_matches_category_or_keyword() {
		let by_keyword = ChunkFilter {
			clauses: vec![FilterClause::Category {
				categories: vec![Category::Treats],
				keywords: vec!["milk".to_string()],
			}],
		};
		let miss = ChunkFilter {
			clauses: vec![FilterClause::Category {
				categories: vec![Category::Treats],
				keywords: vec!["chocolate".to_string()],
			}],
		};

		assert!(by_keyword.matches(&chunk(ChunkView::ItemDetail, Some(item(499)))));
		assert!(!miss.matches(&chunk(ChunkView::ItemDetail, Some(item(499)))));
	}

	#[test]
	fn keywords_match_whole_words_only() {
		let filter = |keyword: &str| ChunkFilter {
			clauses: vec![FilterClause::Category {
				categories: Vec::new(),
				keywords: vec![keyword.to_string()],
			}],
		};
		let mut summary = chunk(ChunkView::ReceiptSummary, None);

		summary.content = "Pancake mix and a Las Vegas mug, plus vanilla ice-cream".to_string();

		assert!(!filter("cake").matches(&summary));
		assert!(!filter("gas").matches(&summary));
		assert!(filter("pancake").matches(&summary));
		assert!(filter("ice cream").matches(&summary));
		assert!(!filter("").matches(&summary));
	}

	#[test]
	fn payment_and_feature_clauses() {
		let summary = chunk(ChunkView::ReceiptSummary, None);
		let loyalty = ChunkFilter {
			clauses: vec![
				FilterClause::Payment { method: PaymentMethod::Credit },
				FilterClause::Feature { feature: Feature::Loyalty },
			],
		};
		let tip = ChunkFilter { clauses: vec![FilterClause::Feature { feature: Feature::Tip }] };

		assert!(loyalty.matches(&summary));
		assert!(!tip.matches(&summary));
	}
}
