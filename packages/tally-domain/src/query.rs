use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
	lexicon,
	merchant::MerchantOutcome,
	receipt::PaymentMethod,
	temporal::TemporalOutcome,
};

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
	Temporal,
	Merchant,
	Category,
	Amount,
	Semantic,
	Feature,
	Aggregation,
	Mixed,
}
impl Intent {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Temporal => "temporal",
			Self::Merchant => "merchant",
			Self::Category => "category",
			Self::Amount => "amount",
			Self::Semantic => "semantic",
			Self::Feature => "feature",
			Self::Aggregation => "aggregation",
			Self::Mixed => "mixed",
		}
	}
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationBasis {
	/// Receipt totals, each receipt once.
	#[default]
	Receipts,
	/// Matched line-item prices, each item once.
	Items,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationOp {
	Sum,
	Count,
	Average,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountOp {
	Lt,
	Lte,
	Gt,
	Gte,
}
impl AmountOp {
	pub fn admits(self, value: Decimal, bound: Decimal) -> bool {
		match self {
			Self::Lt => value < bound,
			Self::Lte => value <= bound,
			Self::Gt => value > bound,
			Self::Gte => value >= bound,
		}
	}
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct AmountBound {
	pub op: AmountOp,
	pub value: Decimal,
}
impl AmountBound {
	pub fn admits(&self, value: Decimal) -> bool {
		self.op.admits(value, self.value)
	}
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
	Warranty,
	Tip,
	Discount,
	Loyalty,
}

/// An OR-set: a chunk matches when it carries any listed category or its content contains any
/// keyword.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CategoryFilter {
	pub key: String,
	pub categories: Vec<crate::receipt::Category>,
	pub keywords: Vec<String>,
}

/// Everything the lexicon finds in one query, before the resolvers run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QuerySignals {
	pub category: Option<CategoryFilter>,
	pub product: Option<String>,
	pub amount: Vec<AmountBound>,
	pub payment: Option<PaymentMethod>,
	pub feature: Option<Feature>,
	pub aggregation: Option<AggregationOp>,
	pub item_language: bool,
}
impl QuerySignals {
	pub fn extract(query: &str) -> Self {
		let category = lexicon::find_category(query);
		let product = if category.is_none() { lexicon::find_product(query) } else { None };

		Self {
			category,
			product,
			amount: lexicon::find_amount_bounds(query),
			payment: lexicon::find_payment(query),
			feature: lexicon::find_feature(query),
			aggregation: lexicon::find_aggregation(query),
			item_language: lexicon::mentions_items(query),
		}
	}

	pub fn basis(&self) -> AggregationBasis {
		if self.product.is_some() || self.item_language {
			AggregationBasis::Items
		} else {
			AggregationBasis::Receipts
		}
	}
}

/// The interpreter's output. Created per query and consumed by retrieval and the audit.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QueryParameters {
	pub query: String,
	pub intent: Intent,
	pub temporal: TemporalOutcome,
	pub merchant: MerchantOutcome,
	pub category: Option<CategoryFilter>,
	pub amount: Vec<AmountBound>,
	pub payment: Option<PaymentMethod>,
	pub feature: Option<Feature>,
	pub aggregation: Option<AggregationOp>,
	pub basis: AggregationBasis,
}
impl QueryParameters {
	/// Raw query only. Retrieval falls back to pure similarity search.
	pub fn semantic(query: impl Into<String>) -> Self {
		Self {
			query: query.into(),
			intent: Intent::Semantic,
			temporal: TemporalOutcome::NotMentioned,
			merchant: MerchantOutcome::NotMentioned,
			category: None,
			amount: Vec::new(),
			payment: None,
			feature: None,
			aggregation: None,
			basis: AggregationBasis::Receipts,
		}
	}

	pub fn assemble(
		query: impl Into<String>,
		temporal: TemporalOutcome,
		merchant: MerchantOutcome,
		signals: QuerySignals,
	) -> Self {
		let basis = signals.basis();
		let category = signals.category.or_else(|| {
			signals.product.map(|product| CategoryFilter {
				key: "product".to_string(),
				categories: Vec::new(),
				keywords: vec![product],
			})
		});
		let mut kinds = Vec::new();

		if temporal.is_mentioned() {
			kinds.push(Intent::Temporal);
		}
		if merchant.is_mentioned() {
			kinds.push(Intent::Merchant);
		}
		if category.is_some() {
			kinds.push(Intent::Category);
		}
		if !signals.amount.is_empty() {
			kinds.push(Intent::Amount);
		}
		if signals.payment.is_some() || signals.feature.is_some() {
			kinds.push(Intent::Feature);
		}

		let intent = match kinds.as_slice() {
			[] if signals.aggregation.is_some() => Intent::Aggregation,
			[] => Intent::Semantic,
			[only] => *only,
			_ => Intent::Mixed,
		};

		Self {
			query: query.into(),
			intent,
			temporal,
			merchant,
			category,
			amount: signals.amount,
			payment: signals.payment,
			feature: signals.feature,
			aggregation: signals.aggregation,
			basis,
		}
	}
}
