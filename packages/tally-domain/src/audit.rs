//! Deterministic aggregation over a result set, independent of any generated narrative.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
	money::{format_currency, round_currency},
	query::{AggregationBasis, AggregationOp},
	results::ResultSet,
};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AuditedValue {
	pub op: AggregationOp,
	pub basis: AggregationBasis,
	/// Rounded to cents for sum and average. A plain integer for count.
	pub value: Decimal,
	/// Receipts or items the value was computed over.
	pub count: usize,
}
impl AuditedValue {
	/// The figure a narrative must restate.
	pub fn display(&self) -> String {
		match self.op {
			AggregationOp::Count => self.value.to_string(),
			AggregationOp::Sum | AggregationOp::Average => format_currency(self.value),
		}
	}
}

/// `None` only for an average over nothing. Sums and counts of an empty set are zero.
pub fn audit(op: AggregationOp, basis: AggregationBasis, results: &ResultSet) -> Option<AuditedValue> {
	let amounts: Vec<Decimal> = match basis {
		AggregationBasis::Receipts => results.receipts.iter().map(|hit| hit.totals.total).collect(),
		AggregationBasis::Items => results.items.iter().map(|hit| hit.price).collect(),
	};
	let count = amounts.len();
	let sum: Decimal = amounts.iter().copied().sum();
	let value = match op {
		AggregationOp::Sum => round_currency(sum),
		AggregationOp::Count => Decimal::from(count),
		AggregationOp::Average => {
			if count == 0 {
				return None;
			}

			round_currency(sum / Decimal::from(count))
		},
	};

	Some(AuditedValue { op, basis, value, count })
}
