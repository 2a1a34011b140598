use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::normalize;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
	Credit,
	Debit,
	Cash,
	ApplePay,
	Other,
}
impl PaymentMethod {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Credit => "credit",
			Self::Debit => "debit",
			Self::Cash => "cash",
			Self::ApplePay => "apple_pay",
			Self::Other => "other",
		}
	}

	/// Unknown labels collapse to `Other`.
	pub fn parse(raw: &str) -> Self {
		match raw.trim().to_ascii_lowercase().as_str() {
			"credit" | "credit_card" => Self::Credit,
			"debit" | "debit_card" => Self::Debit,
			"cash" => Self::Cash,
			"apple_pay" | "applepay" => Self::ApplePay,
			_ => Self::Other,
		}
	}
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
	Groceries,
	Electronics,
	Restaurant,
	CoffeeShop,
	Pharmacy,
	FastFood,
	Treats,
	Retail,
	Hardware,
	Gas,
	Other,
}
impl Category {
	pub const ALL: [Self; 11] = [
		Self::Groceries,
		Self::Electronics,
		Self::Restaurant,
		Self::CoffeeShop,
		Self::Pharmacy,
		Self::FastFood,
		Self::Treats,
		Self::Retail,
		Self::Hardware,
		Self::Gas,
		Self::Other,
	];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Groceries => "groceries",
			Self::Electronics => "electronics",
			Self::Restaurant => "restaurant",
			Self::CoffeeShop => "coffee_shop",
			Self::Pharmacy => "pharmacy",
			Self::FastFood => "fast_food",
			Self::Treats => "treats",
			Self::Retail => "retail",
			Self::Hardware => "hardware",
			Self::Gas => "gas",
			Self::Other => "other",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		let raw = raw.trim();

		Self::ALL.into_iter().find(|category| category.as_str().eq_ignore_ascii_case(raw))
	}
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct LineItem {
	pub name: String,
	pub unit_price: Option<Decimal>,
	/// Extended price. Negative only for return or refund lines.
	pub price: Decimal,
	pub quantity: u32,
	pub category: Category,
	pub has_warranty: bool,
	pub is_discount_line: bool,
	pub is_return: bool,
}
impl LineItem {
	pub fn new(name: impl Into<String>, price: Decimal, category: Category) -> Self {
		Self {
			name: name.into(),
			unit_price: None,
			price,
			quantity: 1,
			category,
			has_warranty: false,
			is_discount_line: false,
			is_return: false,
		}
	}
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Receipt {
	pub id: String,
	pub merchant_name: String,
	#[serde(with = "crate::time_serde")]
	pub transaction_ts: OffsetDateTime,
	pub subtotal: Decimal,
	pub tax: Decimal,
	pub tip: Decimal,
	pub discount: Decimal,
	pub total: Decimal,
	pub payment_method: PaymentMethod,
	pub items: Vec<LineItem>,
	pub address: Option<String>,
	pub has_tip: bool,
	pub has_discount: bool,
	pub has_loyalty: bool,
	pub has_warranty_item: bool,
}
impl Receipt {
	pub fn merchant_normalized(&self) -> String {
		normalize::normalize_merchant(&self.merchant_name)
	}

	pub fn totals(&self) -> Totals {
		Totals {
			subtotal: Some(self.subtotal),
			tax: self.tax,
			tip: self.tip,
			discount: self.discount,
			total: self.total,
		}
	}

	pub fn check_totals(&self, tolerance: Decimal) -> Option<InvariantViolation> {
		self.totals().check(&self.id, tolerance)
	}
}

/// Denormalized receipt amounts carried by every chunk view.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Totals {
	/// Absent when the source receipt never printed one.
	pub subtotal: Option<Decimal>,
	pub tax: Decimal,
	pub tip: Decimal,
	pub discount: Decimal,
	pub total: Decimal,
}
impl Totals {
	/// `subtotal - discount + tax + tip` must land within `tolerance` of `total`.
	pub fn check(&self, receipt_id: &str, tolerance: Decimal) -> Option<InvariantViolation> {
		let subtotal = self.subtotal?;
		let expected = subtotal - self.discount + self.tax + self.tip;

		if (expected - self.total).abs() <= tolerance {
			return None;
		}

		Some(InvariantViolation { receipt_id: receipt_id.to_string(), expected, actual: self.total })
	}
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct InvariantViolation {
	pub receipt_id: String,
	pub expected: Decimal,
	pub actual: Decimal,
}
