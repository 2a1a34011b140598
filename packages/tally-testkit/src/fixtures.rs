use rust_decimal::Decimal;
use time::{OffsetDateTime, macros::datetime};

use tally_domain::{Category, LineItem, PaymentMethod, Receipt};

/// Builds a receipt whose subtotal and total reconcile unless `total` is overridden.
pub struct ReceiptBuilder {
	id: String,
	merchant_name: String,
	transaction_ts: OffsetDateTime,
	items: Vec<LineItem>,
	tax: Decimal,
	tip: Decimal,
	discount: Decimal,
	total: Option<Decimal>,
	payment_method: PaymentMethod,
	address: Option<String>,
	has_loyalty: bool,
}
impl ReceiptBuilder {
	pub fn new(id: &str, merchant_name: &str, transaction_ts: OffsetDateTime) -> Self {
		Self {
			id: id.to_string(),
			merchant_name: merchant_name.to_string(),
			transaction_ts,
			items: Vec::new(),
			tax: Decimal::ZERO,
			tip: Decimal::ZERO,
			discount: Decimal::ZERO,
			total: None,
			payment_method: PaymentMethod::Credit,
			address: None,
			has_loyalty: false,
		}
	}

	/// `cents` is the extended price in cents.
	pub fn item(mut self, name: &str, cents: i64, category: Category) -> Self {
		self.items.push(LineItem::new(name, Decimal::new(cents, 2), category));

		self
	}

	pub fn warranty_item(mut self, name: &str, cents: i64, category: Category) -> Self {
		let mut item = LineItem::new(name, Decimal::new(cents, 2), category);

		item.has_warranty = true;

		self.items.push(item);

		self
	}

	pub fn tax(mut self, cents: i64) -> Self {
		self.tax = Decimal::new(cents, 2);

		self
	}

	pub fn tip(mut self, cents: i64) -> Self {
		self.tip = Decimal::new(cents, 2);

		self
	}

	pub fn discount(mut self, cents: i64) -> Self {
		self.discount = Decimal::new(cents, 2);

		self
	}

	/// Forces a total that may not reconcile with the other amounts.
	pub fn total(mut self, cents: i64) -> Self {
		self.total = Some(Decimal::new(cents, 2));

		self
	}

	pub fn paid_with(mut self, method: PaymentMethod) -> Self {
		self.payment_method = method;

		self
	}

	pub fn address(mut self, address: &str) -> Self {
		self.address = Some(address.to_string());

		self
	}

	pub fn loyalty(mut self) -> Self {
		self.has_loyalty = true;

		self
	}

	pub fn build(self) -> Receipt {
		let subtotal: Decimal = self.items.iter().map(|item| item.price).sum();
		let total = self.total.unwrap_or(subtotal - self.discount + self.tax + self.tip);
		let has_warranty_item = self.items.iter().any(|item| item.has_warranty);

		Receipt {
			id: self.id,
			merchant_name: self.merchant_name,
			transaction_ts: self.transaction_ts,
			subtotal,
			tax: self.tax,
			tip: self.tip,
			discount: self.discount,
			total,
			payment_method: self.payment_method,
			items: self.items,
			address: self.address,
			has_tip: !self.tip.is_zero(),
			has_discount: !self.discount.is_zero(),
			has_loyalty: self.has_loyalty,
			has_warranty_item,
		}
	}
}

/// A small December 2023 corpus. `wf-1213` totals $142.56.
pub fn sample_receipts() -> Vec<Receipt> {
	vec![
		ReceiptBuilder::new("wf-1213", "Whole Foods Market", datetime!(2023-12-13 18:04 UTC))
			.item("Organic Milk", 599, Category::Groceries)
			.item("Salmon Fillet", 2_499, Category::Groceries)
			.item("Olive Oil", 1_899, Category::Groceries)
			.item("Sourdough Bread", 649, Category::Groceries)
			.item("Avocados", 798, Category::Groceries)
			.item("Greek Yogurt", 549, Category::Groceries)
			.item("Dark Chocolate", 499, Category::Treats)
			.item("Coffee Beans", 1_499, Category::Groceries)
			.item("Vitamin D3", 1_999, Category::Pharmacy)
			.item("Aged Cheddar", 1_299, Category::Groceries)
			.item("Mixed Berries", 911, Category::Groceries)
			.tax(1_056)
			.address("1440 P St NW, Washington, DC")
			.build(),
		ReceiptBuilder::new("wf-1202", "Whole Foods Market", datetime!(2023-12-02 11:15 UTC))
			.item("Bananas", 199, Category::Groceries)
			.item("Almond Milk", 449, Category::Groceries)
			.paid_with(PaymentMethod::Debit)
			.build(),
		ReceiptBuilder::new("tj-1213", "Trader Joe's", datetime!(2023-12-13 09:40 UTC))
			.item("Cold Brew", 899, Category::Groceries)
			.item("Cookie Butter", 449, Category::Treats)
			.build(),
		ReceiptBuilder::new("sb-1220", "Starbucks", datetime!(2023-12-20 08:05 UTC))
			.item("Caffe Latte", 575, Category::CoffeeShop)
			.item("Butter Croissant", 395, Category::CoffeeShop)
			.tip(100)
			.paid_with(PaymentMethod::ApplePay)
			.loyalty()
			.build(),
		ReceiptBuilder::new("bb-1124", "Best Buy", datetime!(2023-11-24 10:00 UTC))
			.warranty_item("Noise Cancelling Headphones", 19_999, Category::Electronics)
			.item("USB-C Cable", 1_299, Category::Electronics)
			.tax(1_704)
			.build(),
		ReceiptBuilder::new("cvs-1205", "CVS Pharmacy", datetime!(2023-12-05 17:30 UTC))
			.item("Pain Relief Tablets", 899, Category::Pharmacy)
			.item("Allergy Relief", 1_249, Category::Pharmacy)
			.item("Candy Bar", 179, Category::Treats)
			.paid_with(PaymentMethod::Debit)
			.loyalty()
			.build(),
		ReceiptBuilder::new("hd-1210", "Home Depot", datetime!(2023-12-10 14:20 UTC))
			.item("Interior Paint", 3_498, Category::Hardware)
			.item("Paint Brushes", 997, Category::Hardware)
			.tax(360)
			.build(),
		ReceiptBuilder::new("wm-1215", "Walmart Supercenter", datetime!(2023-12-15 19:45 UTC))
			.item("Board Game", 2_497, Category::Retail)
			.discount(500)
			.paid_with(PaymentMethod::Cash)
			.build(),
		ReceiptBuilder::new("wm-1222", "Walmart", datetime!(2023-12-22 12:00 UTC))
			.item("Eggs", 349, Category::Groceries)
			.paid_with(PaymentMethod::Cash)
			.build(),
		ReceiptBuilder::new("sh-1218", "Shell", datetime!(2023-12-18 07:50 UTC))
			.item("Unleaded Fuel", 4_500, Category::Gas)
			.build(),
		ReceiptBuilder::new("mc-1219", "McDonald's", datetime!(2023-12-19 12:30 UTC))
			.item("Big Mac Meal", 849, Category::FastFood)
			.build(),
	]
}
