//! Static vocabulary for query interpretation.
//!
//! The expansion table is data, versioned by [`EXPANSION_TABLE_VERSION`]. Bump the version
//! whenever a trigger, category or keyword changes so cached interpretations can be told apart.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::{
	money::parse_amount,
	normalize::normalize_query,
	query::{AggregationOp, AmountBound, AmountOp, CategoryFilter, Feature},
	receipt::{Category, PaymentMethod},
	temporal,
};

pub const EXPANSION_TABLE_VERSION: u32 = 1;
/// Category dictionary. Colloquial phrase to the closed category set.
pub const CATEGORY_PHRASES: &[(&str, Category)] = &[
	("coffee shops", Category::CoffeeShop),
	("coffee shop", Category::CoffeeShop),
	("coffee", Category::CoffeeShop),
	("cafes", Category::CoffeeShop),
	("restaurants", Category::Restaurant),
	("restaurant", Category::Restaurant),
	("dining out", Category::Restaurant),
	("groceries", Category::Groceries),
	("grocery", Category::Groceries),
	("electronics", Category::Electronics),
	("gadgets", Category::Electronics),
	("pharmacy", Category::Pharmacy),
	("drugstore", Category::Pharmacy),
	("fast food", Category::FastFood),
	("treats", Category::Treats),
	("sweets", Category::Treats),
	("hardware", Category::Hardware),
	("gas", Category::Gas),
	("fuel", Category::Gas),
	("retail", Category::Retail),
	("clothing", Category::Retail),
	("clothes", Category::Retail),
];
/// Semantic expansions. Checked before the dictionary; each one widens a vague phrase into an
/// OR-set of categories and content keywords.
pub const EXPANSIONS: &[Expansion] = &[
	Expansion {
		key: "health_related",
		triggers: &[
			"health-related",
			"health related",
			"healthcare",
			"health",
			"medical",
			"medicine",
			"wellness",
		],
		categories: &[Category::Pharmacy],
		keywords: &[
			"pharmacy",
			"health",
			"medicine",
			"vitamin",
			"supplement",
			"pain relief",
			"allergy",
			"bandage",
			"first aid",
			"prescription",
		],
	},
	Expansion {
		key: "treats",
		triggers: &["treats", "treat", "sweets", "desserts", "dessert", "snacks", "indulgences"],
		categories: &[Category::Treats],
		keywords: &[
			"candy",
			"chocolate",
			"ice cream",
			"cake",
			"cookie",
			"donut",
			"dessert",
			"sweet",
			"pastry",
			"croissant",
			"muffin",
			"brownie",
			"snack",
		],
	},
	Expansion {
		key: "coffee_shops",
		triggers: &["coffee shops", "coffee shop", "coffee places", "cafes"],
		categories: &[Category::CoffeeShop],
		keywords: &["coffee", "starbucks", "dunkin", "cafe", "latte", "espresso"],
	},
	Expansion {
		key: "restaurants",
		triggers: &["restaurants", "dining out", "eating out", "eat out", "meals out"],
		categories: &[Category::Restaurant, Category::FastFood],
		keywords: &["restaurant", "burger", "pizza", "sandwich", "salad", "pasta", "steak"],
	},
	Expansion {
		key: "home_improvement",
		triggers: &["home improvement", "home repair", "home repairs", "diy", "tools"],
		categories: &[Category::Hardware],
		keywords: &["tool", "paint", "lumber", "hardware"],
	},
	Expansion {
		key: "car",
		triggers: &["car", "vehicle", "auto", "automotive"],
		categories: &[Category::Gas],
		keywords: &["gas", "fuel", "gasoline"],
	},
];

const MAX_PRODUCT_WORDS: usize = 3;
const UNIT_WORDS: &[&str] = &[
	"item", "items", "day", "days", "week", "weeks", "month", "months", "year", "years", "time",
	"times", "receipt", "receipts", "purchase", "purchases", "hour", "hours", "visit", "visits",
	"trips",
];

static AMOUNT_BOUND: LazyLock<Regex> = LazyLock::new(|| {
	compile(
		r"\b(no\s+more\s+than|more\s+than|greater\s+than|at\s+least|at\s+most|less\s+than|cheaper\s+than|up\s+to|over|above|exceeding|under|below)\s+(\$\s?)?(\d+(?:,\d{3})*(?:\.\d{1,2})?)(\s*(?:dollars|bucks|usd)\b)?(?:\s+(\w+))?",
	)
});
static AMOUNT_BETWEEN: LazyLock<Regex> = LazyLock::new(|| {
	compile(
		r"\bbetween\s+(\$\s?)?(\d+(?:,\d{3})*(?:\.\d{1,2})?)(\s*dollars)?\s+and\s+(\$\s?)?(\d+(?:,\d{3})*(?:\.\d{1,2})?)(\s*dollars)?",
	)
});
static PAYMENT_CUES: LazyLock<Vec<(Regex, PaymentMethod)>> = LazyLock::new(|| {
	vec![
		(compile(r"\bapple\s*pay\b"), PaymentMethod::ApplePay),
		(
			compile(
				r"\b(?:credit(?:\s+card)?|visa|master\s?card|amex|american\s+express|discover\s+card)\b",
			),
			PaymentMethod::Credit,
		),
		(compile(r"\bdebit(?:\s+card)?\b"), PaymentMethod::Debit),
		(compile(r"\bcash\b"), PaymentMethod::Cash),
	]
});
static FEATURE_CUES: LazyLock<Vec<(Regex, Feature)>> = LazyLock::new(|| {
	vec![
		(compile(r"\bwarrant(?:y|ies)\b"), Feature::Warranty),
		(compile(r"\b(?:tips?|tipped|tipping|gratuity)\b"), Feature::Tip),
		(
			compile(r"\b(?:discounts?|discounted|coupons?|promos?|promotions?|savings?)\b"),
			Feature::Discount,
		),
		(
			compile(r"\b(?:loyalty|rewards?|membership|member\s+points|points)\b"),
			Feature::Loyalty,
		),
	]
});
static AGGREGATION_CUES: LazyLock<Vec<(Regex, AggregationOp)>> = LazyLock::new(|| {
	vec![
		(compile(r"\b(?:average|avg|mean)\b"), AggregationOp::Average),
		(compile(r"\b(?:how\s+many|count|number\s+of)\b"), AggregationOp::Count),
		(
			compile(
				r"\b(?:how\s+much|total|sum|spent|spend|spending|add\s+up|adds\s+up|altogether|in\s+all)\b",
			),
			AggregationOp::Sum,
		),
	]
});
static ITEM_CUE: LazyLock<Regex> = LazyLock::new(|| {
	compile(
		r"\b(?:items?|products?|line\s+items?|things|list\s+all|list\s+every|each\s+item|cost|costs|costing|priced)\b",
	)
});
static RECEIPT_CUE: LazyLock<Regex> =
	LazyLock::new(|| compile(r"\b(?:receipts?|trips?|visits?|transactions?|orders?)\b"));
static PRODUCT: LazyLock<Regex> = LazyLock::new(|| {
	compile(
		r"\b(?:spend|spent|pay|paid)\s+on\s+(?:the\s+|my\s+|a\s+|an\s+)?([a-z][a-z'\- ]*?)(?:\s+(?:at|from|in|during|last|this|since|between|over|under|on|for|with|by|using|and)\b|[?.!,]|$)|\b(?:price|cost)\s+of\s+(?:the\s+|my\s+|a\s+|an\s+)?([a-z][a-z'\- ]*?)(?:\s+(?:at|from|in|during|last|this|since|on|for)\b|[?.!,]|$)",
	)
});

#[derive(Debug)]
pub struct Expansion {
	pub key: &'static str,
	pub triggers: &'static [&'static str],
	pub categories: &'static [Category],
	pub keywords: &'static [&'static str],
}

/// Exact dictionary lookup for a whole phrase.
pub fn category_for_phrase(phrase: &str) -> Option<Category> {
	let phrase = normalize_query(phrase);

	CATEGORY_PHRASES.iter().find(|(candidate, _)| *candidate == phrase).map(|(_, category)| *category)
}

/// Exact trigger lookup for a whole phrase.
pub fn expansion_for_phrase(phrase: &str) -> Option<&'static Expansion> {
	let phrase = normalize_query(phrase);

	EXPANSIONS.iter().find(|expansion| expansion.triggers.contains(&phrase.as_str()))
}

/// First semantic expansion, else the longest dictionary phrase, found anywhere in the query.
pub fn find_category(query: &str) -> Option<CategoryFilter> {
	let text = padded_words(query);

	for expansion in EXPANSIONS {
		if expansion.triggers.iter().any(|trigger| has_phrase(&text, trigger)) {
			return Some(CategoryFilter {
				key: expansion.key.to_string(),
				categories: expansion.categories.to_vec(),
				keywords: expansion.keywords.iter().map(|keyword| keyword.to_string()).collect(),
			});
		}
	}

	CATEGORY_PHRASES
		.iter()
		.filter(|(phrase, _)| has_phrase(&text, phrase))
		.max_by_key(|(phrase, _)| phrase.len())
		.map(|(_, category)| CategoryFilter {
			key: category.as_str().to_string(),
			categories: vec![*category],
			keywords: Vec::new(),
		})
}

/// A single named product the query spends on, e.g. "milk" in "spent on milk at Costco".
pub fn find_product(query: &str) -> Option<String> {
	let text = normalize_query(query);
	let caps = PRODUCT.captures(&text)?;
	let product = caps.get(1).or_else(|| caps.get(2))?.as_str().trim();

	if product.is_empty()
		|| category_for_phrase(product).is_some()
		|| expansion_for_phrase(product).is_some()
		|| temporal::mentions_time(product)
		|| product.split_whitespace().count() > MAX_PRODUCT_WORDS
	{
		return None;
	}

	Some(product.to_string())
}

/// Up to two amount bounds. Bare numbers count unless a unit word ("3 items") follows them.
pub fn find_amount_bounds(query: &str) -> Vec<AmountBound> {
	let text = normalize_query(query);

	if let Some(caps) = AMOUNT_BETWEEN.captures(&text)
		&& (caps.get(1).is_some()
			|| caps.get(3).is_some()
			|| caps.get(4).is_some()
			|| caps.get(6).is_some())
		&& let (Some(low), Some(high)) = (amount(&caps, 2), amount(&caps, 5))
	{
		let (low, high) = if low <= high { (low, high) } else { (high, low) };

		return vec![
			AmountBound { op: AmountOp::Gte, value: low },
			AmountBound { op: AmountOp::Lte, value: high },
		];
	}

	let mut bounds = Vec::new();

	for caps in AMOUNT_BOUND.captures_iter(&text) {
		let currency = caps.get(2).is_some() || caps.get(4).is_some();
		let unit = caps.get(5).is_some_and(|word| UNIT_WORDS.contains(&word.as_str()));

		if !currency && unit {
			continue;
		}

		let Some(value) = amount(&caps, 3) else {
			continue;
		};
		let op = match caps.get(1).map(|m| m.as_str().split_whitespace().collect::<Vec<_>>()) {
			Some(words) => match words.as_slice() {
				["no", "more", "than"] | ["at", "most"] | ["up", "to"] => AmountOp::Lte,
				["at", "least"] => AmountOp::Gte,
				["less", "than"] | ["cheaper", "than"] | ["under"] | ["below"] => AmountOp::Lt,
				_ => AmountOp::Gt,
			},
			None => continue,
		};

		bounds.push(AmountBound { op, value });

		if bounds.len() == 2 {
			break;
		}
	}

	bounds
}

pub fn find_payment(query: &str) -> Option<PaymentMethod> {
	let text = normalize_query(query);

	PAYMENT_CUES.iter().find(|(pattern, _)| pattern.is_match(&text)).map(|(_, method)| *method)
}

pub fn find_feature(query: &str) -> Option<Feature> {
	let text = normalize_query(query);

	FEATURE_CUES.iter().find(|(pattern, _)| pattern.is_match(&text)).map(|(_, feature)| *feature)
}

/// Average, then count, then sum.
pub fn find_aggregation(query: &str) -> Option<AggregationOp> {
	let text = normalize_query(query);

	AGGREGATION_CUES.iter().find(|(pattern, _)| pattern.is_match(&text)).map(|(_, op)| *op)
}

/// Line-item language without an explicit receipt-level noun.
pub fn mentions_items(query: &str) -> bool {
	let text = normalize_query(query);

	ITEM_CUE.is_match(&text) && !RECEIPT_CUE.is_match(&text)
}

fn compile(pattern: &str) -> Regex {
	Regex::new(pattern).expect("Lexicon regex must compile.")
}

fn amount(caps: &Captures<'_>, idx: usize) -> Option<rust_decimal::Decimal> {
	parse_amount(caps.get(idx)?.as_str())
}

/// Lowercased words joined by single spaces and padded, so phrases match on word boundaries.
fn padded_words(query: &str) -> String {
	let cleaned: String = normalize_query(query)
		.chars()
		.map(|ch| if ch.is_alphanumeric() || ch == '-' || ch == '\'' { ch } else { ' ' })
		.collect();

	format!(" {} ", cleaned.split_whitespace().collect::<Vec<_>>().join(" "))
}

fn has_phrase(padded: &str, phrase: &str) -> bool {
	padded.contains(&format!(" {phrase} "))
}
