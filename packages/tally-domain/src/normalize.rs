//! Merchant name canonicalization shared by indexing and query resolution.

const CORPORATE_SUFFIXES: &[&str] = &[
	"inc",
	"incorporated",
	"corp",
	"corporation",
	"llc",
	"ltd",
	"co",
	"company",
	"store",
	"stores",
	"shop",
	"market",
	"supercenter",
	"pharmacy",
	"cafe",
	"coffee",
	"restaurant",
];

/// Lowercase, alphanumeric words separated by single spaces, with trailing corporate suffixes
/// removed. Apostrophes are dropped so "Trader Joe's" and "trader joes" agree.
pub fn normalize_merchant(raw: &str) -> String {
	let mut cleaned = String::with_capacity(raw.len());

	for ch in raw.chars() {
		match ch {
			'\'' | '\u{2019}' => {},
			'&' => cleaned.push_str(" and "),
			ch if ch.is_alphanumeric() => cleaned.extend(ch.to_lowercase()),
			_ => cleaned.push(' '),
		}
	}

	let mut words: Vec<&str> = cleaned.split_whitespace().collect();

	while words.len() > 1 && words.last().is_some_and(|word| CORPORATE_SUFFIXES.contains(word)) {
		words.pop();
	}

	words.join(" ")
}

/// Lowercases and collapses whitespace without touching punctuation.
pub fn normalize_query(raw: &str) -> String {
	raw.replace('\u{2019}', "'").to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}
