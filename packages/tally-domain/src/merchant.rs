//! Merchant identity resolution against a snapshot of the names present in the index.

use std::{collections::BTreeMap, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
	lexicon,
	normalize::{normalize_merchant, normalize_query},
};

/// Similarity granted when one name is a whole-word part of the other.
const CONTAINMENT_SIMILARITY: f32 = 0.9;
const MIN_CONTAINMENT_CHARS: usize = 3;
const MAX_SPAN_WORDS: usize = 4;
const MAX_NGRAM_WORDS: usize = 3;
/// Words that end a prepositional merchant span.
const SPAN_STOP_WORDS: &[&str] = &[
	"on", "in", "at", "from", "to", "during", "last", "this", "since", "between", "for", "before",
	"after", "and", "with", "over", "under", "above", "below", "more", "less", "that", "which",
	"when", "where", "using", "by", "of", "or", "than", "ago", "paid", "via", "was",
	"were", "is", "are", "did", "do", "i",
];
/// Candidates that are never merchants even when they follow a preposition.
const GUARD_WORDS: &[&str] = &[
	"january", "jan", "february", "feb", "march", "mar", "april", "apr", "may", "june", "jun",
	"july", "jul", "august", "aug", "september", "sept", "sep", "october", "oct", "november",
	"nov", "december", "dec", "last", "this", "next", "past", "previous", "today", "yesterday",
	"tonight", "week", "weekend", "month", "year", "quarter", "q1", "q2", "q3", "q4", "day",
	"days", "weeks", "months", "years", "morning", "evening", "night", "monday", "tuesday",
	"wednesday", "thursday", "friday", "saturday", "sunday", "christmas", "thanksgiving",
	"halloween", "least", "most", "all", "total", "a", "an", "the", "my", "any", "each", "every",
	"store", "stores", "shops", "places", "restaurants", "once", "times", "receipts", "receipt",
	"purchases", "purchase", "items", "item", "cash", "credit", "debit", "card", "it", "them",
	"there", "here", "recently", "lately", "spend", "spent", "buy", "bought", "much", "many",
];
/// Query words that never start or end a merchant n-gram.
const QUERY_WORDS: &[&str] = &[
	"how", "much", "many", "what", "which", "when", "where", "who", "did", "do", "does", "i",
	"me", "my", "we", "our", "you", "spend", "spent", "spending", "buy", "bought", "purchase",
	"purchases", "purchased", "show", "list", "find", "get", "give", "tell", "all", "any",
	"receipts", "receipt", "items", "item", "total", "sum", "average", "count", "times", "the",
	"a", "an", "on", "at", "from", "in", "to", "for", "of", "and", "or", "with", "was", "were",
	"is", "are", "have", "has", "had", "there", "money", "pay", "paid", "cost", "costs", "go",
	"went", "visit", "visited", "shop", "shopping", "trips", "trip", "orders", "order", "get",
	"got",
];

static PREPOSITION: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"\b(?:at|from|in|to)\s+").expect("Preposition regex must compile.")
});
static INDIRECT_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(
		r"\b(?:that|the)\s+(?:\w+\s+){0,2}(?:place|spot|store|shop|joint)\b|\bwhere\s+i\s+(?:bought|got|buy|get)\b",
	)
	.expect("Indirect reference regex must compile.")
});

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct MerchantEntry {
	/// Name as it appears in the index.
	pub display: String,
	pub normalized: String,
}

/// Immutable lookup table built from the distinct merchant names present in the index.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MerchantCorpus {
	version: u64,
	fingerprint: String,
	entries: Vec<MerchantEntry>,
}
impl MerchantCorpus {
	/// Builds a snapshot. Names that normalize to the same key collapse into the shortest
	/// display form, so "Walmart" wins over "Walmart Supercenter".
	pub fn build<I, S>(version: u64, names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let mut by_key: BTreeMap<String, String> = BTreeMap::new();

		for name in names {
			let display = name.as_ref().trim();
			let normalized = normalize_merchant(display);

			if normalized.is_empty() {
				continue;
			}

			let slot = by_key.entry(normalized).or_insert_with(|| display.to_string());

			if (display.len(), display) < (slot.len(), slot.as_str()) {
				*slot = display.to_string();
			}
		}

		let mut hasher = blake3::Hasher::new();

		for key in by_key.keys() {
			hasher.update(key.as_bytes());
			hasher.update(b"\n");
		}

		let entries = by_key
			.into_iter()
			.map(|(normalized, display)| MerchantEntry { display, normalized })
			.collect();

		Self { version, fingerprint: hasher.finalize().to_hex().to_string(), entries }
	}

	pub fn version(&self) -> u64 {
		self.version
	}

	/// blake3 over the sorted normalized keys. Equal fingerprints mean equal corpora.
	pub fn fingerprint(&self) -> &str {
		&self.fingerprint
	}

	pub fn entries(&self) -> &[MerchantEntry] {
		&self.entries
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn exact(&self, mention: &str) -> Option<MerchantMatch> {
		let key = normalize_merchant(mention);

		self.entries.iter().find(|entry| entry.normalized == key).map(|entry| MerchantMatch {
			display: entry.display.clone(),
			normalized: entry.normalized.clone(),
			similarity: 1.0,
		})
	}

	/// Best corpus entry at or above `threshold`. Ties prefer the shorter display name, then
	/// the lexicographically smaller one, so repeated calls always agree.
	pub fn best_match(&self, mention: &str, threshold: f32) -> Option<MerchantMatch> {
		self.best_by(mention, threshold, similarity)
	}

	/// Like [`MerchantCorpus::best_match`] for a word window lifted from free query text. A
	/// single word is scored by edit distance alone, so "whole" in "whole milk" never stands
	/// for "Whole Foods".
	pub fn best_window_match(&self, window: &str, threshold: f32) -> Option<MerchantMatch> {
		if window.split_whitespace().nth(1).is_some() {
			self.best_by(window, threshold, similarity)
		} else {
			self.best_by(window, threshold, edit_similarity)
		}
	}

	fn best_by(
		&self,
		mention: &str,
		threshold: f32,
		score_of: fn(&str, &str) -> f32,
	) -> Option<MerchantMatch> {
		let key = normalize_merchant(mention);

		if key.is_empty() {
			return None;
		}

		let mut best: Option<(f32, &MerchantEntry)> = None;

		for entry in &self.entries {
			let score = score_of(&key, &entry.normalized);
			let better = match best {
				None => true,
				Some((best_score, best_entry)) =>
					score > best_score
						|| (score == best_score
							&& (entry.display.len(), &entry.display)
								< (best_entry.display.len(), &best_entry.display)),
			};

			if better {
				best = Some((score, entry));
			}
		}

		let (score, entry) = best?;

		(score >= threshold).then(|| MerchantMatch {
			display: entry.display.clone(),
			normalized: entry.normalized.clone(),
			similarity: score,
		})
	}
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct MerchantMatch {
	pub display: String,
	pub normalized: String,
	pub similarity: f32,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MerchantSource {
	/// The mention normalized to a corpus key verbatim.
	Exact,
	/// Accepted by edit-distance similarity.
	Fuzzy,
	/// Suggested by the generative collaborator, then confirmed against the corpus.
	Generative,
}

/// Merchant axis of an interpreted query.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MerchantOutcome {
	NotMentioned,
	Resolved { display: String, normalized: String, source: MerchantSource, similarity: f32 },
	Unresolved { mention: String },
}
impl MerchantOutcome {
	pub fn resolved(found: MerchantMatch, source: MerchantSource) -> Self {
		Self::Resolved {
			display: found.display,
			normalized: found.normalized,
			source,
			similarity: found.similarity,
		}
	}

	pub fn normalized(&self) -> Option<&str> {
		match self {
			Self::Resolved { normalized, .. } => Some(normalized),
			_ => None,
		}
	}

	pub fn display(&self) -> Option<&str> {
		match self {
			Self::Resolved { display, .. } => Some(display),
			_ => None,
		}
	}

	pub fn is_mentioned(&self) -> bool {
		!matches!(self, Self::NotMentioned)
	}

	pub fn is_unresolved(&self) -> bool {
		matches!(self, Self::Unresolved { .. })
	}

	pub fn is_generative(&self) -> bool {
		matches!(self, Self::Resolved { source: MerchantSource::Generative, .. })
	}
}

/// Tiers one and two: prepositional spans first, then free-standing n-grams of the query.
///
/// A span that survives the guardrail but matches nothing, with no n-gram matching either,
/// yields `Unresolved`; a query with no span and no matching n-gram yields `NotMentioned`.
pub fn resolve_literal(query: &str, corpus: &MerchantCorpus, threshold: f32) -> MerchantOutcome {
	let spans = prepositional_spans(query);

	for span in &spans {
		if let Some(found) = corpus.exact(span) {
			return MerchantOutcome::resolved(found, MerchantSource::Exact);
		}
	}
	for span in &spans {
		if let Some(found) = corpus.best_match(span, threshold) {
			return MerchantOutcome::resolved(found, MerchantSource::Fuzzy);
		}
	}

	let grams = query_ngrams(query);

	for gram in &grams {
		if let Some(found) = corpus.exact(gram) {
			return MerchantOutcome::resolved(found, MerchantSource::Exact);
		}
	}
	for gram in &grams {
		if let Some(found) = corpus.best_window_match(gram, threshold) {
			return MerchantOutcome::resolved(found, MerchantSource::Fuzzy);
		}
	}

	match spans.into_iter().next() {
		Some(mention) => MerchantOutcome::Unresolved { mention },
		None => MerchantOutcome::NotMentioned,
	}
}

/// A non-literal mention such as "that coffee place" or "where I bought my phone".
pub fn indirect_reference(query: &str) -> Option<String> {
	INDIRECT_REFERENCE.find(&normalize_query(query)).map(|found| found.as_str().to_string())
}

/// Token spans following `at`, `from`, `in` and `to`, cut at the first stop word and filtered
/// through the guardrail.
pub fn prepositional_spans(query: &str) -> Vec<String> {
	let text = normalize_query(query);
	let mut spans = Vec::new();

	for found in PREPOSITION.find_iter(&text) {
		let mut words = Vec::new();

		for raw in text[found.end()..].split_whitespace() {
			let word = raw.trim_matches(|ch: char| !ch.is_alphanumeric() && ch != '\'' && ch != '&');
			let ends_clause = raw.ends_with(['?', '.', '!', ',', ';']);

			if word.is_empty()
				|| SPAN_STOP_WORDS.contains(&word)
				|| raw.starts_with('$')
				|| word.chars().all(|ch| ch.is_ascii_digit())
			{
				break;
			}

			words.push(word);

			if ends_clause || words.len() == MAX_SPAN_WORDS {
				break;
			}
		}

		if words.len() > 1 && words.first() == Some(&"the") {
			words.remove(0);
		}

		let Some(first) = words.first() else {
			continue;
		};

		if GUARD_WORDS.contains(first) || is_guarded_phrase(&words.join(" ")) {
			continue;
		}

		spans.push(words.join(" "));
	}

	spans
}

/// [`edit_similarity`], raised to [`CONTAINMENT_SIMILARITY`] when one name is a whole-word
/// part of the other.
pub fn similarity(left: &str, right: &str) -> f32 {
	let ratio = edit_similarity(left, right);

	if ratio == 0.0 || ratio == 1.0 {
		return ratio;
	}

	let (shorter, longer) = if left.len() <= right.len() { (left, right) } else { (right, left) };
	let contained = shorter.len() >= MIN_CONTAINMENT_CHARS
		&& format!(" {longer} ").contains(&format!(" {shorter} "));

	if contained { ratio.max(CONTAINMENT_SIMILARITY) } else { ratio }
}

/// Levenshtein similarity in `[0, 1]` between two normalized names.
pub fn edit_similarity(left: &str, right: &str) -> f32 {
	if left.is_empty() || right.is_empty() {
		return 0.0;
	}
	if left == right {
		return 1.0;
	}

	let left_chars: Vec<char> = left.chars().collect();
	let right_chars: Vec<char> = right.chars().collect();
	let max_len = left_chars.len().max(right_chars.len());

	1.0 - levenshtein(&left_chars, &right_chars) as f32 / max_len as f32
}

fn levenshtein(left: &[char], right: &[char]) -> usize {
	let mut previous: Vec<usize> = (0..=right.len()).collect();
	let mut current = vec![0; right.len() + 1];

	for (i, left_ch) in left.iter().enumerate() {
		current[0] = i + 1;

		for (j, right_ch) in right.iter().enumerate() {
			let cost = usize::from(left_ch != right_ch);

			current[j + 1] = (previous[j + 1] + 1).min(current[j] + 1).min(previous[j] + cost);
		}

		std::mem::swap(&mut previous, &mut current);
	}

	previous[right.len()]
}

fn is_guarded_phrase(span: &str) -> bool {
	lexicon::category_for_phrase(span).is_some() || lexicon::expansion_for_phrase(span).is_some()
}

/// One to three word windows over the query's content words, longest first.
fn query_ngrams(query: &str) -> Vec<String> {
	let text = normalize_query(query);
	let words: Vec<&str> = text
		.split_whitespace()
		.map(|raw| raw.trim_matches(|ch: char| !ch.is_alphanumeric() && ch != '\'' && ch != '&'))
		.filter(|word| !word.is_empty())
		.collect();
	let mut grams = Vec::new();

	for size in (1..=MAX_NGRAM_WORDS).rev() {
		for window in words.windows(size) {
			let (Some(first), Some(last)) = (window.first(), window.last()) else {
				continue;
			};

			if QUERY_WORDS.contains(first)
				|| QUERY_WORDS.contains(last)
				|| GUARD_WORDS.contains(first)
				|| window.iter().any(|word| word.starts_with('$'))
			{
				continue;
			}

			let gram = window.join(" ");

			if !is_guarded_phrase(&gram) {
				grams.push(gram);
			}
		}
	}

	grams
}
