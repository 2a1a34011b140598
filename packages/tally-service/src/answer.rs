//! Answer narration. The audited figure is the only aggregate a narrative may state.

use std::collections::BTreeSet;

use rust_decimal::Decimal;

use tally_domain::{
	AggregationBasis, AggregationOp, AuditedValue, Notice, QueryParameters, ResultSet,
	money::{dollar_figures, format_currency, round_currency},
};
use tally_providers::completion::ChatMessage;

use crate::{
	TallyService,
	collaborator::{self, COMPLETION},
};

pub const NO_MATCH_ANSWER: &str = "No matching receipts were found for that question.";

const NARRATION_SYSTEM_PROMPT: &str = "You answer questions about the user's own receipts using \
only the records provided. When an audited figure is given, state it exactly as written and do \
not compute or mention any other total. Answer in at most three sentences.";

impl TallyService {
	/// Generated narrative when it agrees with the audit, otherwise a fixed template. An empty
	/// result set never reaches the generator.
	pub async fn narrate(
		&self,
		params: &QueryParameters,
		results: &ResultSet,
		audited: Option<&AuditedValue>,
	) -> (String, Vec<Notice>) {
		if results.is_empty() {
			return (NO_MATCH_ANSWER.to_string(), Vec::new());
		}

		let answer_cfg = &self.cfg.answer;
		let fallback = || template(params, results, audited, answer_cfg.max_context_receipts as usize);

		if !answer_cfg.enabled {
			return (fallback(), Vec::new());
		}

		let llm_cfg = &self.cfg.providers.llm;
		let messages = [
			ChatMessage::system(NARRATION_SYSTEM_PROMPT),
			ChatMessage::user(context(
				params,
				results,
				audited,
				answer_cfg.max_context_receipts as usize,
				answer_cfg.max_context_items as usize,
			)),
		];
		let reply = collaborator::call(COMPLETION, llm_cfg.timeout_ms, &self.cfg.providers.retry, || {
			self.providers.completion.complete(llm_cfg, &messages)
		})
		.await;

		match reply {
			Ok(text) if narrative_agrees(&text, results, audited) => (text.trim().to_string(), Vec::new()),
			Ok(text) => {
				tracing::warn!(narrative = %text, "Narrative disagrees with the audit. Using the template.");

				(fallback(), Vec::new())
			},
			Err(collaborator::Failure::TimedOut) => {
				let notice = Notice::CollaboratorTimeout {
					collaborator: COMPLETION.to_string(),
					stage: "answer".to_string(),
				};

				(fallback(), vec![notice])
			},
			Err(collaborator::Failure::Failed(_)) => (fallback(), Vec::new()),
		}
	}
}

/// A narrative must restate the audited figure and may only quote dollar amounts that appear in
/// the audit or the retrieved records.
pub fn narrative_agrees(text: &str, results: &ResultSet, audited: Option<&AuditedValue>) -> bool {
	if text.trim().is_empty() {
		return false;
	}

	let figures: Vec<Decimal> = dollar_figures(text).into_iter().map(round_currency).collect();

	if let Some(audited) = audited {
		let restated = match audited.op {
			AggregationOp::Count => mentions_number(text, audited.count),
			AggregationOp::Sum | AggregationOp::Average =>
				figures.iter().any(|figure| *figure == audited.value),
		};

		if !restated {
			return false;
		}
	}

	let allowed = quotable_figures(results, audited);

	figures.iter().all(|figure| allowed.contains(figure))
}

/// Deterministic answer built only from the audit and the records.
pub fn template(
	params: &QueryParameters,
	results: &ResultSet,
	audited: Option<&AuditedValue>,
	max_receipts: usize,
) -> String {
	let place = params.merchant.display().map(|name| format!(" at {name}")).unwrap_or_default();
	let lead = match audited {
		Some(audited) => match audited.op {
			AggregationOp::Sum => format!(
				"You spent {}{place} across {}.",
				audited.display(),
				count_phrase(audited.count, audited.basis)
			),
			AggregationOp::Count => format!("Found {}{place}.", count_phrase(audited.count, audited.basis)),
			AggregationOp::Average => format!(
				"The average is {}{place} across {}.",
				audited.display(),
				count_phrase(audited.count, audited.basis)
			),
		},
		None => format!(
			"Found {}{place}.",
			count_phrase(results.receipts.len(), AggregationBasis::Receipts)
		),
	};
	let listed: Vec<String> = results
		.receipts
		.iter()
		.take(max_receipts)
		.map(|hit| {
			format!(
				"{} on {} ({})",
				hit.merchant_name,
				hit.transaction_ts.date(),
				format_currency(hit.totals.total)
			)
		})
		.collect();

	if listed.is_empty() { lead } else { format!("{lead} Receipts: {}.", listed.join("; ")) }
}

fn context(
	params: &QueryParameters,
	results: &ResultSet,
	audited: Option<&AuditedValue>,
	max_receipts: usize,
	max_items: usize,
) -> String {
	let mut out = format!("Question: {}\n", params.query);

	if let Some(audited) = audited {
		out.push_str(&format!(
			"Audited {} over {}: {}\n",
			op_label(audited.op),
			count_phrase(audited.count, audited.basis),
			audited.display()
		));
	}

	out.push_str(&format!("Receipts ({} matched):\n", results.receipts.len()));

	for hit in results.receipts.iter().take(max_receipts) {
		out.push_str(&format!(
			"- {} on {}: total {}, paid by {}\n",
			hit.merchant_name,
			hit.transaction_ts.date(),
			format_currency(hit.totals.total),
			hit.payment_method.as_str()
		));
	}

	if !results.items.is_empty() {
		out.push_str(&format!("Items ({} matched):\n", results.items.len()));

		for item in results.items.iter().take(max_items) {
			out.push_str(&format!(
				"- {} {} at {} on {}\n",
				item.name,
				format_currency(item.price),
				item.merchant_name,
				item.transaction_ts.date()
			));
		}
	}

	out
}

fn quotable_figures(results: &ResultSet, audited: Option<&AuditedValue>) -> BTreeSet<Decimal> {
	let mut allowed = BTreeSet::new();

	if let Some(audited) = audited
		&& audited.op != AggregationOp::Count
	{
		allowed.insert(audited.value);
	}

	for hit in &results.receipts {
		let totals = &hit.totals;

		allowed.extend([totals.total, totals.tax, totals.tip, totals.discount].map(round_currency));

		if let Some(subtotal) = totals.subtotal {
			allowed.insert(round_currency(subtotal));
		}
	}

	allowed.extend(results.items.iter().map(|item| round_currency(item.price)));

	allowed
}

fn mentions_number(text: &str, number: usize) -> bool {
	let wanted = number.to_string();

	text.split(|ch: char| !ch.is_ascii_digit()).any(|token| token == wanted)
}

fn count_phrase(count: usize, basis: AggregationBasis) -> String {
	let noun = match (basis, count) {
		(AggregationBasis::Receipts, 1) => "receipt",
		(AggregationBasis::Receipts, _) => "receipts",
		(AggregationBasis::Items, 1) => "item",
		(AggregationBasis::Items, _) => "items",
	};

	format!("{count} {noun}")
}

fn op_label(op: AggregationOp) -> &'static str {
	match op {
		AggregationOp::Sum => "sum",
		AggregationOp::Count => "count",
		AggregationOp::Average => "average",
	}
}
