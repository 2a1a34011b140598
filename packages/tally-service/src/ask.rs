use std::time::{Duration, Instant};

use serde::Serialize;

use tally_domain::{
	AuditedValue, ClauseKind, Intent, ItemHit, MerchantOutcome, Notice, QueryParameters,
	ReceiptHit, audit, confidence,
};

use crate::{Error, Result, TallyService, interpret::Interpretation};

/// Everything returned for one question.
#[derive(Clone, Debug, Serialize)]
pub struct Answer {
	pub answer_text: String,
	/// Present whenever the question asks for a sum, count or average and something matched.
	pub audited_value: Option<AuditedValue>,
	pub unique_receipts: Vec<ReceiptHit>,
	pub unique_items: Vec<ItemHit>,
	pub confidence: f32,
	pub intent: Intent,
	pub processing_time_ms: u64,
	pub parameters: QueryParameters,
	pub notices: Vec<Notice>,
	pub widened: Option<ClauseKind>,
}

impl TallyService {
	/// Interpret, retrieve, audit and narrate one question.
	///
	/// Only an empty question, a failed query embedding or a failed index call is an error.
	/// Every other degradation is reported through [`Answer::notices`].
	pub async fn ask(&self, question: &str) -> Result<Answer> {
		let started = Instant::now();
		let question = question.trim();

		if question.is_empty() {
			return Err(Error::InvalidRequest { message: "Question must be non-empty.".to_string() });
		}

		let Interpretation { parameters, mut notices } = self.interpret(question).await;

		if parameters.temporal.is_unresolved() {
			notices.push(Notice::UnresolvedTemporal);
		}
		if let MerchantOutcome::Unresolved { mention } = &parameters.merchant {
			notices.push(Notice::UnresolvedMerchant { mention: mention.clone() });
		}

		let retrieval = self.retrieve(&parameters).await?;
		let results = retrieval.results;

		if let Some(dropped) = retrieval.widened {
			notices.push(Notice::Widened { dropped });
		}

		for violation in results.integrity_violations(self.cfg.audit.total_tolerance) {
			tracing::warn!(
				receipt_id = %violation.receipt_id,
				expected = %violation.expected,
				actual = %violation.actual,
				"Receipt totals do not reconcile."
			);

			notices.push(Notice::InvariantViolation(violation));
		}

		if results.is_empty() {
			notices.push(Notice::NoMatch);
		}

		let audited_value = if results.is_empty() {
			None
		} else {
			parameters.aggregation.and_then(|op| audit(op, parameters.basis, &results))
		};
		let (answer_text, narration_notices) =
			self.narrate(&parameters, &results, audited_value.as_ref()).await;

		notices.extend(narration_notices);

		let confidence = confidence(&parameters, retrieval.widened.is_some(), results.is_empty());
		let processing_time_ms = elapsed_ms(started.elapsed());

		tracing::info!(
			intent = parameters.intent.as_str(),
			receipts = results.receipts.len(),
			items = results.items.len(),
			widened = retrieval.widened.is_some(),
			confidence,
			elapsed_ms = processing_time_ms,
			"Question answered."
		);

		Ok(Answer {
			answer_text,
			audited_value,
			unique_receipts: results.receipts,
			unique_items: results.items,
			confidence,
			intent: parameters.intent,
			processing_time_ms,
			parameters,
			notices,
			widened: retrieval.widened,
		})
	}
}

/// Whole milliseconds, saturating at `u64::MAX`.
fn elapsed_ms(elapsed: Duration) -> u64 {
	u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn elapsed_time_saturates_instead_of_wrapping() {
		assert_eq!(elapsed_ms(Duration::from_micros(1_500_900)), 1_500);
		assert_eq!(elapsed_ms(Duration::MAX), u64::MAX);
	}
}
