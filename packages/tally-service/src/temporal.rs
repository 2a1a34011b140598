use time::Date;

use tally_domain::{
	Notice, RuleResolution, TemporalOutcome, TemporalStrategy,
	temporal::{self, FallbackReply},
};
use tally_providers::completion::ChatMessage;

use crate::{
	TallyService,
	collaborator::{self, COMPLETION},
};

const FALLBACK_SYSTEM_PROMPT: &str = "You convert date expressions into calendar ranges. \
Reply with one JSON object {\"start\": \"YYYY-MM-DD\", \"end\": \"YYYY-MM-DD\"} with both days \
inclusive, or the word null when the text names no date. Do not add any other text.";

impl TallyService {
	/// Rule chain first; the generative collaborator only sees expressions the rules deferred.
	pub async fn resolve_temporal(&self, query: &str, today: Date) -> (TemporalOutcome, Vec<Notice>) {
		match temporal::resolve(query, today) {
			RuleResolution::NotMentioned => (TemporalOutcome::NotMentioned, Vec::new()),
			RuleResolution::Resolved { range, strategy } => {
				tracing::debug!(?strategy, start = %range.start, end = %range.end, "Temporal rule hit.");

				(TemporalOutcome::Resolved { range, strategy }, Vec::new())
			},
			RuleResolution::Invalid => (TemporalOutcome::Unresolved, Vec::new()),
			RuleResolution::Deferred if !self.cfg.resolver.llm_fallback =>
				(TemporalOutcome::Unresolved, Vec::new()),
			RuleResolution::Deferred => self.temporal_fallback(query, today).await,
		}
	}

	async fn temporal_fallback(&self, query: &str, today: Date) -> (TemporalOutcome, Vec<Notice>) {
		let llm_cfg = &self.cfg.providers.llm;
		let messages = [
			ChatMessage::system(FALLBACK_SYSTEM_PROMPT),
			ChatMessage::user(format!("Today is {today}.\nExpression: {query}")),
		];
		let reply = collaborator::call(COMPLETION, llm_cfg.timeout_ms, &self.cfg.providers.retry, || {
			self.providers.completion.complete(llm_cfg, &messages)
		})
		.await;
		let reply = match reply {
			Ok(reply) => reply,
			Err(collaborator::Failure::TimedOut) => {
				let notice = Notice::CollaboratorTimeout {
					collaborator: COMPLETION.to_string(),
					stage: "temporal".to_string(),
				};

				return (TemporalOutcome::Unresolved, vec![notice]);
			},
			Err(collaborator::Failure::Failed(_)) => return (TemporalOutcome::Unresolved, Vec::new()),
		};

		match temporal::parse_fallback_reply(&reply) {
			FallbackReply::Range(range) => {
				tracing::debug!(start = %range.start, end = %range.end, "Temporal fallback accepted.");

				(TemporalOutcome::Resolved { range, strategy: TemporalStrategy::Fallback }, Vec::new())
			},
			FallbackReply::NoDate => (TemporalOutcome::NotMentioned, Vec::new()),
			FallbackReply::Rejected => {
				tracing::debug!(reply = %reply, "Temporal fallback reply rejected.");

				(TemporalOutcome::Unresolved, Vec::new())
			},
		}
	}
}
