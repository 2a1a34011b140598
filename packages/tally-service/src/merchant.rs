use tally_domain::{
	MerchantCorpus, MerchantOutcome, MerchantSource, Notice,
	merchant::{self, indirect_reference},
};
use tally_providers::completion::ChatMessage;

use crate::{
	TallyService,
	collaborator::{self, COMPLETION},
};

const MERCHANT_SYSTEM_PROMPT: &str = "You identify which known store a shopping question refers \
to. Reply with exactly one store name copied from the list, or NONE if no store fits. Do not add \
any other text.";
/// Longest list sent to the collaborator.
const MAX_PROMPT_MERCHANTS: usize = 200;

impl TallyService {
	/// Literal tiers against the current corpus, then the generative tier for mentions they could
	/// not place.
	pub async fn resolve_merchant(
		&self,
		query: &str,
		corpus: &MerchantCorpus,
	) -> (MerchantOutcome, Vec<Notice>) {
		let literal = merchant::resolve_literal(query, corpus, self.cfg.resolver.merchant_threshold);
		let mention = match &literal {
			MerchantOutcome::Resolved { display: merchant_display, source, similarity, .. } => {
				tracing::debug!(merchant = %merchant_display, ?source, similarity, "Merchant resolved.");

				return (literal, Vec::new());
			},
			MerchantOutcome::Unresolved { mention } => mention.clone(),
			MerchantOutcome::NotMentioned => match indirect_reference(query) {
				Some(mention) => mention,
				None => return (literal, Vec::new()),
			},
		};

		if !self.cfg.resolver.llm_fallback || corpus.is_empty() {
			return (MerchantOutcome::Unresolved { mention }, Vec::new());
		}

		self.merchant_fallback(query, mention, corpus).await
	}

	async fn merchant_fallback(
		&self,
		query: &str,
		mention: String,
		corpus: &MerchantCorpus,
	) -> (MerchantOutcome, Vec<Notice>) {
		let llm_cfg = &self.cfg.providers.llm;
		let names: Vec<&str> = corpus
			.entries()
			.iter()
			.take(MAX_PROMPT_MERCHANTS)
			.map(|entry| entry.display.as_str())
			.collect();
		let messages = [
			ChatMessage::system(MERCHANT_SYSTEM_PROMPT),
			ChatMessage::user(format!("Known stores:\n{}\n\nQuestion: {query}", names.join("\n"))),
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
					stage: "merchant".to_string(),
				};

				return (MerchantOutcome::Unresolved { mention }, vec![notice]);
			},
			Err(collaborator::Failure::Failed(_)) =>
				return (MerchantOutcome::Unresolved { mention }, Vec::new()),
		};
		let suggestion = reply.trim().trim_matches(|ch: char| ch == '"' || ch == '.' || ch == '`');

		if suggestion.is_empty() || suggestion.eq_ignore_ascii_case("none") {
			return (MerchantOutcome::Unresolved { mention }, Vec::new());
		}

		// A suggestion only counts once it passes the same corpus match as a typed name.
		let confirmed = corpus
			.exact(suggestion)
			.or_else(|| corpus.best_match(suggestion, self.cfg.resolver.merchant_threshold));

		match confirmed {
			Some(found) => {
				tracing::debug!(merchant = %found.display, mention = %mention, "Merchant fallback confirmed.");

				(MerchantOutcome::resolved(found, MerchantSource::Generative), Vec::new())
			},
			None => {
				tracing::debug!(suggestion, "Merchant fallback suggestion is not in the corpus.");

				(MerchantOutcome::Unresolved { mention }, Vec::new())
			},
		}
	}
}
