use serde::Serialize;

use crate::{
	filter::ClauseKind,
	query::{Intent, QueryParameters},
	receipt::InvariantViolation,
};

const UNRESOLVED_PENALTY: f32 = 0.25;
const GENERATIVE_PENALTY: f32 = 0.1;
const WIDENED_PENALTY: f32 = 0.2;
const SEMANTIC_PENALTY: f32 = 0.3;

/// Degradations reported alongside an answer. None of these abort a query.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
	UnresolvedTemporal,
	UnresolvedMerchant { mention: String },
	/// The filter was relaxed once before retrieval succeeded or gave up.
	Widened { dropped: ClauseKind },
	NoMatch,
	CollaboratorTimeout { collaborator: String, stage: String },
	InvariantViolation(InvariantViolation),
}

/// Score in `[0, 1]` for how much of the query resolved without fallbacks.
pub fn confidence(params: &QueryParameters, widened: bool, empty: bool) -> f32 {
	if empty {
		return 0.0;
	}

	let mut score = 1.0_f32;

	for (unresolved, generative) in [
		(params.temporal.is_unresolved(), params.temporal.is_generative()),
		(params.merchant.is_unresolved(), params.merchant.is_generative()),
	] {
		if unresolved {
			score -= UNRESOLVED_PENALTY;
		}
		if generative {
			score -= GENERATIVE_PENALTY;
		}
	}

	if widened {
		score -= WIDENED_PENALTY;
	}
	if params.intent == Intent::Semantic {
		score -= SEMANTIC_PENALTY;
	}

	score.clamp(0.0, 1.0)
}
