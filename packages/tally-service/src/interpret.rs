use tally_domain::{Notice, QueryParameters, QuerySignals};

use crate::TallyService;

/// Interpreted query plus whatever degraded while resolving it.
#[derive(Clone, Debug)]
pub struct Interpretation {
	pub parameters: QueryParameters,
	pub notices: Vec<Notice>,
}

impl TallyService {
	/// Never fails. Anything the rules and fallbacks cannot place is left out of the filter.
	pub async fn interpret(&self, query: &str) -> Interpretation {
		let query = query.trim();

		if query.is_empty() {
			return Interpretation { parameters: QueryParameters::semantic(query), notices: Vec::new() };
		}

		let today = self.today();
		let corpus = self.corpus();
		let ((temporal, mut notices), (merchant, merchant_notices)) = tokio::join!(
			self.resolve_temporal(query, today),
			self.resolve_merchant(query, &corpus)
		);

		notices.extend(merchant_notices);

		let parameters =
			QueryParameters::assemble(query, temporal, merchant, QuerySignals::extract(query));

		tracing::debug!(
			intent = parameters.intent.as_str(),
			basis = ?parameters.basis,
			aggregation = ?parameters.aggregation,
			"Query interpreted."
		);

		Interpretation { parameters, notices }
	}
}
