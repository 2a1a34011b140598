use std::sync::Arc;

use tally_domain::MerchantCorpus;
use tally_storage::payload::MERCHANT_NAME;

use crate::{Result, TallyService};

impl TallyService {
	/// Current merchant snapshot. Never blocks on a rebuild in progress.
	pub fn corpus(&self) -> Arc<MerchantCorpus> {
		match self.corpus.read() {
			Ok(slot) => slot.clone(),
			Err(poisoned) => poisoned.into_inner().clone(),
		}
	}

	/// Rebuilds the merchant snapshot from the index and swaps it in whole.
	///
	/// Rebuilds are serialized. Cached query embeddings are dropped with the old snapshot.
	pub async fn rebuild_corpus(&self) -> Result<Arc<MerchantCorpus>> {
		let _guard = self.rebuild_lock.lock().await;
		let names = self.index.list_distinct(MERCHANT_NAME).await?;
		let version = self.corpus().version() + 1;
		let corpus = Arc::new(MerchantCorpus::build(version, names));

		match self.corpus.write() {
			Ok(mut slot) => *slot = corpus.clone(),
			Err(poisoned) => *poisoned.into_inner() = corpus.clone(),
		}

		self.embedding_cache.invalidate_all();

		tracing::info!(
			version,
			merchants = corpus.len(),
			fingerprint = corpus.fingerprint(),
			"Merchant corpus rebuilt."
		);

		Ok(corpus)
	}
}
