use std::sync::Arc;

use tally_domain::{ChunkFilter, ClauseKind, QueryParameters, ResultSet};

use crate::{
	Error, Result, TallyService,
	collaborator::{self, EMBEDDING},
};

/// Deduplicated hits and the filter that produced them.
#[derive(Clone, Debug)]
pub struct Retrieval {
	pub results: ResultSet,
	pub filter: ChunkFilter,
	/// The clause dropped by the single widening step, if one ran.
	pub widened: Option<ClauseKind>,
}

impl TallyService {
	/// Embeds `text` with the configured model. Repeated texts are served from the cache.
	pub async fn embed_query(&self, text: &str) -> Result<Arc<Vec<f32>>> {
		let cfg = &self.cfg.providers.embedding;
		let key = cache_key(&cfg.model, text);

		if let Some(hit) = self.embedding_cache.get(&key) {
			return Ok(hit);
		}

		let texts = vec![text.to_string()];
		let vectors = collaborator::call(EMBEDDING, cfg.timeout_ms, &self.cfg.providers.retry, || {
			self.providers.embedding.embed(cfg, &texts)
		})
		.await
		.map_err(|failure| failure.into_error(EMBEDDING))?;
		let Some(vector) = vectors.into_iter().next() else {
			return Err(Error::Provider {
				message: "Embedding provider returned no vectors.".to_string(),
			});
		};

		if vector.len() != self.cfg.storage.qdrant.vector_dim as usize {
			return Err(Error::Provider {
				message: "Embedding vector dimension mismatch.".to_string(),
			});
		}

		let vector = Arc::new(vector);

		self.embedding_cache.insert(key, vector.clone());

		Ok(vector)
	}

	/// Filtered similarity search. An empty first pass is retried once with the least certain
	/// clause dropped; merchant and date clauses are never dropped.
	pub async fn retrieve(&self, params: &QueryParameters) -> Result<Retrieval> {
		let vector = self.embed_query(&params.query).await?;
		let limit = if params.aggregation.is_some() {
			self.cfg.retrieval.aggregation_top_k
		} else {
			self.cfg.retrieval.top_k
		};
		let filter = ChunkFilter::from_parameters(params);
		let chunks = self.index.search(&vector, &filter, limit).await?;

		if chunks.is_empty()
			&& self.cfg.retrieval.widen_on_empty
			&& let Some((wider, dropped)) = filter.widen()
		{
			tracing::info!(?dropped, "No chunks matched. Widening the filter once.");

			let chunks = self.index.search(&vector, &wider, limit).await?;

			return Ok(Retrieval {
				results: ResultSet::from_chunks(chunks),
				filter: wider,
				widened: Some(dropped),
			});
		}

		Ok(Retrieval { results: ResultSet::from_chunks(chunks), filter, widened: None })
	}
}

fn cache_key(model: &str, text: &str) -> String {
	let mut hasher = blake3::Hasher::new();

	hasher.update(model.as_bytes());
	hasher.update(b"\n");
	hasher.update(text.as_bytes());

	hasher.finalize().to_hex().to_string()
}
