use std::sync::{
	Arc, Mutex,
	atomic::{AtomicUsize, Ordering},
};

use tally_domain::{ChunkFilter, ChunkMeta, Receipt, ScoredChunk, results};
use tally_storage::{BoxFuture, ChunkIndex, Error, Result};

use crate::{chunker::chunk_receipt, embedder};

/// Brute-force cosine index over chunks held in memory. Counts calls and records every filter
/// it was searched with.
pub struct MemoryIndex {
	dim: usize,
	entries: Vec<(Vec<f32>, ChunkMeta)>,
	pub search_calls: Arc<AtomicUsize>,
	pub list_calls: Arc<AtomicUsize>,
	pub filters_seen: Arc<Mutex<Vec<ChunkFilter>>>,
}
impl MemoryIndex {
	pub fn new(dim: usize) -> Self {
		Self {
			dim,
			entries: Vec::new(),
			search_calls: Arc::new(AtomicUsize::new(0)),
			list_calls: Arc::new(AtomicUsize::new(0)),
			filters_seen: Arc::new(Mutex::new(Vec::new())),
		}
	}

	/// Chunks and embeds every receipt with [`embedder::hash_embed`].
	pub fn from_receipts(receipts: &[Receipt], dim: usize) -> Self {
		let mut index = Self::new(dim);

		for receipt in receipts {
			for chunk in chunk_receipt(receipt) {
				index.insert(chunk);
			}
		}

		index
	}

	pub fn insert(&mut self, chunk: ChunkMeta) {
		let vector = embedder::hash_embed(&chunk.content, self.dim);

		self.entries.push((vector, chunk));
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	fn run_search(&self, vector: &[f32], filter: &ChunkFilter, limit: u32) -> Result<Vec<ScoredChunk>> {
		if vector.len() != self.dim {
			return Err(Error::InvalidArgument(format!(
				"Query vector has {} dimensions; index has {}.",
				vector.len(),
				self.dim
			)));
		}

		self.search_calls.fetch_add(1, Ordering::SeqCst);

		if let Ok(mut seen) = self.filters_seen.lock() {
			seen.push(filter.clone());
		}

		let mut hits: Vec<ScoredChunk> = self
			.entries
			.iter()
			.filter(|(_, chunk)| filter.matches(chunk))
			.map(|(stored, chunk)| ScoredChunk {
				score: embedder::cosine(vector, stored),
				chunk: chunk.clone(),
			})
			.collect();

		results::rank(&mut hits);
		hits.truncate(limit as usize);

		Ok(hits)
	}

	fn run_list_distinct(&self, field: &str) -> Result<Vec<String>> {
		self.list_calls.fetch_add(1, Ordering::SeqCst);

		let mut values: Vec<String> = self
			.entries
			.iter()
			.map(|(_, chunk)| match field {
				"merchant_name" => Ok(chunk.merchant_name.clone()),
				"merchant_normalized" => Ok(chunk.merchant_normalized.clone()),
				"payment_method" => Ok(chunk.payment_method.as_str().to_string()),
				other => Err(Error::InvalidArgument(format!("Unsupported field {other}."))),
			})
			.collect::<Result<_>>()?;

		values.sort();
		values.dedup();

		Ok(values)
	}
}

impl ChunkIndex for MemoryIndex {
	fn search<'a>(
		&'a self,
		vector: &'a [f32],
		filter: &'a ChunkFilter,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<ScoredChunk>>> {
		Box::pin(async move { self.run_search(vector, filter, limit) })
	}

	fn list_distinct<'a>(&'a self, field: &'a str) -> BoxFuture<'a, Result<Vec<String>>> {
		Box::pin(async move { self.run_list_distinct(field) })
	}
}
