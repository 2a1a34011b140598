use std::{future::Future, pin::Pin};

use tally_domain::{ChunkFilter, ScoredChunk};

use crate::Result;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Read side of the multi-view chunk index.
pub trait ChunkIndex
where
	Self: Send + Sync,
{
	/// Top `limit` chunks by cosine similarity among those `filter` admits, best first.
	fn search<'a>(
		&'a self,
		vector: &'a [f32],
		filter: &'a ChunkFilter,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<ScoredChunk>>>;

	/// Distinct string values of a top-level payload field across the whole index, sorted.
	fn list_distinct<'a>(&'a self, field: &'a str) -> BoxFuture<'a, Result<Vec<String>>>;
}
