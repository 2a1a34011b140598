pub mod answer;
pub mod ask;
pub mod corpus;
pub mod interpret;
pub mod merchant;
pub mod retrieve;
pub mod temporal;

mod collaborator;
mod error;

pub use ask::Answer;
pub use error::{Error, Result};
pub use interpret::Interpretation;
pub use retrieve::Retrieval;
pub use tally_storage::BoxFuture;

use std::sync::{Arc, RwLock};

use moka::sync::Cache;
use time::{Date, OffsetDateTime};

use tally_config::{Config, EmbeddingProviderConfig, LlmProviderConfig};
use tally_domain::MerchantCorpus;
use tally_providers::{
	completion::{self, ChatMessage},
	embedding,
};
use tally_storage::ChunkIndex;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, tally_providers::Result<Vec<Vec<f32>>>>;
}

pub trait CompletionProvider
where
	Self: Send + Sync,
{
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [ChatMessage],
	) -> BoxFuture<'a, tally_providers::Result<String>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub completion: Arc<dyn CompletionProvider>,
}
impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		completion: Arc<dyn CompletionProvider>,
	) -> Self {
		Self { embedding, completion }
	}
}

impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { embedding: provider.clone(), completion: provider }
	}
}

/// Answers questions over one receipt index.
///
/// The merchant corpus is the only state that changes after construction. Readers clone the
/// current snapshot; [`TallyService::rebuild_corpus`] swaps in a new one.
pub struct TallyService {
	pub cfg: Config,
	pub index: Arc<dyn ChunkIndex>,
	pub providers: Providers,
	corpus: RwLock<Arc<MerchantCorpus>>,
	rebuild_lock: tokio::sync::Mutex<()>,
	embedding_cache: Cache<String, Arc<Vec<f32>>>,
}
impl TallyService {
	pub fn new(cfg: Config, index: Arc<dyn ChunkIndex>) -> Self {
		Self::with_providers(cfg, index, Providers::default())
	}

	pub fn with_providers(cfg: Config, index: Arc<dyn ChunkIndex>, providers: Providers) -> Self {
		let embedding_cache =
			Cache::builder().max_capacity(cfg.retrieval.embedding_cache_entries).build();

		Self {
			cfg,
			index,
			providers,
			corpus: RwLock::new(Arc::new(MerchantCorpus::build(0, Vec::<String>::new()))),
			rebuild_lock: tokio::sync::Mutex::new(()),
			embedding_cache,
		}
	}

	/// The configured reference date, or the current UTC date.
	pub fn today(&self) -> Date {
		self.cfg
			.resolver
			.reference_date
			.as_deref()
			.and_then(tally_config::parse_reference_date)
			.unwrap_or_else(|| OffsetDateTime::now_utc().date())
	}
}

struct DefaultProviders;

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, tally_providers::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, texts))
	}
}

impl CompletionProvider for DefaultProviders {
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [ChatMessage],
	) -> BoxFuture<'a, tally_providers::Result<String>> {
		Box::pin(completion::complete(cfg, messages))
	}
}
