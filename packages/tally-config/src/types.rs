use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub resolver: Resolver,
	#[serde(default)]
	pub retrieval: Retrieval,
	#[serde(default)]
	pub audit: Audit,
	#[serde(default)]
	pub answer: Answer,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub qdrant: Qdrant,
}

#[derive(Debug, Deserialize)]
pub struct Qdrant {
	pub url: String,
	pub collection: String,
	pub vector_dim: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub llm: LlmProviderConfig,
	#[serde(default)]
	pub retry: Retry,
}

#[derive(Clone, Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Retry {
	pub max_attempts: u32,
	pub base_backoff_ms: u64,
	pub max_backoff_ms: u64,
}
impl Default for Retry {
	fn default() -> Self {
		Self { max_attempts: 3, base_backoff_ms: 200, max_backoff_ms: 2_000 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Resolver {
	/// Minimum edit-distance similarity (0-1] for a fuzzy merchant match.
	pub merchant_threshold: f32,
	/// Optional. Pins "now" (`YYYY-MM-DD`, UTC) so query suites resolve dates reproducibly.
	pub reference_date: Option<String>,
	/// Consult the generative collaborator when the temporal or merchant rules give up.
	pub llm_fallback: bool,
}
impl Default for Resolver {
	fn default() -> Self {
		Self { merchant_threshold: 0.75, reference_date: None, llm_fallback: true }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Retrieval {
	pub top_k: u32,
	/// Used instead of `top_k` when the query asks for a sum, count or average.
	pub aggregation_top_k: u32,
	pub widen_on_empty: bool,
	pub embedding_cache_entries: u64,
}
impl Default for Retrieval {
	fn default() -> Self {
		Self {
			top_k: 10,
			aggregation_top_k: 200,
			widen_on_empty: true,
			embedding_cache_entries: 1_024,
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Audit {
	pub total_tolerance: Decimal,
}
impl Default for Audit {
	fn default() -> Self {
		Self { total_tolerance: Decimal::ONE }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Answer {
	pub enabled: bool,
	pub max_context_receipts: u32,
	pub max_context_items: u32,
}
impl Default for Answer {
	fn default() -> Self {
		Self { enabled: true, max_context_receipts: 5, max_context_items: 10 }
	}
}
