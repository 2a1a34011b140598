mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Answer, Audit, Config, EmbeddingProviderConfig, LlmProviderConfig, Providers, Qdrant,
	Resolver, Retrieval, Retry, Service, Storage,
};

use std::{fs, path::Path};

use time::{Date, macros::format_description};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

/// Parses a `YYYY-MM-DD` reference date.
pub fn parse_reference_date(raw: &str) -> Option<Date> {
	Date::parse(raw.trim(), format_description!("[year]-[month]-[day]")).ok()
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}
	if cfg.storage.qdrant.collection.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.qdrant.collection must be non-empty.".to_string(),
		});
	}
	if cfg.storage.qdrant.vector_dim == 0 {
		return Err(Error::Validation {
			message: "storage.qdrant.vector_dim must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.storage.qdrant.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.qdrant.vector_dim."
				.to_string(),
		});
	}

	for (label, key) in
		[("embedding", &cfg.providers.embedding.api_key), ("llm", &cfg.providers.llm.api_key)]
	{
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}

	if !cfg.providers.llm.temperature.is_finite() {
		return Err(Error::Validation {
			message: "providers.llm.temperature must be a finite number.".to_string(),
		});
	}
	if cfg.providers.retry.max_attempts == 0 {
		return Err(Error::Validation {
			message: "providers.retry.max_attempts must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.retry.base_backoff_ms > cfg.providers.retry.max_backoff_ms {
		return Err(Error::Validation {
			message:
				"providers.retry.base_backoff_ms must be less than or equal to providers.retry.max_backoff_ms."
					.to_string(),
		});
	}
	if !cfg.resolver.merchant_threshold.is_finite() {
		return Err(Error::Validation {
			message: "resolver.merchant_threshold must be a finite number.".to_string(),
		});
	}
	if cfg.resolver.merchant_threshold <= 0.0 || cfg.resolver.merchant_threshold > 1.0 {
		return Err(Error::Validation {
			message: "resolver.merchant_threshold must be in the range (0.0, 1.0].".to_string(),
		});
	}

	if let Some(raw) = cfg.resolver.reference_date.as_deref()
		&& parse_reference_date(raw).is_none()
	{
		return Err(Error::Validation {
			message: "resolver.reference_date must be a YYYY-MM-DD date.".to_string(),
		});
	}

	if cfg.retrieval.top_k == 0 {
		return Err(Error::Validation {
			message: "retrieval.top_k must be greater than zero.".to_string(),
		});
	}
	if cfg.retrieval.aggregation_top_k < cfg.retrieval.top_k {
		return Err(Error::Validation {
			message: "retrieval.aggregation_top_k must be at least retrieval.top_k.".to_string(),
		});
	}
	if cfg.audit.total_tolerance.is_sign_negative() {
		return Err(Error::Validation {
			message: "audit.total_tolerance must be zero or greater.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.resolver.reference_date.as_deref().map(|raw| raw.trim().is_empty()).unwrap_or(false) {
		cfg.resolver.reference_date = None;
	}
}
