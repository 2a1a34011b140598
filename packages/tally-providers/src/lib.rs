pub mod completion;
pub mod embedding;

mod error;

pub use error::{Error, Result};

use reqwest::{
	Response,
	header::{AUTHORIZATION, HeaderMap, HeaderName},
};
use serde_json::{Map, Value};

/// Longest response body kept in a [`Error::Status`].
const MAX_ERROR_BODY_CHARS: usize = 512;

pub fn auth_headers(api_key: &str, default_headers: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	headers.insert(AUTHORIZATION, format!("Bearer {api_key}").parse()?);

	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(Error::InvalidConfig {
				message: "Default header values must be strings.".to_string(),
			});
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}

/// The JSON body of a successful response, or [`Error::Status`] carrying a truncated body.
pub(crate) async fn json_body(endpoint: &'static str, res: Response) -> Result<Value> {
	let status = res.status();

	if status.is_success() {
		return Ok(res.json().await?);
	}

	let body: String = res.text().await.unwrap_or_default().chars().take(MAX_ERROR_BODY_CHARS).collect();

	Err(Error::Status { endpoint, status: status.as_u16(), body })
}
