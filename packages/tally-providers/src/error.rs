pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Reqwest(#[from] reqwest::Error),
	#[error(transparent)]
	SerdeJson(#[from] serde_json::Error),
	#[error(transparent)]
	InvalidHeaderName(#[from] reqwest::header::InvalidHeaderName),
	#[error(transparent)]
	InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),
	#[error("{endpoint} returned HTTP {status}: {body}")]
	Status { endpoint: &'static str, status: u16, body: String },
	#[error("{message}")]
	InvalidConfig { message: String },
	#[error("{message}")]
	InvalidResponse { message: String },
}
impl Error {
	/// Whether another attempt could succeed. Rate limits, server errors, transport failures
	/// and malformed replies qualify; configuration and client errors do not.
	pub fn is_transient(&self) -> bool {
		match self {
			Self::Reqwest(err) => err.is_timeout() || err.is_connect() || err.is_request(),
			Self::Status { status, .. } => *status == 429 || *status >= 500,
			Self::SerdeJson(_) | Self::InvalidResponse { .. } => true,
			Self::InvalidHeaderName(_) | Self::InvalidHeaderValue(_) | Self::InvalidConfig { .. } =>
				false,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn only_rate_limits_and_server_errors_are_transient() {
		let status = |status| Error::Status { endpoint: "completion", status, body: String::new() };

		assert!(status(429).is_transient());
		assert!(status(503).is_transient());
		assert!(!status(401).is_transient());
		assert!(!Error::InvalidConfig { message: "bad header".to_string() }.is_transient());
		assert!(Error::InvalidResponse { message: "empty".to_string() }.is_transient());
	}

	#[test]
	fn status_errors_name_the_endpoint() {
		let err = Error::Status { endpoint: "embedding", status: 400, body: "bad model".to_string() };

		assert_eq!(err.to_string(), "embedding returned HTTP 400: bad model");
	}
}
