pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Collaborator {collaborator} timed out on every attempt.")]
	CollaboratorTimeout { collaborator: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("Qdrant error: {message}")]
	Qdrant { message: String },
}
impl From<tally_providers::Error> for Error {
	fn from(err: tally_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}

impl From<tally_storage::Error> for Error {
	fn from(err: tally_storage::Error) -> Self {
		match err {
			tally_storage::Error::Qdrant(inner) => Self::Qdrant { message: inner.to_string() },
			tally_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			tally_storage::Error::InvalidPayload(message) => Self::Storage { message },
		}
	}
}
