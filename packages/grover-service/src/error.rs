pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Qdrant error: {message}")]
	Qdrant { message: String },
}
impl From<grover_storage::Error> for Error {
	fn from(err: grover_storage::Error) -> Self {
		match err {
			grover_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			grover_storage::Error::Qdrant(inner) => Self::Qdrant { message: inner.to_string() },
		}
	}
}

impl From<color_eyre::Report> for Error {
	fn from(err: color_eyre::Report) -> Self {
		Self::Provider { message: err.to_string() }
	}
}
