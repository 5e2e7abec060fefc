use wejk_domain::contract::ContractViolation;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Classifier returned unknown label {label:?}.")]
	InvalidClassification { label: String },
	#[error("Malformed {contract} output: {message}")]
	MalformedOutput { contract: String, message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("Qdrant error: {message}")]
	Qdrant { message: String },
	#[error("Trace error: {message}")]
	Trace { message: String },
}
impl From<ContractViolation> for Error {
	fn from(err: ContractViolation) -> Self {
		Self::MalformedOutput { contract: err.contract.to_string(), message: err.to_string() }
	}
}

impl From<wejk_providers::Error> for Error {
	fn from(err: wejk_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}

impl From<wejk_storage::Error> for Error {
	fn from(err: wejk_storage::Error) -> Self {
		match err {
			wejk_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			wejk_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			wejk_storage::Error::Qdrant(inner) => Self::Qdrant { message: inner.to_string() },
		}
	}
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		Self::InvalidRequest { message: err.to_string() }
	}
}
