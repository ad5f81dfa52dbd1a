use thiserror::Error;
use crate::state::TemplateServiceError;

#[derive(Debug, Error)]
pub enum EchoError {
	#[error("Invalid format specified.")]
	UnknownFormat,

	#[error("Invalid content type.")]
	NoAcceptableFormat,

	#[error("Callback is not specified.")]
	MissingCallback,

	#[error(transparent)]
	Json(#[from] serde_json::Error),

	#[error(transparent)]
	Yaml(#[from] serde_yaml::Error),

	#[error(transparent)]
	Template(#[from] TemplateServiceError),
}
