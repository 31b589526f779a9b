use thiserror::Error;

pub const NO_DATA_MESSAGE: &str = "No data found for this area. Try selecting a different layer or location.";

/// Why an export failed, split by who is to blame.
#[derive(Debug, Error)]
pub enum ExportError {
	/// The request parameters are invalid.
	#[error("{0}")]
	BadRequest(String),

	/// None of the requested layers has features in the area.
	#[error("{}", NO_DATA_MESSAGE)]
	NoData,

	#[error(transparent)]
	Internal(#[from] anyhow::Error),
}

impl ExportError {
	pub fn bad_request(err: &anyhow::Error) -> ExportError {
		ExportError::BadRequest(format_error_chain(err))
	}

	pub fn status_code(&self) -> u16 {
		match self {
			ExportError::BadRequest(_) => 400,
			ExportError::NoData => 404,
			ExportError::Internal(_) => 500,
		}
	}

	/// Message shown to the client. Internal errors include their whole chain.
	pub fn detail(&self) -> String {
		match self {
			ExportError::Internal(err) => format_error_chain(err),
			other => other.to_string(),
		}
	}
}

/// `"<top>\n  Caused by:\n    <cause>..."`
pub fn format_error_chain(err: &anyhow::Error) -> String {
	let mut result = err.to_string();
	for (i, cause) in err.chain().skip(1).enumerate() {
		if i == 0 {
			result.push_str("\n  Caused by:");
		}
		result.push_str(&format!("\n    {cause}"));
	}
	result
}
