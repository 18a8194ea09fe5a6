//! Error type shared by every crate in the workspace.

use axum::{Json, http::StatusCode, response::IntoResponse};

pub type ClResult<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
	// Core errors
	NotFound,
	PermissionDenied,
	Unauthorized,
	DbError,
	Parse,
	Timeout,
	PayloadTooLarge,

	// Input and configuration
	ValidationError(String),
	ConfigError(String),

	// Service state
	ServiceUnavailable(String),
	Internal(String),

	// externals
	Io(std::io::Error),
}

impl From<std::io::Error> for Error {
	fn from(err: std::io::Error) -> Self {
		Self::Io(err)
	}
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		tracing::debug!("JSON error: {}", err);
		Self::Parse
	}
}

impl From<std::num::ParseIntError> for Error {
	fn from(_err: std::num::ParseIntError) -> Self {
		Self::Parse
	}
}

impl std::fmt::Display for Error {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Error::NotFound => write!(f, "not found"),
			Error::PermissionDenied => write!(f, "permission denied"),
			Error::Unauthorized => write!(f, "unauthorized"),
			Error::DbError => write!(f, "database error"),
			Error::Parse => write!(f, "parse error"),
			Error::Timeout => write!(f, "timeout"),
			Error::PayloadTooLarge => write!(f, "payload too large"),
			Error::ValidationError(msg) => write!(f, "validation error: {}", msg),
			Error::ConfigError(msg) => write!(f, "configuration error: {}", msg),
			Error::ServiceUnavailable(msg) => write!(f, "service unavailable: {}", msg),
			Error::Internal(msg) => write!(f, "internal error: {}", msg),
			Error::Io(err) => write!(f, "io error: {}", err),
		}
	}
}

impl std::error::Error for Error {}

impl Error {
	/// HTTP status and machine-readable code for this error
	pub fn status_code(&self) -> (StatusCode, &'static str) {
		match self {
			Error::NotFound => (StatusCode::NOT_FOUND, "E-NOT-FOUND"),
			Error::PermissionDenied => (StatusCode::FORBIDDEN, "E-PERMISSION-DENIED"),
			Error::Unauthorized => (StatusCode::UNAUTHORIZED, "E-UNAUTHORIZED"),
			Error::ValidationError(_) => (StatusCode::BAD_REQUEST, "E-VALIDATION"),
			Error::Parse => (StatusCode::BAD_REQUEST, "E-PARSE"),
			Error::Timeout => (StatusCode::REQUEST_TIMEOUT, "E-TIMEOUT"),
			Error::PayloadTooLarge => (StatusCode::PAYLOAD_TOO_LARGE, "E-PAYLOAD-TOO-LARGE"),
			Error::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "E-UNAVAILABLE"),
			Error::DbError => (StatusCode::INTERNAL_SERVER_ERROR, "E-DB"),
			Error::ConfigError(_) | Error::Internal(_) | Error::Io(_) => {
				(StatusCode::INTERNAL_SERVER_ERROR, "E-INTERNAL")
			}
		}
	}
}

impl IntoResponse for Error {
	fn into_response(self) -> axum::response::Response {
		let (status, code) = self.status_code();
		// Internal details stay in the log
		let message = match &self {
			Error::ValidationError(msg) | Error::ServiceUnavailable(msg) => msg.clone(),
			_ if status.is_server_error() => {
				tracing::warn!("Request failed: {}", self);
				"Internal server error".to_string()
			}
			_ => self.to_string(),
		};
		let body = serde_json::json!({
			"error": {
				"code": code,
				"message": message,
			}
		});
		(status, Json(body)).into_response()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_status_mapping() {
		assert_eq!(Error::NotFound.status_code().0, StatusCode::NOT_FOUND);
		assert_eq!(
			Error::ValidationError("bad".into()).status_code().0,
			StatusCode::BAD_REQUEST
		);
		assert_eq!(
			Error::ServiceUnavailable("busy".into()).status_code().0,
			StatusCode::SERVICE_UNAVAILABLE
		);
		assert_eq!(Error::DbError.status_code().0, StatusCode::INTERNAL_SERVER_ERROR);
		assert_eq!(Error::Timeout.status_code().0, StatusCode::REQUEST_TIMEOUT);
		assert_eq!(Error::PayloadTooLarge.status_code().0, StatusCode::PAYLOAD_TOO_LARGE);
	}

	#[test]
	fn test_display() {
		assert_eq!(Error::ValidationError("x".into()).to_string(), "validation error: x");
		assert_eq!(Error::Unauthorized.to_string(), "unauthorized");
	}
}

// vim: ts=4
