use thiserror::Error;

/// Main error type for strava-sync
#[derive(Error, Debug)]
pub enum StravaError {
    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Data error: {0}")]
    Data(String),

    #[error("Column '{column}' holds a {len}-element value, expected 2")]
    Shape { column: String, len: usize },

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Table error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, StravaError>;

impl StravaError {
    /// Create an authentication error from a message
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a data error from a message
    pub fn data(msg: impl Into<String>) -> Self {
        Self::Data(msg.into())
    }

    /// Create a configuration error from a message
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a database error from anything displayable
    pub fn database(err: impl std::fmt::Display) -> Self {
        Self::Database(err.to_string())
    }

    /// Create a shape error for a composite column
    pub fn shape(column: impl Into<String>, len: usize) -> Self {
        Self::Shape {
            column: column.into(),
            len,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StravaError::Authentication("token exchange failed".to_string());
        assert_eq!(err.to_string(), "Authentication error: token exchange failed");
    }

    #[test]
    fn test_shape_error_display() {
        let err = StravaError::shape("start_latlng", 3);
        assert!(err.to_string().contains("start_latlng"));
        assert!(err.to_string().contains("3-element"));
    }

    #[test]
    fn test_api_error_display() {
        let err = StravaError::Api {
            status: 401,
            message: "Authorization Error".to_string(),
        };
        assert_eq!(err.to_string(), "API error 401: Authorization Error");
    }

    #[test]
    fn test_error_constructors() {
        assert!(matches!(StravaError::auth("x"), StravaError::Authentication(_)));
        assert!(matches!(StravaError::data("x"), StravaError::Data(_)));
        assert!(matches!(StravaError::config("x"), StravaError::Config(_)));
        assert!(matches!(StravaError::database("x"), StravaError::Database(_)));
        assert!(matches!(
            StravaError::shape("end_latlng", 1),
            StravaError::Shape { len: 1, .. }
        ));
    }
}
