// src/api/error.rs

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid host URL: {0}")]
    InvalidHost(#[from] url::ParseError),

    #[error("Failed to encode request body: {0}")]
    Encode(serde_json::Error),

    #[error("Failed to decode {operation} response: {source}")]
    Decode {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Session response carried no token{}", .message.as_deref().map(|m| format!(": {}", m)).unwrap_or_default())]
    MissingToken { message: Option<String> },
}

impl ApiError {
    /// Decode failures mean the server answered with something other than
    /// the expected shape, as opposed to the request never completing.
    pub fn is_decode(&self) -> bool {
        matches!(self, ApiError::Decode { .. } | ApiError::MissingToken { .. })
    }
}
