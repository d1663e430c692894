use thiserror::Error;

/// Failures surfaced by the Coda gateway. Display strings are what tool
/// callers see, so the API variant keeps the upstream status and message
/// verbatim.
#[derive(Debug, Error)]
pub enum CodaError {
    /// Non-2xx response from the Coda API.
    #[error("Coda API Error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The request never produced a response (connect failure, timeout).
    #[error("Failed to reach Coda API at {url}: {message}")]
    Request { url: String, message: String },

    /// A response arrived but its body was not what the endpoint promises.
    #[error("Unexpected Coda API response: {0}")]
    Decode(String),

    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    #[error("API_KEY environment variable is required")]
    MissingCredential,
}

impl CodaError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }
}
