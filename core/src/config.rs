use crate::error::CodaError;

/// Primary credential variable. `CODA_API_KEY` is accepted as a fallback for
/// configurations written against older releases; `API_KEY` wins when both
/// are set.
pub const API_KEY_ENV: &str = "API_KEY";
pub const API_KEY_FALLBACK_ENV: &str = "CODA_API_KEY";

/// Where to get a key when none is configured.
pub const API_KEY_HELP_URL: &str = "https://coda.io/account";

/// Resolve the API credential. `explicit` (a CLI flag or already-read env
/// value) takes precedence over both environment variables.
pub fn resolve_api_key(explicit: Option<String>) -> Result<String, CodaError> {
    explicit
        .filter(|key| !key.is_empty())
        .or_else(|| non_empty_env(API_KEY_ENV))
        .or_else(|| non_empty_env(API_KEY_FALLBACK_ENV))
        .ok_or(CodaError::MissingCredential)
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}
