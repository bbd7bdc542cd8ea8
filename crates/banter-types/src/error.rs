use thiserror::Error;

/// Errors from the generation gateway and other remote collaborators.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("http error: {0}")]
    Http(String),

    #[error("backend error: {0}")]
    Api(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Errors from the settings store.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("io error: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    Serde(String),
}

/// The shared image quota has no headroom left.
///
/// This is normal control flow, not a fault: callers surface it to chat as a
/// templated "limit reached" line.
#[derive(Debug, Error)]
#[error("image quota exhausted")]
pub struct QuotaExceeded;
