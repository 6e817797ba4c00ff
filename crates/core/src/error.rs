use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the client core.
///
/// Every failure propagates to the immediate caller; nothing retries and
/// nothing is swallowed except local sign-out.
#[derive(Debug, Error)]
pub enum Error {
    /// Credential or verification failure reported by the identity provider.
    #[error("authentication failed: {0}")]
    Auth(String),
    /// No valid local credential (absent, expired, or unparsable).
    #[error("no active session")]
    NoSession,
    /// Non-2xx response from the expense API.
    #[error("api error ({status}): {message}")]
    Api { status: u16, message: String },
    /// Client-side input rejection, raised before any network call.
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("http error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True for failures that mean the user must (re)authenticate.
    pub fn is_auth(&self) -> bool {
        matches!(self, Error::Auth(_) | Error::NoSession)
    }
}
