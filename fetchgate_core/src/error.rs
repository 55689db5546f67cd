use thiserror::Error;

/// Every failure a request handler can surface.
///
/// The display form is for server-side logs only. Clients always receive
/// the fixed text from [`GatewayError::user_text`] so internal detail never
/// leaks over the wire.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("message is not structured data: {0}")]
    MalformedMessage(#[from] serde_json::Error),

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("unsupported request kind `{0}`")]
    UnsupportedRequest(String),

    #[error("remote host timed out: {0}")]
    NetworkTimeout(String),

    #[error("repository unavailable: {0}")]
    RepositoryUnavailable(String),

    #[error("file not found: {0}")]
    LocalFileNotFound(String),

    #[error("archive failure: {0}")]
    Archive(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// The user-facing text sent with an `error` event.
    ///
    /// One fixed string per condition. `UnsupportedRequest` shares the
    /// missing-field text (a single bad-request bucket on the wire) and
    /// archive failures are reported as plain internal errors.
    pub fn user_text(&self) -> &'static str {
        match self {
            GatewayError::MalformedMessage(_) => "not valid request format",
            GatewayError::MissingField(_) | GatewayError::UnsupportedRequest(_) => {
                "malformed request"
            }
            GatewayError::NetworkTimeout(_) => "remote host unresponsive, retry",
            GatewayError::RepositoryUnavailable(_) => "repository unavailable",
            GatewayError::LocalFileNotFound(_) => "file not found, check link",
            GatewayError::Archive(_) | GatewayError::Internal(_) => "unknown internal error",
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return GatewayError::NetworkTimeout(err.to_string());
        }
        match err.status() {
            Some(reqwest::StatusCode::NOT_FOUND) | Some(reqwest::StatusCode::GONE) => {
                GatewayError::LocalFileNotFound(err.to_string())
            }
            _ => GatewayError::Internal(err.to_string()),
        }
    }
}
