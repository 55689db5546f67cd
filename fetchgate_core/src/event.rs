use serde::{Deserialize, Serialize};

/// Lifecycle phase reported to a client while its request is handled.
///
/// Serialized as the wire value of the `status` field, e.g. `checking_out`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Parsing,
    Checking,
    CheckingOut,
    Downloading,
    Completed,
    Error,
}

/// One message pushed to a client: `{"status": "...", "text": "..."}`.
///
/// Every request produces zero or more of these and terminates in exactly
/// one `Completed` or `Error` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub status: Status,
    pub text: String,
}

impl ProgressEvent {
    pub fn new(status: Status, text: impl Into<String>) -> Self {
        Self {
            status,
            text: text.into(),
        }
    }

    /// An event with an empty text payload (e.g. the initial `parsing`).
    pub fn status_only(status: Status) -> Self {
        Self {
            status,
            text: String::new(),
        }
    }

    /// A progress tick carrying a bare percentage.
    pub fn percent(status: Status, pct: u8) -> Self {
        Self {
            status,
            text: pct.to_string(),
        }
    }
}
