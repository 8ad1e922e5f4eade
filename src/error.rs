use thiserror::Error;

/// Fallback text shown when a failure carries no server-provided message.
pub const GENERIC_FAILURE: &str = "An unexpected error occurred";

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] ureq::Transport),

    #[error("Server returned an error: {status}")]
    Status { status: u16, message: Option<String> },

    #[error("Failed to decode response body: {0}")]
    Decode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Token store error: {0}")]
    TokenStore(String),

    #[error("not logged in")]
    Unauthenticated,

    #[error("not permitted: {0}")]
    NotPermitted(&'static str),

    #[error("invalid input: {0}")]
    Invalid(&'static str),

    #[error("quiz is incomplete: {answered} of {total} questions answered")]
    Incomplete { answered: usize, total: usize },

    #[error("rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),
}

impl Error {
    /// Text for a transient notification: the server's own message when it sent one.
    pub fn user_message(&self) -> String {
        match self {
            Error::Status {
                message: Some(message),
                ..
            } => message.clone(),
            Error::NotPermitted(reason) => format!("Not permitted: {reason}"),
            Error::Invalid(_) | Error::Incomplete { .. } | Error::InvalidRating(_) => {
                self.to_string()
            }
            _ => GENERIC_FAILURE.to_string(),
        }
    }

    /// Failures that mean the session can no longer be trusted.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Error::Unauthenticated | Error::Status { status: 401, .. }
        )
    }
}

impl From<ureq::Error> for Error {
    fn from(e: ureq::Error) -> Self {
        match e {
            ureq::Error::Status(status, response) => {
                let message = response
                    .into_string()
                    .ok()
                    .and_then(|body| server_message(&body));
                Error::Status { status, message }
            }
            ureq::Error::Transport(t) => Error::Transport(t),
        }
    }
}

/// Pulls `detail` (or `message`) out of an error body, if the body is JSON.
pub(crate) fn server_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["detail", "message"].iter().find_map(|key| {
        value
            .get(*key)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    })
}

pub type Result<T> = std::result::Result<T, Error>;
