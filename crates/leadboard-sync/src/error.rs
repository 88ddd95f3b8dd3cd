use leadboard_core::LeadId;
use thiserror::Error;

/// Failures talking to the sheet endpoint.
#[derive(Error, Debug)]
pub enum SyncError {
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The endpoint answered with an `{error, message}` object.
    #[error("sheet reported {error}: {message}")]
    Remote { error: String, message: String },

    #[error("unexpected payload: {0}")]
    Shape(String),

    /// A save was acknowledged with a non-success status.
    #[error("save rejected with status {status:?}{}", detail(.message))]
    Rejected {
        status: String,
        message: Option<String>,
    },

    #[error("invalid URL {0}")]
    InvalidUrl(String),
}

/// Failures surfaced by a [`Dashboard`](crate::Dashboard) session.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("lead {0} not found")]
    UnknownLead(LeadId),

    /// Bulk load failed; the previous collection is untouched.
    #[error("fetch failed: {0}")]
    Fetch(#[source] SyncError),

    /// Persisting a lead failed. `reverted` says whether the local edit
    /// was rolled back.
    #[error("save of lead {id} failed (reverted: {reverted}): {source}")]
    SaveFailed {
        id: LeadId,
        source: SyncError,
        reverted: bool,
    },
}

fn detail(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {m}"))
        .unwrap_or_default()
}
