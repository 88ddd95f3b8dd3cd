//! Sync layer: the sheet backend trait, an optimistic edit/save session, and
//! the HTTP client and share links behind the `http` feature.

mod backend;
mod error;
mod session;

#[cfg(feature = "http")]
pub mod http;
#[cfg(feature = "http")]
pub mod link;

pub use backend::{LeadBackend, parse_rows};
pub use error::{SessionError, SyncError};
pub use session::{Dashboard, SavePolicy, ScorePolicy};

#[cfg(feature = "http")]
pub use http::SheetClient;
