use thiserror::Error;

/// Errors from parsing user-supplied names (fields, flags, sort keys, ids).
///
/// Row normalisation never fails; these only arise at the input boundary.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("unknown pipeline flag: {0}")]
    UnknownFlag(String),

    #[error("unknown editable field: {0}")]
    UnknownField(String),

    #[error("unknown sort field: {0} (expected customer, origin, manager or score)")]
    UnknownSort(String),

    #[error("unknown lead type filter: {0} (expected all, pim, cm or both)")]
    UnknownType(String),

    #[error("invalid lead id: {0}")]
    InvalidId(String),
}
