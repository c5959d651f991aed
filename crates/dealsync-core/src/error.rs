use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DealSyncError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Invalid assumption: {field} — {reason}")]
    InvalidAssumption { field: String, reason: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl DealSyncError {
    /// `true` for economically undefined parameter combinations, which a
    /// host usually shows inline rather than as a hard failure.
    pub fn is_assumption_error(&self) -> bool {
        matches!(self, DealSyncError::InvalidAssumption { .. })
    }
}

impl From<serde_json::Error> for DealSyncError {
    fn from(e: serde_json::Error) -> Self {
        DealSyncError::SerializationError(e.to_string())
    }
}
