//! Ledger error taxonomy. Mutating operations surface every variant;
//! read-only paths recover `Storage` locally and log it.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    /// An open record already matches the identity.
    #[error("position is already open")]
    AlreadyOpen,

    /// No open record matches the identity.
    #[error("no open position matches")]
    NotOpen,

    /// All slots of the given kind are filled on the matching record.
    #[error("all {limit} {kind} slots are filled")]
    SlotsFull { kind: &'static str, limit: usize },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl LedgerError {
    pub fn avg_down_slots_full() -> Self {
        Self::SlotsFull {
            kind: "average-down",
            limit: 2,
        }
    }

    pub fn trim_slots_full() -> Self {
        Self::SlotsFull {
            kind: "trim",
            limit: 4,
        }
    }
}
