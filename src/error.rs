//! Error kinds shared across components (§7 Error handling design).
//!
//! Each variant corresponds 1:1 to a kind named in §7. Components map
//! their failures onto these before deciding whether to retry, abort
//! the current unit of work, or terminate the process (§6 Exit codes).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexerError {
    /// Node HTTP/network failure. Retriable.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Decoding failure: a required field was missing or had the wrong
    /// arity. Fatal for the record being decoded.
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    /// The `type` tag on a transaction was not one of
    /// `pay|keyreg|acfg|axfer|afrz`. Fatal for the containing block.
    #[error("unknown transaction type: {0}")]
    UnknownTxType(String),

    /// A raw block response's decoded `rnd` did not equal the
    /// requested round. Fatal for that fetch, retriable.
    #[error("unexpected round: requested {requested}, got {got}")]
    UnexpectedRound { requested: u64, got: u64 },

    /// Fatal misconfiguration; the process should exit.
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage layer failure. Retriable once with reconnection, then
    /// fatal.
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// A commit whose resulting watermark would not be exactly
    /// `previous + 1`. Fatal.
    #[error("watermark advance error: expected {expected}, attempted {attempted}")]
    WatermarkAdvance { expected: i64, attempted: i64 },

    /// Filesystem failure underlying the archiver/loader.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl IndexerError {
    /// Maps an error to the process exit code it should produce per
    /// §6: 0 success, 1 any unrecoverable error.
    pub fn exit_code(&self) -> i32 {
        1
    }

    /// Whether the caller should retry the operation that produced
    /// this error, per the classification in §7.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            IndexerError::Transport(_) | IndexerError::UnexpectedRound { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, IndexerError>;
