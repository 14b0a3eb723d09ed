use tabula_engine::SheetId;
use thiserror::Error;

/// A statement referenced state the grid cannot resolve. Raised before any
/// write, so the grid is untouched when this is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RunError {
    #[error("{0} does not exist")]
    SheetNotFound(SheetId),
    #[error("sheet index {index} out of range ({len} sheets)")]
    SheetIndexOutOfRange { index: usize, len: usize },
    #[error("{0} already exists")]
    DuplicateSheet(SheetId),
    #[error("cannot delete the last sheet")]
    LastSheet,
    #[error("invalid heading size {0}")]
    InvalidHeadingSize(f64),
    #[error("sheet name cannot be empty")]
    EmptySheetName,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ControllerError {
    /// `start_transaction` while another one is open (strict mode).
    #[error("transaction already in progress ({pending} pending statements)")]
    TransactionAlreadyInProgress { pending: usize },
    /// `execute_statement`, `end_transaction` or `abort_transaction` with
    /// nothing open.
    #[error("no transaction in progress")]
    NoTransactionInProgress,
    #[error(transparent)]
    Statement(#[from] RunError),
}
