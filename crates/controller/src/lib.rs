//! Transactional undo/redo for spreadsheet grid mutations.
//!
//! Mutations are described as [`Statement`]s, grouped into transactions by
//! the [`SheetController`], and applied by the runner, which hands back the
//! inverse of everything it applies.

pub mod controller;
pub mod error;
pub mod runner;
pub mod statement;
pub mod summary;
pub mod transaction;

pub use controller::{SaveError, SaveHook, SheetController};
pub use error::{ControllerError, RunError};
pub use runner::run_statement;
pub use statement::Statement;
pub use summary::TransactionSummary;
pub use transaction::Transaction;
