//! Transaction lifecycle and the undo/redo stacks.
//!
//! Every mutation goes through a transaction: `start_transaction`, any
//! number of `execute_statement`, then `end_transaction`. Closing a
//! transaction pushes its reverse onto the undo stack; `undo` replays that
//! reverse as a new transaction and pushes *its* reverse onto the redo
//! stack, and the other way round for `redo`.

use std::fmt;
use std::fmt::Write as _;

use tabula_config::ControllerSettings;
use tabula_engine::events::{EventCallback, GridEvent, TransactionCommittedEvent};
use tabula_engine::file::GridFile;
use tabula_engine::{GridStore, Sheet, SheetId, Workbook};

use crate::error::ControllerError;
use crate::runner::run_statement;
use crate::statement::Statement;
use crate::summary::TransactionSummary;
use crate::transaction::Transaction;

/// Error type persistence hooks may return.
pub type SaveError = Box<dyn std::error::Error + Send + Sync>;

/// Called after every committed transaction.
pub type SaveHook = Box<dyn FnMut() -> Result<(), SaveError>>;

/// The forward statements of the open transaction and their inverses.
/// Held together so one can never exist without the other. Inverses are
/// kept in execution order until the transaction closes.
#[derive(Debug, Default)]
struct InProgress {
    forward: Transaction,
    inverses: Transaction,
}

pub struct SheetController<G: GridStore = Workbook> {
    grid: G,
    settings: ControllerSettings,
    in_progress: Option<InProgress>,
    undo_stack: Vec<Transaction>,
    redo_stack: Vec<Transaction>,
    summary: TransactionSummary,
    listeners: Vec<EventCallback>,
    save_hook: Option<SaveHook>,
}

impl Default for SheetController<Workbook> {
    fn default() -> Self {
        Self::new(Workbook::new())
    }
}

impl<G: GridStore + fmt::Debug> fmt::Debug for SheetController<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SheetController")
            .field("grid", &self.grid)
            .field("settings", &self.settings)
            .field("in_progress", &self.in_progress)
            .field("undo_stack", &self.undo_stack.len())
            .field("redo_stack", &self.redo_stack.len())
            .field("listeners", &self.listeners.len())
            .field("save_hook", &self.save_hook.is_some())
            .finish()
    }
}

impl<G: GridStore> SheetController<G> {
    pub fn new(grid: G) -> Self {
        Self::with_settings(grid, ControllerSettings::default())
    }

    pub fn with_settings(grid: G, settings: ControllerSettings) -> Self {
        Self {
            grid,
            settings,
            in_progress: None,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            summary: TransactionSummary::new(),
            listeners: Vec::new(),
            save_hook: None,
        }
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    pub fn grid(&self) -> &G {
        &self.grid
    }

    pub fn into_grid(self) -> G {
        self.grid
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    /// Open a new transaction.
    ///
    /// With one already open, strict mode refuses and keeps it intact.
    /// Lenient mode logs the violation and commits the stale transaction
    /// first so none of its statements are lost.
    pub fn start_transaction(&mut self) -> Result<(), ControllerError> {
        if let Some(open) = &self.in_progress {
            let pending = open.forward.len();
            if self.settings.strict {
                return Err(ControllerError::TransactionAlreadyInProgress { pending });
            }
            log::error!(
                "start_transaction called with a transaction in progress; committing its {} pending statement(s)",
                pending
            );
            self.end_transaction()?;
        }
        self.in_progress = Some(InProgress::default());
        self.summary = TransactionSummary::new();
        Ok(())
    }

    /// Run one statement inside the open transaction.
    ///
    /// A statement that fails changes nothing and is not recorded; the
    /// transaction stays open.
    pub fn execute_statement(&mut self, statement: Statement) -> Result<(), ControllerError> {
        let Some(open) = self.in_progress.as_mut() else {
            if !self.settings.strict {
                log::error!("execute_statement without a transaction: {}", statement.describe());
            }
            return Err(ControllerError::NoTransactionInProgress);
        };

        if self.settings.log_statements {
            log::debug!("execute {}", statement.describe());
        }
        let reverse = run_statement(&mut self.grid, &statement, &mut self.summary)?;
        open.forward.push(statement);
        open.inverses.push(reverse);
        Ok(())
    }

    /// Close the open transaction: push its reverse onto the undo stack and
    /// clear the redo stack.
    pub fn end_transaction(&mut self) -> Result<Transaction, ControllerError> {
        self.end_transaction_with(true, true)
    }

    /// Close the open transaction and return its reverse.
    ///
    /// The in-progress slot is cleared whatever the flags say. Dirty regions
    /// are announced, then `TransactionCommitted` and `Rebuild`, then the
    /// save hook runs.
    pub fn end_transaction_with(
        &mut self,
        add_to_undo: bool,
        clear_redo: bool,
    ) -> Result<Transaction, ControllerError> {
        let Some(InProgress { forward, inverses }) = self.in_progress.take() else {
            if !self.settings.strict {
                log::error!("end_transaction without a transaction in progress");
            }
            return Err(ControllerError::NoTransactionInProgress);
        };
        let reverse = inverses.reversed();

        if clear_redo {
            self.redo_stack.clear();
        }
        if add_to_undo {
            push_bounded(&mut self.undo_stack, reverse.clone(), self.settings.history_limit(), "undo");
        }
        log::debug!(
            "committed transaction: {} statement(s), undoable: {}",
            forward.len(),
            add_to_undo
        );

        self.emit_summary();
        self.emit(GridEvent::TransactionCommitted(TransactionCommittedEvent {
            statements: forward.len(),
            undoable: add_to_undo,
        }));
        self.emit(GridEvent::Rebuild);
        self.save();

        Ok(reverse)
    }

    /// Discard the open transaction, rolling the grid back to where it was
    /// when the transaction started. Neither stack is touched.
    pub fn abort_transaction(&mut self) -> Result<(), ControllerError> {
        let Some(InProgress { forward, inverses }) = self.in_progress.take() else {
            return Err(ControllerError::NoTransactionInProgress);
        };
        log::debug!("aborting transaction with {} statement(s)", forward.len());

        let mut failed = None;
        for statement in inverses.iter().rev() {
            if let Err(err) = run_statement(&mut self.grid, statement, &mut self.summary) {
                log::error!("rollback of {} failed: {}", statement.describe(), err);
                if failed.is_none() {
                    failed = Some(err);
                }
            }
        }

        self.emit_summary();
        self.emit(GridEvent::Rebuild);

        match failed {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }

    /// Run a complete transaction. If any statement fails, the ones already
    /// applied are rolled back and the error is returned.
    pub fn predefined_transaction(
        &mut self,
        statements: impl IntoIterator<Item = Statement>,
    ) -> Result<Transaction, ControllerError> {
        self.start_transaction()?;
        for statement in statements {
            if let Err(err) = self.execute_statement(statement) {
                if let Err(abort_err) = self.abort_transaction() {
                    log::error!("rollback after failed statement also failed: {}", abort_err);
                }
                return Err(err);
            }
        }
        self.end_transaction()
    }

    pub fn is_transaction_in_progress(&self) -> bool {
        self.in_progress.is_some()
    }

    // =========================================================================
    // Undo / Redo
    // =========================================================================

    /// Undo the most recent transaction. Returns `Ok(false)` when there is
    /// nothing to undo or a transaction is open.
    pub fn undo(&mut self) -> Result<bool, ControllerError> {
        if self.in_progress.is_some() {
            log::debug!("undo ignored: transaction in progress");
            return Ok(false);
        }
        let Some(transaction) = self.undo_stack.pop() else {
            return Ok(false);
        };

        match self.replay(&transaction) {
            Ok(reverse) => {
                push_bounded(&mut self.redo_stack, reverse, self.settings.history_limit(), "redo");
                Ok(true)
            }
            Err(err) => {
                self.undo_stack.push(transaction);
                Err(err)
            }
        }
    }

    /// Redo the most recently undone transaction. Returns `Ok(false)` when
    /// there is nothing to redo or a transaction is open.
    pub fn redo(&mut self) -> Result<bool, ControllerError> {
        if self.in_progress.is_some() {
            log::debug!("redo ignored: transaction in progress");
            return Ok(false);
        }
        let Some(transaction) = self.redo_stack.pop() else {
            return Ok(false);
        };

        match self.replay(&transaction) {
            Ok(reverse) => {
                push_bounded(&mut self.undo_stack, reverse, self.settings.history_limit(), "undo");
                Ok(true)
            }
            Err(err) => {
                self.redo_stack.push(transaction);
                Err(err)
            }
        }
    }

    /// Replay a stored transaction without touching either stack.
    fn replay(&mut self, transaction: &Transaction) -> Result<Transaction, ControllerError> {
        self.start_transaction()?;
        for statement in transaction {
            if let Err(err) = self.execute_statement(statement.clone()) {
                if let Err(abort_err) = self.abort_transaction() {
                    log::error!("rollback of failed replay also failed: {}", abort_err);
                }
                return Err(err);
            }
        }
        self.end_transaction_with(false, false)
    }

    pub fn has_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn has_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    /// Reverse transactions, oldest first.
    pub fn undo_stack(&self) -> &[Transaction] {
        &self.undo_stack
    }

    pub fn redo_stack(&self) -> &[Transaction] {
        &self.redo_stack
    }

    /// Drop all history and any open transaction. The grid is left as is.
    pub fn clear(&mut self) {
        log::info!(
            "clearing history ({} undo, {} redo)",
            self.undo_stack.len(),
            self.redo_stack.len()
        );
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.in_progress = None;
        self.summary = TransactionSummary::new();
    }

    pub fn undo_stack_report(&self) -> String {
        stack_report("undo", &self.undo_stack)
    }

    pub fn redo_stack_report(&self) -> String {
        stack_report("redo", &self.redo_stack)
    }

    // =========================================================================
    // Sheets
    // =========================================================================

    /// Index of the current sheet
    pub fn current(&self) -> usize {
        self.grid.active_index()
    }

    /// Switch the current sheet. Not undoable.
    pub fn set_current(&mut self, index: usize) -> bool {
        if !self.grid.set_active_index(index) {
            return false;
        }
        self.emit(GridEvent::ActiveSheetChanged { index });
        true
    }

    pub fn sheet(&self) -> Option<&Sheet> {
        self.grid.active_sheet()
    }

    pub fn sheets(&self) -> Vec<&Sheet> {
        self.grid.sheets()
    }

    /// Append a new empty sheet with the next free `SheetN` name and make it
    /// current. Undoable.
    pub fn add_sheet(&mut self) -> Result<SheetId, ControllerError> {
        let id = self.grid.allocate_sheet_id();
        let name = self.grid.unique_sheet_name();
        let index = self.grid.sheet_count();
        self.predefined_transaction([Statement::AddSheet {
            index,
            sheet: Box::new(Sheet::new(id, &name)),
        }])?;
        self.set_current(index);
        Ok(id)
    }

    pub fn delete_sheet(&mut self, sheet: SheetId) -> Result<(), ControllerError> {
        self.predefined_transaction([Statement::DeleteSheet { sheet }])?;
        Ok(())
    }

    /// Replace the whole document. History does not survive a document
    /// switch.
    pub fn load_sheets(&mut self, sheets: Vec<Sheet>) {
        let sheets = if sheets.is_empty() {
            vec![Sheet::new(self.grid.allocate_sheet_id(), "Sheet1")]
        } else {
            sheets
        };
        log::info!("loading {} sheet(s)", sheets.len());
        self.grid.replace_sheets(sheets);
        self.grid.set_active_index(0);
        self.clear();
        self.emit(GridEvent::SheetsChanged);
        self.emit(GridEvent::Rebuild);
    }

    pub fn export(&self) -> Vec<Sheet> {
        self.grid.sheets().into_iter().cloned().collect()
    }

    pub fn load_file(&mut self, file: GridFile) {
        self.load_sheets(file.sheets);
    }

    pub fn export_file(&self) -> GridFile {
        GridFile::new(self.export())
    }

    // =========================================================================
    // Listeners
    // =========================================================================

    pub fn subscribe(&mut self, callback: EventCallback) {
        self.listeners.push(callback);
    }

    pub fn set_save_hook(&mut self, hook: SaveHook) {
        self.save_hook = Some(hook);
    }

    pub fn clear_save_hook(&mut self) {
        self.save_hook = None;
    }

    fn emit(&mut self, event: GridEvent) {
        for listener in &mut self.listeners {
            listener(&event);
        }
    }

    fn emit_summary(&mut self) {
        let summary = std::mem::take(&mut self.summary);
        for event in summary.into_events() {
            self.emit(event);
        }
    }

    fn save(&mut self) {
        if let Some(hook) = self.save_hook.as_mut() {
            // The commit stands even if persisting it fails
            if let Err(err) = hook() {
                log::warn!("save hook failed: {}", err);
            }
        }
    }
}

fn push_bounded(stack: &mut Vec<Transaction>, transaction: Transaction, limit: Option<usize>, name: &str) {
    stack.push(transaction);
    if let Some(limit) = limit {
        if stack.len() > limit {
            let excess = stack.len() - limit;
            stack.drain(..excess);
            log::warn!("{} history limit ({}) reached, dropped {} oldest", name, limit, excess);
        }
    }
}

fn stack_report(name: &str, stack: &[Transaction]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} stack: {} transaction(s)", name, stack.len());
    for (i, transaction) in stack.iter().enumerate().rev() {
        let _ = writeln!(out, "[{}] {} statement(s)", i, transaction.len());
        for statement in transaction {
            match serde_json::to_string(statement) {
                Ok(json) => {
                    let _ = writeln!(out, "  {}", json);
                }
                Err(_) => {
                    let _ = writeln!(out, "  {}", statement.describe());
                }
            }
        }
    }
    log::debug!("{}", out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_engine::{Cell, Pos};

    fn strict() -> SheetController {
        SheetController::with_settings(Workbook::new(), ControllerSettings::strict())
    }

    fn set(pos: Pos, text: &str) -> Statement {
        Statement::SetCellValue { sheet: SheetId(1), pos, cell: Some(Cell::text(text)) }
    }

    #[test]
    fn test_reverse_undoes_last_statement_first() {
        let mut sc = strict();
        sc.start_transaction().unwrap();
        sc.execute_statement(set(Pos::new(0, 0), "a")).unwrap();
        sc.execute_statement(set(Pos::new(1, 0), "b")).unwrap();
        let reverse = sc.end_transaction().unwrap();

        let first: Vec<Pos> = reverse
            .iter()
            .map(|s| match s {
                Statement::RestoreCells { cells, .. } => cells[0].0,
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert_eq!(first, vec![Pos::new(1, 0), Pos::new(0, 0)]);
        assert_eq!(sc.undo_stack(), &[reverse]);
    }

    #[test]
    fn test_bulk_transaction_reverse_and_abort() {
        let mut sc = strict();
        let origin = Pos::new(0, 0);
        sc.predefined_transaction([set(origin, "start")]).unwrap();
        let before = sc.export();

        // Every statement overwrites the same cell, so only a fully
        // reversed inverse sequence lands back on "start"
        let bulk: Vec<Statement> = (0..5000).map(|n| set(origin, &n.to_string())).collect();
        let reverse = sc.predefined_transaction(bulk.clone()).unwrap();
        assert_eq!(reverse.len(), 5000);
        assert_eq!(sc.grid().sheet(SheetId(1)).unwrap().display(origin), "4999");
        match reverse.iter().next() {
            Some(Statement::RestoreCells { cells, .. }) => {
                assert_eq!(cells[0].1.as_ref().map(Cell::display).as_deref(), Some("4998"));
            }
            other => panic!("unexpected {:?}", other),
        }

        sc.undo().unwrap();
        assert_eq!(sc.export(), before);

        sc.start_transaction().unwrap();
        for statement in bulk {
            sc.execute_statement(statement).unwrap();
        }
        sc.abort_transaction().unwrap();
        assert_eq!(sc.export(), before);
    }

    #[test]
    fn test_end_with_flags() {
        let mut sc = strict();
        sc.predefined_transaction([set(Pos::new(0, 0), "a")]).unwrap();
        sc.undo().unwrap();
        assert_eq!(sc.redo_len(), 1);

        sc.start_transaction().unwrap();
        sc.execute_statement(set(Pos::new(0, 1), "b")).unwrap();
        sc.end_transaction_with(false, false).unwrap();
        assert!(!sc.has_undo());
        assert_eq!(sc.redo_len(), 1);
        assert!(!sc.is_transaction_in_progress());
    }

    #[test]
    fn test_push_bounded_drops_oldest() {
        let mut stack = Vec::new();
        for i in 0..5 {
            let mut t = Transaction::new();
            t.push(Statement::MoveSheet { sheet: SheetId(1), to: i });
            push_bounded(&mut stack, t, Some(3), "undo");
        }
        assert_eq!(stack.len(), 3);
        assert_eq!(stack[0].statements[0], Statement::MoveSheet { sheet: SheetId(1), to: 2 });

        let mut unbounded = Vec::new();
        for _ in 0..5 {
            push_bounded(&mut unbounded, Transaction::new(), None, "undo");
        }
        assert_eq!(unbounded.len(), 5);
    }

    #[test]
    fn test_stack_report_lists_statements() {
        let mut sc = strict();
        sc.predefined_transaction([set(Pos::new(0, 0), "a")]).unwrap();
        let report = sc.undo_stack_report();
        assert!(report.starts_with("undo stack: 1 transaction(s)"));
        assert!(report.contains("RestoreCells"));
        assert_eq!(sc.redo_stack_report(), "redo stack: 0 transaction(s)\n");
    }
}
