// Transaction lifecycle and undo/redo stack behavior.
// Run with: cargo test -p tabula-controller --test undo_redo

use tabula_config::ControllerSettings;
use tabula_controller::{ControllerError, RunError, SheetController, Statement};
use tabula_engine::{Cell, GridStore, Pos, SheetId, Workbook};

const S1: SheetId = SheetId(1);

fn strict() -> SheetController {
    SheetController::with_settings(Workbook::new(), ControllerSettings::strict())
}

fn lenient() -> SheetController {
    SheetController::with_settings(Workbook::new(), ControllerSettings::lenient())
}

fn set(x: i64, y: i64, text: &str) -> Statement {
    Statement::SetCellValue { sheet: S1, pos: Pos::new(x, y), cell: Some(Cell::text(text)) }
}

fn display(sc: &SheetController, x: i64, y: i64) -> String {
    sc.grid().sheet(S1).unwrap().display(Pos::new(x, y))
}

fn is_empty(sc: &SheetController, x: i64, y: i64) -> bool {
    sc.grid().sheet(S1).unwrap().cell(Pos::new(x, y)).is_none()
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn set_then_undo_then_redo() {
    let mut sc = strict();
    sc.predefined_transaction([set(0, 0, "hello")]).unwrap();
    assert_eq!(display(&sc, 0, 0), "hello");

    assert!(sc.undo().unwrap());
    assert!(is_empty(&sc, 0, 0));

    assert!(sc.redo().unwrap());
    assert_eq!(display(&sc, 0, 0), "hello");
}

#[test]
fn transaction_undoes_atomically() {
    let mut sc = strict();
    sc.start_transaction().unwrap();
    sc.execute_statement(set(0, 0, "a")).unwrap();
    sc.execute_statement(set(0, 0, "b")).unwrap();
    sc.end_transaction().unwrap();
    assert_eq!(display(&sc, 0, 0), "b");
    assert_eq!(sc.undo_len(), 1);

    sc.undo().unwrap();
    // Not "a": the whole transaction is one unit
    assert!(is_empty(&sc, 0, 0));

    sc.redo().unwrap();
    assert_eq!(display(&sc, 0, 0), "b");
}

#[test]
fn undo_with_empty_stack_is_noop() {
    let mut sc = strict();
    let before = sc.export();
    assert_eq!(sc.undo(), Ok(false));
    assert_eq!(sc.redo(), Ok(false));
    assert_eq!(sc.export(), before);
    assert!(!sc.has_undo());
    assert!(!sc.has_redo());
}

#[test]
fn double_start_fails_in_strict_mode_and_keeps_pending() {
    let mut sc = strict();
    sc.start_transaction().unwrap();
    sc.execute_statement(set(0, 0, "pending")).unwrap();

    assert_eq!(
        sc.start_transaction(),
        Err(ControllerError::TransactionAlreadyInProgress { pending: 1 })
    );
    assert!(sc.is_transaction_in_progress());

    // The first transaction is still intact and can be closed normally
    sc.end_transaction().unwrap();
    assert_eq!(sc.undo_len(), 1);
    sc.undo().unwrap();
    assert!(is_empty(&sc, 0, 0));
}

#[test]
fn double_start_commits_stale_transaction_in_lenient_mode() {
    let mut sc = lenient();
    sc.start_transaction().unwrap();
    sc.execute_statement(set(0, 0, "stale")).unwrap();

    sc.start_transaction().unwrap();
    assert_eq!(sc.undo_len(), 1, "stale transaction committed, not dropped");
    sc.execute_statement(set(1, 0, "fresh")).unwrap();
    sc.end_transaction().unwrap();

    assert_eq!(sc.undo_len(), 2);
    sc.undo().unwrap();
    assert_eq!(display(&sc, 0, 0), "stale");
    assert!(is_empty(&sc, 1, 0));
}

// ---------------------------------------------------------------------------
// Protocol
// ---------------------------------------------------------------------------

#[test]
fn execute_and_end_require_open_transaction() {
    for mut sc in [strict(), lenient()] {
        assert_eq!(sc.execute_statement(set(0, 0, "x")), Err(ControllerError::NoTransactionInProgress));
        assert_eq!(sc.end_transaction().unwrap_err(), ControllerError::NoTransactionInProgress);
        assert!(is_empty(&sc, 0, 0));
    }
}

#[test]
fn undo_during_transaction_is_noop() {
    let mut sc = strict();
    sc.predefined_transaction([set(0, 0, "done")]).unwrap();

    sc.start_transaction().unwrap();
    sc.execute_statement(set(1, 1, "open")).unwrap();
    assert_eq!(sc.undo(), Ok(false));
    assert_eq!(sc.redo(), Ok(false));
    assert_eq!(sc.undo_len(), 1);
    assert_eq!(display(&sc, 0, 0), "done");

    sc.end_transaction().unwrap();
    assert_eq!(sc.undo_len(), 2);
}

#[test]
fn failed_statement_is_not_recorded() {
    let mut sc = strict();
    sc.start_transaction().unwrap();
    sc.execute_statement(set(0, 0, "ok")).unwrap();
    let err = sc.execute_statement(Statement::DeleteSheet { sheet: S1 }).unwrap_err();
    assert_eq!(err, ControllerError::Statement(RunError::LastSheet));
    assert!(sc.is_transaction_in_progress());

    let reverse = sc.end_transaction().unwrap();
    assert_eq!(reverse.len(), 1);
}

#[test]
fn predefined_transaction_rolls_back_on_failure() {
    let mut sc = strict();
    sc.predefined_transaction([set(5, 5, "kept")]).unwrap();
    let before = sc.export();

    let err = sc
        .predefined_transaction([
            set(0, 0, "a"),
            set(1, 0, "b"),
            Statement::RenameSheet { sheet: SheetId(42), name: "Nope".into() },
        ])
        .unwrap_err();

    assert_eq!(err, ControllerError::Statement(RunError::SheetNotFound(SheetId(42))));
    assert_eq!(sc.export(), before);
    assert!(!sc.is_transaction_in_progress());
    assert_eq!(sc.undo_len(), 1);
}

#[test]
fn abort_restores_grid_and_leaves_stacks() {
    let mut sc = strict();
    sc.predefined_transaction([set(0, 0, "one")]).unwrap();
    sc.predefined_transaction([set(0, 1, "two")]).unwrap();
    sc.undo().unwrap();
    let before = sc.export();

    sc.start_transaction().unwrap();
    sc.execute_statement(set(0, 0, "changed")).unwrap();
    sc.execute_statement(set(3, 3, "new")).unwrap();
    sc.execute_statement(Statement::SetCellValue { sheet: S1, pos: Pos::new(0, 0), cell: None })
        .unwrap();
    sc.abort_transaction().unwrap();

    assert_eq!(sc.export(), before);
    assert!(!sc.is_transaction_in_progress());
    assert_eq!(sc.undo_len(), 1);
    assert_eq!(sc.redo_len(), 1);
    assert_eq!(sc.abort_transaction(), Err(ControllerError::NoTransactionInProgress));
}

// ---------------------------------------------------------------------------
// Stacks
// ---------------------------------------------------------------------------

#[test]
fn new_transaction_clears_redo() {
    let mut sc = strict();
    sc.predefined_transaction([set(0, 0, "a")]).unwrap();
    sc.predefined_transaction([set(0, 1, "b")]).unwrap();
    sc.undo().unwrap();
    assert!(sc.has_redo());

    sc.predefined_transaction([set(0, 2, "c")]).unwrap();
    assert!(!sc.has_redo());
    assert_eq!(sc.redo(), Ok(false));
}

#[test]
fn undo_redo_moves_between_stacks() {
    let mut sc = strict();
    for (i, text) in ["a", "b", "c"].iter().enumerate() {
        sc.predefined_transaction([set(0, i as i64, text)]).unwrap();
    }
    assert_eq!((sc.undo_len(), sc.redo_len()), (3, 0));

    sc.undo().unwrap();
    sc.undo().unwrap();
    assert_eq!((sc.undo_len(), sc.redo_len()), (1, 2));
    assert_eq!(display(&sc, 0, 0), "a");
    assert!(is_empty(&sc, 0, 1));

    // Redo does not clear the rest of the redo stack
    sc.redo().unwrap();
    assert_eq!((sc.undo_len(), sc.redo_len()), (2, 1));
    assert_eq!(display(&sc, 0, 1), "b");

    sc.redo().unwrap();
    assert_eq!(display(&sc, 0, 2), "c");
    assert!(!sc.has_redo());
}

#[test]
fn undo_then_redo_restores_post_state() {
    let mut sc = strict();
    sc.predefined_transaction([set(0, 0, "x"), set(2, 2, "y")]).unwrap();
    let after = sc.export();

    sc.undo().unwrap();
    sc.redo().unwrap();
    assert_eq!(sc.export(), after);
}

#[test]
fn history_is_bounded() {
    let settings = ControllerSettings::strict().with_max_history(3);
    let mut sc = SheetController::with_settings(Workbook::new(), settings);
    for y in 0..5 {
        sc.predefined_transaction([set(0, y, "v")]).unwrap();
    }
    assert_eq!(sc.undo_len(), 3);

    while sc.undo().unwrap() {}
    // The two oldest edits fell off the stack and stay applied
    assert_eq!(display(&sc, 0, 0), "v");
    assert_eq!(display(&sc, 0, 1), "v");
    assert!(is_empty(&sc, 0, 2));
}

#[test]
fn zero_history_limit_is_unbounded() {
    let settings = ControllerSettings::strict().with_max_history(0);
    let mut sc = SheetController::with_settings(Workbook::new(), settings);
    for y in 0..150 {
        sc.predefined_transaction([set(0, y, "v")]).unwrap();
    }
    assert_eq!(sc.undo_len(), 150);
}

#[test]
fn clear_drops_history_and_open_transaction() {
    let mut sc = strict();
    sc.predefined_transaction([set(0, 0, "a")]).unwrap();
    sc.predefined_transaction([set(0, 1, "b")]).unwrap();
    sc.undo().unwrap();
    sc.start_transaction().unwrap();

    sc.clear();
    assert!(!sc.has_undo());
    assert!(!sc.has_redo());
    assert!(!sc.is_transaction_in_progress());
    assert_eq!(display(&sc, 0, 0), "a");
}

#[test]
fn empty_transaction_still_pushes_undo_entry() {
    let mut sc = strict();
    sc.start_transaction().unwrap();
    let reverse = sc.end_transaction().unwrap();
    assert!(reverse.is_empty());
    assert_eq!(sc.undo_len(), 1);
    assert_eq!(sc.undo(), Ok(true));
    assert_eq!(sc.redo_len(), 1);
}
