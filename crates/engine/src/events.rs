//! Change notifications for whoever draws the grid.
//!
//! The controller never holds a reference to a renderer. It emits these
//! events to registered listeners after a transaction commits, and the
//! listener decides what to redraw.

use crate::pos::{Axis, Rect};
use crate::sheet::SheetId;

#[derive(Debug, Clone, PartialEq)]
pub enum GridEvent {
    /// Cells (values, formats or borders) inside `rect` changed.
    CellsDirty { sheet: SheetId, rect: Rect },

    /// Column widths or row heights changed on a sheet.
    HeadingsDirty { sheet: SheetId, axis: Axis },

    /// Sheets were added, removed, renamed or reordered.
    SheetsChanged,

    /// The current sheet changed.
    ActiveSheetChanged { index: usize },

    /// A transaction was closed.
    TransactionCommitted(TransactionCommittedEvent),

    /// Everything should be redrawn from scratch.
    Rebuild,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionCommittedEvent {
    /// Statements executed in the transaction.
    pub statements: usize,
    /// True if the reverse transaction went onto the undo stack.
    pub undoable: bool,
}

/// Callback type for receiving grid events.
pub type EventCallback = Box<dyn FnMut(&GridEvent)>;

/// Simple event collector for testing.
#[derive(Debug, Default)]
pub struct EventCollector {
    events: Vec<GridEvent>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, event: GridEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[GridEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Dirty rectangles, in emission order.
    pub fn dirty_rects(&self) -> Vec<(SheetId, Rect)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                GridEvent::CellsDirty { sheet, rect } => Some((*sheet, *rect)),
                _ => None,
            })
            .collect()
    }

    /// Filter to only TransactionCommitted events.
    pub fn commits(&self) -> Vec<&TransactionCommittedEvent> {
        self.events
            .iter()
            .filter_map(|e| match e {
                GridEvent::TransactionCommitted(c) => Some(c),
                _ => None,
            })
            .collect()
    }

    pub fn rebuild_count(&self) -> usize {
        self.events.iter().filter(|e| matches!(e, GridEvent::Rebuild)).count()
    }
}
