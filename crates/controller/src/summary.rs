//! Dirty-region bookkeeping for the transaction being executed.

use rustc_hash::{FxHashMap, FxHashSet};
use tabula_engine::events::GridEvent;
use tabula_engine::{Axis, Rect, SheetId};

#[derive(Debug, Default)]
pub struct TransactionSummary {
    /// One bounding rectangle per touched sheet
    dirty: FxHashMap<SheetId, Rect>,
    headings: FxHashSet<(SheetId, Axis)>,
    sheets_changed: bool,
}

impl TransactionSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cells_dirty(&mut self, sheet: SheetId, rect: Rect) {
        self.dirty
            .entry(sheet)
            .and_modify(|r| *r = r.union(&rect))
            .or_insert(rect);
    }

    pub fn headings_dirty(&mut self, sheet: SheetId, axis: Axis) {
        self.headings.insert((sheet, axis));
    }

    pub fn sheets_changed(&mut self) {
        self.sheets_changed = true;
    }

    pub fn is_empty(&self) -> bool {
        self.dirty.is_empty() && self.headings.is_empty() && !self.sheets_changed
    }

    /// Events in a stable order: sheet list, headings, then cells.
    pub fn into_events(self) -> Vec<GridEvent> {
        let mut events = Vec::new();
        if self.sheets_changed {
            events.push(GridEvent::SheetsChanged);
        }

        let mut headings: Vec<(SheetId, Axis)> = self.headings.into_iter().collect();
        headings.sort_by_key(|(sheet, axis)| (*sheet, *axis == Axis::Row));
        events.extend(
            headings
                .into_iter()
                .map(|(sheet, axis)| GridEvent::HeadingsDirty { sheet, axis }),
        );

        let mut dirty: Vec<(SheetId, Rect)> = self.dirty.into_iter().collect();
        dirty.sort_by_key(|(sheet, _)| *sheet);
        events.extend(
            dirty
                .into_iter()
                .map(|(sheet, rect)| GridEvent::CellsDirty { sheet, rect }),
        );
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_engine::Pos;

    #[test]
    fn test_dirty_rects_merge_per_sheet() {
        let mut summary = TransactionSummary::new();
        assert!(summary.is_empty());

        summary.cells_dirty(SheetId(2), Rect::single(Pos::new(5, 5)));
        summary.cells_dirty(SheetId(1), Rect::single(Pos::new(0, 0)));
        summary.cells_dirty(SheetId(1), Rect::single(Pos::new(2, 3)));
        summary.headings_dirty(SheetId(1), Axis::Row);
        summary.headings_dirty(SheetId(1), Axis::Row);

        let events = summary.into_events();
        assert_eq!(
            events,
            vec![
                GridEvent::HeadingsDirty { sheet: SheetId(1), axis: Axis::Row },
                GridEvent::CellsDirty {
                    sheet: SheetId(1),
                    rect: Rect::new_span(Pos::new(0, 0), Pos::new(2, 3)),
                },
                GridEvent::CellsDirty { sheet: SheetId(2), rect: Rect::single(Pos::new(5, 5)) },
            ]
        );
    }

    #[test]
    fn test_sheets_changed_first() {
        let mut summary = TransactionSummary::new();
        summary.cells_dirty(SheetId(1), Rect::single(Pos::new(0, 0)));
        summary.sheets_changed();
        assert_eq!(summary.into_events()[0], GridEvent::SheetsChanged);
    }
}
