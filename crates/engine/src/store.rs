//! The grid resource seam.
//!
//! The controller never reaches for ambient state: it is handed something
//! implementing `GridStore` and mutates the document only through it.
//! Per-cell, per-format and heading access lives on `Sheet`; this trait
//! covers the sheet collection.

use crate::sheet::{normalize_sheet_name, Sheet, SheetId};

pub trait GridStore {
    fn sheet(&self, id: SheetId) -> Option<&Sheet>;

    fn sheet_mut(&mut self, id: SheetId) -> Option<&mut Sheet>;

    /// Position of a sheet in the sheet order
    fn sheet_index(&self, id: SheetId) -> Option<usize>;

    fn sheet_at(&self, index: usize) -> Option<&Sheet>;

    fn sheet_count(&self) -> usize;

    fn sheet_ids(&self) -> Vec<SheetId>;

    /// Insert a sheet at `index` (clamped to the end). The caller has already
    /// checked that the id is not present.
    fn insert_sheet(&mut self, index: usize, sheet: Sheet);

    /// Remove a sheet, returning its former index and contents.
    fn remove_sheet(&mut self, id: SheetId) -> Option<(usize, Sheet)>;

    /// Move a sheet to `to` (clamped), returning its previous index.
    fn move_sheet(&mut self, id: SheetId, to: usize) -> Option<usize>;

    /// Hand out a fresh id; ids are never reused.
    fn allocate_sheet_id(&mut self) -> SheetId;

    fn active_index(&self) -> usize;

    fn set_active_index(&mut self, index: usize) -> bool;

    /// Replace the whole sheet list (document load).
    fn replace_sheets(&mut self, sheets: Vec<Sheet>);

    fn sheets(&self) -> Vec<&Sheet> {
        (0..self.sheet_count()).filter_map(|i| self.sheet_at(i)).collect()
    }

    fn active_sheet(&self) -> Option<&Sheet> {
        self.sheet_at(self.active_index())
    }

    /// Check if a sheet name already exists (case-insensitive)
    fn sheet_name_exists(&self, name: &str) -> bool {
        let key = normalize_sheet_name(name);
        self.sheets().iter().any(|s| normalize_sheet_name(s.name()) == key)
    }

    /// First free `SheetN` name, counting up from the sheet count + 1
    fn unique_sheet_name(&self) -> String {
        let mut num = self.sheet_count() + 1;
        loop {
            let candidate = format!("Sheet{}", num);
            if !self.sheet_name_exists(&candidate) {
                return candidate;
            }
            num += 1;
        }
    }
}
