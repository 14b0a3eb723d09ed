use serde::{Deserialize, Serialize};

use crate::sheet::{normalize_sheet_name, Sheet, SheetId};
use crate::store::GridStore;

/// A workbook containing multiple sheets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    sheets: Vec<Sheet>,
    active_sheet: usize,
    /// Next ID to assign to a new sheet. Monotonically increasing, never reused.
    #[serde(default = "default_next_sheet_id")]
    next_sheet_id: u64,
}

fn default_next_sheet_id() -> u64 {
    1
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}

impl Workbook {
    /// Create a new workbook with one default sheet
    pub fn new() -> Self {
        Self {
            sheets: vec![Sheet::new(SheetId(1), "Sheet1")],
            active_sheet: 0,
            next_sheet_id: 2,
        }
    }

    /// Create a workbook from sheets (for deserialization).
    /// next_sheet_id becomes max existing id + 1.
    pub fn from_sheets(sheets: Vec<Sheet>, active: usize) -> Self {
        let mut workbook = Self {
            sheets: Vec::new(),
            active_sheet: 0,
            next_sheet_id: 1,
        };
        workbook.replace_sheets(sheets);
        workbook.active_sheet = active.min(workbook.sheets.len().saturating_sub(1));
        workbook
    }

    /// Get the next_sheet_id value (for persistence)
    pub fn next_sheet_id(&self) -> u64 {
        self.next_sheet_id
    }

    /// Get all sheet names
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name()).collect()
    }

    /// Find a sheet by name (case-insensitive)
    pub fn sheet_by_name(&self, name: &str) -> Option<&Sheet> {
        let key = normalize_sheet_name(name);
        self.sheets.iter().find(|s| normalize_sheet_name(s.name()) == key)
    }

    fn clamp_active(&mut self) {
        if self.active_sheet >= self.sheets.len() {
            self.active_sheet = self.sheets.len().saturating_sub(1);
        }
    }
}

impl GridStore for Workbook {
    fn sheet(&self, id: SheetId) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.id == id)
    }

    fn sheet_mut(&mut self, id: SheetId) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|s| s.id == id)
    }

    fn sheet_index(&self, id: SheetId) -> Option<usize> {
        self.sheets.iter().position(|s| s.id == id)
    }

    fn sheet_at(&self, index: usize) -> Option<&Sheet> {
        self.sheets.get(index)
    }

    fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    fn sheet_ids(&self) -> Vec<SheetId> {
        self.sheets.iter().map(|s| s.id).collect()
    }

    fn insert_sheet(&mut self, index: usize, sheet: Sheet) {
        let index = index.min(self.sheets.len());
        self.next_sheet_id = self.next_sheet_id.max(sheet.id.raw() + 1);
        self.sheets.insert(index, sheet);
        // Keep the same sheet active when one is inserted before it
        if index <= self.active_sheet && self.sheets.len() > 1 {
            self.active_sheet += 1;
        }
        self.clamp_active();
    }

    fn remove_sheet(&mut self, id: SheetId) -> Option<(usize, Sheet)> {
        let index = self.sheet_index(id)?;
        let sheet = self.sheets.remove(index);

        // Adjust active sheet if needed
        if self.active_sheet > index {
            self.active_sheet -= 1;
        }
        self.clamp_active();

        Some((index, sheet))
    }

    fn move_sheet(&mut self, id: SheetId, to: usize) -> Option<usize> {
        let from = self.sheet_index(id)?;
        let to = to.min(self.sheets.len() - 1);
        let active_id = self.sheets.get(self.active_sheet).map(|s| s.id);

        let sheet = self.sheets.remove(from);
        self.sheets.insert(to, sheet);

        if let Some(active_id) = active_id {
            if let Some(idx) = self.sheet_index(active_id) {
                self.active_sheet = idx;
            }
        }
        Some(from)
    }

    fn allocate_sheet_id(&mut self) -> SheetId {
        let id = SheetId(self.next_sheet_id);
        self.next_sheet_id += 1;
        id
    }

    fn active_index(&self) -> usize {
        self.active_sheet
    }

    fn set_active_index(&mut self, index: usize) -> bool {
        if index < self.sheets.len() {
            self.active_sheet = index;
            true
        } else {
            false
        }
    }

    fn replace_sheets(&mut self, sheets: Vec<Sheet>) {
        let max_id = sheets.iter().map(|s| s.id.raw()).max().unwrap_or(0);
        self.next_sheet_id = self.next_sheet_id.max(max_id + 1);
        self.sheets = sheets;
        self.active_sheet = 0;
    }
}
