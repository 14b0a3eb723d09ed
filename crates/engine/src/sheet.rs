use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::cell::{Cell, CellBorder, CellFormat};
use crate::pos::{Axis, Pos, Rect};

pub const DEFAULT_COLUMN_WIDTH: f64 = 100.0;
pub const DEFAULT_ROW_HEIGHT: f64 = 20.0;

/// Stable sheet identity. Assigned by the workbook, never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SheetId(pub u64);

impl SheetId {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SheetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sheet#{}", self.0)
    }
}

/// Normalize a sheet name for case-insensitive comparison
pub fn normalize_sheet_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// A sheet name is valid if it is non-empty after trimming
pub fn is_valid_sheet_name(name: &str) -> bool {
    !name.trim().is_empty()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub id: SheetId,
    name: String,
    #[serde(default, with = "pos_map")]
    cells: FxHashMap<Pos, Cell>,
    #[serde(default, with = "pos_map")]
    formats: FxHashMap<Pos, CellFormat>,
    #[serde(default, with = "pos_map")]
    borders: FxHashMap<Pos, CellBorder>,
    /// Explicit column widths; absent means DEFAULT_COLUMN_WIDTH
    #[serde(default)]
    columns: BTreeMap<i64, f64>,
    /// Explicit row heights; absent means DEFAULT_ROW_HEIGHT
    #[serde(default)]
    rows: BTreeMap<i64, f64>,
}

impl Sheet {
    pub fn new(id: SheetId, name: &str) -> Self {
        Self {
            id,
            name: name.trim().to_string(),
            cells: FxHashMap::default(),
            formats: FxHashMap::default(),
            borders: FxHashMap::default(),
            columns: BTreeMap::new(),
            rows: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the sheet, returning the previous name.
    pub fn set_name(&mut self, name: &str) -> String {
        std::mem::replace(&mut self.name, name.trim().to_string())
    }

    // =========================================================================
    // Cells
    // =========================================================================

    pub fn cell(&self, pos: Pos) -> Option<&Cell> {
        self.cells.get(&pos)
    }

    pub fn display(&self, pos: Pos) -> String {
        self.cells.get(&pos).map(Cell::display).unwrap_or_default()
    }

    /// Raw write. No spill handling; returns the previous cell.
    pub fn set_cell(&mut self, pos: Pos, cell: Cell) -> Option<Cell> {
        self.cells.insert(pos, cell)
    }

    /// Raw remove; returns the previous cell.
    pub fn clear_cell(&mut self, pos: Pos) -> Option<Cell> {
        self.cells.remove(&pos)
    }

    /// Raw write of an optional cell (`None` clears).
    pub fn write_cell(&mut self, pos: Pos, cell: Option<Cell>) -> Option<Cell> {
        match cell {
            Some(cell) => self.set_cell(pos, cell),
            None => self.clear_cell(pos),
        }
    }

    /// Populated cells within a rectangle, in row-major order
    pub fn cells_in_rect(&self, rect: Rect) -> Vec<(Pos, &Cell)> {
        let mut found: Vec<(Pos, &Cell)> = if rect.len() <= self.cells.len() {
            rect.iter()
                .filter_map(|pos| self.cells.get(&pos).map(|c| (pos, c)))
                .collect()
        } else {
            self.cells
                .iter()
                .filter(|(pos, _)| rect.contains(**pos))
                .map(|(pos, c)| (*pos, c))
                .collect()
        };
        found.sort_by_key(|(pos, _)| (pos.y, pos.x));
        found
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty() && self.formats.is_empty() && self.borders.is_empty()
    }

    /// Bounding rectangle of all populated cells
    pub fn bounds(&self) -> Option<Rect> {
        let mut positions = self.cells.keys();
        let first = *positions.next()?;
        let mut rect = Rect::single(first);
        for pos in positions {
            rect.extend_to(*pos);
        }
        Some(rect)
    }

    // =========================================================================
    // Formats and borders
    // =========================================================================

    pub fn format(&self, pos: Pos) -> Option<&CellFormat> {
        self.formats.get(&pos)
    }

    /// Set or clear a cell format, returning the previous one.
    pub fn set_format(&mut self, pos: Pos, format: Option<CellFormat>) -> Option<CellFormat> {
        match format {
            Some(format) => self.formats.insert(pos, format),
            None => self.formats.remove(&pos),
        }
    }

    pub fn border(&self, pos: Pos) -> Option<&CellBorder> {
        self.borders.get(&pos)
    }

    pub fn set_border(&mut self, pos: Pos, border: Option<CellBorder>) -> Option<CellBorder> {
        match border {
            Some(border) => self.borders.insert(pos, border),
            None => self.borders.remove(&pos),
        }
    }

    // =========================================================================
    // Headings
    // =========================================================================

    /// Explicit heading size, or `None` when the default applies
    pub fn heading_size(&self, axis: Axis, index: i64) -> Option<f64> {
        self.headings(axis).get(&index).copied()
    }

    pub fn effective_heading_size(&self, axis: Axis, index: i64) -> f64 {
        self.heading_size(axis, index).unwrap_or(match axis {
            Axis::Column => DEFAULT_COLUMN_WIDTH,
            Axis::Row => DEFAULT_ROW_HEIGHT,
        })
    }

    /// Set an explicit size (`None` restores the default), returning the
    /// previous explicit size.
    pub fn set_heading_size(&mut self, axis: Axis, index: i64, size: Option<f64>) -> Option<f64> {
        let headings = match axis {
            Axis::Column => &mut self.columns,
            Axis::Row => &mut self.rows,
        };
        match size {
            Some(size) => headings.insert(index, size),
            None => headings.remove(&index),
        }
    }

    fn headings(&self, axis: Axis) -> &BTreeMap<i64, f64> {
        match axis {
            Axis::Column => &self.columns,
            Axis::Row => &self.rows,
        }
    }

    // =========================================================================
    // Spill Management
    // =========================================================================

    /// Area currently covered by the output of the code cell at `origin`.
    /// `None` unless the cell holds array output that actually spilled.
    pub fn spill_footprint(&self, origin: Pos) -> Option<Rect> {
        let cell = self.cells.get(&origin)?;
        if cell.spill_error.is_some() {
            return None;
        }
        let (width, height) = cell.value.as_code()?.spill_shape()?;
        Some(Rect::from_origin(origin, width, height))
    }

    /// Area a cell would cover if placed at `origin`.
    pub fn intended_footprint(origin: Pos, cell: &Cell) -> Rect {
        match cell.value.as_code().and_then(|code| code.spill_shape()) {
            Some((width, height)) => Rect::from_origin(origin, width, height),
            None => Rect::single(origin),
        }
    }

    /// Clear spill data originating from a specific cell. Receivers that
    /// have since been overwritten by other edits are left alone.
    pub fn clear_spill_from(&mut self, origin: Pos) -> Option<Rect> {
        let footprint = self.spill_footprint(origin)?;
        for pos in footprint.iter() {
            if pos == origin {
                continue;
            }
            let owned = self
                .cells
                .get(&pos)
                .is_some_and(|c| c.spill_parent == Some(origin));
            if owned {
                self.cells.remove(&pos);
            }
        }
        Some(footprint)
    }

    /// Check if spill from `origin` over `footprint` would collide.
    /// Returns the first blocking position in row-major order.
    pub fn check_spill_collision(&self, origin: Pos, footprint: Rect) -> Result<(), Pos> {
        for pos in footprint.iter() {
            if pos == origin {
                continue;
            }
            if let Some(cell) = self.cells.get(&pos) {
                if cell.spill_parent != Some(origin) {
                    return Err(pos);
                }
            }
        }
        Ok(())
    }

    /// Write (or clear) a user cell at `pos`, laying out array output.
    ///
    /// Any spill previously produced from `pos` is removed first. A spill
    /// that would overwrite an unrelated cell is blocked and recorded in
    /// `spill_error` instead. Returns the area that changed.
    pub fn place_cell(&mut self, pos: Pos, cell: Option<Cell>) -> Rect {
        let mut dirty = Rect::single(pos);
        if let Some(old) = self.clear_spill_from(pos) {
            dirty = dirty.union(&old);
        }

        let Some(mut cell) = cell else {
            self.cells.remove(&pos);
            return dirty;
        };

        cell.spill_parent = None;
        cell.spill_error = None;
        let footprint = Self::intended_footprint(pos, &cell);
        let result = cell
            .value
            .as_code()
            .and_then(|code| code.output.as_ref())
            .filter(|output| output.result.is_array())
            .map(|output| output.result.clone());

        let Some(result) = result else {
            self.cells.insert(pos, cell);
            return dirty;
        };

        if let Err(blocked_by) = self.check_spill_collision(pos, footprint) {
            cell.spill_error = Some(blocked_by);
            self.cells.insert(pos, cell);
            return dirty;
        }

        self.cells.insert(pos, cell);
        for target in footprint.iter() {
            if target == pos {
                continue;
            }
            let dx = target.x.abs_diff(pos.x) as usize;
            let dy = target.y.abs_diff(pos.y) as usize;
            if let Some(value) = result.value_at(dx, dy) {
                self.cells.insert(target, Cell::spilled(pos, value));
            }
        }
        dirty.union(&footprint)
    }

    /// Check if a cell is receiving spill data
    pub fn is_spill_receiver(&self, pos: Pos) -> bool {
        self.cells.get(&pos).is_some_and(Cell::is_spill_receiver)
    }

    /// Check if a cell has a spill error
    pub fn has_spill_error(&self, pos: Pos) -> bool {
        self.cells.get(&pos).is_some_and(Cell::has_spill_error)
    }
}

/// Serialize position-keyed maps as sorted `[pos, value]` lists; JSON object
/// keys must be strings.
mod pos_map {
    use rustc_hash::FxHashMap;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::pos::Pos;

    pub fn serialize<S, T>(map: &FxHashMap<Pos, T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        let mut entries: Vec<(&Pos, &T)> = map.iter().collect();
        entries.sort_by_key(|(pos, _)| (pos.y, pos.x));
        serializer.collect_seq(entries)
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<FxHashMap<Pos, T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        let entries: Vec<(Pos, T)> = Vec::deserialize(deserializer)?;
        Ok(entries.into_iter().collect())
    }
}
