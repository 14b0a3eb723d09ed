//! Grid coordinates.
//!
//! The grid is unbounded in both directions: `x` is the column and `y` the
//! row, and either may be negative. A `CellId` pins a position to a sheet.

use serde::{Deserialize, Serialize};

use crate::sheet::SheetId;

/// A cell position on a sheet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pos {
    pub x: i64,
    pub y: i64,
}

impl Pos {
    #[inline]
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Offset this position by a column/row delta. Saturates at the edge of
    /// the coordinate space.
    #[inline]
    pub fn offset(self, dx: i64, dy: i64) -> Self {
        Self { x: self.x.saturating_add(dx), y: self.y.saturating_add(dy) }
    }
}

impl From<(i64, i64)> for Pos {
    fn from((x, y): (i64, i64)) -> Self {
        Self { x, y }
    }
}

/// Inclusive rectangle of positions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub min: Pos,
    pub max: Pos,
}

impl Rect {
    pub fn single(pos: Pos) -> Self {
        Self { min: pos, max: pos }
    }

    /// Rectangle spanning two corners, in any order.
    pub fn new_span(a: Pos, b: Pos) -> Self {
        Self {
            min: Pos::new(a.x.min(b.x), a.y.min(b.y)),
            max: Pos::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// Rectangle of `width` x `height` cells anchored at `origin`.
    /// Zero dimensions are treated as one. A rectangle that would run past
    /// `i64::MAX` is clipped there.
    pub fn from_origin(origin: Pos, width: usize, height: usize) -> Self {
        let w = i64::try_from(width.max(1)).unwrap_or(i64::MAX);
        let h = i64::try_from(height.max(1)).unwrap_or(i64::MAX);
        Self { min: origin, max: origin.offset(w - 1, h - 1) }
    }

    pub fn width(&self) -> usize {
        span(self.min.x, self.max.x)
    }

    pub fn height(&self) -> usize {
        span(self.min.y, self.max.y)
    }

    pub fn len(&self) -> usize {
        self.width().saturating_mul(self.height())
    }

    pub fn contains(&self, pos: Pos) -> bool {
        pos.x >= self.min.x && pos.x <= self.max.x && pos.y >= self.min.y && pos.y <= self.max.y
    }

    /// Smallest rectangle covering both.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            min: Pos::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Pos::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    /// Grow to include `pos`.
    pub fn extend_to(&mut self, pos: Pos) {
        *self = self.union(&Rect::single(pos));
    }

    /// Positions in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = Pos> + '_ {
        let (min, max) = (self.min, self.max);
        (min.y..=max.y).flat_map(move |y| (min.x..=max.x).map(move |x| Pos::new(x, y)))
    }
}

/// Cells in `min..=max`, saturating at `usize::MAX`.
fn span(min: i64, max: i64) -> usize {
    let cells = i128::from(max) - i128::from(min) + 1;
    usize::try_from(cells).unwrap_or(usize::MAX)
}

/// Heading axis for column widths and row heights.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    Column,
    Row,
}

/// Unique identifier for a cell in a workbook.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CellId {
    /// The sheet this cell belongs to (stable, never reused after deletion)
    pub sheet: SheetId,
    pub pos: Pos,
}

impl CellId {
    #[inline]
    pub fn new(sheet: SheetId, pos: Pos) -> Self {
        Self { sheet, pos }
    }
}

impl std::fmt::Display for CellId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sheet{}!{}", self.sheet.raw(), pos_to_a1(self.pos))
    }
}

/// A1-style label for a position. Negative coordinates keep their sign:
/// column -1 is `-A`, row -1 is `-1`.
pub fn pos_to_a1(pos: Pos) -> String {
    let col = if pos.x < 0 {
        format!("-{}", col_to_letters(pos.x.unsigned_abs() - 1))
    } else {
        col_to_letters(pos.x as u64)
    };
    let row = if pos.y < 0 { i128::from(pos.y) } else { i128::from(pos.y) + 1 };
    format!("{}{}", col, row)
}

/// Convert 0-based column index to Excel-style letter(s).
fn col_to_letters(col: u64) -> String {
    let mut result = String::new();
    let mut n = col;
    loop {
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    result
}
