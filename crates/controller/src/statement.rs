//! Statements: one atomic, invertible mutation of the grid.
//!
//! Every variant carries exactly what it needs to be applied. The runner
//! reads whatever else it needs for the inverse at apply time.

use serde::{Deserialize, Serialize};
use tabula_engine::{Axis, Cell, CellBorder, CellFormat, CellId, Pos, Rect, Sheet, SheetId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    /// Set (`Some`) or clear (`None`) a cell. Code cells with array output
    /// spill; the inverse covers the whole footprint, old and new.
    SetCellValue {
        sheet: SheetId,
        pos: Pos,
        cell: Option<Cell>,
    },
    /// Raw cell writes with no spill layout. This is the inverse form of
    /// `SetCellValue` and also serves bulk pastes.
    RestoreCells {
        sheet: SheetId,
        cells: Vec<(Pos, Option<Cell>)>,
    },
    SetCellFormat {
        sheet: SheetId,
        pos: Pos,
        format: Option<CellFormat>,
    },
    /// Apply one format to every cell of a region.
    SetRegionFormat {
        sheet: SheetId,
        rect: Rect,
        format: Option<CellFormat>,
    },
    RestoreFormats {
        sheet: SheetId,
        formats: Vec<(Pos, Option<CellFormat>)>,
    },
    SetBorder {
        sheet: SheetId,
        pos: Pos,
        border: Option<CellBorder>,
    },
    /// `size: None` returns the heading to the default size.
    ResizeHeading {
        sheet: SheetId,
        axis: Axis,
        index: i64,
        size: Option<f64>,
    },
    /// Insert a complete sheet at a position in the sheet order.
    AddSheet { index: usize, sheet: Box<Sheet> },
    DeleteSheet { sheet: SheetId },
    RenameSheet { sheet: SheetId, name: String },
    MoveSheet { sheet: SheetId, to: usize },
}

impl Statement {
    /// Sheet the statement operates on (for `AddSheet`, the sheet added).
    pub fn sheet_id(&self) -> SheetId {
        match self {
            Statement::SetCellValue { sheet, .. }
            | Statement::RestoreCells { sheet, .. }
            | Statement::SetCellFormat { sheet, .. }
            | Statement::SetRegionFormat { sheet, .. }
            | Statement::RestoreFormats { sheet, .. }
            | Statement::SetBorder { sheet, .. }
            | Statement::ResizeHeading { sheet, .. }
            | Statement::DeleteSheet { sheet }
            | Statement::RenameSheet { sheet, .. }
            | Statement::MoveSheet { sheet, .. } => *sheet,
            Statement::AddSheet { sheet, .. } => sheet.id,
        }
    }

    /// Short label for logs.
    pub fn describe(&self) -> String {
        match self {
            Statement::SetCellValue { sheet, pos, cell: Some(_) } => {
                format!("set cell {}", CellId::new(*sheet, *pos))
            }
            Statement::SetCellValue { sheet, pos, cell: None } => {
                format!("clear cell {}", CellId::new(*sheet, *pos))
            }
            Statement::RestoreCells { sheet, cells } => {
                format!("restore {} cell(s) on {}", cells.len(), sheet)
            }
            Statement::SetCellFormat { sheet, pos, .. } => {
                format!("format {}", CellId::new(*sheet, *pos))
            }
            Statement::SetRegionFormat { sheet, rect, .. } => format!(
                "format {}:{}",
                CellId::new(*sheet, rect.min),
                CellId::new(*sheet, rect.max)
            ),
            Statement::RestoreFormats { sheet, formats } => {
                format!("restore {} format(s) on {}", formats.len(), sheet)
            }
            Statement::SetBorder { sheet, pos, .. } => {
                format!("border {}", CellId::new(*sheet, *pos))
            }
            Statement::ResizeHeading { sheet, axis, index, size } => {
                let size = size.map_or_else(|| "default".to_string(), |s| s.to_string());
                format!("resize {:?} {} on {} to {}", axis, index, sheet, size)
            }
            Statement::AddSheet { index, sheet } => {
                format!("add sheet '{}' ({}) at {}", sheet.name(), sheet.id, index)
            }
            Statement::DeleteSheet { sheet } => format!("delete {}", sheet),
            Statement::RenameSheet { sheet, name } => format!("rename {} to '{}'", sheet, name),
            Statement::MoveSheet { sheet, to } => format!("move {} to {}", sheet, to),
        }
    }
}
