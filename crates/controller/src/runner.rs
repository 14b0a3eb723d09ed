//! Applies one statement to the grid and produces its inverse.
//!
//! Everything a statement references is resolved before the first write,
//! so a statement that fails leaves the grid exactly as it was.

use rustc_hash::FxHashSet;
use tabula_engine::sheet::is_valid_sheet_name;
use tabula_engine::{Cell, CellFormat, GridStore, Pos, Rect, Sheet, SheetId};

use crate::error::RunError;
use crate::statement::Statement;
use crate::summary::TransactionSummary;

/// Apply `statement` to `grid`, record what changed in `summary`, and
/// return the statement that undoes it.
pub fn run_statement<G: GridStore + ?Sized>(
    grid: &mut G,
    statement: &Statement,
    summary: &mut TransactionSummary,
) -> Result<Statement, RunError> {
    match statement {
        Statement::SetCellValue { sheet, pos, cell } => {
            let target = sheet_mut(grid, *sheet)?;

            // Old spill, new spill and the cell itself. Snapshotting all of it
            // lets a raw restore put back receivers and displaced cells alike.
            // Only the footprints' own cells are kept, never their bounding box.
            let mut footprints = vec![Rect::single(*pos)];
            footprints.extend(target.spill_footprint(*pos));
            if let Some(cell) = cell {
                footprints.push(Sheet::intended_footprint(*pos, cell));
            }
            let mut positions: Vec<Pos> = footprints
                .iter()
                .flat_map(|rect| rect.iter())
                .collect::<FxHashSet<Pos>>()
                .into_iter()
                .collect();
            positions.sort_by_key(|p| (p.y, p.x));
            let before: Vec<(Pos, Option<Cell>)> =
                positions.into_iter().map(|p| (p, target.cell(p).cloned())).collect();

            target.place_cell(*pos, cell.clone());
            for rect in footprints {
                summary.cells_dirty(*sheet, rect);
            }

            Ok(Statement::RestoreCells { sheet: *sheet, cells: before })
        }

        Statement::RestoreCells { sheet, cells } => {
            let target = sheet_mut(grid, *sheet)?;
            let mut dirty: Option<Rect> = None;
            let mut before = Vec::with_capacity(cells.len());
            for (pos, cell) in cells {
                before.push((*pos, target.write_cell(*pos, cell.clone())));
                extend(&mut dirty, *pos);
            }
            if let Some(rect) = dirty {
                summary.cells_dirty(*sheet, rect);
            }
            // Later writes to a repeated position must be undone first
            before.reverse();
            Ok(Statement::RestoreCells { sheet: *sheet, cells: before })
        }

        Statement::SetCellFormat { sheet, pos, format } => {
            let target = sheet_mut(grid, *sheet)?;
            let prev = target.set_format(*pos, format.clone());
            summary.cells_dirty(*sheet, Rect::single(*pos));
            Ok(Statement::SetCellFormat { sheet: *sheet, pos: *pos, format: prev })
        }

        Statement::SetRegionFormat { sheet, rect, format } => {
            let target = sheet_mut(grid, *sheet)?;
            let before: Vec<(Pos, Option<CellFormat>)> = rect
                .iter()
                .map(|p| (p, target.set_format(p, format.clone())))
                .collect();
            summary.cells_dirty(*sheet, *rect);
            Ok(Statement::RestoreFormats { sheet: *sheet, formats: before })
        }

        Statement::RestoreFormats { sheet, formats } => {
            let target = sheet_mut(grid, *sheet)?;
            let mut dirty: Option<Rect> = None;
            let mut before = Vec::with_capacity(formats.len());
            for (pos, format) in formats {
                before.push((*pos, target.set_format(*pos, format.clone())));
                extend(&mut dirty, *pos);
            }
            if let Some(rect) = dirty {
                summary.cells_dirty(*sheet, rect);
            }
            before.reverse();
            Ok(Statement::RestoreFormats { sheet: *sheet, formats: before })
        }

        Statement::SetBorder { sheet, pos, border } => {
            let target = sheet_mut(grid, *sheet)?;
            let prev = target.set_border(*pos, border.clone());
            summary.cells_dirty(*sheet, Rect::single(*pos));
            Ok(Statement::SetBorder { sheet: *sheet, pos: *pos, border: prev })
        }

        Statement::ResizeHeading { sheet, axis, index, size } => {
            if let Some(size) = size {
                if !size.is_finite() || *size < 0.0 {
                    return Err(RunError::InvalidHeadingSize(*size));
                }
            }
            let target = sheet_mut(grid, *sheet)?;
            let prev = target.set_heading_size(*axis, *index, *size);
            summary.headings_dirty(*sheet, *axis);
            Ok(Statement::ResizeHeading { sheet: *sheet, axis: *axis, index: *index, size: prev })
        }

        Statement::AddSheet { index, sheet } => {
            if grid.sheet(sheet.id).is_some() {
                return Err(RunError::DuplicateSheet(sheet.id));
            }
            if !is_valid_sheet_name(sheet.name()) {
                return Err(RunError::EmptySheetName);
            }
            let len = grid.sheet_count();
            if *index > len {
                return Err(RunError::SheetIndexOutOfRange { index: *index, len });
            }
            grid.insert_sheet(*index, (**sheet).clone());
            summary.sheets_changed();
            Ok(Statement::DeleteSheet { sheet: sheet.id })
        }

        Statement::DeleteSheet { sheet } => {
            if grid.sheet(*sheet).is_none() {
                return Err(RunError::SheetNotFound(*sheet));
            }
            if grid.sheet_count() <= 1 {
                return Err(RunError::LastSheet);
            }
            let (index, removed) = grid
                .remove_sheet(*sheet)
                .ok_or(RunError::SheetNotFound(*sheet))?;
            summary.sheets_changed();
            Ok(Statement::AddSheet { index, sheet: Box::new(removed) })
        }

        Statement::RenameSheet { sheet, name } => {
            if !is_valid_sheet_name(name) {
                return Err(RunError::EmptySheetName);
            }
            let target = sheet_mut(grid, *sheet)?;
            let prev = target.set_name(name);
            summary.sheets_changed();
            Ok(Statement::RenameSheet { sheet: *sheet, name: prev })
        }

        Statement::MoveSheet { sheet, to } => {
            if grid.sheet(*sheet).is_none() {
                return Err(RunError::SheetNotFound(*sheet));
            }
            let len = grid.sheet_count();
            if *to >= len {
                return Err(RunError::SheetIndexOutOfRange { index: *to, len });
            }
            let from = grid
                .move_sheet(*sheet, *to)
                .ok_or(RunError::SheetNotFound(*sheet))?;
            summary.sheets_changed();
            Ok(Statement::MoveSheet { sheet: *sheet, to: from })
        }
    }
}

fn sheet_mut<G: GridStore + ?Sized>(grid: &mut G, id: SheetId) -> Result<&mut Sheet, RunError> {
    grid.sheet_mut(id).ok_or(RunError::SheetNotFound(id))
}

fn extend(dirty: &mut Option<Rect>, pos: Pos) {
    match dirty {
        Some(rect) => rect.extend_to(pos),
        None => *dirty = Some(Rect::single(pos)),
    }
}
