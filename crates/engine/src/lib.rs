pub mod cell;
pub mod events;
pub mod file;
pub mod pos;
pub mod sheet;
pub mod store;
pub mod workbook;

pub use cell::{Cell, CellBorder, CellFormat, CellValue, CodeCell, CodeLanguage, CodeResult};
pub use pos::{Axis, CellId, Pos, Rect};
pub use sheet::{Sheet, SheetId};
pub use store::GridStore;
pub use workbook::Workbook;
