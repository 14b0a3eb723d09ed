use serde::{Deserialize, Serialize};

use crate::pos::Pos;

/// Horizontal text alignment
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

/// Number format type
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum NumberFormat {
    #[default]
    General,
    Number { decimals: u8 },
    Currency { decimals: u8 },
    Percent { decimals: u8 },
}

/// Cell formatting options
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CellFormat {
    pub bold: bool,
    pub italic: bool,
    pub wrapping: bool,
    pub alignment: Alignment,
    pub number_format: NumberFormat,
    pub text_color: Option<String>,
    pub fill_color: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum BorderType {
    #[default]
    Line1,
    Line2,
    Line3,
    Dotted,
    Dashed,
    Double,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BorderStyle {
    pub color: Option<String>,
    pub border_type: BorderType,
}

/// Borders drawn around a single cell
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CellBorder {
    pub top: Option<BorderStyle>,
    pub bottom: Option<BorderStyle>,
    pub left: Option<BorderStyle>,
    pub right: Option<BorderStyle>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CodeLanguage {
    Python,
    Formula,
    Javascript,
}

/// Result produced by the external evaluation engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum CodeResult {
    Single(String),
    /// Rows of values; row 0 starts at the code cell itself.
    Array(Vec<Vec<String>>),
    Error(String),
}

impl CodeResult {
    /// (width, height) of the area this result occupies.
    pub fn shape(&self) -> (usize, usize) {
        match self {
            CodeResult::Array(rows) => {
                let height = rows.len().max(1);
                let width = rows.iter().map(|r| r.len()).max().unwrap_or(0).max(1);
                (width, height)
            }
            CodeResult::Single(_) | CodeResult::Error(_) => (1, 1),
        }
    }

    /// Value at an offset from the origin, if the result has one there.
    pub fn value_at(&self, dx: usize, dy: usize) -> Option<&str> {
        match self {
            CodeResult::Array(rows) => rows.get(dy).and_then(|r| r.get(dx)).map(String::as_str),
            CodeResult::Single(v) if dx == 0 && dy == 0 => Some(v.as_str()),
            CodeResult::Single(_) => None,
            CodeResult::Error(_) => None,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, CodeResult::Array(_))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CodeOutput {
    pub std_out: String,
    pub std_err: Option<String>,
    pub result: CodeResult,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CodeCell {
    pub language: CodeLanguage,
    pub code: String,
    /// Output of the last evaluation; `None` until the engine has run it.
    pub output: Option<CodeOutput>,
}

impl CodeCell {
    pub fn new(language: CodeLanguage, code: impl Into<String>) -> Self {
        Self { language, code: code.into(), output: None }
    }

    pub fn with_result(mut self, result: CodeResult) -> Self {
        self.output = Some(CodeOutput {
            std_out: String::new(),
            std_err: None,
            result,
        });
        self
    }

    /// Area the output spills over, or `None` for scalar / missing output.
    pub fn spill_shape(&self) -> Option<(usize, usize)> {
        match &self.output {
            Some(output) if output.result.is_array() => Some(output.result.shape()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Code(CodeCell),
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Text(String::new())
    }
}

impl CellValue {
    /// Parse raw input. Only the absence of a cell means "cleared"; an
    /// empty string stays a text value.
    pub fn from_input(input: &str) -> Self {
        let trimmed = input.trim();

        if !trimmed.is_empty() {
            if let Ok(num) = trimmed.parse::<f64>() {
                if num.is_finite() {
                    return CellValue::Number(num);
                }
            }
        }

        CellValue::Text(input.to_string())
    }

    pub fn display(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            CellValue::Code(code) => match &code.output {
                Some(CodeOutput { result: CodeResult::Error(_), .. }) => "#ERR".to_string(),
                Some(output) => output.result.value_at(0, 0).unwrap_or_default().to_string(),
                None => String::new(),
            },
        }
    }

    pub fn as_code(&self) -> Option<&CodeCell> {
        match self {
            CellValue::Code(code) => Some(code),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Cell {
    pub value: CellValue,
    /// If this cell receives spill data, points to the code cell that produced it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spill_parent: Option<Pos>,
    /// If this code cell's array output is blocked, the first blocking position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spill_error: Option<Pos>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
}

impl Cell {
    pub fn new(value: CellValue) -> Self {
        Self { value, ..Self::default() }
    }

    pub fn text(s: impl Into<String>) -> Self {
        Self::new(CellValue::Text(s.into()))
    }

    pub fn number(n: f64) -> Self {
        Self::new(CellValue::Number(n))
    }

    pub fn from_input(input: &str) -> Self {
        Self::new(CellValue::from_input(input))
    }

    pub fn code(code: CodeCell) -> Self {
        Self::new(CellValue::Code(code))
    }

    /// A computed cell written by a spill from `origin`.
    pub fn spilled(origin: Pos, raw: &str) -> Self {
        Self {
            value: CellValue::from_input(raw),
            spill_parent: Some(origin),
            ..Self::default()
        }
    }

    pub fn with_last_modified(mut self, stamp: impl Into<String>) -> Self {
        self.last_modified = Some(stamp.into());
        self
    }

    /// Check if this cell is receiving spill data from another cell
    pub fn is_spill_receiver(&self) -> bool {
        self.spill_parent.is_some()
    }

    /// Check if this cell has a blocked spill error
    pub fn has_spill_error(&self) -> bool {
        self.spill_error.is_some()
    }

    pub fn display(&self) -> String {
        if self.spill_error.is_some() {
            return "#SPILL!".to_string();
        }
        self.value.display()
    }
}
