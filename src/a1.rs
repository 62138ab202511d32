use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RangeParseError {
    #[error("range is empty")]
    Empty,
    #[error("sheet name before '!' is empty in range {0:?}")]
    EmptySheetName(String),
    #[error("cell reference after '!' is empty in range {0:?}")]
    EmptyCells(String),
    #[error("invalid cell reference {0:?}")]
    InvalidCells(String),
    #[error("malformed range {0:?}")]
    Malformed(String),
}

/// A range in A1 notation: an optional sheet (or named range) and an
/// optional cell part, at least one of which is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct A1Range {
    pub sheet: Option<String>,
    pub cells: Option<String>,
}

fn qualified() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?P<sheet>'(?:[^']|'')*'|[^'!]*)!(?P<cells>.*)$").expect("valid regex")
    })
}

fn endpoint() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\$?(?P<col>[A-Za-z]{1,3})?\$?(?P<row>[0-9]+)?$").expect("valid regex")
    })
}

fn plain_name() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:'(?:[^']|'')+'|[^'!]+)$").expect("valid regex"))
}

impl A1Range {
    pub fn parse(input: &str) -> Result<Self, RangeParseError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(RangeParseError::Empty);
        }

        if let Some(caps) = qualified().captures(input) {
            let sheet = unquote(&caps["sheet"]);
            if sheet.is_empty() {
                return Err(RangeParseError::EmptySheetName(input.to_string()));
            }
            let cells = &caps["cells"];
            if cells.is_empty() {
                return Err(RangeParseError::EmptyCells(input.to_string()));
            }
            validate_cells(cells)?;
            return Ok(A1Range {
                sheet: Some(sheet),
                cells: Some(cells.to_string()),
            });
        }

        if validate_cells(input).is_ok() {
            return Ok(A1Range {
                sheet: None,
                cells: Some(input.to_string()),
            });
        }

        if plain_name().is_match(input) {
            return Ok(A1Range {
                sheet: Some(unquote(input)),
                cells: None,
            });
        }

        Err(RangeParseError::Malformed(input.to_string()))
    }
}

fn validate_cells(cells: &str) -> Result<(), RangeParseError> {
    let parts: Vec<&str> = cells.split(':').collect();
    if parts.len() > 2 {
        return Err(RangeParseError::InvalidCells(cells.to_string()));
    }

    for part in parts {
        let valid = endpoint()
            .captures(part)
            .map_or(false, |caps| caps.name("col").is_some() || caps.name("row").is_some());
        if !valid {
            return Err(RangeParseError::InvalidCells(cells.to_string()));
        }
    }
    Ok(())
}

fn unquote(sheet: &str) -> String {
    match sheet.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
        Some(inner) => inner.replace("''", "'"),
        None => sheet.to_string(),
    }
}

fn needs_quotes(sheet: &str) -> bool {
    !sheet.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl fmt::Display for A1Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(sheet) = &self.sheet {
            if needs_quotes(sheet) {
                write!(f, "'{}'", sheet.replace('\'', "''"))?;
            } else {
                write!(f, "{}", sheet)?;
            }
            if self.cells.is_some() {
                write!(f, "!")?;
            }
        }
        if let Some(cells) = &self.cells {
            write!(f, "{}", cells)?;
        }
        Ok(())
    }
}
