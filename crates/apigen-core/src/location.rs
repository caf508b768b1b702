//! Source location types

use serde::{Deserialize, Serialize};

/// A position inside a header file
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// File path (or a label for in-memory sources)
    pub file: String,
    /// Line (1-based)
    pub line: u32,
    /// Column as a byte offset into the line (0-based)
    pub column: u32,
}

impl Location {
    /// Create a new location
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }

    /// Location of the first byte of a line
    pub fn line_start(file: impl Into<String>, line: u32) -> Self {
        Self::new(file, line, 0)
    }

    /// The location `bytes` further along the same line
    pub fn advance(&self, bytes: usize) -> Self {
        Self {
            file: self.file.clone(),
            line: self.line,
            column: self.column.saturating_add(u32::try_from(bytes).unwrap_or(u32::MAX)),
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}
