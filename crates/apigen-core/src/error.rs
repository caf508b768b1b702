//! Error types for APIGen

use crate::location::Location;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What went wrong while reading one declaration
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseErrorKind {
    #[error("malformed parameter")]
    MalformedParameter,

    #[error("malformed function declaration")]
    MalformedDeclaration,

    #[error("enum header has no name")]
    MalformedEnumHeader,

    #[error("struct header has no name")]
    MalformedStructHeader,

    #[error("private type declaration has no name")]
    MalformedOpaqueType,

    #[error("malformed enum constant")]
    MalformedEnumConstant,

    #[error("block is never closed")]
    UnterminatedBlock,
}

/// A parse error tied to the header text that caused it
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{location}: {kind}: `{text}`")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub location: Location,
    /// The offending source text
    pub text: String,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, location: Location, text: impl Into<String>) -> Self {
        Self {
            kind,
            location,
            text: text.into(),
        }
    }
}

/// Every error collected over one parse
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseErrors(pub Vec<ParseError>);

impl ParseErrors {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ParseError> {
        self.0.iter()
    }
}

impl std::fmt::Display for ParseErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} parse error(s)", self.0.len())?;
        for err in &self.0 {
            write!(f, "\n  {}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseErrors {}

/// APIGen error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Parse(ParseErrors),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Result type alias for APIGen
pub type Result<T> = std::result::Result<T, Error>;
