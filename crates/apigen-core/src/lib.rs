//! APIGen Core
//!
//! IR types, errors and configuration shared by the header parser and the
//! binding backends that consume its output.

pub mod config;
pub mod error;
pub mod location;
pub mod types;

pub use config::{AssociationConfig, Config, MarkerConfig};
pub use error::{Error, ParseError, ParseErrorKind, ParseErrors, Result};
pub use location::Location;
pub use types::*;
