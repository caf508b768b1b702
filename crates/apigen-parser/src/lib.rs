//! APIGen Parser
//!
//! Reads a marker-annotated C API header and builds the [`Ir`] that binding
//! backends consume.
//!
//! ## Modules
//!
//! - `scanner` - Single forward pass classifying header lines
//! - `declaration` - Function declaration and parameter list parsing
//! - `param` - Single parameter parsing (qualifiers, callbacks, defaults)
//! - `accumulator` - Struct and enum body accumulation
//! - `association` - Function-to-type association

pub mod accumulator;
pub mod association;
pub mod declaration;
pub mod param;
pub mod scanner;
mod text;

use apigen_core::{Config, Error, Ir, ParseError, ParseErrors, Result};
use std::path::Path;
use tracing::info;

pub use accumulator::{AggregateAccumulator, EnumAccumulator, Feed};
pub use association::AssociationResolver;
pub use declaration::DeclarationParser;
pub use param::ParameterParser;
pub use scanner::{HeaderScanner, LineKind, ScanOutput};

/// Parse result containing the IR and every error met along the way
#[derive(Debug, Default, Clone)]
pub struct ParseResult {
    /// The API surface found in the header
    pub ir: Ir,
    /// Parse errors; a result with errors must not be used as-is
    pub errors: Vec<ParseError>,
}

impl ParseResult {
    /// No parse errors were collected
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// The IR, or every collected error when there were any
    pub fn into_ir(self) -> Result<Ir> {
        if self.errors.is_empty() {
            Ok(self.ir)
        } else {
            Err(Error::Parse(ParseErrors(self.errors)))
        }
    }
}

/// Parser trait for header front ends
pub trait Parser: Send + Sync {
    /// Parse header text; `filename` labels error locations
    fn parse(&self, source: &str, filename: &str) -> Result<ParseResult>;

    /// Parse a header file
    fn parse_file(&self, path: &Path) -> Result<ParseResult> {
        let source = std::fs::read_to_string(path)?;
        let filename = path.to_string_lossy();
        self.parse(&source, &filename)
    }

    /// Get parser name
    fn name(&self) -> &str;
}

/// Marker-driven header parser
#[derive(Debug, Clone, Default)]
pub struct HeaderParser {
    config: Config,
}

impl HeaderParser {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Parser for HeaderParser {
    fn parse(&self, source: &str, filename: &str) -> Result<ParseResult> {
        let scanner = HeaderScanner::new(&self.config, filename)?;
        let ScanOutput {
            enums,
            mut types,
            mut functions,
            errors,
        } = scanner.scan(source);

        AssociationResolver::new(&self.config.association).resolve(&mut types, &mut functions);

        info!(
            "Parsed {}: {} functions, {} types, {} enums, {} errors",
            filename,
            functions.len(),
            types.len(),
            enums.len(),
            errors.len()
        );

        Ok(ParseResult {
            ir: Ir {
                enums,
                types,
                functions,
            },
            errors,
        })
    }

    fn name(&self) -> &str {
        "marker-header"
    }
}

/// Get a parser using the default StereoKit markers
pub fn get_parser() -> Box<dyn Parser> {
    Box::new(HeaderParser::default())
}
