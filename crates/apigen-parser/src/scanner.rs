//! Line-oriented header scanner
//!
//! One forward pass over the header. Each line either feeds the active block
//! accumulator or is classified by its leading marker:
//!
//! - export marker: a function declaration
//! - enum-start marker: opens an enum block
//! - struct-start marker: opens a struct block
//! - private-type marker: an opaque handle type
//!
//! Everything else is inert. Errors are collected per line and the scan
//! carries on with the next line.

use apigen_core::{
    Config, Enum, Error, Function, Location, ParseError, ParseErrorKind, Result, TypeDef,
};
use regex::Regex;
use tracing::{debug, warn};

use crate::accumulator::{AggregateAccumulator, EnumAccumulator, Feed};
use crate::declaration::DeclarationParser;
use crate::text::{strip_comments, strip_keyword};

/// Raw collections produced by one scan, before association
#[derive(Debug, Default)]
pub struct ScanOutput {
    pub enums: Vec<Enum>,
    /// Types in declaration order, the global pseudo-type first
    pub types: Vec<TypeDef>,
    pub functions: Vec<Function>,
    pub errors: Vec<ParseError>,
}

/// Classification of a line outside any block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Function,
    EnumStart,
    StructStart,
    PrivateType,
    Inert,
}

/// The block currently being read
enum Active<'a> {
    Enum {
        acc: EnumAccumulator,
        start: ParseError,
    },
    Aggregate {
        acc: AggregateAccumulator<'a>,
        start: ParseError,
    },
}

/// Header scanner
pub struct HeaderScanner<'a> {
    config: &'a Config,
    file: String,
    enum_name: Regex,
    struct_name: Regex,
    private_name: Regex,
}

impl<'a> HeaderScanner<'a> {
    /// Create a scanner for `file` using the configured markers
    pub fn new(config: &'a Config, file: impl Into<String>) -> Result<Self> {
        let markers = &config.markers;
        let block_name = |marker: &str| {
            Regex::new(&format!(r"^{}\s+(\w+)", regex::escape(marker)))
                .map_err(|e| Error::Config(e.to_string()))
        };

        Ok(Self {
            config,
            file: file.into(),
            enum_name: block_name(&markers.enum_start)?,
            struct_name: block_name(&markers.struct_start)?,
            private_name: Regex::new(&format!(
                r"^{}\s*\(\s*(\w+)\s*\)",
                regex::escape(&markers.private_type)
            ))
            .map_err(|e| Error::Config(e.to_string()))?,
        })
    }

    /// Classify a comment-free line by its leading marker
    pub fn classify(&self, line: &str) -> LineKind {
        let markers = &self.config.markers;
        let line = line.trim_start();
        if strip_keyword(line, &markers.export_function).is_some() {
            LineKind::Function
        } else if strip_keyword(line, &markers.enum_start).is_some() {
            LineKind::EnumStart
        } else if strip_keyword(line, &markers.struct_start).is_some() {
            LineKind::StructStart
        } else if strip_keyword(line, &markers.private_type).is_some() {
            LineKind::PrivateType
        } else {
            LineKind::Inert
        }
    }

    /// Scan the whole header
    pub fn scan(&self, source: &str) -> ScanOutput {
        let mut out = ScanOutput::default();
        out.types
            .push(TypeDef::global(self.config.association.global_type.clone()));

        let mut active: Option<Active<'a>> = None;
        let mut in_comment = false;

        for (index, raw) in source.lines().enumerate() {
            let line = strip_comments(raw, &mut in_comment);
            let at = Location::line_start(self.file.clone(), index as u32 + 1);

            if let Some(block) = active.as_mut() {
                let state = match block {
                    Active::Enum { acc, .. } => acc.feed(&line, &at, &mut out.errors),
                    Active::Aggregate { acc, .. } => acc.feed(&line),
                };
                if state == Feed::Closed {
                    if let Some(block) = active.take() {
                        self.close(block, &mut out);
                    }
                }
                continue;
            }

            active = self.start_line(&line, &at, &mut out);
        }

        if let Some(block) = active {
            let start = match &block {
                Active::Enum { start, .. } | Active::Aggregate { start, .. } => start.clone(),
            };
            out.errors.push(start);
            self.close(block, &mut out);
        }

        for err in &out.errors {
            warn!("{}", err);
        }

        debug!(
            "Scanned {}: {} functions, {} enums, {} types, {} errors",
            self.file,
            out.functions.len(),
            out.enums.len(),
            out.types.len(),
            out.errors.len()
        );
        out
    }

    /// Handle a line outside any block, returning a newly opened block
    fn start_line(&self, line: &str, at: &Location, out: &mut ScanOutput) -> Option<Active<'a>> {
        let lead = line.len() - line.trim_start().len();
        let text = line.trim();
        let at = at.advance(lead);
        let error = |kind| ParseError::new(kind, at.clone(), text);

        match self.classify(line) {
            LineKind::Function => {
                match DeclarationParser::new(&self.config.markers).parse(text, &at) {
                    Ok(func) => {
                        debug!("Found function: {}", func.name);
                        out.functions.push(func);
                    }
                    Err(err) => out.errors.push(err),
                }
                None
            }
            LineKind::EnumStart => {
                let Some(name) = self.block_name(&self.enum_name, text) else {
                    out.errors.push(error(ParseErrorKind::MalformedEnumHeader));
                    return None;
                };
                if is_forward_declaration(text) {
                    debug!("Skipping forward enum declaration: {}", name);
                    return None;
                }
                debug!("Found enum: {}", name);
                let mut acc = EnumAccumulator::new(Enum::new(name, at.clone()));
                let state = acc.feed(text, &at, &mut out.errors);
                let block = Active::Enum {
                    acc,
                    start: error(ParseErrorKind::UnterminatedBlock),
                };
                self.opened(block, state, out)
            }
            LineKind::StructStart => {
                let Some(name) = self.block_name(&self.struct_name, text) else {
                    out.errors.push(error(ParseErrorKind::MalformedStructHeader));
                    return None;
                };
                if is_forward_declaration(text) {
                    debug!("Skipping forward struct declaration: {}", name);
                    return None;
                }
                debug!("Found struct: {}", name);
                let config: &'a Config = self.config;
                let mut acc =
                    AggregateAccumulator::new(&config.markers, TypeDef::aggregate(name, at.clone()));
                let state = acc.feed(text);
                let block = Active::Aggregate {
                    acc,
                    start: error(ParseErrorKind::UnterminatedBlock),
                };
                self.opened(block, state, out)
            }
            LineKind::PrivateType => {
                match self.private_name.captures(text).and_then(|c| c.get(1)) {
                    Some(name) => {
                        debug!("Found private type: {}", name.as_str());
                        out.types.push(TypeDef::opaque(name.as_str(), at.clone()));
                    }
                    None => out.errors.push(error(ParseErrorKind::MalformedOpaqueType)),
                }
                None
            }
            LineKind::Inert => None,
        }
    }

    /// Keep a freshly started block open, or close it if its start line
    /// already carried the closing brace
    fn opened(&self, block: Active<'a>, state: Feed, out: &mut ScanOutput) -> Option<Active<'a>> {
        match state {
            Feed::Open => Some(block),
            Feed::Closed => {
                self.close(block, out);
                None
            }
        }
    }

    fn close(&self, block: Active<'a>, out: &mut ScanOutput) {
        match block {
            Active::Enum { acc, .. } => out.enums.push(acc.finish()),
            Active::Aggregate { acc, .. } => out.types.push(acc.finish()),
        }
    }

    fn block_name(&self, pattern: &Regex, text: &str) -> Option<String> {
        pattern
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    }
}

/// `typedef struct _foo *foo;` and similar lines open no block
fn is_forward_declaration(text: &str) -> bool {
    !text.contains('{') && text.ends_with(';')
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn scan(source: &str) -> ScanOutput {
        let config = Config::default();
        HeaderScanner::new(&config, "api.h").unwrap().scan(source)
    }

    #[test]
    fn test_classify_requires_whole_marker() {
        let config = Config::default();
        let scanner = HeaderScanner::new(&config, "api.h").unwrap();
        assert_eq!(scanner.classify("SK_API void f();"), LineKind::Function);
        assert_eq!(scanner.classify("  SK_API void f();"), LineKind::Function);
        assert_eq!(scanner.classify("SK_API_S void f();"), LineKind::Inert);
        assert_eq!(scanner.classify("typedef enum a_ {"), LineKind::EnumStart);
        assert_eq!(scanner.classify("typedef struct a {"), LineKind::StructStart);
        assert_eq!(scanner.classify("SK_DeclarePrivateType(mesh_t);"), LineKind::PrivateType);
        assert_eq!(scanner.classify("#define SK_API extern"), LineKind::Inert);
        assert_eq!(scanner.classify(""), LineKind::Inert);
    }

    #[test]
    fn test_global_type_comes_first() {
        let out = scan("");
        assert_eq!(out.types.len(), 1);
        assert!(out.types[0].is_global);
        assert_eq!(out.types[0].name, "sk");
    }

    #[test]
    fn test_blocks_and_declarations_in_order() {
        let out = scan(
            "typedef struct vec2 {\n\
             \tfloat x;\n\
             \tfloat y;\n\
             } vec2;\n\
             SK_DeclarePrivateType(mesh_t);\n\
             typedef enum log_ {\n\
             \tlog_none = 0,\n\
             \tlog_inform,\n\
             } log_;\n\
             SK_API void log_write(log_ level, const char *text);\n",
        );
        assert!(out.errors.is_empty(), "{:?}", out.errors);
        let names: Vec<&str> = out.types.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["sk", "vec2", "mesh_t"]);
        assert_eq!(out.types[1].fields.len(), 2);
        assert!(out.types[2].is_opaque);
        assert_eq!(out.enums.len(), 1);
        assert_eq!(out.enums[0].constants.len(), 2);
        assert_eq!(out.functions.len(), 1);
        assert_eq!(out.functions[0].name, "log_write");
    }

    #[test]
    fn test_marker_lines_inside_block_feed_the_block() {
        let out = scan("typedef struct a {\nSK_API void f();\n} a;\n");
        assert!(out.functions.is_empty());
        assert_eq!(out.types.len(), 2);
    }

    #[test]
    fn test_whole_block_on_start_line() {
        let out = scan("typedef enum e_ { e_a, e_b = 4 } e_;\nSK_API void after();\n");
        assert!(out.errors.is_empty());
        assert_eq!(out.enums[0].constants.len(), 2);
        assert_eq!(out.functions.len(), 1);
    }

    #[test]
    fn test_forward_typedef_is_inert() {
        let out = scan("typedef struct _mesh_t *mesh_t;\nSK_API void f();\n");
        assert!(out.errors.is_empty());
        assert_eq!(out.types.len(), 1);
        assert_eq!(out.functions.len(), 1);
    }

    #[test]
    fn test_comments_are_ignored() {
        let out = scan(
            "// SK_API void commented();\n\
             /* SK_API void block(\n\
             SK_API void still_block(); */\n\
             SK_API void gradient_release(gradient_t gradient); // TODO v0.4, rename\n",
        );
        assert!(out.errors.is_empty(), "{:?}", out.errors);
        assert_eq!(out.functions.len(), 1);
        assert_eq!(out.functions[0].name, "gradient_release");
    }

    #[test]
    fn test_header_errors() {
        let out = scan(
            "typedef enum {\n\
             typedef struct {\n\
             SK_DeclarePrivateType();\n\
             SK_API void broken(float [2]);\n\
             SK_API void fine();\n",
        );
        let kinds: Vec<ParseErrorKind> = out.errors.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ParseErrorKind::MalformedEnumHeader,
                ParseErrorKind::MalformedStructHeader,
                ParseErrorKind::MalformedOpaqueType,
                ParseErrorKind::MalformedParameter,
            ]
        );
        let lines: Vec<u32> = out.errors.iter().map(|e| e.location.line).collect();
        assert_eq!(lines, vec![1, 2, 3, 4]);
        assert_eq!(out.functions.len(), 1);
    }

    #[test]
    fn test_unterminated_block() {
        let out = scan("SK_API void a();\ntypedef enum e_ {\n\te_x,\n");
        assert_eq!(out.errors.len(), 1);
        let err = &out.errors[0];
        assert_eq!(err.kind, ParseErrorKind::UnterminatedBlock);
        assert_eq!(err.location.line, 2);
        assert_eq!(err.text, "typedef enum e_ {");
        assert_eq!(out.enums[0].constants.len(), 1);
    }
}
