//! Function declaration parsing
//!
//! Handles one exported declaration line such as
//!
//! ```text
//! SK_API const char *sk_version_name(int32_t major sk_default(0));
//! ```
//!
//! The signature head (return type and name) is split from the parameter
//! list at the last balanced parenthesis group; parameters are split on
//! commas outside parentheses so function pointer parameters keep their own
//! argument lists intact.

use apigen_core::{Function, Location, MarkerConfig, Parameter, ParseError, ParseErrorKind};

use crate::param::ParameterParser;
use crate::text::{matching_open, split_top_level, split_trailing_ident, strip_keyword, trim_with_offset};

/// Parser for exported function declarations
pub struct DeclarationParser<'a> {
    markers: &'a MarkerConfig,
}

impl<'a> DeclarationParser<'a> {
    pub fn new(markers: &'a MarkerConfig) -> Self {
        Self { markers }
    }

    /// Parse a declaration line that starts with the export marker.
    ///
    /// `at` is the location of the first byte of `line`; comments must
    /// already be blanked out.
    pub fn parse(&self, line: &str, at: &Location) -> Result<Function, ParseError> {
        let (lead, trimmed) = trim_with_offset(line);
        let at = at.advance(lead);
        let malformed = || ParseError::new(ParseErrorKind::MalformedDeclaration, at.clone(), trimmed);

        let rest = strip_keyword(trimmed, &self.markers.export_function).ok_or_else(malformed)?;
        let rest_start = trimmed.len() - rest.len();

        let body = rest
            .trim_end()
            .strip_suffix(';')
            .ok_or_else(malformed)?
            .trim_end();
        if !body.ends_with(')') {
            return Err(malformed());
        }
        let close = body.len() - 1;
        let open = matching_open(body, close).ok_or_else(malformed)?;

        let head = &body[..open];
        let (head_lead, head_trimmed) = trim_with_offset(head);
        let (return_text, name) = split_trailing_ident(head_trimmed);
        if name.is_empty() || return_text.trim().is_empty() {
            return Err(malformed());
        }

        let head_at = at.advance(rest_start + head_lead);
        let params_at = at.advance(rest_start + open + 1);
        self.build(
            return_text.trim(),
            name,
            &body[open + 1..close],
            &head_at,
            &params_at,
            trimmed,
        )
    }

    /// Assemble a [`Function`] from its already separated pieces.
    ///
    /// The return type is parsed as a parameter named after the function, so
    /// it gets the same qualifier handling as any argument.
    pub(crate) fn build(
        &self,
        return_text: &str,
        name: &str,
        params_text: &str,
        head_at: &Location,
        params_at: &Location,
        source: &str,
    ) -> Result<Function, ParseError> {
        let params = ParameterParser::new(self.markers);
        let return_value = params.parse(&format!("{} {}", return_text, name), head_at)?;

        Ok(Function {
            name: name.to_string(),
            return_value,
            parameters: self.parse_parameters(params_text, params_at)?,
            is_instance_bound: false,
            source: source.to_string(),
        })
    }

    /// Split a parameter list on top-level commas and parse each piece.
    ///
    /// An empty list, or one consisting only of `void`, has no parameters.
    pub fn parse_parameters(&self, text: &str, at: &Location) -> Result<Vec<Parameter>, ParseError> {
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed == "void" {
            return Ok(Vec::new());
        }

        let params = ParameterParser::new(self.markers);
        split_top_level(text, ',')
            .into_iter()
            .map(|(offset, piece)| params.parse(piece, &at.advance(offset)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apigen_core::PrimitiveParam;
    use pretty_assertions::assert_eq;

    fn parse(line: &str) -> Result<Function, ParseError> {
        let markers = MarkerConfig::default();
        DeclarationParser::new(&markers).parse(line, &Location::line_start("api.h", 1))
    }

    #[test]
    fn test_no_parameters() {
        for line in ["SK_API void sk_shutdown();", "SK_API void   sk_quit   ( );", "SK_API void sk_quit(void);"] {
            let f = parse(line).unwrap();
            assert!(f.parameters.is_empty(), "{}", line);
            assert_eq!(f.return_value.name(), f.name);
            assert_eq!(f.return_type(), Some("void"));
        }
    }

    #[test]
    fn test_pointer_return_type() {
        let f = parse("SK_API const char   *sk_version_name       ();").unwrap();
        assert_eq!(f.name, "sk_version_name");
        let ret = f.return_value.as_primitive().unwrap();
        assert_eq!(ret.type_name, "char");
        assert_eq!(ret.name, "sk_version_name");
        assert!(ret.is_const);
        assert_eq!(ret.array_depth, 1);
    }

    #[test]
    fn test_parameters_in_order() {
        let f = parse("SK_API void time_set_time (double total_seconds, double frame_elapsed_seconds sk_default(0));")
            .unwrap();
        assert_eq!(f.name, "time_set_time");
        assert_eq!(
            f.parameters,
            vec![
                Parameter::Primitive(PrimitiveParam::new("double", "total_seconds")),
                Parameter::Primitive(PrimitiveParam {
                    default_value: Some("0".into()),
                    ..PrimitiveParam::new("double", "frame_elapsed_seconds")
                }),
            ]
        );
        assert_eq!(f.source, "SK_API void time_set_time (double total_seconds, double frame_elapsed_seconds sk_default(0));");
    }

    #[test]
    fn test_function_pointer_commas_do_not_split() {
        let f = parse("SK_API void fn(void (*cb)(int a, int b), int c);").unwrap();
        assert_eq!(f.parameters.len(), 2);
        let cb = f.parameters[0].as_function_pointer().unwrap();
        assert_eq!(cb.name, "cb");
        assert_eq!(cb.parameters.len(), 2);
        assert_eq!(f.parameters[1].name(), "c");
    }

    #[test]
    fn test_variadic_parameter() {
        let f = parse("SK_API void log_infof(const char* text, ...);").unwrap();
        assert_eq!(f.parameters.len(), 2);
        assert!(f.parameters[1].is_variadic());
    }

    #[test]
    fn test_malformed_declarations() {
        for line in [
            "SK_API void sk_init",
            "SK_API void sk_init()",
            "SK_API sk_init();",
            "SK_API void ();",
            "SK_API void sk_init(int a;",
        ] {
            let err = parse(line).unwrap_err();
            assert_eq!(err.kind, ParseErrorKind::MalformedDeclaration, "{}", line);
        }
    }

    #[test]
    fn test_bad_parameter_location() {
        let err = parse("  SK_API void f(int a, float [3]);").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MalformedParameter);
        assert_eq!(err.text, "float [3]");
        assert_eq!(err.location.column, 23);
    }

    #[test]
    fn test_empty_segment_is_error() {
        let err = parse("SK_API void f(int a, , int b);").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MalformedParameter);
    }
}
