//! Block accumulators for multi-line struct and enum bodies
//!
//! An accumulator is fed one line at a time until a line containing `}` is
//! seen. The content in front of the brace on that closing line is still
//! processed, so a body written on a single line is legal.

use apigen_core::{
    Enum, EnumConstant, EnumExpr, EnumExprKind, Location, MarkerConfig, ParseError, ParseErrorKind,
    TypeDef,
};
use tracing::debug;

use crate::param::ParameterParser;
use crate::text::{is_identifier, split_leading_ident, split_top_level, trim_with_offset};

/// State of an accumulator after it consumed a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    Open,
    Closed,
}

/// Part of a body line before the closing brace, and whether it closed
fn body_content(line: &str) -> (&str, Feed) {
    match line.find('}') {
        Some(end) => (&line[..end], Feed::Closed),
        None => (line, Feed::Open),
    }
}

/// Skip everything up to and including the opening brace
fn after_open_brace<'l>(line: &'l str, opened: &mut bool) -> Option<(usize, &'l str)> {
    if *opened {
        return Some((0, line));
    }
    let start = line.find('{')?;
    *opened = true;
    Some((start + 1, &line[start + 1..]))
}

/// Collects the fields of one struct body
pub struct AggregateAccumulator<'a> {
    markers: &'a MarkerConfig,
    ty: TypeDef,
    opened: bool,
}

impl<'a> AggregateAccumulator<'a> {
    pub fn new(markers: &'a MarkerConfig, ty: TypeDef) -> Self {
        Self {
            markers,
            ty,
            opened: false,
        }
    }

    /// Consume one (comment-free) body line.
    ///
    /// Members are `<type> <name>;` statements; anything else on the line,
    /// such as array members or nested declarations, is skipped.
    pub fn feed(&mut self, line: &str) -> Feed {
        let Some((_, line)) = after_open_brace(line, &mut self.opened) else {
            return Feed::Open;
        };
        let (content, state) = body_content(line);

        let params = ParameterParser::new(self.markers);
        let mut statements = content.split(';').collect::<Vec<_>>();
        // text after the last `;` is not a finished member
        statements.pop();

        for statement in statements {
            let statement = statement.trim();
            if statement.is_empty() {
                continue;
            }
            match params.parse_field(statement) {
                Some(field) => self.ty.fields.push(field),
                None => debug!("Skipping member of {}: {}", self.ty.name, statement),
            }
        }

        state
    }

    pub fn finish(self) -> TypeDef {
        self.ty
    }
}

/// Collects the constants of one enum body
pub struct EnumAccumulator {
    item: Enum,
    opened: bool,
}

impl EnumAccumulator {
    pub fn new(item: Enum) -> Self {
        Self {
            item,
            opened: false,
        }
    }

    /// Consume one (comment-free) body line; `at` locates the line's first
    /// byte. Malformed constants are reported to `errors` and skipped.
    pub fn feed(&mut self, line: &str, at: &Location, errors: &mut Vec<ParseError>) -> Feed {
        let Some((skipped, line)) = after_open_brace(line, &mut self.opened) else {
            return Feed::Open;
        };
        let at = at.advance(skipped);
        let (content, state) = body_content(line);

        for (offset, segment) in split_top_level(content, ',') {
            let (lead, segment) = trim_with_offset(segment);
            if segment.is_empty() {
                continue;
            }
            match parse_constant(segment) {
                Some(constant) => self.item.constants.push(constant),
                None => errors.push(ParseError::new(
                    ParseErrorKind::MalformedEnumConstant,
                    at.advance(offset + lead),
                    segment,
                )),
            }
        }

        state
    }

    pub fn finish(self) -> Enum {
        self.item
    }
}

/// Parse `name [= expression]`
fn parse_constant(segment: &str) -> Option<EnumConstant> {
    let (name, rest) = split_leading_ident(segment);
    if !is_identifier(name) {
        return None;
    }

    let rest = rest.trim();
    let value = if rest.is_empty() {
        None
    } else {
        let text = rest.strip_prefix('=')?.trim();
        if text.is_empty() {
            return None;
        }
        Some(EnumExpr {
            text: text.to_string(),
            kind: classify_expr(text),
        })
    };

    Some(EnumConstant {
        name: name.to_string(),
        value,
    })
}

/// Classify an enum value expression.
///
/// `|`-joined integer terms fold to one integer, `|`-joined names stay a
/// list of names; mixtures and anything else are left unresolved.
pub fn classify_expr(text: &str) -> EnumExprKind {
    let terms: Vec<&str> = text.split('|').map(str::trim).collect();

    let integers: Option<Vec<i64>> = terms.iter().map(|t| integer_term(t)).collect();
    if let Some(values) = integers {
        return EnumExprKind::Integer(values.into_iter().fold(0, |acc, v| acc | v));
    }

    if terms.iter().all(|t| is_identifier(t)) {
        return EnumExprKind::BitOr(terms.iter().map(|t| t.to_string()).collect());
    }

    EnumExprKind::Unresolved
}

/// Integer literal or `literal << literal`, optionally parenthesised
fn integer_term(term: &str) -> Option<i64> {
    let term = term.trim();
    if let Some(inner) = term.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
        return integer_term(inner);
    }
    if let Some((lhs, rhs)) = term.split_once("<<") {
        let shift = u32::try_from(integer_literal(rhs.trim())?).ok()?;
        return integer_literal(lhs.trim())?.checked_shl(shift).filter(|_| shift < 63);
    }
    integer_literal(term)
}

fn integer_literal(text: &str) -> Option<i64> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, text),
    };
    let digits = digits.trim_end_matches(['u', 'U', 'l', 'L']);

    let value = if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()?
    } else if let Some(bin) = digits.strip_prefix("0b").or_else(|| digits.strip_prefix("0B")) {
        i64::from_str_radix(bin, 2).ok()?
    } else if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
        digits.parse().ok()?
    } else {
        return None;
    };

    Some(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use apigen_core::Field;
    use pretty_assertions::assert_eq;

    fn at() -> Location {
        Location::line_start("api.h", 1)
    }

    fn feed_enum(lines: &[&str]) -> (Enum, Vec<ParseError>, Vec<Feed>) {
        let mut acc = EnumAccumulator::new(Enum::new("e_", at()));
        let mut errors = Vec::new();
        let states = lines.iter().map(|l| acc.feed(l, &at(), &mut errors)).collect();
        (acc.finish(), errors, states)
    }

    #[test]
    fn test_enum_one_line_body() {
        let (e, errors, states) = feed_enum(&["{ a, b, c = 10, d }"]);
        assert!(errors.is_empty());
        assert_eq!(states, vec![Feed::Closed]);
        let pairs: Vec<(&str, Option<&str>)> =
            e.constants.iter().map(|c| (c.name.as_str(), c.expression())).collect();
        assert_eq!(pairs, vec![("a", None), ("b", None), ("c", Some("10")), ("d", None)]);
        assert_eq!(e.resolve(), vec![Some(0), Some(1), Some(10), Some(11)]);
    }

    #[test]
    fn test_enum_multi_line_body() {
        let (e, errors, states) = feed_enum(&[
            "{",
            "\tdisplay_blend_none            = 0,",
            "\tdisplay_blend_opaque          = 1 << 0,",
            "\tdisplay_blend_additive        = 1 << 1,",
            "",
            "\tdisplay_blend_any_transparent = display_blend_opaque | display_blend_additive,",
            "} display_blend_;",
        ]);
        assert!(errors.is_empty());
        assert_eq!(states.last(), Some(&Feed::Closed));
        assert!(states[..states.len() - 1].iter().all(|s| *s == Feed::Open));
        assert_eq!(e.constants.len(), 4);
        assert_eq!(e.constants[1].value.as_ref().unwrap().kind, EnumExprKind::Integer(1));
        assert_eq!(
            e.constants[3].value.as_ref().unwrap().kind,
            EnumExprKind::BitOr(vec!["display_blend_opaque".into(), "display_blend_additive".into()])
        );
        assert_eq!(e.resolve(), vec![Some(0), Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn test_enum_lines_before_brace_are_ignored() {
        let (e, errors, _) = feed_enum(&["", "{ x,", "y }"]);
        assert!(errors.is_empty());
        assert_eq!(e.constants.len(), 2);
    }

    #[test]
    fn test_enum_malformed_constant() {
        let (e, errors, _) = feed_enum(&["{", "  good, 3bad, also_good = ,", "}"]);
        assert_eq!(e.constants.len(), 1);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].kind, ParseErrorKind::MalformedEnumConstant);
        assert_eq!(errors[0].text, "3bad");
        assert_eq!(errors[0].location.column, 8);
        assert_eq!(errors[1].text, "also_good =");
    }

    #[test]
    fn test_classify_expr() {
        assert_eq!(classify_expr("10"), EnumExprKind::Integer(10));
        assert_eq!(classify_expr("0x10"), EnumExprKind::Integer(16));
        assert_eq!(classify_expr("-1"), EnumExprKind::Integer(-1));
        assert_eq!(classify_expr("1 << 5"), EnumExprKind::Integer(32));
        assert_eq!(classify_expr("(1 << 1) | (1 << 2)"), EnumExprKind::Integer(6));
        assert_eq!(classify_expr("0x7FFFFFFF"), EnumExprKind::Integer(0x7FFF_FFFF));
        assert_eq!(
            classify_expr("tex_type_image_nomips | tex_type_mips"),
            EnumExprKind::BitOr(vec!["tex_type_image_nomips".into(), "tex_type_mips".into()])
        );
        assert_eq!(classify_expr("other_"), EnumExprKind::BitOr(vec!["other_".into()]));
        assert_eq!(classify_expr("a | 4"), EnumExprKind::Unresolved);
        assert_eq!(classify_expr("sizeof(int)"), EnumExprKind::Unresolved);
    }

    #[test]
    fn test_aggregate_fields() {
        let markers = MarkerConfig::default();
        let mut acc = AggregateAccumulator::new(&markers, TypeDef::aggregate("sk_settings_t", at()));
        let lines = [
            "{",
            "\tconst char    *app_name;",
            "",
            "\tdisplay_mode_  display_preference;",
            "\tfloat m[16];",
            "\tint32_t a; int32_t b;",
            "} sk_settings_t;",
        ];
        let states: Vec<Feed> = lines.iter().map(|l| acc.feed(l)).collect();
        assert_eq!(states.last(), Some(&Feed::Closed));

        let ty = acc.finish();
        assert_eq!(
            ty.fields,
            vec![
                Field {
                    type_name: "char".into(),
                    name: "app_name".into(),
                    is_const: true,
                    array_depth: 1,
                },
                Field::new("display_mode_", "display_preference"),
                Field::new("int32_t", "a"),
                Field::new("int32_t", "b"),
            ]
        );
    }

    #[test]
    fn test_aggregate_one_line_body() {
        let markers = MarkerConfig::default();
        let mut acc = AggregateAccumulator::new(&markers, TypeDef::aggregate("vec2", at()));
        assert_eq!(acc.feed("{ float x; float y; } vec2;"), Feed::Closed);
        assert_eq!(acc.finish().fields, vec![Field::new("float", "x"), Field::new("float", "y")]);
    }
}
