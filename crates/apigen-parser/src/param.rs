//! Parameter parsing
//!
//! Turns one parameter substring, already split on top-level commas, into a
//! [`Parameter`]. Three shapes are recognised, tried in this order:
//!
//! - the variadic marker on its own
//! - an embedded function pointer, `ret (*name)(params)`
//! - `[const] type name [default]`, where `type` may be wrapped in the
//!   reference or array marker and may carry trailing pointer stars

use apigen_core::{
    Field, Function, Location, MarkerConfig, Parameter, ParseError, ParseErrorKind, PrimitiveParam,
};

use crate::declaration::DeclarationParser;
use crate::text::{
    find_top_level_word, is_ident_char, is_identifier, matching_close, split_trailing_ident,
    strip_keyword, strip_trailing_keyword, strip_wrapper, trim_with_offset,
};

/// Parser for a single parameter, field or return value
pub struct ParameterParser<'a> {
    markers: &'a MarkerConfig,
}

impl<'a> ParameterParser<'a> {
    pub fn new(markers: &'a MarkerConfig) -> Self {
        Self { markers }
    }

    /// Parse one parameter; `at` is the location of the first byte of `text`
    pub fn parse(&self, text: &str, at: &Location) -> Result<Parameter, ParseError> {
        let (offset, text) = trim_with_offset(text);
        let at = at.advance(offset);
        let malformed = || ParseError::new(ParseErrorKind::MalformedParameter, at.clone(), text);

        if text.is_empty() {
            return Err(malformed());
        }
        if text == self.markers.variadic {
            return Ok(Parameter::Variadic);
        }
        if let Some(function) = self.function_pointer(text, &at)? {
            return Ok(Parameter::FunctionPointer(Box::new(function)));
        }

        let (decl, default_value) = self.split_default(text).ok_or_else(malformed)?;
        let mut param = self.primitive(decl).ok_or_else(malformed)?;
        param.default_value = default_value;
        Ok(Parameter::Primitive(param))
    }

    /// Parse a struct member declaration (without its `;`).
    ///
    /// Only named, plain-typed members are fields; anything else gives `None`.
    pub fn parse_field(&self, text: &str) -> Option<Field> {
        let param = self.primitive(text.trim())?;
        if param.name.is_empty() || param.is_reference {
            return None;
        }
        Some(Field {
            type_name: param.type_name,
            name: param.name,
            is_const: param.is_const,
            array_depth: param.array_depth,
        })
    }

    /// Recognise `ret (*name)(params)`.
    ///
    /// `Ok(None)` means the text has no function pointer shape at all, while
    /// a text that starts out as one and then breaks off is an error.
    fn function_pointer(&self, text: &str, at: &Location) -> Result<Option<Function>, ParseError> {
        let Some(open) = pointer_group_start(text) else {
            return Ok(None);
        };
        let malformed = || ParseError::new(ParseErrorKind::MalformedParameter, at.clone(), text);

        let close = matching_close(text, open).ok_or_else(malformed)?;
        let inner = text[open + 1..close].trim();
        let name = inner.trim_start_matches('*').trim();
        if !is_identifier(name) {
            return Err(malformed());
        }

        let after = &text[close + 1..];
        let params_open = close + 1 + (after.len() - after.trim_start().len());
        if !text[params_open..].starts_with('(') {
            return Err(malformed());
        }
        let params_close = matching_close(text, params_open).ok_or_else(malformed)?;
        if params_close != text.len() - 1 {
            return Err(malformed());
        }

        let return_text = text[..open].trim();
        if return_text.is_empty() {
            return Err(malformed());
        }

        DeclarationParser::new(self.markers)
            .build(
                return_text,
                name,
                &text[params_open + 1..params_close],
                at,
                &at.advance(params_open + 1),
                text,
            )
            .map(Some)
    }

    /// Separate a trailing default value, written either with the default
    /// marker (`x sk_default(1)`) or as `x = 1`
    fn split_default<'t>(&self, text: &'t str) -> Option<(&'t str, Option<String>)> {
        if let Some(pos) = find_top_level_word(text, &self.markers.default_value) {
            let value = strip_wrapper(&text[pos..], &self.markers.default_value)?;
            if value.is_empty() {
                return None;
            }
            return Some((&text[..pos], Some(value.to_string())));
        }

        if let Some((decl, value)) = split_top_level_assign(text) {
            let value = value.trim();
            if value.is_empty() {
                return None;
            }
            return Some((decl, Some(value.to_string())));
        }

        Some((text, None))
    }

    /// Parse `[const] type [name]` with reference/array wrappers and stars
    fn primitive(&self, decl: &str) -> Option<PrimitiveParam> {
        let decl = decl.trim();
        let (head, ident) = split_trailing_ident(decl);

        let named = !ident.is_empty()
            && ident != self.markers.const_qualifier
            && !head.trim().is_empty()
            && strip_keyword(head.trim(), &self.markers.const_qualifier)
                .map_or(true, |rest| !rest.trim().is_empty());
        let (type_text, name) = if named {
            if !is_identifier(ident) {
                return None;
            }
            (head.trim(), ident)
        } else {
            (decl, "")
        };

        let mut param = PrimitiveParam {
            name: name.to_string(),
            ..Default::default()
        };
        param.type_name = self.qualify(type_text, &mut param)?;
        Some(param)
    }

    /// Strip qualifiers from a type text, recording them on `param`
    fn qualify(&self, type_text: &str, param: &mut PrimitiveParam) -> Option<String> {
        let mut ty = type_text.trim();

        if let Some(rest) = strip_keyword(ty, &self.markers.const_qualifier) {
            param.is_const = true;
            ty = rest.trim_start();
        }
        if let Some(inner) = strip_wrapper(ty, &self.markers.reference) {
            param.is_reference = true;
            ty = inner;
        }
        while let Some(inner) = strip_wrapper(ty, &self.markers.array) {
            param.array_depth += 1;
            ty = inner;
        }
        if let Some(rest) = strip_keyword(ty, &self.markers.const_qualifier) {
            param.is_const = true;
            ty = rest.trim_start();
        }
        // stars, with `const` allowed after any of them (`char* const`)
        loop {
            if let Some(rest) = ty.strip_suffix('*') {
                param.array_depth += 1;
                ty = rest.trim_end();
            } else if let Some(rest) = strip_trailing_keyword(ty, &self.markers.const_qualifier) {
                param.is_const = true;
                ty = rest.trim_end();
            } else {
                break;
            }
        }

        normalize_type_name(ty)
    }
}

/// Start of a `(*name)` group at parenthesis depth zero
fn pointer_group_start(text: &str) -> Option<usize> {
    let mut depth = 0i32;
    for (i, c) in text.char_indices() {
        match c {
            '(' => {
                if depth == 0 && text[i + 1..].trim_start().starts_with('*') {
                    return Some(i);
                }
                depth += 1;
            }
            ')' => depth -= 1,
            _ => {}
        }
    }
    None
}

/// Split `decl = value` on the first `=` outside parentheses
fn split_top_level_assign(text: &str) -> Option<(&str, &str)> {
    let mut depth = 0i32;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            '=' if depth == 0 => return Some((&text[..i], &text[i + 1..])),
            _ => {}
        }
    }
    None
}

/// Collapse whitespace; a type name is one or more identifier words
fn normalize_type_name(text: &str) -> Option<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() || !words.iter().all(|w| w.chars().all(is_ident_char)) {
        return None;
    }
    Some(words.join(" "))
}
