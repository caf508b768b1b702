//! Character-level helpers shared by the scanner and the declaration parsers
//!
//! Everything here works on byte offsets so callers can turn a position in a
//! sub-slice back into a column of the original line.

pub(crate) fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// A non-empty identifier that does not start with a digit
pub(crate) fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => chars.all(is_ident_char),
        _ => false,
    }
}

/// Trim both ends, returning the number of bytes dropped from the front
pub(crate) fn trim_with_offset(text: &str) -> (usize, &str) {
    let start = text.len() - text.trim_start().len();
    (start, text.trim())
}

/// Strip `keyword` from the front of `text` when it stands as a whole word
pub(crate) fn strip_keyword<'t>(text: &'t str, keyword: &str) -> Option<&'t str> {
    if keyword.is_empty() {
        return None;
    }
    let rest = text.strip_prefix(keyword)?;
    match rest.chars().next() {
        Some(c) if is_ident_char(c) => None,
        _ => Some(rest),
    }
}

/// Strip `keyword` from the end of `text` when it stands as a whole word
pub(crate) fn strip_trailing_keyword<'t>(text: &'t str, keyword: &str) -> Option<&'t str> {
    if keyword.is_empty() {
        return None;
    }
    let rest = text.strip_suffix(keyword)?;
    match rest.chars().next_back() {
        Some(c) if is_ident_char(c) => None,
        _ => Some(rest),
    }
}

/// Index of the `)` closing the `(` at `open`
pub(crate) fn matching_close(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in text[open..].char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Index of the `(` opening the `)` at `close`
pub(crate) fn matching_open(text: &str, close: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in text[..=close].char_indices().rev() {
        match c {
            ')' => depth += 1,
            '(' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Unwrap `marker(inner)` when the wrapper spans the whole text
pub(crate) fn strip_wrapper<'t>(text: &'t str, marker: &str) -> Option<&'t str> {
    let rest = strip_keyword(text, marker)?;
    let open = text.len() - rest.trim_start().len();
    if !text[open..].starts_with('(') {
        return None;
    }
    let close = matching_close(text, open)?;
    if close != text.len() - 1 {
        return None;
    }
    Some(text[open + 1..close].trim())
}

/// Split on `sep` wherever it is not nested inside parentheses.
///
/// Each piece comes with its byte offset into `text`. Text without any
/// separator yields a single piece, empty text yields one empty piece.
pub(crate) fn split_top_level(text: &str, sep: char) -> Vec<(usize, &str)> {
    let mut pieces = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;

    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            c if c == sep && depth == 0 => {
                pieces.push((start, &text[start..i]));
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    pieces.push((start, &text[start..]));
    pieces
}

/// Byte index of the first top-level occurrence of `needle` as a whole word
pub(crate) fn find_top_level_word(text: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    let mut depth = 0i32;
    let mut prev: Option<char> = None;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            _ => {}
        }
        if depth == 0
            && text[i..].starts_with(needle)
            && !prev.is_some_and(is_ident_char)
            && strip_keyword(&text[i..], needle).is_some()
        {
            return Some(i);
        }
        prev = Some(c);
    }
    None
}

/// Split off the identifier at the very end of `text`.
///
/// Returns `(head, identifier)`; the identifier is empty when `text` does
/// not end in identifier characters.
pub(crate) fn split_trailing_ident(text: &str) -> (&str, &str) {
    let start = text
        .char_indices()
        .rev()
        .take_while(|(_, c)| is_ident_char(*c))
        .last()
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    (&text[..start], &text[start..])
}

/// Leading identifier of `text` and whatever follows it
pub(crate) fn split_leading_ident(text: &str) -> (&str, &str) {
    let end = text
        .char_indices()
        .find(|(_, c)| !is_ident_char(*c))
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    (&text[..end], &text[end..])
}

/// Blank out comments on one line, keeping every other byte in place.
///
/// `in_block` carries an open `/* ... */` comment across lines. String and
/// character literals are left alone.
pub(crate) fn strip_comments(line: &str, in_block: &mut bool) -> String {
    let bytes = line.as_bytes();
    let mut out = String::with_capacity(line.len());
    let mut quote: Option<u8> = None;
    let mut i = 0;

    while i < bytes.len() {
        if *in_block {
            if bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/') {
                *in_block = false;
                out.push_str("  ");
                i += 2;
            } else {
                out.push(' ');
                i += 1;
            }
            continue;
        }

        match (quote, bytes[i]) {
            (Some(_), b'\\') if i + 1 < bytes.len() => {
                let width = 1 + line[i + 1..].chars().next().map_or(1, char::len_utf8);
                out.push_str(&line[i..i + width]);
                i += width;
                continue;
            }
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, b'"') | (None, b'\'') => quote = Some(bytes[i]),
            (None, b'/') if bytes.get(i + 1) == Some(&b'/') => break,
            (None, b'/') if bytes.get(i + 1) == Some(&b'*') => {
                *in_block = true;
                out.push_str("  ");
                i += 2;
                continue;
            }
            _ => {}
        }

        let width = line[i..].chars().next().map_or(1, char::len_utf8);
        out.push_str(&line[i..i + width]);
        i += width;
    }

    out
}
