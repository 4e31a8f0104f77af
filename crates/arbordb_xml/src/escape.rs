//! Escaping and entity decoding.
//!
//! Text content escapes `&`, `<` and `>`; attribute values additionally
//! escape `"` (values are always serialized with double quotes). Decoding
//! accepts the five predefined entities plus decimal and hexadecimal
//! character references.

use crate::error::{XmlError, XmlResult};
use std::borrow::Cow;

/// Escapes a string for use as element text content.
#[must_use]
pub fn escape_text(raw: &str) -> Cow<'_, str> {
    escape(raw, false)
}

/// Escapes a string for use as a double-quoted attribute value.
#[must_use]
pub fn escape_attribute(raw: &str) -> Cow<'_, str> {
    escape(raw, true)
}

fn escape(raw: &str, quote: bool) -> Cow<'_, str> {
    let needs_escape = |c: char| matches!(c, '&' | '<' | '>') || (quote && c == '"');

    if !raw.chars().any(needs_escape) {
        return Cow::Borrowed(raw);
    }

    let mut out = String::with_capacity(raw.len() + 8);
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if quote => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    Cow::Owned(out)
}

/// Decodes entity references in raw character data.
///
/// Returns `Cow::Borrowed` when the input contains no references.
///
/// # Errors
///
/// Returns an error for a bare `&`, an unterminated reference, or an
/// unrecognized entity name.
pub fn unescape(raw: &str) -> XmlResult<Cow<'_, str>> {
    if !raw.contains('&') {
        return Ok(Cow::Borrowed(raw));
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let semi = after.find(';').ok_or_else(|| XmlError::UnknownEntity {
            name: after.chars().take(12).collect(),
        })?;
        let name = &after[..semi];
        out.push(decode_entity(name)?);
        rest = &after[semi + 1..];
    }
    out.push_str(rest);
    Ok(Cow::Owned(out))
}

fn decode_entity(name: &str) -> XmlResult<char> {
    match name {
        "amp" => Ok('&'),
        "lt" => Ok('<'),
        "gt" => Ok('>'),
        "quot" => Ok('"'),
        "apos" => Ok('\''),
        _ => {
            let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()
            } else if let Some(dec) = name.strip_prefix('#') {
                dec.parse::<u32>().ok()
            } else {
                None
            };
            code.and_then(char::from_u32)
                .ok_or_else(|| XmlError::UnknownEntity {
                    name: name.to_string(),
                })
        }
    }
}
