//! Streaming document token reader.

use crate::error::{XmlError, XmlResult};
use crate::escape::unescape;

/// A structural event produced by [`XmlTokenReader`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlToken {
    /// An element start tag.
    StartElement {
        /// Element name.
        name: String,
        /// Attributes in document order, entity references decoded.
        attributes: Vec<(String, String)>,
    },
    /// An element end tag. A self-closing tag produces a start token
    /// immediately followed by an end token.
    EndElement {
        /// Element name.
        name: String,
    },
    /// Character data with entity references decoded. Whitespace-only runs
    /// between markup are not reported.
    Text(String),
}

/// Streaming tokenizer over an in-memory document.
///
/// The reader is an iterator of [`XmlToken`] results: tokens are produced
/// one at a time as the input is scanned, and nothing beyond the current
/// token is materialized. The input may hold a sequence of top-level
/// elements (a fragment sequence); comments, processing instructions and
/// the XML declaration are skipped. Well-formedness is enforced as far as
/// the token stream requires it: closing tags must match the innermost open
/// element, and input ending with unclosed elements is an error.
///
/// After yielding an error the reader is exhausted.
///
/// # Example
///
/// ```
/// use arbordb_xml::{XmlToken, XmlTokenReader};
///
/// let tokens: Vec<_> = XmlTokenReader::new("<greeting>hi</greeting>")
///     .collect::<Result<_, _>>()
///     .unwrap();
/// assert_eq!(tokens.len(), 3);
/// assert!(matches!(&tokens[1], XmlToken::Text(t) if t == "hi"));
/// ```
pub struct XmlTokenReader<'a> {
    input: &'a str,
    pos: usize,
    /// Names of currently open elements, innermost last.
    open: Vec<String>,
    /// End token queued by a self-closing tag.
    pending_end: Option<String>,
    failed: bool,
}

impl<'a> XmlTokenReader<'a> {
    /// Creates a reader over the given document text.
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            open: Vec::new(),
            pending_end: None,
            failed: false,
        }
    }

    fn next_token(&mut self) -> XmlResult<Option<XmlToken>> {
        if let Some(name) = self.pending_end.take() {
            return Ok(Some(XmlToken::EndElement { name }));
        }

        loop {
            let rest = &self.input[self.pos..];
            if rest.is_empty() {
                if let Some(unclosed) = self.open.last() {
                    return Err(XmlError::unexpected_eof(format!(
                        "element <{unclosed}> is not closed"
                    )));
                }
                return Ok(None);
            }

            let text_end = rest.find('<').unwrap_or(rest.len());
            if text_end > 0 {
                let start = self.pos;
                let raw = &rest[..text_end];
                self.pos += text_end;
                if raw.chars().all(char::is_whitespace) {
                    continue;
                }
                if self.open.is_empty() {
                    return Err(XmlError::malformed(start, "text outside of any element"));
                }
                return Ok(Some(XmlToken::Text(unescape(raw)?.into_owned())));
            }

            if let Some(token) = self.read_markup()? {
                return Ok(Some(token));
            }
        }
    }

    /// Reads the markup starting at `pos` (always a `<`). Returns `None`
    /// for skipped constructs (comments, processing instructions).
    fn read_markup(&mut self) -> XmlResult<Option<XmlToken>> {
        let start = self.pos;
        let rest = &self.input[self.pos..];

        if rest.starts_with("</") {
            return self.read_close_tag().map(Some);
        }
        if rest.starts_with("<!--") {
            return match rest[4..].find("-->") {
                Some(end) => {
                    self.pos += 4 + end + 3;
                    Ok(None)
                }
                None => Err(XmlError::unexpected_eof("comment is not terminated")),
            };
        }
        if rest.starts_with("<?") {
            return match rest[2..].find("?>") {
                Some(end) => {
                    self.pos += 2 + end + 2;
                    Ok(None)
                }
                None => Err(XmlError::unexpected_eof(
                    "processing instruction is not terminated",
                )),
            };
        }
        if rest.starts_with("<!") {
            return Err(XmlError::malformed(start, "unsupported markup declaration"));
        }
        self.read_open_tag().map(Some)
    }

    fn read_open_tag(&mut self) -> XmlResult<XmlToken> {
        self.pos += 1; // '<'
        let name = self.read_name()?;
        let mut attributes = Vec::new();

        loop {
            self.skip_whitespace();
            match self.peek() {
                None => {
                    return Err(XmlError::unexpected_eof(format!(
                        "inside start tag <{name}"
                    )))
                }
                Some(b'>') => {
                    self.pos += 1;
                    self.open.push(name.clone());
                    return Ok(XmlToken::StartElement { name, attributes });
                }
                Some(b'/') => {
                    self.pos += 1;
                    self.expect(b'>')?;
                    self.pending_end = Some(name.clone());
                    return Ok(XmlToken::StartElement { name, attributes });
                }
                Some(_) => {
                    let attr_name = self.read_name()?;
                    self.skip_whitespace();
                    self.expect(b'=')?;
                    self.skip_whitespace();
                    let value = self.read_quoted_value()?;
                    attributes.push((attr_name, value));
                }
            }
        }
    }

    fn read_close_tag(&mut self) -> XmlResult<XmlToken> {
        self.pos += 2; // "</"
        let name = self.read_name()?;
        self.skip_whitespace();
        self.expect(b'>')?;

        match self.open.pop() {
            Some(expected) if expected == name => Ok(XmlToken::EndElement { name }),
            Some(expected) => Err(XmlError::MismatchedCloseTag {
                expected,
                found: name,
            }),
            None => Err(XmlError::malformed(
                self.pos,
                format!("closing tag </{name}> with no open element"),
            )),
        }
    }

    fn read_name(&mut self) -> XmlResult<String> {
        let rest = &self.input[self.pos..];
        let end = rest
            .char_indices()
            .find(|&(_, c)| !is_name_char(c))
            .map_or(rest.len(), |(i, _)| i);
        let name = &rest[..end];

        match name.chars().next() {
            Some(first) if is_name_start(first) => {
                self.pos += end;
                Ok(name.to_string())
            }
            Some(_) => Err(XmlError::malformed(self.pos, "invalid name start character")),
            None if rest.is_empty() => Err(XmlError::unexpected_eof("expected a name")),
            None => Err(XmlError::malformed(self.pos, "expected a name")),
        }
    }

    fn read_quoted_value(&mut self) -> XmlResult<String> {
        let quote = match self.peek() {
            Some(q @ (b'"' | b'\'')) => q,
            Some(_) => {
                return Err(XmlError::malformed(
                    self.pos,
                    "attribute value must be quoted",
                ))
            }
            None => return Err(XmlError::unexpected_eof("expected an attribute value")),
        };
        self.pos += 1;

        let rest = &self.input[self.pos..];
        let end = rest
            .find(quote as char)
            .ok_or_else(|| XmlError::unexpected_eof("attribute value is not terminated"))?;
        let value = unescape(&rest[..end])?.into_owned();
        self.pos += end + 1;
        Ok(value)
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn expect(&mut self, byte: u8) -> XmlResult<()> {
        match self.peek() {
            Some(b) if b == byte => {
                self.pos += 1;
                Ok(())
            }
            Some(_) => Err(XmlError::malformed(
                self.pos,
                format!("expected `{}`", byte as char),
            )),
            None => Err(XmlError::unexpected_eof(format!(
                "expected `{}`",
                byte as char
            ))),
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b) if b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == ':'
}

fn is_name_char(c: char) -> bool {
    is_name_start(c) || c.is_numeric() || c == '-' || c == '.'
}

impl Iterator for XmlTokenReader<'_> {
    type Item = XmlResult<XmlToken>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_token() {
            Ok(Some(token)) => Some(Ok(token)),
            Ok(None) => None,
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}
