//! Error types for the XML crate.

use thiserror::Error;

/// Result type for XML operations.
pub type XmlResult<T> = Result<T, XmlError>;

/// Errors that can occur while tokenizing a document.
#[derive(Debug, Error)]
pub enum XmlError {
    /// Input ended inside markup or with unclosed elements.
    #[error("unexpected end of input: {context}")]
    UnexpectedEof {
        /// What the reader was in the middle of.
        context: String,
    },

    /// Structurally invalid markup.
    #[error("malformed markup at byte {offset}: {message}")]
    Malformed {
        /// Byte offset into the input where the fault was detected.
        offset: usize,
        /// Description of the fault.
        message: String,
    },

    /// A closing tag did not match the innermost open element.
    #[error("mismatched closing tag: expected </{expected}>, found </{found}>")]
    MismatchedCloseTag {
        /// Name of the innermost open element.
        expected: String,
        /// Name found in the closing tag.
        found: String,
    },

    /// An entity reference that is not recognized.
    #[error("unknown entity reference: &{name};")]
    UnknownEntity {
        /// The entity name, without the surrounding `&`/`;`.
        name: String,
    },
}

impl XmlError {
    /// Creates an unexpected-EOF error.
    pub fn unexpected_eof(context: impl Into<String>) -> Self {
        Self::UnexpectedEof {
            context: context.into(),
        }
    }

    /// Creates a malformed-markup error.
    pub fn malformed(offset: usize, message: impl Into<String>) -> Self {
        Self::Malformed {
            offset,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = XmlError::MismatchedCloseTag {
            expected: "a".into(),
            found: "b".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("</a>"));
        assert!(msg.contains("</b>"));
    }

    #[test]
    fn malformed_carries_offset() {
        let err = XmlError::malformed(17, "bare ampersand");
        assert!(err.to_string().contains("17"));
    }
}
