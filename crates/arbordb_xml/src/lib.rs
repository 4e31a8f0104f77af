//! # ArborDB XML
//!
//! Streaming XML tokenization and escaping for ArborDB.
//!
//! This crate provides the parse-side half of ArborDB's document handling:
//! - A pull-based token reader that walks a document without building a tree
//! - Entity escaping and unescaping for text and attribute values
//!
//! ## Token Model
//!
//! - Start and end tags are separate tokens; self-closing tags yield both
//! - Attributes are reported on the start token in document order
//! - Whitespace-only character runs between markup are dropped
//! - Comments, processing instructions and the XML declaration are skipped
//! - A document may hold several top-level elements (a fragment sequence)
//!
//! ## Usage
//!
//! ```
//! use arbordb_xml::{XmlToken, XmlTokenReader};
//!
//! let mut reader = XmlTokenReader::new("<note lang=\"en\">hi</note>");
//!
//! let first = reader.next().unwrap().unwrap();
//! assert!(matches!(first, XmlToken::StartElement { .. }));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod escape;
mod reader;

pub use error::{XmlError, XmlResult};
pub use escape::{escape_attribute, escape_text, unescape};
pub use reader::{XmlToken, XmlTokenReader};
