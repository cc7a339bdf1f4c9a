//! XML adaptor: an owned element tree with line tracking, XInclude support,
//! and a writer that round-trips through the parser.

mod element;
mod error;
mod parser;
mod writer;

pub use element::XmlElement;
pub use error::{Result, XmlError};
pub use parser::{parse_file, parse_str};
pub use writer::to_xml_string;
