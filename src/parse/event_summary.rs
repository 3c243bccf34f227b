use super::error::ParsedNameOrBytes;

use quick_xml::events::BytesEnd;

use std::fmt;

/// Short description of an xml event, used in error messages
#[derive(Debug)]
pub struct EventSummary {
    name: Option<ParsedNameOrBytes>,
    e_type: &'static str,
}

impl fmt::Display for EventSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "element {name} with type {}", self.e_type),
            None => write!(f, "unnamed element with type {}", self.e_type),
        }
    }
}

impl EventSummary {
    pub(crate) fn eof() -> Self {
        Self {
            name: None,
            e_type: "eof",
        }
    }

    pub(crate) fn end(bytes: &BytesEnd<'_>) -> Self {
        Self {
            name: Some(ParsedNameOrBytes::from(bytes.name())),
            e_type: "end",
        }
    }
}
