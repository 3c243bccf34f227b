use crate::prelude::*;

use super::event_summary::EventSummary;

use crate::NumericType;

use quick_xml::name::QName;

/// Every way reading a VTK XML file can fail. All of them abort the read of the file.
#[derive(Debug, thiserror::Error, From)]
pub enum ParseError {
    #[error("malformed xml document: {0}")]
    Document(Document),
    #[error("structural error: {0}")]
    Structural(Structural),
    #[error("unsupported format: {0}")]
    Unsupported(Unsupported),
    #[error("failed to decode array: {0}")]
    Decode(Decode),
    #[error("array has the wrong shape: {0}")]
    DataShape(Shape),
}

impl From<DataShape> for ParseError {
    fn from(x: DataShape) -> Self {
        ParseError::DataShape(Shape::from(x))
    }
}

//
// Document
//

#[derive(Debug, thiserror::Error, From)]
pub enum Document {
    #[error("{0}")]
    MalformedXml(MalformedXml),
    #[error("{0}")]
    MalformedAttribute(MalformedAttribute),
    #[error("{0}")]
    InvalidUtf8(InvalidUtf8),
    #[error("{0}")]
    UnexpectedElement(UnexpectedElement),
    #[error("{0}")]
    EmptyDocument(EmptyDocument),
}

#[derive(From, Display, Debug)]
#[display(fmt = "failed to parse an xml element: {xml_err}")]
pub struct MalformedXml {
    xml_err: quick_xml::Error,
}

#[derive(From, Display, Debug)]
#[display(fmt = "failed to parse an xml attribute: {att_err}")]
pub struct MalformedAttribute {
    att_err: quick_xml::events::attributes::AttrError,
}

#[derive(Display, Debug, Constructor)]
#[display(fmt = "{what} of element `{element_name}` is not valid UTF-8")]
pub struct InvalidUtf8 {
    element_name: String,
    what: &'static str,
}

#[derive(Display, Debug)]
#[display(fmt = "unexpected element. Expected `{expected_name}`, got {actual_element}")]
pub struct UnexpectedElement {
    expected_name: String,
    actual_element: EventSummary,
}

impl UnexpectedElement {
    pub(crate) fn new<T: Into<String>>(expected_name: T, actual_element: EventSummary) -> Self {
        Self {
            expected_name: expected_name.into(),
            actual_element,
        }
    }
}

#[derive(Display, Debug, Default)]
#[display(fmt = "the document does not contain a root element")]
pub struct EmptyDocument;

//
// Structural
//

#[derive(Debug, thiserror::Error, From)]
pub enum Structural {
    #[error("{0}")]
    MissingAttribute(MissingAttribute),
    #[error("{0}")]
    MissingElement(MissingElement),
    #[error("{0}")]
    UnexpectedAttributeValue(UnexpectedAttributeValue),
    #[error("{0}")]
    InvalidAttribute(InvalidAttribute),
    #[error("{0}")]
    MissingAppendedData(MissingAppendedData),
    #[error("{0}")]
    AppendedOffset(AppendedOffset),
    #[error("{0}")]
    MissingSentinel(MissingSentinel),
    #[error("{0}")]
    AttributeConflict(AttributeConflict),
    #[error("{0}")]
    CellOffsets(CellOffsets),
}

#[derive(Display, Debug, Constructor)]
#[display(fmt = "missing attribute `{attribute_name}` in {element_name} element")]
pub struct MissingAttribute {
    element_name: String,
    attribute_name: String,
}

#[derive(Display, Debug, Constructor)]
#[display(fmt = "missing `{element_name}` element inside of `{parent_name}`")]
pub struct MissingElement {
    parent_name: String,
    element_name: String,
}

#[derive(Display, Debug, Constructor)]
#[display(
    fmt = "unexpected attribute value for {attribute_name} in {element_name} element: expected {expected_value}, got {actual_value}"
)]
pub struct UnexpectedAttributeValue {
    pub(crate) element_name: String,
    pub(crate) attribute_name: String,
    pub(crate) expected_value: String,
    pub(crate) actual_value: String,
}

#[derive(Display, Debug, Constructor)]
#[display(
    fmt = "attribute {attribute_name} of {element_name} element could not be parsed: `{value}`"
)]
pub struct InvalidAttribute {
    element_name: String,
    attribute_name: String,
    value: String,
}

#[derive(Display, Debug, Constructor)]
#[display(
    fmt = "DataArray `{array_name}` is stored in the appended section, but the file has no AppendedData element"
)]
pub struct MissingAppendedData {
    array_name: String,
}

#[derive(Display, Debug, Constructor)]
#[display(
    fmt = "DataArray `{array_name}` starts at offset {offset}, past the end of the {blob_len} character AppendedData section"
)]
pub struct AppendedOffset {
    array_name: String,
    offset: usize,
    blob_len: usize,
}

#[derive(Display, Debug, Default)]
#[display(fmt = "AppendedData section does not start with the `_` marker")]
pub struct MissingSentinel;

#[derive(Display, Debug, Constructor)]
#[display(
    fmt = "attribute `{attribute_name}` already exists with storage {existing}, cannot reuse it as {requested}"
)]
pub struct AttributeConflict {
    attribute_name: String,
    existing: &'static str,
    requested: &'static str,
}

#[derive(Display, Debug, Constructor)]
#[display(
    fmt = "cell offset {offset} in `{element_name}` is out of order or past the end of its {connectivity_len} connectivity entries"
)]
pub struct CellOffsets {
    element_name: String,
    offset: usize,
    connectivity_len: usize,
}

//
// Unsupported
//

#[derive(Debug, thiserror::Error, From)]
pub enum Unsupported {
    #[error("{0}")]
    Attribute(UnsupportedAttribute),
    #[error("{0}")]
    ArrayType(UnsupportedArrayType),
}

#[derive(Display, Debug, Constructor)]
#[display(
    fmt = "{attribute_name}=\"{value}\" on {element_name} element is not supported (supported: {supported})"
)]
pub struct UnsupportedAttribute {
    element_name: String,
    attribute_name: String,
    value: String,
    supported: &'static str,
}

#[derive(Display, Debug, Constructor)]
#[display(fmt = "DataArray `{array_name}` has unsupported attribute type `{type_name}`")]
pub struct UnsupportedArrayType {
    array_name: String,
    type_name: String,
}

//
// Decode
//

#[derive(Debug, thiserror::Error, From)]
pub enum Decode {
    #[error("{0}")]
    Base64(Base64),
    #[error("{0}")]
    Inflate(Inflate),
    #[error("{0}")]
    BlockLength(BlockLength),
    #[error("{0}")]
    Truncated(Truncated),
    #[error("{0}")]
    AsciiValue(AsciiValue),
    #[error("{0}")]
    ValueRange(ValueRange),
    #[error("{0}")]
    Misaligned(Misaligned),
}

#[derive(Display, Debug, Constructor)]
#[display(fmt = "base64 payload of DataArray `{array_name}` could not be decoded: {source}")]
pub struct Base64 {
    array_name: String,
    source: base64::DecodeError,
}

#[derive(Display, Debug, Constructor)]
#[display(fmt = "zlib block {block} of DataArray `{array_name}` could not be inflated: {source}")]
pub struct Inflate {
    array_name: String,
    block: usize,
    source: std::io::Error,
}

#[derive(Display, Debug, Constructor)]
#[display(
    fmt = "zlib block {block} of DataArray `{array_name}` inflated to {actual} bytes, expected {expected}"
)]
pub struct BlockLength {
    array_name: String,
    block: usize,
    expected: usize,
    actual: usize,
}

#[derive(Display, Debug, Constructor)]
#[display(
    fmt = "payload of DataArray `{array_name}` is truncated: {needed} base64 characters needed, {available} available"
)]
pub struct Truncated {
    array_name: String,
    needed: usize,
    available: usize,
}

#[derive(Display, Debug, Constructor)]
#[display(fmt = "ascii value `{token}` of DataArray `{array_name}` is not a valid {numeric_type}")]
pub struct AsciiValue {
    array_name: String,
    token: String,
    numeric_type: NumericType,
}

#[derive(Display, Debug, Constructor)]
#[display(
    fmt = "value {index} of DataArray `{array_name}` does not fit in the requested type {target}"
)]
pub struct ValueRange {
    array_name: String,
    index: usize,
    target: &'static str,
}

#[derive(Display, Debug, Constructor)]
#[display(
    fmt = "DataArray `{array_name}` decoded to {bytes} bytes, which is not a multiple of its {width} byte values"
)]
pub struct Misaligned {
    array_name: String,
    bytes: usize,
    width: usize,
}

//
// DataShape
//

#[derive(Debug, thiserror::Error, From)]
pub enum Shape {
    #[error("{0}")]
    NotDivisible(DataShape),
    #[error("{0}")]
    ComponentMismatch(ComponentMismatch),
}

#[derive(Display, Debug, Constructor)]
#[display(
    fmt = "DataArray `{array_name}` holds {values} values, which is not a multiple of its {components} components"
)]
pub struct DataShape {
    array_name: String,
    values: usize,
    components: usize,
}

#[derive(Display, Debug, Constructor)]
#[display(
    fmt = "attribute `{attribute_name}` has {existing} components, a later DataArray declares {requested}"
)]
pub struct ComponentMismatch {
    attribute_name: String,
    existing: usize,
    requested: usize,
}

/// An element or attribute name as it was found in the document
#[derive(From, Display, Debug, Clone)]
pub enum ParsedNameOrBytes {
    #[display(fmt = "{_0}")]
    Utf8(String),
    #[display(fmt = "{_0:?} (cannot convert to UTF8 string)")]
    Bytes(Vec<u8>),
}

impl ParsedNameOrBytes {
    pub(crate) fn new(bytes: &[u8]) -> Self {
        let vec = Vec::from(bytes);
        match String::from_utf8(vec) {
            Ok(string) => Self::Utf8(string),
            Err(e) => Self::Bytes(e.into_bytes()),
        }
    }
}

impl<'a> From<QName<'a>> for ParsedNameOrBytes {
    fn from(x: QName) -> Self {
        Self::new(x.as_ref())
    }
}

impl<'a> From<&'a str> for ParsedNameOrBytes {
    fn from(x: &str) -> Self {
        Self::Utf8(x.into())
    }
}
