//! Writing VTK XML documents with `DataArray`s in any of the supported encodings.
//!
//! The binary framing is the inverse of the one used by the reader: uncompressed payloads
//! are `[header-int: byte length][bytes]`, compressed payloads are split into zlib blocks
//! of `block_size` bytes (see [`block`](crate::block)).

use crate::prelude::*;

use crate::block;
use crate::config::{Compression, ZLIB_COMPRESSOR};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::writer::Writer;

/// uncompressed size of each zlib block, the VTK default
pub const DEFAULT_BLOCK_SIZE: usize = 32768;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// the encoding to use when writing an inline dataarray
pub enum Encoding {
    Ascii,
    /// base64, compressed if the document declares a compressor
    Base64,
}

impl Encoding {
    fn to_str(self) -> &'static str {
        match self {
            Self::Ascii => "ascii",
            Self::Base64 => "binary",
        }
    }
}

/// write the xml declaration and open the `VTKFile` element
pub fn write_document_start<W: Write>(
    writer: &mut Writer<W>,
    kind: DatasetKind,
    config: &CodecConfig,
) -> Result<(), Error> {
    writer.write_event(Event::Decl(BytesDecl::new("1.0", None, None)))?;

    let mut attributes = vec![
        ("type", kind.tag()),
        ("version", "1.0"),
        ("byte_order", crate::config::LITTLE_ENDIAN),
        ("header_type", config.header_type.as_str()),
    ];

    if config.compression == Compression::ZLib {
        attributes.push(("compressor", ZLIB_COMPRESSOR));
    }

    start_element(writer, "VTKFile", &attributes)
}

pub fn write_document_end<W: Write>(writer: &mut Writer<W>) -> Result<(), Error> {
    end_element(writer, "VTKFile")
}

pub fn start_element<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    attributes: &[(&str, &str)],
) -> Result<(), Error> {
    let mut start = BytesStart::new(name);
    start.extend_attributes(attributes.iter().copied());
    writer.write_event(Event::Start(start))?;
    Ok(())
}

pub fn end_element<W: Write>(writer: &mut Writer<W>, name: &str) -> Result<(), Error> {
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// write a single (inline) array of data (such as x-velocity) to the vtk file.
///
/// `RangeMin` / `RangeMax` are written for non empty arrays so integer arrays are read
/// back with the narrowest storage that holds them.
pub fn write_inline_dataarray<W: Write, T: Numeric>(
    writer: &mut Writer<W>,
    name: &str,
    values: &[T],
    components: usize,
    encoding: Encoding,
    config: &CodecConfig,
) -> Result<(), Error> {
    let text = match encoding {
        Encoding::Ascii => ascii_text(values),
        Encoding::Base64 => block::encode_payload(&le_bytes(values), config, DEFAULT_BLOCK_SIZE)?,
    };

    let header = DataArrayHeader::new::<T>(name, components, encoding.to_str(), values);
    let mut start = BytesStart::new("DataArray");
    start.extend_attributes(header.attributes().iter().map(|(k, v)| (*k, v.as_str())));

    writer.write_event(Event::Start(start))?;
    writer.write_event(Event::Text(BytesText::new(&text)))?;
    end_element(writer, "DataArray")
}

/// write the header for an appended data array that will later be written in the appended
/// section of the vtk.
///
/// `offset` is the index of the first base64 character of the array in the appended
/// section, as returned by [`AppendedDataBuilder::push`].
pub fn write_appended_dataarray_header<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    numeric_type: NumericType,
    components: usize,
    offset: usize,
    range: Option<(f64, f64)>,
) -> Result<(), Error> {
    let header = DataArrayHeader {
        name: name.to_string(),
        numeric_type,
        components,
        format: "appended",
        range,
        offset: Some(offset),
    };

    let mut start = BytesStart::new("DataArray");
    start.extend_attributes(header.attributes().iter().map(|(k, v)| (*k, v.as_str())));
    writer.write_event(Event::Empty(start))?;

    Ok(())
}

/// push `values` to the appended section and write the matching `DataArray` header
pub fn write_appended_dataarray<W: Write, T: Numeric>(
    writer: &mut Writer<W>,
    appended: &mut AppendedDataBuilder,
    name: &str,
    values: &[T],
    components: usize,
) -> Result<(), Error> {
    let offset = appended.push(values)?;
    write_appended_dataarray_header(writer, name, T::TYPE, components, offset, value_range(values))
}

/// Collects the payloads of appended arrays into one base64 blob
#[derive(Debug, Clone)]
pub struct AppendedDataBuilder {
    config: CodecConfig,
    block_size: usize,
    blob: String,
}

impl AppendedDataBuilder {
    pub fn new(config: CodecConfig) -> Self {
        Self {
            config,
            block_size: DEFAULT_BLOCK_SIZE,
            blob: String::new(),
        }
    }

    /// uncompressed size of zlib blocks (only used by compressed documents)
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    /// frame and append one array, returning its character offset in the blob
    pub fn push<T: Numeric>(&mut self, values: &[T]) -> Result<usize, Error> {
        let offset = self.blob.len();
        let framed = block::encode_payload(&le_bytes(values), &self.config, self.block_size)?;
        self.blob.push_str(&framed);
        Ok(offset)
    }

    pub fn len(&self) -> usize {
        self.blob.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blob.is_empty()
    }

    /// write the `<AppendedData encoding="base64">` element, `_` marker included
    pub fn write<W: Write>(self, writer: &mut Writer<W>) -> Result<(), Error> {
        start_element(writer, "AppendedData", &[("encoding", "base64")])?;

        let mut text = String::with_capacity(self.blob.len() + 1);
        text.push('_');
        text.push_str(&self.blob);
        writer.write_event(Event::Text(BytesText::new(&text)))?;

        end_element(writer, "AppendedData")
    }
}

struct DataArrayHeader {
    name: String,
    numeric_type: NumericType,
    components: usize,
    format: &'static str,
    range: Option<(f64, f64)>,
    offset: Option<usize>,
}

impl DataArrayHeader {
    fn new<T: Numeric>(name: &str, components: usize, format: &'static str, values: &[T]) -> Self {
        Self {
            name: name.to_string(),
            numeric_type: T::TYPE,
            components,
            format,
            range: value_range(values),
            offset: None,
        }
    }

    fn attributes(&self) -> Vec<(&'static str, String)> {
        let mut out = vec![
            ("type", self.numeric_type.as_str().to_string()),
            ("Name", self.name.clone()),
            ("NumberOfComponents", self.components.to_string()),
            ("format", self.format.to_string()),
        ];

        if let Some(offset) = self.offset {
            out.push(("offset", offset.to_string()));
        }

        if let Some((min, max)) = self.range {
            out.push(("RangeMin", format_range(min)));
            out.push(("RangeMax", format_range(max)));
        }

        out
    }
}

/// smallest and largest value, ignoring NaN; `None` for empty arrays
pub fn value_range<T: Numeric>(values: &[T]) -> Option<(f64, f64)> {
    values
        .iter()
        .filter_map(|value| value.to_f64())
        .filter(|value| !value.is_nan())
        .fold(None, |range, value| match range {
            None => Some((value, value)),
            Some((min, max)) => Some((f64::min(min, value), f64::max(max, value))),
        })
}

fn format_range(value: f64) -> String {
    let mut buffer = ryu::Buffer::new();
    buffer.format(value).to_string()
}

fn ascii_text<T: Numeric>(values: &[T]) -> String {
    let mut out = String::with_capacity(values.len() * 4);
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        value.push_ascii(&mut out);
    }
    out
}

fn le_bytes<T: Numeric>(values: &[T]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(values.len() * T::SIZE);
    values.iter().for_each(|value| value.extend_le_bytes(&mut bytes));
    bytes
}
