//! `DataArray` descriptors and the array decoder.
//!
//! A `DataArray` element is described by its declared scalar `type`, its storage `format`
//! and its `NumberOfComponents`. [`decode_array`] turns one of them into a flat sequence of
//! values of the requested element type, upcasting from the declared type when needed.

mod ascii;

use crate::prelude::*;

use crate::appended::AppendedData;
use crate::block;

use std::borrow::Cow;
use std::fmt;

/// Every scalar type a `DataArray` may declare in its `type` attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericType {
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float32,
    Float64,
}

impl NumericType {
    pub fn from_attribute(value: &str) -> Option<Self> {
        let out = match value {
            "Int8" => Self::Int8,
            "UInt8" => Self::UInt8,
            "Int16" => Self::Int16,
            "UInt16" => Self::UInt16,
            "Int32" => Self::Int32,
            "UInt32" => Self::UInt32,
            "Int64" => Self::Int64,
            "UInt64" => Self::UInt64,
            "Float32" => Self::Float32,
            "Float64" => Self::Float64,
            _ => return None,
        };

        Some(out)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Int8 => "Int8",
            Self::UInt8 => "UInt8",
            Self::Int16 => "Int16",
            Self::UInt16 => "UInt16",
            Self::Int32 => "Int32",
            Self::UInt32 => "UInt32",
            Self::Int64 => "Int64",
            Self::UInt64 => "UInt64",
            Self::Float32 => "Float32",
            Self::Float64 => "Float64",
        }
    }

    /// width in bytes of one value on disk
    pub fn size(self) -> usize {
        match self {
            Self::Int8 | Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Int64 | Self::UInt64 | Self::Float64 => 8,
        }
    }

    pub fn is_integer(self) -> bool {
        !matches!(self, Self::Float32 | Self::Float64)
    }
}

impl fmt::Display for NumericType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// run `$body` with `$source` aliased to the rust type of a declared `NumericType`
macro_rules! with_source_type {
    ($numeric_type:expr, $source:ident => $body:expr) => {
        match $numeric_type {
            NumericType::Int8 => {
                type $source = i8;
                $body
            }
            NumericType::UInt8 => {
                type $source = u8;
                $body
            }
            NumericType::Int16 => {
                type $source = i16;
                $body
            }
            NumericType::UInt16 => {
                type $source = u16;
                $body
            }
            NumericType::Int32 => {
                type $source = i32;
                $body
            }
            NumericType::UInt32 => {
                type $source = u32;
                $body
            }
            NumericType::Int64 => {
                type $source = i64;
                $body
            }
            NumericType::UInt64 => {
                type $source = u64;
                $body
            }
            NumericType::Float32 => {
                type $source = f32;
                $body
            }
            NumericType::Float64 => {
                type $source = f64;
                $body
            }
        }
    };
}

/// Where the values of a `DataArray` are stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// whitespace separated values inside the element
    Ascii,
    /// base64 framed payload inside the element
    Binary,
    /// base64 framed payload starting at `offset` characters into the `AppendedData` blob
    Appended { offset: usize },
}

/// Everything needed to decode one `DataArray` element.
///
/// Borrowed from the element it was read from and discarded right after decoding.
#[derive(Debug, Clone, PartialEq)]
pub struct DataArrayDescriptor<'a> {
    pub name: &'a str,
    pub numeric_type: NumericType,
    pub format: Format,
    pub components: usize,
    pub range_min: Option<f64>,
    pub range_max: Option<f64>,
    /// text content of the element (empty for appended arrays)
    pub text: &'a str,
}

impl<'a> DataArrayDescriptor<'a> {
    pub fn from_element(element: &'a Element) -> Result<Self, ParseError> {
        let name = element.attribute("Name").unwrap_or_default();

        let type_name = element
            .required_attribute("type")
            .map_err(error::Structural::from)?;
        let numeric_type = NumericType::from_attribute(type_name).ok_or_else(|| {
            error::Unsupported::from(error::UnsupportedArrayType::new(
                name.into(),
                type_name.into(),
            ))
        })?;

        let components = element
            .parse_optional_attribute::<usize>("NumberOfComponents")
            .map_err(error::Structural::from)?
            .unwrap_or(1);

        if components == 0 {
            let invalid = error::InvalidAttribute::new(
                element.name().into(),
                "NumberOfComponents".into(),
                "0".into(),
            );
            return Err(error::Structural::from(invalid).into());
        }

        let format = match element
            .required_attribute("format")
            .map_err(error::Structural::from)?
        {
            "ascii" => Format::Ascii,
            "binary" => Format::Binary,
            "appended" => Format::Appended {
                offset: element.parse_attribute("offset")?,
            },
            other => {
                let unsupported = error::UnsupportedAttribute::new(
                    element.name().into(),
                    "format".into(),
                    other.into(),
                    "ascii, binary, appended",
                );
                return Err(error::Unsupported::from(unsupported).into());
            }
        };

        let range_min = element
            .parse_optional_attribute("RangeMin")
            .map_err(error::Structural::from)?;
        let range_max = element
            .parse_optional_attribute("RangeMax")
            .map_err(error::Structural::from)?;

        Ok(Self {
            name,
            numeric_type,
            format,
            components,
            range_min,
            range_max,
            text: element.text(),
        })
    }
}

/// Per-file decoding context handed to every decode call
#[derive(Debug, Clone, Copy, Default)]
pub struct Codec<'a> {
    pub config: CodecConfig,
    pub appended: Option<&'a AppendedData>,
}

impl<'a> Codec<'a> {
    pub fn new(config: CodecConfig, appended: Option<&'a AppendedData>) -> Self {
        Self { config, appended }
    }
}

/// Decode a `DataArray` into a flat sequence of `T`.
///
/// Values are read as the declared scalar type and then converted to `T`; a value that
/// `T` cannot represent is a decode error rather than a silent wrap. The length of the
/// output is always a multiple of `descriptor.components`.
pub fn decode_array<T: Numeric>(
    descriptor: &DataArrayDescriptor<'_>,
    codec: &Codec<'_>,
) -> Result<Vec<T>, ParseError> {
    let name = descriptor.name;

    let values: Vec<T> = match descriptor.format {
        Format::Ascii => {
            with_source_type!(descriptor.numeric_type, S => ascii::parse_values::<S, T>(descriptor.text, name)?)
        }
        Format::Binary => {
            let text = compact_base64(descriptor.text);
            let bytes = block::decode_payload(&text, &codec.config, name)?;
            with_source_type!(descriptor.numeric_type, S => values_from_le_bytes::<S, T>(&bytes, name)?)
        }
        Format::Appended { offset } => {
            let appended = codec
                .appended
                .ok_or_else(|| error::Structural::from(error::MissingAppendedData::new(name.into())))?;

            let window = appended.window(offset, name)?;
            log::trace!(
                "DataArray `{}` starts at character {} of the appended section",
                name,
                offset
            );

            let bytes = block::decode_payload(window, &codec.config, name)?;
            with_source_type!(descriptor.numeric_type, S => values_from_le_bytes::<S, T>(&bytes, name)?)
        }
    };

    if values.len() % descriptor.components != 0 {
        return Err(error::DataShape::new(name.into(), values.len(), descriptor.components).into());
    }

    log::trace!(
        "decoded DataArray `{}`: {} {} values, {} components",
        name,
        values.len(),
        descriptor.numeric_type,
        descriptor.components
    );

    Ok(values)
}

/// decode a `DataArray` straight into a shaped container, one row per element
pub fn decode_array_as<T: Numeric, C: FromBuffer<T>>(
    descriptor: &DataArrayDescriptor<'_>,
    codec: &Codec<'_>,
) -> Result<C, ParseError> {
    let values = decode_array::<T>(descriptor, codec)?;
    let container = C::from_buffer(values, descriptor.components, descriptor.name)?;
    Ok(container)
}

/// convert one value read as `S` into the requested type `T`
pub(crate) fn cast_value<S: Numeric, T: Numeric>(
    value: S,
    index: usize,
    array_name: &str,
) -> Result<T, error::Decode> {
    let out_of_range = || -> error::Decode {
        error::ValueRange::new(array_name.into(), index, T::TYPE.as_str()).into()
    };

    // `NumCast` truncates floats, integers only take whole values
    if T::TYPE.is_integer() && !S::TYPE.is_integer() {
        let whole = num_traits::ToPrimitive::to_f64(&value)
            .map_or(false, |value| value.is_finite() && value.fract() == 0.0);

        if !whole {
            return Err(out_of_range());
        }
    }

    <T as num_traits::NumCast>::from(value).ok_or_else(out_of_range)
}

fn values_from_le_bytes<S: Numeric, T: Numeric>(
    bytes: &[u8],
    array_name: &str,
) -> Result<Vec<T>, error::Decode> {
    if bytes.len() % S::SIZE != 0 {
        return Err(error::Misaligned::new(array_name.into(), bytes.len(), S::SIZE).into());
    }

    bytes
        .chunks_exact(S::SIZE)
        .enumerate()
        .map(|(index, chunk)| cast_value::<S, T>(S::from_le_slice(chunk), index, array_name))
        .collect()
}

/// inline base64 may be wrapped over several lines
fn compact_base64(text: &str) -> Cow<'_, str> {
    if text.contains(char::is_whitespace) {
        Cow::Owned(text.split_whitespace().collect())
    } else {
        Cow::Borrowed(text)
    }
}
