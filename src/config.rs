//! Per-file codec facts read once from the `VTKFile` root element.

use crate::prelude::*;

use crate::mesh::DatasetKind;

/// the only compressor understood by the codec
pub const ZLIB_COMPRESSOR: &str = "vtkZLibDataCompressor";
pub const LITTLE_ENDIAN: &str = "LittleEndian";
pub const BIG_ENDIAN: &str = "BigEndian";

/// Width of the integers framing binary payloads (byte counts, block tables)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderType {
    #[default]
    UInt32,
    UInt64,
}

impl HeaderType {
    pub fn width(self) -> usize {
        match self {
            Self::UInt32 => 4,
            Self::UInt64 => 8,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::UInt32 => "UInt32",
            Self::UInt64 => "UInt64",
        }
    }

    pub fn from_attribute(value: &str) -> Option<Self> {
        match value {
            "UInt32" => Some(Self::UInt32),
            "UInt64" => Some(Self::UInt64),
            _ => None,
        }
    }

    /// read one header integer from the start of `bytes`
    ///
    /// `bytes` must hold at least `self.width()` bytes
    pub(crate) fn read(self, bytes: &[u8]) -> u64 {
        match self {
            Self::UInt32 => crate::utils::le_u32(bytes) as u64,
            Self::UInt64 => crate::utils::le_u64(bytes),
        }
    }

    /// append one header integer, failing if it does not fit in the header width
    pub(crate) fn extend_le_bytes(self, value: usize, bytes: &mut Vec<u8>) -> Result<(), Error> {
        match self {
            Self::UInt32 => {
                let value = u32::try_from(value).map_err(|_| Error::HeaderOverflow {
                    value,
                    header_type: self,
                })?;
                bytes.extend_from_slice(&value.to_le_bytes());
            }
            Self::UInt64 => bytes.extend_from_slice(&(value as u64).to_le_bytes()),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    #[default]
    None,
    ZLib,
}

/// Immutable description of how binary payloads of one file are framed.
///
/// Produced once when the file is opened (`CodecConfig::from_root`) and handed to every
/// decode call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CodecConfig {
    pub compression: Compression,
    pub header_type: HeaderType,
}

impl CodecConfig {
    pub fn new(compression: Compression, header_type: HeaderType) -> Self {
        Self {
            compression,
            header_type,
        }
    }

    pub fn is_compressed(&self) -> bool {
        self.compression == Compression::ZLib
    }

    /// validate the `VTKFile` root element for a reader of `kind` and read its codec settings
    pub fn from_root(root: &Element, kind: DatasetKind) -> Result<Self, ParseError> {
        if root.name() != "VTKFile" {
            return Err(error::Structural::from(error::UnexpectedAttributeValue::new(
                "document".into(),
                "root element".into(),
                "VTKFile".into(),
                root.name().into(),
            ))
            .into());
        }

        // the dataset type must match the reader
        let file_type = root.required_attribute("type").map_err(error::Structural::from)?;
        if file_type != kind.tag() {
            let mismatch = error::UnexpectedAttributeValue::new(
                "VTKFile".into(),
                "type".into(),
                kind.tag().into(),
                file_type.into(),
            );
            return Err(error::Structural::from(mismatch).into());
        }

        let byte_order = root
            .required_attribute("byte_order")
            .map_err(error::Structural::from)?;
        match byte_order {
            LITTLE_ENDIAN => (),
            BIG_ENDIAN => {
                return Err(unsupported("byte_order", byte_order, LITTLE_ENDIAN).into());
            }
            _ => {
                let mismatch = error::UnexpectedAttributeValue::new(
                    "VTKFile".into(),
                    "byte_order".into(),
                    LITTLE_ENDIAN.into(),
                    byte_order.into(),
                );
                return Err(error::Structural::from(mismatch).into());
            }
        }

        let compression = match root.attribute("compressor") {
            None | Some("") => Compression::None,
            Some(ZLIB_COMPRESSOR) => Compression::ZLib,
            Some(other) => {
                return Err(unsupported("compressor", other, ZLIB_COMPRESSOR).into());
            }
        };

        let header_type = match root.attribute("header_type") {
            None => HeaderType::default(),
            Some(value) => HeaderType::from_attribute(value)
                .ok_or_else(|| unsupported("header_type", value, "UInt32, UInt64"))?,
        };

        let config = Self::new(compression, header_type);
        log::debug!("codec configuration for {} file: {:?}", kind.tag(), config);

        Ok(config)
    }
}

fn unsupported(attribute: &str, value: &str, supported: &'static str) -> error::Unsupported {
    error::UnsupportedAttribute::new("VTKFile".into(), attribute.into(), value.into(), supported)
        .into()
}
