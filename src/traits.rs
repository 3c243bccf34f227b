//! # Traits
//!
//! General purpose traits used while decoding and encoding arrays. `Numeric` describes
//! every scalar type a `DataArray` may hold on disk, `FromBuffer` reshapes the flat output
//! of a decode, and `BuildTopology` is the capability each dataset kind implements to read
//! its `Piece` elements.

use crate::array::{Codec, NumericType};
use crate::data::VtkDataset;
use crate::mesh::PieceOffsets;
use crate::parse::error;
use crate::parse::{Element, ParseError};

use num_traits::NumCast;
use std::fmt;
use std::fmt::Write as _;
use std::str::FromStr;

/// A scalar type that can be stored in a `DataArray`.
///
/// Values are always stored little endian on disk, `SIZE` bytes each.
pub trait Numeric: Copy + fmt::Debug + PartialOrd + NumCast + FromStr + 'static {
    /// number of bytes of a single value
    const SIZE: usize;
    /// the `type` attribute written for arrays of this scalar
    const TYPE: NumericType;
    const ZERO: Self;

    /// read a single value from the first `SIZE` bytes of the slice
    fn from_le_slice(bytes: &[u8]) -> Self;

    fn extend_le_bytes(&self, bytes: &mut Vec<u8>);

    /// append the ascii representation of this value (no separator)
    fn push_ascii(&self, out: &mut String);
}

macro_rules! integer_numeric {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl Numeric for $t {
                const SIZE: usize = std::mem::size_of::<$t>();
                const TYPE: NumericType = NumericType::$variant;
                const ZERO: Self = 0;

                fn from_le_slice(bytes: &[u8]) -> Self {
                    let mut arr = [0; std::mem::size_of::<$t>()];
                    arr.copy_from_slice(&bytes[..Self::SIZE]);
                    <$t>::from_le_bytes(arr)
                }

                fn extend_le_bytes(&self, bytes: &mut Vec<u8>) {
                    bytes.extend_from_slice(&self.to_le_bytes());
                }

                fn push_ascii(&self, out: &mut String) {
                    // writing to a String cannot fail
                    let _ = write!(out, "{}", self);
                }
            }
        )*
    };
}

macro_rules! float_numeric {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl Numeric for $t {
                const SIZE: usize = std::mem::size_of::<$t>();
                const TYPE: NumericType = NumericType::$variant;
                const ZERO: Self = 0.0;

                fn from_le_slice(bytes: &[u8]) -> Self {
                    let mut arr = [0; std::mem::size_of::<$t>()];
                    arr.copy_from_slice(&bytes[..Self::SIZE]);
                    <$t>::from_le_bytes(arr)
                }

                fn extend_le_bytes(&self, bytes: &mut Vec<u8>) {
                    bytes.extend_from_slice(&self.to_le_bytes());
                }

                fn push_ascii(&self, out: &mut String) {
                    let mut buffer = ryu::Buffer::new();
                    out.push_str(buffer.format(*self));
                }
            }
        )*
    };
}

integer_numeric!(
    i8 => Int8,
    u8 => UInt8,
    i16 => Int16,
    u16 => UInt16,
    i32 => Int32,
    u32 => UInt32,
    i64 => Int64,
    u64 => UInt64,
);

float_numeric!(f32 => Float32, f64 => Float64);

/// Build a container from the flat output of `decode_array`
pub trait FromBuffer<T>: Sized {
    fn from_buffer(buffer: Vec<T>, components: usize, name: &str) -> Result<Self, error::DataShape>;
}

impl<T> FromBuffer<T> for Vec<T> {
    fn from_buffer(buffer: Vec<T>, components: usize, name: &str) -> Result<Self, error::DataShape> {
        if components == 0 || buffer.len() % components != 0 {
            return Err(error::DataShape::new(name.into(), buffer.len(), components));
        }

        Ok(buffer)
    }
}

/// one row per element, one column per component
impl<T> FromBuffer<T> for ndarray::Array2<T> {
    fn from_buffer(buffer: Vec<T>, components: usize, name: &str) -> Result<Self, error::DataShape> {
        let len = buffer.len();
        if components == 0 || len % components != 0 {
            return Err(error::DataShape::new(name.into(), len, components));
        }

        Self::from_shape_vec((len / components, components), buffer)
            .map_err(|_| error::DataShape::new(name.into(), len, components))
    }
}

/// Capability implemented by every supported dataset kind: read the mesh part of a
/// `Piece` into the dataset and report where that piece's attributes start.
pub trait BuildTopology {
    /// read anything stored on the dataset element itself (`<ImageData WholeExtent=..>`)
    fn read_dataset_header(
        &self,
        _dataset_element: &Element,
        _dataset: &mut VtkDataset,
    ) -> Result<(), ParseError> {
        Ok(())
    }

    fn build_topology(
        &self,
        piece: &Element,
        codec: &Codec<'_>,
        dataset: &mut VtkDataset,
    ) -> Result<PieceOffsets, ParseError>;

    /// how confident this reader is that it can load the dataset element, in `[0, 1]`
    fn confidence(&self, dataset_element: &Element, codec: &Codec<'_>) -> Result<f64, ParseError>;
}
