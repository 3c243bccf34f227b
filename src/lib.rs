//! Decoding of VTK XML (`.vti`, `.vtp`, `.vtu`) numeric arrays into named, typed attributes.
//!
//! The heavy lifting lives in three places:
//!
//! * [`array::decode_array`] turns one `DataArray` element into a flat sequence of values,
//!   whether it is stored as ascii text, inline base64, base64 in the `AppendedData` section,
//!   or zlib block-compressed base64.
//! * [`block`] implements the base64 / zlib block framing (both directions).
//! * [`attribute::read_attribute_block`] rebuilds `PointData` / `CellData` arrays as
//!   per-element attributes on an [`AttributeManager`].
//!
//! A whole file is read with [`read_vtk`]:
//!
//! ```no_run
//! use vtk_xml_codec::DatasetKind;
//!
//! let dataset = vtk_xml_codec::read_vtk(
//!     std::path::Path::new("./mesh.vtu"),
//!     DatasetKind::UnstructuredGrid,
//! )
//! .unwrap();
//!
//! println!("{} vertices", dataset.nb_vertices);
//! ```

pub mod appended;
pub mod array;
pub mod attribute;
pub mod block;
pub mod config;
mod data;
pub mod mesh;
pub mod parse;
pub mod prelude;
mod traits;
mod utils;
pub mod write_vtk;

pub use traits::BuildTopology;
pub use traits::FromBuffer;
pub use traits::Numeric;

pub use data::{GridInfo, VtkDataset};

pub use appended::AppendedData;
pub use array::{decode_array, decode_array_as, Codec, DataArrayDescriptor, Format, NumericType};
pub use attribute::{read_attribute_block, AttributeManager, Index, StorageKind, VariableAttribute};
pub use config::{CodecConfig, Compression, HeaderType};
pub use mesh::{DatasetKind, PieceOffsets};

pub use parse::read_and_parse as read_vtk;
pub use parse::{is_file_loadable, is_loadable, parse_str};
pub use parse::{Element, ParseError};

pub use write_vtk::{
    write_appended_dataarray, write_appended_dataarray_header, write_document_end,
    write_document_start, write_inline_dataarray, AppendedDataBuilder, Encoding,
};

pub use ndarray;

pub use quick_xml::reader::Reader;
pub use quick_xml::writer::Writer;

/// general purpose error enumeration for possible causes of failure.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("An io error occured: `{0}`")]
    Io(#[from] std::io::Error),
    #[error("Error while parsing VTK xml: {0}")]
    Parse(#[from] parse::ParseError),
    #[error("Could not convert file to uf8 encoding: `{0}`")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("Could not write XML data to file: `{0}`")]
    XmlWrite(#[from] quick_xml::Error),
    #[error("header value {value} does not fit in a {header_type:?} header")]
    HeaderOverflow {
        value: usize,
        header_type: config::HeaderType,
    },
}
