//! # Dataset kinds
//!
//! Each supported dataset type (`ImageData`, `PolyData`, `UnstructuredGrid`) is one variant
//! of [`DatasetKind`] with a stateless reader implementing
//! [BuildTopology](`crate::BuildTopology`). The reader is responsible for the mesh part of
//! each `Piece` (points, cells, grid geometry); it reports where the attributes of that
//! piece start so `PointData` / `CellData` can be decoded at the right element offsets.

mod image;
mod poly;
mod unstructured;

pub use image::ImageDataReader;
pub use poly::PolyDataReader;
pub use unstructured::UnstructuredGridReader;

use crate::prelude::*;

use crate::array::{decode_array, decode_array_as, Codec, DataArrayDescriptor};

use ndarray::Array2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// The dataset types a file may declare in `<VTKFile type="..">`
pub enum DatasetKind {
    ImageData,
    PolyData,
    UnstructuredGrid,
}

impl DatasetKind {
    /// the `type` attribute of the root element, also the name of the dataset element
    pub fn tag(self) -> &'static str {
        match self {
            Self::ImageData => "ImageData",
            Self::PolyData => "PolyData",
            Self::UnstructuredGrid => "UnstructuredGrid",
        }
    }

    pub fn reader(self) -> &'static dyn BuildTopology {
        match self {
            Self::ImageData => &ImageDataReader,
            Self::PolyData => &PolyDataReader,
            Self::UnstructuredGrid => &UnstructuredGridReader,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Index of the first vertex and first cell of a piece in the whole dataset
pub struct PieceOffsets {
    pub vertex: usize,
    pub cell: usize,
}

/// read the `Points` of a piece: one `Float32` or `Float64` array with 3 components
pub(crate) fn read_points(
    piece: &Element,
    codec: &Codec<'_>,
    nb_points: usize,
) -> Result<Array2<f64>, ParseError> {
    let points = match piece.child("Points") {
        Some(points) => points,
        None if nb_points == 0 => return Ok(Array2::zeros((0, 3))),
        None => return Err(error::Structural::from(error::MissingElement::new("Piece".into(), "Points".into())).into()),
    };

    let array = points
        .required_child("DataArray")
        .map_err(error::Structural::from)?;
    let descriptor = DataArrayDescriptor::from_element(array)?;

    if descriptor.numeric_type.is_integer() {
        let unsupported = error::UnsupportedArrayType::new(
            "Points".into(),
            descriptor.numeric_type.as_str().into(),
        );
        return Err(error::Unsupported::from(unsupported).into());
    }

    if descriptor.components != 3 {
        let mismatch = error::UnexpectedAttributeValue::new(
            "Points DataArray".into(),
            "NumberOfComponents".into(),
            "3".into(),
            descriptor.components.to_string(),
        );
        return Err(error::Structural::from(mismatch).into());
    }

    let coordinates: Array2<f64> = decode_array_as(&descriptor, codec)?;

    ensure_count("Piece", "NumberOfPoints", nb_points, coordinates.nrows())?;

    Ok(coordinates)
}

/// Read the `connectivity` and `offsets` arrays of a cell section (`Cells`, `Polys`, ..)
/// into per-cell vertex lists, shifting every vertex index by `vertex_offset`.
pub(crate) fn read_cell_vertices(
    section: &Element,
    codec: &Codec<'_>,
    vertex_offset: usize,
) -> Result<Vec<Vec<usize>>, ParseError> {
    let connectivity: Vec<u64> = decode_named_array(section, "connectivity", codec)?;
    let offsets: Vec<u64> = decode_named_array(section, "offsets", codec)?;

    let mut cells = Vec::with_capacity(offsets.len());
    let mut start = 0;

    for end in offsets.into_iter().map(|end| end as usize) {
        let vertices = connectivity.get(start..end).ok_or_else(|| {
            error::Structural::from(error::CellOffsets::new(
                section.name().into(),
                end,
                connectivity.len(),
            ))
        })?;

        cells.push(
            vertices
                .iter()
                .map(|vertex| *vertex as usize + vertex_offset)
                .collect(),
        );

        start = end;
    }

    Ok(cells)
}

/// the `DataArray` child called `name`
pub(crate) fn named_array<'a>(section: &'a Element, name: &str) -> Result<&'a Element, error::Structural> {
    section
        .children_named("DataArray")
        .find(|array| array.attribute("Name") == Some(name))
        .ok_or_else(|| {
            error::MissingElement::new(section.name().into(), format!("DataArray `{name}`")).into()
        })
}

pub(crate) fn decode_named_array<T: Numeric>(
    section: &Element,
    name: &str,
    codec: &Codec<'_>,
) -> Result<Vec<T>, ParseError> {
    let array = named_array(section, name)?;
    let descriptor = DataArrayDescriptor::from_element(array)?;
    decode_array(&descriptor, codec)
}

/// a count declared on an element must match what was decoded
pub(crate) fn ensure_count(
    element_name: &str,
    attribute_name: &str,
    declared: usize,
    actual: usize,
) -> Result<(), error::Structural> {
    if declared != actual {
        let mismatch = error::UnexpectedAttributeValue::new(
            element_name.into(),
            attribute_name.into(),
            actual.to_string(),
            declared.to_string(),
        );
        return Err(mismatch.into());
    }
    Ok(())
}
