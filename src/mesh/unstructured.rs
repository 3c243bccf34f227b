use crate::prelude::*;

use super::{ensure_count, named_array, read_cell_vertices, read_points, PieceOffsets};
use crate::array::{decode_array, Codec, DataArrayDescriptor};

/// linear cells: vertex, line, triangle, polygon, quad, tetra, voxel, hexahedron, wedge, pyramid
pub const SUPPORTED_CELL_TYPES: [u8; 10] = [1, 3, 5, 7, 9, 10, 11, 12, 13, 14];

/// Reader for `.vtu` files
#[derive(Debug, Clone, Copy, Default)]
pub struct UnstructuredGridReader;

impl BuildTopology for UnstructuredGridReader {
    fn build_topology(
        &self,
        piece: &Element,
        codec: &Codec<'_>,
        dataset: &mut VtkDataset,
    ) -> Result<PieceOffsets, ParseError> {
        let nb_points: usize = piece.parse_attribute("NumberOfPoints")?;
        let nb_cells: usize = piece.parse_attribute("NumberOfCells")?;

        let points = read_points(piece, codec, nb_points)?;
        let vertex = dataset.append_points(points, "Points")?;

        let (cells, types) = match piece.child("Cells") {
            Some(section) => {
                let cells = read_cell_vertices(section, codec, vertex)?;
                let types = read_cell_types(section, codec)?;
                (cells, types)
            }
            None => (Vec::new(), Vec::new()),
        };

        ensure_count("Piece", "NumberOfCells", nb_cells, cells.len())?;
        ensure_count("Piece", "NumberOfCells", nb_cells, types.len())?;

        log::debug!("UnstructuredGrid piece: {} points, {} cells", nb_points, nb_cells);

        let cell = dataset.append_cells(cells, types);

        Ok(PieceOffsets { vertex, cell })
    }

    /// the fraction of cells, over all pieces, whose type is a supported linear cell
    fn confidence(&self, dataset_element: &Element, codec: &Codec<'_>) -> Result<f64, ParseError> {
        let mut nb_pieces = 0;
        let mut nb_cells = 0;
        let mut supported = 0;

        for piece in dataset_element.children_named("Piece") {
            nb_pieces += 1;

            let section = match piece.child("Cells") {
                Some(section) => section,
                None => continue,
            };

            let types = read_cell_types(section, codec)?;
            nb_cells += types.len();
            supported += types
                .iter()
                .filter(|&&cell_type| SUPPORTED_CELL_TYPES.contains(&cell_type))
                .count();
        }

        let confidence = match (nb_pieces, nb_cells) {
            (0, _) => 0.0,
            // point clouds only
            (_, 0) => 1.0,
            _ => supported as f64 / nb_cells as f64,
        };

        Ok(confidence)
    }
}

/// the `types` array of a `Cells` section, stored as `UInt8` or `Int32`
fn read_cell_types(section: &Element, codec: &Codec<'_>) -> Result<Vec<u8>, ParseError> {
    let array = named_array(section, "types")?;
    let descriptor = DataArrayDescriptor::from_element(array)?;

    match descriptor.numeric_type {
        NumericType::UInt8 | NumericType::Int32 => decode_array(&descriptor, codec),
        other => {
            let unsupported = error::UnsupportedArrayType::new("types".into(), other.as_str().into());
            Err(error::Unsupported::from(unsupported).into())
        }
    }
}
