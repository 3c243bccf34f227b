use crate::prelude::*;

use super::{ensure_count, read_cell_vertices, read_points, PieceOffsets};
use crate::array::Codec;

/// cell sections of a `PolyData` piece, in the order their cells are numbered
const SECTIONS: [(&str, &str); 4] = [
    ("Verts", "NumberOfVerts"),
    ("Lines", "NumberOfLines"),
    ("Strips", "NumberOfStrips"),
    ("Polys", "NumberOfPolys"),
];

/// Reader for `.vtp` files
#[derive(Debug, Clone, Copy, Default)]
pub struct PolyDataReader;

impl BuildTopology for PolyDataReader {
    fn build_topology(
        &self,
        piece: &Element,
        codec: &Codec<'_>,
        dataset: &mut VtkDataset,
    ) -> Result<PieceOffsets, ParseError> {
        let nb_points: usize = piece.parse_attribute("NumberOfPoints")?;

        let points = read_points(piece, codec, nb_points)?;
        let vertex = dataset.append_points(points, "Points")?;

        let mut cells = Vec::new();
        let mut types = Vec::new();

        for (section_name, count_attribute) in SECTIONS {
            let declared = piece
                .parse_optional_attribute::<usize>(count_attribute)
                .map_err(error::Structural::from)?
                .unwrap_or(0);

            let section = match piece.child(section_name) {
                Some(section) => section,
                None => {
                    ensure_count("Piece", count_attribute, declared, 0)?;
                    continue;
                }
            };

            let section_cells = read_cell_vertices(section, codec, vertex)?;
            ensure_count("Piece", count_attribute, declared, section_cells.len())?;

            types.extend(
                section_cells
                    .iter()
                    .map(|vertices| cell_type(section_name, vertices.len())),
            );
            cells.extend(section_cells);
        }

        log::debug!(
            "PolyData piece: {} points, {} cells",
            nb_points,
            cells.len()
        );

        let cell = dataset.append_cells(cells, types);

        Ok(PieceOffsets { vertex, cell })
    }

    /// the fraction of pieces declaring a valid `NumberOfPoints`
    fn confidence(&self, dataset_element: &Element, _codec: &Codec<'_>) -> Result<f64, ParseError> {
        let mut nb_pieces = 0;
        let mut loadable = 0;

        for piece in dataset_element.children_named("Piece") {
            nb_pieces += 1;
            if piece.parse_attribute::<usize>("NumberOfPoints").is_ok() {
                loadable += 1;
            }
        }

        if nb_pieces == 0 {
            return Ok(0.0);
        }

        Ok(loadable as f64 / nb_pieces as f64)
    }
}

/// VTK cell type code of a poly data cell
fn cell_type(section_name: &str, nb_vertices: usize) -> u8 {
    match (section_name, nb_vertices) {
        ("Verts", 1) => 1,
        ("Verts", _) => 2,
        ("Lines", 2) => 3,
        ("Lines", _) => 4,
        ("Strips", _) => 6,
        (_, 3) => 5,
        (_, 4) => 9,
        _ => 7,
    }
}
