use crate::prelude::*;

use ndarray::{Array2, Axis};

#[derive(Debug)]
/// Everything read from one VTK XML file.
///
/// Pieces are concatenated: the vertices of the second piece follow those of the first,
/// and cell vertex indices are shifted accordingly. Point and cell attributes are keyed
/// by the `Name` of their `DataArray`.
pub struct VtkDataset {
    pub kind: DatasetKind,
    pub nb_vertices: usize,
    pub nb_cells: usize,
    /// one row of `x y z` per vertex, empty for image data
    pub points: Array2<f64>,
    /// vertex indices of every cell
    pub cells: Vec<Vec<usize>>,
    /// VTK cell type code of every cell
    pub cell_types: Vec<u8>,
    /// set for image data only
    pub grid: Option<GridInfo>,
    pub vertex_attributes: AttributeManager,
    pub cell_attributes: AttributeManager,
}

impl VtkDataset {
    pub fn new(kind: DatasetKind) -> Self {
        Self {
            kind,
            nb_vertices: 0,
            nb_cells: 0,
            points: Array2::zeros((0, 3)),
            cells: Vec::new(),
            cell_types: Vec::new(),
            grid: None,
            vertex_attributes: AttributeManager::new(),
            cell_attributes: AttributeManager::new(),
        }
    }

    /// append the points of a piece, returning the index of the first new vertex
    pub(crate) fn append_points(
        &mut self,
        points: Array2<f64>,
        array_name: &str,
    ) -> Result<usize, error::DataShape> {
        let offset = self.nb_vertices;
        let rows = points.nrows();

        self.points
            .append(Axis(0), points.view())
            .map_err(|_| error::DataShape::new(array_name.into(), points.len(), 3))?;
        self.nb_vertices += rows;

        Ok(offset)
    }

    /// append the cells of a piece, returning the index of the first new cell
    pub(crate) fn append_cells(&mut self, cells: Vec<Vec<usize>>, types: Vec<u8>) -> usize {
        let offset = self.nb_cells;

        self.nb_cells += cells.len();
        self.cells.extend(cells);
        self.cell_types.extend(types);

        offset
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// Geometry of an `ImageData` grid
pub struct GridInfo {
    /// `x0 x1 y0 y1 z0 z1` point index bounds, inclusive
    pub extent: [i64; 6],
    pub origin: [f64; 3],
    pub spacing: [f64; 3],
}

impl Default for GridInfo {
    fn default() -> Self {
        Self {
            extent: [0; 6],
            origin: [0.0; 3],
            spacing: [1.0; 3],
        }
    }
}

impl GridInfo {
    /// number of points along each axis, `None` when it does not fit in a `usize`
    pub fn dimensions(&self) -> Option<[usize; 3]> {
        let mut out = [0; 3];
        for (axis, dim) in out.iter_mut().enumerate() {
            let span = self.extent[2 * axis + 1].checked_sub(self.extent[2 * axis])?;
            *dim = usize::try_from(span.max(0)).ok()?.checked_add(1)?;
        }
        Some(out)
    }

    pub fn nb_points(&self) -> Option<usize> {
        self.dimensions()?
            .iter()
            .try_fold(1usize, |total, points| total.checked_mul(*points))
    }

    /// number of cells, flat axes (a single point thick) do not count
    pub fn nb_cells(&self) -> Option<usize> {
        self.dimensions()?
            .iter()
            .map(|points| points.saturating_sub(1).max(1))
            .try_fold(1usize, |total, cells| total.checked_mul(cells))
    }
}
