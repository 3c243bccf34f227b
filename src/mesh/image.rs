use crate::prelude::*;

use super::PieceOffsets;
use crate::array::Codec;

use std::str::FromStr;

/// Reader for `.vti` files. The grid is described on the `ImageData` element, pieces
/// only carry attributes, indexed over the whole grid.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageDataReader;

impl BuildTopology for ImageDataReader {
    fn read_dataset_header(
        &self,
        dataset_element: &Element,
        dataset: &mut VtkDataset,
    ) -> Result<(), ParseError> {
        let grid = read_grid_info(dataset_element)?;
        let (nb_points, nb_cells) = grid_counts(dataset_element, &grid)?;

        dataset.nb_vertices = nb_points;
        dataset.nb_cells = nb_cells;
        dataset.grid = Some(grid);

        log::debug!(
            "image grid with extent {:?} ({} points), origin {:?}, spacing {:?}",
            grid.extent,
            nb_points,
            grid.origin,
            grid.spacing
        );

        Ok(())
    }

    fn build_topology(
        &self,
        _piece: &Element,
        _codec: &Codec<'_>,
        _dataset: &mut VtkDataset,
    ) -> Result<PieceOffsets, ParseError> {
        // attributes of every piece are indexed over the whole grid
        Ok(PieceOffsets::default())
    }

    fn confidence(&self, dataset_element: &Element, _codec: &Codec<'_>) -> Result<f64, ParseError> {
        let grid = read_grid_info(dataset_element)?;
        grid_counts(dataset_element, &grid)?;
        Ok(1.0)
    }
}

/// point and cell counts of the grid, an extent too large to index is invalid
fn grid_counts(element: &Element, grid: &GridInfo) -> Result<(usize, usize), error::Structural> {
    grid.nb_points()
        .zip(grid.nb_cells())
        .ok_or_else(|| {
            let extent = element.attribute("WholeExtent").unwrap_or_default();
            error::InvalidAttribute::new(element.name().into(), "WholeExtent".into(), extent.into())
                .into()
        })
}

fn read_grid_info(element: &Element) -> Result<GridInfo, error::Structural> {
    let mut grid = GridInfo::default();

    grid.extent = parse_list(element, "WholeExtent")?
        .ok_or_else(|| error::MissingAttribute::new(element.name().into(), "WholeExtent".into()))?;

    if let Some(origin) = parse_list(element, "Origin")? {
        grid.origin = origin;
    }

    if let Some(spacing) = parse_list(element, "Spacing")? {
        grid.spacing = spacing;
    }

    Ok(grid)
}

/// parse a whitespace separated attribute holding exactly `N` values
fn parse_list<T: FromStr + Copy + Default, const N: usize>(
    element: &Element,
    key: &str,
) -> Result<Option<[T; N]>, error::InvalidAttribute> {
    let value = match element.attribute(key) {
        Some(value) => value,
        None => return Ok(None),
    };

    let invalid = || error::InvalidAttribute::new(element.name().into(), key.into(), value.into());

    let mut out = [T::default(); N];
    let mut tokens = value.split_ascii_whitespace();

    for slot in out.iter_mut() {
        *slot = tokens
            .next()
            .and_then(|token| token.parse().ok())
            .ok_or_else(invalid)?;
    }

    if tokens.next().is_some() {
        return Err(invalid());
    }

    Ok(Some(out))
}
