//! reading and parsing xml VTK files
//!
//! A file is read into an [`Element`] tree in one pass, then decoded: the root element is
//! validated into a [`CodecConfig`](crate::CodecConfig), the `AppendedData` section (if
//! any) is located, and every `Piece` of the dataset element is handed to the reader of
//! the requested [`DatasetKind`](crate::DatasetKind).

mod element;
pub mod error;
mod event_summary;

pub use element::Element;
pub use error::ParseError;

pub(crate) use element::read_element_tree;

use crate::prelude::*;

use crate::appended::AppendedData;
use crate::array::Codec;
use crate::attribute::read_attribute_block;

use quick_xml::reader::Reader;

/// read in and parse an entire vtk file for a given path
pub fn read_and_parse(path: &std::path::Path, kind: DatasetKind) -> Result<VtkDataset, Error> {
    let file = std::fs::File::open(path)?;
    let buf_reader = std::io::BufReader::new(file);
    let reader = Reader::from_reader(buf_reader);

    log::debug!("reading {} file {}", kind.tag(), path.display());

    parse_xml_document(reader, kind)
}

/// parse a vtk document held in memory
pub fn parse_str(xml: &str, kind: DatasetKind) -> Result<VtkDataset, Error> {
    parse_xml_document(Reader::from_str(xml), kind)
}

pub fn parse_xml_document<R: BufRead>(
    mut reader: Reader<R>,
    kind: DatasetKind,
) -> Result<VtkDataset, Error> {
    let root = read_document(&mut reader)?;
    let dataset = parse_root(&root, kind)?;
    Ok(dataset)
}

/// read the whole document into an element tree
pub fn read_document<R: BufRead>(reader: &mut Reader<R>) -> Result<Element, ParseError> {
    // ignore whitespace in the reader
    reader.trim_text(true);

    let mut buffer = Vec::new();
    let root = read_element_tree(reader, &mut buffer)?;

    Ok(root)
}

/// Decode a `VTKFile` element tree for a reader of `kind`.
///
/// Any failure aborts the whole read, no partially decoded dataset is returned.
pub fn parse_root(root: &Element, kind: DatasetKind) -> Result<VtkDataset, ParseError> {
    let config = CodecConfig::from_root(root, kind)?;
    let appended = AppendedData::from_root(root)?;
    let codec = Codec::new(config, appended.as_ref());

    let dataset_element = root
        .required_child(kind.tag())
        .map_err(error::Structural::from)?;

    let reader = kind.reader();
    let mut dataset = VtkDataset::new(kind);

    reader.read_dataset_header(dataset_element, &mut dataset)?;

    for (index, piece) in dataset_element.children_named("Piece").enumerate() {
        let offsets = reader.build_topology(piece, &codec, &mut dataset)?;

        if let Some(point_data) = piece.child("PointData") {
            read_attribute_block(
                point_data,
                offsets.vertex,
                &mut dataset.vertex_attributes,
                &codec,
            )?;
        }

        if let Some(cell_data) = piece.child("CellData") {
            read_attribute_block(
                cell_data,
                offsets.cell,
                &mut dataset.cell_attributes,
                &codec,
            )?;
        }

        log::debug!(
            "finished piece {} (vertex offset {}, cell offset {})",
            index,
            offsets.vertex,
            offsets.cell
        );
    }

    log::debug!(
        "read {} with {} vertices, {} cells, {} point attributes, {} cell attributes",
        kind.tag(),
        dataset.nb_vertices,
        dataset.nb_cells,
        dataset.vertex_attributes.len(),
        dataset.cell_attributes.len()
    );

    Ok(dataset)
}

/// How confident the reader of `kind` is that it can load the document, in `[0, 1]`.
///
/// Only what is needed to judge the file is decoded. Never fails: any error while
/// inspecting the document makes the confidence 0.
pub fn is_loadable(root: &Element, kind: DatasetKind) -> f64 {
    match loadable_confidence(root, kind) {
        Ok(confidence) => confidence.clamp(0.0, 1.0),
        Err(e) => {
            log::debug!("{} reader cannot load the document: {}", kind.tag(), e);
            0.0
        }
    }
}

/// `is_loadable` for a file on disk; unreadable or malformed files have confidence 0
pub fn is_file_loadable(path: &std::path::Path, kind: DatasetKind) -> f64 {
    let root = std::fs::File::open(path)
        .map_err(Error::from)
        .and_then(|file| {
            let mut reader = Reader::from_reader(std::io::BufReader::new(file));
            Ok(read_document(&mut reader)?)
        });

    match root {
        Ok(root) => is_loadable(&root, kind),
        Err(e) => {
            log::debug!("could not inspect {}: {}", path.display(), e);
            0.0
        }
    }
}

fn loadable_confidence(root: &Element, kind: DatasetKind) -> Result<f64, ParseError> {
    let config = CodecConfig::from_root(root, kind)?;
    let appended = AppendedData::from_root(root)?;
    let codec = Codec::new(config, appended.as_ref());

    let dataset_element = root
        .required_child(kind.tag())
        .map_err(error::Structural::from)?;

    kind.reader().confidence(dataset_element, &codec)
}
