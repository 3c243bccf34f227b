use ndarray::{Array1, Array2};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;

use vtk_xml_codec::write_vtk::{end_element, start_element};
use vtk_xml_codec::{
    parse_str, write_appended_dataarray, write_document_end, write_document_start,
    write_inline_dataarray, AppendedDataBuilder, CodecConfig, Compression, DatasetKind, Encoding,
    Error, HeaderType, Index, Numeric, ParseError, VtkDataset, Writer,
};

/// where the arrays of a generated document are stored
#[derive(Clone, Copy, Debug)]
enum Layout {
    Inline(Encoding),
    Appended { block_size: usize },
}

enum Target {
    Inline(Encoding, CodecConfig),
    Appended(AppendedDataBuilder),
}

fn write_array<T: Numeric>(
    writer: &mut Writer<Vec<u8>>,
    target: &mut Target,
    name: &str,
    values: &[T],
    components: usize,
) {
    match target {
        Target::Inline(encoding, config) => {
            write_inline_dataarray(writer, name, values, components, *encoding, config).unwrap()
        }
        Target::Appended(appended) => {
            write_appended_dataarray(writer, appended, name, values, components).unwrap()
        }
    }
}

/// the arrays of one `PolyData` piece
#[derive(Clone, Debug)]
struct PieceData {
    points: Array2<f64>,
    pressure: Vec<f64>,
    velocity: Vec<f32>,
    ids: Vec<i32>,
    flags: Vec<u8>,
    material: Vec<i64>,
}

impl PieceData {
    fn random(nb_points: usize) -> Self {
        let nb_cells = nb_points - 2;

        let mut material = Array1::random(nb_cells, Uniform::new(-5i64, 5)).to_vec();
        // negative values need 64 bit storage
        material[0] = -1;

        Self {
            points: Array2::random((nb_points, 3), Uniform::new(-1., 1.)),
            pressure: Array1::random(nb_points, Uniform::new(0., 1e5)).to_vec(),
            velocity: Array1::random(3 * nb_points, Uniform::new(-10f32, 10.)).to_vec(),
            ids: Array1::random(nb_points, Uniform::new(0i32, 1000)).to_vec(),
            flags: Array1::random(2 * nb_points, Uniform::new(0u8, 255)).to_vec(),
            material,
        }
    }

    fn nb_points(&self) -> usize {
        self.points.nrows()
    }

    /// a triangle fan around the first point
    fn connectivity(&self) -> (Vec<i64>, Vec<i64>) {
        let nb_cells = self.nb_points() - 2;
        let mut connectivity = Vec::new();
        let mut offsets = Vec::new();

        for cell in 0..nb_cells {
            connectivity.extend([0, cell as i64 + 1, cell as i64 + 2]);
            offsets.push(3 * (cell as i64 + 1));
        }

        (connectivity, offsets)
    }
}

fn write_polydata(pieces: &[PieceData], config: CodecConfig, layout: Layout) -> String {
    let mut writer = Writer::new(Vec::new());
    let mut target = match layout {
        Layout::Inline(encoding) => Target::Inline(encoding, config),
        Layout::Appended { block_size } => {
            Target::Appended(AppendedDataBuilder::new(config).with_block_size(block_size))
        }
    };

    write_document_start(&mut writer, DatasetKind::PolyData, &config).unwrap();
    start_element(&mut writer, "PolyData", &[]).unwrap();

    for piece in pieces {
        let nb_points = piece.nb_points().to_string();
        let nb_polys = (piece.nb_points() - 2).to_string();
        start_element(
            &mut writer,
            "Piece",
            &[("NumberOfPoints", &nb_points), ("NumberOfPolys", &nb_polys)],
        )
        .unwrap();

        start_element(&mut writer, "PointData", &[]).unwrap();
        write_array(&mut writer, &mut target, "pressure", &piece.pressure, 1);
        write_array(&mut writer, &mut target, "velocity", &piece.velocity, 3);
        write_array(&mut writer, &mut target, "ids", &piece.ids, 1);
        write_array(&mut writer, &mut target, "flags", &piece.flags, 2);
        end_element(&mut writer, "PointData").unwrap();

        start_element(&mut writer, "CellData", &[]).unwrap();
        write_array(&mut writer, &mut target, "material", &piece.material, 1);
        end_element(&mut writer, "CellData").unwrap();

        start_element(&mut writer, "Points", &[]).unwrap();
        let points: Vec<f64> = piece.points.iter().copied().collect();
        write_array(&mut writer, &mut target, "Points", &points, 3);
        end_element(&mut writer, "Points").unwrap();

        let (connectivity, offsets) = piece.connectivity();
        start_element(&mut writer, "Polys", &[]).unwrap();
        write_array(&mut writer, &mut target, "connectivity", &connectivity, 1);
        write_array(&mut writer, &mut target, "offsets", &offsets, 1);
        end_element(&mut writer, "Polys").unwrap();

        end_element(&mut writer, "Piece").unwrap();
    }

    end_element(&mut writer, "PolyData").unwrap();

    if let Target::Appended(appended) = target {
        appended.write(&mut writer).unwrap();
    }

    write_document_end(&mut writer).unwrap();

    String::from_utf8(writer.into_inner()).unwrap()
}

fn check_polydata(dataset: &VtkDataset, pieces: &[PieceData]) {
    let nb_points: usize = pieces.iter().map(|p| p.nb_points()).sum();
    let nb_cells: usize = pieces.iter().map(|p| p.nb_points() - 2).sum();

    assert_eq!(dataset.nb_vertices, nb_points);
    assert_eq!(dataset.nb_cells, nb_cells);

    let mut vertex_offset = 0;
    let mut cell_offset = 0;

    for piece in pieces {
        for (row, point) in piece.points.outer_iter().enumerate() {
            assert_eq!(dataset.points.row(vertex_offset + row), point);
        }

        let pressure = dataset.vertex_attributes.find_attribute::<f64>("pressure").unwrap();
        let velocity = dataset
            .vertex_attributes
            .find_attribute::<[f64; 3]>("velocity")
            .unwrap();
        let ids = dataset.vertex_attributes.find_attribute::<Index>("ids").unwrap();
        let flags = dataset
            .vertex_attributes
            .find_attribute::<[Index; 2]>("flags")
            .unwrap();

        for vertex in 0..piece.nb_points() {
            let element = vertex_offset + vertex;

            assert_eq!(*pressure.value(element), piece.pressure[vertex]);
            assert_eq!(*ids.value(element), piece.ids[vertex] as Index);

            let expected_velocity = [
                piece.velocity[3 * vertex] as f64,
                piece.velocity[3 * vertex + 1] as f64,
                piece.velocity[3 * vertex + 2] as f64,
            ];
            assert_eq!(velocity.value(element), &expected_velocity);

            let expected_flags = [
                piece.flags[2 * vertex] as Index,
                piece.flags[2 * vertex + 1] as Index,
            ];
            assert_eq!(flags.value(element), &expected_flags);
        }

        let material = dataset.cell_attributes.find_attribute::<i64>("material").unwrap();
        for cell in 0..piece.nb_points() - 2 {
            assert_eq!(*material.value(cell_offset + cell), piece.material[cell]);
            assert_eq!(
                dataset.cells[cell_offset + cell],
                vec![vertex_offset, vertex_offset + cell + 1, vertex_offset + cell + 2]
            );
        }

        vertex_offset += piece.nb_points();
        cell_offset += piece.nb_points() - 2;
    }
}

fn configs() -> [CodecConfig; 4] {
    [
        CodecConfig::new(Compression::None, HeaderType::UInt32),
        CodecConfig::new(Compression::None, HeaderType::UInt64),
        CodecConfig::new(Compression::ZLib, HeaderType::UInt32),
        CodecConfig::new(Compression::ZLib, HeaderType::UInt64),
    ]
}

#[test]
fn every_encoding_round_trips() {
    let pieces = [PieceData::random(40), PieceData::random(17)];

    let layouts = [
        Layout::Inline(Encoding::Ascii),
        Layout::Inline(Encoding::Base64),
        Layout::Appended {
            block_size: vtk_xml_codec::write_vtk::DEFAULT_BLOCK_SIZE,
        },
        // several zlib blocks per array, with a partial last block
        Layout::Appended { block_size: 100 },
    ];

    for config in configs() {
        for layout in layouts {
            let xml = write_polydata(&pieces, config, layout);
            let dataset = parse_str(&xml, DatasetKind::PolyData)
                .unwrap_or_else(|e| panic!("{config:?} {layout:?}: {e}"));
            check_polydata(&dataset, &pieces);
        }
    }
}

#[test]
fn read_from_file() {
    let pieces = [PieceData::random(25)];
    let config = CodecConfig::new(Compression::ZLib, HeaderType::UInt64);
    let xml = write_polydata(&pieces, config, Layout::Appended { block_size: 64 });

    let path = std::env::temp_dir().join("vtk_xml_codec_read_from_file.vtp");
    std::fs::write(&path, xml).unwrap();

    let dataset = vtk_xml_codec::read_vtk(&path, DatasetKind::PolyData).unwrap();
    check_polydata(&dataset, &pieces);

    assert_eq!(
        vtk_xml_codec::is_file_loadable(&path, DatasetKind::PolyData),
        1.0
    );
    assert_eq!(
        vtk_xml_codec::is_file_loadable(&path, DatasetKind::UnstructuredGrid),
        0.0
    );

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn missing_file() {
    let path = std::path::Path::new("./does/not/exist.vtp");

    let out = vtk_xml_codec::read_vtk(path, DatasetKind::PolyData);
    assert!(matches!(out, Err(Error::Io(_))));
    assert_eq!(vtk_xml_codec::is_file_loadable(path, DatasetKind::PolyData), 0.0);
}

#[test]
fn corrupt_appended_section_fails_the_read() {
    let pieces = [PieceData::random(10)];
    let config = CodecConfig::new(Compression::ZLib, HeaderType::UInt32);
    let xml = write_polydata(&pieces, config, Layout::Appended { block_size: 32 });

    // drop the end of the blob, the last arrays run past it
    let end = xml.rfind("</AppendedData>").unwrap();
    let corrupted = format!("{}{}", &xml[..end - 40], &xml[end..]);

    let out = parse_str(&corrupted, DatasetKind::PolyData);
    assert!(matches!(
        out,
        Err(Error::Parse(ParseError::Decode(_))) | Err(Error::Parse(ParseError::Structural(_)))
    ));
}

#[test]
fn big_endian_rejected() {
    let pieces = [PieceData::random(5)];
    let xml = write_polydata(&pieces, CodecConfig::default(), Layout::Inline(Encoding::Base64))
        .replace("LittleEndian", "BigEndian");

    let out = parse_str(&xml, DatasetKind::PolyData);
    assert!(matches!(out, Err(Error::Parse(ParseError::Unsupported(_)))));
}

#[test]
fn unstructured_grid_compressed() {
    let config = CodecConfig::new(Compression::ZLib, HeaderType::UInt32);
    let mut writer = Writer::new(Vec::new());
    let mut appended = AppendedDataBuilder::new(config).with_block_size(16);

    let points: Vec<f32> = vec![
        0., 0., 0., 1., 0., 0., 0., 1., 0., 0., 0., 1., 1., 1., 1.,
    ];
    let temperature: Vec<f64> = vec![10., 20., 30., 40., 50.];
    let connectivity: Vec<i64> = vec![0, 1, 2, 3, 1, 2, 3, 4];
    let offsets: Vec<i64> = vec![4, 8];
    let types: Vec<u8> = vec![10, 10];

    write_document_start(&mut writer, DatasetKind::UnstructuredGrid, &config).unwrap();
    start_element(&mut writer, "UnstructuredGrid", &[]).unwrap();
    start_element(
        &mut writer,
        "Piece",
        &[("NumberOfPoints", "5"), ("NumberOfCells", "2")],
    )
    .unwrap();

    start_element(&mut writer, "PointData", &[]).unwrap();
    write_appended_dataarray(&mut writer, &mut appended, "temperature", &temperature, 1).unwrap();
    end_element(&mut writer, "PointData").unwrap();

    start_element(&mut writer, "Points", &[]).unwrap();
    write_appended_dataarray(&mut writer, &mut appended, "Points", &points, 3).unwrap();
    end_element(&mut writer, "Points").unwrap();

    start_element(&mut writer, "Cells", &[]).unwrap();
    write_appended_dataarray(&mut writer, &mut appended, "connectivity", &connectivity, 1).unwrap();
    write_appended_dataarray(&mut writer, &mut appended, "offsets", &offsets, 1).unwrap();
    write_appended_dataarray(&mut writer, &mut appended, "types", &types, 1).unwrap();
    end_element(&mut writer, "Cells").unwrap();

    end_element(&mut writer, "Piece").unwrap();
    end_element(&mut writer, "UnstructuredGrid").unwrap();
    appended.write(&mut writer).unwrap();
    write_document_end(&mut writer).unwrap();

    let xml = String::from_utf8(writer.into_inner()).unwrap();
    let dataset = parse_str(&xml, DatasetKind::UnstructuredGrid).unwrap();

    assert_eq!(dataset.nb_vertices, 5);
    assert_eq!(dataset.cells, vec![vec![0, 1, 2, 3], vec![1, 2, 3, 4]]);
    assert_eq!(dataset.cell_types, vec![10, 10]);
    assert_eq!(dataset.points[[4, 2]], 1.0);

    let temperature_attribute = dataset
        .vertex_attributes
        .find_attribute::<f64>("temperature")
        .unwrap();
    assert_eq!(temperature_attribute.values(), temperature.as_slice());

    let mut reader = vtk_xml_codec::Reader::from_str(&xml);
    let root = vtk_xml_codec::parse::read_document(&mut reader).unwrap();
    assert_eq!(
        vtk_xml_codec::is_loadable(&root, DatasetKind::UnstructuredGrid),
        1.0
    );
}
