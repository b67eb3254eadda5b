//! Integration tests for isomesh
//!
//! These tests drive the public API from a source file to mesh files.

use isomesh::format::MESH_EXTENSION;
use isomesh::mesh::IntermediateMesh;
use isomesh::partition::{read_partition, RangePartitioner};
use isomesh::pipeline::{BuildRequest, Pipeline, PipelineOptions};
use isomesh::query::ColumnarReader;
use isomesh::store::{
    load_schema, read_column, CacheLayout, ColumnStore, IngestOptions, MinMax,
};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

/// Ten-by-ten-by-ten lattice of cells with a radial `Temp` attribute and two
/// trailing bookkeeping columns.
fn write_lattice(dir: &Path) -> PathBuf {
    let mut csv = String::from("CellNumber,Temp,Pressure,X,Y,Z,Label,Flag\n");
    for row in 0..1000 {
        let (x, y, z) = (row % 10, (row / 10) % 10, row / 100);
        let r2 = (x as f32 - 4.5).powi(2) + (y as f32 - 4.5).powi(2) + (z as f32 - 4.5).powi(2);
        let temp = 100.0 - r2;
        let pressure = (row % 7) as f32 * 0.5;
        csv.push_str(&format!("{row},{temp},{pressure},{x},{y},{z},cell{row},1\n"));
    }
    let path = dir.join("lattice.csv");
    fs::write(&path, csv).unwrap();
    path
}

fn request(source: PathBuf) -> BuildRequest {
    BuildRequest {
        source,
        divisions: 4,
        attribute: "Temp".to_string(),
        resolution: 1000,
        threads: 3,
        axes: ["X".to_string(), "Y".to_string(), "Z".to_string()],
        iso_level: 0.5,
        split_columns: Vec::new(),
    }
}

/// The five-row source from the format documentation
#[test]
fn test_five_row_source() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("five.csv");
    fs::write(
        &source,
        "CellNumber,A,B,X,Y,Z\n0,1,2,3,4,5\n1,6,7,8,9,10\n2,11,12,13,14,15\n3,16,17,18,19,20\n4,21,22,23,24,25\n",
    )
    .unwrap();

    let cache = CacheLayout::new(dir.path().join("cache"));
    let options = IngestOptions::default().with_trailing_columns(0);
    let summary = ColumnStore::with_options(cache.clone(), options)
        .ingest(&source)
        .unwrap();
    assert_eq!(summary.row_count, 5);

    let dataset = cache.dataset("five");
    for (offset, column) in ["A", "B", "X", "Y", "Z"].iter().enumerate() {
        let expected: Vec<f32> = (0..5).map(|row| (row * 5 + offset + 1) as f32).collect();
        let path = dataset.column_file(column);
        assert_eq!(fs::metadata(&path).unwrap().len(), 20);
        assert_eq!(read_column(&path).unwrap(), expected);
        assert_eq!(
            MinMax::read(&dataset.minmax_file(column)).unwrap(),
            MinMax {
                min: expected[0],
                max: expected[4]
            }
        );
    }
}

/// Full build: every surviving partition gets a valid mesh
#[test]
fn test_build_end_to_end() {
    let dir = tempdir().unwrap();
    let source = write_lattice(dir.path());
    let cache = CacheLayout::new(dir.path().join("cache"));

    let summary = Pipeline::new(cache.clone()).run(&request(source)).unwrap();

    // Label and Flag are dropped as trailing columns.
    let dataset = cache.dataset("lattice");
    assert_eq!(
        load_schema(&dataset).unwrap().columns(),
        &["Temp", "Pressure", "X", "Y", "Z"]
    );
    assert_eq!(summary.ingest.row_count, 1000);
    assert!(summary.partition.is_complete());
    assert!(summary.meshes.is_complete());

    let temp = summary
        .partition
        .columns
        .iter()
        .find(|c| c.column == "Temp")
        .unwrap();
    assert!(!temp.files.is_empty());

    // One mesh per Temp partition, none split at the default cap.
    let stems: BTreeSet<String> = temp
        .files
        .iter()
        .map(|f| f.path.file_stem().unwrap().to_string_lossy().into_owned())
        .collect();
    let meshes: BTreeSet<String> = summary
        .meshes
        .meshes
        .iter()
        .map(|m| m.path.file_stem().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(stems, meshes);

    for file in &summary.meshes.meshes {
        assert_eq!(
            file.path.extension().unwrap().to_string_lossy(),
            MESH_EXTENSION
        );
        let mesh = IntermediateMesh::read(&file.path).unwrap();
        assert_eq!(mesh.vertex_count(), file.vertices);
        assert_eq!(mesh.triangle_count(), file.triangles);
        assert!(mesh
            .triangles()
            .iter()
            .all(|&i| (i as usize) < mesh.vertex_count()));

        // Welded: no vertex value appears twice.
        let mut welded = mesh.clone();
        welded.make_unique();
        assert_eq!(welded, mesh);
    }
}

/// A small split cap yields numbered pieces under the cap
#[test]
fn test_build_with_split_cap() {
    let dir = tempdir().unwrap();
    let source = write_lattice(dir.path());
    let options = PipelineOptions {
        split_cap: 300,
        ..Default::default()
    };
    let pipeline = Pipeline::with_options(CacheLayout::new(dir.path().join("cache")), options);

    let summary = pipeline.run(&request(source)).unwrap();
    assert!(summary.meshes.is_complete());
    assert!(summary.meshes.meshes.iter().all(|m| m.vertices <= 300));

    let split = summary.meshes.meshes.iter().any(|m| {
        let stem = m.path.file_stem().unwrap().to_string_lossy().into_owned();
        stem.matches('_').count() == 2
    });
    assert!(split);
}

/// Surviving partitions plus dropped buckets account for every cell
#[test]
fn test_partitions_cover_every_cell() {
    let dir = tempdir().unwrap();
    let source = write_lattice(dir.path());
    let cache = CacheLayout::new(dir.path().join("cache"));
    ColumnStore::new(cache.clone()).ingest(&source).unwrap();

    let partitioner = RangePartitioner::new(cache.dataset("lattice"));
    let report = partitioner
        .split_columns(&["Temp".to_string(), "Pressure".to_string()], 6, 2)
        .unwrap();
    assert!(report.is_complete());

    for column in &report.columns {
        let mut ids = BTreeSet::new();
        for file in &column.files {
            let records = read_partition(&file.path).unwrap();
            assert_eq!(records.len(), file.records);
            assert!(records.windows(2).all(|w| w[0].value <= w[1].value));
            assert!(records
                .iter()
                .all(|r| r.value > file.lower || file.lower == 0.0));
            assert!(records.iter().all(|r| r.value <= file.upper));
            for record in records {
                assert!(ids.insert(record.cell_id));
            }
        }
        assert_eq!(ids.len() + column.discarded_records, 1000);
    }
}

/// Random-access reads agree with the source rows
#[test]
fn test_query_rows_match_source() {
    let dir = tempdir().unwrap();
    let source = write_lattice(dir.path());
    let cache = CacheLayout::new(dir.path().join("cache"));
    ColumnStore::new(cache.clone()).ingest(&source).unwrap();

    let dataset = cache.dataset("lattice");
    let mut reader = ColumnarReader::open_all(&dataset).unwrap();
    let rows = reader.read_rows(&[999, 0, 123, 123]).unwrap();

    let ids: Vec<u32> = rows.iter().map(|r| r.cell_id).collect();
    assert_eq!(ids, vec![0, 123, 999]);
    // Row 123 sits at (3, 2, 1).
    assert_eq!(rows[1].values[2..], [3.0, 2.0, 1.0]);
    assert_eq!(rows[1].values[1], (123 % 7) as f32 * 0.5);

    let json = rows[2].to_json(&reader.columns());
    assert_eq!(json["cell"], 999);
    assert_eq!(json["values"]["Z"], 9.0);
}

/// Running the same build twice leaves the same set of outputs
#[test]
fn test_rebuild_is_repeatable() {
    let dir = tempdir().unwrap();
    let source = write_lattice(dir.path());
    let pipeline = Pipeline::new(CacheLayout::new(dir.path().join("cache")));

    let first = pipeline.run(&request(source.clone())).unwrap();
    let second = pipeline.run(&request(source)).unwrap();

    let paths = |report: &isomesh::pipeline::MeshBuildReport| -> Vec<PathBuf> {
        report.meshes.iter().map(|m| m.path.clone()).collect()
    };
    assert_eq!(paths(&first.meshes), paths(&second.meshes));

    let mut on_disk: Vec<PathBuf> = fs::read_dir(&second.meshes.output_dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    on_disk.sort();
    assert_eq!(on_disk, paths(&second.meshes));
}
