use super::*;
use crate::mesh::{IntermediateMesh, IsosurfaceExtractor, MeshError};
use crate::partition::{write_partition, FieldCell, RangePartitioner};
use crate::point::Point;
use crate::store::{CacheLayout, ColumnStore, DatasetLayout, IngestOptions};
use crate::voxel::{read_voxels, BoundingBox, ScalarField};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

/// 64 cells on a 4x4x4 lattice; `T` is the row number plus one.
fn lattice_source(dir: &TempDir) -> PathBuf {
    let mut csv = String::from("CellNumber,T,X,Y,Z\n");
    for row in 0..64 {
        let (x, y, z) = (row % 4, (row / 4) % 4, row / 16);
        csv.push_str(&format!("{row},{},{x},{y},{z}\n", row + 1));
    }
    let path = dir.path().join("lattice.csv");
    fs::write(&path, csv).unwrap();
    path
}

fn ingest(dir: &TempDir) -> (CacheLayout, DatasetLayout) {
    let source = lattice_source(dir);
    let cache = CacheLayout::new(dir.path().join("cache"));
    ColumnStore::with_options(cache.clone(), IngestOptions::default().with_trailing_columns(0))
        .ingest(&source)
        .unwrap();
    let dataset = cache.dataset("lattice");
    (cache, dataset)
}

/// Ingested and split into `0_32` (the lower slab) and `32_64`.
fn partitioned(dir: &TempDir) -> DatasetLayout {
    let (_, dataset) = ingest(dir);
    RangePartitioner::new(dataset.clone())
        .split_column("T", 2)
        .unwrap();
    dataset
}

fn config() -> MeshBuildConfig {
    MeshBuildConfig::new("T")
        .with_resolution(27)
        .with_threads(2)
        .with_iso_level(0.5)
}

fn file_names(paths: impl IntoIterator<Item = PathBuf>) -> Vec<String> {
    paths
        .into_iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

fn dir_names(dir: &Path) -> Vec<String> {
    let mut names = file_names(fs::read_dir(dir).unwrap().map(|e| e.unwrap().path()));
    names.sort();
    names
}

// ==================== Assembler ====================

#[test]
fn test_assemble_joins_axis_columns() {
    let dir = tempdir().unwrap();
    let (_, dataset) = ingest(&dir);
    let mut assembler = PointCloudAssembler::open(&dataset, ["X", "Y", "Z"]).unwrap();

    let cells = assembler
        .assemble(&[
            FieldCell::new(21, 22.0),
            FieldCell::new(5, 6.0),
            FieldCell::new(21, 22.0),
        ])
        .unwrap();

    assert_eq!(
        cells,
        vec![
            AttCoordCell {
                cell_id: 5,
                value: 6.0,
                point: Point::new(1.0, 1.0, 0.0),
            },
            AttCoordCell {
                cell_id: 21,
                value: 22.0,
                point: Point::new(1.0, 1.0, 1.0),
            },
        ]
    );
}

#[test]
fn test_voxelize_partition() {
    let dir = tempdir().unwrap();
    let dataset = partitioned(&dir);
    let bbox = BoundingBox::from_columns(&dataset, ["X", "Y", "Z"]).unwrap();
    let mut assembler = PointCloudAssembler::open(&dataset, ["X", "Y", "Z"]).unwrap();

    let grid = assembler
        .voxelize(&dataset.partition_file("T", 0.0, 32.0), 27, bbox)
        .unwrap();
    assert_eq!(grid.dims(), [4, 4, 4]);
    assert_eq!(grid.len(), 32);
    assert_eq!(grid.occupied_bins(), 32);
    assert_eq!(grid.cells([3, 3, 1]), &[31]);
    assert!(grid.cells([0, 0, 2]).is_empty());
}

#[test]
fn test_voxelize_rejects_tiny_cloud() {
    let dir = tempdir().unwrap();
    let dataset = partitioned(&dir);
    let bbox = BoundingBox::from_columns(&dataset, ["X", "Y", "Z"]).unwrap();
    let tiny = dataset.partition_file("T", 64.0, 65.0);
    write_partition(&tiny, &[FieldCell::new(0, 64.5), FieldCell::new(63, 64.5)]).unwrap();

    let mut assembler = PointCloudAssembler::open(&dataset, ["X", "Y", "Z"]).unwrap();
    let err = assembler.voxelize(&tiny, 27, bbox).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::TooFewPoints { points: 2, ref partition } if partition == &tiny
    ));
}

// ==================== Mesh build ====================

#[test]
fn test_build_meshes_every_partition() {
    let dir = tempdir().unwrap();
    let dataset = partitioned(&dir);

    let report = MeshBuildOrchestrator::new(dataset.clone(), config())
        .build()
        .unwrap();

    assert!(report.is_complete());
    assert_eq!(report.output_dir, dataset.mesh_dir("T", 27));
    assert_eq!(
        file_names(report.meshes.iter().map(|m| m.path.clone())),
        vec!["0_32.imf", "32_64.imf"]
    );

    // A 4x4x2 slab: 64 unit faces, 66 distinct corners on its surface.
    for mesh in &report.meshes {
        assert_eq!(mesh.triangles, 128);
        assert_eq!(mesh.vertices, 66);
        let read = IntermediateMesh::read(&mesh.path).unwrap();
        assert_eq!(read.vertex_count(), 66);
    }
    assert_eq!(dir_names(&report.output_dir), vec!["0_32.imf", "32_64.imf"]);
}

#[test]
fn test_build_splits_large_meshes() {
    let dir = tempdir().unwrap();
    let dataset = partitioned(&dir);

    let report = MeshBuildOrchestrator::new(dataset, config().with_split_cap(20))
        .build()
        .unwrap();

    assert!(report.is_complete());
    let names = file_names(report.meshes.iter().map(|m| m.path.clone()));
    assert!(names.len() > 2);
    assert!(names.contains(&"0_32_0.imf".to_string()));
    assert!(names.contains(&"32_64_0.imf".to_string()));
    assert!(!names.contains(&"0_32.imf".to_string()));
    assert!(report.meshes.iter().all(|m| m.vertices <= 20));

    let triangles: usize = report
        .meshes
        .iter()
        .filter(|m| m.path.file_name().unwrap().to_string_lossy().starts_with("0_32_"))
        .map(|m| m.triangles)
        .sum();
    assert_eq!(triangles, 128);
}

#[test]
fn test_build_writes_debug_grids() {
    let dir = tempdir().unwrap();
    let dataset = partitioned(&dir);

    let report = MeshBuildOrchestrator::new(dataset, config().with_debug_grids(true))
        .build()
        .unwrap();

    let field = ScalarField::read(&report.output_dir.join("0_32.fara")).unwrap();
    assert_eq!(field.dims(), [4, 4, 4]);
    assert_eq!(field.get(0, 0, 0), Some(1.0));
    assert_eq!(field.get(0, 0, 3), Some(0.0));

    let voxels = read_voxels(&report.output_dir.join("32_64.vox")).unwrap();
    assert_eq!(voxels.len(), 32);
    assert_eq!(voxels[0].index, [0, 0, 2]);
    assert_eq!(voxels[0].cells, vec![32]);
}

#[test]
fn test_build_clears_stale_output() {
    let dir = tempdir().unwrap();
    let dataset = partitioned(&dir);
    let output_dir = dataset.mesh_dir("T", 27);
    fs::create_dir_all(&output_dir).unwrap();
    fs::write(output_dir.join("100_200.imf"), b"old").unwrap();
    fs::write(output_dir.join("notes.txt"), b"keep").unwrap();

    MeshBuildOrchestrator::new(dataset, config()).build().unwrap();
    assert_eq!(
        dir_names(&output_dir),
        vec!["0_32.imf", "32_64.imf", "notes.txt"]
    );
}

#[test]
fn test_build_requires_partitions() {
    let dir = tempdir().unwrap();
    let (_, dataset) = ingest(&dir);

    let err = MeshBuildOrchestrator::new(dataset, config())
        .build()
        .unwrap_err();
    assert!(matches!(err, PipelineError::NotPartitioned { ref column, .. } if column == "T"));
}

#[test]
fn test_build_skips_small_partitions() {
    let dir = tempdir().unwrap();
    let dataset = partitioned(&dir);

    // Each partition holds 32 records of 8 bytes.
    let report = MeshBuildOrchestrator::new(dataset, config().with_min_partition_bytes(257))
        .build()
        .unwrap();
    assert!(report.meshes.is_empty());
    assert_eq!(file_names(report.skipped), vec!["0_32.divf", "32_64.divf"]);
}

#[test]
fn test_build_rejects_invalid_config() {
    let dir = tempdir().unwrap();
    let dataset = partitioned(&dir);

    for config in [
        config().with_threads(0),
        config().with_resolution(0),
        config().with_iso_level(-0.1),
        config().with_iso_level(f32::NAN),
        config().with_split_cap(2),
    ] {
        let err = MeshBuildOrchestrator::new(dataset.clone(), config)
            .build()
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidConfig(_)));
    }
    assert!(!dataset.mesh_dir("T", 27).exists());
}

// ==================== Per-file failures ====================

struct FailingExtractor;

impl IsosurfaceExtractor for FailingExtractor {
    fn extract(&self, _: &ScalarField, _: f32) -> Result<IntermediateMesh, MeshError> {
        Err(MeshError::Truncated("no surface here".to_string()))
    }
}

/// Panics on the lower slab, meshes the upper one normally.
struct PickyExtractor;

impl IsosurfaceExtractor for PickyExtractor {
    fn extract(&self, field: &ScalarField, iso_level: f32) -> Result<IntermediateMesh, MeshError> {
        if field.get(0, 0, 0) == Some(1.0) {
            panic!("lower slab");
        }
        crate::mesh::CuberilleExtractor.extract(field, iso_level)
    }
}

#[test]
fn test_extractor_errors_are_reported() {
    let dir = tempdir().unwrap();
    let dataset = partitioned(&dir);

    let report = MeshBuildOrchestrator::new(dataset, config())
        .with_extractor(FailingExtractor)
        .build()
        .unwrap();

    assert!(!report.is_complete());
    assert!(report.meshes.is_empty());
    assert_eq!(report.failures.len(), 2);
    assert!(report.failures[0].message.contains("no surface here"));
    assert!(report.failures[0].partition.ends_with("0_32.divf"));
}

#[test]
fn test_panic_fails_only_its_partition() {
    let dir = tempdir().unwrap();
    let dataset = partitioned(&dir);

    let report = MeshBuildOrchestrator::new(dataset, config())
        .with_extractor(PickyExtractor)
        .build()
        .unwrap();

    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].partition.ends_with("0_32.divf"));
    assert!(report.failures[0].message.contains("lower slab"));
    assert_eq!(
        file_names(report.meshes.iter().map(|m| m.path.clone())),
        vec!["32_64.imf"]
    );
}

#[test]
fn test_tiny_partition_is_a_file_failure() {
    let dir = tempdir().unwrap();
    let dataset = partitioned(&dir);
    let tiny = dataset.partition_file("T", 64.0, 65.0);
    write_partition(&tiny, &[FieldCell::new(0, 64.5), FieldCell::new(63, 64.5)]).unwrap();

    let report = MeshBuildOrchestrator::new(dataset, config())
        .build()
        .unwrap();

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].partition, tiny);
    assert!(report.failures[0].message.contains("2 points"));
    assert_eq!(
        file_names(report.meshes.iter().map(|m| m.path.clone())),
        vec!["0_32.imf", "32_64.imf"]
    );
}

#[test]
fn test_empty_surface_writes_nothing() {
    let dir = tempdir().unwrap();
    let dataset = partitioned(&dir);

    let report = MeshBuildOrchestrator::new(dataset, config().with_iso_level(1.0))
        .build()
        .unwrap();
    assert!(report.meshes.is_empty());
    assert_eq!(report.failures.len(), 2);
    assert!(dir_names(&report.output_dir).is_empty());
}

// ==================== Driver ====================

fn request(source: PathBuf) -> BuildRequest {
    BuildRequest {
        source,
        divisions: 2,
        attribute: "T".to_string(),
        resolution: 27,
        threads: 2,
        axes: ["X".to_string(), "Y".to_string(), "Z".to_string()],
        iso_level: 0.5,
        split_columns: Vec::new(),
    }
}

fn pipeline(dir: &TempDir) -> Pipeline {
    let options = PipelineOptions {
        ingest: IngestOptions::default().with_trailing_columns(0),
        ..Default::default()
    };
    Pipeline::with_options(CacheLayout::new(dir.path().join("cache")), options)
}

#[test]
fn test_pipeline_runs_all_phases() {
    let dir = tempdir().unwrap();
    let source = lattice_source(&dir);
    let pipeline = pipeline(&dir);

    let summary = pipeline.run(&request(source)).unwrap();
    assert_eq!(summary.ingest.row_count, 64);
    assert!(summary.partition.is_complete());
    // T, X, Y and Z are all partitioned.
    assert_eq!(summary.partition.columns.len(), 4);
    assert_eq!(summary.meshes.meshes.len(), 2);
    assert!(summary.meshes.meshes.iter().all(|m| m.path.exists()));

    let progress = pipeline.progress().snapshot();
    assert_eq!(progress.get(crate::progress::PHASE_MESHING), Some(&100.0));
}

#[test]
fn test_pipeline_partitions_only_named_columns() {
    let dir = tempdir().unwrap();
    let source = lattice_source(&dir);
    let mut request = request(source);
    request.split_columns = vec!["T".to_string()];

    let summary = pipeline(&dir).run(&request).unwrap();
    assert_eq!(summary.partition.columns.len(), 1);
    let dataset = CacheLayout::new(dir.path().join("cache")).dataset("lattice");
    assert!(dataset.partition_files("X").unwrap().is_empty());
}

#[test]
fn test_pipeline_validates_before_io() {
    let dir = tempdir().unwrap();
    let source = lattice_source(&dir);
    let cache_dir = dir.path().join("cache");

    let missing = request(dir.path().join("nope.csv"));
    assert!(matches!(
        pipeline(&dir).run(&missing),
        Err(PipelineError::SourceNotFound(_))
    ));

    let mut zero = request(source.clone());
    zero.divisions = 0;
    let mut negative_iso = request(source.clone());
    negative_iso.iso_level = -1.0;
    let mut wrong_split = request(source.clone());
    wrong_split.split_columns = vec!["X".to_string()];
    let mut no_threads = request(source);
    no_threads.threads = 0;

    for bad in [zero, negative_iso, wrong_split, no_threads] {
        assert!(matches!(
            pipeline(&dir).run(&bad),
            Err(PipelineError::InvalidConfig(_))
        ));
    }
    assert!(!cache_dir.exists());
}

#[test]
fn test_pipeline_rejects_unknown_column() {
    let dir = tempdir().unwrap();
    let mut request = request(lattice_source(&dir));
    request.axes[2] = "W".to_string();

    let err = pipeline(&dir).run(&request).unwrap_err();
    assert!(matches!(err, PipelineError::InvalidConfig(ref m) if m.contains("W")));
    assert!(!dir.path().join("cache").exists());
}

#[test]
fn test_unknown_column_keeps_previous_cache() {
    let dir = tempdir().unwrap();
    let source = lattice_source(&dir);
    let first = pipeline(&dir).run(&request(source.clone())).unwrap();
    let meshes: Vec<PathBuf> = first.meshes.meshes.iter().map(|m| m.path.clone()).collect();
    assert!(!meshes.is_empty());

    let mut typo = request(source);
    typo.attribute = "Tmp".to_string();
    let err = pipeline(&dir).run(&typo).unwrap_err();
    assert!(matches!(err, PipelineError::InvalidConfig(ref m) if m.contains("Tmp")));

    // The dataset directory was not wiped and rebuilt.
    assert!(meshes.iter().all(|path| path.exists()));
}
