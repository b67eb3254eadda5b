use super::*;
use crate::point::Point;
use crate::store::{CacheLayout, MinMax};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_bounding_box_validation() {
    assert!(BoundingBox::from_array([0.0, 1.0, 0.0, 1.0, 0.0, 1.0]).is_ok());
    assert!(matches!(
        BoundingBox::from_array([1.0, 0.0, 0.0, 1.0, 0.0, 1.0]),
        Err(VoxelError::InvalidBoundingBox(_))
    ));
    assert!(BoundingBox::from_array([0.0, f32::INFINITY, 0.0, 1.0, 0.0, 1.0]).is_err());

    let bbox = BoundingBox::from_array([-1.0, 1.0, 0.0, 4.0, 2.0, 2.0]).unwrap();
    assert_eq!(bbox.lengths(), [2.0, 4.0, 0.0]);
    assert_eq!(bbox.to_array(), [-1.0, 1.0, 0.0, 4.0, 2.0, 2.0]);
    assert!(bbox.contains(&Point::new(1.0, 4.0, 2.0)));
    assert!(!bbox.contains(&Point::new(0.0, 0.0, 2.5)));
}

#[test]
fn test_bounding_box_from_columns() {
    let dir = tempdir().unwrap();
    let dataset = CacheLayout::new(dir.path()).dataset("cells");
    for (axis, range) in [("X", (0.0, 3.0)), ("Y", (-1.0, 1.0)), ("Z", (5.0, 6.0))] {
        fs::create_dir_all(dataset.column_dir(axis)).unwrap();
        MinMax {
            min: range.0,
            max: range.1,
        }
        .write(&dataset.minmax_file(axis))
        .unwrap();
    }

    let bbox = BoundingBox::from_columns(&dataset, ["X", "Y", "Z"]).unwrap();
    assert_eq!(bbox.min, Point::new(0.0, -1.0, 5.0));
    assert_eq!(bbox.max, Point::new(3.0, 1.0, 6.0));

    assert!(matches!(
        BoundingBox::from_columns(&dataset, ["X", "Y", "W"]),
        Err(VoxelError::StoreError(_))
    ));
}

#[test]
fn test_occupancy_conserved() {
    let bbox = BoundingBox::from_array([0.0, 7.0, 0.0, 3.0, 0.0, 5.0]).unwrap();
    let mut grid = VoxelArray::new(200, bbox).unwrap();

    let mut inserted = 0;
    for i in 0..=70 {
        for j in 0..=3 {
            let point = Point::new(i as f32 * 0.1, j as f32, (i % 6) as f32 * 0.9);
            grid.insert_point(inserted, point).unwrap();
            inserted += 1;
        }
    }

    let total: usize = grid.to_voxels().iter().map(|v| v.cells.len()).sum();
    assert_eq!(total, inserted as usize);
    assert_eq!(grid.len(), inserted as usize);
}

#[test]
fn test_field_file_roundtrip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("0_1.fara");
    let field = ScalarField::new([2, 1, 3], vec![0.0, 0.5, 1.0, 0.25, 0.0, 0.75]).unwrap();

    field.write(&path).unwrap();
    assert_eq!(fs::metadata(&path).unwrap().len(), 12 + 6 * 4);
    let read = ScalarField::read(&path).unwrap();
    assert_eq!(read, field);
    assert_eq!(read.get(1, 0, 2), Some(0.75));
    assert_eq!(read.get(2, 0, 0), None);
}

#[test]
fn test_field_dimension_checks() {
    assert!(matches!(
        ScalarField::new([2, 2, 2], vec![0.0; 7]),
        Err(VoxelError::DimensionMismatch { expected: 8, actual: 7, .. })
    ));

    let dir = tempdir().unwrap();
    let path = dir.path().join("short.fara");
    let mut bytes = Vec::new();
    for dim in [2i32, 2, 2] {
        bytes.extend_from_slice(&dim.to_le_bytes());
    }
    bytes.extend_from_slice(&1.0f32.to_le_bytes());
    fs::write(&path, bytes).unwrap();
    assert!(matches!(
        ScalarField::read(&path),
        Err(VoxelError::DimensionMismatch { .. })
    ));

    assert!(matches!(
        ScalarField::read(&dir.path().join("grid.FARA.bin")),
        Err(VoxelError::FormatError(_))
    ));
}

#[test]
fn test_voxel_file_roundtrip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("0_1.vox");

    let bbox = BoundingBox::from_array([0.0, 4.0, 0.0, 4.0, 0.0, 4.0]).unwrap();
    let mut grid = VoxelArray::new(64, bbox).unwrap();
    grid.insert_point(3, Point::new(0.0, 0.0, 0.0)).unwrap();
    grid.insert_point(1, Point::new(0.5, 0.5, 0.5)).unwrap();
    grid.insert_point(8, Point::new(4.0, 2.0, 1.0)).unwrap();

    let voxels = grid.to_voxels();
    write_voxels(&path, &voxels).unwrap();
    let read = read_voxels(&path).unwrap();

    assert_eq!(read, voxels);
    assert_eq!(read[0].cells, vec![3, 1]);
    assert_eq!(read[1].index, [4, 2, 1]);
}

#[test]
fn test_voxel_list_rejects_fractional_index() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.vox");
    let mut bytes = Vec::new();
    Point::new(0.5, 0.0, 0.0).write_to(&mut bytes).unwrap();
    bytes.extend_from_slice(&0i32.to_le_bytes());
    fs::write(&path, bytes).unwrap();

    assert!(matches!(read_voxels(&path), Err(VoxelError::IoError(_))));
}
