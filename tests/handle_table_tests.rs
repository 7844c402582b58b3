//! Integration tests for the handle-based surface.

use ringhash::prelude::*;

fn geometry_file(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("ringhash-{}-{}.bin", name, std::process::id()))
}

#[test]
fn test_full_lifecycle() {
    let mut table = HandleTable::new();
    let handle = table.create(3, &RawGeometry::generate(2).unwrap()).unwrap();

    let mut entries = vec![
        Entry::new(100, Vec2::new(0.5, 0.5)),
        Entry::new(101, Vec2::new(0.5, 1.5)),
        Entry::new(102, Vec2::new(4.5, 4.5)),
    ];
    table.initialize(handle, &entries).unwrap();

    entries[2].position = Vec2::new(1.5, 0.5);
    assert_eq!(table.update_all(handle, &entries).unwrap(), 1);

    let results = table
        .search(handle, &[Vec2::new(0.5, 0.5), Vec2::new(6.5, 6.5)], 1.2, 8)
        .unwrap();
    assert_eq!(results.counts(), &[3, 0]);
    let first = results.get(0).unwrap();
    assert_eq!(first[0].id(), 100);
    assert!(first.iter().all(|n| n.distance < 1.2));

    table.remove(handle, &[0, 2]).unwrap();
    let results = table.search(handle, &[Vec2::new(0.5, 0.5)], 1.2, 8).unwrap();
    assert_eq!(results.counts(), &[1]);
    assert_eq!(results.neighbors()[0].id(), 101);

    table.destroy(handle).unwrap();
    assert!(matches!(
        table.update_all(handle, &entries),
        Err(SpatialError::StaleHandle(_))
    ));
    assert!(matches!(
        table.remove(handle, &[1]),
        Err(SpatialError::StaleHandle(_))
    ));
}

#[test]
fn test_instances_are_independent() {
    let mut table = HandleTable::new();
    let geometry = RawGeometry::generate(1).unwrap();
    let a = table.create(3, &geometry).unwrap();
    let b = table.create(3, &geometry).unwrap();

    table.initialize(a, &[Entry::new(1, Vec2::new(2.5, 2.5))]).unwrap();
    table.initialize(b, &[Entry::new(2, Vec2::new(2.5, 2.5))]).unwrap();

    let hits_a = table.search(a, &[Vec2::new(2.5, 2.5)], 1.0, 4).unwrap();
    assert_eq!(hits_a.neighbors()[0].id(), 1);
    let hits_b = table.search(b, &[Vec2::new(2.5, 2.5)], 1.0, 4).unwrap();
    assert_eq!(hits_b.neighbors()[0].id(), 2);

    table.destroy(a).unwrap();
    assert_eq!(table.get(b).unwrap().len(), 1);
}

#[test]
fn test_remove_out_of_range_id() {
    let mut table = HandleTable::new();
    let handle = table.create(3, &RawGeometry::generate(1).unwrap()).unwrap();
    table.initialize(handle, &[Entry::new(1, Vec2::ZERO)]).unwrap();
    assert!(matches!(
        table.remove(handle, &[4]),
        Err(SpatialError::OutOfRange { index: 4, capacity: 1 })
    ));
}

#[test]
fn test_engine_from_geometry_file() {
    let path = geometry_file("lifecycle");
    RawGeometry::generate(2).unwrap().save(&path).unwrap();

    let config = SpatialConfig::new(4, 1.0);
    let hash = SpatialHash::from_geometry_file(config, &path);
    std::fs::remove_file(&path).ok();

    let hash = hash.unwrap();
    assert_eq!(hash.catalog().step_count(), 4);
}

#[test]
fn test_malformed_geometry_file_fails_construction() {
    let path = geometry_file("malformed");
    std::fs::write(&path, [2u8, 0, 0, 0, 1, 0]).unwrap();

    let result = SpatialHash::from_geometry_file(SpatialConfig::default(), &path);
    std::fs::remove_file(&path).ok();

    assert!(matches!(result, Err(SpatialError::MissingGeometry(_))));
}
