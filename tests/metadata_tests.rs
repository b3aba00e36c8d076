use std::fs;

use burn_texture_cvae::TextureMetadata;
use tempfile::tempdir;

fn names(classes: &[&str]) -> Vec<String> {
    classes.iter().map(|name| name.to_string()).collect()
}

#[test]
fn round_trip_preserves_class_indices() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("metadata.json");
    let metadata = TextureMetadata::new(names(&["dirt", "grass_top", "stone"]), 64, 32);

    metadata.save(&path).expect("save metadata");
    let loaded = TextureMetadata::load(&path).expect("load metadata");
    assert_eq!(loaded, metadata);

    let map = loaded.class_map();
    assert_eq!(map.len(), 3);
    assert!(!map.is_empty());
    assert_eq!(map.index_of("dirt"), Some(0));
    assert_eq!(map.index_of("grass_top"), Some(1));
    assert_eq!(map.index_of("stone"), Some(2));
    assert_eq!(map.name(1), Some("grass_top"));
    assert_eq!(map.index_of("sand"), None);
}

#[test]
fn file_uses_the_shared_field_names() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("metadata.json");
    TextureMetadata::new(names(&["a", "b"]), 16, 8)
        .save(&path)
        .expect("save metadata");

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).expect("read")).expect("json");
    assert_eq!(value["classes"], serde_json::json!(["a", "b"]));
    assert_eq!(value["num_classes"], 2);
    assert_eq!(value["z_dim"], 16);
    assert_eq!(value["img"], 8);
}

#[test]
fn inconsistent_metadata_is_rejected() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("metadata.json");

    fs::write(
        &path,
        r#"{"classes": ["a", "b"], "num_classes": 3, "z_dim": 8, "img": 8}"#,
    )
    .expect("write");
    assert!(TextureMetadata::load(&path).is_err());

    fs::write(
        &path,
        r#"{"classes": ["a", "a"], "num_classes": 2, "z_dim": 8, "img": 8}"#,
    )
    .expect("write");
    assert!(TextureMetadata::load(&path).is_err());

    fs::write(
        &path,
        r#"{"classes": ["a"], "num_classes": 1, "z_dim": 8, "img": 12}"#,
    )
    .expect("write");
    assert!(TextureMetadata::load(&path).is_err());
}

#[test]
fn missing_file_reports_its_path() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("absent.json");
    let err = TextureMetadata::load(&path).expect_err("missing metadata");
    assert!(format!("{err:#}").contains("absent.json"));
}
