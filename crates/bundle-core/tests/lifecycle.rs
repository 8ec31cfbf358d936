//! End-to-end bundle lifecycle: create, re-create, tamper, verify.

use std::fs;
use std::path::Path;

use bundle_checksum::hash_bytes;
use bundle_core::{create, verify, verify_bundle, Bundle, BundleError, BundleLayout, CreateOptions};

fn options() -> CreateOptions {
    CreateOptions {
        title: Some("Fixture".to_string()),
        author: "tester".to_string(),
        ..CreateOptions::default()
    }
}

fn write(root: &Path, rel: &str, data: &[u8]) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, data).unwrap();
}

#[test]
fn hello_world_bundle() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.txt", b"hello");
    write(dir.path(), "sub/b.txt", b"world");

    let bundle = create(dir.path(), &options()).unwrap();

    let text = fs::read_to_string(BundleLayout::new(dir.path()).manifest_path()).unwrap();
    let expected = format!(
        "{}  ./a.txt\n{}  ./sub/b.txt\n",
        hash_bytes(b"hello"),
        hash_bytes(b"world")
    );
    assert_eq!(text, expected);

    assert_eq!(
        bundle.identity().to_hex(),
        bundle_checksum::aggregate(&[hash_bytes(b"hello"), hash_bytes(b"world")]).to_hex()
    );
    assert!(verify_bundle(dir.path()).unwrap().is_valid());
}

#[test]
fn recreate_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "x/1.bin", &[0u8; 1024]);
    write(dir.path(), "x/2.bin", b"two");
    write(dir.path(), "3.bin", b"three");

    let layout = BundleLayout::new(dir.path());
    let first = create(dir.path(), &options()).unwrap();
    let manifest_before = fs::read(layout.manifest_path()).unwrap();
    let meta_before = fs::read(layout.metadata_path()).unwrap();

    let second = create(dir.path(), &options()).unwrap();
    assert_eq!(first.identity(), second.identity());
    assert_eq!(fs::read(layout.manifest_path()).unwrap(), manifest_before);
    assert_eq!(fs::read(layout.metadata_path()).unwrap(), meta_before);
}

#[test]
fn every_tampered_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..10 {
        let content = format!("content {i}");
        write(dir.path(), &format!("f{i:02}.dat"), content.as_bytes());
    }
    let bundle = create(dir.path(), &options()).unwrap();

    let tampered = ["f01.dat", "f04.dat", "f07.dat"];
    for name in tampered {
        write(dir.path(), name, b"tampered");
    }
    fs::remove_file(dir.path().join("f09.dat")).unwrap();

    let corrupted = verify(dir.path(), &bundle.manifest);
    let mut expected: Vec<&str> = tampered.to_vec();
    expected.push("f09.dat");
    let corrupted: Vec<&str> = corrupted.iter().map(String::as_str).collect();
    assert_eq!(corrupted, expected);
}

#[test]
fn identity_ignores_metadata_subtree() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.txt", b"hello");
    let first = create(dir.path(), &options()).unwrap();

    write(dir.path(), ".bundle/notes.txt", b"scratch");
    let second = create(dir.path(), &options()).unwrap();
    assert_eq!(first.identity(), second.identity());
    assert!(second.manifest.get(".bundle/notes.txt").is_none());
}

#[test]
fn empty_directory_has_well_known_identity() {
    let dir = tempfile::tempdir().unwrap();
    let bundle = create(dir.path(), &options()).unwrap();
    assert!(bundle.manifest.is_empty());
    assert_eq!(
        bundle.identity().to_hex(),
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
    assert_eq!(Bundle::load(dir.path()).unwrap(), bundle);
}

#[test]
fn load_requires_bundle() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(Bundle::load(dir.path()), Err(BundleError::NotABundle(_))));
}

#[cfg(unix)]
#[test]
fn backslash_in_file_name_survives_verify() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a\\b.txt", b"hello");

    let bundle = create(dir.path(), &options()).unwrap();
    assert!(bundle.manifest.get("a\\b.txt").is_some());

    let loaded = Bundle::load(dir.path()).unwrap();
    assert!(loaded.manifest.get("a\\b.txt").is_some());
    assert!(loaded.manifest.get("a/b.txt").is_none());

    let report = verify_bundle(dir.path()).unwrap();
    assert!(report.is_valid(), "corrupted: {:?}", report.corrupted);
}

#[test]
fn manifest_pointing_outside_the_root_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("bundle");
    write(&root, "a.txt", b"hello");
    write(dir.path(), "outside.txt", b"secret");
    create(&root, &options()).unwrap();

    let layout = BundleLayout::new(&root);
    let escaping = format!("{}  ./../outside.txt\n", hash_bytes(b"secret"));
    fs::write(layout.manifest_path(), escaping).unwrap();

    assert!(matches!(
        verify_bundle(&root),
        Err(BundleError::InvalidManifest { .. })
    ));
}
