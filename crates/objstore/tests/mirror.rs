use objstore::{mirror_prefix, mirrored_root, InMemoryObjectStore, LocalObjectStore, ObjectStore, StoreError};

#[test]
fn test_mirror_recreates_bucket_hierarchy() {
    let store = InMemoryObjectStore::new();
    store.put("potholes", "dataset/", b"").unwrap();
    store.put("potholes", "dataset/train/", b"").unwrap();
    store.put("potholes", "dataset/data.yaml", b"nc: 1\n").unwrap();
    store.put("potholes", "dataset/train/images/a.jpg", b"jpeg").unwrap();
    store.put("potholes", "dataset/train/labels/a.txt", b"0 0.5 0.5 0.1 0.1\n").unwrap();
    store.put("potholes", "unrelated/readme.md", b"skip me").unwrap();

    let tmp = tempfile::tempdir().unwrap();
    let summary = mirror_prefix(&store, "potholes", "dataset/", tmp.path()).unwrap();

    assert_eq!(summary.objects, 3);
    assert_eq!(summary.skipped_markers, 2);
    assert_eq!(summary.bytes, 6 + 4 + 18);

    let root = mirrored_root(tmp.path(), "dataset/");
    assert_eq!(root, tmp.path().join("dataset"));
    assert_eq!(std::fs::read(root.join("train/images/a.jpg")).unwrap(), b"jpeg");
    assert!(root.join("train/labels/a.txt").is_file());
    assert!(!tmp.path().join("unrelated").exists());
}

#[test]
fn test_mirror_rejects_escaping_keys() {
    let store = InMemoryObjectStore::new();
    store.put("b", "dataset/../../etc/passwd", b"x").unwrap();

    let tmp = tempfile::tempdir().unwrap();
    let err = mirror_prefix(&store, "b", "dataset/", tmp.path()).unwrap_err();
    assert!(matches!(err, StoreError::InvalidKey(_)));
}

#[test]
fn test_mirror_from_local_store() {
    let tmp = tempfile::tempdir().unwrap();
    let bucket_dir = tmp.path().join("minio").join("potholes").join("dataset").join("valid").join("images");
    std::fs::create_dir_all(&bucket_dir).unwrap();
    std::fs::write(bucket_dir.join("b.png"), b"png-bytes").unwrap();

    let store = LocalObjectStore::new(tmp.path().join("minio"));
    let listed = store.list("potholes", "dataset/").unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].key, "dataset/valid/images/b.png");

    let out = tmp.path().join("data");
    let summary = mirror_prefix(&store, "potholes", "dataset/", &out).unwrap();
    assert_eq!(summary.objects, 1);
    assert_eq!(std::fs::read(out.join("dataset/valid/images/b.png")).unwrap(), b"png-bytes");
}

#[test]
fn test_mirror_unknown_bucket() {
    let store = InMemoryObjectStore::new();
    let tmp = tempfile::tempdir().unwrap();
    assert!(matches!(
        mirror_prefix(&store, "ghost", "dataset/", tmp.path()),
        Err(StoreError::NoSuchBucket(_))
    ));
}
