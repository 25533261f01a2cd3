//! Round-trip, idempotence and collision tests for flatten and extract

use cairn_core::progress::NoopProgress;
use cairn_core::{Manifest, ManifestBuilder};
use cairn_engine::{extract, flatten, ExtractOptions, FlattenOptions};
use cairn_store::cas::shard_path;
use cairn_store::{open_store, ContentStore, StoreKind, StoreOptions};
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const KINDS: [StoreKind; 2] = [StoreKind::Raw, StoreKind::Compressed];

/// Relative path -> bytes for every regular file under `root`
fn tree_contents(root: &Path) -> BTreeMap<String, Vec<u8>> {
    let mut out = BTreeMap::new();
    collect(root, root, &mut out);
    out
}

fn collect(root: &Path, dir: &Path, out: &mut BTreeMap<String, Vec<u8>>) {
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            collect(root, &path, out);
        } else {
            let rel = path.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/");
            out.insert(rel, fs::read(&path).unwrap());
        }
    }
}

fn sample_tree(root: &Path) {
    fs::create_dir_all(root.join("docs").join("deep")).unwrap();
    fs::create_dir_all(root.join("empty_parent").join("x")).unwrap();
    fs::write(root.join("readme.txt"), b"hello world").unwrap();
    fs::write(root.join("docs").join("copy.txt"), b"hello world").unwrap();
    fs::write(root.join("docs").join("deep").join("big.bin"), vec![7u8; 10_000]).unwrap();
    fs::write(root.join("docs").join("empty.txt"), b"").unwrap();
    fs::write(root.join("empty_parent").join("x").join("y.dat"), b"y").unwrap();
}

fn manifest_of(root: &Path) -> Manifest {
    ManifestBuilder::new(root).build(&mut NoopProgress).unwrap().0
}

fn store(kind: StoreKind, root: &Path) -> Box<dyn ContentStore> {
    open_store(kind, root, StoreOptions::default())
}

#[test]
fn test_flatten_then_extract_reproduces_tree() {
    for kind in KINDS {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        sample_tree(&src);
        let manifest = manifest_of(&src);
        let store = store(kind, &dir.path().join("store"));

        let flat = flatten(
            &manifest,
            &src,
            store.as_ref(),
            FlattenOptions::default(),
            &mut NoopProgress,
        )
        .unwrap();
        assert_eq!(flat.entries, 5);
        assert_eq!(flat.inserted, 4, "kind {kind}");
        assert_eq!(flat.deduplicated, 1);

        let out = dir.path().join("out");
        let report = extract(
            &manifest,
            store.as_ref(),
            &out,
            ExtractOptions::default(),
            &mut NoopProgress,
        )
        .unwrap();
        assert!(report.is_complete());
        assert_eq!(report.extracted, 5);

        assert_eq!(tree_contents(&out), tree_contents(&src), "kind {kind}");
        assert_eq!(manifest_of(&out), manifest, "kind {kind}");
    }
}

#[test]
fn test_second_flatten_changes_nothing() {
    for kind in KINDS {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        sample_tree(&src);
        let manifest = manifest_of(&src);
        let store = store(kind, &dir.path().join("store"));

        flatten(&manifest, &src, store.as_ref(), FlattenOptions::default(), &mut NoopProgress)
            .unwrap();
        let before = tree_contents(store.root());

        let again = flatten(
            &manifest,
            &src,
            store.as_ref(),
            FlattenOptions::default(),
            &mut NoopProgress,
        )
        .unwrap();

        assert_eq!(again.inserted, 0);
        assert_eq!(again.deduplicated, 5, "kind {kind}");
        assert!(again.collisions.is_empty());
        assert_eq!(tree_contents(store.root()), before, "kind {kind}");
        for entry in manifest.entries() {
            let source = entry.resolve_under(&src).unwrap();
            assert!(store.compare(&source, &entry.hash).unwrap(), "kind {kind} {}", entry.path);
        }
    }
}

#[test]
fn test_reset_discards_previous_content() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("src");
    sample_tree(&src);
    let manifest = manifest_of(&src);
    let store_root = dir.path().join("store");
    fs::create_dir_all(&store_root).unwrap();
    fs::write(store_root.join("stale.txt"), b"old").unwrap();

    let store = store(StoreKind::Raw, &store_root);
    let options = FlattenOptions {
        reset: true,
        ..FlattenOptions::default()
    };
    flatten(&manifest, &src, store.as_ref(), options, &mut NoopProgress).unwrap();

    assert!(!store_root.join("stale.txt").exists());
    assert_eq!(store.stored_hashes().unwrap().len(), 4);
}

#[test]
fn test_collision_keeps_first_bytes() {
    for kind in KINDS {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("a.txt"), b"genuine").unwrap();
        let manifest = manifest_of(&src);
        let hash = manifest.get("/a.txt").unwrap().hash.clone();

        let store_root = dir.path().join("store");
        let planted = shard_path(&store_root, &hash);
        fs::create_dir_all(planted.parent().unwrap()).unwrap();
        fs::write(&planted, b"imposter").unwrap();

        let store = store(kind, &store_root);
        let report = flatten(
            &manifest,
            &src,
            store.as_ref(),
            FlattenOptions::default(),
            &mut NoopProgress,
        )
        .unwrap();

        assert_eq!(report.inserted, 0);
        assert_eq!(report.collisions.len(), 1, "kind {kind}");
        assert_eq!(report.collisions[0].path, "/a.txt");
        assert_eq!(fs::read(&planted).unwrap(), b"imposter");
        assert!(report.render().contains("Hash collisions: 1"));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["inserted"], 0);
        assert_eq!(json["collisions"][0]["path"], "/a.txt");
        assert_eq!(json["collisions"][0]["hash"], hash.as_str());
        assert_eq!(json["store_kind"], kind.to_string());
    }
}

#[test]
fn test_extract_uses_configured_directory_attempts() {
    let dir = TempDir::new().unwrap();
    let blocked = dir.path().join("blocked");
    fs::write(&blocked, b"a file where the target root should go").unwrap();
    let store = store(StoreKind::Raw, &dir.path().join("store"));

    let options = ExtractOptions {
        dir_create_retries: 2,
    };
    let err = extract(&Manifest::default(), store.as_ref(), &blocked, options, &mut NoopProgress)
        .unwrap_err();

    assert_eq!(err.code(), "ERR_RETRY_EXHAUSTED");
    assert!(err.message().contains("after 2 attempts"), "{}", err.message());
}

#[test]
fn test_unreadable_source_aborts_flatten() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("src");
    fs::create_dir_all(&src).unwrap();
    fs::write(src.join("gone.txt"), b"soon deleted").unwrap();
    let manifest = manifest_of(&src);
    fs::remove_file(src.join("gone.txt")).unwrap();

    let store = store(StoreKind::Raw, &dir.path().join("store"));
    let err = flatten(
        &manifest,
        &src,
        store.as_ref(),
        FlattenOptions::default(),
        &mut NoopProgress,
    )
    .unwrap_err();

    assert_eq!(err.code(), "ERR_IO");
    assert!(err.path().unwrap().contains("gone.txt"));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn test_roundtrip_arbitrary_files(
        files in proptest::collection::btree_map("[a-e]{1,3}", proptest::collection::vec(any::<u8>(), 0..3000), 1..6)
    ) {
        for kind in KINDS {
            let dir = TempDir::new().unwrap();
            let src = dir.path().join("src");
            fs::create_dir_all(&src).unwrap();
            for (name, body) in &files {
                fs::write(src.join(name), body).unwrap();
            }
            let manifest = manifest_of(&src);
            let store = store(kind, &dir.path().join("store"));

            flatten(&manifest, &src, store.as_ref(), FlattenOptions::default(), &mut NoopProgress).unwrap();
            let out = dir.path().join("out");
            extract(&manifest, store.as_ref(), &out, ExtractOptions::default(), &mut NoopProgress).unwrap();

            prop_assert_eq!(tree_contents(&out), tree_contents(&src));
        }
    }
}
