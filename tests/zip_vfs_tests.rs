//! Archive-backed bundles presented as directory trees

mod common;

use std::io::Read;

use bundlefs::BundleFsError;
use bundlefs::domain::{ARCHIVE_PERM, Backend, BundleTarget, MetadataNode, NodeKind};
use common::{TestBundles, ZipItem, build_zip, sample_zip};

fn collect_paths(node: &MetadataNode, prefix: &str, out: &mut Vec<String>) {
    for child in node.contents.iter().flatten() {
        let path = if prefix.is_empty() {
            child.name.clone()
        } else {
            format!("{prefix}/{}", child.name)
        };
        out.push(path.clone());
        collect_paths(child, &path, out);
    }
}

#[test]
fn test_root_is_named_after_bundle() {
    let bundles = TestBundles::new();
    let root = bundles.write_blob("0xzip", "contents.zip", &sample_zip());
    let fs = bundles.bundle_fs(&[("0xzip", &root)], &[]);

    let node = fs.resolve_and_index(&BundleTarget::root("0xzip"), 1).unwrap();
    assert_eq!(node.name, "0xzip");
    assert_eq!(node.kind, NodeKind::Directory);
    assert_eq!(node.size, 15);
    assert_eq!(node.perm, ARCHIVE_PERM);
    assert_eq!(node.backend, Backend::Archive);
    assert_eq!(node.child_names(), vec!["a", "c", "file.txt"]);
}

#[test]
fn test_every_entry_in_exactly_one_directory() {
    let bundles = TestBundles::new();
    let root = bundles.write_blob("0xzip", "contents.zip", &sample_zip());
    let fs = bundles.bundle_fs(&[("0xzip", &root)], &[]);

    let node = fs.resolve_and_index(&BundleTarget::root("0xzip"), 10).unwrap();
    let mut paths = Vec::new();
    collect_paths(&node, "", &mut paths);
    paths.sort();
    assert_eq!(
        paths,
        vec!["a", "a/b", "a/b/file.txt", "c", "c/d", "c/d/e", "file.txt"]
    );
}

#[test]
fn test_depth_two_matches_local_layout() {
    let bundles = TestBundles::new();
    let root = bundles.write_blob("0xzip", "contents.zip", &sample_zip());
    let fs = bundles.bundle_fs(&[("0xzip", &root)], &[]);

    let node = fs.resolve_and_index(&BundleTarget::root("0xzip"), 2).unwrap();
    assert_eq!(node.descendant("a").unwrap().child_names(), vec!["b"]);
    assert_eq!(node.descendant("c").unwrap().child_names(), vec!["d"]);
    assert!(node.descendant("c/d").unwrap().contents.is_none());
}

#[test]
fn test_implicit_directories() {
    let bundles = TestBundles::new();
    let archive = build_zip(&[
        ZipItem::Deflated("docs/guide/intro.md", b"# intro"),
        ZipItem::Stored("docs/index.md", b"index"),
    ]);
    let root = bundles.write_blob("0ximplicit", "contents.zip", &archive);
    let fs = bundles.bundle_fs(&[("0ximplicit", &root)], &[]);

    let node = fs
        .resolve_and_index(&BundleTarget::new("0ximplicit", "docs"), 1)
        .unwrap();
    assert_eq!(node.kind, NodeKind::Directory);
    assert_eq!(node.size, 12);
    assert_eq!(node.child_names(), vec!["guide", "index.md"]);
    assert_eq!(node.child("guide").unwrap().kind, NodeKind::Directory);
}

#[test]
fn test_missing_entry_and_missing_archive() {
    let bundles = TestBundles::new();
    let root = bundles.write_blob("0xzip", "contents.zip", &sample_zip());
    let fs = bundles.bundle_fs(
        &[
            ("0xzip", &root),
            ("0xgone", "blob://main/bundles/0xgone/contents.zip"),
        ],
        &[],
    );

    let err = fs
        .resolve_and_index(&BundleTarget::new("0xzip", "a/nope"), 1)
        .unwrap_err();
    assert!(matches!(err, BundleFsError::NotFound { .. }));

    let err = fs
        .resolve_and_index(&BundleTarget::new("0xgone", "a/nope"), 1)
        .unwrap_err();
    assert!(matches!(err, BundleFsError::ArchiveNotFound { .. }));
    assert!(err.is_not_found());
}

#[test]
fn test_single_file_blob() {
    let bundles = TestBundles::new();
    let root = bundles.write_blob("0xraw", "contents", b"just bytes");
    let fs = bundles.bundle_fs(&[("0xraw", &root)], &[]);

    let node = fs.resolve_and_index(&BundleTarget::root("0xraw"), 2).unwrap();
    assert_eq!(node.kind, NodeKind::File);
    assert_eq!(node.name, "contents");
    assert_eq!(node.size, 10);

    let mut body = String::new();
    fs.open_target(&BundleTarget::root("0xraw"))
        .unwrap()
        .read_to_string(&mut body)
        .unwrap();
    assert_eq!(body, "just bytes");
}

#[test]
fn test_empty_archive() {
    let bundles = TestBundles::new();
    let root = bundles.write_blob("0xempty", "contents.zip", &build_zip(&[]));
    let fs = bundles.bundle_fs(&[("0xempty", &root)], &[]);

    let node = fs.resolve_and_index(&BundleTarget::root("0xempty"), 1).unwrap();
    assert_eq!(node.size, 0);
    assert_eq!(node.contents, Some(Vec::new()));
}

#[test]
fn test_open_archive_entries() {
    let bundles = TestBundles::new();
    let root = bundles.write_blob("0xzip", "contents.zip", &sample_zip());
    let fs = bundles.bundle_fs(&[("0xzip", &root)], &[]);

    for (subpath, expected) in [("a/b/file.txt", "nested"), ("file.txt", "top level")] {
        let mut body = String::new();
        fs.open_target(&BundleTarget::new("0xzip", subpath))
            .unwrap()
            .read_to_string(&mut body)
            .unwrap();
        assert_eq!(body, expected);
    }

    let err = fs
        .open_target(&BundleTarget::new("0xzip", "missing.txt"))
        .err()
        .unwrap();
    assert!(matches!(err, BundleFsError::NotFound { .. }));
}
