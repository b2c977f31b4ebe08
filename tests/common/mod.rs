//! Common test utilities for bundlefs integration tests

use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use bundlefs::BundleFs;
use bundlefs::config::Config;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

/// Local bundles, a blob store directory and a config file in one temp dir
#[allow(dead_code)]
pub struct TestBundles {
    /// Temporary directory
    pub temp: TempDir,
    /// Path to `<temp>/bundles`
    pub bundles_dir: PathBuf,
    /// Path to `<temp>/blobs`, registered as blob store `main`
    pub blobs_dir: PathBuf,
}

#[allow(dead_code)]
impl TestBundles {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let bundles_dir = temp.path().join("bundles");
        let blobs_dir = temp.path().join("blobs");
        fs::create_dir_all(&bundles_dir).expect("Failed to create bundles directory");
        fs::create_dir_all(&blobs_dir).expect("Failed to create blobs directory");
        Self {
            temp,
            bundles_dir,
            blobs_dir,
        }
    }

    /// Create an empty local bundle directory
    pub fn create_bundle(&self, uuid: &str) -> PathBuf {
        let path = self.bundles_dir.join(uuid);
        fs::create_dir_all(&path).expect("Failed to create bundle directory");
        path
    }

    /// Write a file inside a local bundle, creating parents
    pub fn write_file(&self, uuid: &str, path: &str, content: &str) -> PathBuf {
        let file_path = self.bundles_dir.join(uuid).join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&file_path, content).expect("Failed to write file");
        file_path
    }

    /// Local bundle holding `a/b/file.txt`, `c/d/e/` and `file.txt`
    pub fn create_sample_bundle(&self, uuid: &str) -> PathBuf {
        let path = self.create_bundle(uuid);
        self.write_file(uuid, "a/b/file.txt", "nested");
        self.write_file(uuid, "file.txt", "top level");
        fs::create_dir_all(path.join("c/d/e")).expect("Failed to create c/d/e");
        path
    }

    /// Store `bytes` as `bundles/<uuid>/<name>` in the `main` store and
    /// return its root locator
    pub fn write_blob(&self, uuid: &str, name: &str, bytes: &[u8]) -> String {
        let dir = self.blobs_dir.join("bundles").join(uuid);
        fs::create_dir_all(&dir).expect("Failed to create blob directory");
        fs::write(dir.join(name), bytes).expect("Failed to write blob");
        format!("blob://main/bundles/{uuid}/{name}")
    }

    /// Write `config.yaml` pointing at this fixture and return its path
    pub fn write_config(
        &self,
        archived: &[(&str, &str)],
        dependencies: &[(&str, &str, &str)],
    ) -> PathBuf {
        let mut yaml = format!(
            "bundles_dir: {}\nblob_stores:\n  main: {}\n",
            yaml_path(&self.bundles_dir),
            yaml_path(&self.blobs_dir)
        );
        if !archived.is_empty() {
            yaml.push_str("archived_bundles:\n");
            for (uuid, locator) in archived {
                yaml.push_str(&format!("  \"{uuid}\": \"{locator}\"\n"));
            }
        }
        if !dependencies.is_empty() {
            yaml.push_str("dependencies:\n");
            for (bundle, key, target) in dependencies {
                yaml.push_str(&format!(
                    "  - bundle: \"{bundle}\"\n    key: \"{key}\"\n    target: \"{target}\"\n"
                ));
            }
        }
        let path = self.temp.path().join("config.yaml");
        fs::write(&path, yaml).expect("Failed to write config");
        path
    }

    /// Facade built from [`Self::write_config`]
    pub fn bundle_fs(
        &self,
        archived: &[(&str, &str)],
        dependencies: &[(&str, &str, &str)],
    ) -> BundleFs {
        let config = Config::load(&self.write_config(archived, dependencies))
            .expect("Failed to load config");
        BundleFs::from_config(&config).expect("Failed to build BundleFs")
    }
}

fn yaml_path(path: &Path) -> String {
    format!("\"{}\"", path.display().to_string().replace('\\', "/"))
}

/// Entry for [`build_zip`]
#[allow(dead_code)]
pub enum ZipItem<'a> {
    Dir(&'a str),
    Stored(&'a str, &'a [u8]),
    Deflated(&'a str, &'a [u8]),
}

/// Build an archive with the `zip` crate as an independent writer
#[allow(dead_code)]
pub fn build_zip(items: &[ZipItem<'_>]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let stored = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    let deflated =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for item in items {
        match item {
            ZipItem::Dir(name) => writer
                .add_directory(*name, stored)
                .expect("Failed to add directory"),
            ZipItem::Stored(name, body) => {
                writer.start_file(*name, stored).expect("Failed to start file");
                writer.write_all(body).expect("Failed to write body");
            }
            ZipItem::Deflated(name, body) => {
                writer.start_file(*name, deflated).expect("Failed to start file");
                writer.write_all(body).expect("Failed to write body");
            }
        }
    }
    writer.finish().expect("Failed to finish archive").into_inner()
}

/// `a/ a/b/ a/b/file.txt c/ c/d/ c/d/e/ file.txt`
#[allow(dead_code)]
pub fn sample_zip() -> Vec<u8> {
    build_zip(&[
        ZipItem::Dir("a/"),
        ZipItem::Dir("a/b/"),
        ZipItem::Stored("a/b/file.txt", b"nested"),
        ZipItem::Dir("c/"),
        ZipItem::Dir("c/d/"),
        ZipItem::Dir("c/d/e/"),
        ZipItem::Deflated("file.txt", b"top level"),
    ])
}
