//! Shared fixtures for loader integration tests
//!
//! Builds tar archives and containers inside a temporary directory.

#![allow(dead_code)]

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use unit_loader::{
    BootstrapLoader, DelegatingLoader, EmbeddedArchiveExtractor, LoaderConfig, LoaderError,
};

/// Write a tar archive with the given `(entry, bytes)` files
pub fn write_tar(path: &Path, files: &[(&str, &[u8])]) {
    let file = File::create(path).expect("create archive");
    let mut builder = tar::Builder::new(file);
    for (name, data) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, name, *data)
            .expect("append entry");
    }
    builder.finish().expect("finish archive");
}

/// Temporary workspace for archive lists
pub struct ArchiveFixture {
    pub temp_dir: TempDir,
}

impl ArchiveFixture {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("temp dir"),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Create a directly loadable archive
    pub fn archive(&self, name: &str, files: &[(&str, &[u8])]) -> String {
        let path = self.path(name);
        write_tar(&path, files);
        path.to_string_lossy().to_string()
    }

    /// Create a container embedding a directly loadable archive at `inner`
    pub fn container(&self, name: &str, inner: &str, files: &[(&str, &[u8])]) -> String {
        let staging = self.path(&format!("{}.staging.tar", name));
        write_tar(&staging, files);
        let inner_bytes = std::fs::read(&staging).expect("read staged archive");
        std::fs::remove_file(&staging).expect("remove staged archive");

        let path = self.path(name);
        write_tar(
            &path,
            &[("manifest.toml", b"name = \"fixture\""), (inner, &inner_bytes)],
        );
        path.to_string_lossy().to_string()
    }

    /// Loader config for `archives` with extraction inside the fixture
    pub fn config(&self, archives: &[String]) -> LoaderConfig {
        let mut config = LoaderConfig::for_archives(archives.join(":"));
        config.extraction_dir = self.path("extracted").to_string_lossy().to_string();
        config
    }

    /// Build a loader over `archives` with the given parent and prefixes
    pub fn loader(
        &self,
        archives: &[String],
        parent: BootstrapLoader,
        parent_first: &[&str],
    ) -> Result<DelegatingLoader, LoaderError> {
        let mut config = self.config(archives);
        config.parent_first = parent_first.iter().map(|p| p.to_string()).collect();
        let containers = EmbeddedArchiveExtractor::from_config(&config);
        DelegatingLoader::new(&config, Arc::new(parent), &containers)
    }
}

impl Default for ArchiveFixture {
    fn default() -> Self {
        Self::new()
    }
}
