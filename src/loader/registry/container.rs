//! Container archive unpacking
//!
//! A container is an outer tar package that embeds a directly loadable
//! archive. The resolver that finds the embedded archive is a collaborator of
//! the archive source resolver; `EmbeddedArchiveExtractor` is the default one.

use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};

use crate::loader::registry::archive::normalize_entry_name;

/// Container resolution errors
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("No embedded archive found in {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Locates the directly loadable archive embedded in a container
pub trait ContainerResolver: Send + Sync {
    /// Return a path to the embedded archive, extracting it if needed
    fn locate_embedded_archive(&self, container: &Path) -> Result<PathBuf, ContainerError>;
}

impl<F> ContainerResolver for F
where
    F: Fn(&Path) -> Result<PathBuf, ContainerError> + Send + Sync,
{
    fn locate_embedded_archive(&self, container: &Path) -> Result<PathBuf, ContainerError> {
        self(container)
    }
}

/// Extracts the embedded archive of a tar container into a cache directory
pub struct EmbeddedArchiveExtractor {
    /// Base directory for extracted archives
    extraction_dir: PathBuf,
    /// Extensions that mark an entry as directly loadable
    direct_extensions: Vec<String>,
    /// Exact entry to extract instead of the first loadable one
    embedded_entry: Option<String>,
}

impl EmbeddedArchiveExtractor {
    pub fn new<P: AsRef<Path>>(extraction_dir: P, direct_extensions: Vec<String>) -> Self {
        Self {
            extraction_dir: extraction_dir.as_ref().to_path_buf(),
            direct_extensions,
            embedded_entry: None,
        }
    }

    /// Only extract the entry with this exact path
    pub fn with_embedded_entry(mut self, entry: impl Into<String>) -> Self {
        self.embedded_entry = Some(entry.into());
        self
    }

    /// Build from loader configuration
    pub fn from_config(config: &crate::config::LoaderConfig) -> Self {
        let extractor = Self::new(&config.extraction_dir, config.direct_extensions.clone());
        match &config.embedded_entry {
            Some(entry) => extractor.with_embedded_entry(entry.clone()),
            None => extractor,
        }
    }

    fn is_candidate(&self, entry: &str) -> bool {
        if let Some(ref wanted) = self.embedded_entry {
            return entry == wanted;
        }
        Path::new(entry)
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.direct_extensions.iter().any(|d| d.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }

    /// Per-container, per-entry directory, stable across runs
    fn target_dir(&self, container: &Path, entry: &str) -> PathBuf {
        let canonical = fs::canonicalize(container).unwrap_or_else(|_| container.to_path_buf());
        let mut hasher = Sha256::new();
        hasher.update(canonical.to_string_lossy().as_bytes());
        hasher.update([0u8]);
        hasher.update(entry.as_bytes());
        self.extraction_dir.join(&hex::encode(hasher.finalize())[..16])
    }
}

impl ContainerResolver for EmbeddedArchiveExtractor {
    fn locate_embedded_archive(&self, container: &Path) -> Result<PathBuf, ContainerError> {
        let file = File::open(container)?;
        let mut archive = tar::Archive::new(file);

        for entry in archive.entries()? {
            let mut entry = entry?;
            if !entry.header().entry_type().is_file() {
                continue;
            }
            let name = normalize_entry_name(&entry.path()?);
            if !self.is_candidate(&name) {
                continue;
            }

            let file_name = match Path::new(&name).file_name() {
                Some(file_name) => file_name.to_owned(),
                None => continue,
            };
            let target_dir = self.target_dir(container, &name);
            let target = target_dir.join(file_name);

            if is_fresh(&target, container) {
                debug!("Reusing extracted archive {:?} for {:?}", target, container);
                return Ok(target);
            }

            fs::create_dir_all(&target_dir)?;
            // Each extraction writes its own temporary file; persisting
            // replaces the target atomically
            let mut out = NamedTempFile::new_in(&target_dir)?;
            io::copy(&mut entry, &mut out)?;
            out.as_file().sync_all()?;
            out.persist(&target).map_err(|e| e.error)?;

            info!("Extracted {} from {:?} to {:?}", name, container, target);
            return Ok(target);
        }

        Err(ContainerError::NotFound(container.display().to_string()))
    }
}

/// Extracted file exists and is not older than its container
fn is_fresh(extracted: &Path, container: &Path) -> bool {
    let extracted_mtime = match fs::metadata(extracted).and_then(|m| m.modified()) {
        Ok(t) => t,
        Err(_) => return false,
    };
    match fs::metadata(container).and_then(|m| m.modified()) {
        Ok(container_mtime) => extracted_mtime >= container_mtime,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_tar(path: &Path, files: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut builder = tar::Builder::new(file);
        for (name, data) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.finish().unwrap();
    }

    #[test]
    fn test_extracts_first_loadable_entry() {
        let dir = TempDir::new().unwrap();
        let container = dir.path().join("app.pkg");
        write_tar(
            &container,
            &[
                ("manifest.toml", b"name = \"app\""),
                ("lib/classes.tar", b"inner"),
                ("lib/other.tar", b"other"),
            ],
        );

        let extractor =
            EmbeddedArchiveExtractor::new(dir.path().join("extracted"), vec!["tar".to_string()]);
        let path = extractor.locate_embedded_archive(&container).unwrap();

        assert_eq!(path.file_name().unwrap(), "classes.tar");
        assert_eq!(fs::read(&path).unwrap(), b"inner");

        // Second call reuses the extraction
        let again = extractor.locate_embedded_archive(&container).unwrap();
        assert_eq!(path, again);
    }

    #[test]
    fn test_explicit_embedded_entry() {
        let dir = TempDir::new().unwrap();
        let container = dir.path().join("app.pkg");
        write_tar(
            &container,
            &[("lib/classes.tar", b"inner"), ("lib/other.tar", b"other")],
        );

        let extractor =
            EmbeddedArchiveExtractor::new(dir.path().join("extracted"), vec!["tar".to_string()])
                .with_embedded_entry("lib/other.tar");
        let path = extractor.locate_embedded_archive(&container).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"other");
    }

    #[test]
    fn test_container_without_archive_is_not_found() {
        let dir = TempDir::new().unwrap();
        let container = dir.path().join("app.pkg");
        write_tar(&container, &[("readme.txt", b"nothing here")]);

        let extractor =
            EmbeddedArchiveExtractor::new(dir.path().join("extracted"), vec!["tar".to_string()]);
        let err = extractor.locate_embedded_archive(&container).unwrap_err();
        assert!(matches!(err, ContainerError::NotFound(_)));
    }

    #[test]
    fn test_missing_container_is_io_error() {
        let dir = TempDir::new().unwrap();
        let extractor =
            EmbeddedArchiveExtractor::new(dir.path().join("extracted"), vec!["tar".to_string()]);
        let err = extractor
            .locate_embedded_archive(&dir.path().join("absent.pkg"))
            .unwrap_err();
        assert!(matches!(err, ContainerError::Io(_)));
    }

    #[test]
    fn test_switching_embedded_entry_does_not_reuse_other_extraction() {
        let dir = TempDir::new().unwrap();
        let container = dir.path().join("app.pkg");
        write_tar(
            &container,
            &[("lib/a/classes.tar", b"from-a"), ("lib/b/classes.tar", b"from-b")],
        );
        let extraction_dir = dir.path().join("extracted");

        let a = EmbeddedArchiveExtractor::new(&extraction_dir, vec!["tar".to_string()])
            .with_embedded_entry("lib/a/classes.tar");
        let a_path = a.locate_embedded_archive(&container).unwrap();
        assert_eq!(fs::read(&a_path).unwrap(), b"from-a");

        let b = EmbeddedArchiveExtractor::new(&extraction_dir, vec!["tar".to_string()])
            .with_embedded_entry("lib/b/classes.tar");
        let b_path = b.locate_embedded_archive(&container).unwrap();
        assert_ne!(a_path, b_path);
        assert_eq!(fs::read(&b_path).unwrap(), b"from-b");
    }

    #[test]
    fn test_extraction_leaves_no_temporary_files() {
        let dir = TempDir::new().unwrap();
        let container = dir.path().join("app.pkg");
        write_tar(&container, &[("lib/classes.tar", b"inner")]);

        let extractor =
            EmbeddedArchiveExtractor::new(dir.path().join("extracted"), vec!["tar".to_string()]);
        let path = extractor.locate_embedded_archive(&container).unwrap();

        let files: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(files, vec![std::ffi::OsString::from("classes.tar")]);
    }
}
