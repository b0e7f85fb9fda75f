//! Archive paths and opened archive sources
//!
//! Archives are uncompressed tar files. Opening one reads the headers once and
//! records where every regular entry's data lives; entry bytes are only read
//! on demand.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::loader::traits::LoaderError;

/// Kind of an archive path entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    /// Can be searched as-is
    DirectArchive,
    /// Outer package that embeds a directly loadable archive
    ContainerArchive,
}

/// One entry of an archive list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivePath {
    raw: String,
    kind: ArchiveKind,
}

impl ArchivePath {
    /// Classify a raw path by its extension
    pub fn classify(raw: impl Into<String>, direct_extensions: &[String]) -> Self {
        let raw = raw.into();
        let kind = match Path::new(&raw).extension().and_then(|e| e.to_str()) {
            Some(ext) if direct_extensions.iter().any(|d| d.eq_ignore_ascii_case(ext)) => {
                ArchiveKind::DirectArchive
            }
            _ => ArchiveKind::ContainerArchive,
        };
        Self { raw, kind }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn kind(&self) -> ArchiveKind {
        self.kind
    }

    pub fn path(&self) -> &Path {
        Path::new(&self.raw)
    }
}

/// Location of an entry's data inside the archive file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EntrySpan {
    offset: u64,
    size: u64,
}

/// A directly loadable archive plus the archive list entry it came from
#[derive(Debug)]
pub struct ArchiveSource {
    origin: ArchivePath,
    archive: PathBuf,
    entries: HashMap<String, EntrySpan>,
}

impl ArchiveSource {
    /// Open a tar archive and index its entry headers
    pub fn open(origin: ArchivePath, archive: PathBuf) -> Result<Self, LoaderError> {
        if !archive.is_file() {
            return Err(LoaderError::invalid_archive(
                archive.display(),
                "archive does not exist or is not a regular file",
            ));
        }

        let file = File::open(&archive)
            .map_err(|e| LoaderError::invalid_archive(archive.display(), e))?;
        let entries = index_entries(file)
            .map_err(|e| LoaderError::invalid_archive(archive.display(), e))?;

        debug!("Indexed {} entries in {:?}", entries.len(), archive);

        Ok(Self {
            origin,
            archive,
            entries,
        })
    }

    /// Archive list entry this source was resolved from
    pub fn origin(&self) -> &ArchivePath {
        &self.origin
    }

    /// Directly loadable archive file (the extracted one for containers)
    pub fn archive(&self) -> &Path {
        &self.archive
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.entries.contains_key(entry)
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Entry names, sorted
    pub fn entry_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Read an entry's bytes, `Ok(None)` when the archive has no such entry
    pub fn read(&self, entry: &str) -> Result<Option<Vec<u8>>, LoaderError> {
        match self.entries.get(entry) {
            Some(span) => read_span(&self.archive, entry, *span).map(Some),
            None => Ok(None),
        }
    }
}

/// Normalise a tar entry path to the slash form used for lookups
pub(crate) fn normalize_entry_name(path: &Path) -> String {
    let name = path.to_string_lossy().replace('\\', "/");
    name.trim_start_matches("./").to_string()
}

fn index_entries<R: Read>(reader: R) -> std::io::Result<HashMap<String, EntrySpan>> {
    let mut archive = tar::Archive::new(reader);
    let mut entries = HashMap::new();

    for entry in archive.entries()? {
        let entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let name = normalize_entry_name(&entry.path()?);
        // Later duplicates shadow earlier ones, as tar extraction would
        entries.insert(
            name,
            EntrySpan {
                offset: entry.raw_file_position(),
                size: entry.size(),
            },
        );
    }

    Ok(entries)
}

/// Read exactly `span.size` bytes at `span.offset`
fn read_span(archive: &Path, entry: &str, span: EntrySpan) -> Result<Vec<u8>, LoaderError> {
    let mut file = File::open(archive).map_err(|e| LoaderError::archive_read(archive, e))?;
    file.seek(SeekFrom::Start(span.offset))
        .map_err(|e| LoaderError::archive_read(archive, e))?;

    let mut bytes = Vec::with_capacity(span.size as usize);
    file.take(span.size)
        .read_to_end(&mut bytes)
        .map_err(|e| LoaderError::archive_read(archive, e))?;

    if bytes.len() as u64 != span.size {
        return Err(LoaderError::archive_read(
            archive,
            format!("entry {} truncated ({} of {} bytes)", entry, bytes.len(), span.size),
        ));
    }

    Ok(bytes)
}

/// Read one entry of an archive that has not been opened as a source
///
/// Used by resource locators, which only carry the archive path and entry
/// name. Duplicate entries resolve the same way `ArchiveSource::open` does.
pub fn read_entry(archive: &Path, entry: &str) -> Result<Vec<u8>, LoaderError> {
    let file = File::open(archive).map_err(|e| LoaderError::archive_read(archive, e))?;
    let entries = index_entries(file).map_err(|e| LoaderError::archive_read(archive, e))?;

    match entries.get(entry) {
        Some(span) => read_span(archive, entry, *span),
        None => Err(LoaderError::archive_read(
            archive,
            format!("entry {} not present", entry),
        )),
    }
}
