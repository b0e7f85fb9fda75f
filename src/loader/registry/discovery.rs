//! Archive source discovery
//!
//! Turns a separator-delimited archive list into the ordered child scope,
//! unpacking container archives on the way.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::loader::registry::archive::{ArchiveKind, ArchivePath, ArchiveSource};
use crate::loader::registry::container::ContainerResolver;
use crate::loader::traits::LoaderError;

/// Resolves archive lists into directly loadable sources
pub struct ArchiveSourceResolver<'a> {
    /// Archive list separator
    separator: char,
    /// Extensions of directly loadable archives
    direct_extensions: Vec<String>,
    /// Collaborator that unpacks containers
    containers: &'a dyn ContainerResolver,
}

impl<'a> ArchiveSourceResolver<'a> {
    pub fn new(
        separator: char,
        direct_extensions: Vec<String>,
        containers: &'a dyn ContainerResolver,
    ) -> Self {
        Self {
            separator,
            direct_extensions,
            containers,
        }
    }

    /// Build from loader configuration
    pub fn from_config(
        config: &crate::config::LoaderConfig,
        containers: &'a dyn ContainerResolver,
    ) -> Self {
        Self::new(
            config.path_separator,
            config.direct_extensions.clone(),
            containers,
        )
    }

    /// Split and classify an archive list, order preserved
    pub fn parse(&self, path_list: &str) -> Result<Vec<ArchivePath>, LoaderError> {
        let mut paths = Vec::new();

        for segment in path_list.split(self.separator) {
            if segment.is_empty() {
                debug!("Skipping empty archive list segment");
                continue;
            }
            if segment.trim().is_empty() || segment.contains('\0') {
                return Err(LoaderError::invalid_archive(
                    format!("{:?}", segment),
                    "malformed archive path",
                ));
            }
            paths.push(ArchivePath::classify(segment, &self.direct_extensions));
        }

        Ok(paths)
    }

    /// Resolve an archive list into opened sources
    ///
    /// Output order matches input order one-to-one. Any failure aborts the
    /// whole resolution; sources opened so far are dropped.
    pub fn resolve(&self, path_list: &str) -> Result<Vec<Arc<ArchiveSource>>, LoaderError> {
        let paths = self.parse(path_list)?;
        let mut sources = Vec::with_capacity(paths.len());

        for path in paths {
            let source = self.resolve_one(path)?;
            debug!(
                "Resolved {} -> {:?} ({} entries)",
                source.origin().raw(),
                source.archive(),
                source.entry_count()
            );
            sources.push(Arc::new(source));
        }

        info!("Resolved {} archive sources", sources.len());
        Ok(sources)
    }

    fn resolve_one(&self, path: ArchivePath) -> Result<ArchiveSource, LoaderError> {
        let archive = match path.kind() {
            ArchiveKind::DirectArchive => PathBuf::from(path.raw()),
            ArchiveKind::ContainerArchive => {
                let embedded = self
                    .containers
                    .locate_embedded_archive(path.path())
                    .map_err(|e| {
                        warn!("Cannot unpack container {}: {}", path.raw(), e);
                        LoaderError::invalid_archive(path.raw(), e)
                    })?;
                if !embedded.exists() {
                    return Err(LoaderError::invalid_archive(
                        path.raw(),
                        format!("embedded archive {:?} does not exist", embedded),
                    ));
                }
                embedded
            }
        };

        ArchiveSource::open(path, archive)
    }
}
