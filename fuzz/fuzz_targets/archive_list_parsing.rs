#![no_main]
use libfuzzer_sys::fuzz_target;
use std::path::{Path, PathBuf};
use unit_loader::{ArchiveKind, ArchiveSourceResolver, ContainerError};

fn no_containers(container: &Path) -> Result<PathBuf, ContainerError> {
    Err(ContainerError::NotFound(container.display().to_string()))
}

fuzz_target!(|data: &[u8]| {
    // Archive lists come from configuration; parsing must never panic
    let Ok(list) = std::str::from_utf8(data) else {
        return;
    };

    let direct = vec!["tar".to_string()];
    for separator in [':', ';'] {
        let resolver = ArchiveSourceResolver::new(separator, direct.clone(), &no_containers);
        if let Ok(paths) = resolver.parse(list) {
            for path in &paths {
                assert!(!path.raw().is_empty());
                assert!(!path.raw().contains(separator));
                if path.kind() == ArchiveKind::DirectArchive {
                    assert!(path.raw().to_ascii_lowercase().contains(".tar"));
                }
            }
        }
    }
});
