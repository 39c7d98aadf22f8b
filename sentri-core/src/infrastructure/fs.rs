// sentri-core/src/infrastructure/fs.rs

use crate::infrastructure::error::InfrastructureError;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Writes `content` to `path` through a sibling temporary file and a rename,
/// so readers never observe a half-written report.
pub fn atomic_write<P: AsRef<Path>, C: AsRef<[u8]>>(
    path: P,
    content: C,
) -> Result<(), InfrastructureError> {
    let path = path.as_ref();
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    // Same directory as the target so the rename never crosses filesystems.
    let mut temp_file = tempfile::NamedTempFile::new_in(parent)?;
    temp_file.write_all(content.as_ref())?;
    temp_file
        .persist(path)
        .map_err(|e| InfrastructureError::Io(e.error))?;

    Ok(())
}

/// Creates `dir` if needed and atomically writes `file_name` inside it.
pub fn write_into(dir: &Path, file_name: &str, content: &[u8]) -> Result<PathBuf, InfrastructureError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    atomic_write(&path, content)?;
    Ok(path)
}
