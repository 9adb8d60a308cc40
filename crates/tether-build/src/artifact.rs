//! Generated artifact output

use crate::error::{BuildError, BuildResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Write `contents` to `path` by replacing it with a fully written sibling
///
/// Missing parent directories are created. An existing file with identical
/// contents is left untouched so its modification time stays stable.
/// Returns whether the file was written.
pub fn write_atomic(path: &Path, contents: &str) -> BuildResult<bool> {
    if fs::read_to_string(path).is_ok_and(|existing| existing == contents) {
        return Ok(false);
    }

    let file_name = path
        .file_name()
        .ok_or_else(|| BuildError::InvalidOutput(path.to_path_buf()))?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|e| BuildError::io(parent, e))?;

    let tmp = temp_path(parent, &file_name.to_string_lossy());
    fs::write(&tmp, contents).map_err(|e| BuildError::io(&tmp, e))?;

    if let Err(error) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(BuildError::io(path, error));
    }
    Ok(true)
}

fn temp_path(dir: &Path, file_name: &str) -> PathBuf {
    dir.join(format!(".{}.tmp-{}", file_name, std::process::id()))
}
