//! Writing the selected index to disk

use apkidx_errors::Error;
use apkidx_types::Selection;
use filetime::FileTime;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Write the winning index as `dir/file_name` and stamp it with the signed time
///
/// Nothing is written for an empty selection. Returns the path written.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be created, written, or
/// have its timestamps set.
pub async fn write_selection(
    dir: &Path,
    file_name: &str,
    selection: &Selection,
) -> Result<Option<PathBuf>, Error> {
    let Some(best) = selection.best() else {
        return Ok(None);
    };

    fs::create_dir_all(dir)
        .await
        .map_err(|e| Error::io_with_path(&e, dir))?;

    let path = dir.join(file_name);
    fs::write(&path, best.blob())
        .await
        .map_err(|e| Error::io_with_path(&e, &path))?;

    let signed_at = FileTime::from_unix_time(best.timestamp().timestamp(), 0);
    filetime::set_file_times(&path, signed_at, signed_at)
        .map_err(|e| Error::io_with_path(&e, &path))?;

    Ok(Some(path))
}
