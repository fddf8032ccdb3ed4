//! File I/O utilities with owner-only permissions and atomic replacement
//!
//! Every file this crate writes holds key material, database contents or
//! archives of them, so files are created `0600` and directories `0700` on
//! Unix. Other platforms fall back to the default permissions.

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{VpnError, VpnResult};

#[cfg(unix)]
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt, PermissionsExt};

/// Recursively create a directory readable only by its owner
pub fn create_private_dir<P: AsRef<Path>>(path: P) -> std::io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(0o700);
    builder.create(path)
}

/// Create (or truncate) a file for writing with owner-only permissions
///
/// An existing file is tightened to `0600` as well, since the open mode only
/// applies on creation.
pub fn create_private_file<P: AsRef<Path>>(path: P) -> std::io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);
    let file = options.open(path)?;
    #[cfg(unix)]
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    Ok(file)
}

/// Write a whole buffer to a file created with owner-only permissions
pub fn write_private<P: AsRef<Path>>(path: P, contents: &[u8]) -> std::io::Result<()> {
    let mut file = create_private_file(path)?;
    file.write_all(contents)?;
    file.flush()
}

/// Path of the scratch file written beside `target` during a replace
pub fn temp_path_for(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_owned();
    name.push(".restore");
    PathBuf::from(name)
}

/// Replace `target` with `contents` via a sibling temp file
///
/// The temp file is renamed over the target. When the rename fails (for
/// instance across devices) the temp file is copied over the target and
/// then removed. Returns `true` if the copy fallback was used. The temp
/// file never outlives a failed call.
pub fn replace_file(target: &Path, contents: &[u8]) -> VpnResult<bool> {
    let temp_path = temp_path_for(target);

    let file = create_private_file(&temp_path)
        .map_err(|e| VpnError::Io(format!("Failed to create temporary file: {}", e)))?;
    if let Err(e) = write_synced(file, contents) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    match fs::rename(&temp_path, target) {
        Ok(()) => Ok(false),
        Err(rename_err) => {
            tracing::warn!(
                target = %target.display(),
                error = %rename_err,
                "rename failed, falling back to copy"
            );
            let copied = fs::copy(&temp_path, target);
            let _ = fs::remove_file(&temp_path);
            copied.map_err(|e| {
                VpnError::Io(format!("Failed to replace {}: {}", target.display(), e))
            })?;
            Ok(true)
        }
    }
}

fn write_synced(file: File, contents: &[u8]) -> VpnResult<()> {
    let mut writer = BufWriter::new(file);
    writer
        .write_all(contents)
        .and_then(|_| writer.flush())
        .map_err(|e| VpnError::Io(format!("Failed to write temporary file: {}", e)))?;
    writer
        .get_ref()
        .sync_all()
        .map_err(|e| VpnError::Io(format!("Failed to sync temporary file: {}", e)))
}

/// Read JSON from a file, returning a default value if file doesn't exist
pub fn read_json<T, P>(path: P) -> VpnResult<T>
where
    T: DeserializeOwned + Default,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if !path.exists() {
        return Ok(T::default());
    }

    let file = File::open(path)
        .map_err(|e| VpnError::Io(format!("Failed to open {}: {}", path.display(), e)))?;

    let reader = BufReader::new(file);
    serde_json::from_reader(reader)
        .map_err(|e| VpnError::Json(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Write JSON to a file atomically (write to temp, then rename)
pub fn write_json_atomic<T, P>(path: P, data: &T) -> VpnResult<()>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        create_private_dir(parent).map_err(|e| {
            VpnError::Io(format!(
                "Failed to create directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    // Create temp file in same directory (important for atomic rename)
    let temp_path = path.with_extension("json.tmp");

    let file = create_private_file(&temp_path)
        .map_err(|e| VpnError::Io(format!("Failed to create temp file: {}", e)))?;

    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, data)
        .map_err(|e| VpnError::Json(format!("Failed to serialize data: {}", e)))?;

    writer
        .flush()
        .map_err(|e| VpnError::Io(format!("Failed to flush data: {}", e)))?;

    writer
        .get_ref()
        .sync_all()
        .map_err(|e| VpnError::Io(format!("Failed to sync data: {}", e)))?;

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        VpnError::Io(format!("Failed to rename temp file: {}", e))
    })?;

    Ok(())
}
