//! Filesystem primitives for configuration artifacts.
//!
//! # Responsibilities
//! - Create, truncate or append a file in one atomic rename, keeping the
//!   replaced file's mode and owner
//! - Create directories (parents included)
//! - Remove a set of files and directories with `rm -rf` semantics

use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;

/// How [`update_file`] treats existing content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Replace the whole file.
    Truncate,
    /// Keep existing bytes and add the new content after them.
    Append,
}

/// Create-or-truncate-or-append `contents` into `path`.
///
/// The result is written to a sibling temp file and renamed into place.
pub async fn update_file(path: &Path, contents: &str, mode: WriteMode) -> io::Result<()> {
    let data = match mode {
        WriteMode::Truncate => contents.as_bytes().to_vec(),
        WriteMode::Append => {
            let mut existing = read_optional(path).await?.unwrap_or_default();
            existing.extend_from_slice(contents.as_bytes());
            existing
        }
    };
    write_atomic(path, &data).await
}

/// Replace `path` with `data` via temp file + rename.
///
/// An existing target's permissions and owner are carried over to the new file.
pub async fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }

    let existing = match fs::metadata(path).await {
        Ok(meta) => Some(meta),
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => return Err(e),
    };

    let tmp = temp_sibling(path)?;
    fs::write(&tmp, data).await?;
    if let Err(e) = replace_with(&tmp, path, existing.as_ref()).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e);
    }
    Ok(())
}

async fn replace_with(tmp: &Path, path: &Path, existing: Option<&Metadata>) -> io::Result<()> {
    if let Some(meta) = existing {
        fs::set_permissions(tmp, meta.permissions()).await?;
        copy_owner(tmp, meta).await;
    }
    fs::rename(tmp, path).await
}

#[cfg(unix)]
async fn copy_owner(tmp: &Path, meta: &Metadata) {
    use std::os::unix::fs::MetadataExt;

    let (uid, gid) = (meta.uid(), meta.gid());
    let target = tmp.to_path_buf();
    let result = tokio::task::spawn_blocking(move || std::os::unix::fs::chown(&target, Some(uid), Some(gid)))
        .await
        .map_err(io::Error::other)
        .and_then(|chowned| chowned);

    // Without privileges the file stays owned by this process.
    if let Err(e) = result {
        tracing::warn!(path = %tmp.display(), uid, gid, error = %e, "Could not keep artifact owner");
    }
}

#[cfg(not(unix))]
async fn copy_owner(_tmp: &Path, _meta: &Metadata) {}

/// Read a file, mapping "not found" to `None`.
pub async fn read_optional(path: &Path) -> io::Result<Option<Vec<u8>>> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Create a directory and any missing parents.
pub async fn make_dir(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path).await
}

/// Remove every path, ignoring ones that are already gone.
///
/// Stops at the first real failure and reports which path caused it.
pub async fn remove_all(paths: &[PathBuf]) -> Result<(), (PathBuf, io::Error)> {
    for path in paths {
        let result = match fs::symlink_metadata(path).await {
            Ok(meta) if meta.is_dir() => fs::remove_dir_all(path).await,
            Ok(_) => fs::remove_file(path).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err((path.clone(), e)),
        }
    }
    Ok(())
}

fn temp_sibling(path: &Path) -> io::Result<PathBuf> {
    let name = path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} has no file name", path.display()),
        )
    })?;
    let mut tmp_name = std::ffi::OsString::from(".");
    tmp_name.push(name);
    tmp_name.push(format!(".{}.tmp", std::process::id()));
    Ok(path.with_file_name(tmp_name))
}
