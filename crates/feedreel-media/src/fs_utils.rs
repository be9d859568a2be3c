//! Filesystem helpers for the on-disk cache.
//!
//! Cache entries are only ever created by moving a fully written sibling
//! (`<name>.part`) into place, so a file under a cache key is always complete.

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// Sibling path used while `dest` is being written.
pub fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    dest.with_file_name(name)
}

/// True when `path` is an existing regular file with at least one byte.
pub async fn is_nonempty_file(path: &Path) -> bool {
    match fs::metadata(path).await {
        Ok(meta) => meta.is_file() && meta.len() > 0,
        Err(_) => false,
    }
}

/// Create `dir` and its parents if missing.
pub async fn ensure_dir(dir: &Path) -> MediaResult<()> {
    fs::create_dir_all(dir).await?;
    Ok(())
}

/// Delete a file, ignoring "not found". Other failures are logged.
pub async fn remove_quietly(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => debug!("Removed {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
    }
}

/// Move a file from `src` to `dst`, handling cross-device moves.
///
/// Tries a rename first and falls back to copy-then-delete on EXDEV.
pub async fn move_file(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> MediaResult<()> {
    let src = src.as_ref();
    let dst = dst.as_ref();

    if let Some(parent) = dst.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }

    match fs::rename(src, dst).await {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device_error(&e) => {
            debug!(
                "Cross-device rename, copying instead: {} -> {}",
                src.display(),
                dst.display()
            );
            copy_and_delete(src, dst).await
        }
        Err(e) => Err(MediaError::from(e)),
    }
}

/// Copy `src` to `dst` through a `.part` sibling.
pub async fn copy_file(src: &Path, dst: &Path) -> MediaResult<()> {
    let tmp = part_path(dst);
    if let Err(e) = fs::copy(src, &tmp).await {
        remove_quietly(&tmp).await;
        return Err(e.into());
    }
    if let Err(e) = fs::rename(&tmp, dst).await {
        remove_quietly(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}

/// EXDEV is error code 18 on Linux/macOS.
fn is_cross_device_error(e: &std::io::Error) -> bool {
    e.raw_os_error() == Some(18)
}

async fn copy_and_delete(src: &Path, dst: &Path) -> MediaResult<()> {
    copy_file(src, dst).await?;
    if let Err(e) = fs::remove_file(src).await {
        warn!(
            "Failed to remove source after cross-device move: {}: {}",
            src.display(),
            e
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_part_path() {
        assert_eq!(
            part_path(Path::new("/out/aww/abc.mp4")),
            PathBuf::from("/out/aww/abc.mp4.part")
        );
    }

    #[tokio::test]
    async fn test_move_file_into_new_subdirectory() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("abc.mp4.part");
        let dst = dir.path().join("aww").join("abc.mp4");

        fs::write(&src, b"video").await.unwrap();
        move_file(&src, &dst).await.unwrap();

        assert!(!src.exists());
        assert_eq!(fs::read(&dst).await.unwrap(), b"video");
    }

    #[tokio::test]
    async fn test_move_file_overwrites_destination() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("new.mp4");
        let dst = dir.path().join("old.mp4");

        fs::write(&src, b"new").await.unwrap();
        fs::write(&dst, b"old").await.unwrap();
        move_file(&src, &dst).await.unwrap();

        assert_eq!(fs::read(&dst).await.unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_nonempty_and_remove() {
        let dir = TempDir::new().unwrap();
        let empty = dir.path().join("empty.mp4");
        let full = dir.path().join("full.mp4");
        fs::write(&empty, b"").await.unwrap();
        fs::write(&full, b"x").await.unwrap();

        assert!(!is_nonempty_file(&empty).await);
        assert!(is_nonempty_file(&full).await);
        assert!(!is_nonempty_file(&dir.path().join("missing")).await);

        remove_quietly(&full).await;
        remove_quietly(&full).await;
        assert!(!full.exists());
    }

    #[tokio::test]
    async fn test_copy_file_leaves_no_part() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("a.mp4");
        let dst = dir.path().join("b.mp4");
        fs::write(&src, b"data").await.unwrap();

        copy_file(&src, &dst).await.unwrap();
        assert!(src.exists());
        assert!(dst.exists());
        assert!(!part_path(&dst).exists());
    }

    #[test]
    fn test_is_cross_device_error() {
        assert!(is_cross_device_error(&std::io::Error::from_raw_os_error(18)));
        assert!(!is_cross_device_error(&std::io::Error::from_raw_os_error(2)));
    }
}
