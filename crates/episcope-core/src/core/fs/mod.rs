//! Filesystem utilities.
//!
//! Crash-tolerant writes for everything the engine saves: timeline exports,
//! reports and the settings file. A partial write must never replace a
//! good file on disk.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::core::{to_pretty_json, CoreError, CoreResult};

/// Writes `bytes` to `path` using an atomic replace.
///
/// The data goes to a sibling `.tmp` file which is synced and then renamed
/// over the destination. An existing destination is first moved aside to
/// `.bak` and restored if the final rename fails.
pub fn atomic_write_bytes(path: &Path, bytes: &[u8]) -> CoreResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = sibling_path(path, "tmp");
    {
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(bytes)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
    }

    atomic_replace(path, &tmp_path)
}

/// Writes UTF-8 text atomically
pub fn atomic_write_text(path: &Path, text: &str) -> CoreResult<()> {
    atomic_write_bytes(path, text.as_bytes())
}

/// Writes a JSON document atomically, pretty-printed with a 4-space indent
pub fn atomic_write_json_pretty<T: serde::Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> CoreResult<()> {
    let text = to_pretty_json(value)?;
    atomic_write_text(path, &text)
}

fn sibling_path(path: &Path, extension: &str) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| extension.to_string());
    path.with_file_name(format!("{file_name}.{extension}"))
}

fn atomic_replace(dest: &Path, src_tmp: &Path) -> CoreResult<()> {
    if !dest.exists() {
        std::fs::rename(src_tmp, dest)?;
        return Ok(());
    }

    // rename-over-existing is not portable, swap through a backup
    let bak = sibling_path(dest, "bak");
    if bak.exists() {
        let _ = std::fs::remove_file(&bak);
    }

    std::fs::rename(dest, &bak)?;
    match std::fs::rename(src_tmp, dest) {
        Ok(()) => {
            let _ = std::fs::remove_file(&bak);
            Ok(())
        }
        Err(e) => {
            let _ = std::fs::rename(&bak, dest);
            let _ = std::fs::remove_file(src_tmp);
            Err(CoreError::IoError(e))
        }
    }
}
