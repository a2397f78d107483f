// src/forum/cache.rs
//!
//! Disk budget for the forum webview's storage
//!
//! The forum window keeps its cookies, local storage and HTTP cache in a
//! dedicated directory under the app data dir. Left alone it grows without
//! bound (attachment images are large and the vendor CDN versions them), so
//! every forum open prunes it back to a fixed budget, oldest files first.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tauri::{AppHandle, Manager};

use crate::error::CompanionError;

/// Upper bound for the forum webview's on-disk footprint
pub const CACHE_BUDGET_BYTES: u64 = 64 * 1024 * 1024;

/// Subdirectory of the app data dir handed to the webview as its profile
const DATA_DIR_NAME: &str = "forum-webview";

/// Directory the forum webview uses for its profile data. Created on
/// first use.
pub fn forum_data_dir(app_handle: &AppHandle) -> Result<PathBuf, CompanionError> {
    let dir = app_handle
        .path()
        .app_data_dir()
        .map_err(|e| CompanionError::settings(format!("data dir unavailable: {e}")))?
        .join(DATA_DIR_NAME);
    fs::create_dir_all(&dir)
        .map_err(|e| CompanionError::filesystem(dir.display().to_string(), e))?;
    Ok(dir)
}

/// Prune the forum profile directory back under the budget. Returns the
/// number of bytes removed.
pub fn prune_to_budget(app_handle: &AppHandle) -> Result<u64, CompanionError> {
    let dir = forum_data_dir(app_handle)?;
    let removed = prune_dir_to(&dir, CACHE_BUDGET_BYTES)?;
    if removed > 0 {
        println!(
            "[Forum Cache] Pruned {} bytes from {}",
            removed,
            dir.display()
        );
    }
    Ok(removed)
}

/// Total size of a directory tree in bytes. A missing directory counts
/// as empty.
pub fn dir_size(path: &Path) -> u64 {
    fs_extra::dir::get_size(path).unwrap_or(0)
}

/// Delete files oldest-first until the tree fits the budget. Returns the
/// number of bytes removed.
pub fn prune_dir_to(path: &Path, budget_bytes: u64) -> Result<u64, CompanionError> {
    let mut total = dir_size(path);
    if total <= budget_bytes {
        return Ok(0);
    }

    let mut files = Vec::new();
    collect_files(path, &mut files)?;
    // Tie on equal mtimes is broken by path so the order is stable
    files.sort_by(|a, b| a.modified.cmp(&b.modified).then(a.path.cmp(&b.path)));

    let mut removed = 0u64;
    for file in files {
        if total <= budget_bytes {
            break;
        }
        match fs::remove_file(&file.path) {
            Ok(()) => {
                total = total.saturating_sub(file.size);
                removed += file.size;
            }
            Err(e) => {
                // The webview may hold some files open; skip and move on
                eprintln!(
                    "[Forum Cache] Could not remove {}: {}",
                    file.path.display(),
                    e
                );
            }
        }
    }

    Ok(removed)
}

struct CacheFile {
    path: PathBuf,
    size: u64,
    modified: SystemTime,
}

fn collect_files(path: &Path, out: &mut Vec<CacheFile>) -> Result<(), CompanionError> {
    let entries = match fs::read_dir(path) {
        Ok(entries) => entries,
        Err(_) => return Ok(()),
    };

    for entry in entries {
        let entry =
            entry.map_err(|e| CompanionError::filesystem(path.display().to_string(), e))?;
        let entry_path = entry.path();
        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(_) => continue,
        };

        if metadata.is_dir() {
            collect_files(&entry_path, out)?;
        } else if metadata.is_file() {
            out.push(CacheFile {
                path: entry_path,
                size: metadata.len(),
                // Missing mtime sorts to the front and is pruned first
                modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            });
        }
    }

    Ok(())
}
