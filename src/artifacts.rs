//! Artifact serialization and atomic writes.
//!
//! The front end fetches two files, plus an optional third:
//!
//! | File | Contents |
//! |------|----------|
//! | `recipes.json` | Array of [`Recipe`] in relative-path order |
//! | `tags.json` | Sorted, unique union of every recipe's tags |
//! | `build-info.json` | [`BuildInfo`]: version, time, counts, digest |
//!
//! Everything is serialized to memory first. Each file is then written to a
//! hidden temporary sibling and renamed over the target only once every
//! temporary file exists. Previous files are kept aside until every rename
//! has succeeded, so a failed run never leaves a fresh `recipes.json` next
//! to a stale `tags.json`.

use crate::config::OutputConfig;
use crate::types::{BuildInfo, Recipe};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of the optional build metadata artifact.
pub const BUILD_INFO_FILE: &str = "build-info.json";

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Sorted, de-duplicated union of every recipe's tags.
pub fn tag_index(recipes: &[Recipe]) -> Vec<String> {
    recipes
        .iter()
        .flat_map(|r| r.tags.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Pretty JSON (two-space indent) with a trailing newline.
pub fn to_json_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut bytes = serde_json::to_vec_pretty(value)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Build metadata for a run whose `recipes.json` serialized to `recipes_json`.
pub fn build_info(
    version: &str,
    now: DateTime<Utc>,
    recipes: usize,
    tags: usize,
    recipes_json: &[u8],
) -> BuildInfo {
    BuildInfo {
        version: version.to_string(),
        timestamp: now.to_rfc3339(),
        date: now.to_rfc2822(),
        recipes,
        tags,
        digest: format!("{:x}", Sha256::digest(recipes_json)),
    }
}

/// Paths of the artifacts written by [`write_artifacts`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Written {
    pub recipes: PathBuf,
    pub tags: PathBuf,
    pub build_info: Option<PathBuf>,
}

/// Hidden sibling of `target` with `suffix` appended, e.g. `.tags.json.tmp`.
fn sibling_path(target: &Path, suffix: &str) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    target.with_file_name(format!(".{name}.{suffix}"))
}

fn temp_path(target: &Path) -> PathBuf {
    sibling_path(target, "tmp")
}

fn backup_path(target: &Path) -> PathBuf {
    sibling_path(target, "bak")
}

/// Move `tmp` over `target`, keeping any previous file as a backup.
///
/// Returns the backup path when there was a previous file. On failure the
/// previous file is back in place.
fn replace_with_backup(tmp: &Path, target: &Path) -> io::Result<Option<PathBuf>> {
    let backup = if target.is_file() {
        let backup = backup_path(target);
        fs::rename(target, &backup)?;
        Some(backup)
    } else {
        None
    };
    if let Err(e) = fs::rename(tmp, target) {
        if let Some(backup) = &backup {
            let _ = fs::rename(backup, target);
        }
        return Err(e);
    }
    Ok(backup)
}

/// Undo replacements in reverse order: restore backups, remove new files.
fn roll_back(replaced: &[(&Path, Option<PathBuf>)]) {
    for (target, backup) in replaced.iter().rev() {
        match backup {
            Some(backup) => {
                let _ = fs::rename(backup, target);
            }
            None => {
                let _ = fs::remove_file(target);
            }
        }
    }
}

fn remove_temps(staged: &[(PathBuf, &Path)]) {
    for (tmp, _) in staged {
        let _ = fs::remove_file(tmp);
    }
}

/// Write every `(target, bytes)` pair so that either all targets are replaced
/// or none are.
///
/// All bytes go to hidden temporary siblings first. Targets are then swapped
/// in one by one; if any swap fails, the swaps already made are undone. No
/// temporary or backup file survives either outcome.
pub fn write_all_atomic(files: &[(PathBuf, Vec<u8>)]) -> Result<(), ArtifactError> {
    let write_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| ArtifactError::Write { path, source }
    };

    let mut staged: Vec<(PathBuf, &Path)> = Vec::with_capacity(files.len());
    for (target, bytes) in files {
        let tmp = temp_path(target);
        if let Err(e) = fs::write(&tmp, bytes) {
            let _ = fs::remove_file(&tmp);
            remove_temps(&staged);
            return Err(write_err(tmp.as_path())(e));
        }
        staged.push((tmp, target.as_path()));
    }

    let mut replaced: Vec<(&Path, Option<PathBuf>)> = Vec::with_capacity(staged.len());
    for (tmp, target) in &staged {
        match replace_with_backup(tmp, target) {
            Ok(backup) => replaced.push((*target, backup)),
            Err(e) => {
                roll_back(&replaced);
                remove_temps(&staged);
                return Err(write_err(*target)(e));
            }
        }
    }

    for (_, backup) in &replaced {
        if let Some(backup) = backup {
            let _ = fs::remove_file(backup);
        }
    }
    Ok(())
}

/// Serialize and write `recipes.json`, `tags.json` and (if enabled)
/// `build-info.json` into `output_dir`.
pub fn write_artifacts(
    output_dir: &Path,
    recipes: &[Recipe],
    tags: &[String],
    config: &OutputConfig,
    version: &str,
) -> Result<Written, ArtifactError> {
    fs::create_dir_all(output_dir).map_err(|source| ArtifactError::Write {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let recipes_json = to_json_bytes(recipes)?;
    let tags_json = to_json_bytes(tags)?;

    let written = Written {
        recipes: output_dir.join(&config.recipes_file),
        tags: output_dir.join(&config.tags_file),
        build_info: config.build_info.then(|| output_dir.join(BUILD_INFO_FILE)),
    };

    let mut files = Vec::with_capacity(3);
    if let Some(path) = &written.build_info {
        let info = build_info(version, Utc::now(), recipes.len(), tags.len(), &recipes_json);
        files.push((path.clone(), to_json_bytes(&info)?));
    }
    files.push((written.recipes.clone(), recipes_json));
    files.push((written.tags.clone(), tags_json));

    write_all_atomic(&files)?;
    Ok(written)
}
