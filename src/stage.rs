//! Bundle staging.
//!
//! Copies every image bundle, byte for byte, into the published tree so the
//! front end can address photos as
//! `<bundles_dir>/<packageFolder>/Photos/<file>`:
//!
//! ```text
//! recipes/                               public/
//! ├── Chicken Soup.recipe                ├── recipes.json
//! ├── Chicken Soup.recipepackage/   →    ├── tags.json
//! │   └── Photos/bowl.webp               └── recipes/
//! └── Desserts/                              ├── Chicken Soup.recipepackage/
//!     └── Tart.recipepackage/                │   └── Photos/bowl.webp
//!         └── Photos/slice.jpg               └── Desserts/Tart.recipepackage/
//!                                                └── Photos/slice.jpg
//! ```
//!
//! Every bundle is staged whether or not a recipe pairs with it.
//!
//! ## Skipping unchanged files
//!
//! Photos dominate the output size and rarely change. A destination file whose
//! SHA-256 matches the source is left alone. The comparison is content-based
//! rather than mtime-based so it survives `git checkout`.

use crate::bundle::ImageBundle;
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum StageError {
    #[error("failed to walk bundle {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("failed to copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Counts for one staging run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StageStats {
    pub bundles: usize,
    pub copied: usize,
    pub unchanged: usize,
}

impl StageStats {
    pub fn files(&self) -> usize {
        self.copied + self.unchanged
    }
}

impl fmt::Display for StageStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unchanged > 0 {
            write!(
                f,
                "{} bundles: {} copied, {} unchanged ({} files)",
                self.bundles,
                self.copied,
                self.unchanged,
                self.files()
            )
        } else {
            write!(f, "{} bundles: {} copied", self.bundles, self.copied)
        }
    }
}

/// SHA-256 hash of a file's contents, returned as a hex string.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let bytes = fs::read(path)?;
    Ok(format!("{:x}", Sha256::digest(&bytes)))
}

/// Whether `dst` already holds exactly the bytes of `src`.
fn is_unchanged(src: &Path, dst: &Path) -> io::Result<bool> {
    let (Ok(src_meta), Ok(dst_meta)) = (fs::metadata(src), fs::metadata(dst)) else {
        return Ok(false);
    };
    if !dst_meta.is_file() || src_meta.len() != dst_meta.len() {
        return Ok(false);
    }
    Ok(hash_file(src)? == hash_file(dst)?)
}

/// Stage all bundles from `source_root` into `dest_root`, keeping each
/// bundle's root-relative path.
pub fn stage_bundles(
    bundles: &[ImageBundle],
    source_root: &Path,
    dest_root: &Path,
) -> Result<StageStats, StageError> {
    let mut stats = StageStats::default();
    for bundle in bundles {
        let src = source_root.join(&bundle.rel_path);
        let dst = dest_root.join(&bundle.rel_path);
        copy_bundle(&src, &dst, &mut stats)?;
        stats.bundles += 1;
        tracing::debug!(bundle = %bundle.package_folder(), "staged bundle");
    }
    Ok(stats)
}

fn copy_bundle(src: &Path, dst: &Path, stats: &mut StageStats) -> Result<(), StageError> {
    let copy_err = |from: &Path, to: &Path| {
        let (from, to) = (from.to_path_buf(), to.to_path_buf());
        move |source| StageError::Copy { from, to, source }
    };

    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry.map_err(|source| StageError::Walk {
            path: src.to_path_buf(),
            source,
        })?;
        // WalkDir yields paths under `src`, so the prefix is always there.
        let rel = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let target = dst.join(rel);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(copy_err(entry.path(), target.as_path()))?;
        } else if is_unchanged(entry.path(), &target)
            .map_err(copy_err(entry.path(), target.as_path()))?
        {
            stats.unchanged += 1;
        } else {
            fs::copy(entry.path(), &target).map_err(copy_err(entry.path(), target.as_path()))?;
            stats.copied += 1;
        }
    }
    Ok(())
}
