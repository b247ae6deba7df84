//! Recipe tree scanning.
//!
//! Stage 1 of the build. Walks the recipe root, discovers recipe sources and
//! image bundles, extracts each recipe, resolves slugs and pairs recipes with
//! bundles. The result is a [`Catalog`]: everything the later stages need,
//! with no filesystem writes.
//!
//! ## Directory Structure
//!
//! ```text
//! recipes/                          # Recipe root
//! ├── config.toml                   # Build config (optional)
//! ├── All Tags.recipe               # Sentinel: skipped
//! ├── Chicken Soup.recipe           # Recipe
//! ├── Chicken Soup.recipepackage/   # Bundle, paired by slug
//! │   └── Photos/
//! │       └── bowl.webp
//! └── Breakfast/                    # Plain directory: recursed into
//!     ├── Shakshuka.recipe
//!     └── IMG_2041.recipepackage/   # Only bundle here: paired by directory
//!         └── Photos/
//!             └── pan.jpg
//! ```
//!
//! ## Rules
//!
//! - Hidden entries (leading `.`) are ignored.
//! - Bundle directories are recorded and not descended into.
//! - A file with the recipe extension is a recipe unless its name is exactly
//!   the sentinel file name.
//! - Recipes are ordered by root-relative path. Slugs are claimed in that
//!   order, so collision suffixes are stable between runs.
//! - Files are read in parallel; results are collected in path order.
//!
//! ## Errors
//!
//! A missing root, an unreadable file, or a file that is not UTF-8 fails the
//! whole scan. A recipe without a heading or tags is not an error.

use crate::bundle::{BundleTable, ImageBundle, MatchKind};
use crate::config::{self, ConfigError, PressConfig, SourceConfig};
use crate::extract::{extract_tags, resolve_title};
use crate::slug::{Claim, Collision, SlugRegistry, slug_for};
use crate::types::Recipe;
use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Recipe root not found: {0}")]
    RootNotFound(PathBuf),
    #[error("Recipe root is not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("Failed to walk recipe tree: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Recipe is not valid UTF-8: {0}")]
    Encoding(PathBuf),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Slug '{}' produced by both {} and {}", .0.slug, .0.first.display(), .0.second.display())]
    SlugCollision(Collision),
    #[error("Failed to start reader pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Raw discovery results, before any file is read.
#[derive(Debug, Default)]
pub struct Discovery {
    /// Recipe sources, root-relative, sorted by path
    pub sources: Vec<PathBuf>,
    /// Bundles, sorted by path
    pub bundles: Vec<ImageBundle>,
    /// Sentinel files that were skipped
    pub sentinels: Vec<PathBuf>,
}

/// Where a recipe came from and what it was paired with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeSource {
    /// Root-relative source path
    pub rel_path: PathBuf,
    /// Index into [`Catalog::bundles`] and how the match was made
    pub bundle: Option<(usize, MatchKind)>,
    /// Slug before collision suffixing, when it had to be changed
    pub renamed_from: Option<String>,
}

/// Everything the scan found.
///
/// `recipes` and `sources` are parallel: `sources[i]` describes `recipes[i]`.
#[derive(Debug, Default)]
pub struct Catalog {
    pub recipes: Vec<Recipe>,
    pub sources: Vec<RecipeSource>,
    /// Sorted union of all recipe tags
    pub tags: Vec<String>,
    pub bundles: Vec<ImageBundle>,
    /// Indices into `bundles` that no recipe paired with
    pub orphan_bundles: Vec<usize>,
    pub collisions: Vec<Collision>,
    pub sentinels: Vec<PathBuf>,
}

impl Catalog {
    /// Bundle paired with the recipe at `index`, if any.
    pub fn bundle_for(&self, index: usize) -> Option<&ImageBundle> {
        self.sources
            .get(index)
            .and_then(|s| s.bundle)
            .map(|(b, _)| &self.bundles[b])
    }
}

/// Scan options beyond the config file.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Root-relative directory to ignore, e.g. the output directory when it
    /// lives inside the recipe root.
    pub exclude: Option<PathBuf>,
}

/// Scan `root` using its own `config.toml` (or stock defaults).
pub fn scan(root: &Path) -> Result<Catalog, ScanError> {
    let config = config::load_config(root)?;
    scan_with(root, &config, &ScanOptions::default())
}

/// Scan `root` with an already-resolved config.
pub fn scan_with(
    root: &Path,
    config: &PressConfig,
    options: &ScanOptions,
) -> Result<Catalog, ScanError> {
    let discovery = discover(root, &config.source, options)?;
    tracing::info!(
        recipes = discovery.sources.len(),
        bundles = discovery.bundles.len(),
        "discovered recipe tree"
    );

    let threads = config::effective_threads(&config.processing);
    let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
    let extracted: Vec<Extracted> = pool.install(|| {
        discovery
            .sources
            .par_iter()
            .map(|rel| read_recipe(root, rel))
            .collect::<Result<Vec<_>, ScanError>>()
    })?;

    let mut registry = SlugRegistry::new(config.slugs.on_collision);
    let mut collisions = Vec::new();
    let mut slugged = Vec::with_capacity(extracted.len());
    for item in extracted {
        let claim = registry
            .claim(&item.base_slug, &item.rel_path)
            .map_err(ScanError::SlugCollision)?;
        let renamed_from = match claim {
            Claim::Unique(_) => None,
            Claim::Renamed {
                ref slug,
                ref collision,
            } => {
                tracing::warn!(
                    slug = %collision.slug,
                    first = %collision.first.display(),
                    second = %collision.second.display(),
                    renamed = %slug,
                    "slug collision"
                );
                collisions.push(collision.clone());
                Some(collision.slug.clone())
            }
        };
        slugged.push((item, claim.slug().to_string(), renamed_from));
    }

    let table = BundleTable::new(&discovery.bundles);
    let keys: Vec<(&Path, &str)> = slugged
        .iter()
        .map(|(item, slug, _)| (item.rel_path.as_path(), slug.as_str()))
        .collect();
    let association = table.associate(&keys);

    for &orphan in &association.orphans {
        tracing::warn!(
            bundle = %discovery.bundles[orphan].package_folder(),
            "bundle matches no recipe; staging it anyway"
        );
    }

    let mut recipes = Vec::with_capacity(slugged.len());
    let mut sources = Vec::with_capacity(slugged.len());
    for ((item, slug, renamed_from), bundle) in slugged.into_iter().zip(association.matches) {
        tracing::debug!(source = %item.rel_path.display(), %slug, "extracted recipe");
        recipes.push(Recipe {
            title: item.title,
            slug,
            tags: item.tags,
            content: item.content,
            package_folder: bundle.map(|(b, _)| discovery.bundles[b].package_folder()),
        });
        sources.push(RecipeSource {
            rel_path: item.rel_path,
            bundle,
            renamed_from,
        });
    }

    let tags = crate::artifacts::tag_index(&recipes);

    Ok(Catalog {
        recipes,
        sources,
        tags,
        bundles: discovery.bundles,
        orphan_bundles: association.orphans,
        collisions,
        sentinels: discovery.sentinels,
    })
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Exact, case-sensitive match: `Soup.RECIPE` is not a recipe.
fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().is_some_and(|e| e == extension)
}

/// Walk `root` and sort its entries into recipe sources, bundles and sentinels.
pub fn discover(
    root: &Path,
    source: &SourceConfig,
    options: &ScanOptions,
) -> Result<Discovery, ScanError> {
    if !root.exists() {
        return Err(ScanError::RootNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }

    let mut discovery = Discovery::default();
    let mut walker = WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(&e.file_name().to_string_lossy()));

    while let Some(entry) = walker.next() {
        let entry = entry?;
        // Entries always live under the walk root.
        let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());

        if entry.file_type().is_dir() {
            if options.exclude.as_deref() == Some(rel) {
                walker.skip_current_dir();
            } else if let Some(bundle) = ImageBundle::from_rel_path(rel, &source.bundle_suffix) {
                discovery.bundles.push(bundle);
                walker.skip_current_dir();
            }
            continue;
        }

        if !entry.file_type().is_file() || !has_extension(rel, &source.recipe_extension) {
            continue;
        }
        if entry.file_name() == source.sentinel_file.as_str() {
            tracing::debug!(path = %rel.display(), "skipping tag sentinel");
            discovery.sentinels.push(rel.to_path_buf());
        } else {
            discovery.sources.push(rel.to_path_buf());
        }
    }

    discovery.sources.sort();
    discovery.bundles.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
    Ok(discovery)
}

/// One recipe file, read and parsed, slug not yet made unique.
#[derive(Debug)]
struct Extracted {
    rel_path: PathBuf,
    title: String,
    base_slug: String,
    tags: Vec<String>,
    content: String,
}

fn read_recipe(root: &Path, rel: &Path) -> Result<Extracted, ScanError> {
    let path = root.join(rel);
    let bytes = fs::read(&path).map_err(|source| ScanError::Read {
        path: path.clone(),
        source,
    })?;
    let content = String::from_utf8(bytes).map_err(|_| ScanError::Encoding(path.clone()))?;

    let stem = rel
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    // A byte-order mark would hide a heading on the first line.
    let text = content.trim_start_matches('\u{feff}');
    let title = resolve_title(text, &stem);
    let base_slug = slug_for(&title, &stem);
    let tags = extract_tags(text);

    Ok(Extracted {
        rel_path: rel.to_path_buf(),
        title,
        base_slug,
        tags,
        content,
    })
}
