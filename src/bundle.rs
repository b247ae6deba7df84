//! Image bundles and their association with recipes.
//!
//! A bundle is a directory named `<name>.<bundle_suffix>` holding a `Photos/`
//! directory. Nothing inside a recipe points at its bundle; the link is a
//! naming convention, so after discovery the scanner builds a lookup table
//! once and resolves every recipe against it.
//!
//! ## Matching rules
//!
//! 1. **By slug**: the bundle's name without suffix, slugified, equals the
//!    recipe's slug. `Chicken Soup.recipepackage` pairs with the recipe whose
//!    slug is `chicken-soup`. If several bundles share that key, the one in
//!    the recipe's own directory wins, then the first by path.
//! 2. **By directory**: a recipe left unmatched takes the bundle in its
//!    directory when that directory holds exactly one bundle, no recipe
//!    claimed it by slug, and no other unmatched recipe lives there.
//!
//! Bundles matched by nothing are orphans. They are still staged.

use crate::slug::slugify;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Name of the photo directory inside a bundle.
pub const PHOTOS_DIR: &str = "Photos";

/// A discovered image-bundle directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBundle {
    /// Path relative to the recipe root, e.g. `Desserts/Tart.recipepackage`
    pub rel_path: PathBuf,
    /// Directory name, e.g. `Tart.recipepackage`
    pub folder: String,
    /// Directory name without the suffix, e.g. `Tart`
    pub stem: String,
}

impl ImageBundle {
    /// Build a bundle record from its root-relative path, or `None` when the
    /// final component does not carry `.<suffix>`.
    pub fn from_rel_path(rel_path: &Path, suffix: &str) -> Option<Self> {
        let folder = rel_path.file_name()?.to_string_lossy().to_string();
        let stem = strip_bundle_suffix(&folder, suffix)?.to_string();
        Some(Self {
            rel_path: rel_path.to_path_buf(),
            folder,
            stem,
        })
    }

    /// Directory (relative to the root) that contains the bundle.
    pub fn parent(&self) -> &Path {
        self.rel_path.parent().unwrap_or(Path::new(""))
    }

    /// Value published as `packageFolder`: the relative path with `/`
    /// separators. Equal to [`ImageBundle::folder`] for bundles at the root.
    pub fn package_folder(&self) -> String {
        self.rel_path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// `Name.<suffix>` → `Some("Name")`. The suffix matches exactly and the stem
/// must be non-empty.
pub fn strip_bundle_suffix<'a>(name: &'a str, suffix: &str) -> Option<&'a str> {
    let dot = name.rfind('.')?;
    let (stem, ext) = (&name[..dot], &name[dot + 1..]);
    (!stem.is_empty() && ext == suffix).then_some(stem)
}

/// How a recipe got its bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Slug,
    Directory,
}

/// Result of resolving every recipe against the bundle table.
#[derive(Debug, Default)]
pub struct Association {
    /// Per recipe (same order as the input): index into the bundle list.
    pub matches: Vec<Option<(usize, MatchKind)>>,
    /// Bundle indices no recipe was associated with, in bundle order.
    pub orphans: Vec<usize>,
}

/// Lookup table from slug and from directory to bundle indices.
pub struct BundleTable<'a> {
    bundles: &'a [ImageBundle],
    by_slug: HashMap<String, Vec<usize>>,
    by_dir: HashMap<&'a Path, Vec<usize>>,
}

impl<'a> BundleTable<'a> {
    pub fn new(bundles: &'a [ImageBundle]) -> Self {
        let mut by_slug: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_dir: HashMap<&Path, Vec<usize>> = HashMap::new();
        for (i, bundle) in bundles.iter().enumerate() {
            by_slug.entry(slugify(&bundle.stem)).or_default().push(i);
            by_dir.entry(bundle.parent()).or_default().push(i);
        }
        Self {
            bundles,
            by_slug,
            by_dir,
        }
    }

    /// Bundle whose slugified stem equals `slug`, preferring one in `dir`.
    fn slug_match(&self, slug: &str, dir: &Path) -> Option<usize> {
        let candidates = self.by_slug.get(slug)?;
        candidates
            .iter()
            .copied()
            .find(|&i| self.bundles[i].parent() == dir)
            .or_else(|| candidates.first().copied())
    }

    /// Resolve recipes, given as `(root-relative source path, slug)` pairs.
    pub fn associate(&self, recipes: &[(&Path, &str)]) -> Association {
        let mut matches: Vec<Option<(usize, MatchKind)>> = vec![None; recipes.len()];
        let mut claimed: HashSet<usize> = HashSet::new();

        for (i, (source, slug)) in recipes.iter().enumerate() {
            let dir = source.parent().unwrap_or(Path::new(""));
            if let Some(b) = self.slug_match(slug, dir)
                && claimed.insert(b)
            {
                matches[i] = Some((b, MatchKind::Slug));
            }
        }

        // Unmatched recipes grouped by directory, in input order.
        let mut unmatched: BTreeMap<&Path, Vec<usize>> = BTreeMap::new();
        for (i, (source, _)) in recipes.iter().enumerate() {
            if matches[i].is_none() {
                let dir = source.parent().unwrap_or(Path::new(""));
                unmatched.entry(dir).or_default().push(i);
            }
        }
        for (dir, recipe_ids) in unmatched {
            let Some(bundle_ids) = self.by_dir.get(dir) else {
                continue;
            };
            if let ([recipe], [bundle]) = (recipe_ids.as_slice(), bundle_ids.as_slice())
                && claimed.insert(*bundle)
            {
                matches[*recipe] = Some((*bundle, MatchKind::Directory));
            }
        }

        let orphans = (0..self.bundles.len())
            .filter(|i| !claimed.contains(i))
            .collect();

        Association { matches, orphans }
    }
}
