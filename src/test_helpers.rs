//! Shared test utilities for the recipe-press test suite.
//!
//! Provides fixture setup and lookup helpers that work with scan-phase data
//! structures (`Catalog`, `Recipe`).
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! let catalog = scan(tmp.path()).unwrap();
//!
//! let soup = find_recipe(&catalog, "chicken-soup");
//! assert_eq!(soup.title, "Chicken Soup");
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::scan::Catalog;
use crate::types::Recipe;

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/recipes/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/recipes");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

// =========================================================================
// Catalog lookups: panic with a clear message on miss
// =========================================================================

/// Find a recipe by slug. Panics if not found.
pub fn find_recipe<'a>(catalog: &'a Catalog, slug: &str) -> &'a Recipe {
    catalog
        .recipes
        .iter()
        .find(|r| r.slug == slug)
        .unwrap_or_else(|| {
            let slugs = recipe_slugs(catalog);
            panic!("recipe '{slug}' not found. Available: {slugs:?}")
        })
}

// =========================================================================
// Bulk extractors
// =========================================================================

/// All recipe slugs in catalog order.
pub fn recipe_slugs(catalog: &Catalog) -> Vec<&str> {
    catalog.recipes.iter().map(|r| r.slug.as_str()).collect()
}

/// All source paths in catalog order, with `/` separators.
pub fn source_paths(catalog: &Catalog) -> Vec<String> {
    catalog
        .sources
        .iter()
        .map(|s| {
            s.rel_path
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/")
        })
        .collect()
}
