//! # Recipe Press
//!
//! A build-time extractor that turns a folder of recipe notes into the JSON a
//! static recipe site fetches at runtime. Your filesystem is the data source:
//! every `.recipe` file becomes a recipe, its first `# ` heading becomes the
//! title, every `#word` becomes a tag, and `.recipepackage` directories carry
//! the photos.
//!
//! # Architecture: Scan, Stage, Write
//!
//! ```text
//! 1. Scan    recipes/  →  Catalog               (filesystem → structured data)
//! 2. Stage   bundles   →  public/recipes/       (photo bundles, byte for byte)
//! 3. Write   Catalog   →  public/recipes.json   (plus tags.json, build-info.json)
//! ```
//!
//! The scan is read-only and finishes before anything is written, so a bad
//! recipe file aborts the run with the previous output still intact. Given
//! the same tree, the artifacts are byte-identical between runs.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Walks the recipe root, reads recipes in parallel, produces the [`scan::Catalog`] |
//! | [`extract`] | Title and tag extraction from recipe text |
//! | [`slug`] | Title slugs and collision handling |
//! | [`bundle`] | Image bundle records and recipe ↔ bundle association |
//! | [`stage`] | Copies bundles into the output tree, skipping unchanged files |
//! | [`artifacts`] | JSON serialization and all-or-nothing artifact writes |
//! | [`photos`] | Photo references in recipe text and their published URLs |
//! | [`pipeline`] | `build` and `check` runs over the stages above |
//! | [`config`] | `config.toml` loading, merging onto stock defaults, validation |
//! | [`types`] | Records serialized into the artifacts (`Recipe`, `BuildInfo`) |
//! | [`output`] | CLI output formatting for scan, check and build |
//!
//! # Design Decisions
//!
//! ## Recipes Are Ordered by Path
//!
//! Directory listing order differs between filesystems. Recipes are sorted
//! by root-relative path before slugs are claimed, which makes both the
//! output order and collision suffixes (`soup`, `soup-2`) stable.
//!
//! ## Bundles Are Matched by Convention
//!
//! Nothing in a recipe names its bundle. A bundle pairs with the recipe
//! whose slug equals the bundle's slugified stem, with a same-directory
//! fallback for bundles named by a camera. See [`bundle`].
//!
//! ## Logging vs Output
//!
//! The inventory a user asked for (`scan`, `check`) is printed by [`output`]
//! to stdout. Diagnostics such as collisions and orphan bundles go through
//! `tracing` to stderr, filtered by `RUST_LOG` or `-v`.

pub mod artifacts;
pub mod bundle;
pub mod config;
pub mod extract;
pub mod output;
pub mod photos;
pub mod pipeline;
pub mod scan;
pub mod slug;
pub mod stage;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
