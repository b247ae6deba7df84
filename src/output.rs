//! CLI output formatting for scan, check and build.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. The primary display
//! for every recipe is its title and positional index, with the source file,
//! slug and bundle shown as indented context lines. This makes the output
//! readable as a recipe inventory while still letting users trace every
//! entry back to a file.
//!
//! # Output Format
//!
//! ## Scan
//!
//! ```text
//! Recipes
//! 001 Shakshuka
//!     Source: Breakfast/Shakshuka.recipe
//!     Slug: shakshuka
//!     Tags: breakfast, easy, vegetarian
//!     Bundle: Breakfast/IMG_2041.recipepackage (by directory)
//! 002 Lemon Tart
//!     Source: Desserts/Old Lemon Tart.recipe
//!     Slug: lemon-tart-2 (renamed from lemon-tart)
//!
//! Bundles
//! 001 Breakfast/IMG_2041.recipepackage → shakshuka
//! 002 Misc.recipepackage (orphan)
//!
//! Tags (7)
//!     baking, breakfast, comforting, dessert, easy, vegetarian, winter
//!
//! Skipped
//!     All Tags.recipe
//! ```
//!
//! ## Check
//!
//! ```text
//! Missing photos
//!     shakshuka (Breakfast/Shakshuka.recipe)
//!         plate.jpg → /recipes/Breakfast/IMG_2041.recipepackage/Photos/plate.jpg
//! ```
//!
//! ## Build
//!
//! ```text
//! Staged 3 bundles: 3 copied → public/recipes
//! Wrote public/recipes.json (6 recipes)
//! Wrote public/tags.json (7 tags)
//! Wrote public/build-info.json
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::bundle::MatchKind;
use crate::config::PressConfig;
use crate::photos;
use crate::pipeline::{BuildReport, CheckReport, MissingPhotos};
use crate::scan::Catalog;
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Relative path with `/` separators on every platform.
fn display_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn match_label(kind: MatchKind) -> &'static str {
    match kind {
        MatchKind::Slug => "by slug",
        MatchKind::Directory => "by directory",
    }
}

// ============================================================================
// Scan output
// ============================================================================

/// Format the recipe inventory: recipes, bundles, tags and skipped files.
pub fn format_scan_output(catalog: &Catalog, source_root: &Path) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push("Recipes".to_string());
    if catalog.recipes.is_empty() {
        lines.push(format!("{}(none)", indent(1)));
    }
    for (i, (recipe, source)) in catalog.recipes.iter().zip(&catalog.sources).enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), recipe.title));
        lines.push(format!("{}Source: {}", indent(1), display_path(&source.rel_path)));
        match &source.renamed_from {
            Some(base) => lines.push(format!(
                "{}Slug: {} (renamed from {})",
                indent(1),
                recipe.slug,
                base
            )),
            None => lines.push(format!("{}Slug: {}", indent(1), recipe.slug)),
        }
        if !recipe.tags.is_empty() {
            lines.push(format!("{}Tags: {}", indent(1), recipe.tags.join(", ")));
        }
        if let (Some(folder), Some((_, kind))) = (&recipe.package_folder, source.bundle) {
            lines.push(format!(
                "{}Bundle: {} ({})",
                indent(1),
                folder,
                match_label(kind)
            ));
        }
    }

    if !catalog.bundles.is_empty() {
        lines.push(String::new());
        lines.push("Bundles".to_string());
        for (i, bundle) in catalog.bundles.iter().enumerate() {
            let owner = catalog
                .sources
                .iter()
                .position(|s| s.bundle.map(|(b, _)| b) == Some(i))
                .map(|r| catalog.recipes[r].slug.as_str());
            match owner {
                Some(slug) => lines.push(format!(
                    "{} {} \u{2192} {}",
                    format_index(i + 1),
                    bundle.package_folder(),
                    slug
                )),
                None => lines.push(format!(
                    "{} {} (orphan)",
                    format_index(i + 1),
                    bundle.package_folder()
                )),
            }
        }
    }

    lines.push(String::new());
    lines.push(format!("Tags ({})", catalog.tags.len()));
    if !catalog.tags.is_empty() {
        lines.push(format!("{}{}", indent(1), catalog.tags.join(", ")));
    }

    if !catalog.sentinels.is_empty() {
        lines.push(String::new());
        lines.push("Skipped".to_string());
        for sentinel in &catalog.sentinels {
            lines.push(format!("{}{}", indent(1), display_path(sentinel)));
        }
    }

    if source_root.join(crate::config::CONFIG_FILENAME).exists() {
        lines.push(String::new());
        lines.push("Config".to_string());
        lines.push(format!("{}{}", indent(1), crate::config::CONFIG_FILENAME));
    }

    lines
}

/// Print scan output to stdout.
pub fn print_scan_output(catalog: &Catalog, source_root: &Path) {
    for line in format_scan_output(catalog, source_root) {
        println!("{}", line);
    }
}

// ============================================================================
// Check output
// ============================================================================

/// Format missing photo references with the URL the front end would request.
pub fn format_missing_photos(
    missing: &[MissingPhotos],
    catalog: &Catalog,
    config: &PressConfig,
) -> Vec<String> {
    let mut lines = Vec::new();
    if missing.is_empty() {
        return lines;
    }
    lines.push("Missing photos".to_string());
    for entry in missing {
        lines.push(format!(
            "{}{} ({})",
            indent(1),
            entry.slug,
            display_path(&entry.source)
        ));
        let folder = catalog
            .recipes
            .iter()
            .find(|r| r.slug == entry.slug)
            .map(|r| photos::bundle_folder(r, &config.source.bundle_suffix))
            .unwrap_or_default();
        for r in &entry.refs {
            let url = photos::photo_url(
                &config.photos.public_base,
                &config.output.bundles_dir,
                &folder,
                &r.file,
            );
            lines.push(format!("{}{} \u{2192} {}", indent(2), r.file, url));
        }
    }
    lines
}

/// Format the check summary: inventory, missing photos, verdict.
pub fn format_check_output(
    report: &CheckReport,
    source_root: &Path,
    config: &PressConfig,
) -> Vec<String> {
    let mut lines = format_scan_output(&report.catalog, source_root);
    let missing = format_missing_photos(&report.missing, &report.catalog, config);
    if !missing.is_empty() {
        lines.push(String::new());
        lines.extend(missing);
    }
    lines.push(String::new());
    let refs: usize = report.missing.iter().map(|m| m.refs.len()).sum();
    let orphans = report.catalog.orphan_bundles.len();
    if report.is_clean() {
        lines.push(format!("{} recipes, no problems", report.catalog.recipes.len()));
    } else {
        lines.push(format!(
            "{} recipes, {} missing photos, {} orphan bundles",
            report.catalog.recipes.len(),
            refs,
            orphans
        ));
    }
    lines
}

pub fn print_check_output(report: &CheckReport, source_root: &Path, config: &PressConfig) {
    for line in format_check_output(report, source_root, config) {
        println!("{}", line);
    }
}

// ============================================================================
// Build output
// ============================================================================

/// Format what a build staged and wrote.
pub fn format_build_output(
    report: &BuildReport,
    output_root: &Path,
    config: &PressConfig,
) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(format!(
        "Staged {} \u{2192} {}",
        report.staged,
        output_root.join(&config.output.bundles_dir).display()
    ));
    lines.push(format!(
        "Wrote {} ({} recipes)",
        report.written.recipes.display(),
        report.catalog.recipes.len()
    ));
    lines.push(format!(
        "Wrote {} ({} tags)",
        report.written.tags.display(),
        report.catalog.tags.len()
    ));
    if let Some(info) = &report.written.build_info {
        lines.push(format!("Wrote {}", info.display()));
    }
    let missing = format_missing_photos(&report.missing, &report.catalog, config);
    if !missing.is_empty() {
        lines.push(String::new());
        lines.extend(missing);
    }
    lines
}

pub fn print_build_output(report: &BuildReport, output_root: &Path, config: &PressConfig) {
    for line in format_build_output(report, output_root, config) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline;
    use crate::scan::scan;
    use crate::test_helpers::*;
    use tempfile::TempDir;

    // =========================================================================
    // Helpers
    // =========================================================================

    #[test]
    fn format_index_pads_to_three() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1234), "1234");
    }

    #[test]
    fn display_path_uses_forward_slashes() {
        let path: std::path::PathBuf = ["Desserts", "Tart.recipe"].iter().collect();
        assert_eq!(display_path(&path), "Desserts/Tart.recipe");
    }

    // =========================================================================
    // Scan
    // =========================================================================

    #[test]
    fn scan_output_lists_recipes_in_order() {
        let tmp = setup_fixtures();
        let catalog = scan(tmp.path()).unwrap();
        let lines = format_scan_output(&catalog, tmp.path());

        assert_eq!(lines[0], "Recipes");
        assert_eq!(lines[1], "001 Shakshuka");
        assert_eq!(lines[2], "    Source: Breakfast/Shakshuka.recipe");
        assert_eq!(lines[3], "    Slug: shakshuka");
        assert_eq!(lines[4], "    Tags: breakfast, easy, vegetarian");
        assert_eq!(
            lines[5],
            "    Bundle: Breakfast/IMG_2041.recipepackage (by directory)"
        );
        assert_eq!(lines[6], "002 Chicken Soup");
    }

    #[test]
    fn scan_output_shows_renamed_slug() {
        let tmp = setup_fixtures();
        let catalog = scan(tmp.path()).unwrap();
        let lines = format_scan_output(&catalog, tmp.path());

        assert!(lines.contains(&"    Slug: lemon-tart-2 (renamed from lemon-tart)".to_string()));
    }

    #[test]
    fn scan_output_marks_orphans_and_owners() {
        let tmp = setup_fixtures();
        let catalog = scan(tmp.path()).unwrap();
        let lines = format_scan_output(&catalog, tmp.path());

        assert!(lines.contains(&"002 Chicken Soup.recipepackage \u{2192} chicken-soup".to_string()));
        assert!(lines.contains(&"003 Misc.recipepackage (orphan)".to_string()));
    }

    #[test]
    fn scan_output_tags_and_skipped() {
        let tmp = setup_fixtures();
        let catalog = scan(tmp.path()).unwrap();
        let lines = format_scan_output(&catalog, tmp.path());

        let tags_at = lines.iter().position(|l| l == "Tags (7)").unwrap();
        assert_eq!(
            lines[tags_at + 1],
            "    baking, breakfast, comforting, dessert, easy, vegetarian, winter"
        );
        let skipped_at = lines.iter().position(|l| l == "Skipped").unwrap();
        assert_eq!(lines[skipped_at + 1], "    All Tags.recipe");
        assert!(!lines.contains(&"Config".to_string()));
    }

    #[test]
    fn scan_output_empty_tree() {
        let tmp = TempDir::new().unwrap();
        let catalog = scan(tmp.path()).unwrap();
        let lines = format_scan_output(&catalog, tmp.path());
        assert_eq!(lines, vec!["Recipes", "    (none)", "", "Tags (0)"]);
    }

    // =========================================================================
    // Check
    // =========================================================================

    #[test]
    fn missing_photos_show_published_url() {
        let tmp = setup_fixtures();
        let config = PressConfig::default();
        let report = pipeline::check(tmp.path(), &tmp.path().join("public"), &config).unwrap();
        let lines = format_missing_photos(&report.missing, &report.catalog, &config);

        assert_eq!(
            lines,
            vec![
                "Missing photos",
                "    shakshuka (Breakfast/Shakshuka.recipe)",
                "        plate.jpg \u{2192} /recipes/Breakfast/IMG_2041.recipepackage/Photos/plate.jpg",
            ]
        );
    }

    #[test]
    fn check_summary_counts_problems() {
        let tmp = setup_fixtures();
        let config = PressConfig::default();
        let report = pipeline::check(tmp.path(), &tmp.path().join("public"), &config).unwrap();
        let lines = format_check_output(&report, tmp.path(), &config);

        assert_eq!(
            lines.last().unwrap(),
            "6 recipes, 1 missing photos, 1 orphan bundles"
        );
    }

    // =========================================================================
    // Build
    // =========================================================================

    #[test]
    fn build_output_lists_written_files() {
        let src = setup_fixtures();
        let out = TempDir::new().unwrap();
        let config = PressConfig::default();
        let report = pipeline::build(src.path(), out.path(), &config, "test").unwrap();
        let lines = format_build_output(&report, out.path(), &config);

        assert!(lines[0].starts_with("Staged 3 bundles: 3 copied"));
        assert!(lines[1].ends_with("recipes.json (6 recipes)"));
        assert!(lines[2].ends_with("tags.json (7 tags)"));
        assert!(lines[3].ends_with("build-info.json"));
    }
}
