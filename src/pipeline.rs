//! Build and check runs.
//!
//! A build is three steps, each finishing before the next starts:
//!
//! ```text
//! 1. Scan      recipes/  →  Catalog          (read-only)
//! 2. Stage     bundles   →  public/recipes/  (byte copies)
//! 3. Write     Catalog   →  public/*.json    (atomic)
//! ```
//!
//! Nothing is written until the scan has succeeded, and the JSON artifacts
//! are written last, so a failure in steps 1 or 2 never leaves a fresh
//! `recipes.json` pointing at photos that were not staged.

use crate::artifacts::{self, ArtifactError, Written};
use crate::config::PressConfig;
use crate::photos::{self, ImageRef};
use crate::scan::{self, Catalog, ScanError, ScanOptions};
use crate::stage::{self, StageError, StageStats};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Scan failed: {0}")]
    Scan(#[from] ScanError),
    #[error("Staging failed: {0}")]
    Stage(#[from] StageError),
    #[error("Writing artifacts failed: {0}")]
    Artifact(#[from] ArtifactError),
}

/// Photo references in one recipe that point at nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingPhotos {
    pub slug: String,
    pub source: PathBuf,
    pub refs: Vec<ImageRef>,
}

#[derive(Debug)]
pub struct CheckReport {
    pub catalog: Catalog,
    pub missing: Vec<MissingPhotos>,
}

impl CheckReport {
    /// No missing photos and no orphan bundles.
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.catalog.orphan_bundles.is_empty()
    }
}

#[derive(Debug)]
pub struct BuildReport {
    pub catalog: Catalog,
    pub missing: Vec<MissingPhotos>,
    pub staged: StageStats,
    pub written: Written,
}

/// Root-relative path of `output` when it lies inside `source`.
///
/// Staged bundles under such an output directory would otherwise be found
/// again on the next scan.
fn output_inside_source(source: &Path, output: &Path) -> Option<PathBuf> {
    let source = source.canonicalize().ok()?;
    let output = output.canonicalize().ok()?;
    output
        .strip_prefix(&source)
        .ok()
        .filter(|rel| !rel.as_os_str().is_empty())
        .map(Path::to_path_buf)
}

/// Scan options for a run whose output goes to `output`.
pub fn scan_options(source: &Path, output: &Path) -> ScanOptions {
    ScanOptions {
        exclude: output_inside_source(source, output),
    }
}

/// Photo references in each recipe that its source bundle cannot satisfy.
pub fn find_missing_photos(catalog: &Catalog, source: &Path) -> Vec<MissingPhotos> {
    catalog
        .recipes
        .iter()
        .enumerate()
        .filter_map(|(i, recipe)| {
            let bundle_dir = catalog.bundle_for(i).map(|b| source.join(&b.rel_path));
            let refs = photos::missing_photos(recipe, bundle_dir.as_deref());
            if refs.is_empty() {
                return None;
            }
            for r in &refs {
                tracing::warn!(recipe = %recipe.slug, file = %r.file, "photo not found in bundle");
            }
            Some(MissingPhotos {
                slug: recipe.slug.clone(),
                source: catalog.sources[i].rel_path.clone(),
                refs,
            })
        })
        .collect()
}

/// Scan and validate without writing anything.
///
/// `output` is only used to leave a previous build's output out of the scan
/// when it lives inside `source`.
pub fn check(source: &Path, output: &Path, config: &PressConfig) -> Result<CheckReport, ScanError> {
    let catalog = scan::scan_with(source, config, &scan_options(source, output))?;
    let missing = find_missing_photos(&catalog, source);
    Ok(CheckReport { catalog, missing })
}

/// Full build: scan `source`, stage bundles and write artifacts to `output`.
pub fn build(
    source: &Path,
    output: &Path,
    config: &PressConfig,
    version: &str,
) -> Result<BuildReport, BuildError> {
    let catalog = scan::scan_with(source, config, &scan_options(source, output))?;
    let missing = find_missing_photos(&catalog, source);

    let bundles_root = output.join(&config.output.bundles_dir);
    let staged = stage::stage_bundles(&catalog.bundles, source, &bundles_root)?;
    tracing::info!(%staged, "staged bundles");

    let written = artifacts::write_artifacts(
        output,
        &catalog.recipes,
        &catalog.tags,
        &config.output,
        version,
    )?;
    tracing::info!(path = %written.recipes.display(), recipes = catalog.recipes.len(), "wrote artifacts");

    Ok(BuildReport {
        catalog,
        missing,
        staged,
        written,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use crate::types::Recipe;
    use std::fs;
    use tempfile::TempDir;

    // =========================================================================
    // build
    // =========================================================================

    #[test]
    fn build_writes_artifacts_and_stages_bundles() {
        let src = setup_fixtures();
        let out = TempDir::new().unwrap();

        let report = build(src.path(), out.path(), &PressConfig::default(), "test").unwrap();

        let recipes: Vec<Recipe> =
            serde_json::from_str(&fs::read_to_string(out.path().join("recipes.json")).unwrap())
                .unwrap();
        assert_eq!(recipes, report.catalog.recipes);
        let tags: Vec<String> =
            serde_json::from_str(&fs::read_to_string(out.path().join("tags.json")).unwrap())
                .unwrap();
        assert_eq!(tags, report.catalog.tags);

        let staged = out
            .path()
            .join("recipes/Chicken Soup.recipepackage/Photos/bowl.webp");
        assert_eq!(
            fs::read(&staged).unwrap(),
            fs::read(src.path().join("Chicken Soup.recipepackage/Photos/bowl.webp")).unwrap()
        );
        assert!(out
            .path()
            .join("recipes/Breakfast/IMG_2041.recipepackage/Photos/pan.jpg")
            .is_file());
        // Orphans are staged too.
        assert!(out.path().join("recipes/Misc.recipepackage/Photos/extra.png").is_file());
        assert_eq!(report.staged.bundles, 3);
    }

    #[test]
    fn every_package_folder_is_staged() {
        let src = setup_fixtures();
        let out = TempDir::new().unwrap();
        let report = build(src.path(), out.path(), &PressConfig::default(), "test").unwrap();

        for recipe in &report.catalog.recipes {
            if let Some(folder) = &recipe.package_folder {
                assert!(
                    out.path().join("recipes").join(folder).join("Photos").is_dir(),
                    "{folder} not staged"
                );
            }
        }
    }

    #[test]
    fn rebuild_is_byte_identical_and_skips_copies() {
        let src = setup_fixtures();
        let out = TempDir::new().unwrap();
        let config = PressConfig::default();

        build(src.path(), out.path(), &config, "test").unwrap();
        let first = fs::read(out.path().join("recipes.json")).unwrap();
        let second_report = build(src.path(), out.path(), &config, "test").unwrap();
        let second = fs::read(out.path().join("recipes.json")).unwrap();

        assert_eq!(first, second);
        assert_eq!(second_report.staged.copied, 0);
        assert_eq!(second_report.staged.unchanged, 3);
    }

    #[test]
    fn failed_scan_writes_nothing() {
        let src = setup_fixtures();
        fs::write(src.path().join("Broken.recipe"), [0xc3, 0x28]).unwrap();
        let out = TempDir::new().unwrap();
        let target = out.path().join("public");

        let result = build(src.path(), &target, &PressConfig::default(), "test");

        assert!(matches!(result, Err(BuildError::Scan(ScanError::Encoding(_)))));
        assert!(!target.exists());
    }

    #[test]
    fn missing_root_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("public");
        let result = build(
            &tmp.path().join("missing"),
            &target,
            &PressConfig::default(),
            "test",
        );
        assert!(matches!(result, Err(BuildError::Scan(ScanError::RootNotFound(_)))));
        assert!(!target.exists());
    }

    #[test]
    fn output_inside_source_is_not_rescanned() {
        let src = setup_fixtures();
        let out = src.path().join("public");
        let config = PressConfig::default();

        build(src.path(), &out, &config, "test").unwrap();
        let report = build(src.path(), &out, &config, "test").unwrap();

        assert_eq!(report.catalog.bundles.len(), 3);
        assert!(!out.join("recipes/public").exists());
    }

    #[test]
    fn custom_bundles_dir() {
        let src = setup_fixtures();
        let out = TempDir::new().unwrap();
        let mut config = PressConfig::default();
        config.output.bundles_dir = "media/bundles".to_string();

        build(src.path(), out.path(), &config, "test").unwrap();

        assert!(out
            .path()
            .join("media/bundles/Chicken Soup.recipepackage/Photos/bowl.webp")
            .is_file());
    }

    // =========================================================================
    // check
    // =========================================================================

    #[test]
    fn check_reports_missing_photos() {
        let src = setup_fixtures();
        let report = check(src.path(), &src.path().join("public"), &PressConfig::default()).unwrap();

        assert_eq!(report.missing.len(), 1);
        assert_eq!(report.missing[0].slug, "shakshuka");
        assert_eq!(report.missing[0].refs[0].file, "plate.jpg");
        assert!(!report.is_clean());
    }

    #[test]
    fn check_is_clean_when_everything_resolves() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("Soup.recipe"), "# Soup\n![](a.jpg)").unwrap();
        fs::create_dir_all(tmp.path().join("Soup.recipepackage/Photos")).unwrap();
        fs::write(tmp.path().join("Soup.recipepackage/Photos/a.jpg"), "x").unwrap();

        let report = check(tmp.path(), &tmp.path().join("public"), &PressConfig::default()).unwrap();
        assert!(report.is_clean());
    }

    #[test]
    fn check_after_build_inside_source_ignores_output() {
        let src = setup_fixtures();
        let out = src.path().join("public");
        let config = PressConfig::default();

        build(src.path(), &out, &config, "test").unwrap();
        let report = check(src.path(), &out, &config).unwrap();

        assert_eq!(report.catalog.bundles.len(), 3);
        assert_eq!(report.catalog.orphan_bundles.len(), 1);
        assert_eq!(report.catalog.recipes.len(), 6);
    }

    #[test]
    fn check_writes_nothing() {
        let src = setup_fixtures();
        check(src.path(), &src.path().join("public"), &PressConfig::default()).unwrap();
        assert!(!src.path().join("recipes.json").exists());
    }
}
