//! Photo references and URLs.
//!
//! Recipe text embeds photos with markdown image syntax naming a file in the
//! bundle's `Photos/` directory:
//!
//! ```text
//! ![The finished bowl](bowl.webp)
//! ```
//!
//! The front end rewrites each such reference to
//! `<public_base><bundles_dir>/<folder>/Photos/<file>`, where `<folder>` is the
//! recipe's `packageFolder`, or `<slug>.<bundle_suffix>` when it has none.
//! The helpers here compute the same URLs so the build can report references
//! that would 404 on the published site.

use crate::bundle::PHOTOS_DIR;
use crate::types::Recipe;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

static IMAGE_REF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)!\[([^\]]*)\]\(([^)\s]+\.(?:webp|jpeg|jpg|png|gif))\)")
        .expect("image reference regex is valid")
});

/// A `![alt](file)` reference to a bundle photo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub alt: String,
    pub file: String,
}

/// Bundle-relative image references in `content`, in order of appearance.
///
/// References with a directory part or a URL scheme (`https://...`,
/// `Photos/x.jpg`) do not name a bundle photo and are skipped.
pub fn image_refs(content: &str) -> Vec<ImageRef> {
    IMAGE_REF_RE
        .captures_iter(content)
        .filter(|caps| !caps[2].contains('/') && !caps[2].contains(':'))
        .map(|caps| ImageRef {
            alt: caps[1].to_string(),
            file: caps[2].to_string(),
        })
        .collect()
}

/// Bundle folder the front end will use for a recipe's photos.
pub fn bundle_folder(recipe: &Recipe, bundle_suffix: &str) -> String {
    recipe
        .package_folder
        .clone()
        .unwrap_or_else(|| format!("{}.{}", recipe.slug, bundle_suffix))
}

/// Published URL of a bundle photo. Each path segment is percent-encoded, so
/// `Chicken Soup.recipepackage` becomes `Chicken%20Soup.recipepackage`.
pub fn photo_url(public_base: &str, bundles_dir: &str, folder: &str, file: &str) -> String {
    let encoded: Vec<String> = bundles_dir
        .split('/')
        .chain(folder.split('/'))
        .chain([PHOTOS_DIR, file])
        .filter(|segment| !segment.is_empty())
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect();
    format!("{public_base}{}", encoded.join("/"))
}

/// References in `recipe` whose file is missing from `<bundle_dir>/Photos`.
///
/// `bundle_dir` is `None` when the recipe has no bundle; then every reference
/// is missing.
pub fn missing_photos(recipe: &Recipe, bundle_dir: Option<&Path>) -> Vec<ImageRef> {
    image_refs(&recipe.content)
        .into_iter()
        .filter(|r| {
            bundle_dir
                .map(|dir| !dir.join(PHOTOS_DIR).join(&r.file).is_file())
                .unwrap_or(true)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn recipe(slug: &str, content: &str, package_folder: Option<&str>) -> Recipe {
        Recipe {
            title: slug.to_string(),
            slug: slug.to_string(),
            tags: vec![],
            content: content.to_string(),
            package_folder: package_folder.map(String::from),
        }
    }

    // =========================================================================
    // image_refs
    // =========================================================================

    #[test]
    fn finds_references_with_supported_extensions() {
        let text = "![](a.webp)\n![Bowl](b.JPG)\n![x](c.png) ![](d.gif) ![](e.jpeg)";
        let files: Vec<String> = image_refs(text).into_iter().map(|r| r.file).collect();
        assert_eq!(files, vec!["a.webp", "b.JPG", "c.png", "d.gif", "e.jpeg"]);
    }

    #[test]
    fn keeps_alt_text() {
        let refs = image_refs("![The finished bowl](bowl.webp)");
        assert_eq!(
            refs,
            vec![ImageRef {
                alt: "The finished bowl".to_string(),
                file: "bowl.webp".to_string(),
            }]
        );
    }

    #[test]
    fn ignores_other_extensions_and_links() {
        assert!(image_refs("![](clip.mp4) [link](page.png) ![](x.svg)").is_empty());
    }

    #[test]
    fn ignores_urls_and_paths() {
        assert!(image_refs("![](https://cdn.example.com/a.jpg) ![](Photos/a.jpg)").is_empty());
    }

    // =========================================================================
    // URLs
    // =========================================================================

    #[test]
    fn bundle_folder_prefers_package_folder() {
        let r = recipe("soup", "", Some("Grandma Soup.recipepackage"));
        assert_eq!(bundle_folder(&r, "recipepackage"), "Grandma Soup.recipepackage");
    }

    #[test]
    fn bundle_folder_falls_back_to_slug() {
        let r = recipe("chicken-soup", "", None);
        assert_eq!(bundle_folder(&r, "recipepackage"), "chicken-soup.recipepackage");
    }

    #[test]
    fn photo_url_percent_encodes_segments() {
        assert_eq!(
            photo_url("/Recipes/", "recipes", "Chicken Soup.recipepackage", "my bowl.webp"),
            "/Recipes/recipes/Chicken%20Soup.recipepackage/Photos/my%20bowl.webp"
        );
    }

    #[test]
    fn photo_url_keeps_nested_folder_separators() {
        assert_eq!(
            photo_url("/", "recipes", "Desserts/Tart & Pie.recipepackage", "a.jpg"),
            "/recipes/Desserts/Tart%20%26%20Pie.recipepackage/Photos/a.jpg"
        );
    }

    // =========================================================================
    // missing_photos
    // =========================================================================

    #[test]
    fn missing_photos_reports_absent_files() {
        let tmp = TempDir::new().unwrap();
        let photos = tmp.path().join("Photos");
        fs::create_dir_all(&photos).unwrap();
        fs::write(photos.join("bowl.webp"), "x").unwrap();

        let r = recipe("soup", "![](bowl.webp)\n![](spoon.jpg)", Some("Soup.recipepackage"));
        let missing = missing_photos(&r, Some(tmp.path()));
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].file, "spoon.jpg");
    }

    #[test]
    fn everything_missing_without_bundle() {
        let r = recipe("soup", "![](bowl.webp)", None);
        assert_eq!(missing_photos(&r, None).len(), 1);
    }
}
