//! Slug generation and collision resolution.
//!
//! A slug is the front end's only lookup key for a recipe (`/recipe/<slug>`),
//! so every slug in `recipes.json` must be unique. Generation is a pure
//! function of the title; uniqueness is enforced afterwards by [`SlugRegistry`],
//! which sees recipes in relative-path order so the outcome is stable between
//! runs.

use crate::config::CollisionPolicy;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Slug used when neither the title nor the file name has any ASCII alphanumerics.
pub const FALLBACK_SLUG: &str = "recipe";

/// Turn a title into a URL-safe identifier.
///
/// - Lower-cases the input
/// - Replaces every run of characters outside `[a-z0-9]` with one dash
/// - Strips leading and trailing dashes
///
/// ```
/// use recipe_press::slug::slugify;
/// assert_eq!(slugify("Chicken & Rice!"), "chicken-rice");
/// assert_eq!(slugify("  Mom's   Soup  "), "mom-s-soup");
/// ```
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in title.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(c);
            pending_dash = false;
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Slugify a title, falling back to the file stem and then [`FALLBACK_SLUG`]
/// when the title has nothing slug-worthy in it (e.g. `# ¡¿!?`).
pub fn slug_for(title: &str, stem: &str) -> String {
    [slugify(title), slugify(stem)]
        .into_iter()
        .find(|s| !s.is_empty())
        .unwrap_or_else(|| FALLBACK_SLUG.to_string())
}

/// Two recipe sources that produced the same base slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    pub slug: String,
    /// Source that claimed the slug first.
    pub first: PathBuf,
    /// Source that collided with it.
    pub second: PathBuf,
}

/// Outcome of claiming a slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claim {
    /// The slug was free.
    Unique(String),
    /// The slug was taken; under the suffix policy this carries the
    /// disambiguated slug that was assigned instead.
    Renamed { slug: String, collision: Collision },
}

impl Claim {
    pub fn slug(&self) -> &str {
        match self {
            Claim::Unique(slug) | Claim::Renamed { slug, .. } => slug,
        }
    }
}

/// Hands out unique slugs in claim order.
#[derive(Debug)]
pub struct SlugRegistry {
    policy: CollisionPolicy,
    /// Every slug handed out so far, mapped to the source that owns it.
    taken: HashMap<String, PathBuf>,
}

impl SlugRegistry {
    pub fn new(policy: CollisionPolicy) -> Self {
        Self {
            policy,
            taken: HashMap::new(),
        }
    }

    /// Claim `base` for `source`.
    ///
    /// Under [`CollisionPolicy::Suffix`] a taken slug becomes `base-2`,
    /// `base-3`, ... (the first value nobody owns yet). Under
    /// [`CollisionPolicy::Error`] a taken slug is returned as `Err`.
    pub fn claim(&mut self, base: &str, source: &Path) -> Result<Claim, Collision> {
        let Some(owner) = self.taken.get(base) else {
            self.taken.insert(base.to_string(), source.to_path_buf());
            return Ok(Claim::Unique(base.to_string()));
        };

        let collision = Collision {
            slug: base.to_string(),
            first: owner.clone(),
            second: source.to_path_buf(),
        };
        if self.policy == CollisionPolicy::Error {
            return Err(collision);
        }

        let mut n = 2u32;
        let slug = loop {
            let candidate = format!("{base}-{n}");
            if !self.taken.contains_key(&candidate) {
                break candidate;
            }
            n += 1;
        };
        self.taken.insert(slug.clone(), source.to_path_buf());
        Ok(Claim::Renamed { slug, collision })
    }
}
