//! Types serialized into the published artifacts.
//!
//! These are the front end's contract: field names and optionality must stay
//! stable. `recipes.json` is an array of [`Recipe`], `tags.json` an array of
//! strings, and `build-info.json` a single [`BuildInfo`].

use serde::{Deserialize, Serialize};

/// A recipe as published in `recipes.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    /// Text of the first `# heading`, or the file stem as fallback
    pub title: String,
    /// Unique lookup key derived from the title
    pub slug: String,
    /// `#word` tags in first-seen order
    pub tags: Vec<String>,
    /// Verbatim source text
    pub content: String,
    /// Relative path of the associated image bundle under the bundle output dir
    #[serde(
        rename = "packageFolder",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub package_folder: Option<String>,
}

/// Build metadata written to `build-info.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInfo {
    pub version: String,
    /// RFC 3339, UTC
    pub timestamp: String,
    /// RFC 2822, for display
    pub date: String,
    pub recipes: usize,
    pub tags: usize,
    /// SHA-256 of the published `recipes.json` bytes
    pub digest: String,
}
