//! Title and tag extraction from raw recipe text.
//!
//! Recipe sources are markdown-like plain text:
//!
//! ```text
//! # Chicken Soup
//! > A #comforting classic for #winter nights.
//!
//! - 1 whole chicken
//! - 2 carrots
//!
//! ![](bowl.webp)
//! ```
//!
//! - **Title**: the first line that is a level-one heading (`#`, then spaces
//!   or tabs, then text). `## Method` and `#hashtag` lines are not titles.
//! - **Tags**: every `#word` anywhere in the text, in first-seen order,
//!   de-duplicated, case-sensitive. Word characters are Unicode-aware, so
//!   `#crème` yields `crème`.
//!
//! Neither a missing title nor an empty tag list is an error; callers fall
//! back to the file name for the title.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#[ \t]+(.+)$").expect("title regex is valid"));

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#(\w+)").expect("tag regex is valid"));

/// Text of the first `# Heading` line, trimmed. `None` if there is none or
/// the heading is blank.
pub fn extract_title(content: &str) -> Option<String> {
    TITLE_RE
        .captures_iter(content)
        .map(|caps| caps[1].trim().to_string())
        .find(|t| !t.is_empty())
}

/// Every distinct `#word` in `content`, in order of first occurrence.
pub fn extract_tags(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    TAG_RE
        .captures_iter(content)
        .map(|caps| caps[1].to_string())
        .filter(|tag| seen.insert(tag.clone()))
        .collect()
}

/// Title for a recipe: the heading if present, otherwise `stem` (the file
/// name with its extension removed).
pub fn resolve_title(content: &str, stem: &str) -> String {
    extract_title(content).unwrap_or_else(|| stem.to_string())
}
