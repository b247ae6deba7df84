//! Build configuration.
//!
//! Handles loading, validating, and merging `config.toml`. The file lives in
//! the recipe root and is optional: stock defaults are serialized to a TOML
//! value, the user's file is merged on top, and the result is deserialized
//! and validated.
//!
//! ## Config File Location
//!
//! ```text
//! recipes/
//! ├── config.toml                    # Build config (optional)
//! ├── All Tags.recipe                # Sentinel, never a recipe
//! ├── Chicken Soup.recipe
//! ├── Chicken Soup.recipepackage/
//! │   └── Photos/
//! │       └── bowl.webp
//! └── Desserts/
//!     └── Lemon Tart.recipe
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [source]
//! recipe_extension = "recipe"        # Extension of recipe source files
//! bundle_suffix = "recipepackage"    # Suffix of image-bundle directories
//! sentinel_file = "All Tags.recipe"  # Tag aggregate file, skipped
//!
//! [output]
//! recipes_file = "recipes.json"
//! tags_file = "tags.json"
//! bundles_dir = "recipes"            # Where bundles are staged in the output
//! build_info = true                  # Also write build-info.json
//!
//! [slugs]
//! on_collision = "suffix"            # "suffix" (-2, -3, ...) or "error"
//!
//! [photos]
//! public_base = "/"                  # Base URL the site is served under
//!
//! [processing]
//! max_processes = 4                  # Max parallel readers (omit for auto)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the config file looked up in the recipe root.
pub const CONFIG_FILENAME: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Build configuration loaded from `config.toml`.
///
/// All fields have defaults; a user file only specifies what it overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PressConfig {
    /// How recipe sources and bundles are recognized.
    pub source: SourceConfig,
    /// Artifact names and staging location.
    pub output: OutputConfig,
    /// Slug collision policy.
    pub slugs: SlugConfig,
    /// Consumer-side photo URL settings.
    pub photos: PhotosConfig,
    /// Parallel reading settings.
    pub processing: ProcessingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    /// Extension (without the dot) that marks a recipe source file.
    pub recipe_extension: String,
    /// Directory-name suffix (without the dot) that marks an image bundle.
    pub bundle_suffix: String,
    /// Exact file name of the tag aggregate file.
    pub sentinel_file: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            recipe_extension: "recipe".to_string(),
            bundle_suffix: "recipepackage".to_string(),
            sentinel_file: "All Tags.recipe".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub recipes_file: String,
    pub tags_file: String,
    /// Directory under the output root that bundles are staged into.
    pub bundles_dir: String,
    /// Write `build-info.json` next to the data artifacts.
    pub build_info: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            recipes_file: "recipes.json".to_string(),
            tags_file: "tags.json".to_string(),
            bundles_dir: "recipes".to_string(),
            build_info: true,
        }
    }
}

/// What to do when two recipes produce the same slug.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Keep the first slug, append `-2`, `-3`, ... to later ones.
    #[default]
    Suffix,
    /// Abort the build.
    Error,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SlugConfig {
    pub on_collision: CollisionPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhotosConfig {
    /// Base URL the published site is served from. Must end with `/`.
    pub public_base: String,
}

impl Default for PhotosConfig {
    fn default() -> Self {
        Self {
            public_base: "/".to_string(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel file readers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)`, never below one
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

fn validate_token(key: &str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{key} must not be empty")));
    }
    if value.contains('.') || value.contains('/') || value.contains('\\') {
        return Err(ConfigError::Validation(format!(
            "{key} must not contain '.', '/' or '\\' (got {value:?})"
        )));
    }
    Ok(())
}

fn validate_file_name(key: &str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{key} must not be empty")));
    }
    if value.contains('/') || value.contains('\\') {
        return Err(ConfigError::Validation(format!(
            "{key} must be a plain file name (got {value:?})"
        )));
    }
    Ok(())
}

impl PressConfig {
    /// Validate config values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_token("source.recipe_extension", &self.source.recipe_extension)?;
        validate_token("source.bundle_suffix", &self.source.bundle_suffix)?;
        validate_file_name("source.sentinel_file", &self.source.sentinel_file)?;
        validate_file_name("output.recipes_file", &self.output.recipes_file)?;
        validate_file_name("output.tags_file", &self.output.tags_file)?;

        if self.output.recipes_file == self.output.tags_file {
            return Err(ConfigError::Validation(
                "output.recipes_file and output.tags_file must differ".into(),
            ));
        }
        if self.output.build_info
            && (self.output.recipes_file == crate::artifacts::BUILD_INFO_FILE
                || self.output.tags_file == crate::artifacts::BUILD_INFO_FILE)
        {
            return Err(ConfigError::Validation(format!(
                "{} is reserved while output.build_info is enabled",
                crate::artifacts::BUILD_INFO_FILE
            )));
        }

        let bundles_dir = Path::new(&self.output.bundles_dir);
        if self.output.bundles_dir.is_empty()
            || bundles_dir.is_absolute()
            || bundles_dir
                .components()
                .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(ConfigError::Validation(
                "output.bundles_dir must be a non-empty relative path inside the output".into(),
            ));
        }

        if !self.photos.public_base.ends_with('/') {
            return Err(ConfigError::Validation(
                "photos.public_base must end with '/'".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(PressConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// Tables merge key-by-key; any other overlay value replaces the base value.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if there is no config file.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILENAME);
    if !config_path.is_file() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<PressConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: PressConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the recipe root, falling back to defaults.
pub fn load_config(root: &Path) -> Result<PressConfig, ConfigError> {
    resolve_config(load_raw_config(root)?)
}

/// Returns a fully-commented stock `config.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# recipe-press configuration
# ==========================
# Place this file at the root of the recipe directory as config.toml.
# All settings are optional; values shown below are the defaults.
# Unknown keys cause an error.

# ---------------------------------------------------------------------------
# Source tree
# ---------------------------------------------------------------------------
[source]
# Extension (without the dot) of recipe source files.
recipe_extension = "recipe"

# Directory suffix (without the dot) of image bundles. Each bundle holds a
# Photos/ directory and is copied verbatim into the output.
bundle_suffix = "recipepackage"

# File that aggregates every known tag. It has the recipe extension but is
# metadata, so it never becomes a recipe.
sentinel_file = "All Tags.recipe"

# ---------------------------------------------------------------------------
# Output artifacts
# ---------------------------------------------------------------------------
[output]
recipes_file = "recipes.json"
tags_file = "tags.json"

# Bundles are staged to <output>/<bundles_dir>/<bundle folder>/.
bundles_dir = "recipes"

# Write build-info.json (version, timestamp, counts, recipes digest).
build_info = true

# ---------------------------------------------------------------------------
# Slugs
# ---------------------------------------------------------------------------
[slugs]
# What to do when two titles produce the same slug:
#   "suffix" - keep the first, append -2, -3, ... to the others
#   "error"  - fail the build
on_collision = "suffix"

# ---------------------------------------------------------------------------
# Photos
# ---------------------------------------------------------------------------
[photos]
# Base URL the site is served under, used when reporting photo URLs.
public_base = "/"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel file readers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
