//! Raw TOML deserialization types.
//!
//! These structs mirror the TOML file shape and use `serde` defaults.
//! The `load` module converts them into the public `types` structs.

use serde::Deserialize;

/// Raw TOML shape, the serde target before resolution.
#[derive(Deserialize)]
pub(super) struct RawConfig {
    pub wiki: RawWiki,
    #[serde(default)]
    pub source: RawSource,
    #[serde(default)]
    pub cache: RawCache,
    #[serde(default)]
    pub zettelkasten: RawZettelkasten,
}

#[derive(Deserialize)]
pub(super) struct RawWiki {
    #[serde(default = "default_site_title")]
    pub site_title: String,
    #[serde(default)]
    pub base_path: String,
    pub repo_owner: String,
    pub repo_name: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Source ──────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawSource {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub repo: Option<String>,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub fixture_path: Option<String>,
}

impl Default for RawSource {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            owner: None,
            repo: None,
            api_base_url: default_api_base_url(),
            per_page: default_per_page(),
            timeout_seconds: default_timeout_seconds(),
            fixture_path: None,
        }
    }
}

// ── Cache ───────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawCache {
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,
    /// An empty string disables the snapshot fallback.
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: String,
}

impl Default for RawCache {
    fn default() -> Self {
        Self { ttl_seconds: default_ttl_seconds(), snapshot_path: default_snapshot_path() }
    }
}

// ── Zettelkasten ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawZettelkasten {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub auto_link_keywords: bool,
    #[serde(default = "default_true")]
    pub highlight_bidirectional: bool,
    #[serde(default = "default_true")]
    pub show_backlinks: bool,
    #[serde(default = "default_keyword_min_length")]
    pub keyword_min_length: usize,
}

impl Default for RawZettelkasten {
    fn default() -> Self {
        Self {
            enabled: true,
            auto_link_keywords: true,
            highlight_bidirectional: true,
            show_backlinks: true,
            keyword_min_length: default_keyword_min_length(),
        }
    }
}

// ── Defaults ────────────────────────────────────────────────────────────────

pub(super) fn default_site_title() -> String {
    "GitWiki Hub".to_string()
}

pub(super) fn default_log_level() -> String {
    "info".to_string()
}

pub(super) fn default_provider() -> String {
    "github".to_string()
}

pub(super) fn default_api_base_url() -> String {
    "https://api.github.com".to_string()
}

pub(super) fn default_per_page() -> u32 {
    100
}

pub(super) fn default_timeout_seconds() -> u64 {
    30
}

pub(super) fn default_ttl_seconds() -> u64 {
    300
}

pub(super) fn default_snapshot_path() -> String {
    "data/issues.json".to_string()
}

pub(super) fn default_keyword_min_length() -> usize {
    3
}

fn default_true() -> bool {
    true
}
