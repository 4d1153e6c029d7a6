//! Public configuration types.
//!
//! These are the resolved, ready-to-use structs the store, source and text
//! pipeline consume. Raw TOML deserialization types live in `raw.rs`.

use std::path::PathBuf;
use std::time::Duration;

// ── Wiki ─────────────────────────────────────────────────────────────────────

/// Site-level settings.
#[derive(Debug, Clone)]
pub struct WikiConfig {
    pub site_title: String,
    /// Prefix for every generated link (`{base_path}/wiki/{slug}`).
    /// Stored without a trailing slash.
    pub base_path: String,
    /// Repository the wiki itself lives in.
    pub repo_owner: String,
    pub repo_name: String,
}

// ── Source ───────────────────────────────────────────────────────────────────

/// Where tickets are fetched from.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Which backend is active (`"github"` or `"fixture"`).
    pub provider: String,
    /// Repository the tickets are read from. Falls back to the wiki repo.
    pub owner: String,
    pub repo: String,
    /// REST API root, e.g. `https://api.github.com`.
    pub api_base_url: String,
    /// Page size for the open-ticket listing, 1..=100.
    pub per_page: u32,
    /// Transport timeout for a single request.
    pub timeout_seconds: u64,
    /// JSON array of ticket objects served by the fixture backend.
    pub fixture_path: Option<PathBuf>,
}

// ── Cache ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub ttl: Duration,
    /// Static snapshot used when the remote source is unavailable.
    pub snapshot_path: Option<PathBuf>,
}

// ── Zettelkasten ─────────────────────────────────────────────────────────────

/// Link-rewriting switches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZettelkastenConfig {
    /// Master switch: when off, text is rendered without any link insertion.
    pub enabled: bool,
    /// Turn label names and other titles into keyword links.
    pub auto_link_keywords: bool,
    /// Read by the rendering side to emphasise bidirectional backlinks.
    pub highlight_bidirectional: bool,
    /// Read by the rendering side to show the backlink panel.
    pub show_backlinks: bool,
    /// Titles and label names shorter than this (in characters) are never
    /// auto-linked.
    pub keyword_min_length: usize,
}

impl Default for ZettelkastenConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            auto_link_keywords: true,
            highlight_bidirectional: true,
            show_backlinks: true,
            keyword_min_length: 3,
        }
    }
}

// ── Top-level ────────────────────────────────────────────────────────────────

/// Fully-resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub wiki: WikiConfig,
    pub source: SourceConfig,
    pub cache: CacheConfig,
    pub zettelkasten: ZettelkastenConfig,
    /// Token from `GITHUB_TOKEN`; `None` for anonymous access.
    /// Never sourced from TOML.
    pub github_token: Option<String>,
}
