//! Loading logic: TOML inheritance chains, env overrides, resolution.

use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::AppError;

use super::raw::{self, RawConfig};
use super::types::*;

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Values that come from the process environment rather than the file.
///
/// Tests build this directly instead of mutating env vars.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    /// `ISSUE_WIKI_LOG_LEVEL`
    pub log_level: Option<String>,
    /// `ISSUE_WIKI_BASE_PATH`
    pub base_path: Option<String>,
    /// `GITHUB_TOKEN`
    pub github_token: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        let non_empty = |key: &str| env::var(key).ok().filter(|v| !v.trim().is_empty());
        Self {
            log_level: non_empty("ISSUE_WIKI_LOG_LEVEL"),
            base_path: non_empty("ISSUE_WIKI_BASE_PATH"),
            github_token: non_empty("GITHUB_TOKEN"),
        }
    }
}

/// Deep-merge two TOML values. Tables merge key by key; any other overlay
/// value replaces the base value.
fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut merged), toml::Value::Table(overlay_tbl)) => {
            for (key, value) in overlay_tbl {
                let next = match merged.remove(&key) {
                    Some(existing) => merge_toml(existing, value),
                    None => value,
                };
                merged.insert(key, next);
            }
            toml::Value::Table(merged)
        }
        (_, overlay) => overlay,
    }
}

/// Read `path`, follow its `[meta] base = "..."` chain and return the merged
/// document. `seen` holds canonical paths already on the chain.
fn read_chain(path: &Path, seen: &mut HashSet<PathBuf>) -> Result<toml::Value, AppError> {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    if !seen.insert(canonical) {
        return Err(AppError::Config(format!(
            "circular base reference detected at: {}",
            path.display()
        )));
    }

    let text = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;
    let value: toml::Value = toml::from_str(&text)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;

    let base = value
        .get("meta")
        .and_then(|meta| meta.get("base"))
        .and_then(|base| base.as_str())
        .map(|base| {
            let base = Path::new(base);
            if base.is_absolute() {
                base.to_path_buf()
            } else {
                path.parent().unwrap_or(Path::new(".")).join(base)
            }
        });

    match base {
        Some(base_path) => Ok(merge_toml(read_chain(&base_path, seen)?, value)),
        None => Ok(value),
    }
}

/// Load config from `config_path`, else `config/default.toml`, else the
/// built-in defaults, applying environment overrides in every case.
pub fn load(config_path: Option<&str>) -> Result<Config, AppError> {
    let overrides = EnvOverrides::from_env();

    if let Some(path) = config_path {
        return load_from(Path::new(path), &overrides);
    }

    let default_path = Path::new(DEFAULT_CONFIG_PATH);
    if default_path.exists() {
        load_from(default_path, &overrides)
    } else {
        Ok(builtin(&overrides))
    }
}

/// Load and resolve one config file (plus its base chain).
pub fn load_from(path: &Path, overrides: &EnvOverrides) -> Result<Config, AppError> {
    let merged = read_chain(path, &mut HashSet::new())?;

    let parsed: RawConfig = Deserialize::deserialize(merged).map_err(|e: toml::de::Error| {
        AppError::Config(format!("config error in {}: {e}", path.display()))
    })?;

    resolve(parsed, overrides)
}

fn resolve(parsed: RawConfig, overrides: &EnvOverrides) -> Result<Config, AppError> {
    let RawConfig { wiki, source, cache, zettelkasten } = parsed;

    let log_level = overrides.log_level.clone().unwrap_or(wiki.log_level);
    crate::logger::parse_level(&log_level).map_err(|e| AppError::Config(e.to_string()))?;

    let base_path = overrides.base_path.as_deref().unwrap_or(&wiki.base_path);

    let provider = source.provider.trim().to_ascii_lowercase();
    if provider.is_empty() {
        return Err(AppError::Config("source.provider must not be empty".into()));
    }

    Ok(Config {
        log_level,
        source: SourceConfig {
            provider,
            owner: source.owner.unwrap_or_else(|| wiki.repo_owner.clone()),
            repo: source.repo.unwrap_or_else(|| wiki.repo_name.clone()),
            api_base_url: source.api_base_url.trim_end_matches('/').to_string(),
            per_page: source.per_page.clamp(1, 100),
            timeout_seconds: source.timeout_seconds.max(1),
            fixture_path: source.fixture_path.as_deref().map(expand_home),
        },
        wiki: WikiConfig {
            site_title: wiki.site_title,
            base_path: normalize_base_path(base_path),
            repo_owner: wiki.repo_owner,
            repo_name: wiki.repo_name,
        },
        cache: CacheConfig {
            ttl: Duration::from_secs(cache.ttl_seconds),
            snapshot_path: Some(cache.snapshot_path.trim())
                .filter(|p| !p.is_empty())
                .map(expand_home),
        },
        zettelkasten: ZettelkastenConfig {
            enabled: zettelkasten.enabled,
            auto_link_keywords: zettelkasten.auto_link_keywords,
            highlight_bidirectional: zettelkasten.highlight_bidirectional,
            show_backlinks: zettelkasten.show_backlinks,
            keyword_min_length: zettelkasten.keyword_min_length,
        },
        github_token: overrides.github_token.clone(),
    })
}

/// Defaults used when no config file exists at all.
fn builtin(overrides: &EnvOverrides) -> Config {
    let owner = "nao-amj".to_string();
    Config {
        log_level: overrides.log_level.clone().unwrap_or_else(raw::default_log_level),
        wiki: WikiConfig {
            site_title: raw::default_site_title(),
            base_path: normalize_base_path(overrides.base_path.as_deref().unwrap_or("")),
            repo_owner: owner.clone(),
            repo_name: "starlight-issue-wiki-refactored".to_string(),
        },
        source: SourceConfig {
            provider: raw::default_provider(),
            owner,
            repo: "starlight-issue-wiki".to_string(),
            api_base_url: raw::default_api_base_url(),
            per_page: raw::default_per_page(),
            timeout_seconds: raw::default_timeout_seconds(),
            fixture_path: None,
        },
        cache: CacheConfig {
            ttl: Duration::from_secs(raw::default_ttl_seconds()),
            snapshot_path: Some(PathBuf::from(raw::default_snapshot_path())),
        },
        zettelkasten: ZettelkastenConfig::default(),
        github_token: overrides.github_token.clone(),
    }
}

/// `"/wiki-root/"` → `"/wiki-root"`, `"/"` → `""`.
fn normalize_base_path(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}
