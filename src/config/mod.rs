//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory
//! (or the path given with `-f`), then applies `ISSUE_WIKI_LOG_LEVEL`,
//! `ISSUE_WIKI_BASE_PATH` and `GITHUB_TOKEN` from the environment.
//!
//! # Module layout
//!
//! - **types**: resolved structs (`Config`, `SourceConfig`,
//!   `ZettelkastenConfig`, …).
//! - **raw**: serde mirror of the TOML file; kept private.
//! - **load**: `[meta] base` chains, overrides, `expand_home`.

mod load;
mod raw;
mod types;

pub use load::{EnvOverrides, expand_home, load, load_from};
pub use types::*;

impl Config {
    /// Offline config for tests and demos: fixture source, no snapshot.
    pub fn offline(fixture_path: Option<std::path::PathBuf>) -> Self {
        Self {
            log_level: "info".into(),
            wiki: WikiConfig {
                site_title: "test wiki".into(),
                base_path: "/wiki-test".into(),
                repo_owner: "owner".into(),
                repo_name: "repo".into(),
            },
            source: SourceConfig {
                provider: "fixture".into(),
                owner: "owner".into(),
                repo: "repo".into(),
                api_base_url: "http://127.0.0.1:0".into(),
                per_page: 100,
                timeout_seconds: 1,
                fixture_path,
            },
            cache: CacheConfig {
                ttl: std::time::Duration::from_secs(300),
                snapshot_path: None,
            },
            zettelkasten: ZettelkastenConfig::default(),
            github_token: None,
        }
    }
}
