//! Diagnostics setup via tracing-subscriber.
//!
//! The CLI prints its results as JSON on stdout, so every log line goes to
//! stderr. Call [`init`] once, after [`resolve_level`] has picked the level.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::error::AppError;

/// Map repeated `-v` flags to a level.
///
/// `-v` → warn, `-vv` → info, `-vvv` → debug, more → trace. Zero flags
/// defers to the environment and the config file.
pub fn level_for_verbosity(verbosity: u8) -> Option<&'static str> {
    match verbosity {
        0 => None,
        1 => Some("warn"),
        2 => Some("info"),
        3 => Some("debug"),
        _ => Some("trace"),
    }
}

/// Pick the effective level: CLI flags > already-overridden config level.
///
/// Returns the level plus whether it was forced on the command line, in
/// which case it also beats `RUST_LOG`.
pub fn resolve_level<'a>(cli_level: Option<&'a str>, config_level: &'a str) -> (&'a str, bool) {
    match cli_level {
        Some(level) => (level, true),
        None => (config_level, false),
    }
}

/// Install the global subscriber.
///
/// When `forced` is set the given level wins and `RUST_LOG` is only a
/// fallback for an unparsable level; otherwise `RUST_LOG` wins when present.
pub fn init(level: &str, forced: bool) -> Result<(), AppError> {
    let from_level = || EnvFilter::try_new(level);
    let filter = if forced {
        from_level().or_else(|level_err| {
            EnvFilter::try_from_default_env().map_err(|env_err| {
                AppError::Logger(format!(
                    "invalid log level '{level}': {level_err}; RUST_LOG parse failed: {env_err}"
                ))
            })
        })?
    } else {
        EnvFilter::try_from_default_env()
            .or_else(|_| from_level())
            .map_err(|e| AppError::Logger(format!("invalid log level '{level}': {e}")))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| AppError::Logger(format!("failed to set subscriber: {e}")))
}

/// Validate a configured level before it reaches [`init`].
pub fn parse_level(level: &str) -> Result<LevelFilter, AppError> {
    if level.trim().is_empty() {
        return Err(AppError::Logger("log level must not be empty".into()));
    }
    level
        .parse::<LevelFilter>()
        .map_err(|_| AppError::Logger(format!("unrecognised log level: '{level}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_tiers() {
        assert_eq!(level_for_verbosity(0), None);
        assert_eq!(level_for_verbosity(1), Some("warn"));
        assert_eq!(level_for_verbosity(3), Some("debug"));
        assert_eq!(level_for_verbosity(9), Some("trace"));
    }

    #[test]
    fn cli_level_is_forced() {
        assert_eq!(resolve_level(Some("debug"), "info"), ("debug", true));
        assert_eq!(resolve_level(None, "info"), ("info", false));
    }

    #[test]
    fn configured_levels_validate() {
        for l in ["error", "warn", "info", "debug", "trace"] {
            assert!(parse_level(l).is_ok(), "expected '{l}' to be valid");
        }
        assert!(parse_level("verbose").is_err());
        assert!(parse_level("  ").is_err());
    }

    #[test]
    fn init_twice_reports_subscriber_error() {
        // The first call may or may not win depending on test ordering.
        let _ = init("warn", false);
        match init("warn", false) {
            Err(AppError::Logger(msg)) => assert!(msg.contains("set subscriber")),
            other => panic!("expected logger error, got {other:?}"),
        }
    }
}
