// src/config.rs

use std::{env, net::SocketAddr, path::PathBuf, str::FromStr};

use chrono::Duration;
use dotenvy::dotenv;

/// Time a team has to finish the quiz once it has started.
pub const DEFAULT_SESSION_DURATION_SECS: u64 = 5 * 60;

/// Longest quiz the server accepts. Larger values fall back to the default.
pub const MAX_SESSION_DURATION_SECS: u64 = 24 * 60 * 60;

/// How long an abandoned session is kept around after its timer ran out.
pub const DEFAULT_SESSION_RETENTION_SECS: u64 = 60 * 60;

pub const MAX_SESSION_RETENTION_SECS: u64 = 7 * 24 * 60 * 60;

/// Number of rows shown on the leaderboard when the client does not ask for a limit.
pub const DEFAULT_LEADERBOARD_SIZE: usize = 10;

/// Upper bound for `?limit=` on the leaderboard route. `0` is allowed and
/// returns an empty list.
pub const MAX_LEADERBOARD_SIZE: usize = 100;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub leaderboard_path: PathBuf,
    /// JSON question file. `None` uses the built-in weekly set.
    pub quiz_file: Option<PathBuf>,
    pub assets_dir: PathBuf,
    pub session_duration_secs: u64,
    pub session_retention_secs: u64,
    pub leaderboard_size: usize,
    pub log_dir: PathBuf,
    pub rust_log: String,
    /// Problems found while reading the environment. Logged by `main` once
    /// tracing is up.
    pub warnings: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            leaderboard_path: PathBuf::from("leaderboard.csv"),
            quiz_file: None,
            assets_dir: PathBuf::from("images"),
            session_duration_secs: DEFAULT_SESSION_DURATION_SECS,
            session_retention_secs: DEFAULT_SESSION_RETENTION_SECS,
            leaderboard_size: DEFAULT_LEADERBOARD_SIZE,
            log_dir: PathBuf::from("logs"),
            rust_log: "info".to_string(),
            warnings: Vec::new(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let defaults = Self::default();

        let leaderboard_path = env::var("LEADERBOARD_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.leaderboard_path);

        let quiz_file = env::var("QUIZ_FILE")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        let assets_dir = env::var("ASSETS_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.assets_dir);

        let log_dir = env::var("LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.log_dir);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let mut warnings = Vec::new();

        let bind_addr = parse_value(
            "BIND_ADDR",
            env::var("BIND_ADDR").ok().as_deref(),
            defaults.bind_addr,
            &mut warnings,
        );

        let session_duration_secs = parse_value(
            "SESSION_DURATION_SECS",
            env::var("SESSION_DURATION_SECS").ok().as_deref(),
            defaults.session_duration_secs,
            &mut warnings,
        );
        let session_duration_secs = bounded(
            "SESSION_DURATION_SECS",
            session_duration_secs,
            1..=MAX_SESSION_DURATION_SECS,
            defaults.session_duration_secs,
            &mut warnings,
        );

        let session_retention_secs = parse_value(
            "SESSION_RETENTION_SECS",
            env::var("SESSION_RETENTION_SECS").ok().as_deref(),
            defaults.session_retention_secs,
            &mut warnings,
        );
        let session_retention_secs = bounded(
            "SESSION_RETENTION_SECS",
            session_retention_secs,
            0..=MAX_SESSION_RETENTION_SECS,
            defaults.session_retention_secs,
            &mut warnings,
        );

        let leaderboard_size = parse_value(
            "LEADERBOARD_SIZE",
            env::var("LEADERBOARD_SIZE").ok().as_deref(),
            defaults.leaderboard_size,
            &mut warnings,
        )
        .clamp(1, MAX_LEADERBOARD_SIZE);

        Self {
            bind_addr,
            leaderboard_path,
            quiz_file,
            assets_dir,
            session_duration_secs,
            session_retention_secs,
            leaderboard_size,
            log_dir,
            rust_log,
            warnings,
        }
    }

    /// Quiz length as a duration. Out-of-range values use the default.
    pub fn session_duration(&self) -> Duration {
        seconds_or_default(
            self.session_duration_secs,
            1..=MAX_SESSION_DURATION_SECS,
            DEFAULT_SESSION_DURATION_SECS,
        )
    }

    /// Retention of expired sessions. Out-of-range values use the default.
    pub fn session_retention(&self) -> Duration {
        seconds_or_default(
            self.session_retention_secs,
            0..=MAX_SESSION_RETENTION_SECS,
            DEFAULT_SESSION_RETENTION_SECS,
        )
    }
}

/// Parses a raw environment value, keeping `default` when it is unset or
/// unparsable.
fn parse_value<T: FromStr>(
    key: &str,
    raw: Option<&str>,
    default: T,
    warnings: &mut Vec<String>,
) -> T {
    let Some(raw) = raw else {
        return default;
    };
    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            warnings.push(format!("Ignoring invalid value for {}: {:?}", key, raw));
            default
        }
    }
}

fn bounded(
    key: &str,
    value: u64,
    range: std::ops::RangeInclusive<u64>,
    default: u64,
    warnings: &mut Vec<String>,
) -> u64 {
    if range.contains(&value) {
        value
    } else {
        warnings.push(format!(
            "{} = {} is outside {}..={}, using {}",
            key,
            value,
            range.start(),
            range.end(),
            default
        ));
        default
    }
}

fn seconds_or_default(secs: u64, range: std::ops::RangeInclusive<u64>, default: u64) -> Duration {
    let secs = if range.contains(&secs) { secs } else { default };
    // Both bounds are far below i64::MAX seconds.
    Duration::seconds(secs as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value_falls_back_on_garbage() {
        let mut warnings = Vec::new();

        assert_eq!(parse_value("N", Some("not-a-number"), 42u64, &mut warnings), 42);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("N"));

        assert_eq!(parse_value("N", Some(" 7 "), 42u64, &mut warnings), 7);
        assert_eq!(parse_value("N", None, 42u64, &mut warnings), 42);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_bounded_rejects_out_of_range() {
        let mut warnings = Vec::new();

        assert_eq!(bounded("D", 0, 1..=10, 5, &mut warnings), 5);
        assert_eq!(bounded("D", u64::MAX, 1..=10, 5, &mut warnings), 5);
        assert_eq!(bounded("D", 10, 1..=10, 5, &mut warnings), 10);
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn test_huge_durations_do_not_panic() {
        let config = Config {
            session_duration_secs: u64::MAX / 2,
            session_retention_secs: u64::MAX,
            ..Config::default()
        };

        assert_eq!(config.session_duration(), Duration::minutes(5));
        assert_eq!(config.session_retention(), Duration::hours(1));
    }

    #[test]
    fn test_default_matches_weekly_quiz() {
        let config = Config::default();
        assert_eq!(config.session_duration(), Duration::minutes(5));
        assert_eq!(config.leaderboard_size, 10);
        assert!(config.quiz_file.is_none());
        assert!(config.warnings.is_empty());
    }
}
