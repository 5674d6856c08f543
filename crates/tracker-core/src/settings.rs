use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::models::DEFAULT_TOP_LIMIT;

/// Default document size cap in megabytes.
pub const DEFAULT_MAX_FILE_MB: u64 = 256;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Monthly cost and usage dashboard for AI model usage exports
#[derive(Parser, Debug, Clone)]
#[command(
    name = "cost-tracker",
    about = "Monthly cost and usage dashboard for AI model usage exports",
    version
)]
pub struct Settings {
    /// JSON usage export to load (`-` reads stdin); defaults to the last file used
    pub file: Option<PathBuf>,

    /// Period to show first, as YYYY-MM (defaults to the most recent)
    #[arg(long)]
    pub period: Option<String>,

    /// Number of models shown in each ranking
    #[arg(long, default_value_t = DEFAULT_TOP_LIMIT as u32, value_parser = clap::value_parser!(u32).range(1..=50))]
    pub top: u32,

    /// Display theme
    #[arg(long, default_value = "auto", value_parser = ["light", "dark", "classic", "auto"])]
    pub theme: String,

    /// Print a plain-text report to stdout instead of starting the dashboard
    #[arg(long)]
    pub report: bool,

    /// Refuse documents larger than this many megabytes
    #[arg(long, default_value_t = DEFAULT_MAX_FILE_MB)]
    pub max_file_mb: u64,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

impl Settings {
    /// Document size cap in bytes.
    pub fn max_document_bytes(&self) -> usize {
        usize::try_from(self.max_file_mb.saturating_mul(1024 * 1024)).unwrap_or(usize::MAX)
    }

    pub fn top_limit(&self) -> usize {
        self.top as usize
    }

    /// `true` when the document is read from stdin.
    pub fn reads_stdin(&self) -> bool {
        self.file.as_deref() == Some(Path::new("-"))
    }
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.cost-tracker/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl LastUsedParams {
    /// Default path of the persisted config file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Config path rooted at `base_dir`.
    pub fn config_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(".cost-tracker").join("last_used.json")
    }

    /// Load persisted params from an explicit path.
    ///
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at `path` if it exists.
    pub fn clear_at(path: &Path) -> Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit CLI
    /// value was provided, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Same as [`Settings::load_with_last_used`] with explicit arguments and
    /// config path.
    pub fn load_with_last_used_impl(args: Vec<std::ffi::OsString>, config_path: &Path) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            if let Err(e) = LastUsedParams::clear_at(config_path) {
                tracing::warn!("Failed to clear {}: {}", config_path.display(), e);
            }
            return Self::apply_debug(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI always wins over persisted values.
        if !is_arg_explicitly_set(&matches, "theme") {
            if let Some(v) = last.theme {
                settings.theme = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "top") {
            if let Some(v) = last.top.filter(|t| (1..=50).contains(t)) {
                settings.top = v;
            }
        }
        if settings.file.is_none() {
            settings.file = last.file.filter(|p| p.exists());
        }

        settings = Self::apply_debug(settings);

        let params = LastUsedParams::from(&settings);
        if let Err(e) = params.save_to(config_path) {
            tracing::debug!("Could not persist last-used params: {}", e);
        }

        settings
    }

    fn apply_debug(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            theme: Some(s.theme.clone()),
            top: Some(s.top),
            // stdin uploads are never remembered
            file: s
                .file
                .clone()
                .filter(|_| !s.reads_stdin())
                .map(|p| std::fs::canonicalize(&p).unwrap_or(p)),
        }
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line.
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tmp_config_path(tmp: &TempDir) -> PathBuf {
        LastUsedParams::config_path_in(tmp.path())
    }

    #[test]
    fn test_last_used_params_save_load() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        let params = LastUsedParams {
            theme: Some("dark".to_string()),
            top: Some(5),
            file: Some(PathBuf::from("/data/costs.json")),
        };
        params.save_to(&path).expect("save");

        let loaded = LastUsedParams::load_from(&path);
        assert_eq!(loaded.theme, Some("dark".to_string()));
        assert_eq!(loaded.top, Some(5));
        assert_eq!(loaded.file, Some(PathBuf::from("/data/costs.json")));
    }

    #[test]
    fn test_last_used_params_default_when_missing_or_corrupt() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        assert!(LastUsedParams::load_from(&path).theme.is_none());

        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{not json").unwrap();
        let loaded = LastUsedParams::load_from(&path);
        assert!(loaded.theme.is_none());
        assert!(loaded.top.is_none());
    }

    #[test]
    fn test_settings_default_values() {
        let settings = Settings::parse_from(["cost-tracker"]);

        assert!(settings.file.is_none());
        assert!(settings.period.is_none());
        assert_eq!(settings.top, 10);
        assert_eq!(settings.theme, "auto");
        assert!(!settings.report);
        assert_eq!(settings.max_file_mb, DEFAULT_MAX_FILE_MB);
        assert_eq!(settings.log_level, "INFO");
        assert!(settings.log_file.is_none());
        assert!(!settings.debug);
        assert!(!settings.clear);
    }

    #[test]
    fn test_settings_cli_parsing() {
        let settings = Settings::parse_from([
            "cost-tracker",
            "costs.json",
            "--period",
            "2024-11",
            "--top",
            "5",
            "--report",
        ]);
        assert_eq!(settings.file, Some(PathBuf::from("costs.json")));
        assert_eq!(settings.period.as_deref(), Some("2024-11"));
        assert_eq!(settings.top_limit(), 5);
        assert!(settings.report);
    }

    #[test]
    fn test_settings_top_out_of_range_rejected() {
        let result = Settings::try_parse_from(["cost-tracker", "--top", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_max_document_bytes() {
        let settings = Settings::parse_from(["cost-tracker", "--max-file-mb", "2"]);
        assert_eq!(settings.max_document_bytes(), 2 * 1024 * 1024);
    }

    #[test]
    fn test_reads_stdin() {
        assert!(Settings::parse_from(["cost-tracker", "-"]).reads_stdin());
        assert!(!Settings::parse_from(["cost-tracker", "a.json"]).reads_stdin());
    }

    #[test]
    fn test_load_with_last_used_merges_persisted_values() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        let export = tmp.path().join("costs.json");
        std::fs::write(&export, "[]").unwrap();

        LastUsedParams {
            theme: Some("light".to_string()),
            top: Some(3),
            file: Some(export.clone()),
        }
        .save_to(&config_path)
        .expect("save");

        let settings = Settings::load_with_last_used_impl(vec!["cost-tracker".into()], &config_path);
        assert_eq!(settings.theme, "light");
        assert_eq!(settings.top, 3);
        assert_eq!(settings.file, Some(export));
    }

    #[test]
    fn test_load_with_last_used_cli_overrides_persisted() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        LastUsedParams {
            theme: Some("dark".to_string()),
            top: Some(3),
            file: None,
        }
        .save_to(&config_path)
        .expect("save");

        let settings = Settings::load_with_last_used_impl(
            vec![
                "cost-tracker".into(),
                "--theme".into(),
                "classic".into(),
                "--top".into(),
                "7".into(),
            ],
            &config_path,
        );
        assert_eq!(settings.theme, "classic");
        assert_eq!(settings.top, 7);
    }

    #[test]
    fn test_load_with_last_used_skips_vanished_file() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        LastUsedParams {
            file: Some(tmp.path().join("gone.json")),
            ..Default::default()
        }
        .save_to(&config_path)
        .expect("save");

        let settings = Settings::load_with_last_used_impl(vec!["cost-tracker".into()], &config_path);
        assert!(settings.file.is_none());
    }

    #[test]
    fn test_load_with_last_used_clear_removes_file() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        LastUsedParams {
            theme: Some("classic".to_string()),
            ..Default::default()
        }
        .save_to(&config_path)
        .expect("save");

        Settings::load_with_last_used_impl(
            vec!["cost-tracker".into(), "--clear".into()],
            &config_path,
        );
        assert!(!config_path.exists(), "file must be gone after --clear");
    }

    #[test]
    fn test_load_with_last_used_debug_overrides_log_level() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        let settings = Settings::load_with_last_used_impl(
            vec!["cost-tracker".into(), "--debug".into()],
            &config_path,
        );
        assert_eq!(settings.log_level, "DEBUG");
    }

    #[test]
    fn test_stdin_is_not_persisted() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        Settings::load_with_last_used_impl(vec!["cost-tracker".into(), "-".into()], &config_path);
        let loaded = LastUsedParams::load_from(&config_path);
        assert!(loaded.file.is_none());
        assert_eq!(loaded.top, Some(10));
    }
}
