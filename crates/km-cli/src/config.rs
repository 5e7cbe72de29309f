//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use km_core::ActivityType;
use serde::{Deserialize, Serialize};

/// Madrid, Puerta del Sol.
const DEFAULT_ORIGIN: (f64, f64) = (40.4168, -3.7038);

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,
    /// Activity used when a command does not name one.
    pub default_activity: ActivityType,
    /// Where simulated sessions start.
    pub origin_latitude: f64,
    pub origin_longitude: f64,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("kmtrack.db"),
            default_activity: ActivityType::Driving,
            origin_latitude: DEFAULT_ORIGIN.0,
            origin_longitude: DEFAULT_ORIGIN.1,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // KMTRACK_DATABASE_PATH, KMTRACK_DEFAULT_ACTIVITY, ...
        figment = figment.merge(Env::prefixed("KMTRACK_"));

        figment.extract()
    }
}

/// Returns the platform-specific config directory for kmtrack.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("kmtrack"))
}

/// Returns the platform-specific data directory for kmtrack.
///
/// On Linux: `~/.local/share/kmtrack`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("kmtrack"))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_dirs_data_path_ends_with_kmtrack() {
        let path = dirs_data_path().unwrap();
        assert_eq!(path.file_name().unwrap(), "kmtrack");
    }

    #[test]
    fn test_default_config_uses_data_dir_for_db() {
        let config = Config::default();
        let data_dir = dirs_data_path().unwrap();
        assert_eq!(config.database_path, data_dir.join("kmtrack.db"));
        assert_eq!(config.default_activity, ActivityType::Driving);
    }

    #[test]
    fn test_explicit_config_file_overrides_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("custom.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "database_path = \"/tmp/trips.db\"\ndefault_activity = \"cycling\"\norigin_latitude = 51.5"
        )
        .unwrap();

        let config = Config::load_from(Some(&path)).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/trips.db"));
        assert_eq!(config.default_activity, ActivityType::Cycling);
        assert!((config.origin_latitude - 51.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unknown_activity_is_rejected() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("bad.toml");
        std::fs::write(&path, "default_activity = \"flying\"\n").unwrap();

        assert!(Config::load_from(Some(&path)).is_err());
    }
}
