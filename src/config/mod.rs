use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
pub struct ConfigFile {
    #[serde(alias = "url")]
    pub backend_url: Option<String>,
    pub update_minute: Option<u32>,
    #[serde(alias = "first_day")]
    pub first_eligible_day: Option<u32>,
    pub updates_enabled: Option<bool>,
    pub storage_path: Option<String>,
    pub views: Option<Vec<String>>,
    pub sort: Option<Vec<String>>,
    pub output: Option<String>,
    pub output_format: Option<String>,
    pub timeout: Option<u64>,
    pub proxy: Option<String>,
    pub authorization: Option<String>,
    pub no_color: Option<bool>,
    pub workers: Option<usize>,
}

fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("USERPROFILE").map(PathBuf::from))
        .or_else(|| {
            let drive = env::var_os("HOMEDRIVE")?;
            let path = env::var_os("HOMEPATH")?;
            Some(PathBuf::from(drive).join(path))
        })
}

fn app_dir() -> Option<PathBuf> {
    Some(home_dir()?.join(".foldboard"))
}

pub fn default_config_path() -> Option<PathBuf> {
    Some(app_dir()?.join("config.yml"))
}

/// Durable key-value file used for the update counter.
pub fn default_storage_path() -> PathBuf {
    app_dir()
        .map(|dir| dir.join("storage.json"))
        .unwrap_or_else(|| PathBuf::from("foldboard-storage.json"))
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        if let Some(home) = home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

pub fn expand_tilde_string(path: &str) -> String {
    expand_tilde(path).to_string_lossy().to_string()
}

pub fn load_config(path: &Path, allow_missing: bool) -> Result<ConfigFile, String> {
    match std::fs::read_to_string(path) {
        Ok(contents) if contents.trim().is_empty() => Ok(ConfigFile::default()),
        Ok(contents) => serde_yaml::from_str::<ConfigFile>(&contents)
            .map_err(|e| format!("failed to parse config '{}': {e}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && allow_missing => {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(ConfigFile::default())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(format!("config file not found '{}'", path.display()))
        }
        Err(e) => Err(format!("failed to read config '{}': {e}", path.display())),
    }
}

pub fn default_config_yaml() -> String {
    r#"# foldboard config
#
# Location (default):
#   ~/.foldboard/config.yml
#
# Command-line flags override anything set here.

# Stats backend
backend_url: http://localhost:8080
timeout: 10
# proxy: http://127.0.0.1:8080
# authorization: "Basic dXNlcjpwYXNz"

# Panels to load, in display order
views:
  - leaderboard
  - competition
  - users
  - teams
  - hardware

# Header clicks applied after loading, as TABLE:COLUMN (0-based column)
# sort:
#   - leaderboard:2

# Update schedule (UTC)
updates_enabled: true
update_minute: 55
first_eligible_day: 3
# storage_path: ~/.foldboard/storage.json

# Output (optional)
# output: ./board.html
# output_format: html

# Runtime
workers: 4
no_color: false
"#
    .to_string()
}

pub fn ensure_default_config_file(path: &Path) -> Result<bool, String> {
    if path.exists() {
        return Ok(false);
    }
    let parent = path
        .parent()
        .ok_or_else(|| format!("invalid config path '{}'", path.display()))?;
    std::fs::create_dir_all(parent).map_err(|e| {
        format!(
            "failed to create config directory '{}': {e}",
            parent.display()
        )
    })?;
    std::fs::write(path, default_config_yaml())
        .map_err(|e| format!("failed to write config file '{}': {e}", path.display()))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_yaml_parses() {
        let cfg: ConfigFile = serde_yaml::from_str(&default_config_yaml()).unwrap();
        assert_eq!(cfg.update_minute, Some(55));
        assert_eq!(cfg.first_eligible_day, Some(3));
        assert_eq!(cfg.views.as_ref().map(Vec::len), Some(5));
        assert_eq!(cfg.updates_enabled, Some(true));
    }

    #[test]
    fn missing_file_allowed_only_when_requested() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yml");
        assert_eq!(load_config(&path, true).unwrap(), ConfigFile::default());
        assert!(load_config(&path, false)
            .unwrap_err()
            .starts_with("config file not found"));
    }

    #[test]
    fn ensure_default_writes_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yml");
        assert!(ensure_default_config_file(&path).unwrap());
        std::fs::write(&path, "update_minute: 10\n").unwrap();
        assert!(!ensure_default_config_file(&path).unwrap());
        assert_eq!(load_config(&path, false).unwrap().update_minute, Some(10));
    }

    #[test]
    fn aliases_are_accepted() {
        let cfg: ConfigFile =
            serde_yaml::from_str("url: http://stats.example\nfirst_day: 5\n").unwrap();
        assert_eq!(cfg.backend_url.as_deref(), Some("http://stats.example"));
        assert_eq!(cfg.first_eligible_day, Some(5));
    }
}
