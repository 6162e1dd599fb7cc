use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error("Cannot expand '~': home directory not found")]
    NoHomeDir,
}

/// Configuration for logshelf
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub local: LocalConfig,

    #[serde(default)]
    pub export: ExportConfig,

    #[serde(default)]
    pub redaction: RedactionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalConfig {
    /// Directory holding one subdirectory per project. `~` is expanded.
    #[serde(default = "default_projects_root")]
    pub projects_root: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedactionConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log every match in clear text
    #[serde(default)]
    pub debug: bool,

    #[serde(default = "default_max_line_bytes")]
    pub max_line_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            local: LocalConfig::default(),
            export: ExportConfig::default(),
            redaction: RedactionConfig::default(),
        }
    }
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            projects_root: default_projects_root(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
        }
    }
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            debug: false,
            max_line_bytes: default_max_line_bytes(),
        }
    }
}

fn default_projects_root() -> String {
    "~/.claude/projects".to_string()
}

fn default_prefix() -> String {
    "claude-code/".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_line_bytes() -> usize {
    10 * 1024 * 1024
}

impl LocalConfig {
    /// Projects root with `~` expanded.
    pub fn projects_root(&self) -> Result<PathBuf> {
        expand_tilde(&self.projects_root)
    }
}

impl ExportConfig {
    /// The prefix with a trailing `/`, or empty.
    pub fn normalized_prefix(&self) -> String {
        normalize_prefix(&self.prefix)
    }
}

/// Forward slashes only, ending in `/` unless empty.
pub fn normalize_prefix(prefix: &str) -> String {
    let prefix = prefix.replace('\\', "/");
    if prefix.is_empty() || prefix.ends_with('/') {
        prefix
    } else {
        format!("{}/", prefix)
    }
}

/// Expand a leading `~` or `~/` to the home directory. `~user` is left alone.
pub fn expand_tilde(path: &str) -> Result<PathBuf> {
    let rest = match path.strip_prefix('~') {
        Some("") => "",
        Some(rest) if rest.starts_with('/') || rest.starts_with('\\') => &rest[1..],
        _ => return Ok(PathBuf::from(path)),
    };

    let dirs = directories::BaseDirs::new().ok_or(ConfigError::NoHomeDir)?;
    Ok(dirs.home_dir().join(rest))
}

impl Config {
    /// Load config from default location or create default if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load config from `path`, writing the defaults there if it is missing.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            Self::parse(&content)
        } else {
            let config = Config::default();
            config.save(path)?;
            Ok(config)
        }
    }

    /// Parse and validate TOML config text.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(write_err)
    }

    fn validate(&self) -> Result<()> {
        if self.redaction.max_line_bytes == 0 {
            return Err(ConfigError::Invalid(
                "redaction.max_line_bytes must be greater than 0".to_string(),
            ));
        }
        if self.local.projects_root.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "local.projects_root must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Get config file path
    pub fn config_path() -> PathBuf {
        if let Some(dirs) = directories::ProjectDirs::from("com", "logshelf", "logshelf") {
            dirs.config_dir().join("config.toml")
        } else {
            PathBuf::from("~/.logshelf/config.toml")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.local.projects_root, "~/.claude/projects");
        assert_eq!(config.export.prefix, "claude-code/");
        assert!(config.redaction.enabled);
        assert!(!config.redaction.debug);
        assert_eq!(config.redaction.max_line_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed = Config::parse(&toml_str).unwrap();
        assert_eq!(parsed.local.projects_root, config.local.projects_root);
        assert_eq!(parsed.redaction.max_line_bytes, config.redaction.max_line_bytes);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = Config::parse("[redaction]\ndebug = true\n").unwrap();
        assert!(config.redaction.debug);
        assert!(config.redaction.enabled);
        assert_eq!(config.export.prefix, "claude-code/");
        assert_eq!(config.local.projects_root, "~/.claude/projects");
    }

    #[test]
    fn test_empty_config() {
        let config = Config::parse("").unwrap();
        assert!(config.redaction.enabled);
    }

    #[test]
    fn test_rejects_zero_line_limit() {
        let err = Config::parse("[redaction]\nmax_line_bytes = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_bad_toml() {
        let err = Config::parse("[redaction\nenabled = yes").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_normalize_prefix() {
        assert_eq!(normalize_prefix(""), "");
        assert_eq!(normalize_prefix("logs"), "logs/");
        assert_eq!(normalize_prefix("logs/"), "logs/");
        assert_eq!(normalize_prefix("a\\b"), "a/b/");
    }

    #[test]
    fn test_expand_tilde() {
        assert_eq!(expand_tilde("/var/log").unwrap(), PathBuf::from("/var/log"));
        assert_eq!(expand_tilde("~other/x").unwrap(), PathBuf::from("~other/x"));

        if let Some(dirs) = directories::BaseDirs::new() {
            let home = dirs.home_dir().to_path_buf();
            assert_eq!(expand_tilde("~").unwrap(), home);
            assert_eq!(expand_tilde("~/.claude/projects").unwrap(), home.join(".claude/projects"));
        }
    }
}
