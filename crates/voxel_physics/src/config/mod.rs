//! Settings files
//!
//! Settings types that derive serde get TOML and RON loading by implementing
//! [`Config`]. The file extension picks the format.

use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};

/// On-disk format of a settings file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `.toml`
    Toml,
    /// `.ron`
    Ron,
}

impl ConfigFormat {
    /// Format named by the extension of `path`
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("ron") => Ok(Self::Ron),
            _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// Settings that can be read from and written to disk
pub trait Config: Serialize + DeserializeOwned + Default {
    /// Read settings from `path`
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)?;
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let parsed = match format {
            ConfigFormat::Toml => toml::from_str(&text).map_err(|e| e.to_string()),
            ConfigFormat::Ron => ron::from_str(&text).map_err(|e| e.to_string()),
        };
        let config = parsed.map_err(|reason| ConfigError::Parse {
            path: path.to_path_buf(),
            reason,
        })?;
        log::info!("Loaded settings from {}", path.display());
        Ok(config)
    }

    /// Write settings to `path`, replacing any existing file
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let text = match ConfigFormat::from_path(path)? {
            ConfigFormat::Toml => toml::to_string_pretty(self).map_err(|e| e.to_string()),
            ConfigFormat::Ron => {
                ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default()).map_err(|e| e.to_string())
            }
        }
        .map_err(ConfigError::Serialize)?;

        std::fs::write(path, text).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Errors raised while loading or checking settings
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The file could not be read or written
    #[error("cannot access {}: {source}", path.display())]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying failure
        source: std::io::Error,
    },

    /// The file contents are not valid for the format
    #[error("cannot parse {}: {reason}", path.display())]
    Parse {
        /// File involved
        path: PathBuf,
        /// Parser message
        reason: String,
    },

    /// The settings could not be encoded
    #[error("cannot encode settings: {0}")]
    Serialize(String),

    /// The extension is neither `.toml` nor `.ron`
    #[error("unsupported settings format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    /// A value is out of its allowed range
    #[error("invalid value for {field}: {reason}")]
    Invalid {
        /// Dotted path of the offending field
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

impl ConfigError {
    /// Build a [`ConfigError::Invalid`] for `field`
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_follows_extension() {
        assert_eq!(ConfigFormat::from_path(Path::new("a/physics.toml")).ok(), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_path(Path::new("physics.ron")).ok(), Some(ConfigFormat::Ron));
        assert!(matches!(
            ConfigFormat::from_path(Path::new("physics")),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_missing_file_names_path() {
        #[derive(serde::Serialize, serde::Deserialize, Default)]
        struct Empty {}
        impl Config for Empty {}

        let err = Empty::load_from_file("/nonexistent/voxel_physics.toml")
            .err()
            .expect("no such file");
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("voxel_physics.toml"));
    }
}
