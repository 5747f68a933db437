use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Tunables of one replayer instance. Every field is optional in TOML.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReplayConfig {
    /// Stage insertions under detached fragments while catching up.
    pub use_virtual_parent: bool,
    /// How long a full capture may wait for unloaded stylesheets.
    pub stylesheet_timeout_ms: f64,
    /// Subtracted from the focus offset of replayed text selections.
    pub selection_focus_adjust: i64,
    /// Keep the scheduler ticking in live mode even with an empty buffer.
    pub live_mode_tick_forever: bool,
    /// Upper bound on resolver passes per batch.
    pub max_resolve_passes: usize,
    /// Log mutations that reference unknown node ids at warn level.
    pub warn_missing_nodes: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            use_virtual_parent: true,
            stylesheet_timeout_ms: 10_000.0,
            selection_focus_adjust: 0,
            live_mode_tick_forever: true,
            max_resolve_passes: 1_000,
            warn_missing_nodes: true,
        }
    }
}

impl ReplayConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_input_yields_defaults() {
        assert_eq!(ReplayConfig::from_toml_str("").unwrap(), ReplayConfig::default());
    }

    #[test]
    fn partial_override() {
        let config = ReplayConfig::from_toml_str(
            "selection_focus_adjust = 1\nuse_virtual_parent = false\n",
        )
        .unwrap();
        assert_eq!(config.selection_focus_adjust, 1);
        assert!(!config.use_virtual_parent);
        assert_eq!(config.stylesheet_timeout_ms, 10_000.0);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = ReplayConfig::from_toml_str("speed = 2").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "stylesheet_timeout_ms = 250.0").unwrap();
        let config = ReplayConfig::load(file.path()).unwrap();
        assert_eq!(config.stylesheet_timeout_ms, 250.0);

        let missing = file.path().with_extension("missing");
        assert!(matches!(
            ReplayConfig::load(&missing),
            Err(ConfigError::Io { .. })
        ));
    }
}
