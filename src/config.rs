use std::collections::HashMap;
use std::path::Path;

use anyhow::{anyhow, Result};
use config::Config;

use crate::database::layout::StorageLayout;

pub struct RootlineConfig {
    /// Path to the directory holding the registry and tree files
    pub data_dir: String,
}

const EMPTY_CONFIG: &str = r#"### rootline configuration file

### directory holding the registry database and the trees/ subdirectory
# data_dir = "~/.rootline"
"#;

impl Default for RootlineConfig {
    fn default() -> Self {
        let home_dir = dirs::home_dir()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|| ".".to_string());

        Self {
            data_dir: format!("{home_dir}/.rootline"),
        }
    }
}

impl RootlineConfig {
    /// Create and initialize a new configuration
    ///
    /// Reads the TOML file at `path` when given, otherwise
    /// `$HOME/.rootline/rootline.toml`, writing a commented template when
    /// the file does not exist yet. `ROOTLINE_`-prefixed environment
    /// variables override file values, e.g. `ROOTLINE_DATA_DIR=/tmp/rl`.
    pub fn new(path: &Option<String>) -> Result<RootlineConfig> {
        let mut builder = Config::builder();

        let home_dir = dirs::home_dir()
            .ok_or_else(|| anyhow!("Could not find home directory"))?
            .to_str()
            .ok_or_else(|| anyhow!("Could not convert home directory path to string"))?
            .to_owned();

        let rootline_dir = format!("{home_dir}/.rootline");

        match path {
            Some(p) => {
                let path = Path::new(p.as_str());
                if path.exists() {
                    let path_str = path
                        .to_str()
                        .ok_or_else(|| anyhow!("Could not convert path to string"))?;
                    builder = builder.add_source(config::File::with_name(path_str));
                } else {
                    std::fs::write(p.as_str(), EMPTY_CONFIG)
                        .map_err(|e| anyhow!("Unable to create config file: {}", e))?;
                }
            }
            None => {
                std::fs::create_dir_all(rootline_dir.as_str())
                    .map_err(|e| anyhow!("Unable to create rootline directory: {}", e))?;
                let p = format!("{rootline_dir}/rootline.toml");
                if Path::new(p.as_str()).exists() {
                    builder = builder.add_source(config::File::with_name(p.as_str()));
                } else {
                    std::fs::write(p.as_str(), EMPTY_CONFIG).map_err(|e| {
                        anyhow!("Unable to create config file {}: {}", p.as_str(), e)
                    })?;
                }
            }
        }

        builder = builder.add_source(config::Environment::with_prefix("ROOTLINE"));

        let settings = builder
            .build()
            .map_err(|e| anyhow!("Failed to build configuration: {}", e))?;

        let config = settings
            .try_deserialize::<HashMap<String, String>>()
            .map_err(|e| anyhow!("Failed to deserialize configuration: {}", e))?;

        let data_dir = match config.get("data_dir") {
            Some(p) => p
                .trim_end_matches('/')
                .to_string(),
            None => {
                std::fs::create_dir_all(rootline_dir.as_str())
                    .map_err(|e| anyhow!("Unable to create data directory: {}", e))?;
                rootline_dir
            }
        };

        Ok(RootlineConfig { data_dir })
    }

    /// The storage layout rooted at the configured data directory
    pub fn layout(&self) -> StorageLayout {
        StorageLayout::new(&self.data_dir)
    }

    /// Get the path to the registry database file
    pub fn registry_path(&self) -> String {
        self.layout().registry_path().to_string_lossy().to_string()
    }

    /// Get the path to the directory holding tree files
    pub fn trees_dir(&self) -> String {
        self.layout().trees_dir().to_string_lossy().to_string()
    }

    /// Get the config file path
    pub fn config_file_path() -> String {
        let home_dir = dirs::home_dir()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|| "~".to_string());
        format!("{home_dir}/.rootline/rootline.toml")
    }

    /// Display configuration summary
    pub fn summary(&self) -> String {
        let lines = vec![
            format!("Data Directory:  {}", self.data_dir),
            format!("Registry Path:   {}", self.registry_path()),
            format!("Trees Directory: {}", self.trees_dir()),
        ];
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RootlineConfig::default();
        assert!(config.data_dir.ends_with(".rootline"));
    }

    #[test]
    fn test_paths() {
        let config = RootlineConfig {
            data_dir: "/test/dir".to_string(),
        };

        assert_eq!(config.registry_path(), "/test/dir/registry.sqlite3");
        assert_eq!(config.trees_dir(), "/test/dir/trees");
    }

    #[test]
    fn test_summary_lists_paths() {
        let config = RootlineConfig {
            data_dir: "/test/dir".to_string(),
        };

        let summary = config.summary();
        assert!(summary.contains("/test/dir/registry.sqlite3"));
        assert!(summary.contains("/test/dir/trees"));
    }
}
