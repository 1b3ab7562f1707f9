//! Soak run configuration, read from a json5 file.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use thiserror::Error;

const DEFAULT_CONFIG: &str = include_str!("../../package-content/lumen_config.json5");

/// Where the config is looked for when no path is given on the command line.
pub const DEFAULT_CONFIG_PATH: &str = "lumen_config.json5";

/// Most sections a world may span.
pub const MAX_WORLD_SECTIONS: i32 = 64;

/// Errors from loading a [`LumenConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read or the default could not be written.
    #[error("config file {path}: {source}")]
    Io {
        /// The file involved.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },
    /// The file is not valid json5 for this config.
    #[error("config file {path} is malformed: {source}")]
    Parse {
        /// The file involved.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: serde_json5::Error,
    },
    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

/// Settings of a soak run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LumenConfig {
    /// Seed for world generation and edits.
    pub seed: u64,
    /// Chunks loaded in every direction around chunk (0, 0).
    pub chunk_radius: i32,
    /// Lowest section of the world.
    pub min_section: i32,
    /// Highest section of the world.
    pub max_section: i32,
    /// Number of update batches.
    pub ticks: u32,
    /// Block edits per batch.
    pub edits_per_tick: u32,
    /// Only light-correct chunks may be used by the engine.
    pub authoritative: bool,
    /// Compare the final light against a from-scratch relight.
    pub verify: bool,
    /// Sample published light from a second thread.
    pub reader_thread: bool,
    /// Default `tracing` filter, `RUST_LOG` wins when set.
    pub log_filter: String,
}

impl LumenConfig {
    /// Reads the config at `path`, or writes the bundled default there and returns it
    /// if the file does not exist yet.
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        let io_error = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        if path.exists() {
            let config_str = fs::read_to_string(path).map_err(io_error)?;
            let config = Self::parse(&config_str).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
            config.validate()?;
            Ok(config)
        } else {
            if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(io_error)?;
            }
            fs::write(path, DEFAULT_CONFIG).map_err(io_error)?;
            Ok(Self::default())
        }
    }

    fn parse(config_str: &str) -> Result<Self, serde_json5::Error> {
        serde_json5::from_str(config_str)
    }

    /// Checks that every value is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=16).contains(&self.chunk_radius) {
            return Err(ConfigError::Invalid("chunk_radius must be in range 1..=16"));
        }
        if self.min_section > self.max_section {
            return Err(ConfigError::Invalid(
                "min_section must not be above max_section",
            ));
        }
        if self.max_section - self.min_section + 1 > MAX_WORLD_SECTIONS {
            return Err(ConfigError::Invalid("the world may span at most 64 sections"));
        }
        if self.edits_per_tick == 0 {
            return Err(ConfigError::Invalid("edits_per_tick must be at least 1"));
        }
        if self.ticks == 0 && self.verify {
            return Err(ConfigError::Invalid("verify needs at least one tick"));
        }
        Ok(())
    }

    /// Lowest block y of the world.
    #[must_use]
    pub fn min_y(&self) -> i32 {
        self.min_section * 16
    }

    /// Highest block y of the world.
    #[must_use]
    pub fn max_y(&self) -> i32 {
        self.max_section * 16 + 15
    }
}

impl Default for LumenConfig {
    fn default() -> Self {
        Self {
            seed: 12345,
            chunk_radius: 3,
            min_section: -2,
            max_section: 3,
            ticks: 200,
            edits_per_tick: 16,
            authoritative: false,
            verify: true,
            reader_thread: true,
            log_filter: "info,lumen_core=info".to_string(),
        }
    }
}
