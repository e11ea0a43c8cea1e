use crate::error::Result;
use crate::readers::resolve_paths;
use crate::utils::constants::*;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use validator::{Validate, ValidationError};

/// Pipeline settings.
///
/// Sources, later ones overriding earlier: built-in defaults, a TOML file
/// (`airq.toml` when present, or an explicit path), then `AIRQ_*`
/// environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Settings {
    /// Directory relative snapshot and cache paths are resolved against
    pub base_dir: PathBuf,

    #[validate(length(min = 1, message = "at least one snapshot file is required"))]
    pub snapshot_files: Vec<PathBuf>,

    pub cache_enabled: bool,

    pub cache_file: PathBuf,

    #[validate(custom(function = "validate_compression"))]
    pub compression: String,

    #[validate(range(min = 1))]
    pub row_group_size: usize,

    pub use_mmap: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            snapshot_files: DEFAULT_SNAPSHOT_FILES.iter().map(PathBuf::from).collect(),
            cache_enabled: true,
            cache_file: PathBuf::from(DEFAULT_CACHE_FILE),
            compression: COMPRESSION_SNAPPY.to_string(),
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
            use_mmap: false,
        }
    }
}

impl Settings {
    /// Load from defaults, the optional settings file and the environment.
    ///
    /// An explicit `config_file` must exist; the default one is optional.
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let defaults = Settings::default();

        let file = match config_file {
            Some(path) => File::from(path).format(FileFormat::Toml).required(true),
            None => File::new(DEFAULT_CONFIG_FILE, FileFormat::Toml).required(false),
        };

        let settings: Settings = Config::builder()
            .set_default("base_dir", defaults.base_dir.display().to_string())?
            .set_default(
                "snapshot_files",
                DEFAULT_SNAPSHOT_FILES
                    .iter()
                    .map(|f| f.to_string())
                    .collect::<Vec<_>>(),
            )?
            .set_default("cache_enabled", defaults.cache_enabled)?
            .set_default("cache_file", defaults.cache_file.display().to_string())?
            .set_default("compression", defaults.compression)?
            .set_default("row_group_size", defaults.row_group_size as u64)?
            .set_default("use_mmap", defaults.use_mmap)?
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("snapshot_files"),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        debug!(?settings, "settings loaded");
        Ok(settings)
    }

    pub fn snapshot_paths(&self) -> Vec<PathBuf> {
        resolve_paths(&self.base_dir, &self.snapshot_files)
    }

    pub fn cache_path(&self) -> PathBuf {
        if self.cache_file.is_absolute() {
            self.cache_file.clone()
        } else {
            self.base_dir.join(&self.cache_file)
        }
    }
}

fn validate_compression(compression: &str) -> std::result::Result<(), ValidationError> {
    if COMPRESSIONS.contains(&compression.to_lowercase().as_str()) {
        Ok(())
    } else {
        Err(ValidationError::new("unknown_compression"))
    }
}
