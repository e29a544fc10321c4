use std::path::PathBuf;

use crate::{env_opt, env_or};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageConfig {
    pub upload_dir: PathBuf,
    /// Public URL prefix under which `upload_dir` is served.
    pub base_url: String,
    pub max_file_size: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("./storage/uploads"),
            base_url: "/uploads".to_string(),
            max_file_size: 5 * 1024 * 1024,
        }
    }
}

impl StorageConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            upload_dir: env_opt("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            base_url: env_opt("UPLOAD_BASE_URL").unwrap_or(defaults.base_url),
            max_file_size: env_or("UPLOAD_MAX_BYTES", defaults.max_file_size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StorageConfig::default();
        assert_eq!(config.max_file_size, 5_242_880);
        assert_eq!(config.base_url, "/uploads");
    }
}
