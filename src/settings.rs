//! Code for loading program settings.
use crate::input::read_toml;
use anyhow::Result;
use serde::Deserialize;
use std::path::Path;

/// The file name for the optional program settings
const SETTINGS_FILE_NAME: &str = "settings.toml";

/// Program settings read from a model directory's `settings.toml`
#[derive(Debug, Default, Deserialize, PartialEq)]
pub struct Settings {
    /// The program log level (see [`crate::log::init`])
    pub log_level: Option<String>,
}

impl Settings {
    /// Read the settings file from the model directory.
    ///
    /// If the file is not present, default values are used.
    pub fn from_path(model_dir: &Path) -> Result<Settings> {
        let file_path = model_dir.join(SETTINGS_FILE_NAME);
        if !file_path.is_file() {
            return Ok(Settings::default());
        }

        read_toml(&file_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_from_path_missing_file() {
        let dir = TempDir::new().unwrap();
        assert_eq!(Settings::from_path(dir.path()).unwrap(), Settings::default());
    }

    #[test]
    fn test_from_path() {
        let dir = TempDir::new().unwrap();
        File::create(dir.path().join(SETTINGS_FILE_NAME))
            .unwrap()
            .write_all(b"log_level = \"debug\"\n")
            .unwrap();

        let settings = Settings::from_path(dir.path()).unwrap();
        assert_eq!(settings.log_level.as_deref(), Some("debug"));
    }
}
