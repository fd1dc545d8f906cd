//! Console configuration.
//!
//! Loaded from `atenea.json` next to the data snapshot. Every field has a
//! default, so a missing file yields a fully working local configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConsoleError, Result};
use crate::lesson::is_valid_url;

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "atenea.json";

/// Configuration for one console session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConsoleConfig {
    /// Endpoint that mints live session credentials.
    pub credential_endpoint: String,

    /// Application id handed to the video service alongside the room and
    /// credential.
    pub video_app_id: String,

    /// Asset path template for course cover images; `{course}` is
    /// replaced with the course id.
    pub cover_path_template: String,

    /// Path of the JSON snapshot backing the document store.
    pub data_file: PathBuf,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            credential_endpoint: default_credential_endpoint(),
            video_app_id: default_video_app_id(),
            cover_path_template: default_cover_path_template(),
            data_file: default_data_file(),
        }
    }
}

fn default_credential_endpoint() -> String {
    "http://localhost:3000/api/session-credential".to_string()
}

fn default_video_app_id() -> String {
    "atenea-dev".to_string()
}

fn default_cover_path_template() -> String {
    "courses/{course}/cover.jpg".to_string()
}

fn default_data_file() -> PathBuf {
    PathBuf::from("atenea-data.json")
}

impl ConsoleConfig {
    /// Loads configuration from a file, falling back to defaults when the
    /// file does not exist.
    ///
    /// # Errors
    ///
    /// `Config` when the file exists but cannot be read, parsed, or
    /// validated.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ConsoleError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|e| {
            ConsoleError::config(format!("cannot parse {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `atenea.json` from a directory, defaults when absent.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Self::load_from_file(&dir.join(CONFIG_FILE_NAME))
    }

    /// Checks the configuration for values the console cannot work with.
    ///
    /// # Errors
    ///
    /// `Config` naming the first rejected field.
    pub fn validate(&self) -> Result<()> {
        if !is_valid_url(&self.credential_endpoint) {
            return Err(ConsoleError::config(format!(
                "credentialEndpoint '{}' is not a valid URL",
                self.credential_endpoint
            )));
        }
        if !self.cover_path_template.contains("{course}") {
            return Err(ConsoleError::config(format!(
                "coverPathTemplate '{}' must contain '{{course}}'",
                self.cover_path_template
            )));
        }
        if self.video_app_id.trim().is_empty() {
            return Err(ConsoleError::config("videoAppId must not be empty"));
        }
        Ok(())
    }

    /// The asset path for a course's cover image.
    #[must_use]
    pub fn cover_path(&self, course_id: &str) -> String {
        self.cover_path_template.replace("{course}", course_id)
    }
}
