use std::path::Path;

use crate::error::Error;

/// File name looked up in the working directory.
pub const CONFIG_FILE: &str = ".paraprint.toml";

/// Project configuration loaded from `.paraprint.toml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Narrow `review` output to selected paragraphs.
    pub filter_to_selection: bool,
    /// Fetch comment threads during `review`.
    pub include_comments: bool,
    /// Forward telemetry events to the log.
    pub telemetry: bool,
}

/// Raw TOML structure for `.paraprint.toml`.
#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct ParaprintTomlConfig {
    /// See [`Config::filter_to_selection`].
    filter_to_selection: Option<bool>,
    /// See [`Config::include_comments`].
    include_comments: Option<bool>,
    /// See [`Config::telemetry`].
    telemetry: Option<bool>,
}

impl Config {
    /// Load config from `.paraprint.toml` in the given root directory.
    /// Returns the defaults if the file doesn't exist, and an error if the
    /// file exists but is malformed.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// or `Error::TomlDe` if the TOML is malformed.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(CONFIG_FILE);
        let content = match std::fs::read_to_string(&path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(Error::Io(e)),
            Ok(c) => c,
        };

        return Self::parse(&content);
    }

    /// Parse config content, filling unset keys with defaults.
    ///
    /// # Errors
    ///
    /// Returns `Error::TomlDe` if the TOML is malformed or has unknown keys.
    pub fn parse(content: &str) -> Result<Self, Error> {
        let raw: ParaprintTomlConfig = toml::from_str(content)?;
        let defaults = Self::default();
        return Ok(Self {
            filter_to_selection: raw.filter_to_selection.unwrap_or(defaults.filter_to_selection),
            include_comments: raw.include_comments.unwrap_or(defaults.include_comments),
            telemetry: raw.telemetry.unwrap_or(defaults.telemetry),
        });
    }
}

impl Default for Config {
    fn default() -> Self {
        return Self {
            filter_to_selection: true,
            include_comments: true,
            telemetry: true,
        };
    }
}
