use std::env;
use std::path::PathBuf;

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::file_utils::FileManager;
use crate::language_utils;

/// Application configuration module
/// This module holds the per-run configuration for both pipelines,
/// credential resolution, and validation.
/// Video file extensions considered by the subtitle pipeline
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "mkv", "avi", "mov", "flv", "wmv", "mpeg", "mpg", "m4v",
];

/// Metadata file extensions considered by the translation pipeline
pub const METADATA_EXTENSIONS: &[&str] = &["nfo", "xml"];

/// User-Agent sent to the subtitle service
pub const USER_AGENT: &str = concat!("subnfo v", env!("CARGO_PKG_VERSION"));

/// Environment variables holding OpenSubtitles credentials. These take
/// precedence over positional CLI arguments.
pub const ENV_USERNAME: &str = "OPENSUBTITLES_USERNAME";
pub const ENV_PASSWORD: &str = "OPENSUBTITLES_PASSWORD";
pub const ENV_API_KEY: &str = "OPENSUBTITLES_API_KEY";

/// Configuration for one pipeline run
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RunConfig {
    /// Root directory to walk
    pub root: PathBuf,

    /// Target language code (ISO 639)
    pub language: String,
}

impl RunConfig {
    pub fn new(root: PathBuf, language: String) -> Self {
        RunConfig { root, language }
    }

    /// Validate the configuration before running
    pub fn validate(&self) -> Result<()> {
        if !FileManager::dir_exists(&self.root) {
            return Err(anyhow!(
                "The provided path is not a valid directory: {}",
                self.root.display()
            ));
        }

        language_utils::validate_language_code(&self.language)?;

        Ok(())
    }
}

/// OpenSubtitles credentials, fully resolved
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub api_key: String,
}

impl Credentials {
    /// Resolve credentials with environment-variable precedence over the
    /// positional arguments. All three values are required.
    pub fn resolve(
        username_arg: Option<String>,
        password_arg: Option<String>,
        api_key_arg: Option<String>,
    ) -> Result<Self> {
        Self::resolve_with(
            |name| env::var(name).ok(),
            username_arg,
            password_arg,
            api_key_arg,
        )
    }

    /// Resolve against an explicit environment lookup, mainly for tests
    pub fn resolve_with<F>(
        env_lookup: F,
        username_arg: Option<String>,
        password_arg: Option<String>,
        api_key_arg: Option<String>,
    ) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let username = env_lookup(ENV_USERNAME).or(username_arg);
        let password = env_lookup(ENV_PASSWORD).or(password_arg);
        let api_key = env_lookup(ENV_API_KEY).or(api_key_arg);

        match (username, password, api_key) {
            (Some(username), Some(password), Some(api_key)) => Ok(Credentials {
                username,
                password,
                api_key,
            }),
            _ => Err(anyhow!(
                "OpenSubtitles credentials are required. Set {}, {} and {} \
                 or pass them as arguments.",
                ENV_USERNAME,
                ENV_PASSWORD,
                ENV_API_KEY
            )),
        }
    }
}
