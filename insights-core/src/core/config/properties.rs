use std::env;
use std::fs::File;
use std::io::Read;

use derive_more::Display;
use log::{debug, trace, warn};
use serde::Deserialize;

use crate::core::config::{ConfigError, Result};

const DEFAULT_URL: fn() -> String = || "https://graph.facebook.com".to_string();
const DEFAULT_CONFIG_FILENAME: &str = "application";
const CONFIG_EXTENSIONS: [&str; 2] = ["yml", "yaml"];

/// The environment variable which overrides the configured access token.
pub const ACCESS_TOKEN_ENV: &str = "FACEBOOK_INSIGHTS_ACCESS_TOKEN";
/// The environment variable which overrides the configured api version.
pub const API_VERSION_ENV: &str = "FACEBOOK_INSIGHTS_API_VERSION";

#[derive(Debug, Clone, Deserialize, PartialEq)]
struct PropertiesWrapper {
    #[serde(default)]
    pub insights: InsightsProperties,
}

/// The static properties of the Graph API connection.
/// These are loaded once at startup and don't change for the lifetime of the process.
#[derive(Debug, Display, Clone, Deserialize, PartialEq)]
#[display("url: {}, api_version: {:?}", url, api_version)]
pub struct InsightsProperties {
    #[serde(default = "DEFAULT_URL")]
    url: String,
    #[serde(alias = "access-token")]
    #[serde(alias = "accessToken")]
    #[serde(default)]
    access_token: String,
    #[serde(alias = "api-version")]
    #[serde(alias = "apiVersion")]
    #[serde(default)]
    api_version: Option<String>,
}

impl InsightsProperties {
    /// Create new [InsightsProperties].
    /// * `url`          - The base url of the Graph API.
    /// * `access_token` - The access token to authenticate the requests with.
    /// * `api_version`  - The Graph API version to use, or [None] for the unversioned api.
    pub fn new<S: Into<String>>(url: S, access_token: S, api_version: Option<S>) -> Self {
        Self {
            url: url.into(),
            access_token: access_token.into(),
            api_version: api_version.map(|e| e.into()),
        }
    }

    /// Create new [InsightsProperties] which will look for the [DEFAULT_CONFIG_FILENAME] config file.
    /// It will parse the config file if found, else uses the defaults instead.
    /// The environment variables are applied on top of the loaded properties.
    pub fn new_auto() -> Self {
        Self::from_filename(DEFAULT_CONFIG_FILENAME).with_env()
    }

    pub fn from_filename(filename: &str) -> Self {
        debug!("Searching for config file with name \"{}\"", filename);
        let config_value = Self::find_existing_file(filename)
            .and_then(|mut e| {
                let mut data = String::new();
                match e.read_to_string(&mut data) {
                    Ok(_) => Some(data),
                    Err(err) => {
                        warn!("Unable to read the config file, {}", err);
                        None
                    }
                }
            })
            .unwrap_or_default();

        Self::from_str(config_value.as_str())
    }

    pub fn from_str(config_data_value: &str) -> Self {
        trace!("Parsing config data {}", config_data_value);
        let data: PropertiesWrapper = match serde_yaml::from_str::<Option<PropertiesWrapper>>(config_data_value) {
            Ok(properties) => properties.unwrap_or_default(),
            Err(err) => {
                warn!("Failed to parse config, {}, using defaults instead", err);
                PropertiesWrapper::default()
            }
        };

        debug!("Parsed config data {}", &data.insights);
        data.insights
    }

    /// Apply the [ACCESS_TOKEN_ENV] and [API_VERSION_ENV] environment variables.
    pub fn with_env(self) -> Self {
        self.with_env_lookup(|key| env::var(key).ok())
    }

    /// Apply the overrides returned by the given lookup for the [ACCESS_TOKEN_ENV] and [API_VERSION_ENV] keys.
    pub fn with_env_lookup<F: Fn(&str) -> Option<String>>(mut self, lookup: F) -> Self {
        if let Some(access_token) = lookup(ACCESS_TOKEN_ENV).filter(|e| !e.is_empty()) {
            trace!("Using access token from {}", ACCESS_TOKEN_ENV);
            self.access_token = access_token;
        }
        if let Some(api_version) = lookup(API_VERSION_ENV).filter(|e| !e.is_empty()) {
            trace!("Using api version {} from {}", api_version, API_VERSION_ENV);
            self.api_version = Some(api_version);
        }

        self
    }

    /// Verify that the properties can be used to connect with the Graph API.
    pub fn validate(&self) -> Result<()> {
        if self.access_token.trim().is_empty() {
            return Err(ConfigError::MissingAccessToken);
        }
        if let Some(version) = self.api_version.as_ref() {
            if !Self::is_valid_version(version) {
                return Err(ConfigError::InvalidValue(version.clone(), "api_version".to_string()));
            }
        }

        Ok(())
    }

    /// Retrieve the base url of the Graph API.
    pub fn url(&self) -> &String {
        &self.url
    }

    pub fn access_token(&self) -> &String {
        &self.access_token
    }

    /// Retrieve the Graph API version, such as `2.3` or `v2.3`.
    pub fn api_version(&self) -> Option<&String> {
        self.api_version.as_ref()
    }

    fn is_valid_version(version: &str) -> bool {
        let version = version.strip_prefix('v').unwrap_or(version);
        let mut parts = version.split('.');

        match (parts.next(), parts.next(), parts.next()) {
            (Some(major), Some(minor), None) => {
                !major.is_empty()
                    && !minor.is_empty()
                    && major.chars().all(|e| e.is_ascii_digit())
                    && minor.chars().all(|e| e.is_ascii_digit())
            }
            _ => false,
        }
    }

    fn find_existing_file(filename: &str) -> Option<File> {
        for extension in CONFIG_EXTENSIONS {
            let path = Self::config_file_path(filename, extension);
            match File::open(&path) {
                Ok(file) => {
                    debug!("Found config file {}", &path);
                    return Some(file);
                }
                Err(_) => trace!("Config file location {} doesn't exist", &path),
            }
        }

        None
    }

    fn config_file_path(filename: &str, extension: &str) -> String {
        let mut directory = env::current_dir().unwrap_or_default();
        directory.push(format!("{}.{}", filename, extension));

        directory.to_string_lossy().to_string()
    }
}

impl Default for InsightsProperties {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL(),
            access_token: String::new(),
            api_version: None,
        }
    }
}

impl Default for PropertiesWrapper {
    fn default() -> Self {
        Self {
            insights: InsightsProperties::default(),
        }
    }
}
