use std::fmt::{Display, Formatter};

/// The specialized configuration result.
pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(PartialEq, Debug, Clone)]
pub enum ConfigError {
    InvalidValue(String, String),
    MissingAccessToken,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue(value, field) => write!(f, "invalid value {} given for {}", value, field),
            ConfigError::MissingAccessToken => write!(f, "no access token has been configured"),
        }
    }
}

impl std::error::Error for ConfigError {}
