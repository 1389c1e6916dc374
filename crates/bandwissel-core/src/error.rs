//! Configuration error types.
//!
//! User-facing messages are in Dutch, matching the rest of the advice output.

use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory could not be determined")]
    NoConfigDir,

    #[error("Failed to read configuration file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write configuration file {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration parse error: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Configuration serialize error: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Returns a message suitable for showing to the user.
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::NoConfigDir => "Kon de configuratiemap niet vinden.",
            ConfigError::Read { .. } => "Kon het configuratiebestand niet lezen.",
            ConfigError::Write { .. } => "Kon het configuratiebestand niet opslaan.",
            ConfigError::ParseError(_) => {
                "Het configuratiebestand is ongeldig. Controleer de instellingen."
            }
            ConfigError::SerializeError(_) => "Kon de configuratie niet opslaan.",
            ConfigError::Invalid(_) => "Ongeldige configuratie. Controleer de instellingen.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages_are_non_empty() {
        let errors = [
            ConfigError::NoConfigDir,
            ConfigError::Invalid("analysis.threshold_celsius".into()),
            ConfigError::Read {
                path: "config.toml".into(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
            },
        ];

        for err in &errors {
            assert!(!err.user_message().is_empty());
        }
    }

    #[test]
    fn test_parse_error_conversion() {
        let parse_err = toml::from_str::<toml::Value>("= broken").unwrap_err();
        let err: ConfigError = parse_err.into();
        assert!(matches!(err, ConfigError::ParseError(_)));
        assert!(err.to_string().starts_with("Configuration parse error"));
    }
}
