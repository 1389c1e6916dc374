use bandwissel_weather::{LocationError, WeatherError};

/// Advice chain errors
#[derive(Debug, thiserror::Error)]
pub enum AdviceError {
    #[error("Location unavailable: {0}")]
    Location(#[from] LocationError),

    #[error("Forecast failed: {0}")]
    Forecast(#[from] WeatherError),

    #[error("Request superseded by a newer one")]
    Cancelled,

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl AdviceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Location(e) => e.user_message(),
            Self::Forecast(e) => e.user_message(),
            Self::Cancelled => "Het verzoek is vervangen door een nieuwer verzoek.",
            Self::Config(_) => "De configuratie is ongeldig. Controleer het configuratiebestand.",
        }
    }

    /// The request was replaced by a newer one rather than failing
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages_delegate() {
        let err: AdviceError = LocationError::PermissionDenied.into();
        assert!(err.user_message().contains("geweigerd"));

        let err: AdviceError = WeatherError::Malformed("bad".into()).into();
        assert!(err.user_message().contains("onverwacht"));
    }

    #[test]
    fn test_cancelled() {
        assert!(AdviceError::Cancelled.is_cancelled());
        assert!(!AdviceError::Config("x".into()).is_cancelled());
    }
}
