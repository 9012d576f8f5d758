use std::fmt;

use crate::model::DraftField;

/// Failure reported by an external collaborator (store, geocoder, uploads).
#[derive(Debug)]
pub struct ServiceError {
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as _)
    }
}

impl ServiceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Why the device position could not be used.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GeolocationError {
    Denied,
    Unavailable,
    Timeout,
    /// The platform has no geolocation capability at all.
    Unsupported,
}

impl fmt::Display for GeolocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            GeolocationError::Denied => "permission denied",
            GeolocationError::Unavailable => "position unavailable",
            GeolocationError::Timeout => "timed out",
            GeolocationError::Unsupported => "geolocation unsupported",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for GeolocationError {}

/// Submitting a draft that does not satisfy its required fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    Invalid(Vec<DraftField>),
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitError::Invalid(fields) => {
                f.write_str("missing required fields:")?;
                for field in fields {
                    write!(f, " {field}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for SubmitError {}

#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Parse(err) => write!(f, "config parse error: {err}"),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Parse(err) => Some(err),
            ConfigError::Invalid(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit_error_lists_fields() {
        let err = SubmitError::Invalid(vec![DraftField::Address, DraftField::Pictures]);
        assert_eq!(err.to_string(), "missing required fields: address pictures");
    }

    #[test]
    fn service_error_keeps_source() {
        let io = std::io::Error::other("disk full");
        let err = ServiceError::with_source("upload failed", io);
        assert_eq!(err.to_string(), "upload failed");
        assert!(std::error::Error::source(&err).is_some());
    }
}
