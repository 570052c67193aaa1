use thiserror::Error;

/// Top-level error type for startup and data loading.
///
/// Nothing in the per-message pipeline returns this: lookups that find
/// nothing and external services that are down are ordinary outcomes there.
/// These variants cover what can go wrong before the first message arrives.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PartdeskError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Training corpus error: {0}")]
    Corpus(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for PartdeskError {
    fn from(err: toml::de::Error) -> Self {
        PartdeskError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for PartdeskError {
    fn from(err: toml::ser::Error) -> Self {
        PartdeskError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for PartdeskError {
    fn from(err: serde_json::Error) -> Self {
        PartdeskError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for parts-desk operations.
pub type Result<T> = std::result::Result<T, PartdeskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PartdeskError::Config("missing field".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing field");
    }

    #[test]
    fn test_error_display_all_variants() {
        let cases: Vec<(PartdeskError, &str)> = vec![
            (
                PartdeskError::Config("bad key".to_string()),
                "Configuration error: bad key",
            ),
            (
                PartdeskError::Catalog("duplicate part".to_string()),
                "Catalog error: duplicate part",
            ),
            (
                PartdeskError::Corpus("empty input".to_string()),
                "Training corpus error: empty input",
            ),
            (
                PartdeskError::Serialization("invalid json".to_string()),
                "Serialization error: invalid json",
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: PartdeskError = io_err.into();
        assert!(matches!(err, PartdeskError::Io(_)));
        assert!(err.to_string().starts_with("I/O error:"));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_from_toml_de() {
        let err: std::result::Result<toml::Value, _> = toml::from_str("invalid = [[[");
        let err: PartdeskError = err.unwrap_err().into();
        assert!(matches!(err, PartdeskError::Config(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let err: std::result::Result<serde_json::Value, _> = serde_json::from_str("{ nope }");
        let err: PartdeskError = err.unwrap_err().into();
        assert!(matches!(err, PartdeskError::Serialization(_)));
    }

    #[test]
    fn test_result_type_with_question_mark() {
        fn inner() -> Result<String> {
            let io_result: std::result::Result<i32, std::io::Error> = Ok(42);
            let value = io_result?;
            Ok(value.to_string())
        }

        assert_eq!(inner().unwrap(), "42");
    }
}
