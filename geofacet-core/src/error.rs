use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while constructing an engine.
///
/// Evaluation itself never fails: bad filter values fail closed and unknown
/// fields are ignored, so only loading and validation produce errors.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Validation failed (configuration):\n{}", .0.join("\n"))]
    InvalidConfig(Vec<String>),

    #[error("Validation failed (dataset):\n{}", .0.join("\n"))]
    InvalidDataset(Vec<String>),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Individual problems collected during validation, or the single
    /// underlying message for I/O and parse errors.
    pub fn details(&self) -> Vec<String> {
        match self {
            Error::InvalidConfig(errors) | Error::InvalidDataset(errors) => errors.clone(),
            other => vec![other.to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_details() {
        let error = Error::InvalidDataset(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(error.details(), vec!["a", "b"]);
        assert!(error.to_string().starts_with("Validation failed (dataset):\na"));

        let error = Error::Io {
            path: PathBuf::from("items.json"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(error.details().len(), 1);
        assert!(error.details()[0].contains("items.json"));
    }
}
