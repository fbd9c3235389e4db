//! Protocol errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Missing field: {0}")]
    MissingField(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_from_serde() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err = ProtocolError::from(err);
        assert!(err.to_string().contains("Malformed"));
    }

    #[test]
    fn test_missing_field() {
        let err = ProtocolError::MissingField("dataUrl");
        assert!(err.to_string().contains("dataUrl"));
    }
}
