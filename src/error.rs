//! Structured error types for the loandoc pipeline.
//!
//! Only two failure classes ever reach a caller: unreadable input and a page
//! that could not be encoded. Missing form data and broken image references
//! are recovered inside the pipeline and never surface here.

use thiserror::Error;

/// The unified error type returned by all public loandoc API functions.
#[derive(Debug, Error)]
pub enum LoandocError {
    /// JSON input failed to parse as a template, form or config record.
    #[error("Failed to parse input: {source}{}", hint_suffix(.hint))]
    Parse {
        #[source]
        source: serde_json::Error,
        hint: String,
    },
    /// The raster page could not be re-encoded for the container.
    #[error("Failed to generate document: {0}")]
    Encoding(String),
    /// A configuration value makes rendering impossible.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn hint_suffix(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for LoandocError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the expected schema. Check field names and types.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        LoandocError::Parse { source: e, hint }
    }
}

impl From<image::ImageError> for LoandocError {
    fn from(e: image::ImageError) -> Self {
        LoandocError::Encoding(e.to_string())
    }
}

/// Why an overlay image could not be resolved. Never fatal: the compositor
/// logs it and omits the layer.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("invalid data URI: {0}")]
    InvalidDataUri(String),
    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("unsupported reference scheme '{0}'")]
    Unsupported(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_carries_syntax_hint() {
        let err: LoandocError = serde_json::from_str::<serde_json::Value>("{\"a\": 1,}")
            .unwrap_err()
            .into();
        let msg = err.to_string();
        assert!(msg.starts_with("Failed to parse input"));
        assert!(msg.contains("trailing commas"), "got: {}", msg);
    }

    #[test]
    fn test_encoding_error_message() {
        let err = LoandocError::Encoding("zero-sized raster".to_string());
        assert_eq!(
            err.to_string(),
            "Failed to generate document: zero-sized raster"
        );
    }
}
