//! Error types for the photo service binding.
//!
//! # Design
//! Every failure reaches the caller as a distinct variant so calling code can
//! branch on cause. `Remote` carries the service's own error code and message
//! from a failure envelope; `Mapping` means a finder expected exactly one
//! result node and found none. XML parse failures are passed through from
//! `roxmltree` unchanged.
//!
//! A missing optional attribute is never an error. Partially populated
//! objects are the normal state for summary responses.

use thiserror::Error;

/// Errors returned by the client, the finders and the URL resolver.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The response envelope reported `stat="fail"`.
    #[error("remote API error {code}: {message}")]
    Remote { code: String, message: String },

    /// A single-result finder matched no node at its result path.
    #[error("no node found at `{path}`")]
    Mapping { path: String },

    /// A resource URL did not match any known shape.
    #[error("cannot resolve resource URL `{0}`")]
    UnresolvableUrl(String),

    /// The response body is not well-formed XML.
    #[error(transparent)]
    Xml(#[from] roxmltree::Error),

    /// The transport returned a status other than 200.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The transport failed before producing a response.
    #[error("transport failed: {0}")]
    Transport(String),

    /// Reading a file for upload failed.
    #[error("cannot read upload: {0}")]
    Io(#[from] std::io::Error),

    /// A required parameter is missing or cannot be encoded.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A mapped attribute holds a value that cannot be converted.
    #[error("attribute `{attribute}` has unexpected value `{value}`")]
    InvalidValue { attribute: String, value: String },

    /// Client configuration could not be loaded.
    #[error("invalid configuration: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_error_displays_code_and_message() {
        let err = ApiError::Remote {
            code: "1".to_string(),
            message: "Photo not found".to_string(),
        };
        assert_eq!(err.to_string(), "remote API error 1: Photo not found");
    }

    #[test]
    fn xml_errors_convert_transparently() {
        let parse_err = roxmltree::Document::parse("<rsp>").unwrap_err();
        let expected = parse_err.to_string();
        let err: ApiError = parse_err.into();
        assert!(matches!(err, ApiError::Xml(_)));
        assert_eq!(err.to_string(), expected);
    }
}
