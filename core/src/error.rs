/*
 * error.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Fascicolo, an OData batch protocol library.
 *
 * Fascicolo is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Fascicolo is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Fascicolo.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Batch protocol and configuration errors.

use thiserror::Error;

/// Boxed failure raised by a dispatcher that could not produce any response.
pub type DispatchError = Box<dyn std::error::Error + Send + Sync>;

/// Errors from parsing, executing or writing a batch.
///
/// Structural variants carry the 1-based line number of the offending line in the
/// envelope and, where relevant, the exact text that failed to match.
#[derive(Debug, Error)]
pub enum BatchError {
    /// The envelope `Content-Type` is absent. The `Part` variants below report the
    /// same problems for the headers of a body part.
    #[error("missing content type")]
    MissingContentType,

    #[error("invalid content type '{actual}', expected '{expected}'")]
    InvalidContentType { expected: String, actual: String },

    #[error("content type '{content_type}' has no boundary parameter")]
    MissingBoundaryParameter { content_type: String },

    #[error("invalid boundary '{boundary}'")]
    InvalidBoundary { boundary: String },

    #[error("line {line}: part has no content type")]
    MissingPartContentType { line: usize },

    #[error("line {line}: invalid part content type '{actual}', expected '{expected}'")]
    InvalidPartContentType { expected: String, actual: String, line: usize },

    #[error("line {line}: changeset content type '{content_type}' has no boundary parameter")]
    MissingPartBoundaryParameter { content_type: String, line: usize },

    #[error("line {line}: invalid changeset boundary parameter '{boundary}'")]
    InvalidPartBoundary { boundary: String, line: usize },

    #[error("unsupported charset '{charset}'")]
    UnsupportedCharset { charset: String },

    #[error("line {line}: body is not valid in the declared charset")]
    InvalidBodyEncoding { line: usize },

    #[error("line {line}: missing boundary delimiter '--{boundary}'")]
    MissingBoundaryDelimiter { boundary: String, line: usize },

    #[error("line {line}: invalid boundary delimiter '{text}'")]
    InvalidBoundaryDelimiter { text: String, line: usize },

    #[error("line {line}: missing close delimiter '--{boundary}--'")]
    MissingCloseDelimiter { boundary: String, line: usize },

    #[error("line {line}: '{text}' does not match boundary '{expected}'")]
    BoundaryMismatch { expected: String, text: String, line: usize },

    #[error("line {line}: invalid changeset boundary '{boundary}'")]
    InvalidChangesetBoundary { boundary: String, line: usize },

    #[error("line {line}: invalid header '{text}'")]
    InvalidHeader { text: String, line: usize },

    #[error("line {line}: missing mandatory header '{name}'")]
    MissingHeader { name: String, line: usize },

    #[error("line {line}: expected blank line, found '{text}'")]
    MissingBlankLine { text: String, line: usize },

    #[error("line {line}: invalid request line '{text}'")]
    InvalidRequestLine { text: String, line: usize },

    #[error("line {line}: invalid status line '{text}'")]
    InvalidStatusLine { text: String, line: usize },

    #[error("line {line}: missing method in request line '{text}'")]
    MissingMethod { text: String, line: usize },

    #[error("line {line}: method {method} is not allowed inside a changeset")]
    InvalidChangesetMethod { method: String, line: usize },

    #[error("line {line}: method {method} is not allowed for a query operation")]
    InvalidQueryOperationMethod { method: String, line: usize },

    #[error("line {line}: request must not carry a body")]
    InvalidBodyForRequest { line: usize },

    #[error("line {line}: body truncated, Content-Length {declared} but {actual} bytes present")]
    TruncatedBody { declared: usize, actual: usize, line: usize },

    #[error("line {line}: unsupported absolute path '{uri}'")]
    UnsupportedAbsolutePath { uri: String, line: usize },

    #[error("line {line}: invalid request URI '{uri}'")]
    InvalidUri { uri: String, line: usize },

    #[error("line {line}: invalid Accept header '{value}'")]
    InvalidAcceptHeader { value: String, line: usize },

    #[error("line {line}: invalid Accept-Language header '{value}'")]
    InvalidAcceptLanguageHeader { value: String, line: usize },

    #[error("line {line}: invalid Content-Transfer-Encoding '{value}'")]
    InvalidContentTransferEncoding { value: String, line: usize },

    #[error("failed to generate boundary: {0}")]
    BoundaryGeneration(String),

    #[error("dispatch failed: {source}")]
    Dispatch {
        #[source]
        source: DispatchError,
    },
}

impl BatchError {
    /// HTTP status for the envelope when the batch fails as a whole.
    pub fn http_status(&self) -> u16 {
        match self {
            BatchError::BoundaryGeneration(_) | BatchError::Dispatch { .. } => 500,
            _ => 400,
        }
    }

    /// Line of the envelope the error refers to, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            BatchError::MissingPartContentType { line }
            | BatchError::InvalidPartContentType { line, .. }
            | BatchError::MissingPartBoundaryParameter { line, .. }
            | BatchError::InvalidPartBoundary { line, .. }
            | BatchError::InvalidBodyEncoding { line }
            | BatchError::MissingBoundaryDelimiter { line, .. }
            | BatchError::InvalidBoundaryDelimiter { line, .. }
            | BatchError::MissingCloseDelimiter { line, .. }
            | BatchError::BoundaryMismatch { line, .. }
            | BatchError::InvalidChangesetBoundary { line, .. }
            | BatchError::InvalidHeader { line, .. }
            | BatchError::MissingHeader { line, .. }
            | BatchError::MissingBlankLine { line, .. }
            | BatchError::InvalidRequestLine { line, .. }
            | BatchError::InvalidStatusLine { line, .. }
            | BatchError::MissingMethod { line, .. }
            | BatchError::InvalidChangesetMethod { line, .. }
            | BatchError::InvalidQueryOperationMethod { line, .. }
            | BatchError::InvalidBodyForRequest { line }
            | BatchError::TruncatedBody { line, .. }
            | BatchError::UnsupportedAbsolutePath { line, .. }
            | BatchError::InvalidUri { line, .. }
            | BatchError::InvalidAcceptHeader { line, .. }
            | BatchError::InvalidAcceptLanguageHeader { line, .. }
            | BatchError::InvalidContentTransferEncoding { line, .. } => Some(*line),
            _ => None,
        }
    }
}

/// Errors from loading or writing a [`BatchConfig`](crate::config::BatchConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("invalid value '{value}' for {name}")]
    InvalidValue { name: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_errors_are_bad_request() {
        let err = BatchError::MissingBlankLine {
            text: "GET Employees HTTP/1.1".to_string(),
            line: 7,
        };
        assert_eq!(err.http_status(), 400);
        assert_eq!(err.line(), Some(7));
        assert_eq!(
            err.to_string(),
            "line 7: expected blank line, found 'GET Employees HTTP/1.1'"
        );
    }

    #[test]
    fn envelope_content_type_has_no_line() {
        assert_eq!(BatchError::MissingContentType.line(), None);
        let err = BatchError::MissingPartContentType { line: 12 };
        assert_eq!(err.line(), Some(12));
        assert_eq!(err.to_string(), "line 12: part has no content type");
    }

    #[test]
    fn dispatch_failure_is_server_error() {
        let err = BatchError::Dispatch {
            source: "storage offline".into(),
        };
        assert_eq!(err.http_status(), 500);
        assert_eq!(err.line(), None);
    }
}
