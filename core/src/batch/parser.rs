/*
 * parser.rs
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

//! Envelope parsing: Content-Type, line reading, outer split, per-part parsing and transformation.
//! A structural error anywhere fails the whole envelope.

use bytes::Bytes;
use tracing::debug;

use super::body_part::{BodyPart, BodyPartParser};
use super::line::{read_lines, Charset};
use super::splitter::split_by_boundary;
use super::transformator::{to_request_part, to_response_part, Transformator};
use super::types::{BatchRequestPart, BatchResponsePart, MULTIPART_MIXED};
use crate::config::BatchConfig;
use crate::error::BatchError;
use crate::mime::{is_valid_boundary, parse_content_type};

/// Boundary and charset declared by an envelope `Content-Type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub boundary: String,
    pub charset: Charset,
}

/// Validate an envelope `Content-Type` (`multipart/mixed; boundary=...[; charset=...]`).
pub fn parse_envelope_content_type(content_type: &str) -> Result<Envelope, BatchError> {
    if content_type.trim().is_empty() {
        return Err(BatchError::MissingContentType);
    }
    let invalid = || BatchError::InvalidContentType {
        expected: MULTIPART_MIXED.to_string(),
        actual: content_type.to_string(),
    };
    let ct = parse_content_type(content_type).ok_or_else(invalid)?;
    if !ct.is_mime_type("multipart", "mixed") {
        return Err(invalid());
    }
    let boundary = ct
        .get_parameter("boundary")
        .ok_or_else(|| BatchError::MissingBoundaryParameter {
            content_type: content_type.to_string(),
        })?;
    if !is_valid_boundary(boundary) {
        return Err(BatchError::InvalidBoundary {
            boundary: boundary.to_string(),
        });
    }
    let charset = match ct.get_parameter("charset") {
        Some(label) => Charset::from_label(label).ok_or_else(|| BatchError::UnsupportedCharset {
            charset: label.to_string(),
        })?,
        None => Charset::default(),
    };
    Ok(Envelope {
        boundary: boundary.to_string(),
        charset,
    })
}

fn parse_envelope(
    body: &Bytes,
    content_type: &str,
    strict: bool,
    transformator: Transformator,
) -> Result<Vec<BodyPart>, BatchError> {
    let envelope = parse_envelope_content_type(content_type)?;
    let lines = read_lines(body, envelope.charset)?;
    let raw_parts = split_by_boundary(&lines, &envelope.boundary, 0)?;
    let parser = BodyPartParser::new(transformator, strict, &envelope.boundary);
    let parts = raw_parts
        .into_iter()
        .map(|part| parser.parse(part))
        .collect::<Result<Vec<_>, _>>()?;
    debug!(
        boundary = %envelope.boundary,
        lines = lines.len(),
        parts = parts.len(),
        ?transformator,
        "parsed batch envelope"
    );
    Ok(parts)
}

/// Parse a batch request body into its ordered parts. Nothing is executed.
pub fn parse_batch_request(
    body: impl Into<Bytes>,
    content_type: &str,
    config: &BatchConfig,
) -> Result<Vec<BatchRequestPart>, BatchError> {
    let body = body.into();
    let service_root = config.service_root().unwrap_or("");
    parse_envelope(&body, content_type, config.is_strict(), Transformator::Request)?
        .into_iter()
        .map(|part| to_request_part(part, service_root))
        .collect()
}

/// Parse a batch response body, as received by a client, into its ordered parts.
pub fn parse_batch_response(
    body: impl Into<Bytes>,
    content_type: &str,
    config: &BatchConfig,
) -> Result<Vec<BatchResponsePart>, BatchError> {
    let body = body.into();
    parse_envelope(&body, content_type, config.is_strict(), Transformator::Response)?
        .into_iter()
        .map(to_response_part)
        .collect()
}
