/*
 * writer.rs
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

//! Serialise batch parts into a `multipart/mixed` body: responses on the serving side
//! (the response assembler), requests on the client side.

use bytes::{BufMut, Bytes, BytesMut};

use super::boundary::{generate_boundary, BATCH_PREFIX, CHANGESET_PREFIX};
use super::types::{
    BatchRequestPart, BatchResponsePart, RequestDescriptor, ResponseDescriptor, APPLICATION_HTTP,
    BINARY, CONTENT_LENGTH, CONTENT_TRANSFER_ENCODING, CONTENT_TYPE, MULTIPART_MIXED,
};
use crate::error::BatchError;
use crate::mime::HeaderMap;

const CRLF: &[u8] = b"\r\n";

/// The complete HTTP answer to a `$batch` request.
#[derive(Debug, Clone)]
pub struct BatchResponse {
    status: u16,
    content_type: String,
    body: Bytes,
}

impl BatchResponse {
    /// Envelope-level failure: the batch was not executed.
    pub fn error(err: &BatchError) -> Self {
        Self {
            status: err.http_status(),
            content_type: "text/plain; charset=utf-8".to_string(),
            body: Bytes::from(err.to_string()),
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn into_body(self) -> Bytes {
        self.body
    }
}

/// A serialised batch request ready to send.
#[derive(Debug, Clone)]
pub struct BatchRequestBody {
    content_type: String,
    body: Bytes,
}

impl BatchRequestBody {
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }
}

fn multipart_content_type(boundary: &str) -> String {
    format!("{}; boundary={}", MULTIPART_MIXED, boundary)
}

fn append_header(out: &mut BytesMut, name: &str, value: &str) {
    out.put_slice(name.as_bytes());
    out.put_slice(b": ");
    out.put_slice(value.as_bytes());
    out.put_slice(CRLF);
}

fn append_delimiter(out: &mut BytesMut, boundary: &str) {
    out.put_slice(b"--");
    out.put_slice(boundary.as_bytes());
    out.put_slice(CRLF);
}

fn append_close_delimiter(out: &mut BytesMut, boundary: &str) {
    out.put_slice(b"--");
    out.put_slice(boundary.as_bytes());
    out.put_slice(b"--");
    out.put_slice(CRLF);
}

fn append_http_part_headers(out: &mut BytesMut, mime_headers: &HeaderMap) {
    append_header(out, CONTENT_TYPE, APPLICATION_HTTP);
    append_header(out, CONTENT_TRANSFER_ENCODING, BINARY);
    for (name, value) in mime_headers.iter() {
        let reserved = name.eq_ignore_ascii_case(CONTENT_TYPE)
            || name.eq_ignore_ascii_case(CONTENT_TRANSFER_ENCODING);
        if !reserved {
            append_header(out, name, value);
        }
    }
    out.put_slice(CRLF);
}

/// Message headers, a Content-Length matching the body, blank line, body, and the
/// line break that precedes the next delimiter.
fn append_message_tail(out: &mut BytesMut, headers: &HeaderMap, body: &Bytes) {
    for (name, value) in headers.iter() {
        if !name.eq_ignore_ascii_case(CONTENT_LENGTH) {
            append_header(out, name, value);
        }
    }
    if !body.is_empty() {
        append_header(out, CONTENT_LENGTH, &body.len().to_string());
    }
    out.put_slice(CRLF);
    out.put_slice(body);
    out.put_slice(CRLF);
}

fn append_response(out: &mut BytesMut, response: &ResponseDescriptor) {
    append_http_part_headers(out, response.mime_headers());
    let status_line = format!(
        "{} {} {}",
        response.version(),
        response.status(),
        response.reason_phrase()
    );
    out.put_slice(status_line.as_bytes());
    out.put_slice(CRLF);
    append_message_tail(out, response.headers(), response.body());
}

fn append_request(out: &mut BytesMut, request: &RequestDescriptor) {
    append_http_part_headers(out, request.mime_headers());
    let request_line = format!(
        "{} {} {}",
        request.method(),
        request.path_info().relative_uri(),
        request.version()
    );
    out.put_slice(request_line.as_bytes());
    out.put_slice(CRLF);
    append_message_tail(out, request.headers(), request.body());
}

/// Write each item of a changeset inside its own nested `multipart/mixed` part.
fn append_change_set<T>(
    out: &mut BytesMut,
    boundary: &str,
    items: &[T],
    append: fn(&mut BytesMut, &T),
) -> Result<(), BatchError> {
    let inner = generate_boundary(CHANGESET_PREFIX)?;
    append_delimiter(out, boundary);
    append_header(out, CONTENT_TYPE, &multipart_content_type(&inner));
    out.put_slice(CRLF);
    for item in items {
        append_delimiter(out, &inner);
        append(out, item);
    }
    append_close_delimiter(out, &inner);
    Ok(())
}

/// Assemble the batch response. The envelope status is always 202; embedded statuses
/// carry the per-part outcomes.
pub fn write_batch_response(parts: &[BatchResponsePart]) -> Result<BatchResponse, BatchError> {
    let boundary = generate_boundary(BATCH_PREFIX)?;
    let mut out = BytesMut::new();
    for part in parts {
        match part {
            BatchResponsePart::Single(response) => {
                append_delimiter(&mut out, &boundary);
                append_response(&mut out, response);
            }
            BatchResponsePart::ChangeSet(responses) => {
                append_change_set(&mut out, &boundary, responses, append_response)?;
            }
        }
    }
    append_close_delimiter(&mut out, &boundary);
    Ok(BatchResponse {
        status: 202,
        content_type: multipart_content_type(&boundary),
        body: out.freeze(),
    })
}

/// Serialise request parts for sending to a batch endpoint.
pub fn write_batch_request(parts: &[BatchRequestPart]) -> Result<BatchRequestBody, BatchError> {
    let boundary = generate_boundary(BATCH_PREFIX)?;
    let mut out = BytesMut::new();
    for part in parts {
        match part {
            BatchRequestPart::Query(request) => {
                append_delimiter(&mut out, &boundary);
                append_request(&mut out, request);
            }
            BatchRequestPart::ChangeSet(requests) => {
                append_change_set(&mut out, &boundary, requests, append_request)?;
            }
        }
    }
    append_close_delimiter(&mut out, &boundary);
    Ok(BatchRequestBody {
        content_type: multipart_content_type(&boundary),
        body: out.freeze(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::types::CONTENT_ID;

    #[test]
    fn single_response_layout() {
        let response = ResponseDescriptor::new(200)
            .with_header(CONTENT_TYPE, "text/plain")
            .with_header(CONTENT_LENGTH, "999")
            .with_mime_header(CONTENT_ID, "m1")
            .with_body("Walter Winter");
        let written = write_batch_response(&[BatchResponsePart::Single(response)]).unwrap();
        assert_eq!(written.status(), 202);
        let boundary = written
            .content_type()
            .strip_prefix("multipart/mixed; boundary=")
            .unwrap()
            .to_string();
        let expected = format!(
            "--{b}\r\n\
             Content-Type: application/http\r\n\
             Content-Transfer-Encoding: binary\r\n\
             Content-Id: m1\r\n\r\n\
             HTTP/1.1 200 OK\r\n\
             Content-Type: text/plain\r\n\
             Content-Length: 13\r\n\r\n\
             Walter Winter\r\n\
             --{b}--\r\n",
            b = boundary
        );
        assert_eq!(written.body(), expected.as_bytes());
    }

    #[test]
    fn error_response() {
        let err = BatchError::MissingContentType;
        let response = BatchResponse::error(&err);
        assert_eq!(response.status(), 400);
        assert_eq!(response.body(), "missing content type".as_bytes());
    }
}
