/*
 * body_part.rs
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

//! Body part parser: part headers, changeset recognition, embedded request/response message.

use bytes::Bytes;
use tracing::trace;

use super::accept::{is_valid_accept, is_valid_accept_language};
use super::line::{join_body, Line};
use super::splitter::{split_by_boundary, RawPart};
use super::start_line::{parse_request_line, parse_status_line, RequestLine, StatusLine};
use super::transformator::Transformator;
use super::types::{
    Method, ACCEPT, ACCEPT_LANGUAGE, APPLICATION_HTTP, BINARY, CONTENT_LENGTH,
    CONTENT_TRANSFER_ENCODING, CONTENT_TYPE, MULTIPART_MIXED,
};
use crate::error::BatchError;
use crate::mime::{
    boundaries_collide, has_mime_type, is_token, is_valid_boundary, parse_content_type, HeaderMap,
};

/// Nesting level of a part: the envelope, or a member of a changeset. No deeper level exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    Envelope,
    ChangeSet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartKind {
    QueryRequest,
    ChangeRequest,
    ChangeSet,
    Response,
}

#[derive(Debug, Clone)]
pub enum StartLine {
    Request(RequestLine),
    Status(StatusLine),
}

/// The HTTP-like message wrapped by an `application/http` part.
#[derive(Debug, Clone)]
pub struct EmbeddedMessage {
    pub start: StartLine,
    /// Line number of the start line.
    pub line: usize,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[derive(Debug, Clone)]
pub enum PartContent {
    Message(EmbeddedMessage),
    ChangeSet(Vec<BodyPart>),
}

#[derive(Debug, Clone)]
pub struct BodyPart {
    pub headers: HeaderMap,
    pub kind: PartKind,
    /// Line number of the opening delimiter.
    pub line: usize,
    pub content: PartContent,
}

struct HeaderBlock {
    headers: HeaderMap,
    numbers: Vec<(String, usize)>,
    /// Index of the first line after the block (after the blank line when terminated).
    end: usize,
    terminated: bool,
}

impl HeaderBlock {
    fn line_of(&self, name: &str) -> Option<usize> {
        self.numbers
            .iter()
            .rev()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, line)| *line)
    }
}

enum HeaderLine<'a> {
    Header(&'a str, &'a str),
    Malformed,
    NotAHeader,
}

fn classify_header(text: &str) -> HeaderLine<'_> {
    let colon = match text.find(':') {
        Some(c) => c,
        None => return HeaderLine::NotAHeader,
    };
    let name = &text[..colon];
    if name.trim_end().contains(char::is_whitespace) {
        HeaderLine::NotAHeader
    } else if !is_token(name) {
        HeaderLine::Malformed
    } else {
        HeaderLine::Header(name, text[colon + 1..].trim())
    }
}

/// Consume `Name: value` lines from `start` up to and including the first blank line.
///
/// A line that is not header-shaped where the blank line belongs is a missing blank line;
/// a header-shaped line with an invalid name is an invalid header.
fn parse_header_block(lines: &[Line], start: usize) -> Result<HeaderBlock, BatchError> {
    let mut headers = HeaderMap::new();
    let mut numbers = Vec::new();
    for (i, line) in lines.iter().enumerate().skip(start) {
        if line.is_blank() {
            return Ok(HeaderBlock {
                headers,
                numbers,
                end: i + 1,
                terminated: true,
            });
        }
        match classify_header(line.text()) {
            HeaderLine::Header(name, value) => {
                headers.insert(name, value);
                numbers.push((name.to_string(), line.number()));
            }
            HeaderLine::Malformed => {
                return Err(BatchError::InvalidHeader {
                    text: line.text().to_string(),
                    line: line.number(),
                })
            }
            HeaderLine::NotAHeader => {
                return Err(BatchError::MissingBlankLine {
                    text: line.text().to_string(),
                    line: line.number(),
                })
            }
        }
    }
    Ok(HeaderBlock {
        headers,
        numbers,
        end: lines.len(),
        terminated: false,
    })
}

pub struct BodyPartParser<'b> {
    transformator: Transformator,
    strict: bool,
    outer_boundary: &'b str,
}

impl<'b> BodyPartParser<'b> {
    pub fn new(transformator: Transformator, strict: bool, outer_boundary: &'b str) -> Self {
        Self {
            transformator,
            strict,
            outer_boundary,
        }
    }

    /// Parse one envelope-level part, descending into a changeset if it is one.
    pub fn parse(&self, part: RawPart<'_>) -> Result<BodyPart, BatchError> {
        self.parse_at(part, Depth::Envelope)
    }

    fn parse_at(&self, part: RawPart<'_>, depth: Depth) -> Result<BodyPart, BatchError> {
        let block = parse_header_block(part.lines, 0)?;
        if !block.terminated {
            return Err(BatchError::MissingBlankLine {
                text: part.lines.last().map(|l| l.text().to_string()).unwrap_or_default(),
                line: part.last_line(),
            });
        }
        let multipart = block
            .headers
            .get(CONTENT_TYPE)
            .filter(|v| has_mime_type(v, "multipart", "mixed"))
            .map(str::to_owned);
        if let Some(content_type) = multipart {
            if depth == Depth::ChangeSet {
                return Err(BatchError::InvalidPartContentType {
                    expected: APPLICATION_HTTP.to_string(),
                    actual: content_type,
                    line: block.line_of(CONTENT_TYPE).unwrap_or(part.delimiter_line),
                });
            }
            let members = self.parse_change_set(part, &block, &content_type)?;
            return Ok(BodyPart {
                headers: block.headers,
                kind: PartKind::ChangeSet,
                line: part.delimiter_line,
                content: PartContent::ChangeSet(members),
            });
        }

        self.validate_part_headers(&block, part.delimiter_line)?;
        let message = self.parse_message(part, block.end, depth)?;
        let kind = match (self.transformator, depth) {
            (Transformator::Response, _) => PartKind::Response,
            (Transformator::Request, Depth::Envelope) => PartKind::QueryRequest,
            (Transformator::Request, Depth::ChangeSet) => PartKind::ChangeRequest,
        };
        Ok(BodyPart {
            headers: block.headers,
            kind,
            line: part.delimiter_line,
            content: PartContent::Message(message),
        })
    }

    fn parse_change_set(
        &self,
        part: RawPart<'_>,
        block: &HeaderBlock,
        content_type: &str,
    ) -> Result<Vec<BodyPart>, BatchError> {
        let ct_line = block.line_of(CONTENT_TYPE).unwrap_or(part.delimiter_line);
        let parsed =
            parse_content_type(content_type).ok_or_else(|| BatchError::InvalidPartContentType {
                expected: MULTIPART_MIXED.to_string(),
                actual: content_type.to_string(),
                line: ct_line,
            })?;
        let boundary = parsed.get_parameter("boundary").ok_or_else(|| {
            BatchError::MissingPartBoundaryParameter {
                content_type: content_type.to_string(),
                line: ct_line,
            }
        })?;
        if !is_valid_boundary(boundary) {
            return Err(BatchError::InvalidPartBoundary {
                boundary: boundary.to_string(),
                line: ct_line,
            });
        }
        if boundaries_collide(self.outer_boundary, boundary) {
            return Err(BatchError::InvalidChangesetBoundary {
                boundary: boundary.to_string(),
                line: ct_line,
            });
        }

        let body = &part.lines[block.end..];
        let open = format!("--{}", boundary);
        if let Some(first) = body.iter().find(|l| !l.is_blank()) {
            let text = first.text().trim();
            if text.starts_with("--") && !text.starts_with(&open) {
                return Err(BatchError::BoundaryMismatch {
                    expected: boundary.to_string(),
                    text: first.text().to_string(),
                    line: first.number(),
                });
            }
        }
        let members = split_by_boundary(body, boundary, part.last_line())?;
        trace!(boundary, members = members.len(), line = part.delimiter_line, "changeset");
        members
            .into_iter()
            .map(|member| self.parse_at(member, Depth::ChangeSet))
            .collect()
    }

    /// A missing header is reported at the part's delimiter line, a bad one at its own line.
    fn validate_part_headers(
        &self,
        block: &HeaderBlock,
        delimiter_line: usize,
    ) -> Result<(), BatchError> {
        if !self.strict {
            return Ok(());
        }
        let line_of = |name: &str| block.line_of(name).unwrap_or(delimiter_line);
        match block.headers.get(CONTENT_TYPE) {
            None => {
                return Err(BatchError::MissingPartContentType {
                    line: delimiter_line,
                })
            }
            Some(v) if !has_mime_type(v, "application", "http") => {
                return Err(BatchError::InvalidPartContentType {
                    expected: APPLICATION_HTTP.to_string(),
                    actual: v.to_string(),
                    line: line_of(CONTENT_TYPE),
                })
            }
            Some(_) => {}
        }
        match block.headers.get(CONTENT_TRANSFER_ENCODING) {
            None => Err(BatchError::MissingHeader {
                name: CONTENT_TRANSFER_ENCODING.to_string(),
                line: delimiter_line,
            }),
            Some(v) if !v.trim().eq_ignore_ascii_case(BINARY) => {
                Err(BatchError::InvalidContentTransferEncoding {
                    value: v.to_string(),
                    line: line_of(CONTENT_TRANSFER_ENCODING),
                })
            }
            Some(_) => Ok(()),
        }
    }

    fn parse_message(
        &self,
        part: RawPart<'_>,
        from: usize,
        depth: Depth,
    ) -> Result<EmbeddedMessage, BatchError> {
        let lines = part.lines;
        let start_idx = match (from..lines.len()).find(|&i| !lines[i].is_blank()) {
            Some(i) => i,
            None => {
                let text = String::new();
                let line = part.last_line();
                return Err(match self.transformator {
                    Transformator::Request => BatchError::InvalidRequestLine { text, line },
                    Transformator::Response => BatchError::InvalidStatusLine { text, line },
                });
            }
        };
        let start_line = &lines[start_idx];
        let start = match self.transformator {
            Transformator::Request => {
                let request_line = parse_request_line(start_line)?;
                self.validate_method(&request_line, depth, start_line.number())?;
                StartLine::Request(request_line)
            }
            Transformator::Response => StartLine::Status(parse_status_line(start_line)?),
        };

        let block = parse_header_block(lines, start_idx + 1)?;
        if !block.terminated && self.strict {
            let last = &lines[lines.len() - 1];
            return Err(BatchError::MissingBlankLine {
                text: last.text().to_string(),
                line: last.number(),
            });
        }
        let body_lines = &lines[block.end..];
        let body_line = body_lines.first().map_or(part.last_line(), Line::number);
        let mut body = join_body(body_lines);

        if let Some(value) = block.headers.get(CONTENT_LENGTH) {
            let declared: usize = value.trim().parse().map_err(|_| BatchError::InvalidHeader {
                text: format!("{}: {}", CONTENT_LENGTH, value),
                line: block.line_of(CONTENT_LENGTH).unwrap_or(start_line.number()),
            })?;
            if declared < body.len() {
                body.truncate(declared);
            } else if declared > body.len() && self.strict {
                return Err(BatchError::TruncatedBody {
                    declared,
                    actual: body.len(),
                    line: body_line,
                });
            }
        }

        if let StartLine::Request(request_line) = &start {
            self.validate_request_headers(&block)?;
            let has_content = body.iter().any(|b| !b.is_ascii_whitespace());
            if self.strict && request_line.method == Method::Get && has_content {
                return Err(BatchError::InvalidBodyForRequest { line: body_line });
            }
        }

        Ok(EmbeddedMessage {
            start,
            line: start_line.number(),
            headers: block.headers,
            body,
        })
    }

    fn validate_method(
        &self,
        request_line: &RequestLine,
        depth: Depth,
        line: usize,
    ) -> Result<(), BatchError> {
        match depth {
            Depth::ChangeSet if !request_line.method.is_mutating() => {
                Err(BatchError::InvalidChangesetMethod {
                    method: request_line.method.to_string(),
                    line,
                })
            }
            Depth::Envelope if self.strict && request_line.method != Method::Get => {
                Err(BatchError::InvalidQueryOperationMethod {
                    method: request_line.method.to_string(),
                    line,
                })
            }
            _ => Ok(()),
        }
    }

    fn validate_request_headers(&self, block: &HeaderBlock) -> Result<(), BatchError> {
        if let Some(value) = block.headers.get(ACCEPT) {
            if !is_valid_accept(value) {
                return Err(BatchError::InvalidAcceptHeader {
                    value: value.to_string(),
                    line: block.line_of(ACCEPT).unwrap_or_default(),
                });
            }
        }
        if let Some(value) = block.headers.get(ACCEPT_LANGUAGE) {
            if !is_valid_accept_language(value) {
                return Err(BatchError::InvalidAcceptLanguageHeader {
                    value: value.to_string(),
                    line: block.line_of(ACCEPT_LANGUAGE).unwrap_or_default(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::line::{read_lines, Charset};

    const CRLF: &str = "\r\n";
    const HTTP_PART: [&str; 2] = [
        "Content-Type: application/http",
        "Content-Transfer-Encoding: binary",
    ];

    fn parse(
        body: &str,
        transformator: Transformator,
        strict: bool,
    ) -> Result<Vec<BodyPart>, BatchError> {
        let lines = read_lines(&Bytes::copy_from_slice(body.as_bytes()), Charset::Utf8)?;
        let parts = split_by_boundary(&lines, "batch_1", 0)?;
        let parser = BodyPartParser::new(transformator, strict, "batch_1");
        parts.into_iter().map(|p| parser.parse(p)).collect()
    }

    fn request(body: &str) -> Result<Vec<BodyPart>, BatchError> {
        parse(body, Transformator::Request, true)
    }

    fn crlf(lines: &[&str]) -> String {
        lines.iter().map(|l| format!("{}{}", l, CRLF)).collect()
    }

    /// One envelope part: part headers, blank line, message lines.
    fn single(headers: &[&str], message: &[&str]) -> String {
        let mut lines = vec!["--batch_1"];
        lines.extend_from_slice(headers);
        lines.push("");
        lines.extend_from_slice(message);
        lines.push("--batch_1--");
        crlf(&lines)
    }

    /// One envelope part holding a changeset `cs_1` with the given member lines.
    fn change_set(members: &[&str]) -> String {
        let mut lines = vec![
            "--batch_1",
            "Content-Type: multipart/mixed; boundary=cs_1",
            "",
        ];
        lines.extend_from_slice(members);
        lines.push("--cs_1--");
        lines.push("--batch_1--");
        crlf(&lines)
    }

    #[test]
    fn query_part() {
        let body = single(
            &HTTP_PART,
            &["GET Employees('1') HTTP/1.1", "Accept: application/json", ""],
        );
        let parts = request(&body).unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].kind, PartKind::QueryRequest);
        let PartContent::Message(message) = &parts[0].content else {
            panic!("expected message");
        };
        assert_eq!(message.line, 5);
        assert_eq!(message.headers.get("accept"), Some("application/json"));
        assert!(message.body.is_empty());
    }

    #[test]
    fn missing_blank_line_after_part_headers() {
        let body = crlf(&[
            "--batch_1",
            "Content-Type: application/http",
            "Content-Transfer-Encoding: binary",
            "GET Employees HTTP/1.1",
            "",
            "--batch_1--",
        ]);
        match request(&body).unwrap_err() {
            BatchError::MissingBlankLine { text, line } => {
                assert_eq!(line, 4);
                assert_eq!(text, "GET Employees HTTP/1.1");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn missing_blank_line_after_request_headers() {
        let body = single(
            &HTTP_PART,
            &["GET Employees HTTP/1.1", "Accept: application/json"],
        );
        match request(&body).unwrap_err() {
            BatchError::MissingBlankLine { text, line } => {
                assert_eq!(line, 6);
                assert_eq!(text, "Accept: application/json");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(parse(&body, Transformator::Request, false).is_ok());
    }

    #[test]
    fn missing_blank_line_after_changeset_member_headers() {
        let body = change_set(&[
            "--cs_1",
            "Content-Type: application/http",
            "Content-Transfer-Encoding: binary",
            "",
            "DELETE Employees('1') HTTP/1.1",
            "Content-Length: 0",
        ]);
        let err = request(&body).unwrap_err();
        assert!(matches!(err, BatchError::MissingBlankLine { line: 9, .. }));
    }

    #[test]
    fn invalid_header_name() {
        let body = single(
            &["Content-Type: application/http", "Bad@Header: x"],
            &["GET Employees HTTP/1.1", ""],
        );
        let err = request(&body).unwrap_err();
        assert!(matches!(err, BatchError::InvalidHeader { line: 3, .. }));
    }

    #[test]
    fn space_before_colon_is_invalid_header() {
        let body = single(
            &["Content-Type : application/http"],
            &["GET Employees HTTP/1.1", ""],
        );
        match request(&body).unwrap_err() {
            BatchError::InvalidHeader { text, line } => {
                assert_eq!(line, 2);
                assert_eq!(text, "Content-Type : application/http");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn truncated_body() {
        let payload = "x".repeat(30);
        let body = change_set(&[
            "--cs_1",
            "Content-Type: application/http",
            "Content-Transfer-Encoding: binary",
            "",
            "PUT Employees('1') HTTP/1.1",
            "Content-Length: 50",
            "",
            payload.as_str(),
        ]);
        let err = request(&body).unwrap_err();
        assert!(matches!(
            err,
            BatchError::TruncatedBody {
                declared: 50,
                actual: 30,
                line: 11
            }
        ));
        // lenient mode keeps what is there
        let parts = parse(&body, Transformator::Request, false).unwrap();
        let PartContent::ChangeSet(members) = &parts[0].content else {
            panic!("expected changeset");
        };
        let PartContent::Message(message) = &members[0].content else {
            panic!("expected message");
        };
        assert_eq!(message.body.len(), 30);
    }

    #[test]
    fn content_length_cuts_longer_body() {
        let body = single(
            &HTTP_PART,
            &["HTTP/1.1 200 OK", "Content-Length: 5", "", "hello world"],
        );
        let parts = parse(&body, Transformator::Response, true).unwrap();
        let PartContent::Message(message) = &parts[0].content else {
            panic!("expected message");
        };
        assert_eq!(&message.body[..], b"hello");
        assert_eq!(parts[0].kind, PartKind::Response);
    }

    #[test]
    fn get_inside_changeset() {
        let body = change_set(&[
            "--cs_1",
            "Content-Type: application/http",
            "Content-Transfer-Encoding: binary",
            "",
            "GET Employees('1') HTTP/1.1",
            "",
        ]);
        match request(&body).unwrap_err() {
            BatchError::InvalidChangesetMethod { method, line } => {
                assert_eq!(method, "GET");
                assert_eq!(line, 8);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn changeset_boundary_mismatch() {
        let body = crlf(&[
            "--batch_1",
            "Content-Type: multipart/mixed; boundary=cs_1",
            "",
            "--cs_2",
            "Content-Type: application/http",
            "",
            "PUT Employees('1') HTTP/1.1",
            "",
            "--cs_2--",
            "--batch_1--",
        ]);
        let err = request(&body).unwrap_err();
        assert!(matches!(err, BatchError::BoundaryMismatch { line: 4, .. }));
    }

    #[test]
    fn changeset_boundary_colliding_with_outer() {
        let body = crlf(&[
            "--batch_1",
            "Content-Type: multipart/mixed; boundary=batch_1",
            "",
            "--batch_1--",
        ]);
        let err = request(&body).unwrap_err();
        assert!(matches!(err, BatchError::InvalidChangesetBoundary { line: 2, .. }));
    }

    #[test]
    fn changeset_without_boundary_parameter() {
        let body = crlf(&[
            "--batch_1",
            "Content-Transfer-Encoding: binary",
            "Content-Type: multipart/mixed",
            "",
            "--batch_1--",
        ]);
        let err = request(&body).unwrap_err();
        assert!(matches!(err, BatchError::MissingPartBoundaryParameter { line: 3, .. }));
        assert_eq!(err.line(), Some(3));
    }

    #[test]
    fn nested_changeset_rejected() {
        let body = change_set(&[
            "--cs_1",
            "Content-Type: multipart/mixed; boundary=cs_2",
            "",
            "--cs_2",
            "",
            "--cs_2--",
        ]);
        let err = request(&body).unwrap_err();
        assert!(matches!(err, BatchError::InvalidPartContentType { line: 5, .. }));
    }

    #[test]
    fn strict_part_headers() {
        let body = single(
            &["Content-Type: application/http"],
            &["GET Employees HTTP/1.1", ""],
        );
        let err = request(&body).unwrap_err();
        match &err {
            BatchError::MissingHeader { name, line } => {
                assert_eq!(name, CONTENT_TRANSFER_ENCODING);
                assert_eq!(*line, 1);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(err.line(), Some(1));
        assert!(parse(&body, Transformator::Request, false).is_ok());

        let body = single(
            &["Content-Type: application/http", "Content-Transfer-Encoding: base64"],
            &["GET Employees HTTP/1.1", ""],
        );
        assert!(matches!(
            request(&body),
            Err(BatchError::InvalidContentTransferEncoding { line: 3, .. })
        ));

        let body = single(
            &["Content-Transfer-Encoding: binary"],
            &["GET Employees HTTP/1.1", ""],
        );
        assert!(matches!(
            request(&body),
            Err(BatchError::MissingPartContentType { line: 1 })
        ));

        let body = single(
            &["Content-Type: text/plain", "Content-Transfer-Encoding: binary"],
            &["GET Employees HTTP/1.1", ""],
        );
        assert!(matches!(
            request(&body),
            Err(BatchError::InvalidPartContentType { line: 2, .. })
        ));
    }

    #[test]
    fn missing_transfer_encoding_in_changeset_member() {
        let body = change_set(&[
            "--cs_1",
            "Content-Type: application/http",
            "",
            "PUT Employees('1') HTTP/1.1",
            "",
        ]);
        let err = request(&body).unwrap_err();
        assert!(matches!(err, BatchError::MissingHeader { line: 4, .. }));
        assert_eq!(err.line(), Some(4));
    }

    #[test]
    fn query_operation_must_be_get_when_strict() {
        let body = single(&HTTP_PART, &["POST Employees HTTP/1.1", "", "{}"]);
        assert!(matches!(
            request(&body),
            Err(BatchError::InvalidQueryOperationMethod { line: 5, .. })
        ));
        assert!(parse(&body, Transformator::Request, false).is_ok());
    }

    #[test]
    fn get_with_body_rejected_when_strict() {
        let body = single(&HTTP_PART, &["GET Employees HTTP/1.1", "", "payload"]);
        assert!(matches!(
            request(&body),
            Err(BatchError::InvalidBodyForRequest { line: 7 })
        ));
    }

    #[test]
    fn invalid_accept_language() {
        let body = single(
            &HTTP_PART,
            &["GET Employees HTTP/1.1", "Accept-Language: 123456789", ""],
        );
        assert!(matches!(
            request(&body),
            Err(BatchError::InvalidAcceptLanguageHeader { line: 6, .. })
        ));
    }

    #[test]
    fn missing_request_line() {
        let body = single(&HTTP_PART, &[""]);
        assert!(matches!(
            request(&body),
            Err(BatchError::InvalidRequestLine { .. })
        ));
    }
}
