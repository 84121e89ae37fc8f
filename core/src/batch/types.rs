/*
 * types.rs
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

//! Batch request and response descriptors.

use bytes::Bytes;

use super::uri::PathInfo;
use crate::mime::HeaderMap;

/// Header naming the Content-ID of a part (MIME level) or of an embedded request
/// (application level).
pub const CONTENT_ID: &str = "Content-Id";
pub const CONTENT_TYPE: &str = "Content-Type";
pub const CONTENT_LENGTH: &str = "Content-Length";
pub const CONTENT_TRANSFER_ENCODING: &str = "Content-Transfer-Encoding";
pub const LOCATION: &str = "Location";
pub const ACCEPT: &str = "Accept";
pub const ACCEPT_LANGUAGE: &str = "Accept-Language";

pub const HTTP_1_1: &str = "HTTP/1.1";
pub const APPLICATION_HTTP: &str = "application/http";
pub const MULTIPART_MIXED: &str = "multipart/mixed";
pub const BINARY: &str = "binary";

/// HTTP methods allowed in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Merge,
    Patch,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Merge => "MERGE",
            Method::Patch => "PATCH",
        }
    }

    /// Parse an upper-case method token.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "GET" => Some(Method::Get),
            "POST" => Some(Method::Post),
            "PUT" => Some(Method::Put),
            "DELETE" => Some(Method::Delete),
            "MERGE" => Some(Method::Merge),
            "PATCH" => Some(Method::Patch),
            _ => None,
        }
    }

    /// Methods permitted as changeset members.
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Method::Get)
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One embedded request of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    method: Method,
    path_info: PathInfo,
    version: String,
    headers: HeaderMap,
    mime_headers: HeaderMap,
    body: Bytes,
}

impl RequestDescriptor {
    pub fn new(method: Method, path_info: PathInfo) -> Self {
        Self {
            method,
            path_info,
            version: HTTP_1_1.to_string(),
            headers: HeaderMap::new(),
            mime_headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Add or replace a header of the embedded request.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Add or replace a header of the enclosing MIME part.
    pub fn with_mime_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.mime_headers.insert(name, value);
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_mime_headers(mut self, headers: HeaderMap) -> Self {
        self.mime_headers = headers;
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub(crate) fn with_path_info(mut self, path_info: PathInfo) -> Self {
        self.path_info = path_info;
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path_info(&self) -> &PathInfo {
        &self.path_info
    }

    /// Request URI as dispatched: absolute when a service root is known.
    pub fn request_uri(&self) -> String {
        self.path_info.request_uri()
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn mime_headers(&self) -> &HeaderMap {
        &self.mime_headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Content-ID from the MIME part headers.
    pub fn mime_content_id(&self) -> Option<&str> {
        self.mime_headers.get(CONTENT_ID)
    }

    /// Content-ID from the embedded request headers.
    pub fn request_content_id(&self) -> Option<&str> {
        self.headers.get(CONTENT_ID)
    }

    /// Effective Content-ID: the application-level header wins over the MIME-level one.
    pub fn content_id(&self) -> Option<&str> {
        self.request_content_id().or_else(|| self.mime_content_id())
    }
}

/// One embedded response of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseDescriptor {
    status: u16,
    reason: Option<String>,
    version: String,
    headers: HeaderMap,
    mime_headers: HeaderMap,
    body: Bytes,
}

impl ResponseDescriptor {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            reason: None,
            version: HTTP_1_1.to_string(),
            headers: HeaderMap::new(),
            mime_headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_mime_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.mime_headers.insert(name, value);
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_mime_headers(mut self, headers: HeaderMap) -> Self {
        self.mime_headers = headers;
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// Reason phrase as received, or the canonical phrase for the status.
    pub fn reason_phrase(&self) -> &str {
        self.reason.as_deref().unwrap_or_else(|| canonical_reason(self.status))
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn is_success(&self) -> bool {
        self.status < 400
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn mime_headers(&self) -> &HeaderMap {
        &self.mime_headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn location(&self) -> Option<&str> {
        self.headers.get(LOCATION)
    }

    pub fn mime_content_id(&self) -> Option<&str> {
        self.mime_headers.get(CONTENT_ID)
    }

    pub fn response_content_id(&self) -> Option<&str> {
        self.headers.get(CONTENT_ID)
    }

    /// Effective Content-ID, same precedence as [`RequestDescriptor::content_id`].
    pub fn content_id(&self) -> Option<&str> {
        self.response_content_id().or_else(|| self.mime_content_id())
    }

    /// Body as text (lossy for non-UTF-8 bodies).
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Top-level part of a batch request: a single query or an ordered changeset.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchRequestPart {
    Query(RequestDescriptor),
    ChangeSet(Vec<RequestDescriptor>),
}

impl BatchRequestPart {
    pub fn is_change_set(&self) -> bool {
        matches!(self, BatchRequestPart::ChangeSet(_))
    }

    pub fn requests(&self) -> &[RequestDescriptor] {
        match self {
            BatchRequestPart::Query(request) => std::slice::from_ref(request),
            BatchRequestPart::ChangeSet(requests) => requests,
        }
    }
}

/// Top-level part of a batch response, mirroring [`BatchRequestPart`].
///
/// An aborted changeset is reported as `Single` holding the failing response.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchResponsePart {
    Single(ResponseDescriptor),
    ChangeSet(Vec<ResponseDescriptor>),
}

impl BatchResponsePart {
    pub fn is_change_set(&self) -> bool {
        matches!(self, BatchResponsePart::ChangeSet(_))
    }

    pub fn responses(&self) -> &[ResponseDescriptor] {
        match self {
            BatchResponsePart::Single(response) => std::slice::from_ref(response),
            BatchResponsePart::ChangeSet(responses) => responses,
        }
    }
}

/// Standard reason phrase for a status code.
pub fn canonical_reason(status: u16) -> &'static str {
    match status {
        100 => "Continue",
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        206 => "Partial Content",
        301 => "Moved Permanently",
        302 => "Found",
        304 => "Not Modified",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        406 => "Not Acceptable",
        409 => "Conflict",
        410 => "Gone",
        412 => "Precondition Failed",
        413 => "Payload Too Large",
        415 => "Unsupported Media Type",
        416 => "Range Not Satisfiable",
        422 => "Unprocessable Entity",
        428 => "Precondition Required",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        503 => "Service Unavailable",
        _ => match status / 100 {
            1 => "Informational",
            2 => "Success",
            3 => "Redirection",
            4 => "Client Error",
            _ => "Server Error",
        },
    }
}
