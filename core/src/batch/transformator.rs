/*
 * transformator.rs
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

//! Turn parsed body parts into request or response descriptors.

use super::body_part::{BodyPart, EmbeddedMessage, PartContent, StartLine};
use super::types::{BatchRequestPart, BatchResponsePart, RequestDescriptor, ResponseDescriptor};
use super::uri::resolve_request_uri;
use crate::error::BatchError;

/// Direction of a parse, chosen once per envelope: requests on the serving side,
/// responses on the client side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transformator {
    Request,
    Response,
}

pub fn to_request_part(part: BodyPart, service_root: &str) -> Result<BatchRequestPart, BatchError> {
    match part.content {
        PartContent::ChangeSet(members) => members
            .into_iter()
            .map(|member| to_request(member, service_root))
            .collect::<Result<Vec<_>, _>>()
            .map(BatchRequestPart::ChangeSet),
        PartContent::Message(_) => to_request(part, service_root).map(BatchRequestPart::Query),
    }
}

fn to_request(part: BodyPart, service_root: &str) -> Result<RequestDescriptor, BatchError> {
    match part.content {
        PartContent::Message(EmbeddedMessage {
            start: StartLine::Request(request_line),
            line,
            headers,
            body,
        }) => {
            let path_info = resolve_request_uri(&request_line.uri, service_root, line)?;
            Ok(RequestDescriptor::new(request_line.method, path_info)
                .with_version(request_line.version)
                .with_headers(headers)
                .with_mime_headers(part.headers)
                .with_body(body))
        }
        _ => Err(BatchError::InvalidRequestLine {
            text: String::new(),
            line: part.line,
        }),
    }
}

pub fn to_response_part(part: BodyPart) -> Result<BatchResponsePart, BatchError> {
    match part.content {
        PartContent::ChangeSet(members) => members
            .into_iter()
            .map(to_response)
            .collect::<Result<Vec<_>, _>>()
            .map(BatchResponsePart::ChangeSet),
        PartContent::Message(_) => to_response(part).map(BatchResponsePart::Single),
    }
}

fn to_response(part: BodyPart) -> Result<ResponseDescriptor, BatchError> {
    match part.content {
        PartContent::Message(EmbeddedMessage {
            start: StartLine::Status(status_line),
            headers,
            body,
            ..
        }) => Ok(ResponseDescriptor::new(status_line.code)
            .with_reason(status_line.reason)
            .with_version(status_line.version)
            .with_headers(headers)
            .with_mime_headers(part.headers)
            .with_body(body)),
        _ => Err(BatchError::InvalidStatusLine {
            text: String::new(),
            line: part.line,
        }),
    }
}
