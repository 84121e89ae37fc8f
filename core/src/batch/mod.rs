/*
 * mod.rs
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

//! OData `$batch`: envelope parsing, changeset execution with Content-ID references,
//! and response assembly.

mod accept;
mod body_part;
mod boundary;
mod context;
mod handler;
mod line;
mod parser;
mod splitter;
mod start_line;
mod transformator;
mod types;
mod uri;
mod writer;

pub use accept::{is_valid_accept, is_valid_accept_language};
pub use boundary::generate_boundary;
pub use context::{ContentIdMap, ExecutionContext};
pub use handler::{handle_batch, BatchExecution, Dispatcher};
pub use line::{read_lines, Charset, Line, Terminator};
pub use parser::{parse_batch_request, parse_batch_response, parse_envelope_content_type, Envelope};
pub use splitter::{split_by_boundary, RawPart};
pub use transformator::Transformator;
pub use types::{
    canonical_reason, BatchRequestPart, BatchResponsePart, Method, RequestDescriptor,
    ResponseDescriptor, ACCEPT, ACCEPT_LANGUAGE, APPLICATION_HTTP, BINARY, CONTENT_ID,
    CONTENT_LENGTH, CONTENT_TRANSFER_ENCODING, CONTENT_TYPE, HTTP_1_1, LOCATION, MULTIPART_MIXED,
};
pub use uri::{normalize_service_root, resolve_request_uri, PathInfo};
pub use writer::{write_batch_request, write_batch_response, BatchRequestBody, BatchResponse};
