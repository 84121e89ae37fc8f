/*
 * handler.rs
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

//! Batch execution: the coordinator that runs parsed parts in document order against a
//! caller-supplied dispatcher, and the `handle_batch` entry point.

use bytes::Bytes;
use tracing::{debug, warn};

use super::context::{ContentIdMap, ExecutionContext};
use super::parser::parse_batch_request;
use super::types::{
    BatchRequestPart, BatchResponsePart, Method, RequestDescriptor, ResponseDescriptor, CONTENT_ID,
};
use super::writer::{write_batch_response, BatchResponse};
use crate::error::{BatchError, DispatchError};

/// The per-request pipeline a batch delegates to.
///
/// Application failures (not found, conflict, ...) must come back as a response with
/// the matching status. An `Err` is an unrecoverable failure and aborts the batch.
pub trait Dispatcher {
    fn dispatch(
        &mut self,
        request: &RequestDescriptor,
        context: &ExecutionContext,
    ) -> Result<ResponseDescriptor, DispatchError>;
}

impl<F> Dispatcher for F
where
    F: FnMut(&RequestDescriptor, &ExecutionContext) -> Result<ResponseDescriptor, DispatchError>,
{
    fn dispatch(
        &mut self,
        request: &RequestDescriptor,
        context: &ExecutionContext,
    ) -> Result<ResponseDescriptor, DispatchError> {
        self(request, context)
    }
}

/// One execution of a parsed batch. Owns the Content-ID map for its lifetime.
pub struct BatchExecution<'a, D: Dispatcher> {
    context: &'a ExecutionContext,
    dispatcher: &'a mut D,
    content_ids: ContentIdMap,
}

impl<'a, D: Dispatcher> BatchExecution<'a, D> {
    pub fn new(context: &'a ExecutionContext, dispatcher: &'a mut D) -> Self {
        Self {
            context,
            dispatcher,
            content_ids: ContentIdMap::new(),
        }
    }

    pub fn content_ids(&self) -> &ContentIdMap {
        &self.content_ids
    }

    /// Execute every part strictly in order.
    pub fn execute(
        &mut self,
        parts: Vec<BatchRequestPart>,
    ) -> Result<Vec<BatchResponsePart>, BatchError> {
        let mut responses = Vec::with_capacity(parts.len());
        for part in parts {
            let response = match part {
                BatchRequestPart::Query(request) => {
                    BatchResponsePart::Single(self.execute_request(request)?)
                }
                BatchRequestPart::ChangeSet(requests) => self.execute_change_set(requests)?,
            };
            responses.push(response);
        }
        Ok(responses)
    }

    /// Members run in order; the first failing member ends the changeset and becomes its
    /// only result.
    fn execute_change_set(
        &mut self,
        requests: Vec<RequestDescriptor>,
    ) -> Result<BatchResponsePart, BatchError> {
        self.content_ids.clear();
        let total = requests.len();
        let mut responses = Vec::with_capacity(total);
        for (index, request) in requests.into_iter().enumerate() {
            let response = self.execute_request(request)?;
            if !response.is_success() {
                debug!(
                    status = response.status(),
                    member = index + 1,
                    skipped = total - index - 1,
                    "changeset aborted"
                );
                return Ok(BatchResponsePart::Single(response));
            }
            responses.push(response);
        }
        Ok(BatchResponsePart::ChangeSet(responses))
    }

    fn execute_request(
        &mut self,
        request: RequestDescriptor,
    ) -> Result<ResponseDescriptor, BatchError> {
        let request = self.substitute_content_id(request);
        let response = self
            .dispatcher
            .dispatch(&request, self.context)
            .map_err(|source| BatchError::Dispatch { source })?;
        let response = echo_content_ids(&request, response);
        if request.method() == Method::Post && response.is_success() {
            self.record_location(&request, &response);
        }
        Ok(response)
    }

    fn substitute_content_id(&self, request: RequestDescriptor) -> RequestDescriptor {
        let token = match request.path_info().first_segment() {
            Some(segment) if segment.len() > 1 && segment.starts_with('$') => segment.to_string(),
            _ => return request,
        };
        match self.content_ids.resolve(&token) {
            Some(location) => {
                debug!(token = %token, location = %location, "content-id reference resolved");
                let path_info = request.path_info().with_first_segment_replaced(location);
                request.with_path_info(path_info)
            }
            None => {
                warn!(token = %token, "unresolved content-id reference");
                request
            }
        }
    }

    fn record_location(&mut self, request: &RequestDescriptor, response: &ResponseDescriptor) {
        let (Some(content_id), Some(location)) = (request.content_id(), response.location()) else {
            return;
        };
        let location = relative_location(location, self.context.service_root());
        debug!(content_id = %content_id, location = %location, "content-id recorded");
        self.content_ids.insert(content_id, location);
    }
}

/// Strip the service root from an absolute Location.
fn relative_location<'l>(location: &'l str, service_root: &str) -> &'l str {
    if service_root.is_empty() {
        return location;
    }
    location
        .strip_prefix(service_root)
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap_or(location)
}

/// Copy both Content-IDs of the request onto its response, each at its own level.
fn echo_content_ids(
    request: &RequestDescriptor,
    mut response: ResponseDescriptor,
) -> ResponseDescriptor {
    if let Some(id) = request.mime_content_id() {
        response = response.with_mime_header(CONTENT_ID, id);
    }
    if let Some(id) = request.request_content_id() {
        response = response.with_header(CONTENT_ID, id);
    }
    response
}

/// Parse, execute and assemble one batch.
///
/// Any structural error is returned before the dispatcher is called once; use
/// [`BatchResponse::error`] to turn it into the 400 answer.
pub fn handle_batch<D: Dispatcher>(
    raw_body: impl Into<Bytes>,
    content_type: &str,
    context: &ExecutionContext,
    dispatcher: &mut D,
) -> Result<BatchResponse, BatchError> {
    let parts = parse_batch_request(raw_body, content_type, context.config())?;
    debug!(parts = parts.len(), "executing batch");
    let responses = BatchExecution::new(context, dispatcher).execute(parts)?;
    write_batch_response(&responses)
}
