/*
 * lib.rs
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

//! Fascicolo core: the OData `$batch` protocol engine.

pub mod batch;
pub mod config;
pub mod error;
pub mod mime;

pub use batch::{
    handle_batch, parse_batch_request, parse_batch_response, write_batch_request,
    write_batch_response, BatchRequestPart, BatchResponse, BatchResponsePart, Dispatcher,
    ExecutionContext, RequestDescriptor, ResponseDescriptor,
};
pub use config::{load_config, BatchConfig};
pub use error::{BatchError, ConfigError, DispatchError};
