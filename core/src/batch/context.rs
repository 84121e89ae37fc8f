/*
 * context.rs
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

//! Execution context handed to every dispatch, and the Content-ID map of one batch execution.

use std::collections::HashMap;

use crate::config::BatchConfig;
use crate::mime::HeaderMap;

/// Per-batch context supplied by the caller: configuration plus the headers of the
/// outer `$batch` request, visible to every embedded dispatch.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    config: BatchConfig,
    batch_headers: HeaderMap,
}

impl ExecutionContext {
    pub fn new(config: BatchConfig) -> Self {
        Self {
            config,
            batch_headers: HeaderMap::new(),
        }
    }

    pub fn with_batch_headers(mut self, headers: HeaderMap) -> Self {
        self.batch_headers = headers;
        self
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Service root without trailing slash, empty when none is configured.
    pub fn service_root(&self) -> &str {
        self.config.service_root().unwrap_or("")
    }

    pub fn batch_headers(&self) -> &HeaderMap {
        &self.batch_headers
    }
}

/// Maps `$<content-id>` tokens to the relative location of the entity a request created.
/// Recording an id twice overwrites the earlier location.
#[derive(Debug, Clone, Default)]
pub struct ContentIdMap {
    entries: HashMap<String, String>,
}

impl ContentIdMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, content_id: &str, location: impl Into<String>) {
        self.entries.insert(format!("${}", content_id), location.into());
    }

    /// Location for a `$<content-id>` path segment.
    pub fn resolve(&self, segment: &str) -> Option<&str> {
        self.entries.get(segment).map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
