/*
 * uri.rs
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

//! Request URI resolution against the service root, and OData path segments.
//! Segments are stored percent-decoded and re-encoded when a URI is formed.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

use crate::error::BatchError;

/// Path segment safe set: encode everything except unreserved and sub-delims used in paths.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b'/')
    .add(b'?')
    .add(b'#')
    .add(b'[')
    .add(b']')
    .add(b'@')
    .add(b'%')
    .add(b' ');

/// Resolved request target: service root, OData path segments, query string.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathInfo {
    service_root: String,
    segments: Vec<String>,
    query: Option<String>,
}

impl PathInfo {
    pub fn new(
        service_root: &str,
        segments: impl IntoIterator<Item = impl Into<String>>,
        query: Option<String>,
    ) -> Self {
        Self {
            service_root: normalize_service_root(service_root),
            segments: segments.into_iter().map(Into::into).collect(),
            query,
        }
    }

    /// Path info with no service root.
    pub fn relative(segments: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::new("", segments, None)
    }

    pub fn service_root(&self) -> &str {
        &self.service_root
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn first_segment(&self) -> Option<&str> {
        self.segments.first().map(String::as_str)
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// OData path relative to the service root, percent-encoded.
    pub fn odata_path(&self) -> String {
        self.segments
            .iter()
            .map(|s| utf8_percent_encode(s, PATH_SEGMENT).to_string())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Relative request URI: OData path plus query.
    pub fn relative_uri(&self) -> String {
        match &self.query {
            Some(q) => format!("{}?{}", self.odata_path(), q),
            None => self.odata_path(),
        }
    }

    /// Request URI: absolute under the service root when one is set, relative otherwise.
    pub fn request_uri(&self) -> String {
        if self.service_root.is_empty() {
            self.relative_uri()
        } else {
            format!("{}/{}", self.service_root, self.relative_uri())
        }
    }

    /// Replace the first segment by the segments of `location`, keeping the rest and the query.
    pub fn with_first_segment_replaced(&self, location: &str) -> PathInfo {
        let mut segments: Vec<String> = location
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| percent_decode_str(s).decode_utf8_lossy().into_owned())
            .collect();
        segments.extend(self.segments.iter().skip(1).cloned());
        PathInfo {
            service_root: self.service_root.clone(),
            segments,
            query: self.query.clone(),
        }
    }
}

/// Service root without trailing slash.
pub fn normalize_service_root(root: &str) -> String {
    root.trim().trim_end_matches('/').to_string()
}

/// Path component of an absolute URI (`http://host:port/path` gives `/path`).
fn path_component(uri: &str) -> &str {
    let after_scheme = match uri.find("://") {
        Some(i) => &uri[i + 3..],
        None => return uri,
    };
    match after_scheme.find('/') {
        Some(i) => &after_scheme[i..],
        None => "",
    }
}

fn has_scheme(uri: &str) -> bool {
    let lower = uri.get(..8).unwrap_or(uri).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Resolve the request-URI of an embedded request line.
///
/// Absolute URIs must lie under the service root; absolute paths must start with the
/// service root's path; anything else is relative to the service root.
pub fn resolve_request_uri(
    uri: &str,
    service_root: &str,
    line: usize,
) -> Result<PathInfo, BatchError> {
    let root = normalize_service_root(service_root);
    let invalid = || BatchError::InvalidUri {
        uri: uri.to_string(),
        line,
    };
    let odata_path = if has_scheme(uri) {
        if root.is_empty() {
            return Err(invalid());
        }
        match uri.strip_prefix(root.as_str()) {
            Some(rest) if rest.is_empty() || rest.starts_with('/') || rest.starts_with('?') => rest,
            _ => return Err(invalid()),
        }
    } else if uri.starts_with('/') {
        let root_path = if root.is_empty() {
            None
        } else {
            Some(path_component(&root))
        };
        match root_path.and_then(|p| uri.strip_prefix(p)) {
            Some(rest) if rest.is_empty() || rest.starts_with('/') || rest.starts_with('?') => rest,
            _ => {
                return Err(BatchError::UnsupportedAbsolutePath {
                    uri: uri.to_string(),
                    line,
                })
            }
        }
    } else {
        uri
    };
    let odata_path = odata_path.strip_prefix('/').unwrap_or(odata_path);
    let (path, query) = match odata_path.find('?') {
        Some(i) => (&odata_path[..i], Some(odata_path[i + 1..].to_string())),
        None => (odata_path, None),
    };
    let path = path.strip_suffix('/').unwrap_or(path);
    let mut segments = Vec::new();
    if !path.is_empty() {
        for raw in path.split('/') {
            if raw.is_empty() {
                return Err(invalid());
            }
            let decoded = percent_decode_str(raw).decode_utf8().map_err(|_| invalid())?;
            segments.push(decoded.into_owned());
        }
    }
    Ok(PathInfo {
        service_root: root,
        segments,
        query: query.filter(|q| !q.is_empty()),
    })
}
