/*
 * start_line.rs
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

//! Embedded message start lines: `METHOD SP request-URI SP HTTP-version` and
//! `HTTP-version SP status-code SP reason-phrase`.

use super::line::Line;
use super::types::Method;
use crate::error::BatchError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: Method,
    pub uri: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub version: String,
    pub code: u16,
    pub reason: String,
}

/// `HTTP/<digit>.<digit>`
pub fn is_http_version(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 8
        && b.starts_with(b"HTTP/")
        && b[5].is_ascii_digit()
        && b[6] == b'.'
        && b[7].is_ascii_digit()
}

pub fn parse_request_line(line: &Line) -> Result<RequestLine, BatchError> {
    let text = line.text().trim_end();
    let invalid = || BatchError::InvalidRequestLine {
        text: line.text().to_string(),
        line: line.number(),
    };
    let missing_method = || BatchError::MissingMethod {
        text: line.text().to_string(),
        line: line.number(),
    };
    let parts: Vec<&str> = text.split(' ').collect();
    match parts.as_slice() {
        [method, uri, version] if is_http_version(version) => {
            if method.is_empty() {
                return Err(missing_method());
            }
            if uri.is_empty() {
                return Err(invalid());
            }
            let method = Method::parse(method).ok_or_else(invalid)?;
            Ok(RequestLine {
                method,
                uri: uri.to_string(),
                version: version.to_string(),
            })
        }
        [uri, version] if is_http_version(version) && !uri.is_empty() => Err(missing_method()),
        _ => Err(invalid()),
    }
}

pub fn parse_status_line(line: &Line) -> Result<StatusLine, BatchError> {
    let text = line.text().trim_end();
    let invalid = || BatchError::InvalidStatusLine {
        text: line.text().to_string(),
        line: line.number(),
    };
    let mut parts = text.splitn(3, ' ');
    let version = parts.next().unwrap_or("");
    let code = parts.next().unwrap_or("");
    let reason = parts.next().unwrap_or("");
    if !is_http_version(version) || code.len() != 3 || !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let code: u16 = code.parse().map_err(|_| invalid())?;
    if !(100..=599).contains(&code) {
        return Err(invalid());
    }
    Ok(StatusLine {
        version: version.to_string(),
        code,
        reason: reason.to_string(),
    })
}
