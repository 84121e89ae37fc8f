/*
 * line.rs
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

//! Line reader: split the envelope into terminator-preserving, 1-based numbered lines.

use bytes::Bytes;

use crate::error::BatchError;

/// How a line was terminated on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminator {
    CrLf,
    Lf,
    Cr,
    /// Final line without terminator.
    None,
}

impl Terminator {
    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            Terminator::CrLf => b"\r\n",
            Terminator::Lf => b"\n",
            Terminator::Cr => b"\r",
            Terminator::None => b"",
        }
    }
}

/// Envelope charsets understood by the line reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Charset {
    #[default]
    Utf8,
    UsAscii,
    Latin1,
}

impl Charset {
    /// Look up a `charset` parameter value.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Some(Charset::Utf8),
            "us-ascii" | "ascii" => Some(Charset::UsAscii),
            "iso-8859-1" | "iso_8859-1" | "latin1" => Some(Charset::Latin1),
            _ => None,
        }
    }

    fn decode(&self, raw: &[u8]) -> Option<String> {
        match self {
            Charset::Utf8 => std::str::from_utf8(raw).ok().map(str::to_owned),
            Charset::UsAscii => raw.is_ascii().then(|| raw.iter().map(|&b| b as char).collect()),
            Charset::Latin1 => Some(raw.iter().map(|&b| b as char).collect()),
        }
    }
}

/// One decoded line. `raw` holds the wire bytes without the terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    number: usize,
    text: String,
    raw: Bytes,
    terminator: Terminator,
}

impl Line {
    pub fn number(&self) -> usize {
        self.number
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    pub fn terminator(&self) -> Terminator {
        self.terminator
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Read all lines of `body`. CRLF, LF and a lone CR each end a line.
pub fn read_lines(body: &Bytes, charset: Charset) -> Result<Vec<Line>, BatchError> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < body.len() {
        let (terminator, width) = match body[i] {
            b'\r' if body.get(i + 1) == Some(&b'\n') => (Terminator::CrLf, 2),
            b'\r' => (Terminator::Cr, 1),
            b'\n' => (Terminator::Lf, 1),
            _ => {
                i += 1;
                continue;
            }
        };
        push_line(&mut lines, body.slice(start..i), terminator, charset)?;
        i += width;
        start = i;
    }
    if start < body.len() {
        push_line(&mut lines, body.slice(start..), Terminator::None, charset)?;
    }
    Ok(lines)
}

fn push_line(
    lines: &mut Vec<Line>,
    raw: Bytes,
    terminator: Terminator,
    charset: Charset,
) -> Result<(), BatchError> {
    let number = lines.len() + 1;
    let text = charset
        .decode(&raw)
        .ok_or(BatchError::InvalidBodyEncoding { line: number })?;
    lines.push(Line {
        number,
        text,
        raw,
        terminator,
    });
    Ok(())
}

/// Concatenate the wire bytes of `lines`, dropping the terminator of the last line.
/// That final line break belongs to the following boundary delimiter (RFC 2046).
pub fn join_body(lines: &[Line]) -> Bytes {
    match lines {
        [] => Bytes::new(),
        [only] => only.raw.clone(),
        [init @ .., last] => {
            let init_len: usize =
                init.iter().map(|l| l.raw.len() + l.terminator.as_bytes().len()).sum();
            let len = init_len + last.raw.len();
            let mut out = Vec::with_capacity(len);
            for line in init {
                out.extend_from_slice(&line.raw);
                out.extend_from_slice(line.terminator.as_bytes());
            }
            out.extend_from_slice(&last.raw);
            Bytes::from(out)
        }
    }
}
