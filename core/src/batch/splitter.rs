/*
 * splitter.rs
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

//! Boundary splitter: partition a line sequence into body parts.

use super::line::Line;
use crate::error::BatchError;

/// Lines of one body part, with the line number of its opening delimiter.
#[derive(Debug, Clone, Copy)]
pub struct RawPart<'a> {
    pub delimiter_line: usize,
    pub lines: &'a [Line],
}

impl<'a> RawPart<'a> {
    /// Line number of the last line of the part, or of its delimiter when empty.
    pub fn last_line(&self) -> usize {
        self.lines.last().map_or(self.delimiter_line, Line::number)
    }
}

/// Split `lines` on `--boundary` delimiters up to the `--boundary--` close delimiter.
///
/// Preamble before the first delimiter and epilogue after the close delimiter are discarded.
/// `fallback_line` is reported when `lines` is empty.
pub fn split_by_boundary<'a>(
    lines: &'a [Line],
    boundary: &str,
    fallback_line: usize,
) -> Result<Vec<RawPart<'a>>, BatchError> {
    let open = format!("--{}", boundary);
    let close = format!("--{}--", boundary);
    let mut parts = Vec::new();
    let mut current: Option<(usize, usize)> = None;

    for (i, line) in lines.iter().enumerate() {
        let text = line.text().trim();
        if text == close {
            let (delimiter_line, start) =
                current.ok_or_else(|| BatchError::MissingBoundaryDelimiter {
                    boundary: boundary.to_string(),
                    line: line.number(),
                })?;
            parts.push(RawPart {
                delimiter_line,
                lines: &lines[start..i],
            });
            return Ok(parts);
        }
        if text == open {
            if let Some((delimiter_line, start)) = current {
                parts.push(RawPart {
                    delimiter_line,
                    lines: &lines[start..i],
                });
            }
            current = Some((line.number(), i + 1));
        } else if text.starts_with(&open) {
            return Err(BatchError::InvalidBoundaryDelimiter {
                text: line.text().to_string(),
                line: line.number(),
            });
        }
    }

    let last = lines.last().map_or(fallback_line, Line::number);
    match current {
        None => Err(BatchError::MissingBoundaryDelimiter {
            boundary: boundary.to_string(),
            line: last,
        }),
        Some(_) => Err(BatchError::MissingCloseDelimiter {
            boundary: boundary.to_string(),
            line: last,
        }),
    }
}
