/*
 * utils.rs
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

//! MIME grammar utilities (RFC 2045 token, RFC 2046 boundary).

/// Checks if a character is valid in an RFC 2045 token.
#[inline]
pub fn is_token_char(c: u8) -> bool {
    matches!(c,
        b'0'..=b'9' | b'A'..=b'Z' | b'a'..=b'z' |
        b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' |
        b'^' | b'_' | b'`' | b'{' | b'|' | b'}' | b'~'
    )
}

/// Checks if the string is a valid RFC 2045 token (1+ token chars).
pub fn is_token(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(is_token_char)
}

/// Checks if a character is in the RFC 2046 `bcharsnospace` set.
#[inline]
pub fn is_boundary_char(c: u8) -> bool {
    matches!(c,
        b'0'..=b'9' | b'A'..=b'Z' | b'a'..=b'z' |
        b'\'' | b'(' | b')' | b'+' | b'_' | b',' | b'-' | b'.' |
        b'/' | b':' | b'=' | b'?'
    )
}

/// Validates a MIME boundary: 1-70 chars from `bchars`, space allowed except as the last char.
pub fn is_valid_boundary(boundary: &str) -> bool {
    let b = boundary.as_bytes();
    match b.split_last() {
        Some((&last, rest)) if b.len() <= 70 => {
            is_boundary_char(last) && rest.iter().all(|&c| c == b' ' || is_boundary_char(c))
        }
        _ => false,
    }
}

/// True when a delimiter for one boundary could be mistaken for a delimiter of the other.
pub fn boundaries_collide(outer: &str, inner: &str) -> bool {
    outer.starts_with(inner) || inner.starts_with(outer)
}
