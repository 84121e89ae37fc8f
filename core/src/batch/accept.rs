/*
 * accept.rs
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

//! Grammar checks for the embedded `Accept` and `Accept-Language` headers (RFC 7231 section 5.3).

use crate::mime::is_token;

/// `qvalue = ( "0" [ "." 0*3DIGIT ] ) / ( "1" [ "." 0*3("0") ] )`
fn is_qvalue(s: &str) -> bool {
    let (int, frac) = match s.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (s, None),
    };
    let frac_ok =
        |digit: fn(u8) -> bool| frac.map_or(true, |f| f.len() <= 3 && f.bytes().all(digit));
    match int {
        "0" => frac_ok(|b| b.is_ascii_digit()),
        "1" => frac_ok(|b| b == b'0'),
        _ => false,
    }
}

fn is_quoted_string(s: &str) -> bool {
    s.len() >= 2 && s.starts_with('"') && s.ends_with('"')
}

/// Validate `;name=value` parameters, checking `q` as a qvalue.
fn valid_parameters<'a>(params: impl Iterator<Item = &'a str>, q_only: bool) -> bool {
    params.into_iter().all(|param| {
        let (name, value) = match param.split_once('=') {
            Some((n, v)) => (n.trim(), v.trim()),
            None => return false,
        };
        if name.eq_ignore_ascii_case("q") {
            is_qvalue(value)
        } else {
            !q_only && is_token(name) && (is_token(value) || is_quoted_string(value))
        }
    })
}

/// Comma-separated media ranges: `*/*`, `type/*` or `type/subtype`, each with optional parameters.
pub fn is_valid_accept(value: &str) -> bool {
    if value.trim().is_empty() {
        return false;
    }
    value.split(',').all(|range| {
        let mut pieces = range.split(';');
        let media = pieces.next().unwrap_or("").trim();
        let valid_media = match media.split_once('/') {
            Some(("*", "*")) => true,
            Some(("*", _)) => false,
            Some((primary, sub)) => is_token(primary) && is_token(sub),
            None => false,
        };
        valid_media && valid_parameters(pieces, false)
    })
}

fn is_language_range(s: &str) -> bool {
    if s == "*" {
        return true;
    }
    let mut subtags = s.split('-');
    let primary_ok = subtags
        .next()
        .is_some_and(|p| (1..=8).contains(&p.len()) && p.bytes().all(|b| b.is_ascii_alphabetic()));
    let subtag_ok =
        |t: &str| (1..=8).contains(&t.len()) && t.bytes().all(|b| b.is_ascii_alphanumeric());
    primary_ok && subtags.all(subtag_ok)
}

/// Comma-separated language ranges with an optional `q` parameter.
pub fn is_valid_accept_language(value: &str) -> bool {
    if value.trim().is_empty() {
        return false;
    }
    value.split(',').all(|range| {
        let mut pieces = range.split(';');
        let language = pieces.next().unwrap_or("").trim();
        is_language_range(language) && valid_parameters(pieces, true)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("application/json")]
    #[case("*/*")]
    #[case("application/atomsvc+xml;q=0.8, application/json;odata=verbose;q=0.5, */*;q=0.1")]
    #[case("text/*; q=1.000")]
    fn accepts_valid_media_ranges(#[case] value: &str) {
        assert!(is_valid_accept(value));
    }

    #[rstest]
    #[case("")]
    #[case("json")]
    #[case("*/json")]
    #[case("application/json;q=2")]
    #[case("application/json;q=0.12345")]
    #[case("application/json, ")]
    fn rejects_invalid_media_ranges(#[case] value: &str) {
        assert!(!is_valid_accept(value));
    }

    #[rstest]
    #[case("en", true)]
    #[case("en-US, de;q=0.7, *;q=0.1", true)]
    #[case("zh-Hant-TW", true)]
    #[case("englishlanguage", false)]
    #[case("en;charset=utf-8", false)]
    #[case("1en", false)]
    fn language_ranges(#[case] value: &str, #[case] valid: bool) {
        assert_eq!(is_valid_accept_language(value), valid);
    }
}
