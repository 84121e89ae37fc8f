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

//! MIME building blocks shared by the batch parser and writer: Content-Type parsing,
//! boundary grammar, and the header map.

mod content_type;
mod header;
mod parameter;
mod utils;

pub use content_type::{has_mime_type, parse_content_type, parse_parameter_list, ContentType};
pub use header::HeaderMap;
pub use parameter::Parameter;
pub use utils::{boundaries_collide, is_boundary_char, is_token, is_token_char, is_valid_boundary};
