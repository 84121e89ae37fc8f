/*
 * config.rs
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

//! Batch processing configuration: strictness and service root.
//! Stored as a small XML document read and written with quick_xml:
//! `<batch strict="true"><service-root>http://host/service.svc/</service-root></batch>`.

use std::fs;
use std::path::Path;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;

use crate::batch::normalize_service_root;
use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfig {
    strict: bool,
    service_root: Option<String>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            strict: true,
            service_root: None,
        }
    }
}

impl BatchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Strict mode validates part headers, Content-Length, and query operation methods.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Service root against which relative request URIs are resolved.
    /// Stored without trailing slash.
    pub fn with_service_root(mut self, root: impl AsRef<str>) -> Self {
        let root = normalize_service_root(root.as_ref());
        self.service_root = if root.is_empty() { None } else { Some(root) };
        self
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn service_root(&self) -> Option<&str> {
        self.service_root.as_deref()
    }

    /// Parse the XML form.
    pub fn from_xml(content: &str) -> Result<Self, ConfigError> {
        let mut reader = Reader::from_str(content);
        reader.config_mut().trim_text(true);
        let mut buf = Vec::new();
        let mut config = BatchConfig::default();
        let mut in_service_root = false;

        loop {
            match reader.read_event_into(&mut buf) {
                Err(e) => return Err(xml_err(e)),
                Ok(Event::Eof) => break,
                Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                    let name = e.name();
                    if name.as_ref() == b"batch" {
                        let attr = e
                            .try_get_attribute("strict")
                            .map_err(xml_err)?;
                        if let Some(attr) = attr {
                            let value = attr.unescape_value().map_err(xml_err)?;
                            config.strict = parse_bool("strict", &value)?;
                        }
                    } else if name.as_ref() == b"service-root" {
                        in_service_root = true;
                    }
                }
                Ok(Event::Text(e)) => {
                    if in_service_root {
                        let text = e.unescape().map_err(xml_err)?;
                        config = config.with_service_root(text.trim());
                    }
                }
                Ok(Event::End(e)) => {
                    if e.name().as_ref() == b"service-root" {
                        in_service_root = false;
                    }
                }
                _ => {}
            }
            buf.clear();
        }
        Ok(config)
    }

    /// Write the XML form (UTF-8).
    pub fn to_xml(&self) -> Result<Vec<u8>, ConfigError> {
        let mut out = Vec::new();
        let mut writer = Writer::new(&mut out);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(xml_err)?;
        let strict = if self.strict { "true" } else { "false" };
        writer
            .write_event(Event::Start(
                BytesStart::new("batch").with_attributes([("strict", strict)]),
            ))
            .map_err(xml_err)?;
        if let Some(root) = &self.service_root {
            writer
                .write_event(Event::Start(BytesStart::new("service-root")))
                .map_err(xml_err)?;
            writer
                .write_event(Event::Text(BytesText::new(root)))
                .map_err(xml_err)?;
            writer
                .write_event(Event::End(BytesEnd::new("service-root")))
                .map_err(xml_err)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new("batch")))
            .map_err(xml_err)?;
        Ok(out)
    }
}

fn xml_err<E: std::fmt::Display>(e: E) -> ConfigError {
    ConfigError::Xml(e.to_string())
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            name: name.to_string(),
            value: other.to_string(),
        }),
    }
}

/// Load configuration from an XML file.
pub fn load_config(path: &Path) -> Result<BatchConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    BatchConfig::from_xml(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_strict_without_root() {
        let config = BatchConfig::default();
        assert!(config.is_strict());
        assert_eq!(config.service_root(), None);
    }

    #[test]
    fn xml_roundtrip() {
        let config = BatchConfig::new()
            .with_strict(false)
            .with_service_root("http://localhost:19000/odata/Employees.svc/");
        let xml = config.to_xml().unwrap();
        let text = String::from_utf8(xml).unwrap();
        assert!(text.contains("strict=\"false\""));
        let parsed = BatchConfig::from_xml(&text).unwrap();
        assert_eq!(parsed, config);
        assert_eq!(parsed.service_root(), Some("http://localhost:19000/odata/Employees.svc"));
    }

    #[test]
    fn invalid_strict_value() {
        let err = BatchConfig::from_xml("<batch strict=\"maybe\"/>").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
