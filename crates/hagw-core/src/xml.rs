//! Command configuration as exported by the panel designer
//!
//! ```xml
//! <controller>
//!   <command id="hall-dim" protocol="lutron_homeworks">
//!     <property name="command" value="FADE"/>
//!     <property name="address" value="[01:04:01:01:01]"/>
//!     <property name="level" value="50"/>
//!   </command>
//!   <sensor id="hall-level" type="range" command="hall-status"/>
//! </controller>
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::sensor::SensorKind;

/// One `<command>` element
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommandElement {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@protocol")]
    pub protocol: String,
    /// Dynamic value supplied at execution time (e.g. a slider position)
    #[serde(rename = "@value", default)]
    pub value: Option<String>,
    #[serde(rename = "property", default)]
    pub properties: Vec<Property>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Property {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@value", default)]
    pub value: String,
}

impl CommandElement {
    pub fn new(id: impl Into<String>, protocol: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            protocol: protocol.into(),
            value: None,
            properties: Vec::new(),
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.push(Property {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// First property named `name`, ignoring case
    #[cfg(test)]
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .map(|p| p.value.as_str())
    }
}

/// One `<sensor>` element binding a sensor to a command
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SensorBinding {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type")]
    pub kind: SensorKind,
    #[serde(rename = "@command")]
    pub command: String,
}

/// A whole command file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CommandFile {
    #[serde(rename = "command", default)]
    pub commands: Vec<CommandElement>,
    #[serde(rename = "sensor", default)]
    pub sensors: Vec<SensorBinding>,
}

impl CommandFile {
    pub fn from_xml(xml: &str) -> Result<Self, XmlError> {
        quick_xml::de::from_str(xml).map_err(|e| XmlError::Parse(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, XmlError> {
        let path = path.as_ref();
        let xml = std::fs::read_to_string(path).map_err(|source| XmlError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_xml(&xml)
    }

    #[cfg(test)]
    pub fn command(&self, id: &str) -> Option<&CommandElement> {
        self.commands.iter().find(|c| c.id == id)
    }
}

#[derive(Debug, Error)]
pub enum XmlError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed command file: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILE: &str = r#"
        <controller>
          <command id="fade" protocol="lutron_homeworks" value="40">
            <property name="command" value="FADE"/>
            <property name="Address" value="[01:04:01:01:01]"/>
          </command>
          <sensor id="hall-level" type="level" command="status"/>
          <command id="status" protocol="lutron_homeworks">
            <property name="command" value="STATUS_DIMMER"/>
          </command>
        </controller>"#;

    #[test]
    fn test_parse_interleaved_file() {
        let file = CommandFile::from_xml(FILE).unwrap();
        assert_eq!(file.commands.len(), 2);
        assert_eq!(file.sensors.len(), 1);

        let fade = file.command("fade").unwrap();
        assert_eq!(fade.protocol, "lutron_homeworks");
        assert_eq!(fade.value.as_deref(), Some("40"));
        assert_eq!(fade.property("address"), Some("[01:04:01:01:01]"));
        assert_eq!(fade.property("level"), None);

        let sensor = &file.sensors[0];
        assert_eq!(sensor.kind, SensorKind::Level);
        assert_eq!(sensor.command, "status");
    }

    #[test]
    fn test_empty_file() {
        let file = CommandFile::from_xml("<controller/>").unwrap();
        assert!(file.commands.is_empty());
        assert!(file.sensors.is_empty());
    }

    #[test]
    fn test_malformed_file() {
        assert!(CommandFile::from_xml("<controller><command id=\"x\">").is_err());
    }

    #[test]
    fn test_builder_helpers() {
        let element = CommandElement::new("x", "amx_ni")
            .with_property("COMMAND", "ON")
            .with_value("12");
        assert_eq!(element.property("command"), Some("ON"));
        assert_eq!(element.value.as_deref(), Some("12"));
    }
}
