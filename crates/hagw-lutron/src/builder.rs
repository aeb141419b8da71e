//! Builds Lutron commands from `<command protocol="lutron_homeworks">`
//! elements

use hagw_core::{CommandElement, CommandError, CommandResult};
use tracing::warn;

use crate::address::Address;
use crate::command::{
    DimmerCommand, GrafikEyeCommand, KeypadCommand, LutronCommand, LutronVerb,
};
use crate::gateway::LutronGateway;

pub const PROTOCOL: &str = "lutron_homeworks";

#[derive(Default)]
struct Properties<'a> {
    command: Option<&'a str>,
    address: Option<&'a str>,
    scene: Option<&'a str>,
    key: Option<&'a str>,
    level: Option<&'a str>,
}

/// Turns configuration elements into commands bound to one gateway
#[derive(Clone)]
pub struct LutronCommandBuilder {
    gateway: LutronGateway,
}

impl LutronCommandBuilder {
    pub fn new(gateway: LutronGateway) -> Self {
        Self { gateway }
    }

    pub fn build(&self, element: &CommandElement) -> CommandResult<LutronCommand> {
        let mut props = Properties::default();
        for property in &element.properties {
            let value = property.value.as_str();
            match property.name.to_ascii_lowercase().as_str() {
                "command" => props.command = Some(value),
                "address" => props.address = Some(value),
                "scene" => props.scene = Some(value),
                "key" => props.key = Some(value),
                "level" => props.level = Some(value),
                _ => warn!(
                    command = %element.id,
                    property = %property.name,
                    "Unknown Lutron HomeWorks property"
                ),
            }
        }
        if props.level.is_none() {
            props.level = element.value.as_deref();
        }

        let name = props
            .command
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| CommandError::missing(element.id.as_str(), "command"))?;
        let verb = LutronVerb::from_name(name)
            .ok_or_else(|| CommandError::UnknownCommand(name.to_string()))?;

        let address_text = props
            .address
            .filter(|a| !a.trim().is_empty())
            .ok_or_else(|| CommandError::missing(verb.as_str(), "address"))?;
        let address = Address::parse(address_text).map_err(|e| CommandError::InvalidAddress {
            address: address_text.to_string(),
            source: Box::new(e),
        })?;

        let scene = optional_number("scene", props.scene)?;
        let key = optional_number("key", props.key)?;
        let level = optional_number("level", props.level)?;

        let gateway = self.gateway.clone();
        let command = match verb {
            LutronVerb::Dimmer(v) => {
                LutronCommand::Dimmer(DimmerCommand::build(v, address, level, gateway)?)
            }
            LutronVerb::GrafikEye(v) => {
                LutronCommand::GrafikEye(GrafikEyeCommand::build(v, address, scene, gateway)?)
            }
            LutronVerb::Keypad(v) => {
                LutronCommand::Keypad(KeypadCommand::build(v, address, key, gateway)?)
            }
        };
        Ok(command)
    }
}

fn optional_number(property: &'static str, value: Option<&str>) -> CommandResult<Option<u32>> {
    match value {
        Some(text) if !text.trim().is_empty() => CommandError::parse_number(property, text).map(Some),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LutronConfig;
    use hagw_core::Command;

    fn builder() -> LutronCommandBuilder {
        LutronCommandBuilder::new(LutronGateway::new(LutronConfig::default()))
    }

    fn element(props: &[(&str, &str)]) -> CommandElement {
        props
            .iter()
            .fold(CommandElement::new("test", PROTOCOL), |e, (n, v)| {
                e.with_property(*n, *v)
            })
    }

    #[test]
    fn test_build_fade() {
        let command = builder()
            .build(&element(&[
                ("command", "FADE"),
                ("address", "[01:01:00:02:04]"),
                ("level", "30"),
            ]))
            .unwrap();
        match command {
            LutronCommand::Dimmer(c) => assert_eq!(c.level(), Some(30)),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_property_names_ignore_case() {
        let command = builder()
            .build(&element(&[
                ("Command", "press"),
                ("ADDRESS", "1.4.1"),
                ("Key", "3"),
                ("colour", "blue"),
            ]))
            .unwrap();
        assert_eq!(command.name(), "PRESS");
    }

    #[test]
    fn test_level_from_dynamic_value() {
        let command = builder()
            .build(
                &element(&[("command", "FADE"), ("address", "1.1.0.2.4")]).with_value("55"),
            )
            .unwrap();
        match command {
            LutronCommand::Dimmer(c) => assert_eq!(c.level(), Some(55)),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_fade_without_level_fails() {
        let err = builder()
            .build(&element(&[("command", "FADE"), ("address", "1.1.0.2.4")]))
            .unwrap_err();
        assert!(matches!(
            err,
            CommandError::MissingProperty { property: "level", .. }
        ));
    }

    #[test]
    fn test_missing_address_fails() {
        for verb in ["RAISE", "SCENE", "PRESS", "STATUS_DIMMER"] {
            let err = builder()
                .build(&element(&[("command", verb), ("scene", "1"), ("key", "1")]))
                .unwrap_err();
            assert!(
                matches!(err, CommandError::MissingProperty { property: "address", .. }),
                "{verb}: {err}"
            );
        }
    }

    #[test]
    fn test_missing_command_fails() {
        let err = builder()
            .build(&element(&[("address", "1.4.1")]))
            .unwrap_err();
        assert!(matches!(
            err,
            CommandError::MissingProperty { property: "command", .. }
        ));
    }

    #[test]
    fn test_unknown_verb_fails() {
        let err = builder()
            .build(&element(&[("command", "BLINK"), ("address", "1.4.1")]))
            .unwrap_err();
        assert!(matches!(err, CommandError::UnknownCommand(name) if name == "BLINK"));
    }

    #[test]
    fn test_invalid_address_keeps_cause() {
        let err = builder()
            .build(&element(&[("command", "RAISE"), ("address", "[01:04:01")]))
            .unwrap_err();
        assert!(matches!(err, CommandError::InvalidAddress { .. }));
        let source = std::error::Error::source(&err).unwrap();
        assert!(source.to_string().contains("[01:04:01"));
    }

    #[test]
    fn test_invalid_number_fails() {
        let err = builder()
            .build(&element(&[
                ("command", "PRESS"),
                ("address", "1.4.1"),
                ("key", "first"),
            ]))
            .unwrap_err();
        assert!(matches!(
            err,
            CommandError::InvalidNumber { property: "key", .. }
        ));
    }

    #[test]
    fn test_address_must_match_capability() {
        let err = builder()
            .build(&element(&[
                ("command", "SCENE"),
                ("address", "1.1.0.2.4"),
                ("scene", "2"),
            ]))
            .unwrap_err();
        assert!(matches!(err, CommandError::WrongCapability { .. }));
    }
}
