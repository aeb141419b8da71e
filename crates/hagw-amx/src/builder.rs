//! Builds AMX commands from `<command protocol="amx_ni">` elements

use hagw_core::{CommandElement, CommandError, CommandResult};
use tracing::warn;

use crate::command::{
    AmxCommand, AmxVerb, ChannelCommand, LevelCommand, StatusFilter, TextCommand,
};
use crate::gateway::AmxGateway;

pub const PROTOCOL: &str = "amx_ni";

#[derive(Default)]
struct Properties<'a> {
    command: Option<&'a str>,
    device_index: Option<&'a str>,
    channel: Option<&'a str>,
    level: Option<&'a str>,
    value: Option<&'a str>,
    pulse_time: Option<&'a str>,
    status_filter: Option<&'a str>,
    status_filter_group: Option<&'a str>,
}

#[derive(Clone)]
pub struct AmxCommandBuilder {
    gateway: AmxGateway,
}

impl AmxCommandBuilder {
    pub fn new(gateway: AmxGateway) -> Self {
        Self { gateway }
    }

    pub fn build(&self, element: &CommandElement) -> CommandResult<AmxCommand> {
        let mut props = Properties::default();
        for property in &element.properties {
            let value = property.value.as_str();
            match property.name.to_ascii_lowercase().as_str() {
                "name" => {}
                "command" => props.command = Some(value),
                "deviceindex" => props.device_index = Some(value),
                "channel" => props.channel = Some(value),
                "level" => props.level = Some(value),
                "value" => props.value = Some(value),
                "pulsetime" => props.pulse_time = Some(value),
                "statusfilter" => props.status_filter = Some(value),
                "statusfiltergroup" => props.status_filter_group = Some(value),
                _ => warn!(
                    command = %element.id,
                    property = %property.name,
                    "Unknown AMX NI property"
                ),
            }
        }
        if props.value.is_none() {
            props.value = element.value.as_deref();
        }

        let name = props
            .command
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| CommandError::missing(element.id.as_str(), "command"))?;
        let verb =
            AmxVerb::from_name(name).ok_or_else(|| CommandError::UnknownCommand(name.to_string()))?;

        let device_index = optional_number("deviceIndex", props.device_index)?
            .ok_or_else(|| CommandError::missing(verb.as_str(), "deviceIndex"))?;
        let channel = optional_number("channel", props.channel)?;
        let level = optional_number("level", props.level)?;
        let pulse_time = optional_number("pulseTime", props.pulse_time)?;
        let group = optional_number("statusFilterGroup", props.status_filter_group)?
            .map(|g| g as usize);
        let pattern = props.status_filter.filter(|p| !p.is_empty());
        if let (Some(pattern), AmxVerb::Channel(_) | AmxVerb::Level(_)) = (pattern, verb) {
            warn!(verb = verb.as_str(), pattern, "Status filter ignored");
        }

        let gateway = self.gateway.clone();
        let command = match verb {
            AmxVerb::Channel(v) => AmxCommand::Channel(ChannelCommand::build(
                v,
                device_index,
                channel,
                pulse_time,
                gateway,
            )?),
            AmxVerb::Level(v) => AmxCommand::Level(LevelCommand::build(
                v,
                device_index,
                level,
                props.value,
                gateway,
            )?),
            AmxVerb::Text(kind, v) => AmxCommand::Text(TextCommand::build(
                kind,
                v,
                device_index,
                props.value,
                status_filter(pattern, group)?,
                gateway,
            )?),
        };
        Ok(command)
    }
}

fn status_filter(
    pattern: Option<&str>,
    group: Option<usize>,
) -> CommandResult<Option<StatusFilter>> {
    pattern
        .map(|pattern| {
            StatusFilter::new(pattern, group).map_err(|e| CommandError::InvalidFilter {
                pattern: pattern.to_string(),
                source: Box::new(e),
            })
        })
        .transpose()
}

fn optional_number(property: &'static str, value: Option<&str>) -> CommandResult<Option<u32>> {
    match value {
        Some(text) if !text.trim().is_empty() => CommandError::parse_number(property, text).map(Some),
        _ => Ok(None),
    }
}
