use std::sync::{Arc, Weak};

use hagw_core::{CommandError, CommandResult, DeviceError, SensorKind, SensorSet, SharedSensor};
use tracing::{debug, warn};

use crate::device::Channels;
use crate::gateway::AmxGateway;
use crate::message::AmxMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelVerb {
    On,
    Off,
    Pulse,
    Status,
}

impl ChannelVerb {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelVerb::On => "ON",
            ChannelVerb::Off => "OFF",
            ChannelVerb::Pulse => "PULSE",
            ChannelVerb::Status => "CHANNEL_STATUS",
        }
    }
}

/// Switches, pulses or watches one channel of a device index
pub struct ChannelCommand {
    verb: ChannelVerb,
    device_index: u32,
    channel: u32,
    pulse_time: Option<u32>,
    gateway: AmxGateway,
    sensors: SensorSet,
    this: Weak<ChannelCommand>,
}

impl ChannelCommand {
    pub fn build(
        verb: ChannelVerb,
        device_index: u32,
        channel: Option<u32>,
        pulse_time: Option<u32>,
        gateway: AmxGateway,
    ) -> CommandResult<Arc<Self>> {
        let channel = channel.ok_or_else(|| CommandError::missing(verb.as_str(), "channel"))?;
        Ok(Arc::new_cyclic(|this| Self {
            verb,
            device_index,
            channel,
            pulse_time,
            gateway,
            sensors: SensorSet::new(),
            this: this.clone(),
        }))
    }

    pub fn verb(&self) -> ChannelVerb {
        self.verb
    }

    pub fn device_index(&self) -> u32 {
        self.device_index
    }

    pub fn channel(&self) -> u32 {
        self.channel
    }

    pub fn send(&self) {
        let message = match self.verb {
            ChannelVerb::On | ChannelVerb::Off => {
                AmxMessage::new(self.verb.as_str(), self.device_index).field(self.channel)
            }
            ChannelVerb::Pulse => {
                let message = AmxMessage::new("PULSE", self.device_index).field(self.channel);
                match self.pulse_time {
                    Some(time) => message.field(time),
                    None => message,
                }
            }
            ChannelVerb::Status => {
                debug!(device_index = self.device_index, channel = self.channel, "Nothing to send");
                return;
            }
        };
        self.gateway.send_command(message);
    }

    pub fn set_sensor(&self, sensor: SharedSensor) -> Result<(), DeviceError> {
        let channels = self.gateway.channels(self.device_index)?;
        if self.sensors.add(sensor) {
            channels.add_command(self.this.clone());
            self.gateway.send_command(
                AmxMessage::new("CHANNEL_STATUS", self.device_index).field(self.channel),
            );
        }
        Ok(())
    }

    pub fn stop(&self, sensor: &SharedSensor) {
        if self.sensors.remove(sensor) {
            match self.gateway.channels(self.device_index) {
                Ok(channels) => channels.remove_command(&self.this),
                Err(e) => warn!(%e, "Cannot deregister from device"),
            }
        }
    }

    /// Called by the device after `channel` changed
    pub fn update_sensors(&self, channels: &Channels, channel: u32) {
        if channel != self.channel {
            return;
        }
        let Some(on) = channels.state(channel) else {
            return;
        };
        for sensor in self.sensors.snapshot() {
            match sensor.kind() {
                SensorKind::Switch => sensor.update(if on { "on" } else { "off" }),
                kind => warn!(
                    sensor = sensor.id(),
                    %kind,
                    "Channel commands only feed switch sensors"
                ),
            }
        }
    }
}
