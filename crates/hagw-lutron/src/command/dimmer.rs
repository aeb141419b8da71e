use std::sync::{Arc, Weak};

use hagw_core::{CommandError, CommandResult, DeviceError, SensorKind, SensorSet, SharedSensor};
use tracing::{debug, warn};

use crate::address::Address;
use crate::device::Dimmer;
use crate::gateway::LutronGateway;
use crate::message::LutronMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimmerVerb {
    Raise,
    Lower,
    Stop,
    Fade,
    Status,
}

impl DimmerVerb {
    pub fn as_str(&self) -> &'static str {
        match self {
            DimmerVerb::Raise => "RAISE",
            DimmerVerb::Lower => "LOWER",
            DimmerVerb::Stop => "STOP",
            DimmerVerb::Fade => "FADE",
            DimmerVerb::Status => "STATUS_DIMMER",
        }
    }
}

/// Command driving a dimmer or a single GRAFIK Eye zone
pub struct DimmerCommand {
    verb: DimmerVerb,
    address: Address,
    level: Option<u32>,
    gateway: LutronGateway,
    sensors: SensorSet,
    this: Weak<DimmerCommand>,
}

impl DimmerCommand {
    pub fn build(
        verb: DimmerVerb,
        address: Address,
        level: Option<u32>,
        gateway: LutronGateway,
    ) -> CommandResult<Arc<Self>> {
        if !address.is_valid_dimmer_address() && !address.is_valid_grafik_eye_single_zone_address()
        {
            return Err(CommandError::WrongCapability {
                address: address.to_string(),
                capability: "dimmer",
            });
        }
        if verb == DimmerVerb::Fade && level.is_none() {
            return Err(CommandError::missing(verb.as_str(), "level"));
        }
        Ok(Arc::new_cyclic(|this| Self {
            verb,
            address,
            level,
            gateway,
            sensors: SensorSet::new(),
            this: this.clone(),
        }))
    }

    pub fn verb(&self) -> DimmerVerb {
        self.verb
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn level(&self) -> Option<u32> {
        self.level
    }

    pub fn send(&self) {
        let message = match (self.verb, self.level) {
            (DimmerVerb::Raise, _) => LutronMessage::for_address("RAISEDIM", &self.address),
            (DimmerVerb::Lower, _) => LutronMessage::for_address("LOWERDIM", &self.address),
            (DimmerVerb::Stop, _) => LutronMessage::for_address("STOPDIM", &self.address),
            (DimmerVerb::Fade, Some(level)) => LutronMessage::fade(level, &self.address),
            (DimmerVerb::Fade, None) | (DimmerVerb::Status, _) => {
                debug!(verb = self.verb.as_str(), address = %self.address, "Nothing to send");
                return;
            }
        };
        self.gateway.send_command(message);
    }

    fn query(&self) {
        self.gateway
            .send_command(LutronMessage::for_address("RDL", &self.address));
    }

    pub fn set_sensor(&self, sensor: SharedSensor) -> Result<(), DeviceError> {
        let dimmer = self.gateway.dimmer(&self.address)?;
        if self.sensors.add(sensor) {
            dimmer.add_command(self.this.clone());
            self.query();
        }
        Ok(())
    }

    pub fn stop(&self, sensor: &SharedSensor) {
        if self.sensors.remove(sensor) {
            match self.gateway.dimmer(&self.address) {
                Ok(dimmer) => dimmer.remove_command(&self.this),
                Err(e) => warn!(%e, "Cannot deregister from device"),
            }
        }
    }

    pub fn update_sensors(&self, dimmer: &Dimmer) {
        for sensor in self.sensors.snapshot() {
            self.update_sensor(dimmer, &sensor);
        }
    }

    fn update_sensor(&self, dimmer: &Dimmer, sensor: &SharedSensor) {
        let Some(level) = dimmer.level() else {
            return;
        };
        match sensor.kind() {
            SensorKind::Switch => sensor.update(if level != 0 { "on" } else { "off" }),
            SensorKind::Range => sensor.update(&level.to_string()),
            SensorKind::Level => sensor.update(&level.min(100).to_string()),
            SensorKind::Custom => warn!(
                sensor = sensor.id(),
                address = %self.address,
                "Dimmer commands only feed switch, range and level sensors"
            ),
        }
    }
}
