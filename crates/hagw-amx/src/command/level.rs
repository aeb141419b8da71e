use std::sync::{Arc, Weak};

use hagw_core::{CommandError, CommandResult, DeviceError, SensorKind, SensorSet, SharedSensor};
use tracing::{debug, warn};

use super::update_sensor_with_value;
use crate::device::Levels;
use crate::gateway::AmxGateway;
use crate::message::AmxMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelVerb {
    Send,
    Status,
}

impl LevelVerb {
    pub fn as_str(&self) -> &'static str {
        match self {
            LevelVerb::Send => "SEND_LEVEL",
            LevelVerb::Status => "LEVEL_STATUS",
        }
    }
}

/// Sets or watches one level of a device index
pub struct LevelCommand {
    verb: LevelVerb,
    device_index: u32,
    level: u32,
    value: Option<i32>,
    gateway: AmxGateway,
    sensors: SensorSet,
    this: Weak<LevelCommand>,
}

impl LevelCommand {
    pub fn build(
        verb: LevelVerb,
        device_index: u32,
        level: Option<u32>,
        value: Option<&str>,
        gateway: AmxGateway,
    ) -> CommandResult<Arc<Self>> {
        let level = level.ok_or_else(|| CommandError::missing(verb.as_str(), "level"))?;
        let value = match verb {
            LevelVerb::Send => {
                let text = value
                    .filter(|v| !v.trim().is_empty())
                    .ok_or_else(|| CommandError::missing(verb.as_str(), "value"))?;
                Some(CommandError::parse_number::<i32>("value", text)?)
            }
            LevelVerb::Status => None,
        };
        Ok(Arc::new_cyclic(|this| Self {
            verb,
            device_index,
            level,
            value,
            gateway,
            sensors: SensorSet::new(),
            this: this.clone(),
        }))
    }

    pub fn verb(&self) -> LevelVerb {
        self.verb
    }

    pub fn device_index(&self) -> u32 {
        self.device_index
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn value(&self) -> Option<i32> {
        self.value
    }

    pub fn send(&self) {
        match (self.verb, self.value) {
            (LevelVerb::Send, Some(value)) => self.gateway.send_command(
                AmxMessage::new("SEND_LEVEL", self.device_index)
                    .field(self.level)
                    .field(value),
            ),
            _ => debug!(device_index = self.device_index, level = self.level, "Nothing to send"),
        }
    }

    pub fn set_sensor(&self, sensor: SharedSensor) -> Result<(), DeviceError> {
        let levels = self.gateway.levels(self.device_index)?;
        if self.sensors.add(sensor) {
            levels.add_command(self.this.clone());
            self.gateway.send_command(
                AmxMessage::new("LEVEL_STATUS", self.device_index).field(self.level),
            );
        }
        Ok(())
    }

    pub fn stop(&self, sensor: &SharedSensor) {
        if self.sensors.remove(sensor) {
            match self.gateway.levels(self.device_index) {
                Ok(levels) => levels.remove_command(&self.this),
                Err(e) => warn!(%e, "Cannot deregister from device"),
            }
        }
    }

    /// Called by the device after `level` changed
    pub fn update_sensors(&self, levels: &Levels, level: u32) {
        if level != self.level {
            return;
        }
        let Some(value) = levels.value(level) else {
            return;
        };
        for sensor in self.sensors.snapshot() {
            match sensor.kind() {
                SensorKind::Range | SensorKind::Level => update_sensor_with_value(&sensor, &value),
                kind => warn!(
                    sensor = sensor.id(),
                    %kind,
                    "Level commands only feed range and level sensors"
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AmxConfig;
    use hagw_core::testing::RecordingSensor;

    #[test]
    fn test_level_is_mandatory() {
        let gw = AmxGateway::new(AmxConfig::default());
        let err = LevelCommand::build(LevelVerb::Status, 1, None, None, gw)
            .err()
            .unwrap();
        assert!(matches!(
            err,
            CommandError::MissingProperty {
                property: "level",
                ..
            }
        ));
    }

    #[test]
    fn test_send_level_needs_numeric_value() {
        let gw = AmxGateway::new(AmxConfig::default());
        let missing = LevelCommand::build(LevelVerb::Send, 1, Some(2), None, gw.clone())
            .err()
            .unwrap();
        assert!(matches!(
            missing,
            CommandError::MissingProperty {
                property: "value",
                ..
            }
        ));
        let invalid = LevelCommand::build(LevelVerb::Send, 1, Some(2), Some("half"), gw)
            .err()
            .unwrap();
        assert!(matches!(
            invalid,
            CommandError::InvalidNumber {
                property: "value",
                ..
            }
        ));
    }

    #[test]
    fn test_send_and_status() {
        let gw = AmxGateway::new(AmxConfig::default());
        LevelCommand::build(LevelVerb::Send, 1, Some(2), Some("80"), gw.clone())
            .unwrap()
            .send();
        let status = LevelCommand::build(LevelVerb::Status, 1, Some(2), None, gw.clone()).unwrap();
        let range = Arc::new(RecordingSensor::new("range", SensorKind::Range));
        let level = Arc::new(RecordingSensor::new("level", SensorKind::Level));
        let switch = Arc::new(RecordingSensor::new("switch", SensorKind::Switch));
        status.set_sensor(range.clone()).unwrap();
        status.set_sensor(level.clone()).unwrap();
        status.set_sensor(switch.clone()).unwrap();

        let sent: Vec<String> = std::iter::from_fn(|| gw.queue().poll())
            .map(|m| m.to_string())
            .collect();
        assert_eq!(sent, vec!["SEND_LEVEL, 1, 2, 80", "LEVEL_STATUS, 1, 2"]);

        let levels = gw.levels(1).unwrap();
        levels.process_update(2, "255");
        levels.process_update(3, "7");
        assert_eq!(range.updates(), vec!["255"]);
        assert_eq!(level.updates(), vec!["100"]);
        assert!(switch.updates().is_empty());
    }
}
