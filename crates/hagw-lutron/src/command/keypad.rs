use std::sync::{Arc, Weak};

use hagw_core::{CommandError, CommandResult, DeviceError, SensorKind, SensorSet, SharedSensor};
use tracing::{debug, warn};

use crate::address::Address;
use crate::device::Keypad;
use crate::gateway::LutronGateway;
use crate::message::LutronMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeypadVerb {
    Press,
    Release,
    Hold,
    DoubleTap,
    LedStatus,
}

impl KeypadVerb {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeypadVerb::Press => "PRESS",
            KeypadVerb::Release => "RELEASE",
            KeypadVerb::Hold => "HOLD",
            KeypadVerb::DoubleTap => "DOUBLE_TAP",
            KeypadVerb::LedStatus => "STATUS_KEYPADLED",
        }
    }

    fn wire_verb(&self) -> Option<&'static str> {
        match self {
            KeypadVerb::Press => Some("KBP"),
            KeypadVerb::Release => Some("KBR"),
            KeypadVerb::Hold => Some("KBH"),
            KeypadVerb::DoubleTap => Some("KBDT"),
            KeypadVerb::LedStatus => None,
        }
    }
}

/// Button action on one keypad key, or the LED of that key
pub struct KeypadCommand {
    verb: KeypadVerb,
    address: Address,
    key: u32,
    gateway: LutronGateway,
    sensors: SensorSet,
    this: Weak<KeypadCommand>,
}

impl KeypadCommand {
    pub fn build(
        verb: KeypadVerb,
        address: Address,
        key: Option<u32>,
        gateway: LutronGateway,
    ) -> CommandResult<Arc<Self>> {
        let key = key.ok_or_else(|| CommandError::missing(verb.as_str(), "key"))?;
        if !address.is_valid_keypad_address() {
            return Err(CommandError::WrongCapability {
                address: address.to_string(),
                capability: "keypad",
            });
        }
        Ok(Arc::new_cyclic(|this| Self {
            verb,
            address,
            key,
            gateway,
            sensors: SensorSet::new(),
            this: this.clone(),
        }))
    }

    pub fn verb(&self) -> KeypadVerb {
        self.verb
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn key(&self) -> u32 {
        self.key
    }

    pub fn send(&self) {
        match self.verb.wire_verb() {
            Some(verb) => self
                .gateway
                .send_command(LutronMessage::with_parameter(verb, &self.address, self.key)),
            None => debug!(verb = self.verb.as_str(), address = %self.address, "Nothing to send"),
        }
    }

    pub fn set_sensor(&self, sensor: SharedSensor) -> Result<(), DeviceError> {
        let keypad = self.gateway.keypad(&self.address)?;
        if self.sensors.add(sensor) {
            keypad.add_command(self.this.clone());
            self.gateway
                .send_command(LutronMessage::for_address("RKLS", &self.address));
        }
        Ok(())
    }

    pub fn stop(&self, sensor: &SharedSensor) {
        if self.sensors.remove(sensor) {
            match self.gateway.keypad(&self.address) {
                Ok(keypad) => keypad.remove_command(&self.this),
                Err(e) => warn!(%e, "Cannot deregister from device"),
            }
        }
    }

    pub fn update_sensors(&self, keypad: &Keypad) {
        for sensor in self.sensors.snapshot() {
            self.update_sensor(keypad, &sensor);
        }
    }

    fn update_sensor(&self, keypad: &Keypad, sensor: &SharedSensor) {
        if sensor.kind() != SensorKind::Switch {
            warn!(
                sensor = sensor.id(),
                address = %self.address,
                "Keypad commands only feed switch sensors"
            );
            return;
        }
        match keypad.led_status(self.key) {
            Some(led) => sensor.update(if led == 1 { "on" } else { "off" }),
            None => warn!(
                address = %self.address,
                key = self.key,
                "No LED state reported for key"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LutronConfig;
    use hagw_core::testing::RecordingSensor;

    fn addr(text: &str) -> Address {
        Address::parse(text).unwrap()
    }

    #[test]
    fn test_key_is_mandatory() {
        let gw = LutronGateway::new(LutronConfig::default());
        let err = KeypadCommand::build(KeypadVerb::Press, addr("1.4.1"), None, gw)
            .err()
            .unwrap();
        assert!(matches!(
            err,
            CommandError::MissingProperty { property: "key", .. }
        ));
    }

    #[test]
    fn test_rejects_dimmer_address() {
        let gw = LutronGateway::new(LutronConfig::default());
        let err = KeypadCommand::build(KeypadVerb::Press, addr("1.1.0.2.4"), Some(1), gw)
            .err()
            .unwrap();
        assert!(matches!(err, CommandError::WrongCapability { .. }));
    }

    #[test]
    fn test_button_messages() {
        let gw = LutronGateway::new(LutronConfig::default());
        for verb in [
            KeypadVerb::Press,
            KeypadVerb::Release,
            KeypadVerb::Hold,
            KeypadVerb::DoubleTap,
            KeypadVerb::LedStatus,
        ] {
            KeypadCommand::build(verb, addr("1.8.2.5"), Some(4), gw.clone())
                .unwrap()
                .send();
        }
        let sent: Vec<String> = std::iter::from_fn(|| gw.queue().poll())
            .map(|m| m.to_string())
            .collect();
        assert_eq!(
            sent,
            vec![
                "KBP, [01:08:02:05], 4",
                "KBR, [01:08:02:05], 4",
                "KBH, [01:08:02:05], 4",
                "KBDT, [01:08:02:05], 4",
            ]
        );
    }

    #[test]
    fn test_led_feeds_switch() {
        let gw = LutronGateway::new(LutronConfig::default());
        let address = addr("1.4.1");
        let command =
            KeypadCommand::build(KeypadVerb::LedStatus, address.clone(), Some(2), gw.clone())
                .unwrap();
        let switch = Arc::new(RecordingSensor::new("led", SensorKind::Switch));
        let range = Arc::new(RecordingSensor::new("range", SensorKind::Range));
        command.set_sensor(switch.clone()).unwrap();
        command.set_sensor(range.clone()).unwrap();

        let keypad = gw.keypad(&address).unwrap();
        keypad.process_update("0100");
        keypad.process_update("0000");
        keypad.process_update("0");

        assert_eq!(switch.updates(), vec!["on", "off"]);
        assert!(range.updates().is_empty());
    }
}
