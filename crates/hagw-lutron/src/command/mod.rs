//! Lutron HomeWorks commands
//!
//! Verbs form a closed set; [`LutronVerb::from_name`] maps a configured
//! verb name to the command family that implements it.

mod dimmer;
mod grafik_eye;
mod keypad;

pub use dimmer::{DimmerCommand, DimmerVerb};
pub use grafik_eye::{GrafikEyeCommand, GrafikEyeVerb};
pub use keypad::{KeypadCommand, KeypadVerb};

use std::fmt;
use std::sync::Arc;

use hagw_core::{Command, DeviceError, SharedSensor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LutronVerb {
    Dimmer(DimmerVerb),
    GrafikEye(GrafikEyeVerb),
    Keypad(KeypadVerb),
}

impl LutronVerb {
    /// Case-insensitive lookup
    pub fn from_name(name: &str) -> Option<Self> {
        let verb = match name.trim().to_ascii_uppercase().as_str() {
            "RAISE" => LutronVerb::Dimmer(DimmerVerb::Raise),
            "LOWER" => LutronVerb::Dimmer(DimmerVerb::Lower),
            "STOP" => LutronVerb::Dimmer(DimmerVerb::Stop),
            "FADE" => LutronVerb::Dimmer(DimmerVerb::Fade),
            "STATUS_DIMMER" => LutronVerb::Dimmer(DimmerVerb::Status),
            "SCENE" => LutronVerb::GrafikEye(GrafikEyeVerb::Scene),
            "STATUS_SCENE" => LutronVerb::GrafikEye(GrafikEyeVerb::Status),
            "PRESS" => LutronVerb::Keypad(KeypadVerb::Press),
            "RELEASE" => LutronVerb::Keypad(KeypadVerb::Release),
            "HOLD" => LutronVerb::Keypad(KeypadVerb::Hold),
            "DOUBLE_TAP" => LutronVerb::Keypad(KeypadVerb::DoubleTap),
            "STATUS_KEYPADLED" => LutronVerb::Keypad(KeypadVerb::LedStatus),
            _ => return None,
        };
        Some(verb)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LutronVerb::Dimmer(v) => v.as_str(),
            LutronVerb::GrafikEye(v) => v.as_str(),
            LutronVerb::Keypad(v) => v.as_str(),
        }
    }
}

impl fmt::Display for LutronVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A built Lutron command of any family
#[derive(Clone)]
pub enum LutronCommand {
    Dimmer(Arc<DimmerCommand>),
    GrafikEye(Arc<GrafikEyeCommand>),
    Keypad(Arc<KeypadCommand>),
}

impl Command for LutronCommand {
    fn name(&self) -> &str {
        match self {
            LutronCommand::Dimmer(c) => c.verb().as_str(),
            LutronCommand::GrafikEye(c) => c.verb().as_str(),
            LutronCommand::Keypad(c) => c.verb().as_str(),
        }
    }

    fn send(&self) {
        match self {
            LutronCommand::Dimmer(c) => c.send(),
            LutronCommand::GrafikEye(c) => c.send(),
            LutronCommand::Keypad(c) => c.send(),
        }
    }

    fn set_sensor(&self, sensor: SharedSensor) -> Result<(), DeviceError> {
        match self {
            LutronCommand::Dimmer(c) => c.set_sensor(sensor),
            LutronCommand::GrafikEye(c) => c.set_sensor(sensor),
            LutronCommand::Keypad(c) => c.set_sensor(sensor),
        }
    }

    fn stop(&self, sensor: &SharedSensor) {
        match self {
            LutronCommand::Dimmer(c) => c.stop(sensor),
            LutronCommand::GrafikEye(c) => c.stop(sensor),
            LutronCommand::Keypad(c) => c.stop(sensor),
        }
    }
}

impl fmt::Debug for LutronCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (verb, address) = match self {
            LutronCommand::Dimmer(c) => (c.verb().as_str(), c.address()),
            LutronCommand::GrafikEye(c) => (c.verb().as_str(), c.address()),
            LutronCommand::Keypad(c) => (c.verb().as_str(), c.address()),
        };
        f.debug_struct("LutronCommand")
            .field("verb", &verb)
            .field("address", &address.to_string())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verb_lookup() {
        assert_eq!(
            LutronVerb::from_name("fade"),
            Some(LutronVerb::Dimmer(DimmerVerb::Fade))
        );
        assert_eq!(
            LutronVerb::from_name(" STATUS_SCENE "),
            Some(LutronVerb::GrafikEye(GrafikEyeVerb::Status))
        );
        assert_eq!(
            LutronVerb::from_name("Double_Tap"),
            Some(LutronVerb::Keypad(KeypadVerb::DoubleTap))
        );
        assert_eq!(LutronVerb::from_name("DIM"), None);
    }

    #[test]
    fn test_verb_names_round_trip() {
        for name in [
            "RAISE",
            "LOWER",
            "STOP",
            "FADE",
            "STATUS_DIMMER",
            "SCENE",
            "STATUS_SCENE",
            "PRESS",
            "RELEASE",
            "HOLD",
            "DOUBLE_TAP",
            "STATUS_KEYPADLED",
        ] {
            let verb = LutronVerb::from_name(name).unwrap();
            assert_eq!(verb.as_str(), name);
        }
    }
}
