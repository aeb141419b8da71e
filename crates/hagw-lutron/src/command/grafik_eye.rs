use std::sync::{Arc, Weak};

use hagw_core::{CommandError, CommandResult, DeviceError, SensorKind, SensorSet, SharedSensor};
use tracing::{debug, warn};

use crate::address::Address;
use crate::device::GrafikEye;
use crate::gateway::LutronGateway;
use crate::message::LutronMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrafikEyeVerb {
    Scene,
    Status,
}

impl GrafikEyeVerb {
    pub fn as_str(&self) -> &'static str {
        match self {
            GrafikEyeVerb::Scene => "SCENE",
            GrafikEyeVerb::Status => "STATUS_SCENE",
        }
    }
}

/// Scene selection on a GRAFIK Eye
///
/// A status command with a scene reports "on" to switch sensors while that
/// scene is selected.
pub struct GrafikEyeCommand {
    verb: GrafikEyeVerb,
    address: Address,
    scene: Option<u32>,
    gateway: LutronGateway,
    sensors: SensorSet,
    this: Weak<GrafikEyeCommand>,
}

impl GrafikEyeCommand {
    pub fn build(
        verb: GrafikEyeVerb,
        address: Address,
        scene: Option<u32>,
        gateway: LutronGateway,
    ) -> CommandResult<Arc<Self>> {
        if verb == GrafikEyeVerb::Scene && scene.is_none() {
            return Err(CommandError::missing(verb.as_str(), "scene"));
        }
        if !address.is_valid_grafik_eye_address() {
            return Err(CommandError::WrongCapability {
                address: address.to_string(),
                capability: "GRAFIK Eye",
            });
        }
        Ok(Arc::new_cyclic(|this| Self {
            verb,
            address,
            scene,
            gateway,
            sensors: SensorSet::new(),
            this: this.clone(),
        }))
    }

    pub fn verb(&self) -> GrafikEyeVerb {
        self.verb
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn scene(&self) -> Option<u32> {
        self.scene
    }

    pub fn send(&self) {
        match (self.verb, self.scene) {
            (GrafikEyeVerb::Scene, Some(scene)) => self
                .gateway
                .send_command(LutronMessage::with_parameter("GSS", &self.address, scene)),
            _ => debug!(verb = self.verb.as_str(), address = %self.address, "Nothing to send"),
        }
    }

    pub fn set_sensor(&self, sensor: SharedSensor) -> Result<(), DeviceError> {
        let grafik_eye = self.gateway.grafik_eye(&self.address)?;
        if self.sensors.add(sensor) {
            grafik_eye.add_command(self.this.clone());
            self.gateway
                .send_command(LutronMessage::for_address("RGS", &self.address));
        }
        Ok(())
    }

    pub fn stop(&self, sensor: &SharedSensor) {
        if self.sensors.remove(sensor) {
            match self.gateway.grafik_eye(&self.address) {
                Ok(grafik_eye) => grafik_eye.remove_command(&self.this),
                Err(e) => warn!(%e, "Cannot deregister from device"),
            }
        }
    }

    pub fn update_sensors(&self, grafik_eye: &GrafikEye) {
        for sensor in self.sensors.snapshot() {
            self.update_sensor(grafik_eye, &sensor);
        }
    }

    fn update_sensor(&self, grafik_eye: &GrafikEye, sensor: &SharedSensor) {
        let Some(selected) = grafik_eye.selected_scene() else {
            return;
        };
        match sensor.kind() {
            SensorKind::Switch => {
                let on = self.scene == Some(selected);
                sensor.update(if on { "on" } else { "off" });
            }
            SensorKind::Range | SensorKind::Level => sensor.update(&selected.to_string()),
            SensorKind::Custom => warn!(
                sensor = sensor.id(),
                address = %self.address,
                "GRAFIK Eye commands only feed switch and range sensors"
            ),
        }
    }
}
