//! Commands and sensors of one command file, bound to the configured gateways

use std::collections::BTreeMap;
use std::sync::Arc;

use hagw_amx::{AmxCommandBuilder, AmxGateway};
use hagw_core::{CachedSensor, Command, CommandFile, SharedSensor, StatusCache};
use hagw_lutron::{LutronCommandBuilder, LutronGateway};
use tracing::{error, info, warn};

use crate::config::DaemonConfig;

pub struct Controller {
    commands: BTreeMap<String, Box<dyn Command>>,
    sensors: Vec<(String, SharedSensor)>,
    cache: Arc<StatusCache>,
    lutron: Option<LutronGateway>,
    amx: Option<AmxGateway>,
}

impl Controller {
    /// Build every command of `file`; broken commands are logged and skipped
    pub fn build(config: &DaemonConfig, file: &CommandFile) -> Self {
        let lutron = config.lutron.clone().map(LutronGateway::new);
        let amx = config.amx.clone().map(AmxGateway::new);
        let lutron_builder = lutron.clone().map(LutronCommandBuilder::new);
        let amx_builder = amx.clone().map(AmxCommandBuilder::new);

        let mut commands: BTreeMap<String, Box<dyn Command>> = BTreeMap::new();
        for element in &file.commands {
            let built: Result<Box<dyn Command>, _> = match element.protocol.as_str() {
                hagw_lutron::PROTOCOL => match &lutron_builder {
                    Some(builder) => builder
                        .build(element)
                        .map(|c| Box::new(c) as Box<dyn Command>),
                    None => {
                        warn!(command = %element.id, "No [lutron] gateway configured");
                        continue;
                    }
                },
                hagw_amx::PROTOCOL => match &amx_builder {
                    Some(builder) => builder
                        .build(element)
                        .map(|c| Box::new(c) as Box<dyn Command>),
                    None => {
                        warn!(command = %element.id, "No [amx] gateway configured");
                        continue;
                    }
                },
                other => {
                    warn!(command = %element.id, protocol = other, "Unknown protocol");
                    continue;
                }
            };
            match built {
                Ok(command) => {
                    if commands.insert(element.id.clone(), command).is_some() {
                        warn!(command = %element.id, "Duplicate command id, keeping the last");
                    }
                }
                Err(e) => error!(command = %element.id, error = %e, "Cannot build command"),
            }
        }
        info!(commands = commands.len(), "Commands built");

        Self {
            commands,
            sensors: Vec::new(),
            cache: Arc::new(StatusCache::new()),
            lutron,
            amx,
        }
    }

    /// Attach a cached sensor for each binding whose command exists
    pub fn bind_sensors(&mut self, file: &CommandFile) {
        for binding in &file.sensors {
            let Some(command) = self.commands.get(&binding.command) else {
                warn!(sensor = %binding.id, command = %binding.command, "Sensor bound to unknown command");
                continue;
            };
            let sensor: SharedSensor = Arc::new(CachedSensor::new(
                binding.id.clone(),
                binding.kind,
                self.cache.clone(),
            ));
            match command.set_sensor(sensor.clone()) {
                Ok(()) => self.sensors.push((binding.command.clone(), sensor)),
                Err(e) => error!(sensor = %binding.id, error = %e, "Cannot bind sensor"),
            }
        }
        info!(sensors = self.sensors.len(), "Sensors bound");
    }

    /// Execute the command `id`; false if there is none
    pub fn send(&self, id: &str) -> bool {
        match self.commands.get(id) {
            Some(command) => {
                info!(command = id, verb = command.name(), "Sending");
                command.send();
                true
            }
            None => false,
        }
    }

    pub fn command_ids(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    pub fn status(&self) -> Vec<(String, String)> {
        self.cache.snapshot()
    }

    pub fn start(&self) {
        if let Some(gw) = &self.lutron {
            gw.start();
        }
        if let Some(gw) = &self.amx {
            gw.start();
        }
    }

    /// Detach all sensors and stop the gateways
    pub fn shutdown(&mut self) {
        for (command_id, sensor) in self.sensors.drain(..) {
            if let Some(command) = self.commands.get(&command_id) {
                command.stop(&sensor);
            }
        }
        if let Some(gw) = &self.lutron {
            gw.shutdown();
        }
        if let Some(gw) = &self.amx {
            gw.shutdown();
        }
    }
}
