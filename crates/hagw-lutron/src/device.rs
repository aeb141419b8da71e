//! Cached state of the physical units on the processor links
//!
//! Each device keeps its last reported value and the commands observing
//! it. `process_update` stores the new value and lets every observer push
//! it to its sensors.

use std::sync::{Arc, Weak};

use hagw_core::Observers;
use parking_lot::Mutex;
use tracing::warn;

use crate::address::Address;
use crate::command::{DimmerCommand, GrafikEyeCommand, KeypadCommand};

/// Dimmer (or single GRAFIK Eye zone)
pub struct Dimmer {
    address: Address,
    level: Mutex<Option<u32>>,
    observers: Observers<DimmerCommand>,
}

impl Dimmer {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            level: Mutex::new(None),
            observers: Observers::new(),
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Last reported level in percent
    pub fn level(&self) -> Option<u32> {
        *self.level.lock()
    }

    pub fn add_command(&self, command: Weak<DimmerCommand>) {
        self.observers.add_weak(command);
    }

    pub fn remove_command(&self, command: &Weak<DimmerCommand>) {
        self.observers.remove(command);
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Apply a `DL` level, integer or decimal
    pub fn process_update(&self, parameter: &str) {
        let level = match parse_level(parameter) {
            Some(level) => level,
            None => {
                warn!(address = %self.address, parameter, "Invalid dimmer level");
                return;
            }
        };
        *self.level.lock() = Some(level);
        for command in self.observers.snapshot() {
            command.update_sensors(self);
        }
    }
}

fn parse_level(text: &str) -> Option<u32> {
    let text = text.trim();
    if let Ok(level) = text.parse::<u32>() {
        return Some(level);
    }
    let level = text.parse::<f64>().ok()?;
    if level.is_finite() && level >= 0.0 {
        Some(level.round() as u32)
    } else {
        None
    }
}

/// Keypad with one LED per button
pub struct Keypad {
    address: Address,
    leds: Mutex<Vec<u8>>,
    observers: Observers<KeypadCommand>,
}

impl Keypad {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            leds: Mutex::new(Vec::new()),
            observers: Observers::new(),
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    /// LED state of `key` (1-based): 0 off, 1 on, 2/3 flashing
    pub fn led_status(&self, key: u32) -> Option<u8> {
        let index = usize::try_from(key).ok()?.checked_sub(1)?;
        self.leds.lock().get(index).copied()
    }

    pub fn add_command(&self, command: Weak<KeypadCommand>) {
        self.observers.add_weak(command);
    }

    pub fn remove_command(&self, command: &Weak<KeypadCommand>) {
        self.observers.remove(command);
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Apply a `KLS` LED string, one digit per LED
    pub fn process_update(&self, parameter: &str) {
        let leds: Vec<u8> = parameter
            .chars()
            .filter_map(|c| c.to_digit(10))
            .map(|d| d as u8)
            .collect();
        *self.leds.lock() = leds;
        for command in self.observers.snapshot() {
            command.update_sensors(self);
        }
    }
}

/// GRAFIK Eye scene controller
pub struct GrafikEye {
    address: Address,
    scene: Mutex<Option<u32>>,
    observers: Observers<GrafikEyeCommand>,
}

impl GrafikEye {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            scene: Mutex::new(None),
            observers: Observers::new(),
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn selected_scene(&self) -> Option<u32> {
        *self.scene.lock()
    }

    pub fn add_command(&self, command: Weak<GrafikEyeCommand>) {
        self.observers.add_weak(command);
    }

    pub fn remove_command(&self, command: &Weak<GrafikEyeCommand>) {
        self.observers.remove(command);
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Apply a `GSS` scene number
    pub fn process_update(&self, parameter: &str) {
        let scene = match parameter.trim().parse::<u32>() {
            Ok(scene) => scene,
            Err(_) => {
                warn!(address = %self.address, parameter, "Invalid scene number");
                return;
            }
        };
        *self.scene.lock() = Some(scene);
        for command in self.observers.snapshot() {
            command.update_sensors(self);
        }
    }
}

/// Entry in the gateway's device cache
#[derive(Clone)]
pub enum LutronDevice {
    Dimmer(Arc<Dimmer>),
    Keypad(Arc<Keypad>),
    GrafikEye(Arc<GrafikEye>),
}

impl LutronDevice {
    pub fn kind_name(&self) -> &'static str {
        match self {
            LutronDevice::Dimmer(_) => "Dimmer",
            LutronDevice::Keypad(_) => "Keypad",
            LutronDevice::GrafikEye(_) => "GrafikEye",
        }
    }

    pub(crate) fn as_dimmer(&self) -> Option<Arc<Dimmer>> {
        match self {
            LutronDevice::Dimmer(d) => Some(d.clone()),
            _ => None,
        }
    }

    pub(crate) fn as_keypad(&self) -> Option<Arc<Keypad>> {
        match self {
            LutronDevice::Keypad(k) => Some(k.clone()),
            _ => None,
        }
    }

    pub(crate) fn as_grafik_eye(&self) -> Option<Arc<GrafikEye>> {
        match self {
            LutronDevice::GrafikEye(g) => Some(g.clone()),
            _ => None,
        }
    }
}
