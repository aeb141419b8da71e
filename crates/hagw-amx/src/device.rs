//! Device facets of an AMX device index
//!
//! Channels, levels, strings and commands of one device index are cached
//! as separate devices keyed by `(index, kind)`.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use hagw_core::Observers;
use parking_lot::Mutex;

use crate::command::{ChannelCommand, LevelCommand, TextCommand, TextKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    Channels,
    Levels,
    Strings,
    Commands,
}

impl DeviceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceKind::Channels => "channels",
            DeviceKind::Levels => "levels",
            DeviceKind::Strings => "strings",
            DeviceKind::Commands => "commands",
        }
    }
}

impl From<TextKind> for DeviceKind {
    fn from(kind: TextKind) -> Self {
        match kind {
            TextKind::String => DeviceKind::Strings,
            TextKind::Command => DeviceKind::Commands,
        }
    }
}

/// Cache key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceKey {
    pub index: u32,
    pub kind: DeviceKind,
}

impl fmt::Display for DeviceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.index, self.kind.as_str())
    }
}

/// Channel states of one device index
pub struct Channels {
    index: u32,
    states: Mutex<HashMap<u32, bool>>,
    observers: Observers<ChannelCommand>,
}

impl Channels {
    pub fn new(index: u32) -> Self {
        Self {
            index,
            states: Mutex::new(HashMap::new()),
            observers: Observers::new(),
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn state(&self, channel: u32) -> Option<bool> {
        self.states.lock().get(&channel).copied()
    }

    pub fn add_command(&self, command: Weak<ChannelCommand>) {
        self.observers.add_weak(command);
    }

    pub fn remove_command(&self, command: &Weak<ChannelCommand>) {
        self.observers.remove(command);
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub fn process_update(&self, channel: u32, on: bool) {
        self.states.lock().insert(channel, on);
        for command in self.observers.snapshot() {
            command.update_sensors(self, channel);
        }
    }
}

/// Level values of one device index, kept as reported
pub struct Levels {
    index: u32,
    values: Mutex<HashMap<u32, String>>,
    observers: Observers<LevelCommand>,
}

impl Levels {
    pub fn new(index: u32) -> Self {
        Self {
            index,
            values: Mutex::new(HashMap::new()),
            observers: Observers::new(),
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn value(&self, level: u32) -> Option<String> {
        self.values.lock().get(&level).cloned()
    }

    pub fn add_command(&self, command: Weak<LevelCommand>) {
        self.observers.add_weak(command);
    }

    pub fn remove_command(&self, command: &Weak<LevelCommand>) {
        self.observers.remove(command);
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub fn process_update(&self, level: u32, value: &str) {
        self.values.lock().insert(level, value.to_string());
        for command in self.observers.snapshot() {
            command.update_sensors(self, level);
        }
    }
}

/// Last string or command read from one device index
pub struct TextDevice {
    index: u32,
    kind: TextKind,
    last: Mutex<Option<String>>,
    observers: Observers<TextCommand>,
}

impl TextDevice {
    pub fn new(index: u32, kind: TextKind) -> Self {
        Self {
            index,
            kind,
            last: Mutex::new(None),
            observers: Observers::new(),
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn kind(&self) -> TextKind {
        self.kind
    }

    pub fn last(&self) -> Option<String> {
        self.last.lock().clone()
    }

    pub fn add_command(&self, command: Weak<TextCommand>) {
        self.observers.add_weak(command);
    }

    pub fn remove_command(&self, command: &Weak<TextCommand>) {
        self.observers.remove(command);
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub fn process_update(&self, text: &str) {
        *self.last.lock() = Some(text.to_string());
        for command in self.observers.snapshot() {
            command.update_sensors(text);
        }
    }
}

/// Entry in the gateway's device cache
#[derive(Clone)]
pub enum AmxDevice {
    Channels(Arc<Channels>),
    Levels(Arc<Levels>),
    Text(Arc<TextDevice>),
}

impl AmxDevice {
    pub(crate) fn create(key: DeviceKey) -> Self {
        match key.kind {
            DeviceKind::Channels => AmxDevice::Channels(Arc::new(Channels::new(key.index))),
            DeviceKind::Levels => AmxDevice::Levels(Arc::new(Levels::new(key.index))),
            DeviceKind::Strings => {
                AmxDevice::Text(Arc::new(TextDevice::new(key.index, TextKind::String)))
            }
            DeviceKind::Commands => {
                AmxDevice::Text(Arc::new(TextDevice::new(key.index, TextKind::Command)))
            }
        }
    }

    pub(crate) fn as_channels(&self) -> Option<Arc<Channels>> {
        match self {
            AmxDevice::Channels(c) => Some(c.clone()),
            _ => None,
        }
    }

    pub(crate) fn as_levels(&self) -> Option<Arc<Levels>> {
        match self {
            AmxDevice::Levels(l) => Some(l.clone()),
            _ => None,
        }
    }

    pub(crate) fn as_text(&self) -> Option<Arc<TextDevice>> {
        match self {
            AmxDevice::Text(t) => Some(t.clone()),
            _ => None,
        }
    }
}
