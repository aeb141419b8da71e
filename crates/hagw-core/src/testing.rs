//! Test helpers shared by the protocol crates

use parking_lot::Mutex;

use crate::sensor::{Sensor, SensorKind};

/// Sensor that remembers every value it was given
#[derive(Debug)]
pub struct RecordingSensor {
    id: String,
    kind: SensorKind,
    updates: Mutex<Vec<String>>,
}

impl RecordingSensor {
    pub fn new(id: impl Into<String>, kind: SensorKind) -> Self {
        Self {
            id: id.into(),
            kind,
            updates: Mutex::new(Vec::new()),
        }
    }

    pub fn updates(&self) -> Vec<String> {
        self.updates.lock().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.updates.lock().last().cloned()
    }

    pub fn clear(&self) {
        self.updates.lock().clear();
    }
}

impl Sensor for RecordingSensor {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> SensorKind {
        self.kind
    }

    fn update(&self, value: &str) {
        self.updates.lock().push(value.to_string());
    }
}
