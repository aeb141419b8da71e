//! Sensor abstraction and the status cache behind it
//!
//! Gateways only ever call [`Sensor::update`]; what a sensor does with the
//! value is up to the implementation. [`CachedSensor`] writes it into a
//! shared [`StatusCache`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// What kind of value a sensor expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    /// "on" / "off"
    Switch,
    /// Unbounded integer
    Range,
    /// Integer in 0..=100
    Level,
    /// Free-form state text
    #[serde(alias = "state")]
    Custom,
}

impl SensorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorKind::Switch => "switch",
            SensorKind::Range => "range",
            SensorKind::Level => "level",
            SensorKind::Custom => "custom",
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SensorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "switch" => Ok(SensorKind::Switch),
            "range" => Ok(SensorKind::Range),
            "level" => Ok(SensorKind::Level),
            "custom" | "state" => Ok(SensorKind::Custom),
            other => Err(format!("unknown sensor type '{other}'")),
        }
    }
}

/// Receiver of decoded device values
pub trait Sensor: Send + Sync {
    fn id(&self) -> &str;

    fn kind(&self) -> SensorKind;

    /// Push a new value
    fn update(&self, value: &str);
}

pub type SharedSensor = Arc<dyn Sensor>;

/// Latest value per sensor id
#[derive(Debug, Default)]
pub struct StatusCache {
    values: RwLock<HashMap<String, String>>,
}

impl StatusCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&self, sensor_id: &str, value: &str) {
        let previous = self
            .values
            .write()
            .insert(sensor_id.to_string(), value.to_string());
        if previous.as_deref() != Some(value) {
            debug!(sensor = sensor_id, value, "Status changed");
        }
    }

    pub fn get(&self, sensor_id: &str) -> Option<String> {
        self.values.read().get(sensor_id).cloned()
    }

    /// All values, sorted by sensor id
    pub fn snapshot(&self) -> Vec<(String, String)> {
        let mut values: Vec<_> = self
            .values
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        values.sort();
        values
    }
}

/// Sensor that records into a [`StatusCache`]
pub struct CachedSensor {
    id: String,
    kind: SensorKind,
    cache: Arc<StatusCache>,
}

impl CachedSensor {
    pub fn new(id: impl Into<String>, kind: SensorKind, cache: Arc<StatusCache>) -> Self {
        Self {
            id: id.into(),
            kind,
            cache,
        }
    }
}

impl Sensor for CachedSensor {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> SensorKind {
        self.kind
    }

    fn update(&self, value: &str) {
        self.cache.update(&self.id, value);
    }
}

impl fmt::Debug for CachedSensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedSensor")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .finish()
    }
}
