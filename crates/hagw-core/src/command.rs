//! Command-side plumbing: the common command interface, sensor sets and
//! device observer lists

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::error::DeviceError;
use crate::sensor::SharedSensor;

/// A configured command
///
/// `send` only queues; delivery happens on the gateway's writer task.
pub trait Command: Send + Sync {
    /// Verb name as configured
    fn name(&self) -> &str;

    fn send(&self);

    /// Start feeding `sensor`; the first sensor also registers the command
    /// with its device and triggers a status query
    fn set_sensor(&self, sensor: SharedSensor) -> Result<(), DeviceError>;

    /// Stop feeding `sensor`; the last one also deregisters from the device
    fn stop(&self, sensor: &SharedSensor);
}

/// Sensors attached to one command
#[derive(Default)]
pub struct SensorSet {
    sensors: Mutex<Vec<SharedSensor>>,
}

impl SensorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if this was the first sensor
    pub fn add(&self, sensor: SharedSensor) -> bool {
        let mut sensors = self.sensors.lock();
        sensors.push(sensor);
        sensors.len() == 1
    }

    /// Returns true if `sensor` was the last one
    pub fn remove(&self, sensor: &SharedSensor) -> bool {
        let mut sensors = self.sensors.lock();
        let before = sensors.len();
        sensors.retain(|s| !Arc::ptr_eq(s, sensor));
        before != sensors.len() && sensors.is_empty()
    }

    pub fn snapshot(&self) -> Vec<SharedSensor> {
        self.sensors.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.sensors.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.lock().is_empty()
    }
}

/// Commands interested in one device, held weakly
pub struct Observers<C> {
    entries: Mutex<Vec<Weak<C>>>,
}

impl<C> Observers<C> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn add_weak(&self, command: Weak<C>) {
        let mut entries = self.entries.lock();
        if !entries.iter().any(|e| e.ptr_eq(&command)) {
            entries.push(command);
        }
    }

    pub fn remove(&self, command: &Weak<C>) {
        self.entries.lock().retain(|e| !e.ptr_eq(command));
    }

    /// Live observers; dropped commands are pruned
    pub fn snapshot(&self) -> Vec<Arc<C>> {
        let mut entries = self.entries.lock();
        entries.retain(|e| e.strong_count() > 0);
        entries.iter().filter_map(Weak::upgrade).collect()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<C> Default for Observers<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::SensorKind;
    use crate::testing::RecordingSensor;

    #[test]
    fn test_sensor_set_first_and_last() {
        let set = SensorSet::new();
        let a: SharedSensor = Arc::new(RecordingSensor::new("a", SensorKind::Switch));
        let b: SharedSensor = Arc::new(RecordingSensor::new("b", SensorKind::Range));

        assert!(set.add(a.clone()));
        assert!(!set.add(b.clone()));
        assert!(!set.remove(&a));
        assert!(!set.remove(&a));
        assert!(set.remove(&b));
        assert!(set.is_empty());
    }

    #[test]
    fn test_observers_are_weak_and_deduplicated() {
        let observers = Observers::new();
        let first = Arc::new(1u8);
        let second = Arc::new(2u8);
        observers.add_weak(Arc::downgrade(&first));
        observers.add_weak(Arc::downgrade(&first));
        observers.add_weak(Arc::downgrade(&second));
        assert_eq!(observers.len(), 2);

        drop(second);
        assert_eq!(observers.snapshot().len(), 1);

        observers.remove(&Arc::downgrade(&first));
        assert!(observers.is_empty());
    }
}
