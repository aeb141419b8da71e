//! Per-gateway device cache

use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;

use parking_lot::Mutex;

use crate::error::DeviceError;

/// Devices keyed by address, created on first reference
///
/// `D` is normally an enum over the protocol's device types; lookups
/// project it onto the type the caller needs and fail if the cached device
/// has a different type.
pub struct DeviceCache<K, D> {
    devices: Mutex<HashMap<K, D>>,
}

impl<K, D> DeviceCache<K, D>
where
    K: Eq + Hash + Clone + Display,
    D: Clone,
{
    pub fn new() -> Self {
        Self {
            devices: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch the device at `key`, creating it with `create` if absent
    ///
    /// Lookup and insertion happen under one lock, so concurrent callers
    /// always share the same instance.
    pub fn get_or_create<T>(
        &self,
        key: &K,
        expected: &'static str,
        create: impl FnOnce() -> D,
        project: impl FnOnce(&D) -> Option<T>,
    ) -> Result<T, DeviceError> {
        let mut devices = self.devices.lock();
        let device = devices.entry(key.clone()).or_insert_with(create);
        project(device).ok_or_else(|| DeviceError {
            key: key.to_string(),
            expected,
        })
    }

    pub fn get(&self, key: &K) -> Option<D> {
        self.devices.lock().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.devices.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, D> Default for DeviceCache<K, D>
where
    K: Eq + Hash + Clone + Display,
    D: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
