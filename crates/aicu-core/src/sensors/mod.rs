// src/sensors/mod.rs
//! Sensor channel registry.
//!
//! A channel is a string key, a colour for its graph and a [`ReadValue`]
//! source. [`SensorRegistry::measure`] reads every enabled channel at once and
//! stamps the set with the measurement time, so a [`SampleRecord`] always
//! holds values taken together.

use alloc::boxed::Box;
use alloc::vec::Vec;

use embedded_graphics::pixelcolor::Rgb565;
use log::{debug, warn};

use crate::pipeline::record::{Reading, SampleRecord};

/// Synchronous source of one measured value.
pub trait ReadValue {
    fn read(&mut self) -> f32;
}

impl<F: FnMut() -> f32> ReadValue for F {
    fn read(&mut self) -> f32 {
        self()
    }
}

/// One registered channel.
pub struct SensorDef {
    pub key: &'static str,
    pub color: Rgb565,
    pub enabled: bool,
    pub show_graph: bool,
    value: f32,
    source: Box<dyn ReadValue>,
}

impl SensorDef {
    pub fn value(&self) -> f32 {
        self.value
    }
}

/// A channel selected for plotting, as seen by the graph layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphChannel {
    pub key: &'static str,
    pub color: Rgb565,
    pub value: f32,
}

#[derive(Default)]
pub struct SensorRegistry {
    sensors: Vec<SensorDef>,
    timestamp_ms: u64,
}

impl SensorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a channel. Registering an existing key replaces its source.
    pub fn register(
        &mut self,
        key: &'static str,
        color: Rgb565,
        enabled: bool,
        show_graph: bool,
        source: impl ReadValue + 'static,
    ) -> &mut Self {
        let def = SensorDef {
            key,
            color,
            enabled,
            show_graph,
            value: 0.0,
            source: Box::new(source),
        };
        match self.sensors.iter_mut().find(|s| s.key == key) {
            Some(existing) => {
                warn!("Sensor {} registered twice, replacing", key);
                *existing = def;
            }
            None => self.sensors.push(def),
        }
        self
    }

    /// Returns `false` if the key is unknown.
    pub fn enable(&mut self, key: &str, enabled: bool) -> bool {
        self.find_mut(key).map(|s| s.enabled = enabled).is_some()
    }

    /// Returns `false` if the key is unknown.
    pub fn show_graph(&mut self, key: &str, show: bool) -> bool {
        self.find_mut(key).map(|s| s.show_graph = show).is_some()
    }

    /// Read all enabled channels and remember when.
    pub fn measure(&mut self, now_ms: u64) {
        self.timestamp_ms = now_ms;
        for sensor in self.sensors.iter_mut().filter(|s| s.enabled) {
            sensor.value = sensor.source.read();
        }
        debug!(" Measured {} channels at {} ms", self.enabled_count(), now_ms);
    }

    /// Last measured value, `None` for unknown keys.
    pub fn value(&self, key: &str) -> Option<f32> {
        self.sensors.iter().find(|s| s.key == key).map(|s| s.value)
    }

    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    pub fn enabled_count(&self) -> usize {
        self.sensors.iter().filter(|s| s.enabled).count()
    }

    pub fn graph_count(&self) -> usize {
        self.graph_channels().count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SensorDef> {
        self.sensors.iter()
    }

    /// Enabled channels with plotting switched on, in registration order.
    pub fn graph_channels(&self) -> impl Iterator<Item = GraphChannel> + '_ {
        self.sensors
            .iter()
            .filter(|s| s.enabled && s.show_graph)
            .map(|s| GraphChannel {
                key: s.key,
                color: s.color,
                value: s.value,
            })
    }

    /// Export the last measurement of every enabled channel.
    pub fn record(&self) -> SampleRecord {
        SampleRecord {
            timestamp_ms: self.timestamp_ms,
            readings: self
                .sensors
                .iter()
                .filter(|s| s.enabled)
                .map(|s| Reading {
                    key: s.key,
                    value: s.value,
                })
                .collect(),
        }
    }

    fn find_mut(&mut self, key: &str) -> Option<&mut SensorDef> {
        self.sensors.iter_mut().find(|s| s.key == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::prelude::*;

    fn registry() -> SensorRegistry {
        let mut counter = 0.0_f32;
        let mut sensors = SensorRegistry::new();
        sensors
            .register("temp", Rgb565::RED, true, true, || 21.5_f32)
            .register("count", Rgb565::GREEN, true, false, move || {
                counter += 1.0;
                counter
            })
            .register("off", Rgb565::BLUE, false, true, || 99.0_f32);
        sensors
    }

    #[test]
    fn test_measure_reads_enabled_channels_only() {
        let mut sensors = registry();
        sensors.measure(1_000);
        sensors.measure(1_100);

        assert_eq!(sensors.value("temp"), Some(21.5));
        assert_eq!(sensors.value("count"), Some(2.0));
        assert_eq!(sensors.value("off"), Some(0.0));
        assert_eq!(sensors.value("missing"), None);
        assert_eq!(sensors.timestamp_ms(), 1_100);
    }

    #[test]
    fn test_counts_and_graph_channels() {
        let mut sensors = registry();
        assert_eq!(sensors.enabled_count(), 2);
        assert_eq!(sensors.graph_count(), 1);

        assert!(sensors.enable("off", true));
        assert!(sensors.show_graph("count", true));
        assert!(!sensors.enable("missing", true));

        let keys: Vec<_> = sensors.graph_channels().map(|c| c.key).collect();
        assert_eq!(keys, vec!["temp", "count", "off"]);
    }

    #[test]
    fn test_record_contains_enabled_values() {
        let mut sensors = registry();
        sensors.measure(42);
        let record = sensors.record();

        assert_eq!(record.timestamp_ms, 42);
        let keys: Vec<_> = record.readings.iter().map(|r| r.key).collect();
        assert_eq!(keys, vec!["temp", "count"]);
    }

    #[test]
    fn test_register_same_key_replaces() {
        let mut sensors = registry();
        sensors.register("temp", Rgb565::WHITE, true, true, || 5.0_f32);
        sensors.measure(0);
        assert_eq!(sensors.len(), 3);
        assert_eq!(sensors.value("temp"), Some(5.0));
    }
}
