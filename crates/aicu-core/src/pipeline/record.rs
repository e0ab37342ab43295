// src/pipeline/record.rs
//! Measurement records and their JSON form.
//!
//! A batch serialises as a JSON array with one object per record:
//!
//! ```json
//! [{"id":"aicu-device","ms":1200,"temp":21.46,"hum":40.1}]
//! ```
//!
//! `id` is the device name, `ms` the monotonic time of the measurement and
//! every further key a sensor channel rounded to two decimals.

use alloc::string::String;
use alloc::vec::Vec;

use serde::ser::{SerializeMap, SerializeSeq, Serializer};
use serde::Serialize;

use super::delivery::DeliveryTarget;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub key: &'static str,
    pub value: f32,
}

/// All enabled channels measured at one instant.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SampleRecord {
    pub timestamp_ms: u64,
    pub readings: Vec<Reading>,
}

/// Records handed to the delivery task in one piece.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub device_id: String,
    pub target: DeliveryTarget,
    pub records: Vec<SampleRecord>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Request body for the write-values endpoint.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

impl Serialize for Batch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.records.len()))?;
        for record in &self.records {
            seq.serialize_element(&RecordJson {
                device_id: &self.device_id,
                record,
            })?;
        }
        seq.end()
    }
}

struct RecordJson<'a> {
    device_id: &'a str,
    record: &'a SampleRecord,
}

impl Serialize for RecordJson<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.record.readings.len() + 2))?;
        map.serialize_entry("id", self.device_id)?;
        map.serialize_entry("ms", &self.record.timestamp_ms)?;
        for reading in &self.record.readings {
            map.serialize_entry(reading.key, &two_decimals(reading.value))?;
        }
        map.end()
    }
}

/// Round half away from zero. Non-finite values become `null`.
fn two_decimals(value: f32) -> Option<f64> {
    if !value.is_finite() {
        return None;
    }
    let scaled = f64::from(value) * 100.0;
    let rounded = if scaled >= 0.0 { scaled + 0.5 } else { scaled - 0.5 };
    Some((rounded as i64) as f64 / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(ms: u64, temp: f32, hum: f32) -> SampleRecord {
        SampleRecord {
            timestamp_ms: ms,
            readings: vec![
                Reading { key: "temp", value: temp },
                Reading { key: "hum", value: hum },
            ],
        }
    }

    #[test]
    fn test_two_decimals() {
        assert_eq!(two_decimals(21.456), Some(21.46));
        assert_eq!(two_decimals(-3.333), Some(-3.33));
        assert_eq!(two_decimals(2.0), Some(2.0));
        assert_eq!(two_decimals(f32::NAN), None);
    }

    #[test]
    fn test_batch_json_layout() {
        let batch = Batch {
            device_id: "dev".into(),
            target: DeliveryTarget::new("flow", "file"),
            records: vec![record(1_000, 21.456, 40.0), record(1_100, 21.5, f32::INFINITY)],
        };

        let json = String::from_utf8(batch.to_json().unwrap()).unwrap();
        assert_eq!(
            json,
            r#"[{"id":"dev","ms":1000,"temp":21.46,"hum":40.0},{"id":"dev","ms":1100,"temp":21.5,"hum":null}]"#
        );
    }

    #[test]
    fn test_empty_batch_is_empty_array() {
        let batch = Batch {
            device_id: "dev".into(),
            target: DeliveryTarget::new("flow", "file"),
            records: Vec::new(),
        };
        assert!(batch.is_empty());
        assert_eq!(batch.to_json().unwrap(), b"[]");
    }
}
