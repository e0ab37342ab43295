// src/pipeline/delivery.rs
//! Background delivery of finished batches.
//!
//! The [`DeliveryTask`] owns the consumer end of the delivery queue and a
//! [`Transport`]. It waits on the queue, encodes each batch as JSON and sends
//! it once. Failures are logged and the batch is dropped; there is no retry.

use core::fmt::Debug;

use alloc::string::String;

use log::{debug, info, warn};
use thiserror_no_std::Error;

use super::batcher::BatchReceiver;
use super::record::Batch;

/// Destination of a batch on the backend.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeliveryTarget {
    pub flow_id: String,
    pub filename: String,
}

impl DeliveryTarget {
    pub fn new(flow_id: &str, filename: &str) -> Self {
        Self {
            flow_id: String::from(flow_id),
            filename: String::from(filename),
        }
    }
}

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Could not encode batch")]
    Encode,
    #[error("Not logged in")]
    Unauthorized,
    #[error("Connection failed")]
    Connection,
    #[error("Server answered with status {0}")]
    Status(u16),
}

/// Network side of the pipeline.
#[allow(async_fn_in_trait)]
pub trait Transport {
    type Error: Debug;

    /// Send one encoded batch to `target`.
    async fn send_batch(&mut self, target: &DeliveryTarget, body: &[u8]) -> Result<(), Self::Error>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryStats {
    pub delivered: u32,
    pub failed: u32,
}

pub struct DeliveryTask<'a, T: Transport> {
    receiver: BatchReceiver<'a>,
    transport: T,
    stats: DeliveryStats,
}

impl<'a, T: Transport> DeliveryTask<'a, T> {
    pub fn new(receiver: BatchReceiver<'a>, transport: T) -> Self {
        Self {
            receiver,
            transport,
            stats: DeliveryStats::default(),
        }
    }

    /// Deliver batches forever, in queue order.
    pub async fn run(&mut self) -> ! {
        info!("Delivery task started");
        loop {
            let batch = self.receiver.receive().await;
            self.deliver(batch).await;
        }
    }

    /// Deliver everything that is queued right now. Returns how many batches
    /// were taken off the queue.
    pub async fn drain(&mut self) -> usize {
        let mut taken = 0;
        while let Ok(batch) = self.receiver.try_receive() {
            self.deliver(batch).await;
            taken += 1;
        }
        taken
    }

    /// Send one batch. The batch is consumed whatever the outcome.
    pub async fn deliver(&mut self, batch: Batch) -> bool {
        let body = match batch.to_json() {
            Ok(body) => body,
            Err(e) => {
                warn!("Dropping batch, JSON encoding failed: {:?}", e);
                self.stats.failed = self.stats.failed.wrapping_add(1);
                return false;
            }
        };

        match self.transport.send_batch(&batch.target, &body).await {
            Ok(()) => {
                debug!(" Delivered {} records ({} bytes)", batch.len(), body.len());
                self.stats.delivered = self.stats.delivered.wrapping_add(1);
                true
            }
            Err(e) => {
                warn!("Delivery of {} records failed: {:?}", batch.len(), e);
                self.stats.failed = self.stats.failed.wrapping_add(1);
                false
            }
        }
    }

    pub fn stats(&self) -> DeliveryStats {
        self.stats
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DELIVERY_QUEUE_CAPACITY;
    use crate::pipeline::batcher::{BatchAccumulator, DeliveryChannel, HandOff};
    use crate::pipeline::record::{Reading, SampleRecord};
    use embassy_futures::block_on;
    use embassy_futures::select::select;
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
    use embassy_sync::channel::Channel;
    use embassy_sync::signal::Signal;

    /// Remembers every body it is given and fails on request.
    #[derive(Default)]
    struct RecordingTransport {
        sent: Vec<(DeliveryTarget, String)>,
        fail_next: bool,
    }

    impl Transport for RecordingTransport {
        type Error = DeliveryError;

        async fn send_batch(&mut self, target: &DeliveryTarget, body: &[u8]) -> Result<(), Self::Error> {
            if core::mem::take(&mut self.fail_next) {
                return Err(DeliveryError::Status(500));
            }
            self.sent
                .push((target.clone(), String::from_utf8_lossy(body).into_owned()));
            Ok(())
        }
    }

    /// Raises `done` once `expected` batches have been attempted.
    struct CountingTransport<'a> {
        inner: RecordingTransport,
        attempts: usize,
        expected: usize,
        done: &'a Signal<CriticalSectionRawMutex, ()>,
    }

    impl Transport for CountingTransport<'_> {
        type Error = DeliveryError;

        async fn send_batch(&mut self, target: &DeliveryTarget, body: &[u8]) -> Result<(), Self::Error> {
            let result = self.inner.send_batch(target, body).await;
            self.attempts += 1;
            if self.attempts == self.expected {
                self.done.signal(());
            }
            result
        }
    }

    fn record(ms: u64) -> SampleRecord {
        SampleRecord {
            timestamp_ms: ms,
            readings: vec![Reading { key: "v", value: 1.0 }],
        }
    }

    #[test]
    fn test_overflowing_batch_is_dropped_rest_delivered_in_order() {
        let channel: DeliveryChannel = Channel::new();
        let mut batcher = BatchAccumulator::new(channel.sender(), 1);
        batcher.retarget("dev", DeliveryTarget::new("flow", "file"));

        let outcomes: Vec<_> = (0..=DELIVERY_QUEUE_CAPACITY as u64)
            .map(|ms| batcher.push(record(ms)))
            .collect();
        assert_eq!(outcomes.last(), Some(&HandOff::Dropped));

        let mut task = DeliveryTask::new(channel.receiver(), RecordingTransport::default());
        assert_eq!(block_on(task.drain()), DELIVERY_QUEUE_CAPACITY);

        let sent = &task.transport().sent;
        assert_eq!(sent.len(), DELIVERY_QUEUE_CAPACITY);
        for (ms, (target, body)) in sent.iter().enumerate() {
            assert_eq!(target.filename, "file");
            assert_eq!(body, &format!(r#"[{{"id":"dev","ms":{},"v":1.0}}]"#, ms));
        }
        assert_eq!(task.stats().delivered, DELIVERY_QUEUE_CAPACITY as u32);
    }

    #[test]
    fn test_failed_delivery_is_not_retried() {
        let channel: DeliveryChannel = Channel::new();
        let mut batcher = BatchAccumulator::new(channel.sender(), 1);
        batcher.push(record(1));
        batcher.push(record(2));

        let transport = RecordingTransport {
            fail_next: true,
            ..Default::default()
        };
        let mut task = DeliveryTask::new(channel.receiver(), transport);
        assert_eq!(block_on(task.drain()), 2);

        assert_eq!(task.transport().sent.len(), 1);
        assert!(task.transport().sent[0].1.contains(r#""ms":2"#));
        assert_eq!(task.stats(), DeliveryStats { delivered: 1, failed: 1 });
    }

    #[test]
    fn test_run_delivers_queued_batches_in_order() {
        let channel: DeliveryChannel = Channel::new();
        let mut batcher = BatchAccumulator::new(channel.sender(), 1);
        for ms in 1..=3 {
            batcher.push(record(ms));
        }

        let done: Signal<CriticalSectionRawMutex, ()> = Signal::new();
        let transport = CountingTransport {
            inner: RecordingTransport {
                fail_next: true,
                ..Default::default()
            },
            attempts: 0,
            expected: 3,
            done: &done,
        };
        let mut task = DeliveryTask::new(channel.receiver(), transport);
        block_on(select(task.run(), done.wait()));

        // the failure does not stop the loop
        let sent = &task.transport().inner.sent;
        assert_eq!(sent.len(), 2);
        assert!(sent[0].1.contains(r#""ms":2"#));
        assert!(sent[1].1.contains(r#""ms":3"#));
        assert_eq!(task.stats(), DeliveryStats { delivered: 2, failed: 1 });
        assert!(channel.is_empty());
    }
}
