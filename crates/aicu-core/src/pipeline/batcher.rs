use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender, TrySendError};

extern crate alloc;
use alloc::string::String;
use alloc::vec::Vec;

use log::{debug, warn};

use super::delivery::DeliveryTarget;
use super::record::{Batch, SampleRecord};
use crate::config::DELIVERY_QUEUE_CAPACITY;

/// Bounded queue between the sampling loop and the delivery task
pub type DeliveryChannel = Channel<CriticalSectionRawMutex, Batch, DELIVERY_QUEUE_CAPACITY>;

/// Producer end, held by the [`BatchAccumulator`]
pub type BatchSender<'a> = Sender<'a, CriticalSectionRawMutex, Batch, DELIVERY_QUEUE_CAPACITY>;

/// Consumer end, held by the [`DeliveryTask`](super::delivery::DeliveryTask)
pub type BatchReceiver<'a> = Receiver<'a, CriticalSectionRawMutex, Batch, DELIVERY_QUEUE_CAPACITY>;

/// What happened to a record pushed into the accumulator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandOff {
    /// Kept in the current batch
    Buffered,
    /// Completed a batch that is now queued for delivery
    Queued,
    /// Completed a batch that was discarded because the queue was full
    Dropped,
}

/// In-memory batch builder for measurement records
///
/// Records are collected until the configured batch size is reached. The
/// finished batch moves into the delivery queue with a non-blocking
/// `try_send`; when the queue is full the batch is dropped and counted. Either
/// way the accumulator starts a fresh batch, so the sampling loop is never
/// held up by the network.
///
/// ## Usage
///
/// ```rust,ignore
/// static DELIVERY_CHANNEL: DeliveryChannel = Channel::new();
///
/// let mut batcher = BatchAccumulator::new(DELIVERY_CHANNEL.sender(), 32);
/// batcher.retarget("device", DeliveryTarget::new("flow", "file"));
///
/// // every sampling tick
/// batcher.push(sensors.record());
/// ```
pub struct BatchAccumulator<'a> {
    /// Records of the batch being built
    records: Vec<SampleRecord>,
    batch_size: usize,
    device_id: String,
    target: DeliveryTarget,
    /// Producer end of the delivery queue
    sender: BatchSender<'a>,
    queued_batches: u32,
    dropped_batches: u32,
}

impl<'a> BatchAccumulator<'a> {
    /// Create a new accumulator sending onto `sender`. A batch size of zero is
    /// treated as one.
    pub fn new(sender: BatchSender<'a>, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            records: Vec::with_capacity(batch_size),
            batch_size,
            device_id: String::new(),
            target: DeliveryTarget::default(),
            sender,
            queued_batches: 0,
            dropped_batches: 0,
        }
    }

    /// Tag batches completed from now on with a new device id and destination.
    pub fn retarget(&mut self, device_id: &str, target: DeliveryTarget) {
        self.device_id = String::from(device_id);
        self.target = target;
    }

    /// Append a record, handing the batch off once it is full.
    pub fn push(&mut self, record: SampleRecord) -> HandOff {
        self.records.push(record);
        if self.records.len() >= self.batch_size {
            self.hand_off()
        } else {
            HandOff::Buffered
        }
    }

    /// Hand off a partial batch. `None` if there is nothing to send.
    pub fn flush(&mut self) -> Option<HandOff> {
        if self.records.is_empty() {
            return None;
        }
        Some(self.hand_off())
    }

    fn hand_off(&mut self) -> HandOff {
        let records = core::mem::replace(&mut self.records, Vec::with_capacity(self.batch_size));
        let batch = Batch {
            device_id: self.device_id.clone(),
            target: self.target.clone(),
            records,
        };

        match self.sender.try_send(batch) {
            Ok(()) => {
                self.queued_batches = self.queued_batches.wrapping_add(1);
                debug!(" Batch queued for delivery");
                HandOff::Queued
            }
            Err(TrySendError::Full(batch)) => {
                self.dropped_batches = self.dropped_batches.wrapping_add(1);
                warn!(
                    "Delivery queue full, dropped batch of {} records ({} dropped so far)",
                    batch.len(),
                    self.dropped_batches
                );
                HandOff::Dropped
            }
        }
    }

    /// Records in the batch being built
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn queued_batches(&self) -> u32 {
        self.queued_batches
    }

    /// Batches discarded because the delivery queue was full
    pub fn dropped_batches(&self) -> u32 {
        self.dropped_batches
    }
}
