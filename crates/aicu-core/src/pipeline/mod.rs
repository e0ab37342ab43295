//! Sample pipeline from the measurement page to the backend.
//!
//! ```text
//! FixedPeriodScheduler -> SensorRegistry::record -> BatchAccumulator
//!     --try_send--> DELIVERY_CHANNEL --receive--> DeliveryTask -> Transport
//! ```
//!
//! The producer side runs in the UI loop and never waits: a full queue drops
//! the batch. The consumer side is a separate task that owns the network.

pub mod batcher;
pub mod delivery;
pub mod record;
pub mod scheduler;

pub use batcher::{BatchAccumulator, BatchReceiver, BatchSender, DeliveryChannel, HandOff};
pub use delivery::{DeliveryError, DeliveryTarget, DeliveryTask, Transport};
pub use record::{Batch, Reading, SampleRecord};
pub use scheduler::FixedPeriodScheduler;
