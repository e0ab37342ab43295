//! Hardware-independent core library for aicu-rs
//!
//! This crate contains the platform-agnostic pieces of the aicu measurement
//! device: the two-button gesture recognisers, the page manager and its pages,
//! the hierarchical menu model, the on-screen keyboard, the sensor registry and
//! the sample pipeline that batches readings and hands them to a background
//! delivery task.
//!
//! It is `no_std` (with `alloc`) and has no ESP32-specific dependencies, so the
//! firmware, the desktop simulator and the host test suite all share it.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod api;
pub mod app_state;
pub mod board;
pub mod config;
pub mod input;
pub mod pages;
pub mod pipeline;
pub mod sensors;
pub mod ui;

#[cfg(test)]
pub(crate) mod testing;
