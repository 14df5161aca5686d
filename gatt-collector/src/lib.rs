//! A GATT profile collector engine.
//!
//! Implements the client ("collector") role of a handful of Bluetooth Low Energy profiles on top
//! of a generic per-connection state machine:
//!
//! * [Cycling Power](profile/cpp/index.html)
//! * [Cycling Speed and Cadence](profile/cscp/index.html)
//! * [Running Speed and Cadence](profile/rscp/index.html)
//! * [Location and Navigation](profile/lanp/index.html)
//! * [Phone Alert Status](profile/pasp/index.html)
//! * [Find Me (locator)](profile/findme/index.html)
//!
//! # Using the engine
//!
//! The engine is runtime and hardware-agnostic: It does not issue radio operations itself, and
//! does not need an RTOS. Everything it talks to is described by the [`Config`] trait:
//!
//! * A [`Profile`] describing the service, its characteristics and descriptors, and how their
//!   values are decoded.
//! * A [`GattClient`] transport that performs discovery, read and write procedures on the peer.
//! * An [`EventSink`] that delivers confirmations and values to the application tasks.
//! * A microsecond-precision [`Timer`], used to bound how long a procedure may stay outstanding.
//!
//! Application requests are fed into [`Collector::process_command`], transport events into
//! [`Collector::process_gatt`]. The platform should call [`Collector::check_timeouts`] whenever
//! the instant returned by [`Collector::next_deadline`] has passed.
//!
//! [`Config`]: config/trait.Config.html
//! [`Profile`]: profile/trait.Profile.html
//! [`GattClient`]: gatt/trait.GattClient.html
//! [`EventSink`]: collector/trait.EventSink.html
//! [`Timer`]: time/trait.Timer.html
//! [`Collector::process_command`]: collector/struct.Collector.html#method.process_command
//! [`Collector::process_gatt`]: collector/struct.Collector.html#method.process_gatt
//! [`Collector::check_timeouts`]: collector/struct.Collector.html#method.check_timeouts
//! [`Collector::next_deadline`]: collector/struct.Collector.html#method.next_deadline

// We're `#[no_std]`, except when we're testing
#![cfg_attr(not(test), no_std)]
// Deny a few warnings in doctests, since rustdoc `allow`s many warnings by default
#![doc(test(attr(deny(unused_imports, unused_must_use))))]
#![warn(rust_2018_idioms)]
// The claims of this lint are dubious, disable it
#![allow(clippy::trivially_copy_pass_by_ref)]

#[macro_use]
mod log;
#[macro_use]
mod utils;
pub mod att;
pub mod bytes;
pub mod collector;
pub mod config;
mod error;
pub mod gatt;
pub mod profile;
pub mod time;
pub mod uuid;

pub use self::error::Error;

/// Maximum number of simultaneous connections a collector tracks when no other size is chosen.
pub const MAX_CONNECTIONS: usize = 4;

/// Maximum number of value bytes that fit in a single write with the default ATT MTU of 23.
pub const MAX_WRITE_LEN: usize = 20;
