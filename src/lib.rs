#![no_std]

//! An efficient decoder for the AVL telemetry codecs spoken by GPS tracking
//! devices.
//!
//! Devices report batches of records (a timestamp, a position fix and a set of
//! numbered I/O elements) encoded with one of three codecs: 8, 8 Extended or
//! 16. A batch travels either over a stream transport, framed by a zero
//! preamble, a length and a CRC, or over a datagram transport, prefixed by a
//! header identifying the device.
//!
//! Most users should begin with [`decode`], which returns an owned [`Packet`],
//! or with the receiver traits and derive macros in the [`avec`] module. If
//! these prove insufficient, the allocation-free finite-state machine behind
//! them is exposed in the [`sans`] module.
//!
//! ## Cargo Features
//!
//! The following crate feature flags are available:
//!
//! - `derive`: enable derive macros (default).
//! - `std`: enable the owned packet decoder (default).
//! - `tracing`: emit `trace` events while decoding frames.

#[cfg(feature = "std")]
extern crate std;

/// Emit a `trace` event when the `tracing` feature is enabled.
macro_rules! trace {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        tracing::trace!($($arg)*);
    };
}

pub mod avec;
pub mod sans;

pub use avec::slice::Error;
#[cfg(feature = "std")]
pub use avec::packet::{Packet, Record, decode};
pub use sans::params::{Codec, Transport};
