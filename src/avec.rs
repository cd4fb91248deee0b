//! Convenience interfaces for common decoding patterns.
//!
//! The decoder in [`slice`] publishes decoded values to the [`FromRecords`]
//! and [`FromRecord`] traits without allocating. In many cases (when the
//! elements of interest are known ahead of time), these traits can be
//! derived. See the [`FromRecords`](macro@FromRecords) and
//! [`FromRecord`](macro@FromRecord) macros for details.
//!
//! With the `std` feature, [`packet`] collects every record into an owned
//! [`Packet`](packet::Packet) instead.

use core::fmt;

use crate::sans::{frame::DeviceHeader, record::Position};

#[cfg(feature = "std")]
pub mod packet;
pub mod slice;

#[cfg(feature = "std")]
pub use packet::decode;
pub use slice::decode as decode_slice;

/// Derive [`FromRecords`] for a struct holding a collection of records.
///
/// _Requires Cargo feature `derive`._
///
/// # Example
///
/// To collect records, add the `record` attribute to a `Vec<T>` struct field,
/// where `T` is a type implementing [`FromRecord`] and [`Default`]. Applied to
/// an `Option<T>` instead, only the last record is kept. To receive the header
/// of a datagram, add the `device` attribute to an `Option<DeviceHeader>`.
///
/// ```
/// #[derive(Debug, Default, FromRecords)]
/// struct Batch {
///     #[device]
///     device: Option<DeviceHeader>,
///     #[record]
///     records: Vec<Record>,
/// }
/// ```
#[cfg(feature = "derive")]
pub use avlwire_derive::FromRecords;

/// Produce record receivers for a payload.
///
/// See the [`FromRecords`](macro@FromRecords) derive macro for an automatic
/// implementation of this trait.
pub trait FromRecords {
    /// Add the header of a datagram.
    fn add_device(&mut self, _: DeviceHeader) {}
    /// Retrieve a receiver for the record at an index in the payload, if one
    /// exists.
    fn add_record(&mut self, index: usize) -> Option<&mut dyn FromRecord>;
}

/// Derive [`FromRecord`] for a struct representing a single record.
///
/// _Requires Cargo feature `derive`._
///
/// # Examples
///
/// To receive an element, add the `element(N)` attribute to an `Option<T>`
/// struct field, where `N` is the element identifier and `T` is the primitive
/// matching the width of the element's group (`u8`, `u16`, `u32` or `u64`).
/// The fixed fields of a record are received by name: `timestamp`,
/// `priority`, `position`, `event`, `generation` and `anomaly`.
///
/// ```
/// #[derive(Debug, Default, FromRecord)]
/// struct Record {
///     #[element(timestamp)]
///     timestamp: Option<u64>,
///     #[element(position)]
///     position: Option<Position>,
///     #[element(21)]
///     gsm_signal: Option<u8>,
///     #[element(66)]
///     external_voltage: Option<u16>,
/// }
/// ```
///
/// To accumulate values or receive variable-width elements, supply an
/// accumulator closure. The second argument of a closure receiving an
/// element must be typed, with `&[u8]` selecting variable-width elements.
///
/// ```
/// #[derive(Debug, Default, FromRecord)]
/// struct Record {
///     #[element(anomaly, |v, a| v.push(a))]
///     anomalies: Vec<Anomaly>,
///     #[element(11, |v, x: u64| *v = Some(x))]
///     iccid: Option<u64>,
///     #[element(256, |v, x: &[u8]| v.extend_from_slice(x))]
///     vin: Vec<u8>,
/// }
/// ```
#[cfg(feature = "derive")]
pub use avlwire_derive::FromRecord;

/// Receive decoded values for a record.
///
/// Elements are published with the primitive matching the width of their
/// group, and variable-width elements as raw bytes.
///
/// The default implementation of each method ignores received values.
///
/// See the [`FromRecord`](macro@FromRecord) derive macro for an automatic
/// implementation of this trait.
#[allow(unused_variables)]
pub trait FromRecord {
    /// Add the timestamp, in milliseconds since the Unix epoch.
    fn add_timestamp(&mut self, _: u64) {}
    /// Add the priority.
    fn add_priority(&mut self, _: u8) {}
    /// Add the position fix.
    fn add_position(&mut self, _: Position) {}
    /// Add the identifier of the element that triggered the record.
    fn add_event(&mut self, _: u16) {}
    /// Add the generation type (codec 16 only).
    fn add_generation_type(&mut self, _: u8) {}

    /// Add a one-byte element to the record.
    fn add_u8(&mut self, id: u16, _: u8) {}
    /// Add a two-byte element to the record.
    fn add_u16(&mut self, id: u16, _: u16) {}
    /// Add a four-byte element to the record.
    fn add_u32(&mut self, id: u16, _: u32) {}
    /// Add an eight-byte element to the record.
    fn add_u64(&mut self, id: u16, _: u64) {}
    /// Add a variable-width element to the record (codec 8 Extended only).
    fn add_bytes(&mut self, id: u16, _: &[u8]) {}

    /// Add the declared total number of elements, once every element of the
    /// record has been added.
    ///
    /// Returns the number of distinct identifiers received, which must match
    /// the total. By default `None` is returned, and the number of elements
    /// decoded is matched instead.
    fn add_element_total(&mut self, total: u16) -> Option<usize> {
        None
    }

    /// Add a diagnostic for a suspicious but well-formed value.
    fn add_anomaly(&mut self, _: Anomaly) {}
}

/// Highest valid priority (panic).
pub const MAX_PRIORITY: u8 = 2;

/// Highest valid generation type (periodical).
pub const MAX_GENERATION_TYPE: u8 = 7;

/// A suspicious value in an otherwise well-formed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Anomaly {
    /// Priority above 2.
    Priority(u8),
    /// Speed of zero, reported by devices without a valid fix.
    InvalidFix,
    /// Generation type above 7.
    GenerationType(u8),
    /// Bytes left in the record after its last element.
    TrailingBytes(usize),
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Priority(p) => write!(f, "Invalid priority ({p})."),
            Self::InvalidFix => write!(f, "Invalid GPS fix (zero speed)."),
            Self::GenerationType(g) => write!(f, "Invalid generation type ({g})."),
            Self::TrailingBytes(n) => write!(f, "{n} bytes left after the last element."),
        }
    }
}
