//! Internal finite-state machine for implementing decoders.
//!
//! This module is intended for advanced applications that need fine control
//! over decoder internals, such as those decoding straight from a socket on
//! an embedded target. See [`crate::avec`] for implementations covering common
//! decoding patterns.
//!
//! # Architecture
//!
//! All states are represented by a small, non-copy token. Once enough bytes
//! are ready, transition to another state by calling the token's `advance`
//! method. This will return a successor state token, along with any extracted
//! data.
//!
//! Field widths that differ between codecs are carried in the type of the
//! record states, through the [`record::Layout`] trait. The width of every
//! argument to `advance` is therefore known statically once a codec has been
//! chosen with [`payload::PayloadHeader::advance`].
//!
//! Two states can be constructed: [`StreamDecoder`] for frames received over
//! a stream transport and [`DatagramDecoder`] for datagrams.
//!
//! Some areas of the decoding process are not represented in the finite-state
//! machine and must be carefully written:
//!
//! - Slicing each record out of the payload. [`payload::Records`] reports the
//! size of a record, and bytes left over once a record reaches
//! [`element::RecordEnd`] are not consumed.
//!
//! - Reading the trailing record count before decoding the records.
//!
//! - Applying cyclic redundancy checks to stream frames. A helper function is
//! provided in the [`check`] module.
//!
//! - Counting decoded elements against the declared total.
//!
//! Implementers are recommended to begin by studying and modifying the decoder
//! in [`crate::avec::slice`].

pub mod check;
pub mod element;
pub mod frame;
pub mod params;
pub mod payload;
pub mod record;

/// Entrypoint to the finite-state machine for stream frames.
pub type StreamDecoder = frame::StreamHeader;

/// Entrypoint to the finite-state machine for datagrams.
pub type DatagramDecoder = frame::DatagramLength;
