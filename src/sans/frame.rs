//! States processing stream frames and datagram headers.

use core::fmt;

use tartan_bitfield::bitfield;
use thiserror::Error;
use zerocopy::FromBytes;

use super::payload::PayloadHeader;

/// Bytes of a stream frame surrounding the payload: the preamble, the length
/// and the CRC.
pub const STREAM_OVERHEAD: usize = 12;

/// Bytes of a datagram not counted by its length field.
pub const DATAGRAM_OVERHEAD: usize = 2;

/// Length of the device identifier carried by datagrams.
pub const DEVICE_ID_LENGTH: u16 = 15;

/// An error advancing over a frame header.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// Declared length disagrees with the size of the frame.
    #[error("Declared length ({declared}) does not match a frame of {size} bytes.")]
    LengthMismatch { declared: u32, size: usize },
    /// Non-zero stream preamble.
    #[error("Non-zero preamble ({0:02X?}).")]
    Preamble([u8; 4]),
    /// Unexpected datagram marker byte.
    #[error("Unexpected marker byte ({0}).")]
    UnexpectedMarker(u8),
    /// Unexpected device identifier length.
    #[error("Unexpected device identifier length ({0}).")]
    DeviceIdLength(u16),
}

/// State token to decode a stream frame header.
#[derive(Debug)]
pub struct StreamHeader;

impl StreamHeader {
    /// Transition to another state by decoding a stream frame header, given
    /// the total size of the frame.
    ///
    /// The declared length is checked against `size` before the preamble.
    /// The caller is responsible for checking the CRC following the payload.
    ///
    /// Returns the number of payload bytes, and a successor state token.
    pub fn advance(r: [u8; 8], size: usize) -> Result<(usize, PayloadHeader), FrameError> {
        #[repr(C, packed)]
        #[derive(FromBytes)]
        struct Header {
            preamble: [u8; 4],
            length: [u8; 4],
        }

        let Header { preamble, length } = zerocopy::transmute!(r);

        let declared = u32::from_be_bytes(length);
        let length = declared as usize;

        if length.checked_add(STREAM_OVERHEAD) != Some(size) {
            Err(FrameError::LengthMismatch { declared, size })?;
        }

        if preamble != [0; 4] {
            Err(FrameError::Preamble(preamble))?;
        }

        Ok((length, PayloadHeader(())))
    }

    /// Size of the complete frame announced by a stream frame header.
    ///
    /// Useful for knowing how many bytes to read from a stream before calling
    /// [`StreamHeader::advance`].
    pub fn frame_size(r: [u8; 8]) -> usize {
        let [_, _, _, _, length @ ..] = r;
        (u32::from_be_bytes(length) as usize).saturating_add(STREAM_OVERHEAD)
    }
}

/// State token to decode the length of a datagram.
#[derive(Debug)]
pub struct DatagramLength;

impl DatagramLength {
    /// Transition to another state by decoding the length of a datagram,
    /// given its total size.
    ///
    /// Returns the declared length, and a successor state token.
    pub fn advance(r: [u8; 2], size: usize) -> Result<(u16, DatagramHeader), FrameError> {
        let declared = u16::from_be_bytes(r);

        if usize::from(declared) + DATAGRAM_OVERHEAD != size {
            Err(FrameError::LengthMismatch {
                declared: declared.into(),
                size,
            })?;
        }

        Ok((declared, DatagramHeader(())))
    }
}

/// State token to decode the header of a datagram.
#[derive(Debug)]
pub struct DatagramHeader(pub(super) ());

impl DatagramHeader {
    /// Transition to another state by decoding the header of a datagram.
    ///
    /// Returns the packet identifier and record sequence identifier, and a
    /// successor state token.
    pub fn advance(self, r: [u8; 6]) -> Result<((u16, u8), DeviceIdentifier), FrameError> {
        #[repr(C, packed)]
        #[derive(FromBytes)]
        struct Header {
            packet_id: [u8; 2],
            marker: u8,
            record_sequence_id: u8,
            device_id_length: [u8; 2],
        }

        let Header {
            packet_id,
            marker,
            record_sequence_id,
            device_id_length,
        } = zerocopy::transmute!(r);

        if marker != 1 {
            Err(FrameError::UnexpectedMarker(marker))?;
        }

        let device_id_length = u16::from_be_bytes(device_id_length);
        if device_id_length != DEVICE_ID_LENGTH {
            Err(FrameError::DeviceIdLength(device_id_length))?;
        }

        let packet_id = u16::from_be_bytes(packet_id);

        Ok(((packet_id, record_sequence_id), DeviceIdentifier(())))
    }
}

/// State token to decode the device identifier of a datagram.
#[derive(Debug)]
pub struct DeviceIdentifier(pub(super) ());

impl DeviceIdentifier {
    /// Transition to another state by decoding a device identifier.
    ///
    /// Returns the identifier, and a successor state token.
    pub fn advance(self, r: [u8; 15]) -> (DeviceId, PayloadHeader) {
        (DeviceId(r), PayloadHeader(()))
    }
}

/// Identifier of the device sending a datagram, usually its IMEI.
///
/// Formatting with [`Display`](fmt::Display) writes the decimal value of
/// each byte's high nibble followed by that of its low nibble. For nibbles up
/// to 9 this coincides with hexadecimal, while nibbles from 10 to 15 are
/// written with two digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId(pub [u8; 15]);

impl DeviceId {
    /// The identifier as received, usually fifteen ASCII digits.
    pub fn as_bytes(&self) -> &[u8; 15] {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        bitfield! {
            struct Nibbles(u8) {
                [0..4] low: u8,
                [4..8] high: u8,
            }
        }

        self.0.iter().try_for_each(|b| {
            let nibbles = Nibbles(*b);
            write!(f, "{}{}", nibbles.high(), nibbles.low())
        })
    }
}

/// Header of a datagram, identifying the sending device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceHeader {
    /// Length declared by the datagram, excluding the length field itself.
    pub length: u16,
    pub packet_id: u16,
    pub record_sequence_id: u8,
    pub device_id: DeviceId,
}
