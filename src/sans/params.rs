//! Codec and transport parameters.

use core::{fmt, str::FromStr};

use thiserror::Error;

/// An error converting a name into a decoder parameter.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ParameterError {
    /// Unknown codec name.
    #[error("Unknown codec name (expected `8`, `8E` or `16`).")]
    Codec,
    /// Unknown transport name.
    #[error("Unknown transport name (expected `stream` or `datagram`).")]
    Transport,
}

/// Record encoding used inside a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Codec {
    /// Codec 8: one-byte element identifiers and counts.
    C8,
    /// Codec 8 Extended: two-byte element identifiers and counts, followed by
    /// a group of variable-width elements.
    C8E,
    /// Codec 16: two-byte element identifiers, one-byte counts and a
    /// generation type per record.
    C16,
}

impl Codec {
    /// Look up a codec by the identifier found at the head of a payload.
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0x08 => Some(Self::C8),
            0x8E => Some(Self::C8E),
            0x10 => Some(Self::C16),
            _ => None,
        }
    }

    /// The identifier written at the head of a payload.
    pub fn id(self) -> u8 {
        match self {
            Self::C8 => 0x08,
            Self::C8E => 0x8E,
            Self::C16 => 0x10,
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::C8 => "8",
            Self::C8E => "8E",
            Self::C16 => "16",
        })
    }
}

impl FromStr for Codec {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "8" => Ok(Self::C8),
            "16" => Ok(Self::C16),
            _ if s.eq_ignore_ascii_case("8e") => Ok(Self::C8E),
            _ => Err(ParameterError::Codec),
        }
    }
}

/// Transport carrying a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    /// Framed by a zero preamble, a length and a trailing CRC (TCP).
    Stream,
    /// Prefixed by a length and a device identification header (UDP).
    Datagram,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Stream => "stream",
            Self::Datagram => "datagram",
        })
    }
}

impl FromStr for Transport {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("stream") || s.eq_ignore_ascii_case("tcp") {
            Ok(Self::Stream)
        } else if s.eq_ignore_ascii_case("datagram") || s.eq_ignore_ascii_case("udp") {
            Ok(Self::Datagram)
        } else {
            Err(ParameterError::Transport)
        }
    }
}
