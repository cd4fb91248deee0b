//! States splitting a payload into records.

use core::marker::PhantomData;

use either::Either::{self, Left, Right};
use thiserror::Error;

use super::{
    params::Codec,
    record::{Layout, Record},
};

/// Bytes of a payload surrounding its records: the codec identifier and the
/// leading and trailing record counts.
pub const PAYLOAD_OVERHEAD: usize = 3;

/// An error advancing over a payload header.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PayloadError {
    /// Codec identifier is unknown or differs from the requested codec.
    #[error("Expected codec {expected}, found identifier {found:#04X}.")]
    CodecMismatch { expected: Codec, found: u8 },
    /// Leading and trailing record counts differ.
    #[error("Leading ({declared}) and trailing ({trailing}) record counts differ.")]
    RecordCountMismatch { declared: u8, trailing: u8 },
    /// Record bytes cannot be split evenly between the declared records.
    #[error("{bytes} record bytes cannot be split between {count} records.")]
    UnevenRecords { bytes: usize, count: u8 },
}

/// State token to decode the head of a payload.
#[derive(Debug)]
pub struct PayloadHeader(pub(super) ());

impl PayloadHeader {
    /// Transition to another state by decoding the codec identifier and
    /// record count at the head of a payload of `size` bytes, together with
    /// the trailing record count.
    ///
    /// The codec `C` must match the identifier found in the payload.
    ///
    /// Returns a successor state token.
    pub fn advance<C: Layout>(
        self,
        r: [u8; 2],
        trailer: u8,
        size: usize,
    ) -> Result<Records<C>, PayloadError> {
        let [id, declared] = r;

        if Codec::from_id(id) != Some(C::CODEC) {
            Err(PayloadError::CodecMismatch {
                expected: C::CODEC,
                found: id,
            })?;
        }

        if declared != trailer {
            Err(PayloadError::RecordCountMismatch {
                declared,
                trailing: trailer,
            })?;
        }

        let bytes = size.saturating_sub(PAYLOAD_OVERHEAD);
        let record_size = match (bytes, declared) {
            (0, 0) => 0,
            (_, 0) => Err(PayloadError::UnevenRecords {
                bytes,
                count: declared,
            })?,
            (_, count) if bytes % usize::from(count) == 0 => bytes / usize::from(count),
            (_, count) => Err(PayloadError::UnevenRecords { bytes, count })?,
        };

        Ok(Records {
            declared,
            remaining: declared,
            record_size,
            _phantom: PhantomData,
        })
    }
}

/// State token to begin the next record of a payload.
#[derive(Debug)]
pub struct Records<C> {
    declared: u8,
    remaining: u8,
    record_size: usize,
    _phantom: PhantomData<C>,
}

impl<C: Layout> Records<C> {
    /// Number of records declared by the payload.
    pub fn declared(&self) -> u8 {
        self.declared
    }

    /// Size in bytes of every record in the payload.
    pub fn record_size(&self) -> usize {
        self.record_size
    }

    /// Transition to another state by beginning the next record.
    ///
    /// Returns a record state token together with the state to resume from
    /// once that record has been decoded, or the end of the payload.
    pub fn advance(self) -> Either<(Record<C>, Self), PayloadEnd> {
        if self.remaining == 0 {
            return Right(PayloadEnd(()));
        }

        let successor = Self {
            remaining: self.remaining - 1,
            ..self
        };

        Left((Record(PhantomData), successor))
    }
}

/// State token marking the end of a payload.
#[derive(Debug)]
pub struct PayloadEnd(pub(super) ());
