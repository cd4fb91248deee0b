//! Slice-based decoder implementation.

use either::Either::{Left, Right};
use thiserror::Error;

use crate::sans::{
    DatagramDecoder, StreamDecoder,
    check::compute_crc,
    element::{AfterGroup, AnyElement, Element, ElementInner, ElementTotal, RecordEnd, VariableGroup},
    frame::{DeviceHeader, FrameError},
    params::{Codec, ParameterError, Transport},
    payload::{PAYLOAD_OVERHEAD, PayloadError, PayloadHeader},
    record::{Codec8, Codec8Extended, Codec16, Layout, Record},
};

use super::{Anomaly, FromRecord, FromRecords, MAX_GENERATION_TYPE, MAX_PRIORITY};

/// Errors occurring while decoding from a slice.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Invalid codec or transport parameter.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(#[from] ParameterError),
    /// Unexpectedly reached the end of the frame or of a record.
    #[error("Unexpectedly reached the end of the data at offset {offset} ({needed} bytes needed).")]
    TooShort { offset: usize, needed: usize },
    /// Declared length disagrees with the size of the frame.
    #[error("Declared length ({declared}) does not match a frame of {size} bytes.")]
    LengthMismatch { declared: u32, size: usize },
    /// Non-zero stream preamble.
    #[error("Non-zero preamble ({0:02X?}).")]
    Preamble([u8; 4]),
    /// Calculated and found CRC values do not match.
    #[error("Calculated ({calculated}) and found ({found}) CRC values do not match.")]
    ChecksumMismatch { found: u32, calculated: u16 },
    /// Unexpected datagram marker byte.
    #[error("Unexpected marker byte ({0}).")]
    UnexpectedMarker(u8),
    /// Unexpected device identifier length.
    #[error("Unexpected device identifier length ({0}).")]
    DeviceIdLengthMismatch(u16),
    /// Codec identifier is unknown or differs from the requested codec.
    #[error("Expected codec {expected}, found identifier {found:#04X}.")]
    CodecMismatch { expected: Codec, found: u8 },
    /// Record counts disagree.
    #[error("Declared ({declared}) and found ({found}) record counts do not match.")]
    RecordCountMismatch { declared: u8, found: usize },
    /// Record bytes cannot be split evenly between the declared records.
    #[error("{bytes} record bytes cannot be split between {count} records.")]
    UnevenRecords { bytes: usize, count: u8 },
    /// Declared and decoded element counts disagree.
    #[error("Record {record} declares {declared} elements, but {decoded} were decoded.")]
    ElementCountMismatch {
        record: usize,
        declared: usize,
        decoded: usize,
    },
    /// Variable-width element too wide for an integer.
    #[error("Element {id} is {length} bytes wide, more than an integer can hold.")]
    ElementTooWide { id: u16, length: usize },
}

impl From<FrameError> for Error {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::LengthMismatch { declared, size } => {
                Self::LengthMismatch { declared, size }
            }
            FrameError::Preamble(preamble) => Self::Preamble(preamble),
            FrameError::UnexpectedMarker(marker) => Self::UnexpectedMarker(marker),
            FrameError::DeviceIdLength(length) => Self::DeviceIdLengthMismatch(length),
        }
    }
}

impl From<PayloadError> for Error {
    fn from(err: PayloadError) -> Self {
        match err {
            PayloadError::CodecMismatch { expected, found } => {
                Self::CodecMismatch { expected, found }
            }
            PayloadError::RecordCountMismatch { declared, trailing } => {
                Self::RecordCountMismatch {
                    declared,
                    found: trailing.into(),
                }
            }
            PayloadError::UnevenRecords { bytes, count } => Self::UnevenRecords { bytes, count },
        }
    }
}

/// Decode the records of a frame from a slice, publishing to a receiver.
///
/// Values are published as each record is decoded, so a receiver may observe
/// records preceding an error. Framing, the CRC and record counts are checked
/// before any record is published.
///
/// This method is also re-exported as `avlwire::avec::decode_slice`.
pub fn decode(
    codec: Codec,
    transport: Transport,
    r: &[u8],
    o: &mut impl FromRecords,
) -> Result<(), Error> {
    let i = &mut 0; // Counter of bytes read, used to read bytes from the tip.

    let (r, successor) = match transport {
        Transport::Stream => {
            let (size, successor) = StreamDecoder::advance(take(r, i)?, r.len())?;

            let end = *i + size; // Offset to the CRC.

            // Apply the cyclic redundancy check before continuing.
            let found = u32::from_be_bytes(take(r, &mut { end })?);
            let calculated = compute_crc(0, &r[*i..end]);

            if found != u32::from(calculated) {
                Err(Error::ChecksumMismatch { found, calculated })?;
            }

            trace!(size, crc = calculated, "accepted stream frame");

            (&r[..end], successor)
        }
        Transport::Datagram => {
            let (length, successor) = DatagramDecoder::advance(take(r, i)?, r.len())?;
            let ((packet_id, record_sequence_id), successor) = successor.advance(take(r, i)?)?;
            let (device_id, successor) = successor.advance(take(r, i)?);

            trace!(packet_id, record_sequence_id, %device_id, "accepted datagram");

            o.add_device(DeviceHeader {
                length,
                packet_id,
                record_sequence_id,
                device_id,
            });

            (r, successor)
        }
    };

    match codec {
        Codec::C8 => decode_payload::<Codec8>(successor, r, i, o),
        Codec::C8E => decode_payload::<Codec8Extended>(successor, r, i, o),
        Codec::C16 => decode_payload::<Codec16>(successor, r, i, o),
    }
}

/// Decode a payload ending at the end of `r`.
fn decode_payload<C: Layout>(
    state: PayloadHeader,
    r: &[u8],
    i: &mut usize,
    o: &mut impl FromRecords,
) -> Result<(), Error> {
    let size = r.len().saturating_sub(*i);
    if size < PAYLOAD_OVERHEAD {
        Err(Error::TooShort {
            offset: *i,
            needed: PAYLOAD_OVERHEAD,
        })?;
    }

    let head = take(r, i)?;
    let (trailer, r) = r.split_last().ok_or(Error::TooShort {
        offset: *i,
        needed: 1,
    })?;

    let mut records = state.advance::<C>(head, *trailer, size)?;

    let declared = records.declared();
    let record_size = records.record_size();

    trace!(codec = %C::CODEC, declared, record_size, "splitting payload");

    let mut decoded = 0;

    loop {
        records = match records.advance() {
            Left((record, successor)) => {
                let end = *i + record_size; // Offset to the end of the record.
                let r = r.get(..end).ok_or(Error::TooShort {
                    offset: *i,
                    needed: record_size,
                })?;

                decode_record(record, r, i, decoded, o.add_record(decoded))?;

                *i = end;
                decoded += 1;

                successor
            }
            Right(_) => break,
        };
    }

    if decoded != usize::from(declared) {
        Err(Error::RecordCountMismatch {
            declared,
            found: decoded,
        })?;
    }

    Ok(())
}

fn decode_record<'o, C: Layout>(
    state: Record<C>,
    r: &[u8],
    i: &mut usize,
    index: usize,
    mut o: Option<&mut (dyn FromRecord + 'o)>,
) -> Result<(), Error> {
    let (header, successor) = state.advance(take(r, i)?);

    if let Some(o) = o.as_deref_mut() {
        o.add_timestamp(header.timestamp);
        o.add_priority(header.priority);
        o.add_position(header.position);

        if header.priority > MAX_PRIORITY {
            o.add_anomaly(Anomaly::Priority(header.priority));
        }
        if header.position.speed == 0 {
            o.add_anomaly(Anomaly::InvalidFix);
        }
    }

    let (event, successor) = successor.advance(take(r, i)?);

    if let Some(o) = o.as_deref_mut() {
        o.add_event(event);
    }

    let state = match successor {
        Left(state) => {
            let (generation_type, state) = state.advance(take(r, i)?);

            if let Some(o) = o.as_deref_mut() {
                o.add_generation_type(generation_type);

                if generation_type > MAX_GENERATION_TYPE {
                    o.add_anomaly(Anomaly::GenerationType(generation_type));
                }
            }

            state
        }
        Right(state) => state,
    };

    let (declared, decoded) = decode_elements(state, r, i, o.as_deref_mut())?;

    // Receivers tracking identifiers report distinct elements, so repeated
    // identifiers count once.
    let decoded = match o.as_deref_mut() {
        Some(o) => o.add_element_total(declared).unwrap_or(decoded),
        None => decoded,
    };

    if usize::from(declared) != decoded {
        Err(Error::ElementCountMismatch {
            record: index,
            declared: declared.into(),
            decoded,
        })?;
    }

    if let (Some(o), trailing @ 1..) = (o, r.len() - *i) {
        o.add_anomaly(Anomaly::TrailingBytes(trailing));
    }

    Ok(())
}

/// Decode the elements of a record, returning the declared total and the
/// number of elements decoded.
fn decode_elements<'o, C: Layout>(
    state: ElementTotal<C>,
    r: &[u8],
    i: &mut usize,
    mut o: Option<&mut (dyn FromRecord + 'o)>,
) -> Result<(u16, usize), Error> {
    let (declared, mut group) = state.advance(take(r, i)?);

    let decoded = &mut 0; // Counter of elements decoded.

    fn decode_element<
        C: Layout,
        V: ElementInner<From = [u8; N]>,
        O: FromRecord + ?Sized,
        const N: usize,
    >(
        mut state: Element<C, V>,
        r: &[u8],
        i: &mut usize,
        decoded: &mut usize,

        mut o: Option<&mut O>,
        add: fn(&mut O, u16, V::Into),
    ) -> Result<AfterGroup<C>, Error> {
        loop {
            let ((id, value), successor) = state.advance(take(r, i)?, take(r, i)?);
            *decoded += 1;

            if let Some(o) = &mut o {
                add(o, id, value);
            }

            state = match successor {
                Left(state) => state,
                Right(successor) => return Ok(successor),
            }
        }
    }

    loop {
        let successor = match group.advance(take(r, i)?) {
            Left(element) => {
                let o = o.as_deref_mut();

                match element {
                    AnyElement::U8(s) => decode_element(s, r, i, decoded, o, FromRecord::add_u8),
                    AnyElement::U16(s) => decode_element(s, r, i, decoded, o, FromRecord::add_u16),
                    AnyElement::U32(s) => decode_element(s, r, i, decoded, o, FromRecord::add_u32),
                    AnyElement::U64(s) => decode_element(s, r, i, decoded, o, FromRecord::add_u64),
                }?
            }
            Right(successor) => successor,
        };

        group = match successor {
            Left(group) => group,
            Right(Left(state)) => break decode_variable(state, r, i, decoded, o.as_deref_mut())?,
            Right(Right(end)) => break end,
        };
    };

    Ok((declared, *decoded))
}

fn decode_variable<'o>(
    state: VariableGroup,
    r: &[u8],
    i: &mut usize,
    decoded: &mut usize,
    mut o: Option<&mut (dyn FromRecord + 'o)>,
) -> Result<RecordEnd, Error> {
    let mut state = match state.advance(take(r, i)?) {
        Left(state) => state,
        Right(end) => return Ok(end),
    };

    loop {
        let ((id, length), successor) = state.advance(take(r, i)?);

        let s = *i;
        let value = r.get(s..s + length).ok_or(Error::TooShort {
            offset: s,
            needed: length,
        })?;
        *i += length;
        *decoded += 1;

        if let Some(o) = o.as_deref_mut() {
            o.add_bytes(id, value);
        }

        state = match successor.advance() {
            Left(state) => state,
            Right(end) => return Ok(end),
        };
    }
}

/// Take an exact number of bytes from an offset in a slice, advancing the
/// offset.
fn take<T: for<'a> TryFrom<&'a [u8]>>(r: &[u8], i: &mut usize) -> Result<T, Error> {
    let s = *i;
    let needed = size_of::<T>();
    let err = Error::TooShort { offset: s, needed };

    let t = r.get(s..s + needed).ok_or(err.clone())?;
    *i += needed;

    T::try_from(t).map_err(|_| err)
}
