//! States processing the fixed fields of a record.

use core::marker::PhantomData;

use either::Either::{self, Left, Right};
use zerocopy::FromBytes;

use super::{element::ElementTotal, params::Codec};

/// Fixed-point scale of longitudes and latitudes (seven decimal places).
pub const COORDINATE_SCALE: f64 = 10_000_000.0;

/// Field widths of a codec.
pub trait Layout {
    /// The codec described.
    const CODEC: Codec;
    /// Whether records carry a generation type after the event identifier.
    const GENERATION_TYPE: bool;
    /// Whether records end with a group of variable-width elements.
    const VARIABLE_ELEMENTS: bool;

    /// The data storing event and element identifiers.
    type Id: Word;
    /// The data storing element counts.
    type Count: Word;
}

/// Big-endian unsigned data of one or two bytes.
pub trait Word: for<'a> TryFrom<&'a [u8]> {
    /// Convert the data to a primitive.
    fn widen(self) -> u16;
}

impl Word for [u8; 1] {
    fn widen(self) -> u16 {
        self[0].into()
    }
}

impl Word for [u8; 2] {
    fn widen(self) -> u16 {
        u16::from_be_bytes(self)
    }
}

/// Codec 8.
#[derive(Debug)]
pub struct Codec8;

impl Layout for Codec8 {
    const CODEC: Codec = Codec::C8;
    const GENERATION_TYPE: bool = false;
    const VARIABLE_ELEMENTS: bool = false;

    type Id = [u8; 1];
    type Count = [u8; 1];
}

/// Codec 8 Extended.
#[derive(Debug)]
pub struct Codec8Extended;

impl Layout for Codec8Extended {
    const CODEC: Codec = Codec::C8E;
    const GENERATION_TYPE: bool = false;
    const VARIABLE_ELEMENTS: bool = true;

    type Id = [u8; 2];
    type Count = [u8; 2];
}

/// Codec 16.
#[derive(Debug)]
pub struct Codec16;

impl Layout for Codec16 {
    const CODEC: Codec = Codec::C16;
    const GENERATION_TYPE: bool = true;
    const VARIABLE_ELEMENTS: bool = false;

    type Id = [u8; 2];
    type Count = [u8; 1];
}

/// Position fix of a record.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    /// East-west position, in degrees.
    pub longitude: f64,
    /// North-south position, in degrees.
    pub latitude: f64,
    /// Meters above sea level.
    pub altitude: u16,
    /// Heading, in degrees from north.
    pub angle: u16,
    /// Number of satellites in use.
    pub satellites: u8,
    /// Speed in km/h. Zero when the fix is invalid.
    pub speed: u16,
}

/// Fixed fields at the start of every record.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RecordHeader {
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// 0 (low), 1 (high) or 2 (panic).
    pub priority: u8,
    pub position: Position,
}

/// State token to decode the fixed fields of a record.
#[derive(Debug)]
pub struct Record<C>(pub(super) PhantomData<C>);

impl<C: Layout> Record<C> {
    /// Transition to another state by decoding the timestamp, priority and
    /// position of a record.
    ///
    /// Returns the decoded fields, and a successor state token.
    pub fn advance(self, r: [u8; 24]) -> (RecordHeader, EventId<C>) {
        #[repr(C, packed)]
        #[derive(FromBytes)]
        struct Fields {
            timestamp: [u8; 8],
            priority: u8,
            longitude: [u8; 4],
            latitude: [u8; 4],
            altitude: [u8; 2],
            angle: [u8; 2],
            satellites: u8,
            speed: [u8; 2],
        }

        let Fields {
            timestamp,
            priority,
            longitude,
            latitude,
            altitude,
            angle,
            satellites,
            speed,
        } = zerocopy::transmute!(r);

        let header = RecordHeader {
            timestamp: u64::from_be_bytes(timestamp),
            priority,
            position: Position {
                longitude: f64::from(i32::from_be_bytes(longitude)) / COORDINATE_SCALE,
                latitude: f64::from(i32::from_be_bytes(latitude)) / COORDINATE_SCALE,
                altitude: u16::from_be_bytes(altitude),
                angle: u16::from_be_bytes(angle),
                satellites,
                speed: u16::from_be_bytes(speed),
            },
        };

        (header, EventId(PhantomData))
    }
}

/// State token to decode the identifier of the element that triggered a
/// record.
#[derive(Debug)]
pub struct EventId<C>(PhantomData<C>);

impl<C: Layout> EventId<C> {
    /// Transition to another state by decoding an event identifier.
    ///
    /// Returns the identifier, and a successor state token.
    pub fn advance(self, r: C::Id) -> (u16, Either<GenerationType<C>, ElementTotal<C>>) {
        let successor = if C::GENERATION_TYPE {
            Left(GenerationType(PhantomData))
        } else {
            Right(ElementTotal(PhantomData))
        };

        (r.widen(), successor)
    }
}

/// State token to decode the generation type of a record.
#[derive(Debug)]
pub struct GenerationType<C>(PhantomData<C>);

impl<C: Layout> GenerationType<C> {
    /// Transition to another state by decoding a generation type.
    ///
    /// Returns the generation type, and a successor state token.
    pub fn advance(self, r: [u8; 1]) -> (u8, ElementTotal<C>) {
        (r[0], ElementTotal(PhantomData))
    }
}
