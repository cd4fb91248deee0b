//! States processing I/O elements.
//!
//! Elements follow the fixed fields of a record, preceded by their total
//! count. They are grouped by value width (1, 2, 4 and then 8 bytes), each
//! group preceded by its own count. Codec 8 Extended appends a final group of
//! elements carrying an explicit value length.

use core::marker::PhantomData;

use either::Either::{self, Left, Right};

use super::record::{Layout, Word};

/// State token to decode the total number of elements in a record.
#[derive(Debug)]
pub struct ElementTotal<C>(pub(super) PhantomData<C>);

impl<C: Layout> ElementTotal<C> {
    /// Transition to another state by decoding the total number of elements.
    ///
    /// Returns the declared total, and a successor state token.
    pub fn advance(self, r: C::Count) -> (u16, ElementGroup<C>) {
        (r.widen(), ElementGroup::new(Width::One))
    }
}

/// Value width of a group of elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    One,
    Two,
    Four,
    Eight,
}

impl Width {
    /// Number of bytes per value.
    pub fn bytes(self) -> usize {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Four => 4,
            Self::Eight => 8,
        }
    }

    /// The state following the last element of a group of this width.
    fn successor<C: Layout>(self) -> AfterGroup<C> {
        match self {
            Self::One => Left(ElementGroup::new(Self::Two)),
            Self::Two => Left(ElementGroup::new(Self::Four)),
            Self::Four => Left(ElementGroup::new(Self::Eight)),
            Self::Eight if C::VARIABLE_ELEMENTS => Right(Left(VariableGroup(()))),
            Self::Eight => Right(Right(RecordEnd(()))),
        }
    }
}

/// The state following a group of fixed-width elements: the next group, the
/// variable-width group, or the end of the record.
pub type AfterGroup<C> = Either<ElementGroup<C>, Either<VariableGroup, RecordEnd>>;

/// State token to decode the count of a group of fixed-width elements.
#[derive(Debug)]
pub struct ElementGroup<C> {
    width: Width,
    _phantom: PhantomData<C>,
}

impl<C: Layout> ElementGroup<C> {
    fn new(width: Width) -> Self {
        Self {
            width,
            _phantom: PhantomData,
        }
    }

    /// Value width of the elements in this group.
    pub fn width(&self) -> Width {
        self.width
    }

    /// Transition to another state by decoding the count of a group.
    ///
    /// Returns a state token for the first element of the group, or the
    /// successor of an empty group.
    pub fn advance(self, r: C::Count) -> Either<AnyElement<C>, AfterGroup<C>> {
        let remaining = r.widen();

        if remaining == 0 {
            return Right(self.width.successor());
        }

        fn new_element<C, V>(remaining: u16) -> Element<C, V> {
            Element {
                remaining,
                _phantom: PhantomData,
            }
        }

        Left(match self.width {
            Width::One => AnyElement::U8(new_element(remaining)),
            Width::Two => AnyElement::U16(new_element(remaining)),
            Width::Four => AnyElement::U32(new_element(remaining)),
            Width::Eight => AnyElement::U64(new_element(remaining)),
        })
    }
}

/// State token to decode an element with a value of type `V`.
#[derive(Debug)]
pub struct Element<C, V> {
    remaining: u16,
    _phantom: PhantomData<(C, V)>,
}

impl<C: Layout, V: ElementInner> Element<C, V> {
    /// Transition to another state by decoding an element identifier and its
    /// value.
    ///
    /// Returns the identifier and value, and a successor state.
    pub fn advance(
        self,
        id: C::Id,
        value: V::From,
    ) -> ((u16, V::Into), Either<Self, AfterGroup<C>>) {
        let element = (id.widen(), V::from(value));

        let successor = if self.remaining == 1 {
            Right(V::WIDTH.successor())
        } else {
            Left(Self {
                remaining: self.remaining - 1,
                _phantom: PhantomData,
            })
        };

        (element, successor)
    }
}

pub trait ElementInner {
    /// The group holding values of this type.
    const WIDTH: Width;
    /// The data storing this value.
    type From;
    /// The primitive corresponding to this value.
    type Into;

    /// Convert data of this value type to the corresponding primitive.
    fn from(r: Self::From) -> Self::Into;
}

macro_rules! element_inner {
    ($t:ident, $into:ident, $width:ident, $(#[$attr:meta])*) => {
        $(#[$attr])*
        #[derive(Debug)]
        pub struct $t;

        impl ElementInner for $t {
            const WIDTH: Width = Width::$width;
            type From = [u8; size_of::<Self::Into>()];
            type Into = $into;

            fn from(r: Self::From) -> Self::Into {
                Self::Into::from_be_bytes(r)
            }
        }
    };
}

element_inner!(U8, u8, One, /** One-byte values. */);
element_inner!(U16, u16, Two, /** Two-byte values. */);
element_inner!(U32, u32, Four, /** Four-byte values. */);
element_inner!(U64, u64, Eight, /** Eight-byte values. */);

/// An `Element` state token for a value width.
#[derive(Debug)]
pub enum AnyElement<C> {
    U8(Element<C, U8>),
    U16(Element<C, U16>),
    U32(Element<C, U32>),
    U64(Element<C, U64>),
}

/// State token to decode the count of variable-width elements.
#[derive(Debug)]
pub struct VariableGroup(pub(super) ());

impl VariableGroup {
    /// Transition to another state by decoding the count of variable-width
    /// elements.
    ///
    /// Returns a state token for the first element, or the end of the record.
    pub fn advance(self, r: [u8; 2]) -> Either<VariableElement, RecordEnd> {
        let remaining = u16::from_be_bytes(r);

        if remaining != 0 {
            Left(VariableElement { remaining })
        } else {
            Right(RecordEnd(()))
        }
    }
}

/// State token to decode the identifier and length of a variable-width
/// element.
#[derive(Debug)]
pub struct VariableElement {
    remaining: u16,
}

impl VariableElement {
    /// Transition to another state by decoding an element identifier and the
    /// length of its value.
    ///
    /// Returns the identifier and value length, and a successor state token.
    pub fn advance(self, r: [u8; 4]) -> ((u16, usize), VariableValue) {
        let [id @ .., _, _] = r;
        let [_, _, length @ ..] = r;

        let element = (u16::from_be_bytes(id), usize::from(u16::from_be_bytes(length)));

        (
            element,
            VariableValue {
                remaining: self.remaining - 1,
            },
        )
    }
}

/// State token to skip over the value of a variable-width element.
///
/// The value spans the number of bytes returned alongside this token. Use
/// [`accumulate`] to convert it to an integer.
#[derive(Debug)]
pub struct VariableValue {
    remaining: u16,
}

impl VariableValue {
    /// Transition to another state once the value bytes have been consumed.
    ///
    /// Returns a state token for the next element, or the end of the record.
    pub fn advance(self) -> Either<VariableElement, RecordEnd> {
        if self.remaining != 0 {
            Left(VariableElement {
                remaining: self.remaining,
            })
        } else {
            Right(RecordEnd(()))
        }
    }
}

/// State token marking the end of a record's elements.
#[derive(Debug)]
pub struct RecordEnd(pub(super) ());

/// Accumulate big-endian bytes into an unsigned integer.
///
/// Returns `None` for more than eight bytes. An empty slice is zero.
pub fn accumulate(r: &[u8]) -> Option<u64> {
    if r.len() > size_of::<u64>() {
        return None;
    }

    Some(r.iter().fold(0, |acc, b| (acc << 8) | u64::from(*b)))
}
