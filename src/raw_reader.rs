use std::fmt::{Display, Formatter};

use crate::raw_symbol_token::RawSymbolToken;
use crate::result::IonResult;
use crate::types::decimal::Decimal;
use crate::types::integer::Int;
use crate::types::timestamp::Timestamp;
use crate::types::IonType;

/// The format-agnostic parser functionality needed to navigate within an Ion stream and read
/// the values encountered into native Rust data types.
///
/// RawReader implementations are not expected to interpret symbol table declarations, resolve
/// symbol IDs into text, or otherwise interpret system-level constructs for use at a user
/// level; that is the [SystemReader](crate::system_reader::SystemReader)'s job.
///
/// Once a value has successfully been read from the stream using one of the read_* functions,
/// calling that function again at the same position returns an `Err`.
pub trait RawReader {
    /// Returns the (major, minor) version of the Ion stream being read. If ion_version is
    /// called before an Ion Version Marker has been read, the version (1, 0) will be returned.
    fn ion_version(&self) -> (u8, u8);

    /// Attempts to advance the cursor to the next value in the stream at the current depth.
    fn next(&mut self) -> IonResult<RawStreamItem>;

    /// Returns a value describing the stream entity over which the reader is currently
    /// positioned.
    fn current(&self) -> RawStreamItem;

    /// If the current item is a value, returns that value's Ion type. Otherwise, returns None.
    fn ion_type(&self) -> Option<IonType>;

    /// Returns true if the current value is a null of any type; otherwise, returns false.
    fn is_null(&self) -> bool;

    /// Returns a slice containing all of the annotations for the current value.
    /// If there is no current value, returns an empty slice.
    fn annotations(&self) -> &[RawSymbolToken];

    /// If the current item is a field within a struct, returns the token specified for the
    /// field's name; otherwise, returns None.
    fn field_name(&self) -> Option<&RawSymbolToken>;

    /// Attempts to read the current item as an Ion null and return its Ion type.
    fn read_null(&mut self) -> IonResult<IonType>;

    /// Attempts to read the current item as an Ion boolean.
    fn read_bool(&mut self) -> IonResult<bool>;

    /// Attempts to read the current item as an Ion integer that fits in an i64. If the value
    /// is too large, an error is returned; [RawReader::read_int] never overflows.
    fn read_i64(&mut self) -> IonResult<i64>;

    /// Attempts to read the current item as an Ion integer of arbitrary size.
    fn read_int(&mut self) -> IonResult<Int>;

    /// Attempts to read the current item as an Ion float, narrowed to an f32.
    fn read_f32(&mut self) -> IonResult<f32>;

    /// Attempts to read the current item as an Ion float.
    fn read_f64(&mut self) -> IonResult<f64>;

    /// Attempts to read the current item as an Ion decimal.
    fn read_decimal(&mut self) -> IonResult<Decimal>;

    /// Attempts to read the current item as an Ion string.
    fn read_string(&mut self) -> IonResult<String>;

    /// Attempts to read the current item as an Ion symbol. The token may be a symbol ID or
    /// inline text depending on the encoding.
    fn read_symbol(&mut self) -> IonResult<RawSymbolToken>;

    /// Attempts to read the current item as an Ion blob.
    fn read_blob(&mut self) -> IonResult<Vec<u8>>;

    /// Attempts to read the current item as an Ion clob.
    fn read_clob(&mut self) -> IonResult<Vec<u8>>;

    /// Attempts to read the current item as an Ion timestamp.
    fn read_timestamp(&mut self) -> IonResult<Timestamp>;

    /// If the current value is a container (i.e. a struct, list, or s-expression), positions
    /// the cursor at the beginning of that container's sequence of child values. The
    /// application must call [RawReader::next] to advance to the first child value.
    fn step_in(&mut self) -> IonResult<()>;

    /// Positions the cursor at the end of the container currently being traversed, skipping
    /// any child values that were not read. Calling [RawReader::next] will position the cursor
    /// over the item that follows the container.
    fn step_out(&mut self) -> IonResult<()>;

    /// If the reader is positioned at the top level, returns `None`. Otherwise, returns
    /// `Some(_)` with the parent container's [IonType].
    fn parent_type(&self) -> Option<IonType>;

    /// Returns the number of containers the reader has stepped into without later stepping
    /// out. At the top level, this method returns `0`.
    fn depth(&self) -> usize;
}

/// Raw stream elements that a [RawReader] may encounter.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum RawStreamItem {
    /// An Ion Version Marker (IVM) indicating the Ion major and minor version that were used
    /// to encode the values that follow.
    VersionMarker(u8, u8),
    /// A non-null Ion value and its corresponding Ion data type.
    /// Stream values that represent system constructs (e.g. a struct marked with a
    /// $ion_symbol_table annotation) are still considered values at the raw level.
    Value(IonType),
    /// A null Ion value and its corresponding Ion data type.
    Null(IonType),
    /// Indicates that the reader is not positioned over anything. This can happen:
    /// * before the reader has begun processing the stream.
    /// * after the reader has stepped into a container, but before the reader has called next()
    /// * after the reader has stepped out of a container, but before the reader has called next()
    /// * after the reader has read the last item in a container
    Nothing,
}

impl RawStreamItem {
    /// If `is_null` is `true`, returns `RawStreamItem::Null(ion_type)`. Otherwise,
    /// returns `RawStreamItem::Value(ion_type)`.
    pub fn nullable_value(ion_type: IonType, is_null: bool) -> RawStreamItem {
        if is_null {
            RawStreamItem::Null(ion_type)
        } else {
            RawStreamItem::Value(ion_type)
        }
    }
}

impl Display for RawStreamItem {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use RawStreamItem::*;
        match self {
            VersionMarker(major, minor) => write!(f, "ion version marker (v{major}.{minor})"),
            Value(ion_type) => write!(f, "{ion_type}"),
            Null(ion_type) => write!(f, "null.{ion_type}"),
            Nothing => write!(f, "nothing/end-of-sequence"),
        }
    }
}

impl<R: RawReader + ?Sized> RawReader for Box<R> {
    #[inline]
    fn ion_version(&self) -> (u8, u8) {
        (**self).ion_version()
    }

    fn next(&mut self) -> IonResult<RawStreamItem> {
        (**self).next()
    }

    fn current(&self) -> RawStreamItem {
        (**self).current()
    }

    fn ion_type(&self) -> Option<IonType> {
        (**self).ion_type()
    }

    fn is_null(&self) -> bool {
        (**self).is_null()
    }

    fn annotations(&self) -> &[RawSymbolToken] {
        (**self).annotations()
    }

    fn field_name(&self) -> Option<&RawSymbolToken> {
        (**self).field_name()
    }

    fn read_null(&mut self) -> IonResult<IonType> {
        (**self).read_null()
    }

    fn read_bool(&mut self) -> IonResult<bool> {
        (**self).read_bool()
    }

    fn read_i64(&mut self) -> IonResult<i64> {
        (**self).read_i64()
    }

    fn read_int(&mut self) -> IonResult<Int> {
        (**self).read_int()
    }

    fn read_f32(&mut self) -> IonResult<f32> {
        (**self).read_f32()
    }

    fn read_f64(&mut self) -> IonResult<f64> {
        (**self).read_f64()
    }

    fn read_decimal(&mut self) -> IonResult<Decimal> {
        (**self).read_decimal()
    }

    fn read_string(&mut self) -> IonResult<String> {
        (**self).read_string()
    }

    fn read_symbol(&mut self) -> IonResult<RawSymbolToken> {
        (**self).read_symbol()
    }

    fn read_blob(&mut self) -> IonResult<Vec<u8>> {
        (**self).read_blob()
    }

    fn read_clob(&mut self) -> IonResult<Vec<u8>> {
        (**self).read_clob()
    }

    fn read_timestamp(&mut self) -> IonResult<Timestamp> {
        (**self).read_timestamp()
    }

    fn step_in(&mut self) -> IonResult<()> {
        (**self).step_in()
    }

    fn step_out(&mut self) -> IonResult<()> {
        (**self).step_out()
    }

    fn parent_type(&self) -> Option<IonType> {
        (**self).parent_type()
    }

    fn depth(&self) -> usize {
        (**self).depth()
    }
}
