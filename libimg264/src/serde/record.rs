use std::io::{self, Read, Write};

use nom::{combinator::map, number::complete as number, IResult};
use tracing::trace;

use super::{
    field::{FieldSpec, Layout, Value, Width},
    utils::read_up_to,
};
use crate::Error;

/// A fixed-size binary record described by a static [`Layout`]
pub trait Record: Sized {
    /// The on-disk layout of the record
    const LAYOUT: Layout;

    /// Builds the record from values decoded in [`Self::LAYOUT`] order.
    /// Returns `None` if the values do not line up with the layout.
    fn from_fields(fields: &mut Fields<'_>) -> Option<Self>;

    /// Returns the values of the record in [`Self::LAYOUT`] order
    fn to_values(&self) -> Vec<Value>;
}

/// Cursor over decoded values, handed to [`Record::from_fields`]
#[derive(Debug)]
pub struct Fields<'a> {
    values: std::slice::Iter<'a, Value>,
}

impl<'a> Fields<'a> {
    fn new(values: &'a [Value]) -> Self {
        Self {
            values: values.iter(),
        }
    }

    /// Takes the next value as a `u16`
    pub fn u16(&mut self) -> Option<u16> {
        match self.values.next()? {
            Value::U16(v) => Some(*v),
            _ => None,
        }
    }

    /// Takes the next value as a `u32`
    pub fn u32(&mut self) -> Option<u32> {
        match self.values.next()? {
            Value::U32(v) => Some(*v),
            _ => None,
        }
    }

    /// Takes the next value as an `i32`
    pub fn i32(&mut self) -> Option<i32> {
        match self.values.next()? {
            Value::I32(v) => Some(*v),
            _ => None,
        }
    }
}

fn parse_field<'a>(spec: &FieldSpec, input: &'a [u8]) -> IResult<&'a [u8], Value> {
    match spec.width {
        Width::U16 => map(number::u16(spec.endian), Value::U16)(input),
        Width::U32 => map(number::u32(spec.endian), Value::U32)(input),
        Width::I32 => map(number::i32(spec.endian), Value::I32)(input),
    }
}

fn parse_values<'a>(layout: &Layout, input: &'a [u8]) -> IResult<&'a [u8], Vec<Value>> {
    let mut values = Vec::with_capacity(layout.fields.len());
    let mut rest = input;
    for spec in layout.fields {
        let (remaining, value) = parse_field(spec, rest)?;
        trace!("{}.{} = {:?}", layout.name, spec.name, value);
        values.push(value);
        rest = remaining;
    }
    Ok((rest, values))
}

/// Reads one `R` from the stream
///
/// # Errors
///
/// Returns [`Error::TruncatedHeader`] if fewer than `R::LAYOUT.size()` bytes are available,
/// or [`Error::Io`] if reading fails.
pub fn read_record<R: Record>(r: &mut impl Read) -> Result<R, Error> {
    let expected = R::LAYOUT.size();
    let buf = read_up_to(r, expected)?;
    let truncated = || Error::TruncatedHeader {
        expected,
        actual: buf.len(),
    };
    if buf.len() < expected {
        return Err(truncated());
    }
    let (_, values) = parse_values(&R::LAYOUT, &buf).map_err(|_| truncated())?;
    R::from_fields(&mut Fields::new(&values)).ok_or_else(|| {
        Error::Io(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "{} v{} does not match its field list",
                R::LAYOUT.name,
                R::LAYOUT.version
            ),
        ))
    })
}

/// Serializes `record` verbatim
///
/// # Errors
///
/// Returns [`Error::IncompleteWrite`] if the record cannot be fully written.
pub fn write_record<R: Record>(w: &mut impl Write, record: &R) -> Result<(), Error> {
    let layout = R::LAYOUT;
    let values = record.to_values();
    debug_assert_eq!(values.len(), layout.fields.len());
    let mut buf = Vec::with_capacity(layout.size());
    for (spec, value) in layout.fields.iter().zip(values) {
        debug_assert_eq!(spec.width, value.width(), "{}.{}", layout.name, spec.name);
        value.encode(spec.endian, &mut buf);
    }
    w.write_all(&buf).map_err(|source| Error::IncompleteWrite {
        section: layout.name,
        source,
    })
}
