use nom::number::Endianness;

/// On-disk width of a single header field
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Width {
    /// unsigned 16 bit integer
    U16,
    /// unsigned 32 bit integer
    U32,
    /// signed 32 bit integer
    I32,
}

impl Width {
    /// Number of bytes the field occupies
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Self::U16 => 2,
            Self::U32 | Self::I32 => 4,
        }
    }
}

/// A decoded field value
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Value {
    /// unsigned 16 bit value
    U16(u16),
    /// unsigned 32 bit value
    U32(u32),
    /// signed 32 bit value
    I32(i32),
}

impl Value {
    /// The [`Width`] this value is stored with
    #[must_use]
    pub const fn width(self) -> Width {
        match self {
            Self::U16(_) => Width::U16,
            Self::U32(_) => Width::U32,
            Self::I32(_) => Width::I32,
        }
    }

    pub(crate) fn encode(self, endian: Endianness, out: &mut Vec<u8>) {
        match (self, endian) {
            (Self::U16(v), Endianness::Little) => out.extend_from_slice(&v.to_le_bytes()),
            (Self::U16(v), Endianness::Big) => out.extend_from_slice(&v.to_be_bytes()),
            (Self::U16(v), Endianness::Native) => out.extend_from_slice(&v.to_ne_bytes()),
            (Self::U32(v), Endianness::Little) => out.extend_from_slice(&v.to_le_bytes()),
            (Self::U32(v), Endianness::Big) => out.extend_from_slice(&v.to_be_bytes()),
            (Self::U32(v), Endianness::Native) => out.extend_from_slice(&v.to_ne_bytes()),
            (Self::I32(v), Endianness::Little) => out.extend_from_slice(&v.to_le_bytes()),
            (Self::I32(v), Endianness::Big) => out.extend_from_slice(&v.to_be_bytes()),
            (Self::I32(v), Endianness::Native) => out.extend_from_slice(&v.to_ne_bytes()),
        }
    }
}

/// Describes one field of a fixed-layout binary record
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct FieldSpec {
    /// field name, used in diagnostics
    pub name: &'static str,
    /// on-disk width
    pub width: Width,
    /// byte order
    pub endian: Endianness,
}

impl FieldSpec {
    /// A little-endian field
    #[must_use]
    pub const fn le(name: &'static str, width: Width) -> Self {
        Self {
            name,
            width,
            endian: Endianness::Little,
        }
    }
}

/// Ordered, unpadded list of fields making up a binary record
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct Layout {
    /// record name, used in diagnostics
    pub name: &'static str,
    /// layout revision; bumped whenever `fields` changes
    pub version: u16,
    /// fields in on-disk order
    pub fields: &'static [FieldSpec],
}

impl Layout {
    /// Total size of the record in bytes
    #[must_use]
    pub const fn size(&self) -> usize {
        let mut size = 0;
        let mut i = 0;
        while i < self.fields.len() {
            size += self.fields[i].width.size();
            i += 1;
        }
        size
    }
}
