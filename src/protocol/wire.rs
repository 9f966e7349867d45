//! TLV framing and fixed-width field encodings.
//!
//! A record is `type: u16 BE ‖ length: u16 BE ‖ value`. Inside `value`, SMP
//! messages are a plain concatenation of fixed-width fields read back with a
//! [`FieldReader`] cursor in schema order.

use crate::{Error, Group, Result};

/// A 2-byte big-endian unsigned integer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Short(pub u16);

impl Short {
    /// Encoded width in bytes.
    pub const SIZE: usize = 2;

    /// Encodes to big-endian bytes.
    pub fn to_bytes(self) -> [u8; Self::SIZE] {
        self.0.to_be_bytes()
    }

    /// Decodes exactly [`Short::SIZE`] bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; Self::SIZE] = bytes.try_into().map_err(|_| {
            Error::MalformedInput(format!(
                "Expected {} bytes for a short, got {}",
                Self::SIZE,
                bytes.len()
            ))
        })?;
        Ok(Short(u16::from_be_bytes(arr)))
    }
}

impl From<u16> for Short {
    fn from(v: u16) -> Self {
        Short(v)
    }
}

/// Kind of a fixed-width field in a message schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    /// [`Short`], 2 bytes.
    Short,
    /// Group scalar, [`Group::SCALAR_BYTES`] bytes.
    Scalar,
    /// Group element, [`Group::ELEMENT_BYTES`] bytes.
    Point,
}

impl FieldKind {
    /// Encoded width of this field kind for group `G`.
    pub fn width<G: Group>(self) -> usize {
        match self {
            FieldKind::Short => Short::SIZE,
            FieldKind::Scalar => G::SCALAR_BYTES,
            FieldKind::Point => G::ELEMENT_BYTES,
        }
    }
}

/// A decoded field value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Field<G: Group> {
    /// A short integer.
    Short(Short),
    /// A scalar.
    Scalar(G::Scalar),
    /// A group element.
    Point(G::Element),
}

impl<G: Group> Field<G> {
    /// Returns the kind of this field.
    pub fn kind(&self) -> FieldKind {
        match self {
            Field::Short(_) => FieldKind::Short,
            Field::Scalar(_) => FieldKind::Scalar,
            Field::Point(_) => FieldKind::Point,
        }
    }

    /// Appends the fixed-width encoding of this field to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            Field::Short(v) => out.extend_from_slice(&v.to_bytes()),
            Field::Scalar(s) => out.extend_from_slice(&G::scalar_to_bytes(s)),
            Field::Point(p) => out.extend_from_slice(&G::element_to_bytes(p)),
        }
    }
}

/// A type-length-value record.
///
/// The length is implied by `value` and is always at most `u16::MAX`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tlv {
    tlv_type: Short,
    value: Vec<u8>,
}

impl Tlv {
    /// Size of the type and length header.
    pub const HEADER_SIZE: usize = 2 * Short::SIZE;

    /// Creates a record, rejecting values longer than `u16::MAX`.
    pub fn new(tlv_type: impl Into<Short>, value: Vec<u8>) -> Result<Self> {
        if value.len() > usize::from(u16::MAX) {
            return Err(Error::MalformedInput(format!(
                "TLV value of {} bytes does not fit a 16-bit length",
                value.len()
            )));
        }
        Ok(Self {
            tlv_type: tlv_type.into(),
            value,
        })
    }

    /// Builds a record from a value whose length is known to fit.
    pub(super) fn from_encoded(tlv_type: Short, value: Vec<u8>) -> Self {
        debug_assert!(value.len() <= usize::from(u16::MAX));
        Self { tlv_type, value }
    }

    /// Returns the record type.
    pub fn tlv_type(&self) -> Short {
        self.tlv_type
    }

    /// Returns the record value.
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Encodes the record.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::HEADER_SIZE + self.value.len());
        out.extend_from_slice(&self.tlv_type.to_bytes());
        // `new` bounds the length.
        out.extend_from_slice(&(self.value.len() as u16).to_be_bytes());
        out.extend_from_slice(&self.value);
        out
    }

    /// Decodes a record from the front of `bytes`.
    ///
    /// Fails when `bytes` holds fewer than `4 + length` bytes. Trailing bytes
    /// after the record are ignored.
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::HEADER_SIZE {
            return Err(Error::ProtocolViolation(format!(
                "TLV header needs {} bytes, got {}",
                Self::HEADER_SIZE,
                bytes.len()
            )));
        }
        let tlv_type = Short::from_bytes(&bytes[..Short::SIZE])?;
        let length = Short::from_bytes(&bytes[Short::SIZE..Self::HEADER_SIZE])?;
        let total = Self::HEADER_SIZE + usize::from(length.0);
        if bytes.len() < total {
            return Err(Error::ProtocolViolation(format!(
                "TLV declares {} value bytes but only {} are available",
                length.0,
                bytes.len() - Self::HEADER_SIZE
            )));
        }
        Ok(Self {
            tlv_type,
            value: bytes[Self::HEADER_SIZE..total].to_vec(),
        })
    }
}

/// Cursor over a TLV value that yields fixed-width fields in order.
pub struct FieldReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> FieldReader<'a> {
    /// Starts reading at the beginning of `bytes`.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    /// Number of bytes consumed so far.
    pub fn offset(&self) -> usize {
        self.offset
    }

    fn take(&mut self, width: usize) -> Result<&'a [u8]> {
        let end = self.offset + width;
        if end > self.bytes.len() {
            return Err(Error::ProtocolViolation(format!(
                "field at offset {} needs {} bytes, only {} remain",
                self.offset,
                width,
                self.bytes.len() - self.offset
            )));
        }
        let slice = &self.bytes[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    /// Reads one field of the given kind.
    pub fn read<G: Group>(&mut self, kind: FieldKind) -> Result<Field<G>> {
        let bytes = self.take(kind.width::<G>())?;
        Ok(match kind {
            FieldKind::Short => Field::Short(Short::from_bytes(bytes)?),
            FieldKind::Scalar => Field::Scalar(G::scalar_from_bytes(bytes)?),
            FieldKind::Point => Field::Point(G::element_from_bytes(bytes)?),
        })
    }

    /// Succeeds only if every byte has been consumed.
    pub fn finish(self) -> Result<()> {
        if self.offset != self.bytes.len() {
            return Err(Error::ProtocolViolation(format!(
                "{} residual bytes after the last field",
                self.bytes.len() - self.offset
            )));
        }
        Ok(())
    }
}

/// Reads `schema` from `value`, requiring the schema to consume it exactly.
pub fn read_fields<G: Group>(value: &[u8], schema: &[FieldKind]) -> Result<Vec<Field<G>>> {
    let mut reader = FieldReader::new(value);
    let fields = schema
        .iter()
        .map(|kind| reader.read::<G>(*kind))
        .collect::<Result<Vec<_>>>()?;
    reader.finish()?;
    Ok(fields)
}
