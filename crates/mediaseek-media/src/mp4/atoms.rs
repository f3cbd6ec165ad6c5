//! MP4 box header definitions and sibling iteration.

use crate::region::{ByteRegion, ByteSource, RegionReader};
use crate::{Error, Result};

/// Box type: a four-character code, or a 16-byte extended type for `uuid` boxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoxType {
    /// Plain four-character code.
    Tag([u8; 4]),
    /// `uuid` box carrying a 16-byte user type.
    Uuid([u8; 16]),
}

impl BoxType {
    pub const FTYP: Self = Self::Tag(*b"ftyp");
    pub const MOOV: Self = Self::Tag(*b"moov");
    pub const MVHD: Self = Self::Tag(*b"mvhd");
    pub const TRAK: Self = Self::Tag(*b"trak");
    pub const TKHD: Self = Self::Tag(*b"tkhd");
    pub const EDTS: Self = Self::Tag(*b"edts");
    pub const ELST: Self = Self::Tag(*b"elst");
    pub const MDIA: Self = Self::Tag(*b"mdia");
    pub const MDHD: Self = Self::Tag(*b"mdhd");
    pub const MVEX: Self = Self::Tag(*b"mvex");
    pub const MOOF: Self = Self::Tag(*b"moof");
    pub const MFHD: Self = Self::Tag(*b"mfhd");
    pub const TRAF: Self = Self::Tag(*b"traf");
    pub const TFHD: Self = Self::Tag(*b"tfhd");
    pub const TFDT: Self = Self::Tag(*b"tfdt");
    pub const TRUN: Self = Self::Tag(*b"trun");
    pub const MDAT: Self = Self::Tag(*b"mdat");
    pub const SIDX: Self = Self::Tag(*b"sidx");
    pub const FREE: Self = Self::Tag(*b"free");

    /// Create from a four-character code.
    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        Self::Tag(bytes)
    }

    /// Serialized type bytes: 4 for a tag, 20 (`uuid` + user type) for an extended type.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Tag(tag) => tag.to_vec(),
            Self::Uuid(user) => {
                let mut bytes = b"uuid".to_vec();
                bytes.extend_from_slice(user);
                bytes
            }
        }
    }

    pub fn is_uuid(&self) -> bool {
        matches!(self, Self::Uuid(_))
    }
}

impl std::fmt::Display for BoxType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tag(tag) => write!(f, "{}", std::str::from_utf8(tag).unwrap_or("????")),
            Self::Uuid(user) => {
                write!(f, "uuid:")?;
                for b in user {
                    write!(f, "{b:02x}")?;
                }
                Ok(())
            }
        }
    }
}

/// Parsed box header.
#[derive(Debug, Clone)]
pub struct Mp4Box {
    /// Box type.
    pub box_type: BoxType,
    /// File offset of the first header byte.
    pub offset: u64,
    /// Box size including header.
    pub size: u64,
    /// Header size (8, 16, 24 or 32 bytes).
    pub header_size: u64,
    /// Region holding the box payload.
    pub content: ByteRegion,
}

impl Mp4Box {
    /// Exclusive end offset of the whole box.
    pub fn end(&self) -> u64 {
        self.offset + self.size
    }
}

/// Read one box header at the cursor and advance past the whole box.
///
/// `size == 1` pulls a 64-bit size from the next 8 bytes; `size == 0` runs the
/// box to the end of the reader's region.
pub fn read_box<S: ByteSource + ?Sized>(reader: &mut RegionReader<'_, S>) -> Result<Mp4Box> {
    let offset = reader.position();
    let compact_size = reader.read_u32()?;
    let tag: [u8; 4] = reader.read_array()?;

    let size = match compact_size {
        1 => reader.read_u64()?,
        0 => reader.region().end() - offset,
        n => n as u64,
    };

    let box_type = if &tag == b"uuid" {
        BoxType::Uuid(reader.read_array()?)
    } else {
        BoxType::Tag(tag)
    };

    let header_size = reader.position() - offset;
    if size < header_size {
        return Err(Error::malformed(format!(
            "box {box_type} at offset {offset} declares size {size}, smaller than its {header_size}-byte header"
        )));
    }

    let content = reader
        .region()
        .slice(reader.position(), Some(size - header_size))?;
    reader.skip(content.len());

    Ok(Mp4Box {
        box_type,
        offset,
        size,
        header_size,
        content,
    })
}

/// Iterator over the sibling boxes of a region.
///
/// Stops after the first error.
pub struct Boxes<'s, S: ?Sized> {
    reader: RegionReader<'s, S>,
    failed: bool,
}

impl<'s, S: ByteSource + ?Sized> Iterator for Boxes<'s, S> {
    type Item = Result<Mp4Box>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.reader.is_at_end() {
            return None;
        }
        let item = read_box(&mut self.reader);
        self.failed = item.is_err();
        Some(item)
    }
}

/// Iterate the boxes laid out back to back in `region`.
pub fn boxes<S: ByteSource + ?Sized>(source: &S, region: ByteRegion) -> Boxes<'_, S> {
    Boxes {
        reader: RegionReader::new(source, region),
        failed: false,
    }
}

/// First box of `box_type` in `region`, in any sibling position.
pub fn find<S: ByteSource + ?Sized>(
    source: &S,
    region: ByteRegion,
    box_type: BoxType,
) -> Result<Option<Mp4Box>> {
    for item in boxes(source, region) {
        let b = item?;
        if b.box_type == box_type {
            return Ok(Some(b));
        }
    }
    Ok(None)
}

/// Every box of `box_type` in `region`, in file order.
pub fn find_all<S: ByteSource + ?Sized>(
    source: &S,
    region: ByteRegion,
    box_type: BoxType,
) -> Result<Vec<Mp4Box>> {
    boxes(source, region)
        .filter(|item| !matches!(item, Ok(b) if b.box_type != box_type))
        .collect()
}

/// Like [`find`], but a missing box is [`Error::MissingRequiredElement`].
pub fn require<S: ByteSource + ?Sized>(
    source: &S,
    region: ByteRegion,
    box_type: BoxType,
    name: &'static str,
) -> Result<Mp4Box> {
    find(source, region, box_type)?.ok_or(Error::MissingRequiredElement(name))
}

/// Version/flags prefix shared by "full" boxes.
#[derive(Debug, Clone, Copy)]
pub struct FullBox {
    pub version: u8,
    pub flags: u32,
    /// Payload after the 4-byte version/flags prefix.
    pub body: ByteRegion,
}

impl FullBox {
    pub fn parse<S: ByteSource + ?Sized>(source: &S, b: &Mp4Box) -> Result<Self> {
        let mut reader = RegionReader::new(source, b.content);
        let version = reader.read_u8()?;
        let flags = reader.read_u24()?;
        let body = b.content.slice(reader.position(), None)?;
        Ok(Self {
            version,
            flags,
            body,
        })
    }

    /// Reader positioned at the start of the body.
    pub fn reader<'s, S: ByteSource + ?Sized>(&self, source: &'s S) -> RegionReader<'s, S> {
        RegionReader::new(source, self.body)
    }

    /// Width of version-dependent time fields: 8 bytes for version 1, else 4.
    pub fn time_width(&self) -> u64 {
        if self.version == 1 {
            8
        } else {
            4
        }
    }

    /// Reject versions other than 0 and 1.
    pub fn expect_version_0_or_1(&self, box_type: BoxType) -> Result<()> {
        if self.version > 1 {
            return Err(Error::unsupported(format!(
                "{box_type} version {}",
                self.version
            )));
        }
        Ok(())
    }
}
