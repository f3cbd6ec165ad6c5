//! EBML element headers and sibling iteration.

use crate::ebml::{read_element_header, uint_be};
use crate::region::{ByteRegion, ByteSource, RegionReader};
use crate::{Error, Result};

/// EBML and Matroska element IDs, kept with their marker bits.
pub mod ids {
    pub const EBML: u32 = 0x1A45_DFA3;
    pub const DOC_TYPE: u32 = 0x4282;
    pub const SEGMENT: u32 = 0x1853_8067;
    pub const SEEK_HEAD: u32 = 0x114D_9B74;
    pub const INFO: u32 = 0x1549_A966;
    pub const TIMESTAMP_SCALE: u32 = 0x2A_D7B1;
    pub const TRACKS: u32 = 0x1654_AE6B;
    pub const CLUSTER: u32 = 0x1F43_B675;
    pub const CLUSTER_TIMESTAMP: u32 = 0xE7;
    pub const CUES: u32 = 0x1C53_BB6B;
    pub const CHAPTERS: u32 = 0x1043_A770;
    pub const TAGS: u32 = 0x1254_C367;
    pub const ATTACHMENTS: u32 = 0x1941_A469;
    pub const VOID: u32 = 0xEC;

    /// Elements that sit directly under Segment. One of these, or another
    /// Segment, closes an unknown-size Cluster.
    pub fn is_segment_child(id: u32) -> bool {
        matches!(
            id,
            SEEK_HEAD | INFO | TRACKS | CLUSTER | CUES | CHAPTERS | TAGS | ATTACHMENTS | SEGMENT
        )
    }
}

/// Human-readable name of the element IDs this crate knows.
pub fn element_name(id: u32) -> Option<&'static str> {
    Some(match id {
        ids::EBML => "EBML",
        ids::DOC_TYPE => "DocType",
        ids::SEGMENT => "Segment",
        ids::SEEK_HEAD => "SeekHead",
        ids::INFO => "Info",
        ids::TIMESTAMP_SCALE => "TimestampScale",
        ids::TRACKS => "Tracks",
        ids::CLUSTER => "Cluster",
        ids::CLUSTER_TIMESTAMP => "Timestamp",
        ids::CUES => "Cues",
        ids::CHAPTERS => "Chapters",
        ids::TAGS => "Tags",
        ids::ATTACHMENTS => "Attachments",
        ids::VOID => "Void",
        _ => return None,
    })
}

/// One EBML element located in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EbmlElement {
    pub id: u32,
    /// Absolute offset of the ID's first byte.
    pub offset: u64,
    /// Length of the ID and size VINTs.
    pub header_size: u64,
    /// Payload, excluding the header.
    pub content: ByteRegion,
}

impl EbmlElement {
    /// Total size including the header.
    pub fn size(&self) -> u64 {
        self.header_size + self.content.len()
    }

    pub fn end(&self) -> u64 {
        self.content.end()
    }

    /// Decode the payload as an unsigned integer; an empty payload is 0.
    pub fn read_uint<S: ByteSource + ?Sized>(&self, source: &S) -> Result<u64> {
        if self.content.len() > 8 {
            return Err(Error::malformed(format!(
                "unsigned element {:#X} at offset {} has {} bytes",
                self.id,
                self.offset,
                self.content.len()
            )));
        }
        let bytes = RegionReader::new(source, self.content).read_exact(self.content.len())?;
        uint_be(&bytes)
    }

    /// Decode the payload as a string, dropping trailing NUL padding.
    pub fn read_string<S: ByteSource + ?Sized>(&self, source: &S) -> Result<String> {
        let bytes = RegionReader::new(source, self.content).read_exact(self.content.len())?;
        let text = String::from_utf8_lossy(&bytes);
        Ok(text.trim_end_matches('\0').to_string())
    }
}

/// Read one element header at the cursor and advance past the element.
///
/// A `Segment` with unknown size extends to the end of the reader's region.
/// A `Cluster` with unknown size, as live WebM writers emit, ends where the
/// next Segment-level element starts, or at the region end. Any other
/// unknown-size element is [`Error::UnsupportedVariant`].
pub fn read_element<S: ByteSource + ?Sized>(
    reader: &mut RegionReader<'_, S>,
) -> Result<EbmlElement> {
    let offset = reader.position();
    let (id, size) = read_element_header(reader)?;
    let header_size = reader.position() - offset;

    let len = if !size.is_unknown_size() {
        Some(size.value)
    } else if id == ids::SEGMENT {
        None
    } else if id == ids::CLUSTER {
        Some(unknown_size_cluster_len(reader)?)
    } else {
        return Err(Error::unsupported(format!(
            "unknown-size element {:#X} at offset {offset}",
            id
        )));
    };

    let content = reader.region().slice(reader.position(), len)?;
    reader.skip(content.len());

    Ok(EbmlElement {
        id,
        offset,
        header_size,
        content,
    })
}

/// Payload length of an unknown-size Cluster whose payload starts at the
/// cursor, found by walking its children.
fn unknown_size_cluster_len<S: ByteSource + ?Sized>(
    reader: &RegionReader<'_, S>,
) -> Result<u64> {
    let start = reader.position();
    let mut children = reader.sub_reader(start, None)?;

    while !children.is_at_end() {
        let child_offset = children.position();
        let (id, size) = read_element_header(&mut children)?;
        if ids::is_segment_child(id) {
            return Ok(child_offset - start);
        }
        if size.is_unknown_size() {
            return Err(Error::unsupported(format!(
                "unknown-size element {:#X} at offset {child_offset} inside an unknown-size Cluster",
                id
            )));
        }
        let content = children.region().slice(children.position(), Some(size.value))?;
        children.skip(content.len());
    }

    Ok(children.position() - start)
}

/// Iterator over sibling elements. Stops after the first error.
pub struct Elements<'s, S: ?Sized> {
    reader: RegionReader<'s, S>,
    failed: bool,
}

impl<'s, S: ByteSource + ?Sized> Iterator for Elements<'s, S> {
    type Item = Result<EbmlElement>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.reader.is_at_end() {
            return None;
        }
        let item = read_element(&mut self.reader);
        self.failed = item.is_err();
        Some(item)
    }
}

/// Iterate the elements laid out back to back in `region`.
pub fn elements<S: ByteSource + ?Sized>(source: &S, region: ByteRegion) -> Elements<'_, S> {
    Elements {
        reader: RegionReader::new(source, region),
        failed: false,
    }
}

/// First element with `id` among the direct children of `region`.
pub fn find<S: ByteSource + ?Sized>(
    source: &S,
    region: ByteRegion,
    id: u32,
) -> Result<Option<EbmlElement>> {
    for item in elements(source, region) {
        let element = item?;
        if element.id == id {
            return Ok(Some(element));
        }
    }
    Ok(None)
}

/// Like [`find`], but a missing element is [`Error::MissingRequiredElement`].
pub fn require<S: ByteSource + ?Sized>(
    source: &S,
    region: ByteRegion,
    id: u32,
    name: &'static str,
) -> Result<EbmlElement> {
    find(source, region, id)?.ok_or(Error::MissingRequiredElement(name))
}
