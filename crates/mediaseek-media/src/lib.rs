//! Mediaseek-Media: seekable segment indexes for fragmented MP4 and Matroska
//!
//! This crate splits a container file into independently playable byte
//! ranges so that a server can answer a seek with a plain HTTP range
//! request instead of remuxing.
//!
//! # Modules
//!
//! - `region` - Byte sources and bounded, cursor-based region readers
//! - `ebml` - EBML variable-length integers and big-endian decoding
//! - `mp4` - ISO-BMFF box model and fragmented MP4 indexing (moov/moof)
//! - `matroska` - EBML element model and cluster indexing
//! - `segment_index` - Segment lists and the format-independent index
//!
//! # Architecture
//!
//! Parsing never copies the file. Every box or element is a `(start, len)`
//! region over one shared source, and child regions are checked against
//! their parent, so a corrupt size field fails the parse instead of reading
//! a neighbour's bytes. An index is built in one synchronous pass:
//!
//! 1. Locate the movie header (`moov`) or the Matroska `Segment` and `Info`
//! 2. Visit every `moof`/`traf` or `Cluster` and record its offset and time
//! 3. Turn the offsets into contiguous `(offset, size)` segments, folding the
//!    file header into the first one
//!
//! ```no_run
//! use mediaseek_common::ContainerFormat;
//! use mediaseek_media::SegmentIndex;
//!
//! let index = SegmentIndex::open("movie.mp4", ContainerFormat::Mp4)?;
//! if let Some((i, segment)) = index.segment_at_time(0, 42.0) {
//!     println!("segment {i}: bytes {}-{}", segment.offset, segment.end() - 1);
//! }
//! # Ok::<(), mediaseek_media::Error>(())
//! ```

pub mod ebml;
pub mod error;
pub mod matroska;
pub mod mp4;
pub mod region;
pub mod segment_index;

pub use error::{Error, Result};
pub use matroska::MatroskaIndex;
pub use mp4::Mp4Index;
pub use region::{ByteRegion, ByteSource, RegionReader, SeekSource};
pub use segment_index::{MediaSegment, MediaSegments, SegmentIndex, SegmentListBuilder};
