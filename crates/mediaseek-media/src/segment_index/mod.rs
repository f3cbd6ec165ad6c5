//! Seekable segment indexes.
//!
//! A segment index splits a container file into contiguous byte ranges, one
//! per fragment (MP4) or cluster (Matroska), each tagged with the
//! presentation time of its first frame. The first segment always starts at
//! offset 0 so that it carries the file header needed to initialize a decoder.

mod builder;

pub use builder::SegmentListBuilder;

use crate::matroska::MatroskaIndex;
use crate::mp4::Mp4Index;
use crate::region::{ByteSource, SeekSource};
use crate::Result;
use mediaseek_common::ContainerFormat;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// One independently playable byte range of a container file.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct MediaSegment {
    /// Absolute file offset of the first byte.
    pub offset: u64,
    /// Length in bytes.
    pub size: u64,
    /// Presentation time of the first frame, in seconds.
    pub timestamp_secs: f64,
}

impl MediaSegment {
    /// Offset one past the last byte.
    pub fn end(&self) -> u64 {
        self.offset + self.size
    }

    pub fn contains(&self, offset: u64) -> bool {
        offset >= self.offset && offset < self.end()
    }
}

/// Anything that exposes per-track segment lists.
pub trait MediaSegments {
    /// Segment lists, outer index = track. Matroska yields a single list.
    fn media_segments(&self) -> &[Vec<MediaSegment>];
}

/// Format-independent segment index of one file.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct SegmentIndex {
    pub format: ContainerFormat,
    /// Total size of the indexed file in bytes.
    pub file_size: u64,
    pub tracks: Vec<Vec<MediaSegment>>,
}

impl SegmentIndex {
    /// Index the file at `path`.
    ///
    /// The file is only held open while parsing.
    pub fn open<P: AsRef<Path>>(path: P, format: ContainerFormat) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), %format, "Indexing file");

        let file = File::open(path)?;
        let source = SeekSource::new(BufReader::new(file))?;
        Self::parse(&source, format)
    }

    /// Index an in-memory or otherwise already opened source.
    pub fn parse<S: ByteSource + ?Sized>(source: &S, format: ContainerFormat) -> Result<Self> {
        let tracks = match format {
            ContainerFormat::Mp4 => Mp4Index::parse(source)?.into_segments(),
            ContainerFormat::Matroska => MatroskaIndex::parse(source)?.into_segments(),
        };

        Ok(Self {
            format,
            file_size: source.len(),
            tracks,
        })
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Segment list of track `index`, in file order.
    pub fn track(&self, index: usize) -> Option<&[MediaSegment]> {
        self.tracks.get(index).map(Vec::as_slice)
    }

    /// The segment to start playback from to reach `secs` on `track`.
    ///
    /// Picks the last segment whose timestamp is at or before `secs`; times
    /// before the first segment resolve to the first segment.
    pub fn segment_at_time(&self, track: usize, secs: f64) -> Option<(usize, &MediaSegment)> {
        let segments = self.track(track)?;
        if segments.is_empty() {
            return None;
        }
        let idx = segments
            .partition_point(|s| s.timestamp_secs <= secs)
            .saturating_sub(1);
        Some((idx, &segments[idx]))
    }

    /// The segment of `track` whose byte range contains `offset`.
    pub fn segment_at_offset(&self, track: usize, offset: u64) -> Option<(usize, &MediaSegment)> {
        let segments = self.track(track)?;
        let idx = segments.partition_point(|s| s.end() <= offset);
        segments
            .get(idx)
            .filter(|s| s.contains(offset))
            .map(|s| (idx, s))
    }
}

impl MediaSegments for SegmentIndex {
    fn media_segments(&self) -> &[Vec<MediaSegment>] {
        &self.tracks
    }
}
