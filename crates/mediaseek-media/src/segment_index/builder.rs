//! Segment list builder.

use super::MediaSegment;
use crate::{Error, Result};

/// Builds one track's segment list from segment start offsets.
///
/// Each segment runs up to the start of the next one; the last runs up to the
/// `end` passed to [`SegmentListBuilder::finish`]. The leading header bytes
/// before the first segment are folded into it, so the finished list always
/// starts at offset 0 and covers `[0, end)` without gaps.
#[derive(Debug, Default)]
pub struct SegmentListBuilder {
    starts: Vec<(u64, f64)>,
}

impl SegmentListBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder with room for `capacity` segments.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            starts: Vec::with_capacity(capacity),
        }
    }

    /// Add a segment starting at `offset` with the given presentation time.
    pub fn push(&mut self, offset: u64, timestamp_secs: f64) -> &mut Self {
        self.starts.push((offset, timestamp_secs));
        self
    }

    pub fn len(&self) -> usize {
        self.starts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }

    /// Compute sizes and fold the leading header into the first segment.
    ///
    /// Fails if offsets are not strictly ascending or `end` does not lie past
    /// the last offset.
    pub fn finish(self, end: u64) -> Result<Vec<MediaSegment>> {
        let Some(&(last_offset, _)) = self.starts.last() else {
            return Ok(Vec::new());
        };
        if end <= last_offset {
            return Err(Error::malformed(format!(
                "segment at offset {last_offset} ends at {end}"
            )));
        }

        let mut segments = Vec::with_capacity(self.starts.len());
        for (i, &(offset, timestamp_secs)) in self.starts.iter().enumerate() {
            let next = self.starts.get(i + 1).map_or(end, |&(next, _)| next);
            if next <= offset {
                return Err(Error::malformed(format!(
                    "segment offsets not ascending: {offset} followed by {next}"
                )));
            }
            segments.push(MediaSegment {
                offset,
                size: next - offset,
                timestamp_secs,
            });
        }

        let first = &mut segments[0];
        first.size += first.offset;
        first.offset = 0;

        Ok(segments)
    }
}
