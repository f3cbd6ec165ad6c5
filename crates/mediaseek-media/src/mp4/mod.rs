//! Fragmented MP4 (ISO-BMFF) segment indexing.
//!
//! The index is built from the top-level `moov` and every top-level `moof`:
//! each track fragment (`traf`) starts a new segment for its track, timed by
//! the fragment's base media decode time plus the first sample's composition
//! offset, shifted by the track's edit list.

mod atoms;
mod fragment;
mod movie;

pub use atoms::{boxes, find, find_all, read_box, require, BoxType, Boxes, FullBox, Mp4Box};
pub use fragment::{
    parse_tfdt, MovieFragment, TfhdFlags, TrackFragment, TrackFragmentHeader, TrackRun, TrunFlags,
};
pub use movie::{EditEntry, EditList, MediaHeader, Movie, MovieHeader, Track, TrackHeader};

use crate::region::{ByteRegion, ByteSource, SeekSource};
use crate::segment_index::{MediaSegment, MediaSegments, SegmentListBuilder};
use crate::{Error, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Segment index of a fragmented MP4 file.
#[derive(Debug, Clone)]
pub struct Mp4Index {
    pub movie: Movie,
    /// Movie fragments in file order.
    pub fragments: Vec<MovieFragment>,
    pub file_size: u64,
    /// One list per `trak`, in `trak` order.
    segments: Vec<Vec<MediaSegment>>,
}

impl Mp4Index {
    /// Index the fragmented MP4 file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let source = SeekSource::new(BufReader::new(file))?;
        Self::parse(&source)
    }

    /// Index a fragmented MP4 source.
    pub fn parse<S: ByteSource + ?Sized>(source: &S) -> Result<Self> {
        let file_size = source.len();

        let mut moov = None;
        let mut fragments = Vec::new();
        for item in boxes(source, ByteRegion::whole(source)) {
            let b = item?;
            if b.box_type == BoxType::MOOV {
                if moov.is_none() {
                    moov = Some(b);
                }
            } else if b.box_type == BoxType::MOOF {
                fragments.push(MovieFragment::parse(source, &b)?);
            } else {
                tracing::trace!(box_type = %b.box_type, offset = b.offset, "Skipping top-level box");
            }
        }

        let moov = moov.ok_or(Error::MissingRequiredElement("moov"))?;
        let movie = Movie::parse(source, &moov)?;
        if fragments.is_empty() {
            return Err(Error::MissingRequiredElement("moof"));
        }

        let segments = movie
            .tracks
            .iter()
            .map(|track| track_segments(track, &fragments, file_size))
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            tracks = movie.tracks.len(),
            fragments = fragments.len(),
            file_size,
            "Indexed fragmented MP4"
        );

        Ok(Self {
            movie,
            fragments,
            file_size,
            segments,
        })
    }

    pub fn tracks(&self) -> &[Track] {
        &self.movie.tracks
    }

    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }

    /// Segment list for the track with `track_id`.
    pub fn segments_for_track_id(&self, track_id: u32) -> Option<&[MediaSegment]> {
        let idx = self
            .movie
            .tracks
            .iter()
            .position(|t| t.track_id == track_id)?;
        self.segments.get(idx).map(Vec::as_slice)
    }

    pub fn into_segments(self) -> Vec<Vec<MediaSegment>> {
        self.segments
    }
}

impl MediaSegments for Mp4Index {
    fn media_segments(&self) -> &[Vec<MediaSegment>] {
        &self.segments
    }
}

/// One segment per fragment carrying `track`; fragments without it are skipped.
fn track_segments(
    track: &Track,
    fragments: &[MovieFragment],
    file_size: u64,
) -> Result<Vec<MediaSegment>> {
    let mut builder = SegmentListBuilder::with_capacity(fragments.len());
    for traf in fragments
        .iter()
        .filter_map(|moof| moof.track_fragment(track.track_id))
    {
        builder.push(traf.offset, traf.timestamp_secs(track));
    }

    if builder.is_empty() {
        tracing::warn!(track_id = track.track_id, "Track has no fragments");
    }

    builder.finish(file_size)
}
