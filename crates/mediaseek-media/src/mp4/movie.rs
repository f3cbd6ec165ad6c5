//! Movie-level boxes: `moov`, `mvhd`, `trak`, `tkhd`, `mdhd` and edit lists.

use super::atoms::{find, find_all, require, BoxType, FullBox, Mp4Box};
use crate::region::ByteSource;
use crate::{Error, Result};

/// Movie header (`mvhd`).
#[derive(Debug, Clone, Copy)]
pub struct MovieHeader {
    pub version: u8,
    /// Movie timescale, used for edit-list segment durations.
    pub timescale: u32,
}

impl MovieHeader {
    pub fn parse<S: ByteSource + ?Sized>(source: &S, b: &Mp4Box) -> Result<Self> {
        let full = FullBox::parse(source, b)?;
        full.expect_version_0_or_1(BoxType::MVHD)?;

        let mut reader = full.reader(source);
        // creation_time, modification_time
        reader.skip(2 * full.time_width());
        let timescale = reader.read_u32()?;
        if timescale == 0 {
            return Err(Error::malformed("mvhd timescale is 0"));
        }

        Ok(Self {
            version: full.version,
            timescale,
        })
    }
}

/// Track header (`tkhd`). Only the track ID is kept.
#[derive(Debug, Clone, Copy)]
pub struct TrackHeader {
    pub version: u8,
    pub track_id: u32,
}

impl TrackHeader {
    pub fn parse<S: ByteSource + ?Sized>(source: &S, b: &Mp4Box) -> Result<Self> {
        let full = FullBox::parse(source, b)?;
        full.expect_version_0_or_1(BoxType::TKHD)?;

        let mut reader = full.reader(source);
        reader.skip(2 * full.time_width());
        let track_id = reader.read_u32()?;

        Ok(Self {
            version: full.version,
            track_id,
        })
    }
}

/// Media header (`mdhd`).
#[derive(Debug, Clone, Copy)]
pub struct MediaHeader {
    pub version: u8,
    /// Track timescale: ticks per second for every media time of this track.
    pub timescale: u32,
}

impl MediaHeader {
    pub fn parse<S: ByteSource + ?Sized>(source: &S, b: &Mp4Box) -> Result<Self> {
        let full = FullBox::parse(source, b)?;
        full.expect_version_0_or_1(BoxType::MDHD)?;

        let mut reader = full.reader(source);
        reader.skip(2 * full.time_width());
        let timescale = reader.read_u32()?;
        if timescale == 0 {
            return Err(Error::malformed("mdhd timescale is 0"));
        }

        Ok(Self {
            version: full.version,
            timescale,
        })
    }
}

/// One edit-list entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditEntry {
    /// Duration in movie timescale units.
    pub segment_duration: u64,
    /// Start in track timescale units, or -1 for an empty edit.
    pub media_time: i64,
}

impl EditEntry {
    /// An empty edit delays presentation without consuming media.
    pub fn is_empty_edit(&self) -> bool {
        self.media_time == -1
    }
}

/// Edit list (`elst`).
#[derive(Debug, Clone, Default)]
pub struct EditList {
    pub entries: Vec<EditEntry>,
}

impl EditList {
    pub fn parse<S: ByteSource + ?Sized>(source: &S, b: &Mp4Box) -> Result<Self> {
        let full = FullBox::parse(source, b)?;
        full.expect_version_0_or_1(BoxType::ELST)?;

        let width = full.time_width();
        let mut reader = full.reader(source);
        let entry_count = reader.read_u32()? as u64;

        // segment_duration + media_time + media_rate (integer, fraction)
        let entry_size = 2 * width + 4;
        let capacity = entry_count.min(reader.remaining() / entry_size) as usize;
        let mut entries = Vec::with_capacity(capacity);
        for _ in 0..entry_count {
            let segment_duration = reader.read_uint(width)?;
            let media_time = reader.read_int(width)?;
            reader.skip(4);
            entries.push(EditEntry {
                segment_duration,
                media_time,
            });
        }

        Ok(Self { entries })
    }

    /// Seconds to add to a track's media time to get its presentation time.
    ///
    /// Empty edits shift presentation later by their duration; the single
    /// non-empty edit shifts it earlier by its media time and must be the
    /// final entry. A non-empty edit anywhere else describes a presentation
    /// this index cannot express as one offset, so it is reported as
    /// [`Error::UnsupportedVariant`] rather than as a malformed box.
    pub fn presentation_offset(&self, movie_timescale: u32, track_timescale: u32) -> Result<f64> {
        let mut offset = 0.0;
        let last = self.entries.len().saturating_sub(1);

        for (i, edit) in self.entries.iter().enumerate() {
            if edit.is_empty_edit() {
                offset += edit.segment_duration as f64 / movie_timescale as f64;
            } else {
                if i != last {
                    return Err(Error::unsupported(format!(
                        "edit list with non-empty edit at entry {i} of {}",
                        self.entries.len()
                    )));
                }
                offset -= edit.media_time as f64 / track_timescale as f64;
            }
        }

        Ok(offset)
    }
}

/// A `trak` reduced to what segment timing needs.
#[derive(Debug, Clone)]
pub struct Track {
    pub track_id: u32,
    /// Media timescale from `mdhd`.
    pub timescale: u32,
    pub edit_list: Option<EditList>,
    /// Edit-list shift in seconds; 0 without an edit list.
    pub presentation_offset_secs: f64,
}

impl Track {
    pub fn parse<S: ByteSource + ?Sized>(
        source: &S,
        trak: &Mp4Box,
        movie: &MovieHeader,
    ) -> Result<Self> {
        let tkhd = require(source, trak.content, BoxType::TKHD, "tkhd")?;
        let header = TrackHeader::parse(source, &tkhd)?;

        let mdia = require(source, trak.content, BoxType::MDIA, "mdia")?;
        let mdhd = require(source, mdia.content, BoxType::MDHD, "mdhd")?;
        let media = MediaHeader::parse(source, &mdhd)?;

        let edit_list = match find(source, trak.content, BoxType::EDTS)? {
            Some(edts) => find(source, edts.content, BoxType::ELST)?
                .map(|elst| EditList::parse(source, &elst))
                .transpose()?,
            None => None,
        };

        let presentation_offset_secs = match &edit_list {
            Some(elst) => elst.presentation_offset(movie.timescale, media.timescale)?,
            None => 0.0,
        };

        tracing::debug!(
            track_id = header.track_id,
            timescale = media.timescale,
            edits = edit_list.as_ref().map_or(0, |e| e.entries.len()),
            presentation_offset_secs,
            "Parsed trak"
        );

        Ok(Self {
            track_id: header.track_id,
            timescale: media.timescale,
            edit_list,
            presentation_offset_secs,
        })
    }

    /// Convert a media time of this track to presentation seconds.
    pub fn media_time_to_secs(&self, media_time: i64) -> f64 {
        media_time as f64 / self.timescale as f64 + self.presentation_offset_secs
    }
}

/// Parsed `moov` box.
#[derive(Debug, Clone)]
pub struct Movie {
    pub header: MovieHeader,
    /// Tracks in `trak` order.
    pub tracks: Vec<Track>,
}

impl Movie {
    pub fn parse<S: ByteSource + ?Sized>(source: &S, moov: &Mp4Box) -> Result<Self> {
        let mvhd = require(source, moov.content, BoxType::MVHD, "mvhd")?;
        let header = MovieHeader::parse(source, &mvhd)?;

        let tracks = find_all(source, moov.content, BoxType::TRAK)?
            .iter()
            .map(|trak| Track::parse(source, trak, &header))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { header, tracks })
    }
}
