//! Movie fragment boxes: `moof`, `mfhd`, `traf`, `tfhd`, `tfdt` and `trun`.

use super::atoms::{find, find_all, require, BoxType, FullBox, Mp4Box};
use super::movie::Track;
use crate::region::{ByteSource, RegionReader};
use crate::{Error, Result};

/// Decoded `tfhd` flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TfhdFlags(pub u32);

impl TfhdFlags {
    pub const BASE_DATA_OFFSET_PRESENT: u32 = 0x000001;
    pub const SAMPLE_DESCRIPTION_INDEX_PRESENT: u32 = 0x000002;
    pub const DEFAULT_SAMPLE_DURATION_PRESENT: u32 = 0x000008;
    pub const DEFAULT_SAMPLE_SIZE_PRESENT: u32 = 0x000010;
    pub const DEFAULT_SAMPLE_FLAGS_PRESENT: u32 = 0x000020;
    pub const DURATION_IS_EMPTY: u32 = 0x010000;
    pub const DEFAULT_BASE_IS_MOOF: u32 = 0x020000;

    fn has(&self, bit: u32) -> bool {
        self.0 & bit != 0
    }

    pub fn base_data_offset_present(&self) -> bool {
        self.has(Self::BASE_DATA_OFFSET_PRESENT)
    }

    pub fn duration_is_empty(&self) -> bool {
        self.has(Self::DURATION_IS_EMPTY)
    }

    pub fn default_base_is_moof(&self) -> bool {
        self.has(Self::DEFAULT_BASE_IS_MOOF)
    }
}

/// Decoded `trun` flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrunFlags(pub u32);

impl TrunFlags {
    pub const DATA_OFFSET_PRESENT: u32 = 0x000001;
    pub const FIRST_SAMPLE_FLAGS_PRESENT: u32 = 0x000004;
    pub const SAMPLE_DURATION_PRESENT: u32 = 0x000100;
    pub const SAMPLE_SIZE_PRESENT: u32 = 0x000200;
    pub const SAMPLE_FLAGS_PRESENT: u32 = 0x000400;
    pub const SAMPLE_COMPOSITION_TIME_OFFSETS_PRESENT: u32 = 0x000800;

    fn has(&self, bit: u32) -> bool {
        self.0 & bit != 0
    }

    pub fn data_offset_present(&self) -> bool {
        self.has(Self::DATA_OFFSET_PRESENT)
    }

    pub fn first_sample_flags_present(&self) -> bool {
        self.has(Self::FIRST_SAMPLE_FLAGS_PRESENT)
    }

    pub fn sample_duration_present(&self) -> bool {
        self.has(Self::SAMPLE_DURATION_PRESENT)
    }

    pub fn sample_size_present(&self) -> bool {
        self.has(Self::SAMPLE_SIZE_PRESENT)
    }

    pub fn sample_flags_present(&self) -> bool {
        self.has(Self::SAMPLE_FLAGS_PRESENT)
    }

    pub fn composition_time_offsets_present(&self) -> bool {
        self.has(Self::SAMPLE_COMPOSITION_TIME_OFFSETS_PRESENT)
    }
}

/// Track fragment header (`tfhd`).
#[derive(Debug, Clone, Copy)]
pub struct TrackFragmentHeader {
    pub track_id: u32,
    pub flags: TfhdFlags,
}

impl TrackFragmentHeader {
    pub fn parse<S: ByteSource + ?Sized>(source: &S, b: &Mp4Box) -> Result<Self> {
        let full = FullBox::parse(source, b)?;
        let track_id = full.reader(source).read_u32()?;
        Ok(Self {
            track_id,
            flags: TfhdFlags(full.flags),
        })
    }
}

/// Read the base media decode time from a `tfdt` box.
pub fn parse_tfdt<S: ByteSource + ?Sized>(source: &S, b: &Mp4Box) -> Result<u64> {
    let full = FullBox::parse(source, b)?;
    full.expect_version_0_or_1(BoxType::TFDT)?;
    full.reader(source).read_uint(full.time_width())
}

/// Track run (`trun`), decoded up to the first sample.
#[derive(Debug, Clone, Copy)]
pub struct TrackRun {
    pub version: u8,
    pub flags: TrunFlags,
    pub sample_count: u32,
    /// Composition offset of the first sample in track timescale units; 0
    /// when the run carries no composition offsets.
    pub first_sample_composition_offset: i64,
}

impl TrackRun {
    pub fn parse<S: ByteSource + ?Sized>(source: &S, b: &Mp4Box) -> Result<Self> {
        let full = FullBox::parse(source, b)?;
        full.expect_version_0_or_1(BoxType::TRUN)?;
        let flags = TrunFlags(full.flags);
        let mut reader = full.reader(source);

        let sample_count = reader.read_u32()?;
        if sample_count == 0 {
            return Err(Error::malformed(format!(
                "trun at offset {} has no samples",
                b.offset
            )));
        }

        if flags.data_offset_present() {
            reader.skip(4);
        }
        if flags.first_sample_flags_present() {
            reader.skip(4);
        }

        let first_sample_composition_offset =
            Self::first_sample_cto(&mut reader, flags, full.version)?;

        Ok(Self {
            version: full.version,
            flags,
            sample_count,
            first_sample_composition_offset,
        })
    }

    fn first_sample_cto<S: ByteSource + ?Sized>(
        reader: &mut RegionReader<'_, S>,
        flags: TrunFlags,
        version: u8,
    ) -> Result<i64> {
        if flags.sample_duration_present() {
            reader.skip(4);
        }
        if flags.sample_size_present() {
            reader.skip(4);
        }
        if flags.sample_flags_present() {
            reader.skip(4);
        }
        if !flags.composition_time_offsets_present() {
            return Ok(0);
        }

        // Version 0 offsets are unsigned, version 1 signed.
        if version == 0 {
            Ok(reader.read_u32()? as i64)
        } else {
            Ok(reader.read_i32()? as i64)
        }
    }
}

/// One `traf` reduced to its timing anchor.
#[derive(Debug, Clone, Copy)]
pub struct TrackFragment {
    /// File offset of the `traf` box; segment boundaries are placed here.
    pub offset: u64,
    pub header: TrackFragmentHeader,
    pub base_media_decode_time: u64,
    /// First `trun` of the fragment.
    pub first_run: TrackRun,
}

impl TrackFragment {
    pub fn parse<S: ByteSource + ?Sized>(source: &S, traf: &Mp4Box) -> Result<Self> {
        let tfhd = require(source, traf.content, BoxType::TFHD, "tfhd")?;
        let header = TrackFragmentHeader::parse(source, &tfhd)?;

        let tfdt = require(source, traf.content, BoxType::TFDT, "tfdt")?;
        let base_media_decode_time = parse_tfdt(source, &tfdt)?;

        let trun = require(source, traf.content, BoxType::TRUN, "trun")?;
        let first_run = TrackRun::parse(source, &trun)?;

        Ok(Self {
            offset: traf.offset,
            header,
            base_media_decode_time,
            first_run,
        })
    }

    pub fn track_id(&self) -> u32 {
        self.header.track_id
    }

    /// Media time of the first presented sample: decode time plus its
    /// composition offset, in track timescale units.
    pub fn first_sample_media_time(&self) -> i64 {
        i64::try_from(self.base_media_decode_time)
            .unwrap_or(i64::MAX)
            .saturating_add(self.first_run.first_sample_composition_offset)
    }

    /// Presentation time of this fragment in seconds.
    pub fn timestamp_secs(&self, track: &Track) -> f64 {
        track.media_time_to_secs(self.first_sample_media_time())
    }
}

/// Parsed `moof` box.
#[derive(Debug, Clone)]
pub struct MovieFragment {
    pub offset: u64,
    /// `mfhd` sequence number, when present.
    pub sequence_number: Option<u32>,
    /// Track fragments in file order; never empty.
    pub track_fragments: Vec<TrackFragment>,
}

impl MovieFragment {
    pub fn parse<S: ByteSource + ?Sized>(source: &S, moof: &Mp4Box) -> Result<Self> {
        let sequence_number = match find(source, moof.content, BoxType::MFHD)? {
            Some(mfhd) => {
                let full = FullBox::parse(source, &mfhd)?;
                Some(full.reader(source).read_u32()?)
            }
            None => None,
        };

        let trafs = find_all(source, moof.content, BoxType::TRAF)?;
        if trafs.is_empty() {
            return Err(Error::MissingRequiredElement("traf"));
        }

        let track_fragments = trafs
            .iter()
            .map(|traf| TrackFragment::parse(source, traf))
            .collect::<Result<Vec<_>>>()?;

        tracing::trace!(
            offset = moof.offset,
            sequence_number,
            trafs = track_fragments.len(),
            "Parsed moof"
        );

        Ok(Self {
            offset: moof.offset,
            sequence_number,
            track_fragments,
        })
    }

    /// The first track fragment for `track_id`, if this fragment carries that track.
    pub fn track_fragment(&self, track_id: u32) -> Option<&TrackFragment> {
        self.track_fragments
            .iter()
            .find(|traf| traf.track_id() == track_id)
    }
}
