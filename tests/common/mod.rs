//! Synthetic container builders shared by the integration tests.
//!
//! The files carry only the boxes and elements the indexer reads, plus
//! filler (`free`/`mdat` boxes, `SimpleBlock` payloads) to place fragments
//! and clusters at exact byte offsets.

#![allow(dead_code)]

use bytes::{BufMut, BytesMut};
use mediaseek_media::ebml::encode_vint;
use std::io::Write;
use tempfile::NamedTempFile;

// ISO-BMFF

pub fn plain_box(tag: &[u8; 4], content: &[u8]) -> BytesMut {
    let mut buf = BytesMut::with_capacity(8 + content.len());
    buf.put_u32(8 + content.len() as u32);
    buf.put_slice(tag);
    buf.put_slice(content);
    buf
}

pub fn full_box(tag: &[u8; 4], version: u8, flags: u32, body: &[u8]) -> BytesMut {
    let mut content = BytesMut::with_capacity(4 + body.len());
    content.put_u32(((version as u32) << 24) | flags);
    content.put_slice(body);
    plain_box(tag, &content)
}

/// Append a filler box of type `tag` so that `buf` ends exactly at `target`.
pub fn pad_to(buf: &mut BytesMut, tag: &[u8; 4], target: usize) {
    let fill = target
        .checked_sub(buf.len())
        .filter(|&n| n >= 8)
        .unwrap_or_else(|| panic!("cannot pad {} bytes up to {}", buf.len(), target));
    buf.put(plain_box(tag, &vec![0u8; fill - 8]));
}

pub fn ftyp() -> BytesMut {
    let mut content = BytesMut::new();
    content.put_slice(b"iso6");
    content.put_u32(0);
    content.put_slice(b"iso6cmfc");
    plain_box(b"ftyp", &content)
}

/// Track description: `(track_id, timescale, edit list entries)`.
pub struct TrackDesc {
    pub track_id: u32,
    pub timescale: u32,
    /// `(segment_duration, media_time)` pairs, version 0.
    pub edits: Vec<(u32, i32)>,
}

impl TrackDesc {
    pub fn new(track_id: u32, timescale: u32) -> Self {
        Self {
            track_id,
            timescale,
            edits: Vec::new(),
        }
    }

    pub fn with_edits(mut self, edits: &[(u32, i32)]) -> Self {
        self.edits = edits.to_vec();
        self
    }
}

/// `moov` with a 1000 Hz movie timescale and one `trak` per track.
pub fn moov(tracks: &[TrackDesc]) -> BytesMut {
    let mut content = BytesMut::new();

    let mut mvhd = BytesMut::new();
    mvhd.put_u32(0); // creation_time
    mvhd.put_u32(0); // modification_time
    mvhd.put_u32(1000); // timescale
    mvhd.put_u32(0); // duration
    mvhd.put_u32(0x0001_0000); // rate
    mvhd.put_u16(0x0100); // volume
    content.put(full_box(b"mvhd", 0, 0, &mvhd));

    for track in tracks {
        let mut tkhd = BytesMut::new();
        tkhd.put_u32(0);
        tkhd.put_u32(0);
        tkhd.put_u32(track.track_id);
        tkhd.put_u32(0); // reserved
        tkhd.put_u32(0); // duration

        let mut mdhd = BytesMut::new();
        mdhd.put_u32(0);
        mdhd.put_u32(0);
        mdhd.put_u32(track.timescale);
        mdhd.put_u32(0);
        mdhd.put_u32(0x55C4_0000);

        let mut trak = full_box(b"tkhd", 0, 3, &tkhd);
        if !track.edits.is_empty() {
            let mut elst = BytesMut::new();
            elst.put_u32(track.edits.len() as u32);
            for &(duration, media_time) in &track.edits {
                elst.put_u32(duration);
                elst.put_i32(media_time);
                elst.put_u32(0x0001_0000); // media_rate
            }
            trak.put(plain_box(b"edts", &full_box(b"elst", 0, 0, &elst)));
        }
        trak.put(plain_box(b"mdia", &full_box(b"mdhd", 0, 0, &mdhd)));
        content.put(plain_box(b"trak", &trak));
    }

    plain_box(b"moov", &content)
}

/// `traf` with a version 1 `tfdt` and a single-sample `trun` carrying a
/// composition offset.
pub fn traf(track_id: u32, decode_time: u64, composition_offset: i32) -> BytesMut {
    let mut tfhd = BytesMut::new();
    tfhd.put_u32(track_id);

    let mut tfdt = BytesMut::new();
    tfdt.put_u64(decode_time);

    let mut trun = BytesMut::new();
    trun.put_u32(1); // sample_count
    trun.put_u32(0); // data_offset
    trun.put_i32(composition_offset);

    let mut content = full_box(b"tfhd", 0, 0x020000, &tfhd);
    content.put(full_box(b"tfdt", 1, 0, &tfdt));
    content.put(full_box(b"trun", 1, 0x000801, &trun));
    plain_box(b"traf", &content)
}

pub fn moof(sequence: u32, trafs: &[BytesMut]) -> BytesMut {
    let mut content = full_box(b"mfhd", 0, 0, &sequence.to_be_bytes());
    for t in trafs {
        content.put_slice(t);
    }
    plain_box(b"moof", &content)
}

/// Bytes from a `moof` start to its first `traf`: moof header plus `mfhd`.
pub const MOOF_TO_TRAF: usize = 8 + 16;

/// Single-track fragmented MP4 whose `traf` boxes start at the given
/// offsets, padded with `mdat` to `total` bytes.
///
/// `fragments` holds `(traf_offset, decode_time)` pairs.
pub fn fragmented_mp4(timescale: u32, fragments: &[(usize, u64)], total: usize) -> Vec<u8> {
    let mut file = ftyp();
    file.put(moov(&[TrackDesc::new(1, timescale)]));

    for (i, &(traf_offset, decode_time)) in fragments.iter().enumerate() {
        let moof_start = traf_offset - MOOF_TO_TRAF;
        let filler: &[u8; 4] = if i == 0 { b"free" } else { b"mdat" };
        pad_to(&mut file, filler, moof_start);
        file.put(moof(i as u32 + 1, &[traf(1, decode_time, 0)]));
    }
    pad_to(&mut file, b"mdat", total);

    file.to_vec()
}

// Matroska

pub const EBML: u32 = 0x1A45_DFA3;
pub const DOC_TYPE: u32 = 0x4282;
pub const SEGMENT: u32 = 0x1853_8067;
pub const INFO: u32 = 0x1549_A966;
pub const TIMESTAMP_SCALE: u32 = 0x2A_D7B1;
pub const CLUSTER: u32 = 0x1F43_B675;
pub const CLUSTER_TIMESTAMP: u32 = 0xE7;
pub const SIMPLE_BLOCK: u32 = 0xA3;

pub fn element(id: u32, payload: &[u8]) -> Vec<u8> {
    let id_bytes = id.to_be_bytes();
    let skip = id_bytes.iter().take_while(|&&b| b == 0).count();
    let mut out = id_bytes[skip..].to_vec();
    out.extend(encode_vint(payload.len() as u64).unwrap());
    out.extend_from_slice(payload);
    out
}

pub fn uint_element(id: u32, value: u64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let skip = bytes.iter().take_while(|&&b| b == 0).count().min(7);
    element(id, &bytes[skip..])
}

pub fn ebml_header(doc_type: &str) -> Vec<u8> {
    element(EBML, &element(DOC_TYPE, doc_type.as_bytes()))
}

pub fn info(timestamp_scale: u64) -> Vec<u8> {
    element(INFO, &uint_element(TIMESTAMP_SCALE, timestamp_scale))
}

pub fn cluster(timestamp: u64, payload_len: usize) -> Vec<u8> {
    let mut content = uint_element(CLUSTER_TIMESTAMP, timestamp);
    content.extend(element(SIMPLE_BLOCK, &vec![0u8; payload_len]));
    element(CLUSTER, &content)
}

/// Cluster of exactly `total` bytes.
pub fn cluster_sized(timestamp: u64, total: usize) -> Vec<u8> {
    // Header overhead never exceeds 24 bytes.
    (total.saturating_sub(24)..total)
        .map(|payload| cluster(timestamp, payload))
        .find(|c| c.len() == total)
        .unwrap_or_else(|| panic!("no cluster layout of {total} bytes"))
}

/// Matroska file whose clusters end at the given offsets; the first cluster
/// starts right after the EBML header, Segment header and Info.
///
/// `clusters` holds `(timestamp, end_offset)` pairs; the file ends with the
/// last cluster.
pub fn matroska_with_cluster_ends(timestamp_scale: u64, clusters: &[(u64, usize)]) -> Vec<u8> {
    let header = ebml_header("webm");
    let info = info(timestamp_scale);
    let total = clusters.last().map(|&(_, end)| end).unwrap_or(0);

    // Segment ID (4) + size VINT of whatever width fits
    let (segment_start, size_vint) = (1..=8)
        .find_map(|width| {
            let start = header.len() + 4 + width;
            let vint = encode_vint((total - start) as u64).ok()?;
            (vint.len() == width).then_some((start, vint))
        })
        .expect("segment size VINT");

    let mut body = info;
    let mut position = segment_start + body.len();
    for &(timestamp, end) in clusters {
        body.extend(cluster_sized(timestamp, end - position));
        position = end;
    }

    let mut file = header;
    file.extend(SEGMENT.to_be_bytes());
    file.extend(size_vint);
    file.extend(body);
    assert_eq!(file.len(), total);
    file
}

/// Write `bytes` to a named temp file with the given extension.
pub fn write_temp(bytes: &[u8], extension: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(&format!(".{extension}"))
        .tempfile()
        .unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}
