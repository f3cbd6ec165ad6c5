//! Matroska / WebM segment indexing.
//!
//! Every top-level `Cluster` of the `Segment` becomes one segment, timed by
//! the cluster's `Timestamp` scaled by the segment's `TimestampScale`.
//! Clusters interleave all tracks, so a single list is produced.

mod element;

pub use element::{elements, element_name, find, ids, read_element, require, EbmlElement, Elements};

use crate::region::{ByteRegion, ByteSource, SeekSource};
use crate::segment_index::{MediaSegment, MediaSegments, SegmentListBuilder};
use crate::{Error, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Nanoseconds per timestamp tick when `TimestampScale` is absent.
pub const DEFAULT_TIMESTAMP_SCALE: u64 = 1_000_000;

/// A cluster reduced to its position and timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cluster {
    /// Absolute offset of the cluster's ID.
    pub offset: u64,
    /// Total size including the header.
    pub size: u64,
    /// Raw `Timestamp` in `TimestampScale` units.
    pub timestamp: u64,
}

impl Cluster {
    pub fn parse<S: ByteSource + ?Sized>(source: &S, cluster: &EbmlElement) -> Result<Self> {
        let timestamp = require(source, cluster.content, ids::CLUSTER_TIMESTAMP, "Timestamp")?
            .read_uint(source)?;
        Ok(Self {
            offset: cluster.offset,
            size: cluster.size(),
            timestamp,
        })
    }

    pub fn end(&self) -> u64 {
        self.offset + self.size
    }

    /// Cluster timestamp in seconds for a given scale in nanoseconds per tick.
    pub fn timestamp_secs(&self, timestamp_scale: u64) -> f64 {
        self.timestamp as f64 * timestamp_scale as f64 / 1e9
    }
}

/// Segment index of a Matroska or WebM file.
#[derive(Debug, Clone)]
pub struct MatroskaIndex {
    /// EBML `DocType`, usually `matroska` or `webm`.
    pub doc_type: Option<String>,
    /// Nanoseconds per timestamp tick.
    pub timestamp_scale: u64,
    /// Top-level clusters in file order; never empty.
    pub clusters: Vec<Cluster>,
    /// Single shared list.
    segments: Vec<Vec<MediaSegment>>,
}

impl MatroskaIndex {
    /// Index the Matroska file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let source = SeekSource::new(BufReader::new(file))?;
        Self::parse(&source)
    }

    /// Index a Matroska source.
    pub fn parse<S: ByteSource + ?Sized>(source: &S) -> Result<Self> {
        let mut top = elements(source, ByteRegion::whole(source));

        let header = match top.next().transpose()? {
            Some(e) if e.id == ids::EBML => e,
            _ => return Err(Error::MissingRequiredElement("EBML")),
        };
        let doc_type = find(source, header.content, ids::DOC_TYPE)?
            .map(|e| e.read_string(source))
            .transpose()?;

        let segment = match top.next().transpose()? {
            Some(e) if e.id == ids::SEGMENT => e,
            _ => return Err(Error::MissingRequiredElement("Segment")),
        };

        let mut info = None;
        let mut clusters = Vec::new();
        for item in elements(source, segment.content) {
            let child = item?;
            match child.id {
                ids::INFO if info.is_none() => info = Some(child),
                ids::CLUSTER => clusters.push(Cluster::parse(source, &child)?),
                id => tracing::trace!(
                    id,
                    name = element_name(id).unwrap_or("unknown"),
                    offset = child.offset,
                    "Skipping segment child"
                ),
            }
        }

        let info = info.ok_or(Error::MissingRequiredElement("Info"))?;
        let timestamp_scale = match find(source, info.content, ids::TIMESTAMP_SCALE)? {
            Some(scale) if !scale.content.is_empty() => scale.read_uint(source)?,
            _ => DEFAULT_TIMESTAMP_SCALE,
        };
        if timestamp_scale == 0 {
            return Err(Error::malformed("TimestampScale is 0"));
        }

        let last = clusters
            .last()
            .copied()
            .ok_or(Error::MissingRequiredElement("Cluster"))?;

        let mut builder = SegmentListBuilder::with_capacity(clusters.len());
        for cluster in &clusters {
            builder.push(cluster.offset, cluster.timestamp_secs(timestamp_scale));
        }
        let segments = builder.finish(last.end())?;

        tracing::debug!(
            doc_type = doc_type.as_deref().unwrap_or("unknown"),
            timestamp_scale,
            clusters = clusters.len(),
            "Indexed Matroska segment"
        );

        Ok(Self {
            doc_type,
            timestamp_scale,
            clusters,
            segments: vec![segments],
        })
    }

    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    /// The shared segment list.
    pub fn segments(&self) -> &[MediaSegment] {
        &self.segments[0]
    }

    pub fn into_segments(self) -> Vec<Vec<MediaSegment>> {
        self.segments
    }
}

impl MediaSegments for MatroskaIndex {
    fn media_segments(&self) -> &[Vec<MediaSegment>] {
        &self.segments
    }
}
