//! Bounded random-access views over a backing byte source.
//!
//! Every parser in this crate reads through a [`RegionReader`], which pins all
//! access to a [`ByteRegion`] window. Regions are plain `(start, len)` values;
//! child regions are sliced out of their parent and can never reach past it.

use crate::ebml::{int_be, uint_be};
use crate::{Error, Result};
use bytes::Bytes;
use std::cell::RefCell;
use std::io::{self, Read, Seek, SeekFrom};

/// Random-access byte source backing a parse.
pub trait ByteSource {
    /// Total length of the source in bytes.
    fn len(&self) -> u64;

    /// Whether the source holds no bytes.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read up to `buf.len()` bytes starting at `offset`.
    ///
    /// Returns the number of bytes actually read, which is short only at the
    /// end of the source.
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize>;
}

impl<S: ByteSource + ?Sized> ByteSource for &S {
    fn len(&self) -> u64 {
        (**self).len()
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read_at(offset, buf)
    }
}

impl ByteSource for [u8] {
    fn len(&self) -> u64 {
        <[u8]>::len(self) as u64
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let total = <[u8]>::len(self);
        let start = usize::try_from(offset).unwrap_or(usize::MAX).min(total);
        let count = buf.len().min(total - start);
        buf[..count].copy_from_slice(&self[start..start + count]);
        Ok(count)
    }
}

impl ByteSource for Vec<u8> {
    fn len(&self) -> u64 {
        self.as_slice().len() as u64
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        ByteSource::read_at(self.as_slice(), offset, buf)
    }
}

impl ByteSource for Bytes {
    fn len(&self) -> u64 {
        self.as_ref().len() as u64
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        ByteSource::read_at(self.as_ref(), offset, buf)
    }
}

/// [`ByteSource`] over any seekable reader, such as a [`std::fs::File`].
///
/// The reader is seeked before every read, so a single handle can serve
/// reads for any number of regions during one parse.
pub struct SeekSource<R> {
    inner: RefCell<R>,
    len: u64,
}

impl<R: Read + Seek> SeekSource<R> {
    /// Wrap a reader, measuring its length by seeking to the end.
    pub fn new(mut inner: R) -> io::Result<Self> {
        let len = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(0))?;
        Ok(Self {
            inner: RefCell::new(inner),
            len,
        })
    }

    /// Recover the wrapped reader.
    pub fn into_inner(self) -> R {
        self.inner.into_inner()
    }
}

impl<R: Read + Seek> ByteSource for SeekSource<R> {
    fn len(&self) -> u64 {
        self.len
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let mut inner = self.inner.borrow_mut();
        inner.seek(SeekFrom::Start(offset))?;

        let mut filled = 0;
        while filled < buf.len() {
            match inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }
}

/// Logical window `[start, start + len)` into a byte source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ByteRegion {
    start: u64,
    len: u64,
}

impl ByteRegion {
    /// Create a region. Callers deriving regions from container data should
    /// use [`ByteRegion::slice`] instead so the parent bounds are enforced.
    pub fn new(start: u64, len: u64) -> Self {
        Self { start, len }
    }

    /// Region covering an entire source.
    pub fn whole<S: ByteSource + ?Sized>(source: &S) -> Self {
        Self::new(0, source.len())
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Exclusive end offset.
    pub fn end(&self) -> u64 {
        self.start + self.len
    }

    /// Whether `offset` lies inside `[start, end)`.
    pub fn contains(&self, offset: u64) -> bool {
        offset >= self.start && offset < self.end()
    }

    /// Whether `other` lies entirely inside this region.
    pub fn encloses(&self, other: &ByteRegion) -> bool {
        other.start >= self.start && other.end() <= self.end()
    }

    /// Derive a child region at absolute `offset`.
    ///
    /// `len` defaults to the rest of this region. A child that would reach
    /// outside this region is a [`Error::BoundsViolation`]; it is never
    /// truncated.
    pub fn slice(&self, offset: u64, len: Option<u64>) -> Result<ByteRegion> {
        if offset < self.start || offset > self.end() {
            return Err(Error::bounds(
                offset,
                offset.saturating_add(len.unwrap_or(0)),
                self.start,
                self.end(),
            ));
        }

        let len = len.unwrap_or(self.end() - offset);
        let end = offset
            .checked_add(len)
            .ok_or_else(|| Error::bounds(offset, u64::MAX, self.start, self.end()))?;
        if end > self.end() {
            return Err(Error::bounds(offset, end, self.start, self.end()));
        }

        Ok(ByteRegion::new(offset, len))
    }
}

/// Cursor over a [`ByteRegion`] of a [`ByteSource`].
pub struct RegionReader<'s, S: ?Sized> {
    source: &'s S,
    region: ByteRegion,
    position: u64,
}

impl<'s, S: ByteSource + ?Sized> RegionReader<'s, S> {
    /// Reader positioned at the start of `region`.
    pub fn new(source: &'s S, region: ByteRegion) -> Self {
        Self {
            source,
            region,
            position: region.start(),
        }
    }

    /// Reader over the whole source.
    pub fn whole(source: &'s S) -> Self {
        Self::new(source, ByteRegion::whole(source))
    }

    /// Reader over a child region of this one, positioned at its start.
    pub fn sub_reader(&self, offset: u64, len: Option<u64>) -> Result<RegionReader<'s, S>> {
        Ok(RegionReader::new(self.source, self.region.slice(offset, len)?))
    }

    pub fn source(&self) -> &'s S {
        self.source
    }

    pub fn region(&self) -> ByteRegion {
        self.region
    }

    /// Absolute offset of the cursor.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Bytes between the cursor and the region end.
    pub fn remaining(&self) -> u64 {
        self.region.end().saturating_sub(self.position)
    }

    pub fn is_at_end(&self) -> bool {
        self.position >= self.region.end()
    }

    /// Move the cursor back to the region start.
    pub fn rewind(&mut self) {
        self.position = self.region.start();
    }

    /// Move the cursor to absolute `position` inside `[start, end]`.
    pub fn seek_to(&mut self, position: u64) -> Result<()> {
        if position < self.region.start() || position > self.region.end() {
            return Err(Error::bounds(
                position,
                position,
                self.region.start(),
                self.region.end(),
            ));
        }
        self.position = position;
        Ok(())
    }

    /// Read `count` bytes at absolute `offset`, clamped to the region end.
    ///
    /// An `offset` outside `[start, end]` is a bounds violation; a request
    /// running past the end returns what is left.
    pub fn read_at(&self, offset: u64, count: u64) -> Result<Vec<u8>> {
        let (start, end) = (self.region.start(), self.region.end());
        if offset < start || offset > end {
            return Err(Error::bounds(offset, offset.saturating_add(count), start, end));
        }

        let count = count.min(end - offset) as usize;
        let mut buf = vec![0u8; count];
        let n = self.source.read_at(offset, &mut buf)?;
        buf.truncate(n);
        Ok(buf)
    }

    /// Read up to `count` bytes at the cursor and advance past them.
    pub fn read(&mut self, count: u64) -> Result<Vec<u8>> {
        let bytes = self.read_at(self.position, count)?;
        self.position += bytes.len() as u64;
        Ok(bytes)
    }

    /// Read everything from the cursor to the region end.
    pub fn read_to_end(&mut self) -> Result<Vec<u8>> {
        self.read(self.remaining())
    }

    /// Read up to `count` bytes at the cursor without advancing.
    pub fn peek(&self, count: u64) -> Result<Vec<u8>> {
        self.read_at(self.position, count)
    }

    /// Advance the cursor, stopping at the region end.
    pub fn skip(&mut self, count: u64) {
        self.position = self.position.saturating_add(count).min(self.region.end());
    }

    /// Read exactly `N` bytes at the cursor.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let (start, end) = (self.region.start(), self.region.end());
        let want_end = self.position + N as u64;
        if self.position < start || want_end > end {
            return Err(Error::bounds(self.position, want_end, start, end));
        }

        let mut buf = [0u8; N];
        let n = self.source.read_at(self.position, &mut buf)?;
        if n < N {
            return Err(Error::bounds(
                self.position,
                want_end,
                start,
                self.position + n as u64,
            ));
        }
        self.position = want_end;
        Ok(buf)
    }

    /// Read exactly `count` bytes at the cursor.
    pub fn read_exact(&mut self, count: u64) -> Result<Vec<u8>> {
        let start = self.position;
        let bytes = self.read(count)?;
        if (bytes.len() as u64) < count {
            return Err(Error::bounds(
                start,
                start.saturating_add(count),
                self.region.start(),
                start + bytes.len() as u64,
            ));
        }
        Ok(bytes)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    pub fn read_u24(&mut self) -> Result<u32> {
        let b = self.read_array::<3>()?;
        Ok(u32::from_be_bytes([0, b[0], b[1], b[2]]))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_be_bytes(self.read_array()?))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_be_bytes(self.read_array()?))
    }

    /// Read a big-endian unsigned integer `width` bytes wide (0..=8).
    pub fn read_uint(&mut self, width: u64) -> Result<u64> {
        uint_be(&self.read_exact(width)?)
    }

    /// Read a big-endian signed integer `width` bytes wide (1, 2, 4 or 8).
    pub fn read_int(&mut self, width: u64) -> Result<i64> {
        int_be(&self.read_exact(width)?)
    }
}
