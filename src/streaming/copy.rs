//! Chunked, cancellable range copy.

use super::range::ByteRange;
use futures::StreamExt;
use std::io::{self, SeekFrom};
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWrite, AsyncWriteExt};
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;

/// Copy `range` of the file at `path` into `writer`, `chunk_size` bytes at a time.
///
/// The file is opened for this call only. `cancel` is raced against every
/// read, write and the final flush, so a stalled writer cannot hold the copy
/// open; once it fires the copy stops, the file is closed and the bytes
/// accepted by `writer` so far are returned. A file shorter than the range is
/// an [`io::ErrorKind::UnexpectedEof`] error.
pub async fn copy_range<W>(
    path: &Path,
    range: ByteRange,
    writer: &mut W,
    chunk_size: usize,
    cancel: &CancellationToken,
) -> io::Result<u64>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    if chunk_size == 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "chunk size cannot be 0",
        ));
    }

    let mut file = File::open(path).await?;
    file.seek(SeekFrom::Start(range.start)).await?;

    let length = range.content_length();
    let mut stream = ReaderStream::with_capacity(file.take(length), chunk_size);
    let mut written = 0u64;

    'copy: loop {
        let chunk = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            next = stream.next() => match next {
                Some(chunk) => chunk?,
                None => break,
            },
        };

        let mut pos = 0;
        while pos < chunk.len() {
            let n = tokio::select! {
                biased;
                _ = cancel.cancelled() => break 'copy,
                n = writer.write(&chunk[pos..]) => n?,
            };
            if n == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "writer accepted no bytes",
                ));
            }
            pos += n;
            written += n as u64;
        }
    }
    drop(stream);

    if !cancel.is_cancelled() {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {}
            flushed = writer.flush() => flushed?,
        }
    }

    if cancel.is_cancelled() {
        tracing::debug!(
            path = %path.display(),
            written,
            remaining = length - written,
            "Range copy cancelled"
        );
        return Ok(written);
    }

    if written < length {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!(
                "{} ended after {} of {} bytes",
                path.display(),
                written,
                length
            ),
        ));
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use std::time::Duration;

    fn sample_file(len: usize) -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().unwrap();
        let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        std::fs::write(file.path(), &data).unwrap();
        file
    }

    fn range(start: u64, end: u64, file_size: u64) -> ByteRange {
        ByteRange {
            start,
            end,
            file_size,
        }
    }

    /// Writer that cancels the token after its first write.
    struct CancelAfterFirstWrite {
        inner: Vec<u8>,
        token: CancellationToken,
    }

    impl AsyncWrite for CancelAfterFirstWrite {
        fn poll_write(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            self.inner.extend_from_slice(buf);
            self.token.cancel();
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_copies_exact_range() {
        let file = sample_file(10_000);
        let mut out = Vec::new();
        let cancel = CancellationToken::new();

        let n = copy_range(file.path(), range(3000, 4999, 10_000), &mut out, 512, &cancel)
            .await
            .unwrap();

        assert_eq!(n, 2000);
        let expected: Vec<u8> = (3000..5000).map(|i| (i % 251) as u8).collect();
        assert_eq!(out, expected);
    }

    #[tokio::test]
    async fn test_writes_follow_chunk_size() {
        let file = sample_file(10);
        let data: Vec<u8> = (0..10).map(|i| (i % 251) as u8).collect();
        let mut writer = tokio_test::io::Builder::new()
            .write(&data[2..6])
            .write(&data[6..8])
            .build();

        let n = copy_range(
            file.path(),
            range(2, 7, 10),
            &mut writer,
            4,
            &CancellationToken::new(),
        )
        .await
        .unwrap();
        assert_eq!(n, 6);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_copies_nothing() {
        let file = sample_file(1000);
        let mut out = Vec::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let n = copy_range(file.path(), range(0, 999, 1000), &mut out, 64, &cancel)
            .await
            .unwrap();
        assert_eq!(n, 0);
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_between_chunks_stops_copy() {
        let file = sample_file(4096);
        let cancel = CancellationToken::new();
        let mut out = CancelAfterFirstWrite {
            inner: Vec::new(),
            token: cancel.clone(),
        };

        let n = copy_range(file.path(), range(0, 4095, 4096), &mut out, 256, &cancel)
            .await
            .unwrap();
        assert!(n > 0);
        assert!(n < 4096);
        assert_eq!(out.inner.len() as u64, n);
    }

    #[tokio::test]
    async fn test_cancel_unblocks_stalled_writer() {
        let file = sample_file(4096);
        let path = file.path().to_path_buf();
        let cancel = CancellationToken::new();
        // The read half is kept alive but never read, so writes stall once
        // the 16-byte pipe buffer is full.
        let (mut tx, _rx) = tokio::io::duplex(16);

        let task = tokio::spawn({
            let cancel = cancel.clone();
            async move { copy_range(&path, range(0, 4095, 4096), &mut tx, 256, &cancel).await }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!task.is_finished());
        cancel.cancel();

        let n = tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("copy should stop once cancelled")
            .unwrap()
            .unwrap();
        assert_eq!(n, 16);
    }

    #[tokio::test]
    async fn test_short_file_is_unexpected_eof() {
        let file = sample_file(100);
        let mut out = Vec::new();
        let err = copy_range(
            file.path(),
            range(0, 199, 200),
            &mut out,
            64,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[tokio::test]
    async fn test_zero_chunk_size_rejected() {
        let file = sample_file(10);
        let mut out = Vec::new();
        let err = copy_range(
            file.path(),
            range(0, 9, 10),
            &mut out,
            0,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
