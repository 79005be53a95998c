//! In-memory byte pipe with backpressure.
//!
//! This is the byte half of a capturing port. Writers share one
//! `PipeWriter` behind an `Arc`; the pipe reaches EOF when the last handle
//! is dropped, which is how an output capture learns that its body is done.
//!
//! ```text
//!   Arc<PipeWriter> ──▶ [ring buffer, bounded] ──▶ PipeReader (AsyncRead)
//!                       ├── full  → writer waits
//!                       ├── empty → reader waits
//!                       ├── writer dropped → EOF
//!                       └── reader dropped → BrokenPipe
//! ```
//!
//! State sits under a `std::sync::Mutex`; every critical section is a
//! handful of deque operations. Wakers are stored under the lock so no
//! wakeup is lost.

use std::collections::VecDeque;
use std::future::poll_fn;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll, Waker};

use tokio::io::{AsyncRead, ReadBuf};

/// Default capacity, matching the usual OS pipe buffer.
pub const PIPE_BUFFER_SIZE: usize = 64 * 1024;

struct Ring {
    bytes: VecDeque<u8>,
    capacity: usize,
    writer_closed: bool,
    reader_closed: bool,
    reader_waker: Option<Waker>,
    writer_waker: Option<Waker>,
}

struct Shared {
    ring: Mutex<Ring>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Ring> {
        self.ring.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Writing end. Not `Clone`; share it with `Arc` so EOF happens once.
pub struct PipeWriter {
    shared: Arc<Shared>,
}

/// Reading end.
pub struct PipeReader {
    shared: Arc<Shared>,
}

/// Create a pipe holding at most `capacity` unread bytes.
pub fn pipe_stream(capacity: usize) -> (PipeWriter, PipeReader) {
    let capacity = capacity.max(1);
    let shared = Arc::new(Shared {
        ring: Mutex::new(Ring {
            bytes: VecDeque::with_capacity(capacity.min(8192)),
            capacity,
            writer_closed: false,
            reader_closed: false,
            reader_waker: None,
            writer_waker: None,
        }),
    });
    (
        PipeWriter {
            shared: shared.clone(),
        },
        PipeReader { shared },
    )
}

impl PipeWriter {
    fn poll_write_some(&self, cx: &mut Context<'_>, data: &[u8]) -> Poll<io::Result<usize>> {
        let mut ring = self.shared.lock();
        if ring.reader_closed {
            return Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe reader closed")));
        }
        let room = ring.capacity.saturating_sub(ring.bytes.len());
        if room == 0 {
            ring.writer_waker = Some(cx.waker().clone());
            return Poll::Pending;
        }
        let n = data.len().min(room);
        ring.bytes.extend(&data[..n]);
        if let Some(waker) = ring.reader_waker.take() {
            waker.wake();
        }
        Poll::Ready(Ok(n))
    }

    /// Write some of `data`, waiting while the pipe is full.
    pub async fn write_bytes(&self, data: &[u8]) -> io::Result<usize> {
        if data.is_empty() {
            return Ok(0);
        }
        poll_fn(|cx| self.poll_write_some(cx, data)).await
    }

    /// Write all of `data`.
    pub async fn write_all(&self, mut data: &[u8]) -> io::Result<()> {
        while !data.is_empty() {
            let n = self.write_bytes(data).await?;
            data = &data[n..];
        }
        Ok(())
    }
}

impl Drop for PipeWriter {
    fn drop(&mut self) {
        let mut ring = self.shared.lock();
        ring.writer_closed = true;
        if let Some(waker) = ring.reader_waker.take() {
            waker.wake();
        }
    }
}

impl AsyncRead for PipeReader {
    fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        let mut ring = self.shared.lock();
        if ring.bytes.is_empty() {
            if ring.writer_closed {
                return Poll::Ready(Ok(()));
            }
            ring.reader_waker = Some(cx.waker().clone());
            return Poll::Pending;
        }

        let n = buf.remaining().min(ring.bytes.len());
        let (front, back) = ring.bytes.as_slices();
        if n <= front.len() {
            buf.put_slice(&front[..n]);
        } else {
            buf.put_slice(front);
            buf.put_slice(&back[..n - front.len()]);
        }
        ring.bytes.drain(..n);
        if let Some(waker) = ring.writer_waker.take() {
            waker.wake();
        }
        Poll::Ready(Ok(()))
    }
}

impl Drop for PipeReader {
    fn drop(&mut self) {
        let mut ring = self.shared.lock();
        ring.reader_closed = true;
        if let Some(waker) = ring.writer_waker.take() {
            waker.wake();
        }
    }
}

impl std::fmt::Debug for PipeWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipeWriter").finish_non_exhaustive()
    }
}

impl std::fmt::Debug for PipeReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipeReader").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};

    #[tokio::test]
    async fn eof_after_last_writer_handle() {
        let (writer, mut reader) = pipe_stream(1024);
        let writer = Arc::new(writer);
        let other = writer.clone();

        writer.write_all(b"one ").await.unwrap();
        other.write_all(b"two").await.unwrap();
        drop(writer);
        drop(other);

        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"one two");
    }

    #[tokio::test]
    async fn small_buffer_applies_backpressure_without_loss() {
        let (writer, mut reader) = pipe_stream(8);
        let data: Vec<u8> = (0..5000).map(|i| (i % 251) as u8).collect();
        let expected = data.clone();

        let producer = tokio::spawn(async move {
            writer.write_all(&data).await.unwrap();
        });

        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        producer.await.unwrap();
        assert_eq!(out, expected);
    }

    #[tokio::test]
    async fn lines_read_through_bufreader() {
        let (writer, reader) = pipe_stream(16);
        let producer = tokio::spawn(async move {
            for i in 0..50 {
                writer.write_all(format!("line {i}\n").as_bytes()).await.unwrap();
            }
        });

        let mut lines = BufReader::new(reader).lines();
        let mut count = 0;
        while let Some(line) = lines.next_line().await.unwrap() {
            assert_eq!(line, format!("line {count}"));
            count += 1;
        }
        producer.await.unwrap();
        assert_eq!(count, 50);
    }

    #[tokio::test]
    async fn broken_pipe_when_reader_dropped() {
        let (writer, reader) = pipe_stream(4);
        drop(reader);
        let err = writer.write_all(b"data").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[tokio::test]
    async fn blocked_writer_wakes_when_reader_dropped() {
        let (writer, reader) = pipe_stream(4);
        let producer = tokio::spawn(async move { writer.write_all(&[0u8; 64]).await });

        tokio::time::sleep(Duration::from_millis(10)).await;
        drop(reader);

        let result = tokio::time::timeout(Duration::from_secs(2), producer).await;
        let write = result.expect("writer hung after reader dropped").unwrap();
        assert_eq!(write.unwrap_err().kind(), io::ErrorKind::BrokenPipe);
    }
}
