//! Chunk-to-stream adaptation for codecs that only expose bounded reads
//!
//! The zstd decoder hands back at most N bytes per call and signals the
//! end of the stream out of band. [`ChunkStreamReader`] turns that
//! primitive into a byte stream with line-delimited, fixed-length, and
//! read-to-end operations, backed by a queue accumulator that is pulled
//! only when a read needs more bytes.
//!
//! # Architecture
//!
//! - [`ChunkSource`] is the pull side: one decompressed chunk per call,
//!   `Ok(None)` once the underlying stream is exhausted.
//! - [`ChunkStreamReader`] owns the accumulation buffer: chunks are
//!   appended at the back, completed reads are drained from the front,
//!   and an explicit [`StreamState`] records exhaustion so an exhausted
//!   source is never queried again.
//! - [`ZstdStreamWriter`] is the mirror-image sink: writes forward into
//!   a zstd frame, and `close` finalizes the frame exactly once.

use std::collections::VecDeque;
use std::io::{self, BufRead, Read, Write};

/// Bytes requested from the chunk source per pull (128 KiB)
///
/// Matches zstd's internal block granularity so a pull rarely straddles
/// more blocks than necessary. This is throughput tuning only: any
/// positive chunk size produces identical logical results.
pub const CHUNK_SIZE: usize = 128 * 1024;

/// A source of decompressed byte chunks with an out-of-band end signal
///
/// `Ok(None)` means the underlying stream is exhausted and no further
/// bytes will ever be produced. Errors are genuine I/O failures and are
/// never used to signal exhaustion, so callers can tell the two apart
/// without inspecting message text.
pub trait ChunkSource {
    /// Returns the next decompressed chunk, at most `max_len` bytes.
    fn next_chunk(&mut self, max_len: usize) -> io::Result<Option<Vec<u8>>>;
}

/// Chunk source decoding zstd frames from a buffered reader
pub struct ZstdChunkSource<R: BufRead> {
    decoder: zstd::stream::read::Decoder<'static, R>,
}

impl<R: BufRead> ZstdChunkSource<R> {
    /// Creates a chunk source over zstd-compressed `reader`.
    pub fn new(reader: R) -> io::Result<Self> {
        Ok(Self {
            decoder: zstd::stream::read::Decoder::with_buffer(reader)?,
        })
    }
}

impl<R: BufRead> ChunkSource for ZstdChunkSource<R> {
    fn next_chunk(&mut self, max_len: usize) -> io::Result<Option<Vec<u8>>> {
        let mut chunk = vec![0u8; max_len];
        let n = self.decoder.read(&mut chunk)?;
        if n == 0 {
            return Ok(None);
        }
        chunk.truncate(n);
        Ok(Some(chunk))
    }
}

/// Lifecycle of a [`ChunkStreamReader`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// The source may still produce chunks.
    Open,
    /// The source reported exhaustion; only buffered bytes remain.
    SourceExhausted,
    /// The reader was closed and its source released. Terminal.
    Closed,
}

/// Byte-stream reader over a [`ChunkSource`]
///
/// The accumulation buffer holds exactly the bytes that have been
/// decompressed but not yet returned to the caller, in stream order.
/// Reads consume from the front; pulls append at the back. Once the
/// source reports exhaustion the reader drains what is buffered and then
/// reports end of stream on every subsequent call without touching the
/// source again.
///
/// Each reader owns its buffer and source exclusively; every operation
/// takes `&mut self`, so concurrent use of one reader is excluded by
/// the API.
///
/// # Example
///
/// ```no_run
/// use std::fs::File;
/// use std::io::BufReader;
/// use zcsv::io::chunked::{ChunkStreamReader, ZstdChunkSource};
///
/// # fn main() -> std::io::Result<()> {
/// let file = BufReader::new(File::open("table.csv.zst")?);
/// let mut reader = ChunkStreamReader::new(ZstdChunkSource::new(file)?);
///
/// // Each line includes the trailing separator, except possibly the last
/// while let Some(line) = reader.read_line(b"\n", None)? {
///     print!("{}", String::from_utf8_lossy(&line));
/// }
/// # Ok(())
/// # }
/// ```
pub struct ChunkStreamReader<S> {
    source: Option<S>,
    buffer: VecDeque<u8>,
    state: StreamState,
}

impl<S: ChunkSource> ChunkStreamReader<S> {
    /// Creates a reader pulling from `source` on demand.
    pub fn new(source: S) -> Self {
        Self {
            source: Some(source),
            buffer: VecDeque::new(),
            state: StreamState::Open,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.state == StreamState::Closed
    }

    /// Releases the underlying source and discards buffered bytes.
    ///
    /// Safe to call more than once; every call after the first is a
    /// no-op. Reads on a closed reader report end of stream.
    pub fn close(&mut self) -> io::Result<()> {
        self.source = None;
        self.buffer.clear();
        self.state = StreamState::Closed;
        Ok(())
    }

    /// Reads up to and including the next occurrence of `sep`.
    ///
    /// Pulls chunks until the separator appears in the buffer or the
    /// source is exhausted. On exhaustion a non-empty buffer is drained
    /// and returned as a final unterminated line; an empty buffer yields
    /// `None`, and every later call yields `None` without another pull.
    ///
    /// With `limit`, the returned line is truncated to `limit` bytes.
    /// The bytes beyond the limit belong to the line already consumed
    /// from the buffer and are discarded, not returned on the next read.
    ///
    /// An empty `sep` selects whole-remaining-stream mode, identical to
    /// [`read_all`](Self::read_all).
    pub fn read_line(&mut self, sep: &[u8], limit: Option<usize>) -> io::Result<Option<Vec<u8>>> {
        if sep.is_empty() {
            return self.read_all();
        }
        if self.state == StreamState::Closed {
            return Ok(None);
        }

        // Resume scanning where a match could first involve new bytes.
        let mut scan_from = 0;
        loop {
            let haystack = &self.buffer.make_contiguous()[scan_from..];
            if let Some(found) = find_subsequence(haystack, sep) {
                let end = scan_from + found + sep.len();
                let mut line: Vec<u8> = self.buffer.drain(..end).collect();
                if let Some(limit) = limit {
                    line.truncate(limit);
                }
                return Ok(Some(line));
            }
            if self.state == StreamState::SourceExhausted {
                return Ok(self.drain_remaining());
            }
            scan_from = self.buffer.len().saturating_sub(sep.len() - 1);
            self.pull()?;
        }
    }

    /// Reads all remaining bytes as one unit.
    ///
    /// Pulls until the source is exhausted and drains the buffer.
    /// Yields `None` when nothing remains.
    pub fn read_all(&mut self) -> io::Result<Option<Vec<u8>>> {
        if self.state == StreamState::Closed {
            return Ok(None);
        }
        while self.state == StreamState::Open {
            self.pull()?;
        }
        Ok(self.drain_remaining())
    }

    /// Reads up to `len` bytes; `None` length reads the whole remainder.
    ///
    /// Pulls until the buffer holds at least `len` bytes or the source
    /// is exhausted. At the tail this returns fewer bytes than requested
    /// (a short read); `None` is returned only once the buffer is empty
    /// and the source exhausted. A zero-length request also yields
    /// `None`.
    pub fn read_bytes(&mut self, len: Option<usize>) -> io::Result<Option<Vec<u8>>> {
        let len = match len {
            Some(len) => len,
            None => return self.read_all(),
        };
        if self.state == StreamState::Closed {
            return Ok(None);
        }
        while self.buffer.len() < len && self.state == StreamState::Open {
            self.pull()?;
        }
        let take = len.min(self.buffer.len());
        if take == 0 {
            return Ok(None);
        }
        Ok(Some(self.buffer.drain(..take).collect()))
    }

    /// Pulls one chunk into the buffer, or records exhaustion.
    fn pull(&mut self) -> io::Result<()> {
        let chunk = match self.source.as_mut() {
            Some(source) => source.next_chunk(CHUNK_SIZE)?,
            None => None,
        };
        match chunk {
            Some(chunk) if !chunk.is_empty() => self.buffer.extend(chunk),
            _ => {
                if self.state == StreamState::Open {
                    self.state = StreamState::SourceExhausted;
                }
            }
        }
        Ok(())
    }

    fn drain_remaining(&mut self) -> Option<Vec<u8>> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(self.buffer.drain(..).collect())
        }
    }
}

impl<S: ChunkSource> Read for ChunkStreamReader<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() || self.state == StreamState::Closed {
            return Ok(0);
        }
        while self.buffer.is_empty() && self.state == StreamState::Open {
            self.pull()?;
        }
        let n = buf.len().min(self.buffer.len());
        for (dst, byte) in buf.iter_mut().zip(self.buffer.drain(..n)) {
            *dst = byte;
        }
        Ok(n)
    }
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.len() == 1 {
        return haystack.iter().position(|&b| b == needle[0]);
    }
    haystack.windows(needle.len()).position(|window| window == needle)
}

/// Byte sink forwarding writes into a zstd frame
///
/// The encoder is held in an `Option` so that [`close`](Self::close)
/// can finalize the frame exactly once; a second close finds nothing to
/// finalize and is a no-op.
pub struct ZstdStreamWriter<W: Write> {
    encoder: Option<zstd::stream::write::Encoder<'static, W>>,
    level: Option<i32>,
}

impl<W: Write> ZstdStreamWriter<W> {
    /// Creates a writer compressing into `writer`.
    ///
    /// `level` is fixed at construction; `None` uses zstd's default
    /// level.
    pub fn new(writer: W, level: Option<i32>) -> io::Result<Self> {
        let encoder = zstd::stream::write::Encoder::new(
            writer,
            level.unwrap_or(zstd::DEFAULT_COMPRESSION_LEVEL),
        )?;
        Ok(Self {
            encoder: Some(encoder),
            level,
        })
    }

    /// Compression level configured at construction, if any.
    pub fn level(&self) -> Option<i32> {
        self.level
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.encoder.is_none()
    }

    /// Finalizes the zstd frame and flushes the inner writer.
    ///
    /// Safe to call more than once; a second close does not re-finalize.
    pub fn close(&mut self) -> io::Result<()> {
        if let Some(encoder) = self.encoder.take() {
            let mut inner = encoder.finish()?;
            inner.flush()?;
        }
        Ok(())
    }
}

impl<W: Write> Write for ZstdStreamWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.encoder.as_mut() {
            Some(encoder) => encoder.write(buf),
            None => Err(io::Error::new(
                io::ErrorKind::Other,
                "write to closed stream",
            )),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.encoder.as_mut() {
            Some(encoder) => encoder.flush(),
            None => Ok(()),
        }
    }
}

impl<W: Write> Drop for ZstdStreamWriter<W> {
    fn drop(&mut self) {
        // Best-effort close on drop
        // Callers should close() explicitly to observe errors
        let _ = self.close();
    }
}
