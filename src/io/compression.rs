//! Codec selection and the byte-stream capability objects behind it
//!
//! A path's final extension picks the codec exactly once, at open time:
//! `.gz` maps to flate2's native gzip streams, `.zst` to the chunked
//! adapter in [`crate::io::chunked`]. Everything downstream works
//! against [`CompressedReader`] / [`CompressedWriter`] without further
//! branching on the codec.

use crate::error::{Result, ZcsvError};
use crate::io::chunked::{ChunkStreamReader, ZstdChunkSource, ZstdStreamWriter};
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::str::FromStr;

/// Compression codec selected from a file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    /// Standard gzip container (`.gz`)
    Gzip,
    /// Standard zstd frames (`.zst`)
    Zstd,
}

impl Codec {
    /// Maps a path's final extension to a codec.
    ///
    /// The mapping is fixed: `.gz` and `.zst` are the only recognized
    /// suffixes, and file content is never inspected.
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("gz") => Ok(Codec::Gzip),
            Some("zst") => Ok(Codec::Zstd),
            other => Err(ZcsvError::UnsupportedExtension {
                extension: other.map(|ext| format!(".{ext}")).unwrap_or_default(),
            }),
        }
    }
}

/// Open mode for [`crate::open`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// Open an existing compressed file for row reads
    Read,
    /// Create (or truncate) a compressed file for row writes
    #[default]
    Write,
}

impl FromStr for Mode {
    type Err = ZcsvError;

    /// Parses exactly `"read"` or `"write"` (case-sensitive).
    fn from_str(mode: &str) -> Result<Self> {
        match mode {
            "read" => Ok(Mode::Read),
            "write" => Ok(Mode::Write),
            other => Err(ZcsvError::UnsupportedMode {
                mode: other.to_string(),
            }),
        }
    }
}

/// Native gzip byte-stream reader
///
/// flate2's decoder already yields a byte stream, so line and byte
/// reads sit directly on [`BufRead`]; no chunk adaptation is needed on
/// this path.
pub struct GzipStreamReader {
    decoder: Option<BufReader<MultiGzDecoder<File>>>,
}

impl GzipStreamReader {
    fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            decoder: Some(BufReader::new(MultiGzDecoder::new(file))),
        })
    }

    fn read_line(&mut self, sep: &[u8], limit: Option<usize>) -> io::Result<Option<Vec<u8>>> {
        if sep.is_empty() {
            return self.read_all();
        }
        let decoder = match self.decoder.as_mut() {
            Some(decoder) => decoder,
            None => return Ok(None),
        };
        let last = sep[sep.len() - 1];
        let mut line = Vec::new();
        loop {
            let n = decoder.read_until(last, &mut line)?;
            if n == 0 {
                // Exhausted: any partial tail is the final unterminated line
                return Ok(if line.is_empty() { None } else { Some(line) });
            }
            if line.ends_with(sep) {
                if let Some(limit) = limit {
                    line.truncate(limit);
                }
                return Ok(Some(line));
            }
        }
    }

    fn read_bytes(&mut self, len: Option<usize>) -> io::Result<Option<Vec<u8>>> {
        let len = match len {
            Some(len) => len,
            None => return self.read_all(),
        };
        let decoder = match self.decoder.as_mut() {
            Some(decoder) => decoder,
            None => return Ok(None),
        };
        let mut bytes = Vec::new();
        decoder.by_ref().take(len as u64).read_to_end(&mut bytes)?;
        Ok(if bytes.is_empty() { None } else { Some(bytes) })
    }

    fn read_all(&mut self) -> io::Result<Option<Vec<u8>>> {
        let decoder = match self.decoder.as_mut() {
            Some(decoder) => decoder,
            None => return Ok(None),
        };
        let mut bytes = Vec::new();
        decoder.read_to_end(&mut bytes)?;
        Ok(if bytes.is_empty() { None } else { Some(bytes) })
    }

    fn close(&mut self) {
        self.decoder = None;
    }

    fn is_closed(&self) -> bool {
        self.decoder.is_none()
    }
}

impl Read for GzipStreamReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.decoder.as_mut() {
            Some(decoder) => decoder.read(buf),
            None => Ok(0),
        }
    }
}

/// Reader half of the codec dispatch
///
/// Resolved once at open time. Both variants expose the same surface
/// (line reads, byte reads, read-to-end, close) and implement [`Read`],
/// so a row engine can consume either without knowing the codec.
pub enum CompressedReader {
    /// Native gzip byte stream
    Gzip(GzipStreamReader),
    /// Chunked zstd adapter
    Zstd(ChunkStreamReader<ZstdChunkSource<BufReader<File>>>),
}

impl std::fmt::Debug for CompressedReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gzip(_) => f.write_str("CompressedReader::Gzip"),
            Self::Zstd(_) => f.write_str("CompressedReader::Zstd"),
        }
    }
}

impl CompressedReader {
    /// Opens `path` for reading, selecting the codec from its extension.
    ///
    /// The extension is validated before the file is touched.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match Codec::from_path(path)? {
            Codec::Gzip => Ok(Self::Gzip(GzipStreamReader::open(path)?)),
            Codec::Zstd => {
                let file = BufReader::new(File::open(path)?);
                let source = ZstdChunkSource::new(file)?;
                Ok(Self::Zstd(ChunkStreamReader::new(source)))
            }
        }
    }

    /// Reads up to and including the next occurrence of `sep`.
    ///
    /// See [`ChunkStreamReader::read_line`] for the full contract; the
    /// gzip path honors the same one.
    pub fn read_line(&mut self, sep: &[u8], limit: Option<usize>) -> io::Result<Option<Vec<u8>>> {
        match self {
            Self::Gzip(reader) => reader.read_line(sep, limit),
            Self::Zstd(reader) => reader.read_line(sep, limit),
        }
    }

    /// Reads up to `len` bytes; `None` length reads the whole remainder.
    pub fn read_bytes(&mut self, len: Option<usize>) -> io::Result<Option<Vec<u8>>> {
        match self {
            Self::Gzip(reader) => reader.read_bytes(len),
            Self::Zstd(reader) => reader.read_bytes(len),
        }
    }

    /// Reads all remaining bytes as one unit.
    pub fn read_all(&mut self) -> io::Result<Option<Vec<u8>>> {
        match self {
            Self::Gzip(reader) => reader.read_all(),
            Self::Zstd(reader) => reader.read_all(),
        }
    }

    /// Releases the underlying file. Idempotent.
    pub fn close(&mut self) -> io::Result<()> {
        match self {
            Self::Gzip(reader) => {
                reader.close();
                Ok(())
            }
            Self::Zstd(reader) => reader.close(),
        }
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        match self {
            Self::Gzip(reader) => reader.is_closed(),
            Self::Zstd(reader) => reader.is_closed(),
        }
    }
}

impl Read for CompressedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Gzip(reader) => reader.read(buf),
            Self::Zstd(reader) => reader.read(buf),
        }
    }
}

/// Writer half of the codec dispatch
///
/// The gzip encoder is held in an `Option` so close can finalize the
/// stream exactly once; the zstd variant carries the same guarantee
/// inside [`ZstdStreamWriter`].
pub enum CompressedWriter {
    /// Native gzip encoder, `None` once finalized
    Gzip(Option<GzEncoder<BufWriter<File>>>),
    /// Chunked zstd sink
    Zstd(ZstdStreamWriter<BufWriter<File>>),
}

impl std::fmt::Debug for CompressedWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gzip(_) => f.write_str("CompressedWriter::Gzip"),
            Self::Zstd(_) => f.write_str("CompressedWriter::Zstd"),
        }
    }
}

impl CompressedWriter {
    /// Creates `path` for writing, selecting the codec from its
    /// extension.
    ///
    /// The extension is validated before the file is created. `level`
    /// overrides the codec's default compression level and is passed
    /// through unchanged.
    pub fn create<P: AsRef<Path>>(path: P, level: Option<i32>) -> Result<Self> {
        let path = path.as_ref();
        let codec = Codec::from_path(path)?;
        let file = BufWriter::new(File::create(path)?);
        match codec {
            Codec::Gzip => {
                let compression = match level {
                    // gzip levels are 0-9
                    Some(level) => Compression::new(level.clamp(0, 9) as u32),
                    None => Compression::default(),
                };
                Ok(Self::Gzip(Some(GzEncoder::new(file, compression))))
            }
            Codec::Zstd => Ok(Self::Zstd(ZstdStreamWriter::new(file, level)?)),
        }
    }

    /// Finalizes the compression stream and releases the file.
    ///
    /// Safe to call more than once; a second close does not
    /// re-finalize.
    pub fn close(&mut self) -> io::Result<()> {
        match self {
            Self::Gzip(encoder) => {
                if let Some(encoder) = encoder.take() {
                    let mut inner = encoder.finish()?;
                    inner.flush()?;
                }
                Ok(())
            }
            Self::Zstd(writer) => writer.close(),
        }
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        match self {
            Self::Gzip(encoder) => encoder.is_none(),
            Self::Zstd(writer) => writer.is_closed(),
        }
    }
}

impl Write for CompressedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Gzip(Some(encoder)) => encoder.write(buf),
            Self::Gzip(None) => Err(io::Error::new(
                io::ErrorKind::Other,
                "write to closed stream",
            )),
            Self::Zstd(writer) => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Gzip(Some(encoder)) => encoder.flush(),
            Self::Gzip(None) => Ok(()),
            Self::Zstd(writer) => writer.flush(),
        }
    }
}

impl Drop for CompressedWriter {
    fn drop(&mut self) {
        // Best-effort close on drop
        // Callers should close() explicitly to observe errors
        let _ = self.close();
    }
}
