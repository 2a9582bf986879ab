//! I/O module: codec dispatch and chunked stream adaptation
//!
//! [`compression`] resolves a file extension into a concrete byte
//! stream; [`chunked`] supplies the buffering adapter that turns a
//! bounded-read decompression primitive into that byte stream.

pub mod chunked;
pub mod compression;

pub use chunked::{ChunkSource, ChunkStreamReader, StreamState, ZstdChunkSource, ZstdStreamWriter, CHUNK_SIZE};
pub use compression::{Codec, CompressedReader, CompressedWriter, GzipStreamReader, Mode};
