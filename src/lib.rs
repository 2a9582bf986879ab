//! zcsv: transparent gzip/zstd compression for streaming CSV/TSV
//!
//! # Overview
//!
//! zcsv reads and writes delimited tabular text stored in compressed
//! form. The codec is selected from the file extension (`.gz` or
//! `.zst`) and rows stream through a uniform record-oriented interface,
//! so callers never touch the compression layer. Files are standard
//! gzip containers or standard zstd frames around raw CSV text, readable
//! by any stock decoder.
//!
//! ## Quick Start
//!
//! ```no_run
//! use zcsv::{CsvOptions, RowReader, RowWriter};
//!
//! # fn main() -> zcsv::Result<()> {
//! // Write rows into a zstd-compressed CSV
//! let options = CsvOptions::new().headers(["name", "age"]);
//! let mut writer = RowWriter::create("people.csv.zst", None, options)?;
//! writer.write_row(["Alice", "30"])?;
//! writer.write_row(["Bob", "25"])?;
//! writer.close()?;
//!
//! // Stream them back with header-keyed access
//! let reader = RowReader::open("people.csv.zst", CsvOptions::new().has_headers(true))?;
//! for row in reader {
//!     let row = row?;
//!     println!("{:?} is {:?}", row.get("name"), row.get("age"));
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency
//!
//! All operations are synchronous and blocking. Each opened stream owns
//! its buffer and file exclusively; sharing one opened stream across
//! threads is excluded (every operation takes `&mut self`).
//!
//! ## Module Organization
//!
//! - [`io`]: codec dispatch and the chunked zstd stream adapter
//! - [`rows`]: row-oriented reader/writer facade and entry points
//! - [`error`]: error types

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod io;
pub mod rows;

// Re-export commonly used types
pub use error::{Result, ZcsvError};
pub use io::compression::{Codec, CompressedReader, CompressedWriter, Mode};
pub use rows::{
    for_each, open, rows, CsvOptions, OpenOptions, Row, RowReader, RowStream, RowWriter,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
