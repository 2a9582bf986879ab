//! Row-oriented facade over the dispatched byte streams
//!
//! Pairs a [`CompressedReader`] / [`CompressedWriter`] with the csv
//! engine and guarantees teardown order: the engine always flushes
//! through the byte stream before the stream is finalized. Dropping a
//! reader or writer releases both layers on every exit path; the
//! explicit `close` methods exist so teardown errors can be observed.

use crate::error::{Result, ZcsvError};
use crate::io::compression::{CompressedReader, CompressedWriter, Mode};
use csv::StringRecord;
use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::Arc;

/// Options passed through to the csv engine
///
/// The compression layer does not interpret these; they configure field
/// splitting and header handling only.
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Field delimiter (`b','` for CSV, `b'\t'` for TSV)
    pub delimiter: u8,
    /// Treat the first row as a header row when reading
    pub has_headers: bool,
    /// Header row to emit first when writing
    pub headers: Option<Vec<String>>,
    /// Permit records with varying field counts
    pub flexible: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_headers: false,
            headers: None,
            flexible: false,
        }
    }
}

impl CsvOptions {
    /// Default options: comma-delimited, no header handling.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the field delimiter.
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Reads the first row as headers, enabling keyed access via
    /// [`Row::get`].
    pub fn has_headers(mut self, yes: bool) -> Self {
        self.has_headers = yes;
        self
    }

    /// Writes `headers` as the first row.
    pub fn headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.headers = Some(headers.into_iter().map(Into::into).collect());
        self
    }

    /// Permits records with varying field counts.
    pub fn flexible(mut self, yes: bool) -> Self {
        self.flexible = yes;
        self
    }
}

/// Configuration for [`open`], validated eagerly at open time
///
/// There is intentionally no extension override: the extension-to-codec
/// mapping is fixed.
#[derive(Debug, Clone, Default)]
pub struct OpenOptions {
    /// Compression level override; `None` uses the codec default
    pub level: Option<i32>,
    /// Options for the csv engine
    pub csv: CsvOptions,
}

impl OpenOptions {
    /// Default options: codec-default level, default [`CsvOptions`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the compression level.
    pub fn level(mut self, level: i32) -> Self {
        self.level = Some(level);
        self
    }

    /// Sets the csv engine options.
    pub fn csv(mut self, csv: CsvOptions) -> Self {
        self.csv = csv;
        self
    }
}

/// One parsed row, with keyed access when a header row was read
#[derive(Debug, Clone)]
pub struct Row {
    headers: Option<Arc<StringRecord>>,
    record: StringRecord,
}

impl Row {
    /// Field by header name.
    ///
    /// `None` when the reader was opened without headers or the name is
    /// unknown.
    pub fn get(&self, name: &str) -> Option<&str> {
        let headers = self.headers.as_deref()?;
        let index = headers.iter().position(|header| header == name)?;
        self.record.get(index)
    }

    /// Field by position.
    pub fn get_index(&self, index: usize) -> Option<&str> {
        self.record.get(index)
    }

    /// All fields in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.record.iter()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.record.len()
    }

    /// Whether the row has no fields.
    pub fn is_empty(&self) -> bool {
        self.record.is_empty()
    }

    /// Header-keyed map of this row; fields stay string-typed.
    ///
    /// Empty when the reader was opened without headers.
    pub fn to_map(&self) -> HashMap<String, String> {
        match self.headers.as_deref() {
            Some(headers) => headers
                .iter()
                .zip(self.record.iter())
                .map(|(header, field)| (header.to_string(), field.to_string()))
                .collect(),
            None => HashMap::new(),
        }
    }

    /// The underlying csv record.
    pub fn record(&self) -> &StringRecord {
        &self.record
    }
}

/// Streaming row reader over a compressed file
///
/// Iterates rows one at a time; the underlying byte stream is pulled on
/// demand, so memory stays constant regardless of file size.
pub struct RowReader {
    reader: Option<csv::Reader<CompressedReader>>,
    headers: Option<Arc<StringRecord>>,
}

impl RowReader {
    /// Opens `path` for reading; the codec comes from its extension.
    pub fn open<P: AsRef<Path>>(path: P, options: CsvOptions) -> Result<Self> {
        let stream = CompressedReader::open(path)?;
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .has_headers(options.has_headers)
            .flexible(options.flexible)
            .from_reader(stream);
        let headers = if options.has_headers {
            Some(Arc::new(reader.headers()?.clone()))
        } else {
            None
        };
        Ok(Self {
            reader: Some(reader),
            headers,
        })
    }

    /// The header row, when one was read.
    pub fn headers(&self) -> Option<&StringRecord> {
        self.headers.as_deref()
    }

    /// Closes the csv engine, then the underlying byte stream.
    ///
    /// Dropping the reader releases the same resources; the explicit
    /// form surfaces close errors. Idempotent.
    pub fn close(&mut self) -> Result<()> {
        if let Some(reader) = self.reader.take() {
            let mut stream = reader.into_inner();
            stream.close()?;
        }
        Ok(())
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.reader.is_none()
    }
}

impl std::fmt::Debug for RowReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowReader")
            .field("closed", &self.reader.is_none())
            .field("headers", &self.headers)
            .finish()
    }
}

impl Iterator for RowReader {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        let reader = self.reader.as_mut()?;
        let mut record = StringRecord::new();
        match reader.read_record(&mut record) {
            Ok(true) => Some(Ok(Row {
                headers: self.headers.clone(),
                record,
            })),
            Ok(false) => None,
            Err(e) => Some(Err(e.into())),
        }
    }
}

/// Streaming row writer into a compressed file
pub struct RowWriter {
    writer: Option<csv::Writer<CompressedWriter>>,
    rows_written: usize,
}

impl std::fmt::Debug for RowWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowWriter")
            .field("closed", &self.writer.is_none())
            .field("rows_written", &self.rows_written)
            .finish()
    }
}

impl RowWriter {
    /// Creates `path` for writing; the codec comes from its extension.
    ///
    /// When `options.headers` is set, the header row is written first.
    /// `level` overrides the codec's default compression level.
    pub fn create<P: AsRef<Path>>(path: P, level: Option<i32>, options: CsvOptions) -> Result<Self> {
        let stream = CompressedWriter::create(path, level)?;
        let mut writer = csv::WriterBuilder::new()
            .delimiter(options.delimiter)
            .flexible(options.flexible)
            .from_writer(stream);
        if let Some(headers) = &options.headers {
            writer.write_record(headers)?;
        }
        Ok(Self {
            writer: Some(writer),
            rows_written: 0,
        })
    }

    /// Appends one row.
    pub fn write_row<I, T>(&mut self, row: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        let writer = self.writer.as_mut().ok_or_else(closed_error)?;
        writer.write_record(row)?;
        self.rows_written += 1;
        Ok(())
    }

    /// Number of rows appended so far (the header row is not counted).
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Flushes buffered rows through the compression stream.
    pub fn flush(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
        }
        Ok(())
    }

    /// Flushes the csv engine into the byte stream, then finalizes the
    /// compression stream.
    ///
    /// The engine closes first: its buffered rows must still pass
    /// through the stream. Idempotent; dropping the writer performs the
    /// same teardown best-effort.
    pub fn close(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
            let mut stream = match writer.into_inner() {
                Ok(stream) => stream,
                Err(e) => {
                    let error = e.error();
                    return Err(io::Error::new(error.kind(), error.to_string()).into());
                }
            };
            stream.close()?;
        }
        Ok(())
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.writer.is_none()
    }
}

impl Drop for RowWriter {
    fn drop(&mut self) {
        // Best-effort close on drop
        // Callers should close() explicitly to observe errors
        let _ = self.close();
    }
}

fn closed_error() -> ZcsvError {
    ZcsvError::Io(io::Error::new(
        io::ErrorKind::Other,
        "write to closed stream",
    ))
}

/// Result of the string-mode [`open`] entry point
#[derive(Debug)]
pub enum RowStream {
    /// Opened in `"read"` mode
    Reader(RowReader),
    /// Opened in `"write"` mode
    Writer(RowWriter),
}

impl RowStream {
    /// The reader, when opened in read mode.
    pub fn into_reader(self) -> Option<RowReader> {
        match self {
            Self::Reader(reader) => Some(reader),
            Self::Writer(_) => None,
        }
    }

    /// The writer, when opened in write mode.
    pub fn into_writer(self) -> Option<RowWriter> {
        match self {
            Self::Reader(_) => None,
            Self::Writer(writer) => Some(writer),
        }
    }
}

/// Opens a compressed CSV/TSV file for row access.
///
/// `mode` must be exactly `"read"` or `"write"`; the codec comes from
/// the path's final extension (`.gz` or `.zst`). Both are validated
/// before any file I/O, so an invalid mode or extension never touches
/// the filesystem.
///
/// # Example
///
/// ```no_run
/// use zcsv::{open, CsvOptions, OpenOptions, RowStream};
///
/// # fn main() -> zcsv::Result<()> {
/// let options = OpenOptions::new().csv(CsvOptions::new().headers(["name", "age"]));
/// if let RowStream::Writer(mut writer) = open("people.csv.zst", "write", options)? {
///     writer.write_row(["Alice", "30"])?;
///     writer.close()?;
/// }
/// # Ok(())
/// # }
/// ```
pub fn open<P: AsRef<Path>>(path: P, mode: &str, options: OpenOptions) -> Result<RowStream> {
    match mode.parse::<Mode>()? {
        Mode::Read => Ok(RowStream::Reader(RowReader::open(path, options.csv)?)),
        Mode::Write => Ok(RowStream::Writer(RowWriter::create(
            path,
            options.level,
            options.csv,
        )?)),
    }
}

/// Opens `path` in read mode and applies `action` to every row.
///
/// Both layers are released on every exit path, including a row error.
pub fn for_each<P, F>(path: P, options: CsvOptions, mut action: F) -> Result<()>
where
    P: AsRef<Path>,
    F: FnMut(Row),
{
    let mut reader = RowReader::open(path, options)?;
    for row in reader.by_ref() {
        action(row?);
    }
    reader.close()
}

/// Opens `path` in read mode and returns the lazy row sequence.
///
/// Each call opens the file afresh; iteration is forward-only and not
/// resumable once abandoned.
pub fn rows<P: AsRef<Path>>(path: P, options: CsvOptions) -> Result<RowReader> {
    RowReader::open(path, options)
}
