use log::{debug, trace};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{BTableError, Result};
use crate::format::max_row_bytes;
use crate::header::Header;
use crate::numeric::NumericInput;
use crate::row::{encode_row, Validation};

/// Lifecycle of a [`BTableWriter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    /// Nothing written yet; only [`BTableWriter::write_header`] is allowed.
    AwaitingHeader,
    /// Header written; rows may be appended.
    WritingRows,
    /// Flushed and finished; every further write fails.
    Closed,
    /// A write to the sink failed partway; the output is incomplete and
    /// every further write or close fails.
    Failed,
}

/// Sequential, single-pass BTable writer.
///
/// Each call encodes into a reusable scratch buffer and hands the whole
/// frame to the sink with `write_all`, which keeps writing until no bytes
/// remain (partial writes are retried, `Interrupted` is ignored). Nothing
/// is held back between calls, so once a call returns its bytes are in the
/// sink.
///
/// The writer owns the sink. Dropping it (on success or on any error path)
/// releases the underlying handle.
pub struct BTableWriter<W: Write> {
    sink: W,
    state: WriterState,
    validation: Validation,
    columns: usize,
    rows_written: u64,
    bytes_written: u64,
    /// Reusable scratch buffer, pre-sized for a fully dense row.
    buf: Vec<u8>,
}

impl BTableWriter<File> {
    /// Creates (or truncates) the file at `path` and wraps it in a lenient
    /// writer.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::create_with(path, Validation::Lenient)
    }

    /// Creates (or truncates) the file at `path` with the given validation
    /// level.
    pub fn create_with<P: AsRef<Path>>(path: P, validation: Validation) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path.as_ref())?;
        debug!("btable: created {}", path.as_ref().display());
        Ok(Self::with_validation(file, validation))
    }

    /// Forces written data to disk via `sync_all()`.
    pub fn sync_to_disk(&mut self) -> Result<()> {
        self.ensure_not_failed()?;
        let result = self.sink.flush().and_then(|()| self.sink.sync_all());
        self.record(result)
    }
}

impl<W: Write> BTableWriter<W> {
    /// Wraps `sink` in a lenient writer.
    pub fn new(sink: W) -> Self {
        Self::with_validation(sink, Validation::Lenient)
    }

    /// Wraps `sink` with the given validation level.
    pub fn with_validation(sink: W, validation: Validation) -> Self {
        Self {
            sink,
            state: WriterState::AwaitingHeader,
            validation,
            columns: 0,
            rows_written: 0,
            bytes_written: 0,
            buf: Vec::new(),
        }
    }

    /// Writes the header for `labels` and returns the declared column count.
    ///
    /// # Errors
    ///
    /// [`BTableError::InvalidState`] unless the writer is in
    /// [`WriterState::AwaitingHeader`], or any I/O failure.
    pub fn write_header(&mut self, labels: &str) -> Result<usize> {
        if self.state != WriterState::AwaitingHeader {
            return Err(BTableError::InvalidState("header already written"));
        }

        let header = Header::new(labels);
        self.buf.clear();
        header.encode_into(&mut self.buf)?;
        self.emit_buf()?;

        self.bytes_written += self.buf.len() as u64;
        self.columns = header.columns();
        self.state = WriterState::WritingRows;

        // Every row from here on fits without growing the buffer.
        self.buf.clear();
        self.buf.reserve(max_row_bytes(self.columns));

        debug!(
            "btable: header written (version={}, columns={}, {} bytes)",
            header.version,
            self.columns,
            header.encoded_len()
        );
        Ok(self.columns)
    }

    /// Encodes and writes one row.
    ///
    /// Values may be any mix of types convertible into [`NumericInput`];
    /// integers are widened to `f64`. The buffer grows if a row is wider than
    /// the header declared, so an oversized row is never truncated.
    ///
    /// # Errors
    ///
    /// - [`BTableError::InvalidState`] before the header, after close, or
    ///   after an earlier sink failure.
    /// - [`BTableError::RowLengthMismatch`] in strict mode when the row length
    ///   differs from the column count. Nothing is written in that case.
    /// - [`BTableError::Io`] on write failure. The writer then moves to
    ///   [`WriterState::Failed`].
    pub fn write_row<I, V>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = V>,
        V: Into<NumericInput>,
    {
        match self.state {
            WriterState::AwaitingHeader => {
                return Err(BTableError::InvalidState("row written before header"))
            }
            WriterState::Closed => return Err(BTableError::InvalidState("writer is closed")),
            WriterState::Failed => return Err(failed_state()),
            WriterState::WritingRows => {}
        }

        self.buf.clear();
        let encoded = encode_row(&mut self.buf, values)?;

        if self.validation == Validation::Strict && encoded.values != self.columns {
            return Err(BTableError::RowLengthMismatch {
                expected: self.columns,
                actual: encoded.values,
            });
        }

        self.emit_buf()?;
        self.rows_written += 1;
        self.bytes_written += self.buf.len() as u64;

        trace!(
            "btable: row {} ({} of {} values stored, {} bytes)",
            self.rows_written,
            encoded.materialized,
            encoded.values,
            self.buf.len()
        );
        Ok(())
    }

    /// Writes every row from `rows`, stopping at the first error.
    pub fn write_rows<R, I, V>(&mut self, rows: R) -> Result<()>
    where
        R: IntoIterator<Item = I>,
        I: IntoIterator<Item = V>,
        V: Into<NumericInput>,
    {
        for row in rows {
            self.write_row(row)?;
        }
        Ok(())
    }

    /// Flushes the sink and moves to [`WriterState::Closed`].
    ///
    /// Closing an already closed writer is a no-op. Closing before the
    /// header was written is allowed and leaves an empty (non-conformant)
    /// destination behind. Closing a failed writer returns
    /// [`BTableError::InvalidState`].
    pub fn close(&mut self) -> Result<()> {
        match self.state {
            WriterState::Closed => return Ok(()),
            WriterState::Failed => return Err(failed_state()),
            WriterState::AwaitingHeader | WriterState::WritingRows => {}
        }
        let result = self.sink.flush();
        self.record(result)?;
        self.state = WriterState::Closed;
        debug!(
            "btable: closed ({} rows, {} bytes)",
            self.rows_written, self.bytes_written
        );
        Ok(())
    }

    /// Closes the writer and returns the sink.
    pub fn into_inner(mut self) -> Result<W> {
        self.close()?;
        Ok(self.sink)
    }

    /// Hands the scratch buffer to the sink in one `write_all`.
    fn emit_buf(&mut self) -> Result<()> {
        let result = self.sink.write_all(&self.buf);
        self.record(result)
    }

    /// Passes `result` through, moving to [`WriterState::Failed`] on error.
    /// A frame may be half written at that point, so nothing after it can
    /// be appended.
    fn record(&mut self, result: std::io::Result<()>) -> Result<()> {
        if let Err(e) = result {
            self.state = WriterState::Failed;
            debug!(
                "btable: sink failed after {} rows ({} bytes): {}",
                self.rows_written, self.bytes_written, e
            );
            return Err(e.into());
        }
        Ok(())
    }

    fn ensure_not_failed(&self) -> Result<()> {
        if self.state == WriterState::Failed {
            return Err(failed_state());
        }
        Ok(())
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> WriterState {
        self.state
    }

    /// Column count declared by the header (0 before the header is written).
    #[must_use]
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Number of row frames written so far.
    #[must_use]
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Total bytes handed to the sink, header included.
    #[must_use]
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
}

/// Writes a complete table to `dest` in one pass and returns `dest`.
///
/// The file is created (or truncated), the header and every row written,
/// then the file is synced and closed. On error the partially written file
/// is left in place and its handle is released; the caller decides whether
/// to remove it.
pub fn write_table<P, R, I, V>(dest: P, labels: &str, rows: R) -> Result<PathBuf>
where
    P: AsRef<Path>,
    R: IntoIterator<Item = I>,
    I: IntoIterator<Item = V>,
    V: Into<NumericInput>,
{
    let dest = dest.as_ref().to_path_buf();
    let mut w = BTableWriter::create(&dest)?;
    w.write_header(labels)?;
    w.write_rows(rows)?;
    w.sync_to_disk()?;
    w.close()?;
    Ok(dest)
}

/// Writes a complete table into `sink` and returns it.
pub fn write_to<W, R, I, V>(sink: W, labels: &str, rows: R) -> Result<W>
where
    W: Write,
    R: IntoIterator<Item = I>,
    I: IntoIterator<Item = V>,
    V: Into<NumericInput>,
{
    let mut w = BTableWriter::new(sink);
    w.write_header(labels)?;
    w.write_rows(rows)?;
    w.into_inner()
}

fn failed_state() -> BTableError {
    BTableError::InvalidState("an earlier write to the sink failed")
}
