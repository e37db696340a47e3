use log::debug;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::error::Result;
use crate::header::Header;
use crate::row::{decode_row_into, decode_sparse, Validation};

/// Sequential BTable reader.
///
/// The header is read and validated on construction; rows are then decoded
/// one frame at a time. The reader is generic over any `Read` implementor,
/// so it works on files (`BTableReader<File>`) and in-memory buffers alike.
///
/// End of data is a clean end-of-stream exactly at a frame boundary. A
/// stream that ends inside a frame, even inside its 4-byte count, fails
/// with an `UnexpectedEof` I/O error.
pub struct BTableReader<R: Read> {
    rdr: BufReader<R>,
    header: Header,
    columns: usize,
    validation: Validation,
    rows_read: u64,
    /// Set once iteration hits an error; the stream position is unknown.
    failed: bool,
}

impl BTableReader<File> {
    /// Opens a table file and reads its header.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<BTableReader<File>> {
        let f = File::open(path.as_ref())?;
        let reader = Self::from_reader(f)?;
        debug!(
            "btable: opened {} ({} columns)",
            path.as_ref().display(),
            reader.columns
        );
        Ok(reader)
    }
}

impl<R: Read> BTableReader<R> {
    /// Reads the header from `reader` and returns a lenient row reader.
    pub fn from_reader(reader: R) -> Result<Self> {
        Self::with_validation(reader, Validation::Lenient)
    }

    /// Reads the header from `reader` with the given validation level.
    pub fn with_validation(reader: R, validation: Validation) -> Result<Self> {
        let mut rdr = BufReader::new(reader);
        let header = Header::read_from(&mut rdr)?;
        let columns = header.columns();
        Ok(Self {
            rdr,
            header,
            columns,
            validation,
            rows_read: 0,
            failed: false,
        })
    }

    /// The decoded header.
    #[must_use]
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Column count declared by the header.
    #[must_use]
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Number of rows decoded so far.
    #[must_use]
    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    /// Decodes the next row into a dense `Vec<f64>` of [`columns`](Self::columns)
    /// values, or returns `Ok(None)` at end of data.
    pub fn next_row(&mut self) -> Result<Option<Vec<f64>>> {
        let mut row = Vec::with_capacity(self.columns);
        if self.read_row_into(&mut row)? {
            Ok(Some(row))
        } else {
            Ok(None)
        }
    }

    /// Decodes the next row into `row`, reusing its allocation.
    ///
    /// Returns `Ok(false)` at end of data.
    pub fn read_row_into(&mut self, row: &mut Vec<f64>) -> Result<bool> {
        if self.at_end()? {
            row.clear();
            return Ok(false);
        }
        decode_row_into(&mut self.rdr, self.columns, self.validation, row)?;
        self.rows_read += 1;
        Ok(true)
    }

    /// Returns the next row's stored `(col_index, value)` pairs without
    /// scattering them, or `Ok(None)` at end of data.
    ///
    /// Indices are returned as stored and are not range-checked; a strict
    /// reader still rejects unordered or repeated indices.
    pub fn next_sparse(&mut self) -> Result<Option<Vec<(u32, f64)>>> {
        if self.at_end()? {
            return Ok(None);
        }
        let entries = decode_sparse(&mut self.rdr, self.validation)?;
        self.rows_read += 1;
        Ok(Some(entries))
    }

    /// Decodes every remaining row.
    pub fn read_all(&mut self) -> Result<Vec<Vec<f64>>> {
        let mut rows = Vec::new();
        while let Some(row) = self.next_row()? {
            rows.push(row);
        }
        Ok(rows)
    }

    fn at_end(&mut self) -> Result<bool> {
        Ok(self.rdr.fill_buf()?.is_empty())
    }
}

impl<R: Read> Iterator for BTableReader<R> {
    type Item = Result<Vec<f64>>;

    /// Yields each remaining row. After the first error the iterator is
    /// exhausted.
    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self.next_row().transpose();
        if matches!(item, Some(Err(_))) {
            self.failed = true;
        }
        item
    }
}
