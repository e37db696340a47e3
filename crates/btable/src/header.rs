use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

use crate::error::{BTableError, Result};
use crate::format::{header_bytes, split_labels, to_u32_field, FORMAT_VERSION};

/// The file-leading block: format version plus the column label string.
///
/// The header is written once and fixes the column count every reader uses
/// to size rows. Rows are never checked against it on write unless strict
/// validation is requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Format version (always [`FORMAT_VERSION`] for headers built here).
    pub version: u32,
    /// Column names joined by [`UNIT_SEPARATOR`](crate::UNIT_SEPARATOR).
    pub labels: String,
}

impl Header {
    /// Creates a current-version header for `labels`.
    pub fn new(labels: impl Into<String>) -> Self {
        Self {
            version: FORMAT_VERSION,
            labels: labels.into(),
        }
    }

    /// Number of columns declared by the label string (at least 1).
    #[must_use]
    pub fn columns(&self) -> usize {
        split_labels(&self.labels).len()
    }

    /// Column names in declaration order.
    pub fn column_names(&self) -> Vec<&str> {
        split_labels(&self.labels)
    }

    /// Number of UTF-16 code units the label occupies on disk.
    #[must_use]
    pub fn label_units(&self) -> usize {
        self.labels.encode_utf16().count()
    }

    /// Total encoded size of this header in bytes.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        header_bytes(self.label_units())
    }

    /// Appends the encoded header to `buf`.
    ///
    /// Layout: `[version: u32][label_len: u32][label: u16 × label_len]`
    pub fn encode_into(&self, buf: &mut Vec<u8>) -> Result<()> {
        let units = self.label_units();
        let label_len = to_u32_field(units, "label length")?;

        buf.reserve(header_bytes(units));
        buf.write_u32::<BigEndian>(self.version)?;
        buf.write_u32::<BigEndian>(label_len)?;
        for unit in self.labels.encode_utf16() {
            buf.write_u16::<BigEndian>(unit)?;
        }
        Ok(())
    }

    /// Encodes the header and writes it to `w` in a single `write_all`.
    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<usize> {
        let mut buf = Vec::new();
        self.encode_into(&mut buf)?;
        w.write_all(&buf)?;
        Ok(buf.len())
    }

    /// Reads and validates a header from `r`.
    ///
    /// # Errors
    ///
    /// - [`BTableError::MalformedHeader`] if the stream ends before the
    ///   declared label is complete, or the label is not valid UTF-16.
    /// - [`BTableError::UnsupportedVersion`] for any version other than 0.
    /// - [`BTableError::Io`] for other read failures.
    pub fn read_from<R: Read>(r: &mut R) -> Result<Self> {
        let version = read_prefix(r, "version")?;
        if version != FORMAT_VERSION {
            return Err(BTableError::UnsupportedVersion(version));
        }
        let label_len = read_prefix(r, "label length")? as usize;

        // Bounded chunks: allocation grows with bytes actually read, not
        // with the declared length.
        const CHUNK_UNITS: usize = 4096;
        let mut units: Vec<u16> = Vec::with_capacity(label_len.min(CHUNK_UNITS));
        let mut chunk = vec![0u8; 2 * label_len.min(CHUNK_UNITS)];
        let mut remaining = label_len;
        while remaining > 0 {
            let n = remaining.min(CHUNK_UNITS);
            let bytes = &mut chunk[..2 * n];
            r.read_exact(bytes).map_err(|e| match e.kind() {
                io::ErrorKind::UnexpectedEof => BTableError::MalformedHeader(format!(
                    "label declares {} code units but the stream ended after {}",
                    label_len,
                    label_len - remaining
                )),
                _ => BTableError::Io(e),
            })?;
            units.extend(
                bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]])),
            );
            remaining -= n;
        }

        let labels = String::from_utf16(&units)
            .map_err(|e| BTableError::MalformedHeader(format!("label is not valid UTF-16: {}", e)))?;

        Ok(Self { version, labels })
    }
}

fn read_prefix<R: Read>(r: &mut R, what: &str) -> Result<u32> {
    r.read_u32::<BigEndian>().map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => {
            BTableError::MalformedHeader(format!("stream ended before the {}", what))
        }
        _ => BTableError::Io(e),
    })
}
