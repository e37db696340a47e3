use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::Read;

use crate::error::{BTableError, Result};
use crate::format::{to_u32_field, COUNT_BYTES};
use crate::numeric::NumericInput;

/// Upper bound on entries pre-allocated from an untrusted frame count.
const MAX_PREALLOC_ENTRIES: usize = 64 * 1024;

/// How much checking the codec does beyond what the layout requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Validation {
    /// Accept everything the layout can express. Rows may carry a different
    /// number of values than the header declares, and decoded indices may
    /// repeat or arrive out of order (the last value for an index wins).
    #[default]
    Lenient,
    /// Reject rows whose length differs from the header column count on
    /// write, and indices that are not strictly ascending on read.
    Strict,
}

/// What [`encode_row`] produced for one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedRow {
    /// Number of non-zero entries written.
    pub materialized: usize,
    /// Number of source values consumed (the dense row length).
    pub values: usize,
}

/// Returns `true` if `v` is stored. `+0.0` and `-0.0` are both suppressed;
/// `NaN` and infinities are stored.
#[inline]
#[must_use]
pub fn is_materialized(v: f64) -> bool {
    v != 0.0
}

/// Appends one row frame to `buf`.
///
/// The count slot is reserved first and back-filled once the values have
/// been consumed, so the source is iterated exactly once. Non-zero values
/// are written as `(col_index, value)` in source order; zero values leave
/// no bytes behind.
///
/// On error `buf` is restored to its previous length.
///
/// # Errors
///
/// Returns [`BTableError::LimitExceeded`] if a stored value sits at a column
/// index beyond `u32::MAX`.
pub fn encode_row<I, V>(buf: &mut Vec<u8>, values: I) -> Result<EncodedRow>
where
    I: IntoIterator<Item = V>,
    V: Into<NumericInput>,
{
    let start = buf.len();
    match encode_row_inner(buf, start, values) {
        Ok(encoded) => Ok(encoded),
        Err(e) => {
            buf.truncate(start);
            Err(e)
        }
    }
}

fn encode_row_inner<I, V>(buf: &mut Vec<u8>, start: usize, values: I) -> Result<EncodedRow>
where
    I: IntoIterator<Item = V>,
    V: Into<NumericInput>,
{
    buf.extend_from_slice(&[0u8; COUNT_BYTES]);

    let mut materialized: u32 = 0;
    let mut seen = 0usize;
    for (idx, value) in values.into_iter().enumerate() {
        seen = idx + 1;
        let v = value.into().to_f64();
        if !is_materialized(v) {
            continue;
        }
        let idx = to_u32_field(idx, "column index")?;
        buf.write_u32::<BigEndian>(idx)?;
        buf.write_f64::<BigEndian>(v)?;
        materialized += 1;
    }

    buf[start..start + COUNT_BYTES].copy_from_slice(&materialized.to_be_bytes());

    Ok(EncodedRow {
        materialized: materialized as usize,
        values: seen,
    })
}

/// Reads one row frame and returns its stored `(col_index, value)` pairs as
/// they appear on disk.
///
/// Indices are not range-checked. With [`Validation::Strict`] they must be
/// strictly ascending.
///
/// Fails with [`BTableError::Io`] (`UnexpectedEof`) if the stream ends
/// before `count` pairs were read; no partial row is returned.
pub fn decode_sparse<R: Read>(r: &mut R, validation: Validation) -> Result<Vec<(u32, f64)>> {
    let count = r.read_u32::<BigEndian>()? as usize;
    let mut entries = Vec::with_capacity(count.min(MAX_PREALLOC_ENTRIES));
    let mut previous: Option<u32> = None;
    for _ in 0..count {
        let idx = r.read_u32::<BigEndian>()?;
        let value = r.read_f64::<BigEndian>()?;
        check_order(validation, &mut previous, idx)?;
        entries.push((idx, value));
    }
    Ok(entries)
}

/// Reads one row frame and scatters it into a zero-filled row of `columns`
/// values.
///
/// # Errors
///
/// - [`BTableError::RowIndexOutOfRange`] if an index is `>= columns`.
/// - [`BTableError::Io`] if the frame is truncated.
pub fn decode_row<R: Read>(r: &mut R, columns: usize) -> Result<Vec<f64>> {
    let mut row = Vec::new();
    decode_row_into(r, columns, Validation::Lenient, &mut row)?;
    Ok(row)
}

/// Decodes one frame into `row`, replacing its contents. On error `row`
/// holds no partial data.
pub(crate) fn decode_row_into<R: Read>(
    r: &mut R,
    columns: usize,
    validation: Validation,
    row: &mut Vec<f64>,
) -> Result<()> {
    row.clear();
    row.resize(columns, 0.0);

    let result = scatter_frame(r, columns, validation, row);
    if result.is_err() {
        row.clear();
    }
    result
}

fn scatter_frame<R: Read>(
    r: &mut R,
    columns: usize,
    validation: Validation,
    row: &mut [f64],
) -> Result<()> {
    let count = r.read_u32::<BigEndian>()?;
    let mut previous: Option<u32> = None;

    for _ in 0..count {
        let idx = r.read_u32::<BigEndian>()?;
        let value = r.read_f64::<BigEndian>()?;

        if idx as usize >= columns {
            return Err(BTableError::RowIndexOutOfRange {
                index: idx,
                columns,
            });
        }
        check_order(validation, &mut previous, idx)?;

        row[idx as usize] = value;
    }
    Ok(())
}

/// Strict mode: each index must be greater than the one before it.
fn check_order(validation: Validation, previous: &mut Option<u32>, idx: u32) -> Result<()> {
    if validation != Validation::Strict {
        return Ok(());
    }
    if let Some(prev) = *previous {
        if idx <= prev {
            return Err(BTableError::UnorderedIndex {
                previous: prev,
                index: idx,
            });
        }
    }
    *previous = Some(idx);
    Ok(())
}
