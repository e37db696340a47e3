//! BTable binary format constants and sizing helpers.
//!
//! ## Header
//!
//! ```text
//! [version: u32 BE][label_len: u32 BE][label: u16 BE × label_len]
//! ```
//!
//! ## Row frame
//!
//! ```text
//! [count: u32 BE][col_index: u32 BE][value: f64 BE] × count
//! ```

use crate::error::{BTableError, Result};

/// Format version written into every header. Only version 0 exists.
pub const FORMAT_VERSION: u32 = 0;

/// Delimiter between column names inside the header label string.
pub const UNIT_SEPARATOR: char = '\u{1F}';

/// Size of the fixed header prefix: 4 (`version`) + 4 (`label_len`).
pub const HEADER_PREFIX_BYTES: usize = 4 + 4;

/// Size of the per-row materialized count.
pub const COUNT_BYTES: usize = 4;

/// Size of one stored entry: 4 (`col_index`) + 8 (`value`).
pub const ENTRY_BYTES: usize = 4 + 8;

/// Returns the encoded header size for a label of `label_units` UTF-16 units.
pub fn header_bytes(label_units: usize) -> usize {
    HEADER_PREFIX_BYTES + 2 * label_units
}

/// Returns the worst-case frame size of a fully dense row of `ncols` values.
///
/// Writers reserve this much up front; a row never needs more.
pub fn max_row_bytes(ncols: usize) -> usize {
    COUNT_BYTES + ncols * ENTRY_BYTES
}

/// Joins column names into a single header label string.
pub fn join_labels<I, S>(names: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for (i, name) in names.into_iter().enumerate() {
        if i > 0 {
            out.push(UNIT_SEPARATOR);
        }
        out.push_str(name.as_ref());
    }
    out
}

/// Splits a header label string into its column names.
///
/// A label with no separator (including the empty label) is one column.
pub fn split_labels(labels: &str) -> Vec<&str> {
    labels.split(UNIT_SEPARATOR).collect()
}

/// Narrows a length or index to its 4-byte on-disk field.
pub(crate) fn to_u32_field(n: usize, what: &str) -> Result<u32> {
    u32::try_from(n).map_err(|_| {
        BTableError::LimitExceeded(format!("{} {} does not fit in a u32 field", what, n))
    })
}
