//! # BTable - Sparse Binary Tables
//!
//! Compact, write-once files holding a labeled set of `f64` columns as a
//! sequence of sparse rows.
//!
//! A table is produced in a single pass (header, then every row, then close)
//! and is read-only afterwards. Rows are stored as index-prefixed
//! `(column, value)` pairs; zero values are never written, so sparsity is
//! the only compression the format applies.
//!
//! ## File layout
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │ HEADER                                                        │
//! │                                                               │
//! │ version (u32) | label_len (u32) | label (u16 × label_len)     │
//! │                                                               │
//! │ The label is one string of column names joined by the unit    │
//! │ separator (U+001F). Splitting it yields the column count.     │
//! ├───────────────────────────────────────────────────────────────┤
//! │ ROWS (zero or more frames, back to back)                      │
//! │                                                               │
//! │ count (u32) | [col_index (u32) | value (f64)] × count         │
//! │                                                               │
//! │ ... repeated for each row ...                                 │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! All integers and floats are **big-endian**. There is no magic number,
//! footer, checksum or index: the end of the rows is the end of the stream.
//! A stream that stops inside a frame fails to decode.
//!
//! ## Example
//!
//! ```rust,no_run
//! use btable::{BTableReader, BTableWriter};
//!
//! let mut w = BTableWriter::create("table.bt").unwrap();
//! w.write_header("a\u{1F}b\u{1F}c").unwrap();
//! w.write_row([0.0, 1.5, 0.0]).unwrap();
//! w.write_row([7i64, 0, -2]).unwrap();
//! w.close().unwrap();
//!
//! let mut r = BTableReader::open("table.bt").unwrap();
//! while let Some(row) = r.next_row().unwrap() {
//!     println!("{:?}", row);
//! }
//! ```

mod error;
mod format;
mod header;
mod numeric;
mod reader;
mod row;
mod writer;

pub use error::{BTableError, Result};
pub use format::{
    header_bytes, join_labels, max_row_bytes, split_labels, COUNT_BYTES, ENTRY_BYTES,
    FORMAT_VERSION, HEADER_PREFIX_BYTES, UNIT_SEPARATOR,
};
pub use header::Header;
pub use numeric::NumericInput;
pub use reader::BTableReader;
pub use row::{decode_row, decode_sparse, encode_row, is_materialized, EncodedRow, Validation};
pub use writer::{write_table, write_to, BTableWriter, WriterState};

#[cfg(test)]
mod tests;
