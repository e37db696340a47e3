use anyhow::{Context, Result};
use btable::{join_labels, BTableError, BTableReader, BTableWriter, NumericInput, Validation};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

/// Settings for [`write`], resolved from flags and the environment.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    pub strict: bool,
    pub sync: bool,
    pub delimiter: char,
}

/// What [`write_from`] produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteSummary {
    pub rows: u64,
    pub columns: usize,
    pub bytes: u64,
}

fn validation(strict: bool) -> Validation {
    if strict {
        Validation::Strict
    } else {
        Validation::Lenient
    }
}

/// Splits one text line into numeric fields.
///
/// A whitespace delimiter splits on any run of whitespace; any other
/// delimiter splits on each occurrence and trims the fields.
pub fn parse_row(line: &str, delimiter: char) -> Result<Vec<NumericInput>, BTableError> {
    if delimiter.is_whitespace() {
        line.split_whitespace().map(str::parse).collect()
    } else {
        line.split(delimiter).map(str::parse).collect()
    }
}

/// `btable write`: reads rows from `input` (or stdin) into a new table.
pub fn write(
    dest: &Path,
    labels: &[String],
    input: Option<&Path>,
    opts: &WriteOptions,
) -> Result<()> {
    let summary = match input {
        Some(path) => {
            let f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
            write_from(dest, labels, BufReader::new(f), opts)?
        }
        None => write_from(dest, labels, io::stdin().lock(), opts)?,
    };

    println!(
        "OK ({} rows, {} columns, {} bytes)",
        summary.rows, summary.columns, summary.bytes
    );
    Ok(())
}

/// Writes a table at `dest` from delimited text lines.
///
/// Blank lines and lines starting with `#` are skipped. The first bad line
/// aborts the write and leaves the partial file behind.
pub fn write_from<B: BufRead>(
    dest: &Path,
    labels: &[String],
    input: B,
    opts: &WriteOptions,
) -> Result<WriteSummary> {
    let mut w = BTableWriter::create_with(dest, validation(opts.strict))
        .with_context(|| format!("creating {}", dest.display()))?;
    let columns = w.write_header(&join_labels(labels))?;
    debug!(columns, dest = %dest.display(), "header written");

    for (i, line) in input.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let lineno = i + 1;
        let row = parse_row(trimmed, opts.delimiter).with_context(|| format!("line {}", lineno))?;
        w.write_row(row).with_context(|| format!("line {}", lineno))?;
    }

    if opts.sync {
        w.sync_to_disk()?;
    }
    w.close()?;

    let summary = WriteSummary {
        rows: w.rows_written(),
        columns,
        bytes: w.bytes_written(),
    };
    info!(
        rows = summary.rows,
        columns = summary.columns,
        bytes = summary.bytes,
        "table written to {}",
        dest.display()
    );
    Ok(summary)
}

/// `btable dump`: prints labels then every row to stdout.
pub fn dump(src: &Path, sparse: bool, strict: bool, delimiter: char) -> Result<()> {
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    dump_to(src, &mut out, sparse, strict, delimiter)?;
    out.flush()?;
    Ok(())
}

pub fn dump_to<W: Write>(
    src: &Path,
    out: &mut W,
    sparse: bool,
    strict: bool,
    delimiter: char,
) -> Result<()> {
    let f = File::open(src).with_context(|| format!("opening {}", src.display()))?;
    let mut r = BTableReader::with_validation(f, validation(strict))
        .with_context(|| format!("reading header of {}", src.display()))?;

    let sep = delimiter.to_string();
    writeln!(out, "{}", r.header().column_names().join(sep.as_str()))?;

    if sparse {
        while let Some(entries) = r.next_sparse().context("reading row")? {
            if entries.is_empty() {
                writeln!(out, "(empty)")?;
                continue;
            }
            let fields: Vec<String> = entries
                .iter()
                .map(|(idx, v)| format!("{}:{}", idx, v))
                .collect();
            writeln!(out, "{}", fields.join(" "))?;
        }
    } else {
        let mut row = Vec::with_capacity(r.columns());
        while r.read_row_into(&mut row).context("reading row")? {
            let fields: Vec<String> = row.iter().map(|v| v.to_string()).collect();
            writeln!(out, "{}", fields.join(sep.as_str()))?;
        }
    }

    debug!(rows = r.rows_read(), "dump finished");
    Ok(())
}

/// `btable info`: prints a summary of the table.
pub fn describe(src: &Path) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    describe_to(src, &mut out)
}

pub fn describe_to<W: Write>(src: &Path, out: &mut W) -> Result<()> {
    let bytes = std::fs::metadata(src)
        .with_context(|| format!("reading metadata of {}", src.display()))?
        .len();
    let mut r = BTableReader::open(src).with_context(|| format!("opening {}", src.display()))?;

    let mut stored: u64 = 0;
    while let Some(entries) = r.next_sparse().context("reading row")? {
        stored += entries.len() as u64;
    }

    let rows = r.rows_read();
    let cells = rows * r.columns() as u64;
    let density = if cells == 0 {
        0.0
    } else {
        100.0 * stored as f64 / cells as f64
    };

    writeln!(out, "version: {}", r.header().version)?;
    writeln!(out, "columns: {}", r.columns())?;
    writeln!(out, "labels:  {}", r.header().column_names().join(", "))?;
    writeln!(out, "rows:    {}", rows)?;
    writeln!(out, "stored:  {}", stored)?;
    writeln!(out, "density: {:.2}%", density)?;
    writeln!(out, "bytes:   {}", bytes)?;
    Ok(())
}
