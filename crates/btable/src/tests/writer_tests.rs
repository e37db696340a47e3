use crate::*;
use std::io::{self, Write};
use tempfile::tempdir;

// -------------------- Test sinks --------------------

/// Accepts at most one byte per call and interrupts every other call.
#[derive(Debug, Default)]
struct TrickleSink {
    data: Vec<u8>,
    calls: usize,
}

impl Write for TrickleSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.calls += 1;
        if self.calls % 2 == 0 {
            return Err(io::Error::new(io::ErrorKind::Interrupted, "try again"));
        }
        match buf.first() {
            Some(b) => {
                self.data.push(*b);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Fails every write after `budget` bytes have been accepted.
#[derive(Debug)]
struct FullDisk {
    budget: usize,
}

impl Write for FullDisk {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.budget == 0 {
            return Err(io::Error::new(io::ErrorKind::Other, "no space left"));
        }
        let n = buf.len().min(self.budget);
        self.budget -= n;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Fails a single write once `fail_at` bytes are in, then accepts everything.
#[derive(Debug)]
struct HiccupSink {
    data: Vec<u8>,
    fail_at: usize,
    tripped: bool,
}

impl Write for HiccupSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.tripped && self.data.len() >= self.fail_at {
            self.tripped = true;
            return Err(io::Error::new(io::ErrorKind::Other, "device busy"));
        }
        let n = if self.tripped {
            buf.len()
        } else {
            buf.len().min(self.fail_at - self.data.len())
        };
        self.data.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn scenario_rows() -> Vec<Vec<f64>> {
    vec![vec![0.0, 0.0, 0.0], vec![1.5, 0.0, 0.0], vec![0.0, 0.0, -3.25]]
}

fn scenario_bytes() -> Vec<u8> {
    let mut b = Vec::new();
    // header: version=0, label_len=5, "a␟b␟c"
    b.extend_from_slice(&0u32.to_be_bytes());
    b.extend_from_slice(&5u32.to_be_bytes());
    for unit in [0x61u16, 0x1F, 0x62, 0x1F, 0x63] {
        b.extend_from_slice(&unit.to_be_bytes());
    }
    // row 0: count=0
    b.extend_from_slice(&0u32.to_be_bytes());
    // row 1: count=1, (0, 1.5)
    b.extend_from_slice(&1u32.to_be_bytes());
    b.extend_from_slice(&0u32.to_be_bytes());
    b.extend_from_slice(&[0x3F, 0xF8, 0, 0, 0, 0, 0, 0]);
    // row 2: count=1, (2, -3.25)
    b.extend_from_slice(&1u32.to_be_bytes());
    b.extend_from_slice(&2u32.to_be_bytes());
    b.extend_from_slice(&[0xC0, 0x0A, 0, 0, 0, 0, 0, 0]);
    b
}

// -------------------- Layout --------------------

#[test]
fn three_column_scenario_matches_layout() {
    let out = write_to(Vec::new(), "a\u{1F}b\u{1F}c", scenario_rows()).unwrap();
    assert_eq!(out, scenario_bytes());
}

#[test]
fn output_is_deterministic() {
    let a = write_to(Vec::new(), "a\u{1F}b\u{1F}c", scenario_rows()).unwrap();
    let b = write_to(Vec::new(), "a\u{1F}b\u{1F}c", scenario_rows()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn header_only_table() {
    let out = write_to(Vec::new(), "solo", Vec::<Vec<f64>>::new()).unwrap();

    let mut expected = Vec::new();
    Header::new("solo").encode_into(&mut expected).unwrap();
    assert_eq!(out, expected);
}

#[test]
fn partial_writes_are_drained() {
    let sink = write_to(TrickleSink::default(), "a\u{1F}b\u{1F}c", scenario_rows()).unwrap();
    assert_eq!(sink.data, scenario_bytes());
}

#[test]
fn rows_wider_than_header_are_not_truncated() {
    let mut w = BTableWriter::new(Vec::new());
    assert_eq!(w.write_header("a").unwrap(), 1);
    w.write_row([1.0, 2.0, 3.0, 4.0]).unwrap();
    let out = w.into_inner().unwrap();

    let body = &out[Header::new("a").encoded_len()..];
    assert_eq!(body.len(), max_row_bytes(4));
    let entries = decode_sparse(&mut &body[..], Validation::Lenient).unwrap();
    assert_eq!(entries, vec![(0, 1.0), (1, 2.0), (2, 3.0), (3, 4.0)]);
}

// -------------------- State machine --------------------

#[test]
fn row_before_header_is_invalid_state() {
    let mut w = BTableWriter::new(Vec::new());
    assert_eq!(w.state(), WriterState::AwaitingHeader);
    let err = w.write_row([1.0]).unwrap_err();
    assert!(matches!(err, BTableError::InvalidState(_)));
    assert_eq!(w.bytes_written(), 0);
}

#[test]
fn second_header_is_invalid_state() {
    let mut w = BTableWriter::new(Vec::new());
    w.write_header("a").unwrap();
    assert_eq!(w.state(), WriterState::WritingRows);
    assert!(matches!(
        w.write_header("b"),
        Err(BTableError::InvalidState(_))
    ));
}

#[test]
fn writes_after_close_are_invalid_state() {
    let mut w = BTableWriter::new(Vec::new());
    w.write_header("a\u{1F}b").unwrap();
    w.write_row([1.0, 0.0]).unwrap();
    w.close().unwrap();
    assert_eq!(w.state(), WriterState::Closed);

    assert!(matches!(w.write_row([1.0, 2.0]), Err(BTableError::InvalidState(_))));
    assert!(matches!(w.write_header("c"), Err(BTableError::InvalidState(_))));

    // close is idempotent
    w.close().unwrap();
    assert_eq!(w.rows_written(), 1);
}

#[test]
fn counters_track_output() {
    let mut w = BTableWriter::new(Vec::new());
    w.write_header("a\u{1F}b\u{1F}c").unwrap();
    assert_eq!(w.columns(), 3);
    w.write_rows(scenario_rows()).unwrap();
    assert_eq!(w.rows_written(), 3);
    assert_eq!(w.bytes_written() as usize, scenario_bytes().len());
}

// -------------------- Strict validation --------------------

#[test]
fn strict_mode_rejects_row_length_mismatch() {
    let mut w = BTableWriter::with_validation(Vec::new(), Validation::Strict);
    w.write_header("a\u{1F}b").unwrap();
    let before = w.bytes_written();

    let err = w.write_row([1.0, 2.0, 3.0]).unwrap_err();
    assert!(matches!(
        err,
        BTableError::RowLengthMismatch {
            expected: 2,
            actual: 3
        }
    ));
    assert_eq!(w.bytes_written(), before, "rejected row must not be written");

    w.write_row([1.0, 2.0]).unwrap();
    assert_eq!(w.rows_written(), 1);
}

#[test]
fn lenient_mode_accepts_row_length_mismatch() {
    let mut w = BTableWriter::new(Vec::new());
    w.write_header("a\u{1F}b").unwrap();
    w.write_row([1.0]).unwrap();
    w.write_row([1.0, 2.0, 0.0]).unwrap();
    assert_eq!(w.rows_written(), 2);
}

// -------------------- I/O failures --------------------

#[test]
fn sink_failure_surfaces_as_io_error() {
    let sink = FullDisk { budget: 20 };
    let err = write_to(sink, "a\u{1F}b\u{1F}c", scenario_rows()).unwrap_err();
    assert!(matches!(err, BTableError::Io(_)));
}

#[test]
fn sink_failure_is_terminal_even_if_the_sink_recovers() {
    // 18 header bytes, then 6 of the first row's 16 before the failure.
    let sink = HiccupSink {
        data: Vec::new(),
        fail_at: 24,
        tripped: false,
    };
    let mut w = BTableWriter::new(sink);
    w.write_header("a\u{1F}b\u{1F}c").unwrap();

    let err = w.write_row(vec![1.5, 0.0, 0.0]).unwrap_err();
    assert!(matches!(err, BTableError::Io(_)));
    assert_eq!(w.state(), WriterState::Failed);
    assert_eq!(w.rows_written(), 0);

    // The sink would accept this row, but it would land after a torn frame.
    let err = w.write_row(vec![0.0, 2.0, 0.0]).unwrap_err();
    assert!(matches!(err, BTableError::InvalidState(_)));
    assert!(matches!(
        w.write_header("x"),
        Err(BTableError::InvalidState(_))
    ));
    assert!(matches!(w.close(), Err(BTableError::InvalidState(_))));
    assert_eq!(w.state(), WriterState::Failed);
    assert!(matches!(w.into_inner(), Err(BTableError::InvalidState(_))));
}

#[test]
fn rejected_row_does_not_fail_the_writer() {
    let mut w = BTableWriter::with_validation(Vec::new(), Validation::Strict);
    w.write_header("a\u{1F}b").unwrap();
    assert!(w.write_row(vec![1.0]).is_err());
    assert_eq!(w.state(), WriterState::WritingRows);
    w.write_row(vec![1.0, 2.0]).unwrap();
    assert_eq!(w.rows_written(), 1);
}

// -------------------- Files --------------------

#[test]
fn write_table_returns_destination() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("scenario.bt");

    let returned = write_table(&path, "a\u{1F}b\u{1F}c", scenario_rows()).unwrap();
    assert_eq!(returned, path);
    assert_eq!(std::fs::read(&path).unwrap(), scenario_bytes());
}

#[test]
fn create_truncates_existing_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("old.bt");
    std::fs::write(&path, vec![0xFFu8; 4096]).unwrap();

    write_table(&path, "a\u{1F}b\u{1F}c", scenario_rows()).unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), scenario_bytes());
}

#[test]
fn create_in_missing_directory_fails() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("no/such/dir/t.bt");
    assert!(matches!(
        BTableWriter::create(&path),
        Err(BTableError::Io(_))
    ));
}
