use std::io::{self, Write};
use std::num::NonZero;
use std::time::Duration;

use crate::{Column, Kernel, Size, Value};

/// Header of the diagnostics stream.
pub const DIAGNOSTICS_HEADER: &str = "kernel;method;num_threads;size;expected;actual;difference";

/// One measurement as written to the record stream.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[expect(clippy::exhaustive_structs, reason = "plain record of one measurement")]
pub struct Row {
    /// Thread count the measurement ran with.
    pub num_threads: NonZero<usize>,

    /// Variant tag.
    pub method: &'static str,

    /// Input size of the measurement.
    pub size: Size,

    /// Elapsed wall-clock time.
    pub elapsed: Duration,
}

/// Writes `;`-delimited measurement records and correctness diagnostics.
///
/// Records and diagnostics go to separate streams. Both are only written by the orchestrating
/// thread between parallel regions.
#[derive(Debug)]
pub struct ResultSink<W, D> {
    records: W,
    diagnostics: D,

    kernel: Option<Kernel>,
    records_written: u64,
    mismatches: u64,
}

impl<W, D> ResultSink<W, D>
where
    W: Write,
    D: Write,
{
    /// Creates a sink writing to the given streams. Nothing is written until
    /// [`begin()`][Self::begin] is called.
    #[must_use]
    pub fn new(records: W, diagnostics: D) -> Self {
        Self {
            records,
            diagnostics,
            kernel: None,
            records_written: 0,
            mismatches: 0,
        }
    }

    /// Writes the header lines for `kernel`, whose layout all following records use.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to either stream fails.
    pub fn begin(&mut self, kernel: Kernel) -> io::Result<()> {
        self.kernel = Some(kernel);

        writeln!(self.records, "{}", kernel.header())?;
        writeln!(self.diagnostics, "{DIAGNOSTICS_HEADER}")
    }

    /// Appends one record in the column layout of the current kernel.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the record stream fails.
    ///
    /// # Panics
    ///
    /// Panics if [`begin()`][Self::begin] has not been called.
    pub fn record(&mut self, row: &Row) -> io::Result<()> {
        let kernel = self.kernel.expect("begin() must be called before writing records");

        for (index, column) in kernel.columns().iter().enumerate() {
            if index > 0 {
                self.records.write_all(b";")?;
            }

            match column {
                Column::NumThreads => write!(self.records, "{}", row.num_threads)?,
                Column::Method => self.records.write_all(row.method.as_bytes())?,
                Column::Length(_) => write!(self.records, "{}", row.size.len())?,
                Column::Rows => write!(self.records, "{}", row.size.shape().0)?,
                Column::Cols => write!(self.records, "{}", row.size.shape().1)?,
                Column::Elapsed => write!(
                    self.records,
                    "{:.*}",
                    kernel.precision(),
                    kernel.time_unit().convert(row.elapsed)
                )?,
            }
        }

        self.records.write_all(b"\n")?;
        self.records_written = self.records_written.saturating_add(1);

        Ok(())
    }

    /// Compares the result of a measurement against the reference result with strict equality.
    ///
    /// On mismatch, writes a diagnostic record with both values and their difference and
    /// returns `false`. The caller carries on either way.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the diagnostics stream fails.
    ///
    /// # Panics
    ///
    /// Panics if [`begin()`][Self::begin] has not been called.
    pub fn check(&mut self, row: &Row, expected: Value, actual: Value) -> io::Result<bool> {
        let kernel = self.kernel.expect("begin() must be called before checking results");

        if expected == actual {
            return Ok(true);
        }

        let difference = actual.difference(expected);

        tracing::warn!(
            %kernel,
            method = row.method,
            num_threads = row.num_threads.get(),
            size = %row.size,
            %expected,
            %actual,
            %difference,
            "result differs from single-threaded reference"
        );

        writeln!(
            self.diagnostics,
            "{kernel};{};{};{};{expected};{actual};{difference}",
            row.method, row.num_threads, row.size
        )?;

        self.mismatches = self.mismatches.saturating_add(1);

        Ok(false)
    }

    /// Number of records written so far.
    #[must_use]
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Number of mismatches reported so far.
    #[must_use]
    pub fn mismatches(&self) -> u64 {
        self.mismatches
    }

    /// Flushes both streams.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing either stream fails.
    pub fn flush(&mut self) -> io::Result<()> {
        self.records.flush()?;
        self.diagnostics.flush()
    }

    /// Consumes the sink, returning the record and diagnostics streams.
    #[must_use]
    pub fn into_inner(self) -> (W, D) {
        (self.records, self.diagnostics)
    }
}
