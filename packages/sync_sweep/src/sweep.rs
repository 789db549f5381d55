use std::io::Write;
use std::num::NonZero;
use std::time::Duration;

use fork_join::ExecutionContext;
use new_zealand::nz;
use tracing::{debug, info, trace};

use crate::kernels::{
    ArraySum, CycleModes, DotProduct, Integrand, Integration, MinFind, Minimax,
    MinimaxNested, MinimaxTriangular, Variant, sequential_sum,
};
use crate::{
    DataGenerator, Kernel, KernelError, KernelPlan, ResultSink, Row, Size, SweepConfig,
    SweepError, Value, measure,
};

/// Totals of a completed sweep.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[expect(clippy::exhaustive_structs, reason = "plain totals")]
pub struct SweepSummary {
    /// Number of measurements recorded.
    pub measurements: u64,

    /// Number of results that differed from their single-threaded reference.
    pub mismatches: u64,
}

/// Drives the measurement of one kernel over every combination of repetition, input size,
/// thread count and variant.
///
/// For each size, a fresh dataset is generated. The single-threaded variant (if the kernel has
/// one) runs first and its result becomes the reference for that size. Then, for every thread
/// count, the execution context is reconfigured and each parallel variant is measured and its
/// result compared against the reference.
#[derive(Debug)]
pub struct SweepDriver<'a, W, D> {
    context: &'a mut ExecutionContext,
    sink: ResultSink<W, D>,
    data: DataGenerator,
    config: SweepConfig,
}

impl<'a, W, D> SweepDriver<'a, W, D>
where
    W: Write,
    D: Write,
{
    /// Creates a driver that measures on `context`, fills datasets from `data` and writes
    /// to `sink`.
    #[must_use]
    pub fn new(
        context: &'a mut ExecutionContext,
        sink: ResultSink<W, D>,
        data: DataGenerator,
        config: SweepConfig,
    ) -> Self {
        Self {
            context,
            sink,
            data,
            config,
        }
    }

    /// Executes every sweep point of `plan`.
    ///
    /// Correctness mismatches are reported to the sink and do not stop the sweep.
    ///
    /// Kernels whose records have no thread column are measured at the largest thread count
    /// of the sweep only.
    ///
    /// # Errors
    ///
    /// Returns [`SweepError::Kernel`] if a kernel rejects its input, which callers are to
    /// treat as fatal, and [`SweepError::Io`] if the output cannot be written.
    pub fn run(&mut self, plan: &KernelPlan) -> Result<SweepSummary, SweepError> {
        let mut thread_counts = plan
            .threads
            .counts(self.config.hardware_threads, self.config.max_threads);

        if !plan.kernel.has_thread_column() && thread_counts.len() > 1 {
            let largest = thread_counts.iter().copied().max();

            debug!(
                kernel = %plan.kernel,
                requested = thread_counts.len(),
                "records have no thread column, measuring the largest thread count only"
            );

            thread_counts = largest.into_iter().collect();
        }

        info!(
            kernel = %plan.kernel,
            repetitions = plan.repetitions.get(),
            sizes = plan.sizes.len(),
            min_threads = thread_counts.iter().min().map(|count| count.get()),
            max_threads = thread_counts.iter().max().map(|count| count.get()),
            seed = self.data.seed(),
            "starting sweep"
        );

        let records_before = self.sink.records_written();
        let mismatches_before = self.sink.mismatches();

        self.sink.begin(plan.kernel)?;

        for repetition in 0..plan.repetitions.get() {
            for size in &plan.sizes {
                debug!(kernel = %plan.kernel, repetition, %size, "measuring size configuration");

                self.run_size(plan.kernel, *size, &thread_counts)?;
            }
        }

        self.sink.flush()?;

        let summary = SweepSummary {
            measurements: self
                .sink
                .records_written()
                .saturating_sub(records_before),
            mismatches: self.sink.mismatches().saturating_sub(mismatches_before),
        };

        info!(
            kernel = %plan.kernel,
            measurements = summary.measurements,
            mismatches = summary.mismatches,
            "sweep completed"
        );

        Ok(summary)
    }

    /// Consumes the driver, returning the sink.
    #[must_use]
    pub fn into_sink(self) -> ResultSink<W, D> {
        self.sink
    }

    fn run_size(
        &mut self,
        kernel: Kernel,
        size: Size,
        thread_counts: &[NonZero<usize>],
    ) -> Result<(), SweepError> {
        match kernel {
            Kernel::MinFind => {
                let values = self.data.vector(size.len());

                self.run_variants(size, thread_counts, None, |variant: MinFind, context| {
                    Ok(variant.run(context, &values).into())
                })
            }
            Kernel::DotProduct => {
                let left = self.data.vector(size.len());
                let right = self.data.vector(size.len());

                self.run_variants(size, thread_counts, None, |variant: DotProduct, context| {
                    Ok(variant.run(context, &left, &right)?.into())
                })
            }
            Kernel::Integration => {
                let integrand = Integrand::new(f64::exp, 0.0, 1.0);
                let rects = size.len();

                self.run_variants(size, thread_counts, None, |variant: Integration, context| {
                    Ok(variant.run(context, &integrand, rects).into())
                })
            }
            Kernel::Minimax => {
                let (rows, cols) = size.shape();
                let matrix = self.data.matrix(rows, cols);

                self.run_variants(size, thread_counts, None, |variant: Minimax, context| {
                    Ok(variant.run(context, &matrix).into())
                })
            }
            Kernel::MinimaxTriangular => {
                let (rows, cols) = size.shape();
                let matrix = self.data.lower_triangular_matrix(rows, cols);

                self.run_variants(
                    size,
                    thread_counts,
                    None,
                    |variant: MinimaxTriangular, context| Ok(variant.run(context, &matrix).into()),
                )
            }
            Kernel::ArraySum => {
                let values = self.data.vector(size.len());
                let reference = Value::from(sequential_sum(&values));

                self.run_variants(
                    size,
                    thread_counts,
                    Some(reference),
                    |variant: ArraySum, context| Ok(variant.run(context, &values).into()),
                )
            }
            Kernel::MinimaxNested => {
                let (rows, cols) = size.shape();
                let matrix = self.data.matrix(rows, cols);

                self.run_variants(
                    size,
                    thread_counts,
                    None,
                    |variant: MinimaxNested, context| Ok(variant.run(context, &matrix).into()),
                )
            }
            Kernel::CycleModes => {
                let iterations = size.len();

                self.run_variants(size, thread_counts, None, |variant: CycleModes, context| {
                    Ok(variant.run(context, iterations).into())
                })
            }
        }
    }

    /// Measures every variant of one kernel for one dataset.
    ///
    /// Without an explicit `reference`, the result of the sequential variant is the reference.
    fn run_variants<V, F>(
        &mut self,
        size: Size,
        thread_counts: &[NonZero<usize>],
        reference: Option<Value>,
        invoke: F,
    ) -> Result<(), SweepError>
    where
        V: Variant,
        F: Fn(V, &ExecutionContext) -> Result<Value, KernelError>,
    {
        let mut reference = reference;

        for variant in V::ALL.iter().copied().filter(|variant| variant.is_sequential()) {
            self.context.set_thread_count(nz!(1));

            let value = self.measure_point(variant, size, &invoke)?;
            reference.get_or_insert(value);
        }

        for &thread_count in thread_counts {
            self.context.set_thread_count(thread_count);

            for variant in V::ALL.iter().copied().filter(|variant| !variant.is_sequential()) {
                let value = self.measure_point(variant, size, &invoke)?;

                if let Some(expected) = reference {
                    let row = self.row(variant, size);
                    self.sink.check(&row, expected, value)?;
                }
            }
        }

        Ok(())
    }

    /// Applies the variant's region settings, measures one invocation and records it.
    fn measure_point<V, F>(
        &mut self,
        variant: V,
        size: Size,
        invoke: &F,
    ) -> Result<Value, SweepError>
    where
        V: Variant,
        F: Fn(V, &ExecutionContext) -> Result<Value, KernelError>,
    {
        self.context.set_schedule(variant.schedule());
        self.context.set_nested(variant.nested());
        variant.prepare(self.context);

        let context = &*self.context;
        let (elapsed, value) = measure(|| invoke(variant, context)).into_parts();
        let value = value?;

        let row = Row {
            elapsed,
            ..self.row(variant, size)
        };

        trace!(
            method = row.method,
            num_threads = row.num_threads.get(),
            %size,
            ?elapsed,
            %value,
            "measured"
        );

        self.sink.record(&row)?;

        Ok(value)
    }

    fn row<V: Variant>(&self, variant: V, size: Size) -> Row {
        Row {
            num_threads: self.context.thread_count(),
            method: variant.tag(),
            size,
            elapsed: Duration::ZERO,
        }
    }
}

#[cfg(not(miri))] // ProcessorSet is not supported under Miri.
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ThreadSweep;

    fn plan(kernel: Kernel, sizes: Vec<Size>, counts: &[NonZero<usize>]) -> KernelPlan {
        KernelPlan {
            kernel,
            sizes,
            threads: ThreadSweep::Explicit(counts.to_vec()),
            repetitions: nz!(1_u32),
        }
    }

    fn sweep(plan: &KernelPlan) -> (SweepSummary, String, String) {
        let mut context = ExecutionContext::new(nz!(1));
        let mut driver = SweepDriver::new(
            &mut context,
            ResultSink::new(Vec::new(), Vec::new()),
            DataGenerator::from_seed(42),
            SweepConfig::new(nz!(2)),
        );

        let summary = driver.run(plan).unwrap();
        let (records, diagnostics) = driver.into_sink().into_inner();

        (
            summary,
            String::from_utf8(records).unwrap(),
            String::from_utf8(diagnostics).unwrap(),
        )
    }

    #[test]
    fn sequential_variant_is_measured_once_per_size() {
        let plan = plan(
            Kernel::Minimax,
            vec![Size::Shape { rows: 3, cols: 3 }],
            &[nz!(1), nz!(2)],
        );

        let (summary, records, diagnostics) = sweep(&plan);

        // One single-threaded row, then two parallel variants per thread count.
        assert_eq!(summary.measurements, 5);
        assert_eq!(summary.mismatches, 0);

        let lines: Vec<_> = records.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines.first().copied(), Some(Kernel::Minimax.header().as_str()));
        assert!(lines.get(1).unwrap().starts_with("1;single;3;3;"));
        assert!(lines.get(2).unwrap().starts_with("1;critical_section;"));
        assert!(lines.last().unwrap().starts_with("2;reduction;"));

        assert_eq!(diagnostics.lines().count(), 1);
    }

    #[test]
    fn array_sum_is_checked_against_sequential_sum() {
        let plan = plan(
            Kernel::ArraySum,
            vec![Size::Length(10), Size::Length(1000)],
            &[nz!(2), nz!(3)],
        );

        let (summary, records, _) = sweep(&plan);

        assert_eq!(summary.measurements, 16);
        assert_eq!(summary.mismatches, 0);
        assert!(records.lines().nth(1).unwrap().starts_with("builtin;2;10;"));
    }

    #[test]
    fn kernel_without_thread_column_uses_one_thread_count() {
        let plan = plan(Kernel::MinFind, vec![Size::Length(100)], &[nz!(1), nz!(3), nz!(2)]);

        let (summary, records, _) = sweep(&plan);

        // The single-threaded row plus both parallel variants at three threads only.
        assert_eq!(summary.measurements, 3);
        assert_eq!(records.lines().count(), 4);
    }

    #[test]
    fn repetitions_repeat_the_whole_size_sweep() {
        let mut plan = plan(Kernel::CycleModes, vec![Size::Length(50)], &[nz!(2)]);
        plan.repetitions = nz!(3_u32);

        let (summary, _, _) = sweep(&plan);

        assert_eq!(summary.measurements, 3 * 4);
        assert_eq!(summary.mismatches, 0);
    }
}
