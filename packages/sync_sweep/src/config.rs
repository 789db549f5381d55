use std::num::NonZero;

use many_cpus::ProcessorSetBuilder;
use new_zealand::nz;

use crate::{Kernel, Size};

/// Process-level settings that apply to every kernel sweep.
///
/// Unset values fall back to the kernel's own defaults.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[expect(clippy::exhaustive_structs, reason = "plain configuration bag")]
pub struct SweepConfig {
    /// How many times the whole sweep is repeated.
    pub repetitions: Option<NonZero<u32>>,

    /// Upper limit for the thread counts of the sweep.
    pub max_threads: Option<NonZero<usize>>,

    /// Number of processors available to the process, the base for thread count multiples.
    pub hardware_threads: NonZero<usize>,
}

impl SweepConfig {
    /// A configuration without overrides for a machine with `hardware_threads` processors.
    #[must_use]
    pub fn new(hardware_threads: NonZero<usize>) -> Self {
        Self {
            repetitions: None,
            max_threads: None,
            hardware_threads,
        }
    }

    /// A configuration without overrides for the processors available to this process.
    #[must_use]
    #[cfg_attr(test, mutants::skip)] // Depends on the machine the tests run on.
    pub fn detect() -> Self {
        let hardware_threads = ProcessorSetBuilder::new()
            .take_all()
            .and_then(|processors| NonZero::new(processors.len()))
            .unwrap_or(nz!(1));

        Self::new(hardware_threads)
    }
}

/// Which thread counts a kernel is measured with.
#[derive(Clone, Debug, Eq, PartialEq)]
#[expect(clippy::exhaustive_enums, reason = "closed set of sweep shapes")]
pub enum ThreadSweep {
    /// Only the hardware thread count. Used by kernels whose records have no thread column.
    Hardware,

    /// Every count from `first` up to `multiple` times the hardware thread count.
    Multiple {
        /// The smallest thread count.
        first: NonZero<usize>,

        /// Multiple of the hardware thread count that bounds the sweep.
        multiple: NonZero<usize>,

        /// Whether the bound itself is measured.
        inclusive: bool,
    },

    /// Exactly the listed counts.
    Explicit(Vec<NonZero<usize>>),
}

impl ThreadSweep {
    /// The thread counts to measure, in ascending order for the generated sweeps.
    ///
    /// Counts above `cap` are dropped. If that would leave nothing, the sweep consists of the
    /// cap alone.
    #[must_use]
    pub fn counts(
        &self,
        hardware_threads: NonZero<usize>,
        cap: Option<NonZero<usize>>,
    ) -> Vec<NonZero<usize>> {
        let cap = cap.map_or(usize::MAX, NonZero::get);

        let counts: Vec<_> = match self {
            Self::Hardware => vec![hardware_threads],
            Self::Multiple {
                first,
                multiple,
                inclusive,
            } => {
                let bound = hardware_threads.get().saturating_mul(multiple.get());
                let last = if *inclusive {
                    bound
                } else {
                    bound.saturating_sub(1)
                };

                (first.get()..=last).filter_map(NonZero::new).collect()
            }
            Self::Explicit(counts) => counts.clone(),
        };

        let capped: Vec<_> = counts.iter().copied().filter(|count| count.get() <= cap).collect();

        if capped.is_empty() {
            let fallback = counts
                .iter()
                .copied()
                .min()
                .unwrap_or(hardware_threads)
                .min(NonZero::new(cap).unwrap_or(nz!(1)));

            return vec![fallback];
        }

        capped
    }
}

/// Everything the sweep driver needs to know to sweep one kernel.
#[derive(Clone, Debug, Eq, PartialEq)]
#[expect(clippy::exhaustive_structs, reason = "plain configuration bag")]
pub struct KernelPlan {
    /// The kernel to measure.
    pub kernel: Kernel,

    /// Input sizes, in the order they are measured within one repetition.
    pub sizes: Vec<Size>,

    /// Thread counts measured for every size.
    pub threads: ThreadSweep,

    /// How many times the whole size sweep is repeated.
    pub repetitions: NonZero<u32>,
}

impl KernelPlan {
    /// The default plan of `kernel`, with repetitions overridden by `config` if set.
    #[must_use]
    pub fn new(kernel: Kernel, config: &SweepConfig) -> Self {
        Self {
            kernel,
            sizes: kernel.default_sizes(),
            threads: default_threads(kernel),
            repetitions: config
                .repetitions
                .unwrap_or_else(|| default_repetitions(kernel)),
        }
    }
}

fn default_threads(kernel: Kernel) -> ThreadSweep {
    match kernel {
        Kernel::MinFind => ThreadSweep::Hardware,
        Kernel::DotProduct | Kernel::Integration | Kernel::Minimax | Kernel::MinimaxNested => {
            ThreadSweep::Multiple {
                first: nz!(2),
                multiple: nz!(4),
                inclusive: true,
            }
        }
        Kernel::MinimaxTriangular => ThreadSweep::Multiple {
            first: nz!(2),
            multiple: nz!(4),
            inclusive: false,
        },
        Kernel::ArraySum => ThreadSweep::Multiple {
            first: nz!(2),
            multiple: nz!(2),
            inclusive: false,
        },
        Kernel::CycleModes => ThreadSweep::Multiple {
            first: nz!(2),
            multiple: nz!(2),
            inclusive: true,
        },
    }
}

fn default_repetitions(kernel: Kernel) -> NonZero<u32> {
    match kernel {
        Kernel::CycleModes => nz!(15_u32),
        _ => nz!(30_u32),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inclusive_multiple() {
        let sweep = ThreadSweep::Multiple {
            first: nz!(2),
            multiple: nz!(4),
            inclusive: true,
        };

        let counts = sweep.counts(nz!(2), None);

        assert_eq!(
            counts.iter().map(|count| count.get()).collect::<Vec<_>>(),
            vec![2, 3, 4, 5, 6, 7, 8]
        );
    }

    #[test]
    fn exclusive_multiple() {
        let sweep = ThreadSweep::Multiple {
            first: nz!(2),
            multiple: nz!(2),
            inclusive: false,
        };

        let counts = sweep.counts(nz!(3), None);

        assert_eq!(
            counts.iter().map(|count| count.get()).collect::<Vec<_>>(),
            vec![2, 3, 4, 5]
        );
    }

    #[test]
    fn cap_limits_counts() {
        let sweep = ThreadSweep::Multiple {
            first: nz!(2),
            multiple: nz!(4),
            inclusive: true,
        };

        assert_eq!(sweep.counts(nz!(8), Some(nz!(3))), vec![nz!(2), nz!(3)]);
        assert_eq!(sweep.counts(nz!(8), Some(nz!(1))), vec![nz!(1)]);
    }

    #[test]
    fn single_processor_exclusive_sweep_is_not_empty() {
        let sweep = ThreadSweep::Multiple {
            first: nz!(2),
            multiple: nz!(2),
            inclusive: false,
        };

        assert_eq!(sweep.counts(nz!(1), None), vec![nz!(1)]);
    }

    #[test]
    fn hardware_and_explicit() {
        assert_eq!(ThreadSweep::Hardware.counts(nz!(6), None), vec![nz!(6)]);
        assert_eq!(
            ThreadSweep::Explicit(vec![nz!(1), nz!(2), nz!(9)]).counts(nz!(6), Some(nz!(4))),
            vec![nz!(1), nz!(2)]
        );
    }

    #[test]
    fn repetitions_override() {
        let mut config = SweepConfig::new(nz!(4));
        assert_eq!(KernelPlan::new(Kernel::Minimax, &config).repetitions, nz!(30_u32));
        assert_eq!(KernelPlan::new(Kernel::CycleModes, &config).repetitions, nz!(15_u32));

        config.repetitions = Some(nz!(2_u32));
        assert_eq!(KernelPlan::new(Kernel::CycleModes, &config).repetitions, nz!(2_u32));
    }
}
