//! Measures how the choice of synchronization strategy affects the performance of simple
//! parallel numeric kernels.
//!
//! Every kernel in [`kernels`] comes in several variants that compute the same result but
//! synchronize concurrent updates differently: a critical section, atomics, an explicit lock or
//! a reduction clause, compared against a single-threaded baseline. The [`SweepDriver`] runs all
//! variants of one kernel over a grid of input sizes and thread counts:
//!
//! - [`KernelPlan`] - which sizes, thread counts and repetitions to sweep, derived from the
//!   kernel defaults and a [`SweepConfig`].
//! - [`DataGenerator`] - seeded pseudo-random vectors and matrices, so a sweep can be replayed.
//! - [`ResultSink`] - writes one `;`-delimited record per measurement and one diagnostic record
//!   per result that differs from the single-threaded reference.
//!
//! This package is a development tool for performance analysis, not meant for production use.
//!
//! # Example
//!
//! ```
//! use fork_join::ExecutionContext;
//! use new_zealand::nz;
//! use sync_sweep::{
//!     DataGenerator, Kernel, KernelPlan, ResultSink, Size, SweepConfig, SweepDriver, ThreadSweep,
//! };
//!
//! let config = SweepConfig::new(nz!(2));
//!
//! let mut plan = KernelPlan::new(Kernel::ArraySum, &config);
//! plan.sizes = vec![Size::Length(1000)];
//! plan.threads = ThreadSweep::Explicit(vec![nz!(2)]);
//! plan.repetitions = nz!(1_u32);
//!
//! let mut context = ExecutionContext::new(nz!(2));
//! let sink = ResultSink::new(Vec::new(), Vec::new());
//!
//! let mut driver = SweepDriver::new(&mut context, sink, DataGenerator::from_seed(7), config);
//! let summary = driver.run(&plan).unwrap();
//!
//! assert_eq!(summary.measurements, 4);
//! assert_eq!(summary.mismatches, 0);
//! ```

mod config;
mod data;
mod error;
mod kernel;
pub mod kernels;
mod matrix;
mod measure;
mod sink;
mod sweep;
mod value;

pub use config::*;
pub use data::*;
pub use error::*;
pub use kernel::*;
pub use matrix::*;
pub use measure::*;
pub use sink::*;
pub use sweep::*;
pub use value::*;
