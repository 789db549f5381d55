//! Fork-join parallel regions over a shared-memory worker pool.
//!
//! This package provides the parallel runtime that the synchronization benchmarks measure:
//!
//! - [`ExecutionContext`] - a pre-warmed worker pool plus the settings (thread count, loop
//!   schedule, nested parallelism) that the next region is started with.
//! - Fork-join regions ([`ExecutionContext::parallel()`]), parallel loops
//!   ([`ExecutionContext::parallel_for()`]) and reduction clauses
//!   ([`ExecutionContext::parallel_for_reduce()`] with [`Sum`], [`Min`] or [`Max`]).
//! - Loop schedules ([`Schedule`]): static blocks, round-robin chunks, dynamic and guided claims.
//! - Nested regions started from inside a running region ([`TeamMember::nested_region()`]).
//! - Explicit synchronization of shared accumulators: [`CriticalSection`], [`ExplicitLock`]
//!   and [`AtomicF64`] alongside the atomics of the standard library.
//!
//! # Region settings
//!
//! Settings live in the context, not in process-wide state. They are changed through
//! `&mut ExecutionContext`, so they can only change between regions, and every region sees an
//! immutable copy of them via [`TeamMember::settings()`].
//!
//! ```
//! use fork_join::{CriticalSection, ExecutionContext};
//! use new_zealand::nz;
//!
//! let mut context = ExecutionContext::new(nz!(1));
//! context.set_thread_count(nz!(4));
//!
//! let values = (0..1000_i64).collect::<Vec<_>>();
//! let total = CriticalSection::new(0_i64);
//!
//! context.parallel(|member| {
//!     let partial: i64 = values[member.static_chunk(values.len())].iter().sum();
//!     total.enter(|total| *total += partial);
//! });
//!
//! assert_eq!(total.into_inner(), 499_500);
//! ```

mod atomic_f64;
mod context;
mod critical_section;
mod explicit_lock;
mod reduction;
mod schedule;
mod team;
mod thread_pool;

pub use atomic_f64::*;
pub use context::*;
pub use critical_section::*;
pub use explicit_lock::*;
pub use reduction::*;
pub use schedule::*;
pub use team::*;
pub use thread_pool::*;
