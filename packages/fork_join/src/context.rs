use std::num::NonZero;
use std::ops::Range;

use new_zealand::nz;

use crate::team::reserve_helpers;
use crate::{Reduction, RegionSettings, Schedule, TeamMember, ThreadPool, WorkShare};

/// The parallel execution environment: a worker pool plus the settings that the next parallel
/// region will be started with.
///
/// Settings are changed through `&mut self`, which makes it impossible to reconfigure the
/// context while a region started from it is still running. Every region reads an immutable
/// copy of the settings that were active when it started.
///
/// # Example
///
/// ```
/// use fork_join::{ExecutionContext, Sum};
/// use new_zealand::nz;
///
/// let mut context = ExecutionContext::new(nz!(2));
/// context.set_thread_count(nz!(3));
///
/// let values = (1..=100_i64).collect::<Vec<_>>();
/// let total = context.parallel_for_reduce(0..values.len(), Sum, |acc: i64, chunk| {
///     values[chunk].iter().fold(acc, |acc, value| acc + value)
/// });
///
/// assert_eq!(total, 5050);
/// ```
#[derive(Debug)]
pub struct ExecutionContext {
    pool: ThreadPool,
    settings: RegionSettings,
}

impl ExecutionContext {
    /// Creates a context whose regions use `thread_count` threads, a static schedule and no
    /// nested parallelism.
    #[must_use]
    pub fn new(thread_count: NonZero<usize>) -> Self {
        Self {
            pool: ThreadPool::new(thread_count),
            settings: RegionSettings::new(thread_count),
        }
    }

    /// Settings that the next region will be started with.
    #[must_use]
    pub fn settings(&self) -> RegionSettings {
        self.settings
    }

    /// Team size of the next region.
    #[must_use]
    pub fn thread_count(&self) -> NonZero<usize> {
        self.settings.thread_count()
    }

    /// Sets the team size of subsequent regions, growing the worker pool if necessary.
    pub fn set_thread_count(&mut self, thread_count: NonZero<usize>) {
        self.pool.grow_to(thread_count);
        self.settings = self.settings.with_thread_count(thread_count);
    }

    /// Sets the loop schedule of subsequent parallel loops.
    pub fn set_schedule(&mut self, schedule: Schedule) {
        self.settings = self.settings.with_schedule(schedule);
    }

    /// Enables or disables nested parallelism in subsequent regions.
    pub fn set_nested(&mut self, nested: bool) {
        self.settings = self.settings.with_nested(nested);
    }

    /// Prepares helper workers so that nested regions of `inner` threads started by the first
    /// `outer` members of a region do not pay for thread creation.
    ///
    /// Does nothing while nested parallelism is disabled.
    ///
    /// # Panics
    ///
    /// Panics if `outer` is larger than the configured thread count.
    pub fn reserve_nested(&self, outer: NonZero<usize>, inner: NonZero<usize>) {
        let Some(helpers) = NonZero::new(inner.get().saturating_sub(1)) else {
            return;
        };

        if !self.settings.nested() {
            return;
        }

        self.parallel_with(outer, |_| reserve_helpers(helpers));
    }

    /// Executes `f` once on every member of a team of the configured size and waits for the
    /// whole team (implicit barrier). Results are returned in thread index order.
    pub fn parallel<F, R>(&self, f: F) -> Box<[R]>
    where
        F: Fn(TeamMember) -> R + Sync,
        R: Send + 'static,
    {
        self.parallel_with(self.settings.thread_count(), f)
    }

    /// Like [`parallel()`][Self::parallel] but with an explicit team size, which may not
    /// exceed the configured thread count.
    ///
    /// # Panics
    ///
    /// Panics if `team_size` is larger than the configured thread count.
    pub fn parallel_with<F, R>(&self, team_size: NonZero<usize>, f: F) -> Box<[R]>
    where
        F: Fn(TeamMember) -> R + Sync,
        R: Send + 'static,
    {
        assert!(
            team_size <= self.settings.thread_count(),
            "team of {team_size} threads requested from a context configured for {}",
            self.settings.thread_count()
        );

        self.pool.execute_region(self.settings, team_size, f)
    }

    /// A parallel loop over `range`, divided between the team by the configured schedule.
    ///
    /// `body` is called once per chunk of iterations.
    pub fn parallel_for<F>(&self, range: Range<usize>, body: F)
    where
        F: Fn(Range<usize>) + Sync,
    {
        let share = WorkShare::new(range, self.settings.schedule());

        self.parallel(|member| {
            for chunk in member.chunks(&share) {
                body(chunk);
            }
        });
    }

    /// A parallel loop over `range` with a reduction clause.
    ///
    /// Every thread folds its chunks into a private accumulator that starts at the
    /// operator's identity element. After the join, the partial results are combined with `op`
    /// in thread index order.
    pub fn parallel_for_reduce<T, Op, F>(&self, range: Range<usize>, op: Op, body: F) -> T
    where
        T: Send + 'static,
        Op: Reduction<T>,
        F: Fn(T, Range<usize>) -> T + Sync,
    {
        self.parallel_for_reduce_with(self.settings.thread_count(), range, op, body)
    }

    /// Like [`parallel_for_reduce()`][Self::parallel_for_reduce] but with an explicit team
    /// size, see [`parallel_with()`][Self::parallel_with].
    pub fn parallel_for_reduce_with<T, Op, F>(
        &self,
        team_size: NonZero<usize>,
        range: Range<usize>,
        op: Op,
        body: F,
    ) -> T
    where
        T: Send + 'static,
        Op: Reduction<T>,
        F: Fn(T, Range<usize>) -> T + Sync,
    {
        let share = WorkShare::new(range, self.settings.schedule());

        let partials = self.parallel_with(team_size, |member| {
            member
                .chunks(&share)
                .fold(op.identity(), |acc, chunk| body(acc, chunk))
        });

        op.combine_all(partials.into_vec())
    }
}

impl Default for ExecutionContext {
    /// A single-threaded context.
    fn default() -> Self {
        Self::new(nz!(1))
    }
}
