use std::num::NonZero;
use std::ops::Range;
use std::cell::RefCell;

use new_zealand::nz;
use num_integer::Integer;

use crate::{Chunks, Reduction, Schedule, ThreadPool, WorkShare};

/// Runtime configuration read by every parallel region.
///
/// The owning [`ExecutionContext`][crate::ExecutionContext] changes these between regions;
/// a region only ever sees an immutable copy.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RegionSettings {
    thread_count: NonZero<usize>,
    schedule: Schedule,
    nested: bool,
}

impl RegionSettings {
    /// Settings for a team of `thread_count` threads with a static schedule and nested
    /// parallelism disabled.
    #[must_use]
    pub fn new(thread_count: NonZero<usize>) -> Self {
        Self {
            thread_count,
            schedule: Schedule::default(),
            nested: false,
        }
    }

    /// The same settings with a different loop schedule.
    #[must_use]
    pub fn with_schedule(self, schedule: Schedule) -> Self {
        Self { schedule, ..self }
    }

    /// The same settings with nested parallelism enabled or disabled.
    #[must_use]
    pub fn with_nested(self, nested: bool) -> Self {
        Self { nested, ..self }
    }

    /// The same settings with a different team size.
    #[must_use]
    pub fn with_thread_count(self, thread_count: NonZero<usize>) -> Self {
        Self {
            thread_count,
            ..self
        }
    }

    /// Team size for regions that do not ask for an explicit one.
    #[must_use]
    pub fn thread_count(&self) -> NonZero<usize> {
        self.thread_count
    }

    /// Schedule of parallel loops.
    #[must_use]
    pub fn schedule(&self) -> Schedule {
        self.schedule
    }

    /// Whether a region started from inside another region gets its own team.
    #[must_use]
    pub fn nested(&self) -> bool {
        self.nested
    }
}

/// Identity of one thread inside a fork-join region.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TeamMember {
    thread_index: usize,
    team_size: NonZero<usize>,
    settings: RegionSettings,
}

impl TeamMember {
    pub(crate) fn new(
        thread_index: usize,
        team_size: NonZero<usize>,
        settings: RegionSettings,
    ) -> Self {
        Self {
            thread_index,
            team_size,
            settings,
        }
    }

    /// Index of this thread within its team, starting from 0.
    #[must_use]
    pub fn thread_index(&self) -> usize {
        self.thread_index
    }

    /// Number of threads in the team.
    #[must_use]
    pub fn team_size(&self) -> NonZero<usize> {
        self.team_size
    }

    /// Settings the region was started with.
    #[must_use]
    pub fn settings(&self) -> RegionSettings {
        self.settings
    }

    /// Whether this is the last member of the team.
    #[must_use]
    pub fn is_last(&self) -> bool {
        self.thread_index.saturating_add(1) == self.team_size.get()
    }

    /// The contiguous share of `0..len` that belongs to this member.
    ///
    /// Every member receives `len / team_size` items, the last one also receives the remainder.
    #[must_use]
    pub fn static_chunk(&self, len: usize) -> Range<usize> {
        let (chunk, _) = len.div_rem(&self.team_size.get());

        let start = chunk
            .checked_mul(self.thread_index)
            .expect("start of a chunk cannot exceed the length being chunked");

        let end = if self.is_last() {
            len
        } else {
            start.saturating_add(chunk)
        };

        start..end
    }

    /// The chunks of a parallel loop that this member is to execute.
    pub fn chunks<'a>(&self, share: &'a WorkShare) -> Chunks<'a> {
        Chunks::new(share, *self)
    }

    /// Starts a region from inside this one, executing `f` once per inner team member.
    ///
    /// The inner team has `team_size` threads when nested parallelism is enabled, otherwise
    /// it consists only of the calling thread. The calling thread always acts as inner
    /// member 0, the other members run on helper workers that belong to the calling thread
    /// and are kept for reuse by later nested regions. Results are returned in inner thread
    /// index order.
    ///
    /// A nested region started from inside another nested region on the same thread runs
    /// with a team of one.
    pub fn nested_region<F, R>(&self, team_size: NonZero<usize>, f: F) -> Box<[R]>
    where
        F: Fn(Self) -> R + Sync,
        R: Send + 'static,
    {
        let team_size = if self.settings.nested() {
            team_size
        } else {
            nz!(1)
        };

        let Some(helpers) = NonZero::new(team_size.get().saturating_sub(1)) else {
            return vec![f(Self::new(0, team_size, self.settings.with_thread_count(team_size)))]
                .into_boxed_slice();
        };

        with_helper_pool(helpers, |pool| match pool {
            Some(pool) => pool.execute_region_with_caller(
                self.settings.with_thread_count(team_size),
                team_size,
                f,
            ),
            None => {
                let settings = self.settings.with_thread_count(nz!(1));
                vec![f(Self::new(0, nz!(1), settings))].into_boxed_slice()
            }
        })
    }

    /// A reducing parallel loop over `range` executed by a nested team of `team_size` threads.
    ///
    /// See [`nested_region()`][Self::nested_region] for how the inner team is formed and
    /// [`ExecutionContext::parallel_for_reduce()`][crate::ExecutionContext::parallel_for_reduce]
    /// for the reduction semantics.
    pub fn nested_for_reduce<T, Op, F>(
        &self,
        range: Range<usize>,
        team_size: NonZero<usize>,
        op: Op,
        body: F,
    ) -> T
    where
        T: Send + 'static,
        Op: Reduction<T>,
        F: Fn(T, Range<usize>) -> T + Sync,
    {
        let share = WorkShare::new(range, self.settings.schedule());

        let partials = self.nested_region(team_size, |member| {
            member
                .chunks(&share)
                .fold(op.identity(), |acc, chunk| body(acc, chunk))
        });

        op.combine_all(partials.into_vec())
    }
}

thread_local! {
    // Helper workers for nested regions started by this thread.
    static HELPER_POOL: RefCell<Option<ThreadPool>> = const { RefCell::new(None) };
}

/// Ensures the calling thread has at least `helpers` helper workers for nested regions.
pub(crate) fn reserve_helpers(helpers: NonZero<usize>) {
    with_helper_pool(helpers, |_| ());
}

/// Calls `f` with the calling thread's helper pool grown to at least `helpers` workers, or
/// with `None` if the pool is already executing a region started by this thread.
fn with_helper_pool<T>(helpers: NonZero<usize>, f: impl FnOnce(Option<&ThreadPool>) -> T) -> T {
    HELPER_POOL.with(|cell| match cell.try_borrow_mut() {
        Ok(mut slot) => {
            let pool = slot.get_or_insert_with(|| ThreadPool::new(helpers));
            pool.grow_to(helpers);

            f(Some(&*pool))
        }
        Err(_) => f(None),
    })
}

#[cfg(not(miri))] // ProcessorSet is not supported under Miri.
#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::thread;

    use super::*;
    use crate::{Max, Min, Sum};

    fn member(thread_index: usize, team_size: NonZero<usize>) -> TeamMember {
        TeamMember::new(thread_index, team_size, RegionSettings::new(team_size))
    }

    #[test]
    fn static_chunks_partition_range() {
        let team_size = nz!(4);

        let chunks = (0..4)
            .map(|index| member(index, team_size).static_chunk(10))
            .collect::<Vec<_>>();

        assert_eq!(chunks, vec![0..2, 2..4, 4..6, 6..10]);
    }

    #[test]
    fn static_chunk_of_empty_range_is_empty() {
        for index in 0..3 {
            assert!(member(index, nz!(3)).static_chunk(0).is_empty());
        }
    }

    #[test]
    fn more_members_than_items_leaves_everything_to_last() {
        let chunks = (0..5)
            .map(|index| member(index, nz!(5)).static_chunk(3))
            .collect::<Vec<_>>();

        assert_eq!(chunks, vec![0..0, 0..0, 0..0, 0..0, 0..3]);
    }

    #[test]
    fn nested_region_without_nesting_is_single_threaded() {
        let outer = member(0, nz!(2));

        let sizes = outer.nested_region(nz!(4), |inner| inner.team_size().get());

        assert_eq!(&*sizes, &[1]);
    }

    #[test]
    fn nested_region_with_nesting_spawns_inner_team() {
        let settings = RegionSettings::new(nz!(2)).with_nested(true);
        let outer = TeamMember::new(1, nz!(2), settings);
        let thread_ids = Mutex::new(HashSet::new());

        let indexes = outer.nested_region(nz!(3), |inner| {
            thread_ids.lock().unwrap().insert(thread::current().id());
            inner.thread_index()
        });

        assert_eq!(&*indexes, &[0, 1, 2]);
        assert_eq!(thread_ids.lock().unwrap().len(), 3);
    }

    #[test]
    fn repeated_nested_regions_reuse_helper_threads() {
        let settings = RegionSettings::new(nz!(2)).with_nested(true);
        let outer = TeamMember::new(0, nz!(2), settings);
        let thread_ids = Mutex::new(HashSet::new());

        for _ in 0..200 {
            outer.nested_region(nz!(4), |_| {
                thread_ids.lock().unwrap().insert(thread::current().id());
            });
        }

        // The calling thread plus three helpers, no matter how many regions ran.
        assert_eq!(thread_ids.lock().unwrap().len(), 4);
    }

    #[test]
    fn smaller_nested_team_after_larger_one() {
        let settings = RegionSettings::new(nz!(2)).with_nested(true);
        let outer = TeamMember::new(0, nz!(2), settings);

        assert_eq!(outer.nested_region(nz!(5), |inner| inner.thread_index()).len(), 5);

        let sizes = outer.nested_region(nz!(2), |inner| inner.team_size().get());
        assert_eq!(&*sizes, &[2, 2]);
    }

    #[test]
    fn doubly_nested_region_runs_on_calling_thread() {
        let settings = RegionSettings::new(nz!(2)).with_nested(true);
        let outer = TeamMember::new(0, nz!(2), settings);

        let inner_sizes = outer.nested_region(nz!(2), |inner| {
            if inner.thread_index() == 0 {
                // Same thread as the enclosing nested region, whose helpers are busy.
                inner.nested_region(nz!(3), |innermost| innermost.team_size().get()).len()
            } else {
                0
            }
        });

        assert_eq!(&*inner_sizes, &[1, 0]);
    }

    #[test]
    fn nested_reductions_agree_with_and_without_nesting() {
        let values = (0..1000_i64).map(|v| (v * 7919) % 1013 - 500).collect::<Vec<_>>();

        for nested in [false, true] {
            let settings = RegionSettings::new(nz!(2)).with_nested(nested);
            let outer = TeamMember::new(0, nz!(2), settings);

            let sum = outer.nested_for_reduce(0..values.len(), nz!(3), Sum, |acc: i64, chunk| {
                values[chunk].iter().fold(acc, |acc, v| acc.wrapping_add(*v))
            });
            let min = outer.nested_for_reduce(0..values.len(), nz!(3), Min, |acc: i64, chunk| {
                values[chunk].iter().copied().fold(acc, i64::min)
            });
            let max = outer.nested_for_reduce(0..values.len(), nz!(3), Max, |acc: i64, chunk| {
                values[chunk].iter().copied().fold(acc, i64::max)
            });

            assert_eq!(sum, values.iter().sum::<i64>());
            assert_eq!(Some(min), values.iter().copied().min());
            assert_eq!(Some(max), values.iter().copied().max());
        }
    }
}
