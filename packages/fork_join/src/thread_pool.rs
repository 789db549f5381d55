use std::num::NonZero;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Mutex, TryLockError, mpsc};
use std::thread::{self, JoinHandle};
use std::{iter, mem};

use many_cpus::{ProcessorSet, ProcessorSetBuilder};

use crate::{RegionSettings, TeamMember};

/// Pre-warmed worker threads that execute fork-join regions, so that a timed region does not
/// pay for thread creation.
///
/// Every worker may run on any processor available to the current process. The pool may hold
/// more workers than there are processors, which is how oversubscribed thread counts are
/// measured.
///
/// # Lifecycle
///
/// Dropping the pool will wait for all threads to finish executing their tasks.
#[derive(Debug)]
pub struct ThreadPool {
    processors: ProcessorSet,

    command_txs: Vec<mpsc::Sender<Command>>,
    join_handles: Vec<JoinHandle<()>>,

    // Held for the duration of a region. Regions must not overlap because every region
    // occupies the first N workers.
    region_active: Mutex<()>,
}

impl ThreadPool {
    /// Creates a pool with `thread_count` worker threads.
    #[must_use]
    pub fn new(thread_count: NonZero<usize>) -> Self {
        let processors = ProcessorSetBuilder::new()
            .take_all()
            .expect("the current thread is executing, so at least one processor is available");

        let mut pool = Self {
            processors,
            command_txs: Vec::with_capacity(thread_count.get()),
            join_handles: Vec::with_capacity(thread_count.get()),
            region_active: Mutex::new(()),
        };

        pool.grow_to(thread_count);
        pool
    }

    /// Number of worker threads currently in the pool.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.command_txs.len()
    }

    /// Adds workers until the pool holds at least `thread_count` of them. Never removes workers.
    pub fn grow_to(&mut self, thread_count: NonZero<usize>) {
        let missing = thread_count.get().saturating_sub(self.command_txs.len());

        if missing > 0 {
            tracing::debug!(
                from = self.command_txs.len(),
                to = thread_count.get(),
                "growing fork-join worker pool"
            );
        }

        let (txs, rxs): (Vec<_>, Vec<_>) = iter::repeat_with(mpsc::channel).take(missing).unzip();

        for rx in rxs {
            self.join_handles
                .push(self.processors.spawn_thread(move |_| worker_entrypoint(&rx)));
        }

        self.command_txs.extend(txs);
    }

    /// Executes `f` once on each of the first `team_size` workers and waits for all of them
    /// to complete, returning the results in thread index order.
    ///
    /// # Panics
    ///
    /// Panics if `team_size` exceeds the pool capacity, if another region is already active
    /// on this pool, or if `f` panicked on any worker.
    pub fn execute_region<F, R>(
        &self,
        settings: RegionSettings,
        team_size: NonZero<usize>,
        f: F,
    ) -> Box<[R]>
    where
        F: Fn(TeamMember) -> R + Sync,
        R: Send + 'static,
    {
        self.run_team(settings, team_size, false, f)
    }

    /// Executes `f` as member 0 on the calling thread and as members `1..team_size` on the
    /// first `team_size - 1` workers, returning the results in thread index order.
    ///
    /// # Panics
    ///
    /// Panics if `team_size - 1` exceeds the pool capacity, if another region is already
    /// active on this pool, or if `f` panicked on any member.
    pub(crate) fn execute_region_with_caller<F, R>(
        &self,
        settings: RegionSettings,
        team_size: NonZero<usize>,
        f: F,
    ) -> Box<[R]>
    where
        F: Fn(TeamMember) -> R + Sync,
        R: Send + 'static,
    {
        self.run_team(settings, team_size, true, f)
    }

    #[cfg_attr(test, mutants::skip)] // If work does not get enqueued, deadlocks are very easy.
    fn run_team<F, R>(
        &self,
        settings: RegionSettings,
        team_size: NonZero<usize>,
        caller_joins: bool,
        f: F,
    ) -> Box<[R]>
    where
        F: Fn(TeamMember) -> R + Sync,
        R: Send + 'static,
    {
        let _region = match self.region_active.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => panic!(
                "fork-join regions on the same pool cannot overlap - use a nested region instead"
            ),
        };

        let first_dispatched = usize::from(caller_joins);
        let dispatched = team_size.get().saturating_sub(first_dispatched);

        assert!(
            dispatched <= self.command_txs.len(),
            "team of {team_size} threads does not fit in a pool of {} workers",
            self.command_txs.len()
        );

        let (result_txs, result_rxs): (Vec<_>, Vec<_>) = iter::repeat_with(oneshot::channel::<R>)
            .take(dispatched)
            .unzip();

        let f = &f;
        let mut lost_worker = false;

        for ((tx, result_tx), thread_index) in self
            .command_txs
            .iter()
            .zip(result_txs)
            .zip(first_dispatched..)
        {
            let member = TeamMember::new(thread_index, team_size, settings);

            let task: Box<dyn FnOnce() + Send + '_> = Box::new(move || {
                let result = f(member);

                result_tx.send(result).expect(
                    "receiver must still exist - this is mandatory for scoped lifetime logic",
                );
            });

            // SAFETY: We wait below for every task to either complete or unwind before
            // returning, so nothing the task borrows can go out of scope while it runs.
            let task = unsafe { erase_lifetime(task) };

            // A dead worker drops the task unexecuted, which hangs up its result channel.
            lost_worker |= tx.send(Command::Execute(task)).is_err();
        }

        // The calling thread must not unwind while dispatched tasks still borrow `f`.
        let own = caller_joins.then(|| {
            panic::catch_unwind(AssertUnwindSafe(|| {
                f(TeamMember::new(0, team_size, settings))
            }))
        });

        // Every receiver is drained before any failure is reported, so no task is still
        // running on a borrowed closure if we panic here.
        let results = result_rxs
            .into_iter()
            .map(|rx| rx.recv())
            .collect::<Vec<_>>();

        assert!(
            !lost_worker,
            "worker thread must still exist - the pool cannot operate without workers"
        );

        let own = own.map(|result| result.unwrap_or_else(|payload| panic::resume_unwind(payload)));

        own.into_iter()
            .chain(
                results.into_iter().map(|result| {
                    result.expect("worker thread failed to send result - did it panic?")
                }),
            )
            .collect()
    }
}

impl Drop for ThreadPool {
    #[cfg_attr(test, mutants::skip)] // Impractical to test that stuff stops happening.
    fn drop(&mut self) {
        if thread::panicking() {
            // If the thread is panicking, we are probably in a dirty state and shutting down
            // may make the problem worse by hiding the original panic, so just do nothing.
            return;
        }

        for tx in self.command_txs.drain(..) {
            // A worker that panicked has already hung up, nothing to shut down there.
            drop(tx.send(Command::Shutdown));
        }

        for handle in self.join_handles.drain(..) {
            drop(handle.join());
        }
    }
}

/// # Safety
///
/// The caller must not let anything borrowed by `task` go out of scope before the task
/// has completed or unwound.
unsafe fn erase_lifetime<'a>(
    task: Box<dyn FnOnce() + Send + 'a>,
) -> Box<dyn FnOnce() + Send + 'static> {
    // SAFETY: Only the lifetime changes, the layout is identical. Forwarded to the caller.
    unsafe {
        mem::transmute::<Box<dyn FnOnce() + Send + 'a>, Box<dyn FnOnce() + Send + 'static>>(task)
    }
}

enum Command {
    Execute(Box<dyn FnOnce() + Send>),
    Shutdown,
}

// Impractical to test that things do not happen when the worker function is missing.
#[cfg_attr(test, mutants::skip)]
fn worker_entrypoint(rx: &mpsc::Receiver<Command>) {
    while let Ok(Command::Execute(f)) = rx.recv() {
        f();
    }
}
