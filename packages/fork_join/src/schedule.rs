use std::num::NonZero;
use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};

use num_integer::Integer;

use crate::TeamMember;

/// How the iterations of a parallel loop are divided between the members of a team.
#[derive(Clone, Copy, Debug, derive_more::Display, Eq, PartialEq)]
#[expect(clippy::exhaustive_enums, reason = "the three loop schedules of fork-join runtimes")]
pub enum Schedule {
    /// Iterations are divided up front.
    ///
    /// Without a chunk size, every member receives one contiguous block and the last member
    /// also takes the remainder. With a chunk size, chunks are dealt round-robin.
    #[display("static")]
    Static {
        /// Size of each round-robin chunk, or `None` for one block per member.
        chunk: Option<NonZero<usize>>,
    },

    /// Members claim chunks of a fixed size from a shared cursor as they become idle.
    #[display("dynamic")]
    Dynamic {
        /// Number of iterations claimed at a time.
        chunk: NonZero<usize>,
    },

    /// Like [`Schedule::Dynamic`] but every claim takes the remaining iteration count divided
    /// by the team size, shrinking towards `min_chunk`.
    #[display("guided")]
    Guided {
        /// Smallest chunk a member claims, except for the final one.
        min_chunk: NonZero<usize>,
    },
}

impl Default for Schedule {
    fn default() -> Self {
        Self::Static { chunk: None }
    }
}

/// Shared iteration state of one parallel loop.
///
/// Create one before entering the region, then let every member walk its share via
/// [`TeamMember::chunks()`].
#[derive(Debug)]
pub struct WorkShare {
    range: Range<usize>,
    schedule: Schedule,

    // Relative offset of the next unclaimed iteration, used by the dynamic schedules.
    next: AtomicUsize,
}

impl WorkShare {
    /// Creates the loop state for iterating over `range` according to `schedule`.
    #[must_use]
    pub fn new(range: Range<usize>, schedule: Schedule) -> Self {
        Self {
            range,
            schedule,
            next: AtomicUsize::new(0),
        }
    }

    /// The schedule the loop uses.
    #[must_use]
    pub fn schedule(&self) -> Schedule {
        self.schedule
    }

    fn len(&self) -> usize {
        self.range.len()
    }

    fn absolute(&self, relative: Range<usize>) -> Range<usize> {
        // Relative offsets never exceed the range length, so these cannot overflow.
        let start = self.range.start.saturating_add(relative.start);
        let end = self.range.start.saturating_add(relative.end);

        start..end
    }

    fn claim_fixed(&self, chunk: NonZero<usize>) -> Option<Range<usize>> {
        let len = self.len();

        // The cursor only moves forward and every member stops after its first failed
        // claim, so it cannot run far past the end.
        let start = self.next.fetch_add(chunk.get(), Ordering::Relaxed);

        (start < len).then(|| start..start.saturating_add(chunk.get()).min(len))
    }

    fn claim_guided(
        &self,
        team_size: NonZero<usize>,
        min_chunk: NonZero<usize>,
    ) -> Option<Range<usize>> {
        let len = self.len();
        let mut current = self.next.load(Ordering::Relaxed);

        loop {
            if current >= len {
                return None;
            }

            let remaining = len.saturating_sub(current);
            let (proportional, _) = remaining.div_rem(&team_size.get());
            let size = proportional.max(min_chunk.get()).min(remaining);
            let end = current.saturating_add(size);

            match self.next.compare_exchange_weak(
                current,
                end,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return Some(current..end),
                Err(actual) => current = actual,
            }
        }
    }
}

/// Iterator over the chunks of one loop assigned to one team member.
#[derive(Debug)]
pub struct Chunks<'a> {
    share: &'a WorkShare,
    member: TeamMember,
    round: usize,
}

impl<'a> Chunks<'a> {
    pub(crate) fn new(share: &'a WorkShare, member: TeamMember) -> Self {
        Self {
            share,
            member,
            round: 0,
        }
    }
}

impl Iterator for Chunks<'_> {
    type Item = Range<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        let relative = match self.share.schedule {
            Schedule::Static { chunk: None } => {
                if self.round > 0 {
                    return None;
                }

                self.round = 1;

                let block = self.member.static_chunk(self.share.len());
                (!block.is_empty()).then_some(block)
            }
            Schedule::Static { chunk: Some(chunk) } => {
                // Chunk k goes to member k % team_size.
                let chunk_index = self
                    .round
                    .checked_mul(self.member.team_size().get())
                    .and_then(|offset| offset.checked_add(self.member.thread_index()))?;

                let start = chunk_index.checked_mul(chunk.get())?;

                if start >= self.share.len() {
                    return None;
                }

                self.round = self.round.saturating_add(1);

                Some(start..start.saturating_add(chunk.get()).min(self.share.len()))
            }
            Schedule::Dynamic { chunk } => self.share.claim_fixed(chunk),
            Schedule::Guided { min_chunk } => self
                .share
                .claim_guided(self.member.team_size(), min_chunk),
        }?;

        Some(self.share.absolute(relative))
    }
}
