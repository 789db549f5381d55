/// An associative, commutative operator that combines per-thread partial results of a parallel
/// loop into one value.
///
/// Every thread starts from [`identity()`][Self::identity] so threads that receive no
/// iterations contribute nothing to the combined result.
pub trait Reduction<T>: Copy + Send + Sync {
    /// The value that leaves any other value unchanged when combined with it.
    fn identity(&self) -> T;

    /// Combines two partial results.
    fn combine(&self, left: T, right: T) -> T;

    /// Combines partial results in the order given, starting from the identity element.
    fn combine_all<I>(&self, partials: I) -> T
    where
        I: IntoIterator<Item = T>,
    {
        partials
            .into_iter()
            .fold(self.identity(), |acc, partial| self.combine(acc, partial))
    }
}

/// Addition. Integers wrap on overflow so the result does not depend on how the
/// iterations were divided between threads.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[expect(clippy::exhaustive_structs, reason = "stateless operator marker")]
pub struct Sum;

/// Minimum.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[expect(clippy::exhaustive_structs, reason = "stateless operator marker")]
pub struct Min;

/// Maximum.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[expect(clippy::exhaustive_structs, reason = "stateless operator marker")]
pub struct Max;

macro_rules! integer_reductions {
    ($($t:ty),*) => {
        $(
            impl Reduction<$t> for Sum {
                fn identity(&self) -> $t {
                    0
                }

                fn combine(&self, left: $t, right: $t) -> $t {
                    left.wrapping_add(right)
                }
            }

            impl Reduction<$t> for Min {
                fn identity(&self) -> $t {
                    <$t>::MAX
                }

                fn combine(&self, left: $t, right: $t) -> $t {
                    left.min(right)
                }
            }

            impl Reduction<$t> for Max {
                fn identity(&self) -> $t {
                    <$t>::MIN
                }

                fn combine(&self, left: $t, right: $t) -> $t {
                    left.max(right)
                }
            }
        )*
    };
}

integer_reductions!(i32, i64, u64, usize);

impl Reduction<f64> for Sum {
    fn identity(&self) -> f64 {
        0.0
    }

    fn combine(&self, left: f64, right: f64) -> f64 {
        left + right
    }
}

impl Reduction<f64> for Min {
    fn identity(&self) -> f64 {
        f64::INFINITY
    }

    fn combine(&self, left: f64, right: f64) -> f64 {
        left.min(right)
    }
}

impl Reduction<f64> for Max {
    fn identity(&self) -> f64 {
        f64::NEG_INFINITY
    }

    fn combine(&self, left: f64, right: f64) -> f64 {
        left.max(right)
    }
}
