use std::fmt;
use std::str::FromStr;

use crate::{TimeUnit, UnknownKernel};

/// The benchmark sweeps this tool can run, one per kernel family.
#[derive(Clone, Copy, Debug, derive_more::Display, Eq, Hash, PartialEq)]
#[expect(clippy::exhaustive_enums, reason = "selectors 1-8 are a fixed command line contract")]
pub enum Kernel {
    /// Vector minimum search.
    #[display("min_find")]
    MinFind,

    /// Dot product of two integer vectors.
    #[display("dot_product")]
    DotProduct,

    /// Midpoint-rule integration.
    #[display("integration")]
    Integration,

    /// Maximum of row minima of a dense matrix.
    #[display("minimax")]
    Minimax,

    /// Maximum of row minima of a lower-triangular matrix under different loop schedules.
    #[display("minimax_triangular")]
    MinimaxTriangular,

    /// Array sum with four synchronization strategies.
    #[display("array_sum")]
    ArraySum,

    /// Maximum of row minima with nested parallel regions.
    #[display("minimax_nested")]
    MinimaxNested,

    /// Loop schedules on iterations of uneven cost.
    #[display("cycle_modes")]
    CycleModes,
}

/// A column of the record stream.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[expect(clippy::exhaustive_enums, reason = "record layouts are a fixed output contract")]
pub enum Column {
    /// Thread count the measurement ran with.
    NumThreads,

    /// Variant tag.
    Method,

    /// Input length, under the given column name.
    Length(&'static str),

    /// Number of matrix rows.
    Rows,

    /// Number of matrix columns.
    Cols,

    /// Elapsed wall-clock time in the kernel's time unit.
    Elapsed,
}

impl Column {
    /// Name of the column in the header line.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::NumThreads => "num_threads",
            Self::Method => "method",
            Self::Length(name) => name,
            Self::Rows => "n_rows",
            Self::Cols => "n_cols",
            Self::Elapsed => "elapsed_time",
        }
    }
}

/// The input size of one size configuration.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[expect(clippy::exhaustive_enums, reason = "inputs are either vectors or matrices")]
pub enum Size {
    /// Length of a vector, a rectangle count or an iteration count.
    Length(usize),

    /// Dimensions of a matrix.
    Shape {
        /// Number of rows.
        rows: usize,

        /// Number of columns.
        cols: usize,
    },
}

impl Size {
    /// The length, or the element count of a shape.
    #[must_use]
    pub fn len(self) -> usize {
        match self {
            Self::Length(len) => len,
            Self::Shape { rows, cols } => rows.saturating_mul(cols),
        }
    }

    /// Matrix dimensions, with a length treated as a single row.
    #[must_use]
    pub fn shape(self) -> (usize, usize) {
        match self {
            Self::Length(len) => (1, len),
            Self::Shape { rows, cols } => (rows, cols),
        }
    }

    /// Whether the size describes no elements at all.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Length(len) => write!(f, "{len}"),
            Self::Shape { rows, cols } => write!(f, "{rows}x{cols}"),
        }
    }
}

const fn square(side: usize) -> Size {
    Size::Shape {
        rows: side,
        cols: side,
    }
}

impl Kernel {
    /// Every kernel, ordered by selector.
    pub const ALL: [Self; 8] = [
        Self::MinFind,
        Self::DotProduct,
        Self::Integration,
        Self::Minimax,
        Self::MinimaxTriangular,
        Self::ArraySum,
        Self::MinimaxNested,
        Self::CycleModes,
    ];

    /// The single-character selector that picks this kernel on the command line.
    #[must_use]
    pub fn selector(self) -> char {
        match self {
            Self::MinFind => '1',
            Self::DotProduct => '2',
            Self::Integration => '3',
            Self::Minimax => '4',
            Self::MinimaxTriangular => '5',
            Self::ArraySum => '6',
            Self::MinimaxNested => '7',
            Self::CycleModes => '8',
        }
    }

    /// The kernel picked by a single-character selector.
    #[must_use]
    pub fn from_selector(selector: char) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kernel| kernel.selector() == selector)
    }

    /// Columns of the record stream, in order.
    #[must_use]
    pub fn columns(self) -> &'static [Column] {
        use Column::{Cols, Elapsed, Length, Method, NumThreads, Rows};

        match self {
            Self::MinFind => &[Method, Length("array_size"), Elapsed],
            Self::DotProduct => &[NumThreads, Method, Length("array_size"), Elapsed],
            Self::Integration => &[NumThreads, Method, Length("num_rects"), Elapsed],
            Self::Minimax | Self::MinimaxNested => &[NumThreads, Method, Rows, Cols, Elapsed],
            Self::MinimaxTriangular => &[Method, NumThreads, Elapsed],
            Self::ArraySum => &[Method, NumThreads, Length("length"), Elapsed],
            Self::CycleModes => &[NumThreads, Method, Length("num_iterations"), Elapsed],
        }
    }

    /// Whether records carry the thread count. Without it, rows measured at different thread
    /// counts could not be told apart.
    #[must_use]
    pub fn has_thread_column(self) -> bool {
        self.columns().contains(&Column::NumThreads)
    }

    /// The header line of the record stream, without line terminator.
    #[must_use]
    pub fn header(self) -> String {
        self.columns()
            .iter()
            .map(|column| column.name())
            .collect::<Vec<_>>()
            .join(";")
    }

    /// Unit of the `elapsed_time` column.
    #[must_use]
    pub fn time_unit(self) -> TimeUnit {
        match self {
            Self::DotProduct => TimeUnit::Microseconds,
            _ => TimeUnit::Milliseconds,
        }
    }

    /// Number of decimal places of the `elapsed_time` column.
    #[must_use]
    pub fn precision(self) -> usize {
        match self {
            Self::MinimaxTriangular | Self::ArraySum => 15,
            _ => 20,
        }
    }

    /// Input sizes swept by default.
    #[must_use]
    pub fn default_sizes(self) -> Vec<Size> {
        match self {
            Self::MinFind => vec![
                Size::Length(10_000),
                Size::Length(10_000_000),
                Size::Length(100_000_000),
            ],
            Self::DotProduct | Self::Integration | Self::ArraySum | Self::CycleModes => vec![
                Size::Length(100),
                Size::Length(10_000),
                Size::Length(1_000_000),
            ],
            Self::Minimax | Self::MinimaxNested => vec![square(10), square(100), square(1000)],
            Self::MinimaxTriangular => vec![square(100)],
        }
    }
}

impl FromStr for Kernel {
    type Err = UnknownKernel;

    /// Accepts either the single-character selector or the kernel name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();

        let by_selector = match (chars.next(), chars.next()) {
            (Some(selector), None) => Self::from_selector(selector),
            _ => None,
        };

        by_selector
            .or_else(|| {
                Self::ALL
                    .into_iter()
                    .find(|kernel| kernel.to_string() == s)
            })
            .ok_or_else(|| UnknownKernel {
                value: s.to_string(),
            })
    }
}
