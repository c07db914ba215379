//! Biannual period enumeration.
//!
//! Conferences happen twice a year, in April and October. [`enumerate`]
//! turns an arbitrary `(year, month)` range into the ordered list of
//! [`Period`]s that fall inside it.
//!
//! # Snapping
//!
//! - `start` moves **forward** to the next half-year month (a start in
//!   November becomes April of the following year).
//! - `end` moves **backward** to the previous half-year month (an end in
//!   February becomes October of the previous year).
//!
//! If the snapped start lies after the snapped end the result is empty.
//!
//! ```rust
//! use speakercast_core::period::{enumerate, Half, Period};
//!
//! let periods = enumerate((2023, 5), (2024, 4));
//! assert_eq!(periods, vec![
//!     Period::new(2023, Half::Second),
//!     Period::new(2024, Half::First),
//! ]);
//! ```

use std::fmt;

use serde::Serialize;

/// Which of the two yearly conferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Half {
    /// April.
    First,
    /// October.
    Second,
}

impl Half {
    /// The calendar month this half-year conference is held in.
    pub fn month(self) -> u32 {
        match self {
            Half::First => 4,
            Half::Second => 10,
        }
    }
}

/// One conference: a year plus a half-year index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Period {
    pub year: i32,
    pub half: Half,
}

impl Period {
    pub fn new(year: i32, half: Half) -> Self {
        Self { year, half }
    }

    pub fn month(&self) -> u32 {
        self.half.month()
    }

    fn next(self) -> Self {
        match self.half {
            Half::First => Period::new(self.year, Half::Second),
            Half::Second => Period::new(self.year + 1, Half::First),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{:02}", self.year, self.month())
    }
}

fn snap_forward((year, month): (i32, u32)) -> Period {
    if month <= 4 {
        Period::new(year, Half::First)
    } else if month <= 10 {
        Period::new(year, Half::Second)
    } else {
        Period::new(year + 1, Half::First)
    }
}

fn snap_backward((year, month): (i32, u32)) -> Period {
    if month < 4 {
        Period::new(year - 1, Half::Second)
    } else if month < 10 {
        Period::new(year, Half::First)
    } else {
        Period::new(year, Half::Second)
    }
}

/// List every period between `start` and `end` (both `(year, month)`),
/// inclusive of the snapped endpoints, in chronological order.
pub fn enumerate(start: (i32, u32), end: (i32, u32)) -> Vec<Period> {
    let last = snap_backward(end);
    let mut current = snap_forward(start);
    let mut periods = Vec::new();
    while current <= last {
        periods.push(current);
        current = current.next();
    }
    periods
}
