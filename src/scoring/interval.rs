use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::cmp::Ordering;
use std::fmt;

/// One end of an interval: a finite decimal or an unbounded side.
///
/// Variant order gives the total order `NegInfinity < Finite(_) < PosInfinity`,
/// so bounds compare without sentinel values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Bound {
    NegInfinity,
    Finite(Decimal),
    PosInfinity,
}

impl Bound {
    pub fn finite(&self) -> Option<Decimal> {
        match self {
            Bound::Finite(value) => Some(*value),
            _ => None,
        }
    }
}

impl From<Decimal> for Bound {
    fn from(value: Decimal) -> Self {
        Bound::Finite(value)
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::NegInfinity => write!(f, "-∞"),
            Bound::PosInfinity => write!(f, "∞"),
            Bound::Finite(value) => {
                let value = value.normalize();
                // p-value thresholds read better as 5e-8 than 0.00000005
                if !value.is_zero() && value.abs() < dec!(0.001) {
                    write!(f, "{:e}", value)
                } else {
                    write!(f, "{}", value)
                }
            }
        }
    }
}

/// Value domain of an interval family.
///
/// Cohort sizes are whole numbers, so `[1000, 2499]` followed by
/// `[2500, 4999]` leaves no gap. Real-valued families must share endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    Real,
    Integer,
}

/// A numeric range with independently open or closed ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    start: Bound,
    end: Bound,
    start_inclusive: bool,
    end_inclusive: bool,
    variable: &'static str,
}

impl Interval {
    pub fn new(
        start: Bound,
        end: Bound,
        start_inclusive: bool,
        end_inclusive: bool,
        variable: &'static str,
    ) -> Self {
        Self {
            start,
            end,
            start_inclusive,
            end_inclusive,
            variable,
        }
    }

    /// `[start, end]` over finite values.
    pub fn closed(start: Decimal, end: Decimal, variable: &'static str) -> Self {
        Self::new(start.into(), end.into(), true, true, variable)
    }

    /// `[start, ∞)`
    pub fn at_least(start: Decimal, variable: &'static str) -> Self {
        Self::new(start.into(), Bound::PosInfinity, true, false, variable)
    }

    /// `(-∞, end)`
    pub fn below(end: Decimal, variable: &'static str) -> Self {
        Self::new(Bound::NegInfinity, end.into(), false, false, variable)
    }

    /// `(-∞, end]`
    pub fn at_most(end: Decimal, variable: &'static str) -> Self {
        Self::new(Bound::NegInfinity, end.into(), false, true, variable)
    }

    /// `[start, end)`
    pub fn half_open(start: Decimal, end: Decimal, variable: &'static str) -> Self {
        Self::new(start.into(), end.into(), true, false, variable)
    }

    pub fn start(&self) -> Bound {
        self.start
    }

    pub fn end(&self) -> Bound {
        self.end
    }

    pub fn start_inclusive(&self) -> bool {
        self.start_inclusive
    }

    pub fn end_inclusive(&self) -> bool {
        self.end_inclusive
    }

    pub fn variable(&self) -> &'static str {
        self.variable
    }

    /// Whether a finite value falls inside the interval.
    pub fn contains(&self, value: Decimal) -> bool {
        let value = Bound::Finite(value);

        let lower_ok = if self.start_inclusive {
            self.start <= value
        } else {
            self.start < value
        };

        let upper_ok = if self.end_inclusive {
            value <= self.end
        } else {
            value < self.end
        };

        lower_ok && upper_ok
    }

    /// Whether the interval holds at least one value.
    pub fn is_empty(&self) -> bool {
        match self.start.cmp(&self.end) {
            Ordering::Less => false,
            Ordering::Equal => !(self.start_inclusive && self.end_inclusive),
            Ordering::Greater => true,
        }
    }

    /// Bracket notation for logs, e.g. `[0.1, 0.3)`.
    pub fn notation(&self) -> String {
        let open = if self.start_inclusive { "[" } else { "(" };
        let close = if self.end_inclusive { "]" } else { ")" };
        format!("{}{}, {}{}", open, self.start, self.end, close)
    }
}

impl fmt::Display for Interval {
    /// Legend form used in the framework table, e.g. `50 ≤ size ≤ 99`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let start_op = if self.start_inclusive { "≤" } else { "<" };
        let end_op = if self.end_inclusive { "≤" } else { "<" };
        write!(
            f,
            "{} {} {} {} {}",
            self.start, start_op, self.variable, end_op, self.end
        )
    }
}

/// Check that `intervals` tile the whole line without gaps or overlaps.
///
/// Returns a description of the first problem found. The order of the slice
/// does not matter; intervals are compared sorted by their start.
pub fn check_partition(intervals: &[Interval], domain: Domain) -> Result<(), String> {
    if intervals.is_empty() {
        return Err("no intervals".to_string());
    }

    if let Some(empty) = intervals.iter().find(|i| i.is_empty()) {
        return Err(format!("interval {} is empty", empty.notation()));
    }

    let mut sorted: Vec<&Interval> = intervals.iter().collect();
    sorted.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            // a closed start sorts before an open one at the same point
            .then_with(|| b.start_inclusive.cmp(&a.start_inclusive))
    });

    let first = sorted[0];
    if first.start != Bound::NegInfinity {
        return Err(format!("{} does not start at -∞", first.notation()));
    }
    let last = sorted[sorted.len() - 1];
    if last.end != Bound::PosInfinity {
        return Err(format!("{} does not end at ∞", last.notation()));
    }

    for pair in sorted.windows(2) {
        let (prev, next) = (pair[0], pair[1]);
        match prev.end.cmp(&next.start) {
            Ordering::Greater => {
                return Err(format!(
                    "{} overlaps {}",
                    prev.notation(),
                    next.notation()
                ));
            }
            Ordering::Equal => match (prev.end_inclusive, next.start_inclusive) {
                (true, true) => {
                    return Err(format!(
                        "{} and {} both contain {}",
                        prev.notation(),
                        next.notation(),
                        prev.end
                    ));
                }
                (false, false) => {
                    return Err(format!(
                        "{} and {} both exclude {}",
                        prev.notation(),
                        next.notation(),
                        prev.end
                    ));
                }
                _ => {}
            },
            Ordering::Less => {
                if !integer_adjacent(prev, next, domain) {
                    return Err(format!(
                        "gap between {} and {}",
                        prev.notation(),
                        next.notation()
                    ));
                }
            }
        }
    }

    Ok(())
}

/// `[.., n]` followed by `[n + 1, ..]` over whole numbers.
fn integer_adjacent(prev: &Interval, next: &Interval, domain: Domain) -> bool {
    if domain != Domain::Integer || !prev.end_inclusive || !next.start_inclusive {
        return false;
    }
    match (prev.end.finite(), next.start.finite()) {
        (Some(end), Some(start)) => end.fract().is_zero() && start == end + Decimal::ONE,
        _ => false,
    }
}
