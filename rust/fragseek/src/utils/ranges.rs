use crate::errors::{
    FragSeekError,
    Result,
};
use serde::Serialize;

/// Closed interval `[start, end]`.
///
/// Construction checks the ordering, so every instance satisfies
/// `start <= end` (NaN bounds are rejected as well).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TupleRange<T: Copy + PartialOrd>(T, T);

impl<T: Copy + PartialOrd + std::fmt::Debug> TupleRange<T> {
    pub fn try_new(left: T, right: T) -> Result<Self> {
        if left <= right {
            Ok(Self(left, right))
        } else {
            Err(FragSeekError::config(
                "range",
                format!("expected an ordered range, got ({left:?}, {right:?})"),
            ))
        }
    }

    pub fn contains(&self, x: T) -> bool {
        self.0 <= x && x <= self.1
    }

    pub fn start(&self) -> T {
        self.0
    }

    pub fn end(&self) -> T {
        self.1
    }

    pub fn as_tuple(&self) -> (T, T) {
        (self.0, self.1)
    }
}

/// Half-open range `[lo, hi)` of positions in a sorted array.
///
/// `lo == hi` is the empty range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PeptideRange {
    pub lo: usize,
    pub hi: usize,
}

impl PeptideRange {
    pub fn new(lo: usize, hi: usize) -> Self {
        Self { lo, hi: hi.max(lo) }
    }

    pub fn len(&self) -> usize {
        self.hi - self.lo
    }

    pub fn is_empty(&self) -> bool {
        self.lo == self.hi
    }

    pub fn contains(&self, idx: usize) -> bool {
        self.lo <= idx && idx < self.hi
    }

    pub fn as_range(&self) -> std::ops::Range<usize> {
        self.lo..self.hi
    }

    /// Merges overlapping or touching ranges into disjoint ones, sorted by
    /// `lo`. Empty ranges are dropped.
    ///
    /// ```
    /// use fragseek::utils::PeptideRange;
    ///
    /// let merged = PeptideRange::merge_all(vec![
    ///     PeptideRange::new(4, 9),
    ///     PeptideRange::new(0, 5),
    ///     PeptideRange::new(12, 12),
    ///     PeptideRange::new(10, 11),
    /// ]);
    /// assert_eq!(merged, vec![PeptideRange::new(0, 9), PeptideRange::new(10, 11)]);
    /// ```
    pub fn merge_all(ranges: impl IntoIterator<Item = PeptideRange>) -> Vec<PeptideRange> {
        let mut ranges: Vec<PeptideRange> = ranges.into_iter().filter(|r| !r.is_empty()).collect();
        ranges.sort_unstable_by_key(|r| (r.lo, r.hi));
        let mut out: Vec<PeptideRange> = Vec::with_capacity(ranges.len());
        for range in ranges {
            match out.last_mut() {
                Some(last) if range.lo <= last.hi => last.hi = last.hi.max(range.hi),
                _ => out.push(range),
            }
        }
        out
    }
}

/// Positions of the elements of a slice sorted by `key` whose key lies in
/// the closed interval `[low, high]`.
///
/// Both bounds are inclusive. An inverted or NaN interval yields an empty
/// range.
///
/// ```
/// use fragseek::utils::ranges::search_range_by_key;
///
/// let masses = [1.0, 2.0, 2.0, 3.0, 5.0];
/// assert_eq!(search_range_by_key(&masses, 2.0, 3.0, |x| *x), 1..4);
/// assert_eq!(search_range_by_key(&masses, 3.5, 4.5, |x| *x), 4..4);
/// assert!(search_range_by_key(&masses, 3.0, 2.0, |x| *x).is_empty());
/// ```
pub fn search_range_by_key<T>(
    slice: &[T],
    low: f64,
    high: f64,
    key: impl Fn(&T) -> f64,
) -> std::ops::Range<usize> {
    if low.is_nan() || high.is_nan() || low > high {
        return 0..0;
    }
    let lo = slice.partition_point(|x| key(x) < low);
    let hi = lo + slice[lo..].partition_point(|x| key(x) <= high);
    lo..hi
}
