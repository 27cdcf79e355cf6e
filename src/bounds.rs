//! Per-dimension bounds and the compact textual notation used to describe them.
//!
//! A specification such as `"2(0,1),(-inf,+inf)"` reads as: two dimensions in
//! `[0, 1]`, then one unbounded dimension. Delimiters `,` `;` and space are
//! interchangeable and may repeat. `(` and `[` are equivalent.

use std::fmt;

use log::debug;

use crate::error::{EdoError, Result};

const DELIMITERS: &[char] = &[',', ';', ' '];
const OPENERS: &[char] = &['(', '['];

/// Feasible range of a single real variable.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Bound {
    /// `min <= x <= max`.
    Interval { min: f64, max: f64 },
    /// Only a lower bound: the feasible region lies above `min`.
    AboveOnly(f64),
    /// Only an upper bound: the feasible region lies below `max`.
    BelowOnly(f64),
    Unbounded,
}

/// Shared, immutable "no bounds" value.
pub const NO_BOUNDS: Bound = Bound::Unbounded;

impl Bound {
    /// `None` when the range is empty or either end is NaN.
    pub fn interval(min: f64, max: f64) -> Option<Self> {
        if min.is_nan() || max.is_nan() || min > max {
            return None;
        }
        Some(Bound::Interval { min, max })
    }

    pub fn min(&self) -> f64 {
        match *self {
            Bound::Interval { min, .. } | Bound::AboveOnly(min) => min,
            _ => f64::NEG_INFINITY,
        }
    }

    pub fn max(&self) -> f64 {
        match *self {
            Bound::Interval { max, .. } | Bound::BelowOnly(max) => max,
            _ => f64::INFINITY,
        }
    }

    pub fn is_min_bounded(&self) -> bool {
        matches!(self, Bound::Interval { .. } | Bound::AboveOnly(_))
    }

    pub fn is_max_bounded(&self) -> bool {
        matches!(self, Bound::Interval { .. } | Bound::BelowOnly(_))
    }

    /// Bounded on both sides.
    pub fn is_bounded(&self) -> bool {
        matches!(self, Bound::Interval { .. })
    }

    pub fn range(&self) -> f64 {
        self.max() - self.min()
    }

    pub fn contains(&self, x: f64) -> bool {
        x >= self.min() && x <= self.max()
    }

    /// Clamp `x` to the nearest boundary on each bounded side.
    pub fn truncate(&self, x: f64) -> f64 {
        let (lo, hi) = (self.min(), self.max());
        if x < lo {
            lo
        } else if x > hi {
            hi
        } else {
            x
        }
    }

    /// Mirror `x` back inside the feasible range. For intervals the
    /// reflection repeats until the value lands inside.
    pub fn fold_in(&self, x: f64) -> f64 {
        match *self {
            Bound::Interval { min, max } => {
                let width = max - min;
                if width <= 0.0 {
                    return min;
                }
                if self.contains(x) {
                    return x;
                }
                let wrapped = (x - min).rem_euclid(2.0 * width);
                if wrapped <= width {
                    min + wrapped
                } else {
                    max - (wrapped - width)
                }
            }
            Bound::AboveOnly(min) if x < min => min + (min - x),
            Bound::BelowOnly(max) if x > max => max - (x - max),
            _ => x,
        }
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_min_bounded() {
            write!(f, "[{},", self.min())?;
        } else {
            write!(f, "[-inf,")?;
        }
        if self.is_max_bounded() {
            write!(f, "{}]", self.max())
        } else {
            write!(f, "+inf]")
        }
    }
}

/// Ordered per-dimension bounds with run-length sharing.
///
/// Every distinct [`Bound`] is stored once in `owned`; each dimension holds an
/// index into it, and `factor[k]` counts how many consecutive dimensions share
/// `owned[k]`. `factor.iter().sum() == len()` always holds.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BoundSet {
    owned: Vec<Bound>,
    positions: Vec<usize>,
    factor: Vec<usize>,
}

impl BoundSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// `n` dimensions sharing a single bound.
    pub fn uniform(bound: Bound, n: usize) -> Self {
        let mut set = Self::empty();
        if n > 0 {
            set.push_run(bound, n);
        }
        set
    }

    /// `n` dimensions sharing [`NO_BOUNDS`].
    pub fn unbounded(n: usize) -> Self {
        Self::uniform(NO_BOUNDS, n)
    }

    /// Build from explicit per-dimension bounds; consecutive equal bounds
    /// collapse into one run.
    pub fn from_bounds<I: IntoIterator<Item = Bound>>(bounds: I) -> Self {
        let mut set = Self::empty();
        for bound in bounds {
            match set.owned.last() {
                Some(last) if *last == bound => set.extend_last(1),
                _ => set.push_run(bound, 1),
            }
        }
        set
    }

    /// Parse a bound specification. Any syntax error rejects the whole input.
    pub fn parse(spec: &str) -> Result<Self> {
        let mut set = Self::empty();
        let mut rest = spec;
        loop {
            rest = rest.trim_start_matches(DELIMITERS);
            if rest.is_empty() {
                break;
            }
            let open = rest
                .find(OPENERS)
                .ok_or_else(|| EdoError::syntax("expected '(' or '['", spec))?;
            let close_char = if rest[open..].starts_with('(') { ')' } else { ']' };
            let close = rest[open + 1..]
                .find(close_char)
                .map(|p| p + open + 1)
                .ok_or_else(|| {
                    EdoError::syntax(format!("missing closing '{close_char}'"), spec)
                })?;

            let count = parse_count(&rest[..open], spec)?;
            let bound = parse_bound_pair(&rest[open + 1..close], spec)?;
            set.push_run(bound, count);
            rest = &rest[close + 1..];
        }
        debug!(
            "parsed bounds {:?}: {} dimensions in {} runs",
            spec,
            set.len(),
            set.owned.len()
        );
        Ok(set)
    }

    /// Replace the contents with `spec`, then grow back to the previous size.
    /// On error `self` is left as it was.
    pub fn read_from(&mut self, spec: &str) -> Result<()> {
        let old_len = self.len();
        let mut parsed = Self::parse(spec)?;
        parsed.adjust_size(old_len);
        *self = parsed;
        Ok(())
    }

    /// Grow to `dim` dimensions by repeating the last bound. Never shrinks.
    pub fn adjust_size(&mut self, dim: usize) {
        let len = self.len();
        if len >= dim {
            return;
        }
        let missing = dim - len;
        if self.owned.is_empty() {
            self.push_run(NO_BOUNDS, missing);
        } else {
            self.extend_last(missing);
        }
        debug!("bounds extended from {} to {} dimensions", len, dim);
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&Bound> {
        self.positions.get(i).map(|&k| &self.owned[k])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bound> + '_ {
        self.positions.iter().map(move |&k| &self.owned[k])
    }

    /// Run lengths, one per distinct bound.
    pub fn factors(&self) -> &[usize] {
        &self.factor
    }

    /// The distinct bounds, in run order.
    pub fn distinct(&self) -> &[Bound] {
        &self.owned
    }

    /// Arena index backing dimension `i`; equal indices mean the same bound.
    pub fn instance_of(&self, i: usize) -> Option<usize> {
        self.positions.get(i).copied()
    }

    pub fn runs(&self) -> impl Iterator<Item = (&Bound, usize)> + '_ {
        self.owned.iter().zip(self.factor.iter().copied())
    }

    pub fn is_in_bounds(&self, genes: &[f64]) -> bool {
        self.check_len(genes);
        self.iter().zip(genes).all(|(b, &x)| b.contains(x))
    }

    /// Clamp every gene into its bound. Returns how many genes moved.
    pub fn truncate(&self, genes: &mut [f64]) -> usize {
        self.check_len(genes);
        let mut moved = 0;
        for (b, x) in self.iter().zip(genes.iter_mut()) {
            let y = b.truncate(*x);
            if y != *x {
                *x = y;
                moved += 1;
            }
        }
        moved
    }

    /// Mirror every gene back into its bound. Returns how many genes moved.
    pub fn fold_in(&self, genes: &mut [f64]) -> usize {
        self.check_len(genes);
        let mut moved = 0;
        for (b, x) in self.iter().zip(genes.iter_mut()) {
            let y = b.fold_in(*x);
            if y != *x {
                *x = y;
                moved += 1;
            }
        }
        moved
    }

    fn check_len(&self, genes: &[f64]) {
        assert_eq!(
            genes.len(),
            self.len(),
            "individual has {} genes but bounds cover {} dimensions",
            genes.len(),
            self.len()
        );
    }

    fn push_run(&mut self, bound: Bound, count: usize) {
        let k = self.owned.len();
        self.owned.push(bound);
        self.factor.push(count);
        self.positions.extend(std::iter::repeat(k).take(count));
    }

    fn extend_last(&mut self, count: usize) {
        let k = self.owned.len() - 1;
        self.factor[k] += count;
        self.positions.extend(std::iter::repeat(k).take(count));
    }
}

impl fmt::Display for BoundSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (bound, count)) in self.runs().enumerate() {
            if i > 0 {
                write!(f, ";")?;
            }
            if count > 1 {
                write!(f, "{count}")?;
            }
            write!(f, "{bound}")?;
        }
        Ok(())
    }
}

impl std::str::FromStr for BoundSet {
    type Err = EdoError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn parse_count(text: &str, spec: &str) -> Result<usize> {
    let text = text.trim_matches(DELIMITERS);
    if text.is_empty() {
        return Ok(1);
    }
    match text.parse::<usize>() {
        Ok(0) => Err(EdoError::syntax("repeat count must be positive", spec)),
        Ok(n) => Ok(n),
        Err(_) => Err(EdoError::syntax(
            format!("invalid repeat count {text:?}"),
            spec,
        )),
    }
}

fn parse_bound_pair(interior: &str, spec: &str) -> Result<Bound> {
    let inner = interior.trim_matches(DELIMITERS);
    let split = inner
        .find(DELIMITERS)
        .ok_or_else(|| EdoError::syntax("missing delimiter between bounds", spec))?;
    let low = &inner[..split];
    let high = inner[split..].trim_start_matches(DELIMITERS);

    let min = parse_side(low, "-inf", spec)?;
    let max = parse_side(high, "+inf", spec)?;
    match (min, max) {
        (Some(min), Some(max)) => Bound::interval(min, max)
            .ok_or_else(|| EdoError::syntax(format!("empty interval [{min},{max}]"), spec)),
        (None, None) => Ok(Bound::Unbounded),
        (None, Some(max)) => Ok(Bound::BelowOnly(max)),
        (Some(min), None) => Ok(Bound::AboveOnly(min)),
    }
}

/// `None` for the unbounded keyword, the finite value otherwise.
fn parse_side(text: &str, unbounded: &str, spec: &str) -> Result<Option<f64>> {
    if text == unbounded {
        return Ok(None);
    }
    match text.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(EdoError::syntax(format!("invalid bound {text:?}"), spec)),
    }
}
