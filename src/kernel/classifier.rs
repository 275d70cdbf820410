use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::event::Histogram;

/// How results are summarised. Held by the consumer, never by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DisplayMode {
    #[default]
    Normal,
    Median,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClassifierError {
    #[error("median of an empty tally is undefined")]
    EmptyTally,
}

/// Values shown in `Normal` mode, with their labels.
pub const CORE_BUCKETS: [(u64, &str); 3] = [(1, "①"), (2, "②"), (3, "③")];

fn is_core(value: u64) -> bool {
    CORE_BUCKETS.iter().any(|(v, _)| *v == value)
}

/// `"0"` or a digit string without leading zero, surrounding whitespace allowed.
pub fn is_valid_vote(text: &str) -> bool {
    let trimmed = text.trim();
    let mut chars = trimmed.chars();
    match chars.next() {
        Some('0') => trimmed.len() == 1,
        Some('1'..='9') => chars.all(|c| c.is_ascii_digit()),
        _ => false,
    }
}

/// Validated value of a vote message. `None` for rejected text and for
/// digit strings too large for a `u64`.
pub fn parse_vote(text: &str) -> Option<u64> {
    if !is_valid_vote(text) {
        return None;
    }
    text.trim().parse().ok()
}

/// True when the share of votes outside the core buckets reaches `threshold`.
/// An empty histogram never switches.
pub fn should_switch_mode(histogram: &Histogram, threshold: f64) -> bool {
    let (core, others) = histogram.iter().fold((0usize, 0usize), |(core, others), (value, count)| {
        if is_core(value) {
            (core + count, others)
        } else {
            (core, others + count)
        }
    });

    let total = core + others;
    if total == 0 {
        return false;
    }
    others as f64 / total as f64 >= threshold
}

/// Midpoint of two `u64` votes, exact over the whole range: the integer
/// part plus an optional half.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Median {
    pub whole: u64,
    pub half: bool,
}

impl Median {
    pub fn between(low: u64, high: u64) -> Self {
        let carry = (low % 2) + (high % 2);
        Self {
            whole: low / 2 + high / 2 + carry / 2,
            half: carry == 1,
        }
    }

    /// Lossy above 2^53.
    pub fn as_f64(&self) -> f64 {
        self.whole as f64 + if self.half { 0.5 } else { 0.0 }
    }
}

impl fmt::Display for Median {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.half {
            write!(f, "{}.5", self.whole)
        } else {
            write!(f, "{}", self.whole)
        }
    }
}

pub fn median(histogram: &Histogram) -> Result<Median, ClassifierError> {
    let total = histogram.total();
    if total == 0 {
        return Err(ClassifierError::EmptyTally);
    }

    // 0-based positions of the middle element(s) in the sorted multiset
    let lower = (total - 1) / 2;
    let upper = total / 2;
    let mut lower_value = None;
    let mut seen = 0usize;

    for (value, count) in histogram.iter() {
        let end = seen + count;
        if lower_value.is_none() && lower < end {
            lower_value = Some(value);
        }
        if upper < end {
            let low = lower_value.unwrap_or(value);
            return Ok(Median::between(low, value));
        }
        seen = end;
    }

    Err(ClassifierError::EmptyTally)
}

pub fn format_result(histogram: &Histogram, mode: DisplayMode) -> Result<String, ClassifierError> {
    match mode {
        DisplayMode::Normal => Ok(CORE_BUCKETS
            .iter()
            .filter_map(|(value, label)| match histogram.count(*value) {
                0 => None,
                count => Some(format!("{} {}", label, count)),
            })
            .collect::<Vec<_>>()
            .join(" ")),
        DisplayMode::Median => median(histogram).map(|m| m.to_string()),
    }
}
