//! Routine pairing rules.

use similar::TextDiff;

use logix_core::{Named, Substitution};

use crate::error::{Result, SyncError};

/// A driver routine name split as `<unit>_<instance>_<suffix...>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverName<'a> {
    pub unit: &'a str,
    pub instance: &'a str,
    /// Everything after the second separator, joined tokens included.
    pub suffix: &'a [&'a str],
}

/// Tokens of a routine name; `None` when there are fewer than three.
pub fn driver_tokens(name: &str) -> Option<Vec<&str>> {
    let tokens: Vec<&str> = name.split('_').collect();
    (tokens.len() >= 3).then_some(tokens)
}

impl<'a> DriverName<'a> {
    pub(crate) fn from_tokens(tokens: &'a [&'a str]) -> Self {
        Self {
            unit: tokens[0],
            instance: tokens[1],
            suffix: &tokens[2..],
        }
    }

    /// Substitution turning this routine's identifiers into `other`'s.
    pub fn substitution_to(&self, other: &DriverName<'_>) -> Substitution {
        Substitution::new([(self.unit, other.unit), (self.instance, other.instance)])
    }
}

/// Tokens of a master driver routine, failing when the name breaks the
/// naming convention.
pub fn master_driver_tokens(name: &str) -> Result<Vec<&str>> {
    driver_tokens(name).ok_or_else(|| SyncError::DriverNaming {
        routine: name.to_string(),
    })
}

/// Similarity ratio of two names in `0.0..=1.0`: twice the characters the
/// names share in order, over their combined length.
pub fn similarity(a: &str, b: &str) -> f64 {
    f64::from(TextDiff::from_chars(a, b).ratio())
}

/// Pick the routine `name` should replace among `candidates`.
///
/// An exact name always wins. Otherwise, with `threshold` set, the most
/// similar name at or above it is chosen; ties go to the earlier candidate.
pub fn best_match<'c, T: Named>(
    name: &str,
    candidates: impl IntoIterator<Item = &'c T>,
    threshold: Option<f64>,
) -> Option<&'c T>
where
    T: 'c,
{
    let mut best: Option<(&T, f64)> = None;
    for candidate in candidates {
        if candidate.name() == name {
            return Some(candidate);
        }
        let Some(threshold) = threshold else {
            continue;
        };
        let ratio = similarity(name, candidate.name());
        if ratio >= threshold && best.map_or(true, |(_, r)| ratio > r) {
            best = Some((candidate, ratio));
        }
    }
    best.map(|(candidate, _)| candidate)
}
