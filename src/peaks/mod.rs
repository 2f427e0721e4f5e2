// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Combine peak positions measured independently in several spectral windows
//! into a single consensus position, rejecting (at most) one outlier.

mod error;
#[cfg(test)]
mod tests;

pub use error::CombinePeaksError;

use std::fmt;

use log::{debug, trace};
use strum_macros::{Display, EnumIter, EnumString};

use crate::{constants::DEFAULT_OUTLIER_THRESHOLD, math::median_in_place};

/// A position in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakPosition {
    pub x: f64,
    pub y: f64,
}

impl PeakPosition {
    pub fn new(x: f64, y: f64) -> PeakPosition {
        PeakPosition { x, y }
    }

    pub fn distance(&self, other: &PeakPosition) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl fmt::Display for PeakPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// What to do with the position furthest from the centroid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutlierPolicy {
    /// Reject the furthest position if its distance from the centroid is more
    /// than this many times the median pairwise distance between the other
    /// positions.
    Threshold(f64),

    /// Always reject the furthest position.
    Furthest,

    /// Never reject anything; the result is the centroid.
    Keep,
}

impl Default for OutlierPolicy {
    fn default() -> Self {
        OutlierPolicy::Threshold(DEFAULT_OUTLIER_THRESHOLD)
    }
}

impl OutlierPolicy {
    pub fn kind(&self) -> OutlierPolicyKind {
        match self {
            OutlierPolicy::Threshold(_) => OutlierPolicyKind::Threshold,
            OutlierPolicy::Furthest => OutlierPolicyKind::Furthest,
            OutlierPolicy::Keep => OutlierPolicyKind::Keep,
        }
    }
}

/// The name of an [`OutlierPolicy`], as given by users.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumIter, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum OutlierPolicyKind {
    #[default]
    Threshold,
    Furthest,
    Keep,
}

impl OutlierPolicyKind {
    /// The policy of this kind. `threshold` is only used by
    /// [`OutlierPolicyKind::Threshold`].
    pub fn with_threshold(self, threshold: f64) -> OutlierPolicy {
        match self {
            OutlierPolicyKind::Threshold => OutlierPolicy::Threshold(threshold),
            OutlierPolicyKind::Furthest => OutlierPolicy::Furthest,
            OutlierPolicyKind::Keep => OutlierPolicy::Keep,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CombinedPeak {
    pub position: PeakPosition,

    /// The index of the rejected position, if one was rejected.
    pub rejected: Option<usize>,
}

fn mean_position<'a, I: Iterator<Item = &'a PeakPosition>>(positions: I) -> PeakPosition {
    let (n, sum_x, sum_y) = positions.fold((0, 0.0, 0.0), |(n, sx, sy), p| {
        (n + 1, sx + p.x, sy + p.y)
    });
    PeakPosition {
        x: sum_x / n as f64,
        y: sum_y / n as f64,
    }
}

/// Combine `positions` into one.
///
/// The position furthest from the centroid is the outlier candidate; if more
/// than one is equally far, the last one is the candidate. Whether it is
/// rejected depends on `policy`. The result is the mean of the remaining
/// positions.
pub fn combine(
    positions: &[PeakPosition],
    policy: OutlierPolicy,
) -> Result<CombinedPeak, CombinePeaksError> {
    if positions.len() < 3 {
        return Err(CombinePeaksError::InsufficientSamples {
            found: positions.len(),
        });
    }
    if let Some(index) = positions.iter().position(|p| !p.is_finite()) {
        return Err(CombinePeaksError::MalformedInput { index });
    }
    if let OutlierPolicy::Threshold(k) = policy {
        if !k.is_finite() || k < 0.0 {
            return Err(CombinePeaksError::InvalidThreshold(k));
        }
    }

    let first = positions[0];
    if positions.iter().all(|p| *p == first) {
        debug!("All peak positions are identical");
        return Ok(CombinedPeak {
            position: first,
            rejected: None,
        });
    }

    let centroid = mean_position(positions.iter());
    let (candidate, max_dist) = positions
        .iter()
        .map(|p| p.distance(&centroid))
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(best, best_dist), (i, d)| {
            if d >= best_dist {
                (i, d)
            } else {
                (best, best_dist)
            }
        });
    trace!("Centroid {centroid}; furthest position is {candidate} at a distance of {max_dist}");

    let reject = match policy {
        OutlierPolicy::Keep => false,
        OutlierPolicy::Furthest => true,
        OutlierPolicy::Threshold(k) => {
            let others: Vec<&PeakPosition> = positions
                .iter()
                .enumerate()
                .filter(|&(i, _)| i != candidate)
                .map(|(_, p)| p)
                .collect();
            let mut pairwise = vec![];
            for (i, a) in others.iter().enumerate() {
                for b in &others[i + 1..] {
                    pairwise.push(a.distance(b));
                }
            }
            // There are at least 2 other positions, so at least 1 distance.
            let spread = median_in_place(&mut pairwise).unwrap_or(0.0);
            debug!("Median spread of the other positions: {spread}");
            max_dist > k * spread
        }
    };

    let rejected = reject.then_some(candidate);
    let position = mean_position(
        positions
            .iter()
            .enumerate()
            .filter(|&(i, _)| Some(i) != rejected)
            .map(|(_, p)| p),
    );
    match rejected {
        Some(i) => debug!("Rejected position {i} {}", positions[i]),
        None => debug!("No position rejected"),
    }

    Ok(CombinedPeak { position, rejected })
}
