// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Masks at different levels of continuum contamination.
//!
//! During clipping, the mean of the unflagged channels drops towards the
//! continuum level as line channels are removed. For a level `l`, we find the
//! (fractional) clipping step at which the mean was `(1 + l)` times the final
//! continuum level, take the mean and standard deviation reached there, and
//! flag every channel outside the asymmetric sigma limits about that mean.
//! Larger levels therefore give more permissive masks.
//!
//! The clipping is discrete, so a level generally falls between two steps; the
//! [`LevelMode`] says how to pick values between them.

use log::{debug, warn};
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;

use super::{base_flags, ClipState, Continuum, ContinuumError, ContinuumParams};
use crate::flagging::ChannelMask;

/// How to determine values for levels falling between clipping steps.
///
/// Only these four modes are supported. Every mode looks at just the two steps
/// bracketing a level, so higher-order interpolation (quadratic, cubic or
/// spline orders) is not available; the clip history is usually only a
/// handful of steps and not monotone enough for it.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumIter, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LevelMode {
    /// Interpolate linearly in step index; the level is reached exactly.
    Linear,

    /// Use whichever of the two bracketing steps has a mean closer to the
    /// level.
    #[default]
    Nearest,

    /// Use the earlier bracketing step (fewer channels flagged).
    Previous,

    /// Use the later bracketing step (more channels flagged).
    Next,
}

/// A mask derived for a single contamination level.
#[derive(Debug, Clone)]
pub struct LevelMask {
    pub level: f64,

    /// The continuum value used for this level.
    pub continuum: f64,

    /// The standard deviation used for this level.
    pub std: f64,

    /// Was the level within the range of the clip history? If not, the
    /// nearest step was used.
    pub in_range: bool,

    pub mask: ChannelMask,
}

#[derive(Error, Debug)]
pub enum LevelError {
    #[error("The continuum level is zero; contamination levels relative to it are undefined")]
    ZeroContinuum,

    #[error("Contamination level {0} is not a finite number")]
    NonFiniteLevel(f64),

    #[error(transparent)]
    Continuum(#[from] ContinuumError),
}

/// Find the continuum value and standard deviation at which the clip history
/// reaches `(1 + level)` times `continuum`. The returned bool is `false` if the
/// level is outside the range of the history (and the nearest step was used).
pub(super) fn level_statistics(
    steps: &[ClipState],
    continuum: f64,
    level: f64,
    mode: LevelMode,
) -> (f64, f64, bool) {
    let target = 1.0 + level;
    let norm: Vec<f64> = steps.iter().map(|s| s.mean / continuum).collect();
    let (min, max) = norm
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), &n| {
            (min.min(n), max.max(n))
        });

    // The first pair of consecutive steps that brackets the target. One must
    // exist if the target is strictly inside the range.
    let bracket = if min < target && target < max {
        norm.windows(2)
            .position(|w| (w[0] - target) * (w[1] - target) <= 0.0)
    } else {
        None
    };

    match bracket {
        Some(i) => {
            let (d0, d1) = (norm[i] - target, norm[i + 1] - target);
            let (s0, s1) = (steps[i], steps[i + 1]);
            let values = match mode {
                LevelMode::Linear => {
                    let t = if d0 == d1 { 0.0 } else { d0 / (d0 - d1) };
                    (target * continuum, s0.std + t * (s1.std - s0.std))
                }
                LevelMode::Nearest => {
                    if d0.abs() <= d1.abs() {
                        (s0.mean, s0.std)
                    } else {
                        (s1.mean, s1.std)
                    }
                }
                LevelMode::Previous => (s0.mean, s0.std),
                LevelMode::Next => (s1.mean, s1.std),
            };
            (values.0, values.1, true)
        }

        None => {
            let nearest = norm
                .iter()
                .enumerate()
                .fold((0, f64::INFINITY), |(best, best_diff), (i, &n)| {
                    let diff = (target - n).abs();
                    if diff < best_diff {
                        (i, diff)
                    } else {
                        (best, best_diff)
                    }
                })
                .0;
            (steps[nearest].mean, steps[nearest].std, false)
        }
    }
}

/// Derive a mask for each of the contamination `levels` from a finished
/// classification of the same spectrum with the same parameters.
///
/// Level masks are not cleaned of narrow bands; only the edges, user-flagged
/// channels and invalid values are flagged in addition to the clipped
/// channels.
pub fn level_masks(
    flux: ArrayView1<f64>,
    params: &ContinuumParams,
    result: &Continuum,
    levels: &[f64],
    mode: LevelMode,
) -> Result<Vec<LevelMask>, LevelError> {
    if result.level == 0.0 {
        return Err(LevelError::ZeroContinuum);
    }
    if let Some(&l) = levels.iter().find(|l| !l.is_finite()) {
        return Err(LevelError::NonFiniteLevel(l));
    }
    let forced = base_flags(flux, params)?;

    let mut masks = Vec::with_capacity(levels.len());
    for &level in levels {
        let (continuum, std, in_range) =
            level_statistics(&result.steps, result.level, level, mode);
        if in_range {
            debug!("Level {level}: continuum = {continuum}, std dev = {std}");
        } else {
            warn!("Level {level} is outside the range of the clip history; using the nearest step (continuum = {continuum}, std dev = {std})");
        }

        let lower = continuum - params.sigma_lower * std;
        let upper = continuum + params.sigma_upper * std;
        let mask: Vec<bool> = forced
            .iter()
            .zip(flux.iter())
            .map(|(&f, &v)| !f && v >= lower && v <= upper)
            .collect();
        masks.push(LevelMask {
            level,
            continuum,
            std,
            in_range,
            mask: ChannelMask::from(mask),
        });
    }

    Ok(masks)
}
