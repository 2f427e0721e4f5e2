// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! AFOLI: Automatic Flagging Of Line Indices.
//!
//! AFOLI finds the line-free ("continuum") channels of a spectrum. The
//! procedure is:
//!
//! 1. Flag the channels at the edges of the spectrum, any user-specified
//!    channel ranges and any channels with user-specified invalid values.
//! 2. Iteratively sigma clip the remaining channels with asymmetric limits
//!    until no more channels are flagged (or the iteration limit is hit).
//!    By default the upper limit is much tighter than the lower limit, so line
//!    emission is rejected aggressively.
//! 3. Optionally dilate the flagged bands and flag small continuum gaps
//!    between them.
//! 4. Revert flagged bands narrower than the minimum width; single-channel
//!    excursions are treated as noise rather than lines.
//!
//! The statistics of every clipping step are kept, so that masks at different
//! "contamination levels" can be derived afterwards (see [`levels`]).

mod error;
pub mod levels;
#[cfg(feature = "plotting")]
pub mod plot;

pub use error::ContinuumError;

use log::{debug, trace};
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};
use vec1::Vec1;

use crate::{
    constants::*,
    flagging::{dilate_runs, fill_gaps, remove_short_runs, ChanRange, ChannelMask},
    math::{masked_linregress_intercept, masked_mean_std, masked_median, num_selected},
};

/// The statistic used as the centre of the unflagged channels when clipping.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumIter, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CenStat {
    #[default]
    Mean,
    Median,
    /// The band-centre value of a linear fit; useful when the continuum has a
    /// slope across the band.
    Linregress,
}

/// Everything that controls how a spectrum is classified.
#[derive(Debug, Clone, PartialEq)]
pub struct ContinuumParams {
    pub sigma_lower: f64,
    pub sigma_upper: f64,
    pub censtat: CenStat,

    /// The maximum number of clipping passes. `None` means iterate until
    /// convergence.
    pub max_iterations: Option<usize>,

    /// The number of channels always flagged at each end of the spectrum.
    pub edge_width: usize,

    /// Channel ranges that are always flagged.
    pub flag_chans: Vec<ChanRange>,

    /// Channels with exactly these flux values are always flagged.
    pub invalid_values: Vec<f64>,

    /// Grow flagged bands by this many channels on each side.
    pub dilate: usize,

    /// Flag continuum gaps of at most this many channels between flagged
    /// bands. 0 disables this.
    pub min_gap: usize,

    /// Flagged bands narrower than this are reverted to continuum.
    pub min_width: usize,
}

impl Default for ContinuumParams {
    fn default() -> Self {
        Self {
            sigma_lower: DEFAULT_SIGMA_LOWER,
            sigma_upper: DEFAULT_SIGMA_UPPER,
            censtat: CenStat::default(),
            max_iterations: None,
            edge_width: DEFAULT_EDGE_WIDTH,
            flag_chans: vec![],
            invalid_values: vec![],
            dilate: DEFAULT_DILATE,
            min_gap: DEFAULT_MIN_GAP,
            min_width: DEFAULT_MIN_WIDTH,
        }
    }
}

/// Statistics of the unflagged channels at one clipping step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipState {
    pub num_unflagged: usize,
    /// The value clipping limits are measured from (see [`CenStat`]).
    pub center: f64,
    pub mean: f64,
    pub std: f64,
}

/// The result of classifying a spectrum.
#[derive(Debug, Clone)]
pub struct Continuum {
    pub mask: ChannelMask,

    /// The mean of the continuum channels.
    pub level: f64,

    /// The standard deviation of the continuum channels.
    pub std: f64,

    /// The clip history. The first element describes the channels before any
    /// clipping; every following element is the state after a pass that
    /// flagged at least one channel.
    pub steps: Vec1<ClipState>,

    /// The number of clipping passes performed.
    pub iterations: usize,

    /// Did the clipping stop because a pass flagged nothing?
    pub converged: bool,
}

/// Flags that apply regardless of the clipping: the edges, user-specified
/// channel ranges and invalid values. `true` means flagged. This also checks
/// that the spectrum and the parameters are usable.
pub(crate) fn base_flags(
    flux: ArrayView1<f64>,
    params: &ContinuumParams,
) -> Result<Vec<bool>, ContinuumError> {
    let num_chans = flux.len();
    if num_chans == 0 {
        return Err(ContinuumError::EmptySpectrum);
    }
    if let Some((channel, &value)) = flux.iter().enumerate().find(|(_, f)| !f.is_finite()) {
        return Err(ContinuumError::MalformedInput { channel, value });
    }
    for (name, value) in [
        ("sigma_lower", params.sigma_lower),
        ("sigma_upper", params.sigma_upper),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(ContinuumError::InvalidSigma { name, value });
        }
    }
    if 2 * params.edge_width >= num_chans {
        return Err(ContinuumError::EdgesTooWide {
            edge_width: params.edge_width,
            num_chans,
        });
    }
    if 2 * params.dilate >= num_chans {
        return Err(ContinuumError::DilationTooWide {
            dilate: params.dilate,
            num_chans,
        });
    }

    let mut flags = vec![false; num_chans];
    if params.edge_width > 0 {
        trace!("Flagging {} channels at each edge", params.edge_width);
        flags[..params.edge_width].iter_mut().for_each(|f| *f = true);
        flags[num_chans - params.edge_width..]
            .iter_mut()
            .for_each(|f| *f = true);
    }
    for &range in &params.flag_chans {
        if range.end >= num_chans {
            return Err(ContinuumError::FlagRangeOutOfBounds { range, num_chans });
        }
        trace!("Flagging channel range {range}");
        flags[range.start..=range.end]
            .iter_mut()
            .for_each(|f| *f = true);
    }
    for &invalid in &params.invalid_values {
        for (f, &v) in flags.iter_mut().zip(flux.iter()) {
            if v == invalid {
                *f = true;
            }
        }
    }

    Ok(flags)
}

/// Get the clipping statistics of the selected (`true`) channels. `None` if
/// fewer than two channels are selected.
fn clip_state(flux: ArrayView1<f64>, selection: &[bool], censtat: CenStat) -> Option<ClipState> {
    let (num_unflagged, mean, std) = masked_mean_std(flux, selection, 2)?;
    let center = match censtat {
        CenStat::Mean => mean,
        CenStat::Median => masked_median(flux, selection)?,
        CenStat::Linregress => masked_linregress_intercept(flux, selection)?,
    };
    Some(ClipState {
        num_unflagged,
        center,
        mean,
        std,
    })
}

/// Classify the channels of a spectrum as continuum or line.
///
/// If too few channels remain unflagged to compute statistics, a
/// [`ContinuumError::DegenerateSpectrum`] is returned; it carries the last mask
/// that still had valid statistics, so that the caller can decide whether to
/// use it.
pub fn classify(
    flux: ArrayView1<f64>,
    params: &ContinuumParams,
) -> Result<Continuum, ContinuumError> {
    let forced = base_flags(flux, params)?;
    let mut mask: Vec<bool> = forced.iter().map(|&f| !f).collect();
    debug!(
        "Initial number of flagged channels = {}/{}",
        mask.len() - num_selected(&mask),
        mask.len()
    );

    let mut steps = match clip_state(flux, &mask, params.censtat) {
        Some(s) => Vec1::new(s),
        None => {
            return Err(ContinuumError::DegenerateSpectrum {
                num_unflagged: num_selected(&mask),
                mask: ChannelMask::from(mask),
            })
        }
    };

    let mut iterations = 0;
    let mut converged = false;
    loop {
        if params.max_iterations.map(|max| iterations >= max).unwrap_or(false) {
            debug!("Stopping after the maximum of {iterations} clipping passes");
            break;
        }

        let state = *steps.last();
        let lower = state.center - params.sigma_lower * state.std;
        let upper = state.center + params.sigma_upper * state.std;
        let mut next = mask.clone();
        let mut num_new = 0;
        for (m, &f) in next.iter_mut().zip(flux.iter()) {
            if *m && (f > upper || f < lower) {
                *m = false;
                num_new += 1;
            }
        }
        iterations += 1;
        trace!("Pass {iterations}: limits [{lower}, {upper}], {num_new} new flagged channels");

        if num_new == 0 {
            converged = true;
            break;
        }
        match clip_state(flux, &next, params.censtat) {
            Some(s) => {
                mask = next;
                steps.push(s);
            }
            None => {
                return Err(ContinuumError::DegenerateSpectrum {
                    num_unflagged: num_selected(&next),
                    mask: ChannelMask::from(mask),
                })
            }
        }
    }
    debug!(
        "Number of flagged channels after clipping = {}/{} ({iterations} passes)",
        mask.len() - num_selected(&mask),
        mask.len()
    );

    // Clean up the line flags. The forced flags never take part, so a line
    // next to an edge is judged on its own width.
    let mut line: Vec<bool> = mask
        .iter()
        .zip(forced.iter())
        .map(|(&m, &f)| !m && !f)
        .collect();
    if params.dilate > 0 {
        dilate_runs(&mut line, &forced, params.dilate);
        trace!("Dilated flagged bands by {} channels", params.dilate);
    }
    if params.min_gap > 0 {
        fill_gaps(&mut line, &forced, params.min_gap);
        trace!("Flagged gaps of up to {} channels", params.min_gap);
    }
    if params.min_width > 0 {
        let num_removed = remove_short_runs(&mut line, params.min_width);
        debug!(
            "Unflagged {num_removed} bands narrower than {} channels",
            params.min_width
        );
    }
    let final_mask: Vec<bool> = line
        .iter()
        .zip(forced.iter())
        .map(|(&l, &f)| !l && !f)
        .collect();

    let (_, level, std) = match masked_mean_std(flux, &final_mask, 2) {
        Some(s) => s,
        None => {
            return Err(ContinuumError::DegenerateSpectrum {
                num_unflagged: num_selected(&final_mask),
                mask: ChannelMask::from(final_mask),
            })
        }
    };
    let mask = ChannelMask::from(final_mask);
    debug!(
        "Final number of flagged channels = {}/{}",
        mask.num_flagged(),
        mask.len()
    );
    debug!("Continuum level = {level} +/- {std}");

    Ok(Continuum {
        mask,
        level,
        std,
        steps,
        iterations,
        converged,
    })
}
