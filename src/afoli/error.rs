// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors from classifying a spectrum.

use thiserror::Error;

use crate::flagging::{ChanRange, ChannelMask};

#[derive(Error, Debug)]
pub enum ContinuumError {
    #[error("The spectrum has no channels")]
    EmptySpectrum,

    #[error("Channel {channel} has a non-finite flux ({value})")]
    MalformedInput { channel: usize, value: f64 },

    #[error("{name} must be a finite, non-negative number of standard deviations (got {value})")]
    InvalidSigma { name: &'static str, value: f64 },

    #[error("Flagging {edge_width} channels at each edge would flag the entire spectrum ({num_chans} channels)")]
    EdgesTooWide { edge_width: usize, num_chans: usize },

    #[error("Dilating flagged bands by {dilate} channels would cover the entire spectrum ({num_chans} channels)")]
    DilationTooWide { dilate: usize, num_chans: usize },

    #[error("Flagged channel range {range} is outside the spectrum ({num_chans} channels)")]
    FlagRangeOutOfBounds { range: ChanRange, num_chans: usize },

    /// `mask` is the last mask with valid statistics.
    #[error("Only {num_unflagged} channels remain unflagged; can't determine the continuum statistics")]
    DegenerateSpectrum {
        num_unflagged: usize,
        mask: ChannelMask,
    },
}

impl ContinuumError {
    /// The best-effort mask carried by a degenerate spectrum, if this is that
    /// error.
    pub fn best_effort_mask(&self) -> Option<&ChannelMask> {
        match self {
            ContinuumError::DegenerateSpectrum { mask, .. } => Some(mask),
            _ => None,
        }
    }
}
