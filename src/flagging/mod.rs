// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Channel masks and channel ranges.
//!
//! A [`ChannelMask`] has one element per spectral channel; `true` means the
//! channel is continuum (line free), `false` means it is flagged (a line, an
//! edge channel or a user-flagged channel). Masks are exchanged with other
//! software as inclusive channel ranges written like `12~40`, which is CASA's
//! spectral-window selection syntax.

mod error;

pub use error::{ChanRangeError, FreqRangeError};

use std::{fmt, ops::Index, str::FromStr};

use itertools::Itertools;
use ndarray::ArrayView1;

/// An inclusive range of channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChanRange {
    pub start: usize,
    pub end: usize,
}

#[allow(clippy::len_without_is_empty)]
impl ChanRange {
    pub fn new(start: usize, end: usize) -> Result<ChanRange, ChanRangeError> {
        if start > end {
            return Err(ChanRangeError::Reversed { start, end });
        }
        Ok(ChanRange { start, end })
    }

    /// The number of channels in the range.
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn contains(&self, chan: usize) -> bool {
        (self.start..=self.end).contains(&chan)
    }
}

impl fmt::Display for ChanRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}~{}", self.start, self.end)
    }
}

impl FromStr for ChanRange {
    type Err = ChanRangeError;

    /// Parse either `start~end` or a single channel.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parse = |chan: &str| -> Result<usize, ChanRangeError> {
            chan.trim()
                .parse()
                .map_err(|_| ChanRangeError::Malformed(s.to_string()))
        };
        match s.split_once('~') {
            Some((start, end)) => ChanRange::new(parse(start)?, parse(end)?),
            None => {
                let chan = parse(s)?;
                Ok(ChanRange {
                    start: chan,
                    end: chan,
                })
            }
        }
    }
}

/// Parse many channel ranges. Ranges may be separated by whitespace, commas
/// or semicolons, e.g. "0~10 20~25;30".
pub fn parse_chan_ranges(s: &str) -> Result<Vec<ChanRange>, ChanRangeError> {
    s.split(|c: char| c.is_whitespace() || c == ',' || c == ';')
        .filter(|token| !token.is_empty())
        .map(ChanRange::from_str)
        .collect()
}

/// Find the contiguous runs of `value` in `flags`.
pub(crate) fn runs_of(flags: &[bool], value: bool) -> Vec<ChanRange> {
    let mut runs = vec![];
    let mut start = None;
    for (i, &f) in flags.iter().enumerate() {
        match (f == value, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                runs.push(ChanRange { start: s, end: i - 1 });
                start = None;
            }
            _ => (),
        }
    }
    if let Some(s) = start {
        runs.push(ChanRange {
            start: s,
            end: flags.len() - 1,
        });
    }
    runs
}

/// Per-channel classification of a spectrum; `true` is continuum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMask(Vec<bool>);

impl ChannelMask {
    /// A mask with every channel marked as continuum.
    pub fn all_continuum(num_chans: usize) -> ChannelMask {
        ChannelMask(vec![true; num_chans])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_continuum(&self, chan: usize) -> bool {
        self.0[chan]
    }

    pub fn num_continuum(&self) -> usize {
        self.0.iter().filter(|&&c| c).count()
    }

    pub fn num_flagged(&self) -> usize {
        self.len() - self.num_continuum()
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, bool> {
        self.0.iter()
    }

    /// The inclusive ranges of continuum channels, in channel order.
    pub fn continuum_ranges(&self) -> Vec<ChanRange> {
        runs_of(&self.0, true)
    }

    /// The inclusive ranges of flagged channels, in channel order.
    pub fn flagged_ranges(&self) -> Vec<ChanRange> {
        runs_of(&self.0, false)
    }

    /// The contents of a "chanfile": the continuum ranges separated by single
    /// spaces.
    pub fn to_chanfile_string(&self) -> String {
        self.continuum_ranges().iter().join(" ")
    }

    /// The flagged ranges in CASA notation, joined with `sep` (CASA uses ';'
    /// inside a spectral-window selection).
    pub fn to_casa_string(&self, sep: &str) -> String {
        self.flagged_ranges().iter().join(sep)
    }

    /// The flagged ranges as frequency ranges, given the frequency of each
    /// channel. Every range is widened by half a channel on both sides, so
    /// that selecting it again covers the edge channels completely. The
    /// frequencies may be in either order.
    pub fn flagged_freq_ranges(
        &self,
        freq: ArrayView1<f64>,
    ) -> Result<Vec<FreqRange>, FreqRangeError> {
        if freq.len() != self.len() {
            return Err(FreqRangeError::LengthMismatch {
                num_freqs: freq.len(),
                num_chans: self.len(),
            });
        }
        if freq.len() < 2 {
            return Err(FreqRangeError::TooFewChannels(freq.len()));
        }
        let half_width = (freq[0] - freq[1]).abs() / 2.0;
        Ok(self
            .flagged_ranges()
            .into_iter()
            .map(|r| {
                let (a, b) = (freq[r.start], freq[r.end]);
                FreqRange {
                    low: a.min(b) - half_width,
                    high: a.max(b) + half_width,
                }
            })
            .collect())
    }
}

/// An inclusive range of frequencies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FreqRange {
    pub low: f64,
    pub high: f64,
}

impl FreqRange {
    /// CASA notation, e.g. `230.0395000000~230.0425000000GHz`.
    pub fn to_casa_string(&self, unit: &str) -> String {
        format!("{:.10}~{:.10}{unit}", self.low, self.high)
    }
}

impl From<Vec<bool>> for ChannelMask {
    fn from(v: Vec<bool>) -> Self {
        ChannelMask(v)
    }
}

impl From<ChannelMask> for Vec<bool> {
    fn from(m: ChannelMask) -> Self {
        m.0
    }
}

impl Index<usize> for ChannelMask {
    type Output = bool;

    fn index(&self, chan: usize) -> &bool {
        &self.0[chan]
    }
}

// The functions below operate on "line" flags: `true` means the channel was
// flagged by the clipping (not by the edges or the user). `protected` channels
// are flagged regardless, and are never part of a line run.

/// Grow every line run by `width` channels on each side.
pub(crate) fn dilate_runs(line: &mut [bool], protected: &[bool], width: usize) {
    if width == 0 {
        return;
    }
    let n = line.len();
    for run in runs_of(line, true) {
        let start = run.start.saturating_sub(width);
        let end = (run.end + width).min(n - 1);
        for (l, &p) in line[start..=end]
            .iter_mut()
            .zip(protected[start..=end].iter())
        {
            if !p {
                *l = true;
            }
        }
    }
}

/// Flag continuum gaps of at most `max_gap` channels lying between two flagged
/// channels (line or protected). Gaps touching the ends of the spectrum are
/// never filled.
pub(crate) fn fill_gaps(line: &mut [bool], protected: &[bool], max_gap: usize) {
    if max_gap == 0 {
        return;
    }
    let continuum: Vec<bool> = line
        .iter()
        .zip(protected.iter())
        .map(|(&l, &p)| !l && !p)
        .collect();
    let n = line.len();
    for gap in runs_of(&continuum, true) {
        if gap.start == 0 || gap.end == n - 1 || gap.len() > max_gap {
            continue;
        }
        line[gap.start..=gap.end].iter_mut().for_each(|l| *l = true);
    }
}

/// Revert line runs narrower than `min_width` channels. Returns the number of
/// runs that were removed. Running this on its own output is a no-op.
pub(crate) fn remove_short_runs(line: &mut [bool], min_width: usize) -> usize {
    let mut num_removed = 0;
    for run in runs_of(line, true) {
        if run.len() < min_width {
            line[run.start..=run.end].iter_mut().for_each(|l| *l = false);
            num_removed += 1;
        }
    }
    num_removed
}
