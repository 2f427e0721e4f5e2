// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with channel and frequency ranges.

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ChanRangeError {
    #[error("Couldn't parse '{0}' as a channel range; expected something like '10~20' or '15'")]
    Malformed(String),

    #[error("Channel range {start}~{end} is reversed; the start must not exceed the end")]
    Reversed { start: usize, end: usize },
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FreqRangeError {
    #[error("Got {num_freqs} frequencies for {num_chans} channels")]
    LengthMismatch { num_freqs: usize, num_chans: usize },

    #[error("A channel width can't be determined from {0} channel(s)")]
    TooFewChannels(usize),
}
