// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Useful constants.

The sigma defaults favour spectra dominated by line emission: the upper clip
is tight so emission peaks are rejected aggressively, whereas the lower clip
tolerates absorption and noise dips.
 */

/// The default number of standard deviations below the centre of the
/// unflagged channels before a channel is flagged.
pub const DEFAULT_SIGMA_LOWER: f64 = 3.0;

/// The default number of standard deviations above the centre of the
/// unflagged channels before a channel is flagged.
pub const DEFAULT_SIGMA_UPPER: f64 = 1.3;

/// The default number of channels flagged at each end of a spectrum.
pub const DEFAULT_EDGE_WIDTH: usize = 10;

/// Flagged bands narrower than this many channels are reverted to continuum.
/// Two raw channels are roughly one spectral resolution element.
pub const DEFAULT_MIN_WIDTH: usize = 2;

/// By default, flagged bands are not dilated.
pub const DEFAULT_DILATE: usize = 0;

/// By default, continuum gaps between flagged bands are left alone.
pub const DEFAULT_MIN_GAP: usize = 0;

/// The default multiple of the typical pairwise spread that a peak position
/// must exceed before it's rejected as an outlier.
pub const DEFAULT_OUTLIER_THRESHOLD: f64 = 3.0;

/// The suffix (including the extension) given to channel files when the user
/// doesn't name them.
pub const DEFAULT_CHANFILE_SUFFIX: &str = ".chans.txt";

/// The suffix (including the extension) of the frequency flags file written
/// beside each channel file.
pub const DEFAULT_FREQ_FLAGS_SUFFIX: &str = ".line_freq_flags.txt";

/// The unit written after frequency ranges when the user doesn't give one.
pub const DEFAULT_FREQ_UNIT: &str = "GHz";
