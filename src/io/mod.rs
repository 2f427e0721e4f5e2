// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Reading and writing the text files exchanged with the rest of the
//! pipeline: spectra, peak positions, channel files and result tables.

mod error;
pub(crate) mod read;
#[cfg(test)]
mod tests;
pub(crate) mod write;

pub use error::{ReadFreqFlagsError, ReadPeaksError, ReadSpectrumError, WriteError};
pub use read::{read_freq_flags, read_peaks, read_spectrum};
pub use write::{
    append_table_row, level_chanfile_path, write_chanfile, write_freq_flags,
    write_joined_freq_flags, write_peak,
};

use ndarray::Array1;

/// A spectrum read from a file.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    /// A name for the spectrum, used in logs and tables (usually the file
    /// stem).
    pub name: String,

    /// The abscissa (usually frequency) of each channel, if the file had more
    /// than one column.
    pub freq: Option<Array1<f64>>,

    pub flux: Array1<f64>,
}
