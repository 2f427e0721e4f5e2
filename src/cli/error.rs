// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error type for all goco-related errors. This should be the *only* error
//! enum that is publicly visible.

use thiserror::Error;

use super::{afoli::AfoliArgsError, combine_peaks::CombinePeaksArgsError};
use crate::{
    afoli::{levels::LevelError, ContinuumError},
    flagging::ChanRangeError,
    io::{ReadPeaksError, ReadSpectrumError, WriteError},
    params::{AfoliRunError, CombinePeaksRunError},
    peaks::CombinePeaksError,
};

/// The *only* publicly visible error from goco. Each error message should
/// point to where more help is available, unless it's "generic".
#[derive(Error, Debug)]
pub enum GocoError {
    /// An error related to afoli.
    #[error("{0}\n\nSee for more info: goco afoli --help")]
    Afoli(String),

    /// An error related to contamination levels.
    #[error("{0}\n\nSee for more info: the --levels and --level-mode options of goco afoli --help")]
    Levels(String),

    /// An error related to channel ranges.
    #[error("{0}\n\nChannel ranges look like \"0~10\" (inclusive) or \"5\", separated by spaces, commas or semicolons.")]
    ChanRanges(String),

    /// An error related to reading spectra.
    #[error("{0}\n\nSpectrum files hold one flux value per line, or columns of channel (or frequency) and flux. Lines starting with '#' are ignored.")]
    Spectrum(String),

    /// An error related to combine-peaks.
    #[error("{0}\n\nSee for more info: goco combine-peaks --help")]
    CombinePeaks(String),

    /// An error related to argument files.
    #[error("{0}\n\nArgument files are toml or json files whose keys match the long CLI options of a subcommand, with dashes replaced by underscores.")]
    ArgFile(String),

    /// An error related to plotting.
    #[error("{0}\n\nIf you don't know what this means, try turning up verbosity (-v or -vv).")]
    Plotting(String),

    /// A generic error that can't be clarified further with documentation, e.g.
    /// IO errors.
    #[error("{0}")]
    Generic(String),
}

// When changing the error propagation below, ensure `Self::from(e)` uses the
// correct `e`!

// Binary sub-command errors.

impl From<AfoliArgsError> for GocoError {
    fn from(e: AfoliArgsError) -> Self {
        let s = e.to_string();
        match e {
            AfoliArgsError::NoSpectra
            | AfoliArgsError::ChanfileCountMismatch { .. }
            | AfoliArgsError::DuplicateChanfile(_)
            | AfoliArgsError::DuplicateFreqFlags(_)
            | AfoliArgsError::InvalidCenStat(_) => Self::Afoli(s),
            AfoliArgsError::InvalidLevelMode(_) | AfoliArgsError::InvalidLevel(_) => {
                Self::Levels(s)
            }
            AfoliArgsError::FlagChans(e) => Self::from(e),
            #[cfg(not(feature = "plotting"))]
            AfoliArgsError::NoPlottingFeature => Self::Plotting(s),
        }
    }
}

impl From<AfoliRunError> for GocoError {
    fn from(e: AfoliRunError) -> Self {
        let s = e.to_string();
        match e {
            AfoliRunError::Read { .. } => Self::Spectrum(s),
            AfoliRunError::Continuum { err, .. } => match err {
                ContinuumError::EmptySpectrum | ContinuumError::MalformedInput { .. } => {
                    Self::Spectrum(s)
                }
                _ => Self::Afoli(s),
            },
            AfoliRunError::Level { err, .. } => match err {
                LevelError::Continuum(_) => Self::Afoli(s),
                _ => Self::Levels(s),
            },
            AfoliRunError::NoFrequencies(_)
            | AfoliRunError::FreqFlags { .. }
            | AfoliRunError::ReadFreqFlags { .. } => Self::Afoli(s),
            AfoliRunError::Write(e) => Self::from(e),
            #[cfg(feature = "plotting")]
            AfoliRunError::Draw(_) => Self::Plotting(s),
        }
    }
}

impl From<CombinePeaksArgsError> for GocoError {
    fn from(e: CombinePeaksArgsError) -> Self {
        Self::CombinePeaks(e.to_string())
    }
}

impl From<CombinePeaksRunError> for GocoError {
    fn from(e: CombinePeaksRunError) -> Self {
        match e {
            CombinePeaksRunError::Read(e) => Self::from(e),
            CombinePeaksRunError::Combine(e) => Self::from(e),
            CombinePeaksRunError::Write(e) => Self::from(e),
        }
    }
}

// Library code errors.

impl From<ChanRangeError> for GocoError {
    fn from(e: ChanRangeError) -> Self {
        Self::ChanRanges(e.to_string())
    }
}

impl From<ReadSpectrumError> for GocoError {
    fn from(e: ReadSpectrumError) -> Self {
        let s = e.to_string();
        match e {
            ReadSpectrumError::IO(_) => Self::Generic(s),
            _ => Self::Spectrum(s),
        }
    }
}

impl From<ReadPeaksError> for GocoError {
    fn from(e: ReadPeaksError) -> Self {
        let s = e.to_string();
        match e {
            ReadPeaksError::IO(_) => Self::Generic(s),
            _ => Self::CombinePeaks(s),
        }
    }
}

impl From<CombinePeaksError> for GocoError {
    fn from(e: CombinePeaksError) -> Self {
        Self::CombinePeaks(e.to_string())
    }
}

impl From<WriteError> for GocoError {
    fn from(e: WriteError) -> Self {
        Self::Generic(e.to_string())
    }
}

impl From<std::io::Error> for GocoError {
    fn from(e: std::io::Error) -> Self {
        Self::Generic(e.to_string())
    }
}

impl From<toml::ser::Error> for GocoError {
    fn from(e: toml::ser::Error) -> Self {
        Self::ArgFile(e.to_string())
    }
}
