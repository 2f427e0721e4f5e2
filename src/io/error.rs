// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with reading and writing files.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReadSpectrumError {
    #[error("Spectrum file {0} doesn't exist")]
    DoesNotExist(PathBuf),

    #[error("Spectrum '{0}' contains no data")]
    Empty(String),

    #[error("Line {line_num}: couldn't parse '{string}' as a number")]
    ParseFloat { line_num: usize, string: String },

    #[error("Line {line_num}: expected {expected} columns like the first data line, but found {found}")]
    InconsistentColumns {
        line_num: usize,
        expected: usize,
        found: usize,
    },

    #[error(transparent)]
    IO(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ReadPeaksError {
    #[error("Peak positions file {0} doesn't exist")]
    DoesNotExist(PathBuf),

    #[error("Line {line_num}: couldn't parse '{string}' as a number")]
    ParseFloat { line_num: usize, string: String },

    #[error("Line {line_num}: expected an 'x y' pair, but found {found} values")]
    NotAPair { line_num: usize, found: usize },

    #[error(transparent)]
    IO(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ReadFreqFlagsError {
    #[error("Frequency flags file {0} doesn't exist")]
    DoesNotExist(PathBuf),

    #[error("Line {line_num}: expected a frequency range like '230.1~230.2GHz', but found '{string}'")]
    Malformed { line_num: usize, string: String },

    #[error(transparent)]
    IO(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("Couldn't write to {path}: {err}")]
    File { path: PathBuf, err: std::io::Error },

    #[error("Couldn't derive a file name for level {level} from {path}")]
    BadPath { path: PathBuf, level: f64 },
}
