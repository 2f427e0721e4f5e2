// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors from combining peak positions.

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum CombinePeaksError {
    #[error("At least 3 peak positions are needed to reject an outlier, but only {found} were supplied")]
    InsufficientSamples { found: usize },

    #[error("Peak position {index} has a non-finite coordinate")]
    MalformedInput { index: usize },

    #[error("The outlier threshold must be a finite, non-negative number (got {0})")]
    InvalidThreshold(f64),
}
