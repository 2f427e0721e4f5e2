// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use log::info;
use thiserror::Error;

use crate::{
    io::{read_peaks, write_peak, ReadPeaksError, WriteError},
    peaks::{combine, CombinePeaksError, OutlierPolicy},
};

pub(crate) struct CombinePeaksParams {
    pub(crate) input: PathBuf,
    pub(crate) output: PathBuf,
    pub(crate) policy: OutlierPolicy,

    /// Write the position without rounding to whole pixels.
    pub(crate) precise: bool,
}

impl CombinePeaksParams {
    pub(crate) fn run(&self) -> Result<(), CombinePeaksRunError> {
        let positions = read_peaks(&self.input)?;
        info!(
            "Combining {} peak positions from {}",
            positions.len(),
            self.input.display()
        );
        let combined = combine(&positions, self.policy)?;
        match combined.rejected {
            Some(i) => info!("Rejected position {i}: {}", positions[i]),
            None => info!("No position was rejected"),
        }
        info!("Combined position: {}", combined.position);

        write_peak(&self.output, &combined.position, self.precise)?;
        info!("Wrote {}", self.output.display());
        Ok(())
    }
}

#[derive(Error, Debug)]
pub(crate) enum CombinePeaksRunError {
    #[error(transparent)]
    Read(#[from] ReadPeaksError),

    #[error(transparent)]
    Combine(#[from] CombinePeaksError),

    #[error(transparent)]
    Write(#[from] WriteError),
}
