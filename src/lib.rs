// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Automatic line-free (continuum) channel finding for ALMA spectra.

The heart of the crate is [`afoli::classify`], which sigma clips a spectrum
into continuum and line channels. [`peaks::combine`] merges peak positions
measured in several spectral windows.
 */

pub mod afoli;
mod cli;
pub mod constants;
pub mod flagging;
pub mod io;
pub(crate) mod math;
pub(crate) mod params;
pub mod peaks;

// Re-exports.
pub use cli::{Goco, GocoError};

use crossbeam_utils::atomic::AtomicCell;

lazy_static::lazy_static! {
    /// Are progress bars being drawn? This should only ever be enabled by CLI
    /// code.
    static ref PROGRESS_BARS: AtomicCell<bool> = AtomicCell::new(false);
}
