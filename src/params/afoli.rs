// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::{Path, PathBuf};

use indicatif::{ParallelProgressIterator, ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::{debug, info, warn};
use ndarray::ArrayView1;
use rayon::prelude::*;
use thiserror::Error;
use vec1::Vec1;

use crate::{
    afoli::{
        classify,
        levels::{level_masks, LevelError, LevelMask, LevelMode},
        Continuum, ContinuumError, ContinuumParams,
    },
    flagging::{ChannelMask, FreqRange, FreqRangeError},
    io::{
        append_table_row, level_chanfile_path, read::spectrum_name, read_freq_flags,
        read_spectrum, write_chanfile, write_freq_flags, write_joined_freq_flags,
        ReadFreqFlagsError, ReadSpectrumError, Spectrum, WriteError,
    },
    PROGRESS_BARS,
};

/// A spectrum to classify and where its results go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SpectrumJob {
    pub(crate) spectrum: PathBuf,
    pub(crate) chanfile: PathBuf,

    /// Where to write the flagged frequency ranges, if at all.
    pub(crate) freq_flags: Option<PathBuf>,

    /// Where to draw the classified spectrum, if at all. Level plots go beside
    /// it.
    pub(crate) plot: Option<PathBuf>,
}

pub(crate) struct AfoliParams {
    pub(crate) jobs: Vec1<SpectrumJob>,
    pub(crate) continuum_params: ContinuumParams,
    pub(crate) levels: Vec<f64>,
    pub(crate) level_mode: LevelMode,

    /// Append a row of results per spectrum to this file.
    pub(crate) table: Option<PathBuf>,

    /// Write every spectrum's flagged frequency ranges to this file.
    pub(crate) joined_freq_flags: Option<PathBuf>,

    /// The unit written after frequency ranges.
    pub(crate) freq_unit: String,

    /// Skip spectra whose channel files already exist.
    pub(crate) resume: bool,

    /// Write the best-effort mask of degenerate spectra rather than failing.
    pub(crate) allow_degenerate: bool,
}

/// What happened to a single spectrum.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum JobOutcome {
    Classified {
        name: String,
        level: f64,
        std: f64,
        num_flagged: usize,
        num_chans: usize,
        freq_ranges: Option<Vec<FreqRange>>,
    },
    Degenerate {
        name: String,
        freq_ranges: Option<Vec<FreqRange>>,
    },
}

impl AfoliParams {
    pub(crate) fn run(&self) -> Result<(), AfoliRunError> {
        let to_run: Vec<bool> = self
            .jobs
            .iter()
            .map(|job| {
                if self.resume && job.chanfile.exists() {
                    info!(
                        "{} already exists; skipping {}",
                        job.chanfile.display(),
                        job.spectrum.display()
                    );
                    false
                } else {
                    true
                }
            })
            .collect();
        let jobs: Vec<&SpectrumJob> = self
            .jobs
            .iter()
            .zip(&to_run)
            .filter(|(_, &run)| run)
            .map(|(job, _)| job)
            .collect();
        if jobs.is_empty() {
            info!("Nothing to do; every channel file already exists");
            if self.joined_freq_flags.is_none() {
                return Ok(());
            }
        }

        let pb = ProgressBar::with_draw_target(
            Some(jobs.len() as _),
            if PROGRESS_BARS.load() {
                ProgressDrawTarget::stdout()
            } else {
                ProgressDrawTarget::hidden()
            },
        )
        .with_style(
            ProgressStyle::default_bar()
                .template("{msg:18}: [{wide_bar:.blue}] {pos:3}/{len:3} spectra ({elapsed_precise}<{eta_precise})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        )
        .with_position(0)
        .with_message("Finding continuum");

        info!("Classifying {} spectra", jobs.len());
        let results: Vec<Result<JobOutcome, AfoliRunError>> = jobs
            .par_iter()
            .progress_with(pb.clone())
            .map(|job| self.run_job(job))
            .collect();
        pb.finish_with_message("Finished");

        // Table rows and joined frequency flags are written in input order,
        // after all the parallel work.
        let mut results = results.into_iter();
        let mut joined = vec![];
        let mut first_error = None;
        let mut num_degenerate = 0;
        for (job, run) in self.jobs.iter().zip(to_run) {
            if !run {
                if self.joined_freq_flags.is_some() {
                    joined.extend(self.resumed_freq_flags(job)?);
                }
                continue;
            }
            let Some(result) = results.next() else {
                break;
            };
            match result {
                Ok(JobOutcome::Classified {
                    name,
                    level,
                    std,
                    num_flagged,
                    num_chans,
                    freq_ranges,
                }) => {
                    if let Some(table) = &self.table {
                        append_table_row(table, &name, level, std, num_flagged, num_chans)?;
                    }
                    if let Some(ranges) = freq_ranges {
                        joined.push((name, ranges));
                    }
                }
                Ok(JobOutcome::Degenerate { name, freq_ranges }) => {
                    num_degenerate += 1;
                    if let Some(ranges) = freq_ranges {
                        joined.push((name, ranges));
                    }
                }
                Err(e) => {
                    warn!("{e}");
                    first_error.get_or_insert(e);
                }
            }
        }
        if num_degenerate > 0 {
            warn!("{num_degenerate} spectra were degenerate; best-effort masks were written");
        }

        if let Some(e) = first_error {
            return Err(e);
        }
        if let Some(path) = &self.joined_freq_flags {
            write_joined_freq_flags(path, &joined, &self.freq_unit)?;
            info!("Wrote {}", path.display());
        }
        Ok(())
    }

    /// The frequency flags of a spectrum skipped by `--resume`, read back from
    /// its frequency flags file.
    fn resumed_freq_flags(
        &self,
        job: &SpectrumJob,
    ) -> Result<Option<(String, Vec<FreqRange>)>, AfoliRunError> {
        let name = spectrum_name(&job.spectrum);
        match &job.freq_flags {
            Some(path) if path.exists() => {
                let ranges = read_freq_flags(path, &self.freq_unit).map_err(|err| {
                    AfoliRunError::ReadFreqFlags {
                        path: path.clone(),
                        err,
                    }
                })?;
                Ok(Some((name, ranges)))
            }
            _ => {
                warn!("'{name}' was skipped and has no frequency flags file; it is left out of the joined frequency flags");
                Ok(None)
            }
        }
    }

    /// Write the flagged frequency ranges of `mask`, if this job wants them.
    fn freq_flags_for(
        &self,
        job: &SpectrumJob,
        spectrum: &Spectrum,
        mask: &ChannelMask,
    ) -> Result<Option<Vec<FreqRange>>, AfoliRunError> {
        let Some(path) = &job.freq_flags else {
            return Ok(None);
        };
        let freq = spectrum
            .freq
            .as_ref()
            .ok_or_else(|| AfoliRunError::NoFrequencies(spectrum.name.clone()))?;
        let ranges = mask
            .flagged_freq_ranges(freq.view())
            .map_err(|err| AfoliRunError::FreqFlags {
                name: spectrum.name.clone(),
                err,
            })?;
        write_freq_flags(path, &ranges, &self.freq_unit)?;
        Ok(Some(ranges))
    }

    fn run_job(&self, job: &SpectrumJob) -> Result<JobOutcome, AfoliRunError> {
        let spectrum = read_spectrum(&job.spectrum).map_err(|err| AfoliRunError::Read {
            path: job.spectrum.clone(),
            err,
        })?;
        let name = spectrum.name.clone();
        debug!("Classifying '{name}' ({} channels)", spectrum.flux.len());

        let result = match classify(spectrum.flux.view(), &self.continuum_params) {
            Ok(r) => r,
            Err(err) => {
                if self.allow_degenerate {
                    if let Some(mask) = err.best_effort_mask() {
                        warn!("'{name}': {err}; writing the best-effort mask");
                        write_chanfile(&job.chanfile, mask)?;
                        let freq_ranges = self.freq_flags_for(job, &spectrum, mask)?;
                        return Ok(JobOutcome::Degenerate { name, freq_ranges });
                    }
                }
                return Err(AfoliRunError::Continuum { name, err });
            }
        };

        info!(
            "'{name}': continuum = {} +/- {}, {}/{} channels flagged",
            result.level,
            result.std,
            result.mask.num_flagged(),
            result.mask.len()
        );
        if !result.converged {
            warn!(
                "'{name}': clipping stopped after {} passes without converging",
                result.iterations
            );
        }
        debug!("'{name}' flagged ranges: {}", result.mask.to_casa_string(";"));
        write_chanfile(&job.chanfile, &result.mask)?;
        let freq_ranges = self.freq_flags_for(job, &spectrum, &result.mask)?;

        if !self.levels.is_empty() {
            let masks = level_masks(
                spectrum.flux.view(),
                &self.continuum_params,
                &result,
                &self.levels,
                self.level_mode,
            )
            .map_err(|err| AfoliRunError::Level {
                name: name.clone(),
                err,
            })?;
            for level_mask in masks {
                let path = level_chanfile_path(&job.chanfile, level_mask.level)?;
                debug!(
                    "'{name}' level {}: {}/{} channels flagged",
                    level_mask.level,
                    level_mask.mask.num_flagged(),
                    level_mask.mask.len()
                );
                write_chanfile(&path, &level_mask.mask)?;
                if let Some(plot) = &job.plot {
                    let plot = level_chanfile_path(plot, level_mask.level)?;
                    plot_level(spectrum.flux.view(), &level_mask, &name, &plot)?;
                }
            }
        }

        if let Some(plot) = &job.plot {
            plot_spectrum(spectrum.flux.view(), &result, &name, plot)?;
        }

        Ok(JobOutcome::Classified {
            num_flagged: result.mask.num_flagged(),
            num_chans: result.mask.len(),
            name,
            level: result.level,
            std: result.std,
            freq_ranges,
        })
    }
}

#[cfg(feature = "plotting")]
fn plot_spectrum(
    flux: ArrayView1<f64>,
    result: &Continuum,
    name: &str,
    path: &Path,
) -> Result<(), AfoliRunError> {
    crate::afoli::plot::plot_spectrum(flux, result, name, path)?;
    debug!("Wrote {}", path.display());
    Ok(())
}

#[cfg(feature = "plotting")]
fn plot_level(
    flux: ArrayView1<f64>,
    level_mask: &LevelMask,
    name: &str,
    path: &Path,
) -> Result<(), AfoliRunError> {
    crate::afoli::plot::plot_level(flux, level_mask, name, path)?;
    debug!("Wrote {}", path.display());
    Ok(())
}

// Plots are refused when the arguments are parsed.
#[cfg(not(feature = "plotting"))]
fn plot_spectrum(
    _flux: ArrayView1<f64>,
    _result: &Continuum,
    _name: &str,
    _path: &Path,
) -> Result<(), AfoliRunError> {
    Ok(())
}

#[cfg(not(feature = "plotting"))]
fn plot_level(
    _flux: ArrayView1<f64>,
    _level_mask: &LevelMask,
    _name: &str,
    _path: &Path,
) -> Result<(), AfoliRunError> {
    Ok(())
}

#[derive(Error, Debug)]
pub(crate) enum AfoliRunError {
    #[error("Couldn't read spectrum {}: {err}", .path.display())]
    Read {
        path: PathBuf,
        err: ReadSpectrumError,
    },

    #[error("Spectrum '{name}': {err}")]
    Continuum { name: String, err: ContinuumError },

    #[error("Spectrum '{name}': {err}")]
    Level { name: String, err: LevelError },

    #[error("Spectrum '{0}' has no frequency column, so frequency flags can't be written")]
    NoFrequencies(String),

    #[error("Spectrum '{name}': {err}")]
    FreqFlags { name: String, err: FreqRangeError },

    #[error("Couldn't read frequency flags {}: {err}", .path.display())]
    ReadFreqFlags {
        path: PathBuf,
        err: ReadFreqFlagsError,
    },

    #[error(transparent)]
    Write(#[from] WriteError),

    #[cfg(feature = "plotting")]
    #[error(transparent)]
    Draw(#[from] crate::afoli::plot::DrawError),
}
