// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.


use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    str::FromStr,
};

use clap::Parser;
use itertools::Itertools;
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use thiserror::Error;
use vec1::Vec1;

use super::common::{display_warnings, InfoPrinter, Warn, ARG_FILE_HELP};
use crate::{
    afoli::{levels::LevelMode, CenStat, ContinuumParams},
    constants::*,
    flagging::{parse_chan_ranges, ChanRangeError},
    params::{AfoliParams, SpectrumJob},
    GocoError,
};

lazy_static::lazy_static! {
    static ref CENSTAT_HELP: String =
        format!("The statistic clipping limits are measured from. Supported: {}. Default: {}", CenStat::iter().join(", "), CenStat::default());

    static ref LEVEL_MODE_HELP: String =
        format!("How the continuum is determined for levels falling between clipping steps. Supported: {}. Default: {}", LevelMode::iter().join(", "), LevelMode::default());

    static ref CHANFILES_HELP: String =
        format!("Paths to the output channel files, one per spectrum. Default: the spectrum's path with its extension replaced by '{DEFAULT_CHANFILE_SUFFIX}'");

    static ref FREQ_FLAGS_HELP: String =
        format!("Also write the flagged frequency ranges of each spectrum, padded by half a channel, to '<spectrum stem>{DEFAULT_FREQ_FLAGS_SUFFIX}' beside its channel file. The first column of each spectrum file is taken as the frequency");

    static ref FREQ_UNIT_HELP: String =
        format!("The unit of the spectra's frequency column, written after each frequency range. Default: {DEFAULT_FREQ_UNIT}");

    static ref SIGMA_LOWER_HELP: String =
        format!("Channels this many standard deviations below the centre are flagged. Default: {DEFAULT_SIGMA_LOWER}");

    static ref SIGMA_UPPER_HELP: String =
        format!("Channels this many standard deviations above the centre are flagged. Default: {DEFAULT_SIGMA_UPPER}");

    static ref EDGE_WIDTH_HELP: String =
        format!("The number of channels always flagged at each end of a spectrum. Default: {DEFAULT_EDGE_WIDTH}");

    static ref MIN_WIDTH_HELP: String =
        format!("Flagged bands narrower than this many channels are treated as noise and unflagged. Default: {DEFAULT_MIN_WIDTH}");
}

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct AfoliArgs {
    #[clap(name = "ARGUMENTS_FILE", help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    pub(super) args_file: Option<PathBuf>,

    /// Paths to the spectrum files. Each file has either one column (flux) or
    /// at least two (channel or frequency, then flux).
    #[clap(short, long, multiple_values(true), help_heading = "INPUT FILES")]
    pub(super) spectra: Option<Vec<PathBuf>>,

    #[clap(short = 'o', long, multiple_values(true), help = CHANFILES_HELP.as_str(), help_heading = "OUTPUT FILES")]
    pub(super) chanfiles: Option<Vec<PathBuf>>,

    /// Append a row of results (name, continuum, std. dev., number of flagged
    /// channels, number of channels) per spectrum to this file.
    #[clap(long, help_heading = "OUTPUT FILES")]
    pub(super) table: Option<PathBuf>,

    /// Plot each classified spectrum to a PNG next to its channel file. Only
    /// available if compiled with the "plotting" feature.
    #[clap(long, help_heading = "OUTPUT FILES")]
    #[serde(default)]
    pub(super) plot: bool,

    /// Skip spectra whose channel files already exist.
    #[clap(long, help_heading = "OUTPUT FILES")]
    #[serde(default)]
    pub(super) resume: bool,

    #[clap(long, help = FREQ_FLAGS_HELP.as_str(), help_heading = "FREQUENCY FLAGS")]
    #[serde(default)]
    pub(super) freq_flags: bool,

    /// Write the flagged frequency ranges of every spectrum to this file, each
    /// spectrum's ranges after a "name:" line. Implies --freq-flags.
    #[clap(long, help_heading = "FREQUENCY FLAGS")]
    pub(super) joined_freq_flags: Option<PathBuf>,

    #[clap(long, help = FREQ_UNIT_HELP.as_str(), help_heading = "FREQUENCY FLAGS")]
    pub(super) freq_unit: Option<String>,

    #[clap(long, help = SIGMA_LOWER_HELP.as_str(), help_heading = "CLIPPING")]
    pub(super) sigma_lower: Option<f64>,

    #[clap(long, help = SIGMA_UPPER_HELP.as_str(), help_heading = "CLIPPING")]
    pub(super) sigma_upper: Option<f64>,

    #[clap(long, help = CENSTAT_HELP.as_str(), help_heading = "CLIPPING")]
    pub(super) censtat: Option<String>,

    /// The maximum number of clipping passes. The default is to clip until no
    /// more channels are flagged.
    #[clap(long, help_heading = "CLIPPING")]
    pub(super) max_iterations: Option<usize>,

    /// If too few channels remain to compute statistics, write the last good
    /// mask rather than failing.
    #[clap(long, help_heading = "CLIPPING")]
    #[serde(default)]
    pub(super) allow_degenerate: bool,

    #[clap(long, help = EDGE_WIDTH_HELP.as_str(), help_heading = "FLAGGING")]
    pub(super) edge_width: Option<usize>,

    /// Channel ranges to always flag, e.g. "0~10 20~25;30".
    #[clap(long, help_heading = "FLAGGING")]
    pub(super) flag_chans: Option<String>,

    /// Channels with exactly this flux are always flagged. May be given
    /// multiple times.
    #[clap(long, allow_hyphen_values = true, help_heading = "FLAGGING")]
    pub(super) invalid_values: Option<Vec<f64>>,

    #[clap(long, help = MIN_WIDTH_HELP.as_str(), help_heading = "FLAGGING")]
    pub(super) min_width: Option<usize>,

    /// Grow flagged bands by this many channels on each side. Default: 0
    #[clap(long, help_heading = "FLAGGING")]
    pub(super) dilate: Option<usize>,

    /// Also flag continuum gaps of at most this many channels between flagged
    /// bands. Default: 0 (disabled)
    #[clap(long, help_heading = "FLAGGING")]
    pub(super) min_gap: Option<usize>,

    /// Also write channel files for these levels of continuum contamination,
    /// e.g. 0.03 0.05.
    #[clap(long, multiple_values(true), help_heading = "LEVELS")]
    pub(super) levels: Option<Vec<f64>>,

    #[clap(long, help = LEVEL_MODE_HELP.as_str(), help_heading = "LEVELS")]
    pub(super) level_mode: Option<String>,
}

impl AfoliArgs {
    /// Both command-line and file arguments overlap in terms of what is
    /// available; this function consolidates everything that was specified into
    /// a single struct. Where applicable, it will prefer CLI parameters over
    /// those in the file.
    ///
    /// This function should only ever merge arguments, and not try to make
    /// sense of them.
    pub(super) fn merge(self) -> Result<AfoliArgs, GocoError> {
        debug!("Merging command-line arguments with the argument file");

        let cli_args = self;

        if let Some(arg_file) = cli_args.args_file {
            // Ensure all of the file args are accounted for by pattern
            // matching.
            let AfoliArgs {
                args_file: _,
                spectra,
                chanfiles,
                table,
                plot,
                resume,
                freq_flags,
                joined_freq_flags,
                freq_unit,
                sigma_lower,
                sigma_upper,
                censtat,
                max_iterations,
                allow_degenerate,
                edge_width,
                flag_chans,
                invalid_values,
                min_width,
                dilate,
                min_gap,
                levels,
                level_mode,
            } = unpack_arg_file!(arg_file);

            Ok(AfoliArgs {
                args_file: None,
                spectra: cli_args.spectra.or(spectra),
                chanfiles: cli_args.chanfiles.or(chanfiles),
                table: cli_args.table.or(table),
                plot: cli_args.plot || plot,
                resume: cli_args.resume || resume,
                freq_flags: cli_args.freq_flags || freq_flags,
                joined_freq_flags: cli_args.joined_freq_flags.or(joined_freq_flags),
                freq_unit: cli_args.freq_unit.or(freq_unit),
                sigma_lower: cli_args.sigma_lower.or(sigma_lower),
                sigma_upper: cli_args.sigma_upper.or(sigma_upper),
                censtat: cli_args.censtat.or(censtat),
                max_iterations: cli_args.max_iterations.or(max_iterations),
                allow_degenerate: cli_args.allow_degenerate || allow_degenerate,
                edge_width: cli_args.edge_width.or(edge_width),
                flag_chans: cli_args.flag_chans.or(flag_chans),
                invalid_values: cli_args.invalid_values.or(invalid_values),
                min_width: cli_args.min_width.or(min_width),
                dilate: cli_args.dilate.or(dilate),
                min_gap: cli_args.min_gap.or(min_gap),
                levels: cli_args.levels.or(levels),
                level_mode: cli_args.level_mode.or(level_mode),
            })
        } else {
            Ok(cli_args)
        }
    }

    pub(super) fn parse(self) -> Result<AfoliParams, AfoliArgsError> {
        debug!("{:#?}", self);

        let Self {
            args_file: _,
            spectra,
            chanfiles,
            table,
            plot,
            resume,
            freq_flags,
            joined_freq_flags,
            freq_unit,
            sigma_lower,
            sigma_upper,
            censtat,
            max_iterations,
            allow_degenerate,
            edge_width,
            flag_chans,
            invalid_values,
            min_width,
            dilate,
            min_gap,
            levels,
            level_mode,
        } = self;

        let spectra = spectra.unwrap_or_default();
        if spectra.is_empty() {
            return Err(AfoliArgsError::NoSpectra);
        }
        let chanfiles = match chanfiles {
            Some(chanfiles) => {
                if chanfiles.len() != spectra.len() {
                    return Err(AfoliArgsError::ChanfileCountMismatch {
                        num_spectra: spectra.len(),
                        num_chanfiles: chanfiles.len(),
                    });
                }
                chanfiles
            }
            None => spectra.iter().map(|s| default_chanfile(s)).collect(),
        };
        let mut seen = HashSet::new();
        for chanfile in &chanfiles {
            if !seen.insert(chanfile) {
                return Err(AfoliArgsError::DuplicateChanfile(chanfile.clone()));
            }
        }
        let freq_flags_files: Vec<Option<PathBuf>> = if freq_flags || joined_freq_flags.is_some() {
            let files: Vec<PathBuf> = spectra
                .iter()
                .zip(&chanfiles)
                .map(|(spectrum, chanfile)| freq_flags_file(spectrum, chanfile))
                .collect();
            let mut seen = HashSet::new();
            for file in &files {
                if !seen.insert(file) {
                    return Err(AfoliArgsError::DuplicateFreqFlags(file.clone()));
                }
            }
            files.into_iter().map(Some).collect()
        } else {
            vec![None; spectra.len()]
        };
        let freq_unit = freq_unit.unwrap_or_else(|| DEFAULT_FREQ_UNIT.to_string());

        #[cfg(not(feature = "plotting"))]
        if plot {
            return Err(AfoliArgsError::NoPlottingFeature);
        }

        let jobs = spectra
            .into_iter()
            .zip(chanfiles)
            .zip(freq_flags_files)
            .map(|((spectrum, chanfile), freq_flags)| SpectrumJob {
                plot: plot.then(|| chanfile.with_extension("png")),
                spectrum,
                chanfile,
                freq_flags,
            })
            .collect::<Vec<_>>();
        let jobs = Vec1::try_from_vec(jobs).map_err(|_| AfoliArgsError::NoSpectra)?;

        let censtat = match censtat {
            Some(s) => CenStat::from_str(&s.to_lowercase())
                .map_err(|_| AfoliArgsError::InvalidCenStat(s))?,
            None => CenStat::default(),
        };
        let level_mode = match level_mode {
            Some(s) => LevelMode::from_str(&s.to_lowercase())
                .map_err(|_| AfoliArgsError::InvalidLevelMode(s))?,
            None => LevelMode::default(),
        };
        let levels = levels.unwrap_or_default();
        if let Some(&l) = levels.iter().find(|l| !l.is_finite()) {
            return Err(AfoliArgsError::InvalidLevel(l));
        }
        let flag_chans = match flag_chans {
            Some(s) => parse_chan_ranges(&s)?,
            None => vec![],
        };

        let continuum_params = ContinuumParams {
            sigma_lower: sigma_lower.unwrap_or(DEFAULT_SIGMA_LOWER),
            sigma_upper: sigma_upper.unwrap_or(DEFAULT_SIGMA_UPPER),
            censtat,
            max_iterations,
            edge_width: edge_width.unwrap_or(DEFAULT_EDGE_WIDTH),
            flag_chans,
            invalid_values: invalid_values.unwrap_or_default(),
            dilate: dilate.unwrap_or(DEFAULT_DILATE),
            min_gap: min_gap.unwrap_or(DEFAULT_MIN_GAP),
            min_width: min_width.unwrap_or(DEFAULT_MIN_WIDTH),
        };

        if continuum_params.min_width == 0 {
            "A minimum width of 0 keeps every flagged band, including single channels".warn();
        }
        if let Some(table) = &table {
            if table.exists() {
                format!("Appending results to existing table {}", table.display()).warn();
            }
        }

        let mut printer = InfoPrinter::new("Continuum finding".into());
        printer.push_line(format!("{} spectra", jobs.len()).into());
        printer.push_block(vec![
            format!(
                "Sigma lower: {}, upper: {}",
                continuum_params.sigma_lower, continuum_params.sigma_upper
            )
            .into(),
            format!("Centre statistic: {}", continuum_params.censtat).into(),
            match continuum_params.max_iterations {
                Some(m) => format!("At most {m} clipping passes").into(),
                None => "Clipping until convergence".into(),
            },
        ]);
        let mut flagging = vec![
            format!("Edge width: {}", continuum_params.edge_width).into(),
            format!("Minimum width: {}", continuum_params.min_width).into(),
        ];
        if continuum_params.dilate > 0 {
            flagging.push(format!("Dilating by {}", continuum_params.dilate).into());
        }
        if continuum_params.min_gap > 0 {
            flagging.push(format!("Flagging gaps up to {}", continuum_params.min_gap).into());
        }
        if !continuum_params.flag_chans.is_empty() {
            flagging.push(
                format!(
                    "Flagged channels: {}",
                    continuum_params.flag_chans.iter().join(" ")
                )
                .into(),
            );
        }
        printer.push_block(flagging);
        if !levels.is_empty() {
            printer.push_line(
                format!("Levels: {} ({level_mode})", levels.iter().join(", ")).into(),
            );
        }
        if jobs.iter().any(|job| job.freq_flags.is_some()) {
            let mut block = vec![format!("Writing frequency flags ({freq_unit})").into()];
            if let Some(joined) = &joined_freq_flags {
                block.push(format!("Joined into {}", joined.display()).into());
            }
            printer.push_block(block);
        }
        printer.display();
        display_warnings();

        Ok(AfoliParams {
            jobs,
            continuum_params,
            levels,
            level_mode,
            table,
            joined_freq_flags,
            freq_unit,
            resume,
            allow_degenerate,
        })
    }

    pub(super) fn run(self, dry_run: bool) -> Result<(), GocoError> {
        debug!("Converting arguments into parameters");
        trace!("{:#?}", self);
        let params = self.parse()?;

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        params.run()?;
        Ok(())
    }
}

/// The spectrum's path with its extension replaced by the chanfile suffix.
fn default_chanfile(spectrum: &Path) -> PathBuf {
    let stem = spectrum
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "spectrum".to_string());
    spectrum.with_file_name(format!("{stem}{DEFAULT_CHANFILE_SUFFIX}"))
}

/// The frequency flags file of a spectrum: named after the spectrum, in the
/// channel file's directory.
fn freq_flags_file(spectrum: &Path, chanfile: &Path) -> PathBuf {
    let stem = spectrum
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "spectrum".to_string());
    chanfile.with_file_name(format!("{stem}{DEFAULT_FREQ_FLAGS_SUFFIX}"))
}

#[derive(Error, Debug)]
pub(super) enum AfoliArgsError {
    #[error("No spectra were supplied")]
    NoSpectra,

    #[error("{num_spectra} spectra were supplied, but {num_chanfiles} channel files")]
    ChanfileCountMismatch {
        num_spectra: usize,
        num_chanfiles: usize,
    },

    #[error("Channel file {} would be written more than once", .0.display())]
    DuplicateChanfile(PathBuf),

    #[error("Frequency flags file {} would be written more than once; spectra in the same directory need different stems", .0.display())]
    DuplicateFreqFlags(PathBuf),

    #[error("Unrecognised centre statistic '{0}'. Supported: {}", CenStat::iter().join(", "))]
    InvalidCenStat(String),

    #[error("Unrecognised level mode '{0}'. Supported: {}", LevelMode::iter().join(", "))]
    InvalidLevelMode(String),

    #[error("Contamination level {0} is not a finite number")]
    InvalidLevel(f64),

    #[error(transparent)]
    FlagChans(#[from] ChanRangeError),

    #[cfg(not(feature = "plotting"))]
    #[error("goco was not compiled with the \"plotting\" feature.\nYou need to compile goco from source with this feature to plot spectra.")]
    NoPlottingFeature,
}
