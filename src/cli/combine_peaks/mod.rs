// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.


use std::{path::PathBuf, str::FromStr};

use clap::Parser;
use itertools::Itertools;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use thiserror::Error;

use super::common::{display_warnings, InfoPrinter, Warn, ARG_FILE_HELP};
use crate::{
    constants::DEFAULT_OUTLIER_THRESHOLD,
    params::CombinePeaksParams,
    peaks::{OutlierPolicy, OutlierPolicyKind},
    GocoError,
};

lazy_static::lazy_static! {
    static ref OUTLIER_POLICY_HELP: String =
        format!("What to do with the position furthest from the centroid: reject it beyond a threshold, always reject it (furthest) or never reject it (keep). Supported: {}. Default: {}", OutlierPolicyKind::iter().join(", "), OutlierPolicyKind::default());

    static ref THRESHOLD_HELP: String =
        format!("With the 'threshold' policy, the furthest position is rejected if its distance from the centroid is more than this many times the median distance between the other positions. Default: {DEFAULT_OUTLIER_THRESHOLD}");
}

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct CombinePeaksArgs {
    #[clap(name = "ARGUMENTS_FILE", help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    pub(super) args_file: Option<PathBuf>,

    /// A text file of peak positions, one "x y" pair per line.
    #[clap(short, long, help_heading = "INPUT FILES")]
    pub(super) input: Option<PathBuf>,

    /// Where to write the combined position.
    #[clap(short, long, help_heading = "OUTPUT FILES")]
    pub(super) output: Option<PathBuf>,

    #[clap(long, help = OUTLIER_POLICY_HELP.as_str(), help_heading = "OUTLIERS")]
    pub(super) outlier_policy: Option<String>,

    #[clap(long, help = THRESHOLD_HELP.as_str(), help_heading = "OUTLIERS")]
    pub(super) threshold: Option<f64>,

    /// Write the combined position as is, rather than rounded to whole pixels.
    #[clap(long, help_heading = "OUTPUT FILES")]
    #[serde(default)]
    pub(super) precise: bool,
}

impl CombinePeaksArgs {
    /// Consolidate the CLI arguments with those in the arguments file,
    /// preferring the CLI.
    pub(super) fn merge(self) -> Result<CombinePeaksArgs, GocoError> {
        debug!("Merging command-line arguments with the argument file");

        let cli_args = self;

        if let Some(arg_file) = cli_args.args_file {
            let CombinePeaksArgs {
                args_file: _,
                input,
                output,
                outlier_policy,
                threshold,
                precise,
            } = unpack_arg_file!(arg_file);

            Ok(CombinePeaksArgs {
                args_file: None,
                input: cli_args.input.or(input),
                output: cli_args.output.or(output),
                outlier_policy: cli_args.outlier_policy.or(outlier_policy),
                threshold: cli_args.threshold.or(threshold),
                precise: cli_args.precise || precise,
            })
        } else {
            Ok(cli_args)
        }
    }

    pub(super) fn parse(self) -> Result<CombinePeaksParams, CombinePeaksArgsError> {
        debug!("{:#?}", self);

        let Self {
            args_file: _,
            input,
            output,
            outlier_policy,
            threshold,
            precise,
        } = self;

        let input = input.ok_or(CombinePeaksArgsError::NoInput)?;
        let output = output.ok_or(CombinePeaksArgsError::NoOutput)?;
        let kind = match outlier_policy {
            Some(s) => OutlierPolicyKind::from_str(&s.to_lowercase())
                .map_err(|_| CombinePeaksArgsError::InvalidPolicy(s))?,
            None => OutlierPolicyKind::default(),
        };
        let policy = kind.with_threshold(threshold.unwrap_or(DEFAULT_OUTLIER_THRESHOLD));
        if threshold.is_some() && kind != OutlierPolicyKind::Threshold {
            "A threshold was given, but the outlier policy doesn't use one; ignoring".warn();
        }

        let mut printer = InfoPrinter::new("Combining peak positions".into());
        printer.push_line(format!("Input:  {}", input.display()).into());
        printer.push_line(format!("Output: {}", output.display()).into());
        printer.push_line(
            match policy {
                OutlierPolicy::Threshold(k) => {
                    format!("Rejecting the furthest position beyond {k} times the spread")
                }
                OutlierPolicy::Furthest => "Always rejecting the furthest position".to_string(),
                OutlierPolicy::Keep => "Keeping every position".to_string(),
            }
            .into(),
        );
        if precise {
            printer.push_line("Not rounding to whole pixels".into());
        }
        printer.display();
        display_warnings();

        Ok(CombinePeaksParams {
            input,
            output,
            policy,
            precise,
        })
    }

    pub(super) fn run(self, dry_run: bool) -> Result<(), GocoError> {
        let params = self.parse()?;

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        params.run()?;
        Ok(())
    }
}

#[derive(Error, Debug)]
pub(super) enum CombinePeaksArgsError {
    #[error("No input peak positions file was supplied")]
    NoInput,

    #[error("No output file was supplied")]
    NoOutput,

    #[error("Unrecognised outlier policy '{0}'. Supported: {}", OutlierPolicyKind::iter().join(", "))]
    InvalidPolicy(String),
}
