// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Writing channel files, frequency flags, peak positions and result tables.

use std::{
    fs::{File, OpenOptions},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use log::trace;

use super::WriteError;
use crate::{
    flagging::{ChannelMask, FreqRange},
    peaks::PeakPosition,
};

fn file_error(path: &Path) -> impl FnOnce(std::io::Error) -> WriteError + '_ {
    move |err| WriteError::File {
        path: path.to_path_buf(),
        err,
    }
}

/// Write the continuum ranges of `mask` to a channel file.
pub fn write_chanfile(path: &Path, mask: &ChannelMask) -> Result<(), WriteError> {
    trace!("Writing channel file {}", path.display());
    let mut f = BufWriter::new(File::create(path).map_err(file_error(path))?);
    writeln!(f, "{}", mask.to_chanfile_string()).map_err(file_error(path))?;
    f.flush().map_err(file_error(path))?;
    Ok(())
}

/// Write flagged frequency ranges, one per line, in CASA notation.
pub fn write_freq_flags(path: &Path, ranges: &[FreqRange], unit: &str) -> Result<(), WriteError> {
    trace!("Writing frequency flags {}", path.display());
    let mut f = BufWriter::new(File::create(path).map_err(file_error(path))?);
    for range in ranges {
        writeln!(f, "{}", range.to_casa_string(unit)).map_err(file_error(path))?;
    }
    f.flush().map_err(file_error(path))?;
    Ok(())
}

/// Write the flagged frequency ranges of many spectra to a single file. Each
/// spectrum's ranges follow a "name:" line.
pub fn write_joined_freq_flags(
    path: &Path,
    flags: &[(String, Vec<FreqRange>)],
    unit: &str,
) -> Result<(), WriteError> {
    trace!("Writing joined frequency flags {}", path.display());
    let mut f = BufWriter::new(File::create(path).map_err(file_error(path))?);
    for (name, ranges) in flags {
        writeln!(f, "{name}:").map_err(file_error(path))?;
        for range in ranges {
            writeln!(f, "{}", range.to_casa_string(unit)).map_err(file_error(path))?;
        }
    }
    f.flush().map_err(file_error(path))?;
    Ok(())
}

/// The channel file for a contamination level sits beside the main one, with
/// the level inserted before the extension, e.g. "a.chans.txt" becomes
/// "a.chans.0.05.txt".
pub fn level_chanfile_path(path: &Path, level: f64) -> Result<PathBuf, WriteError> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| WriteError::BadPath {
            path: path.to_path_buf(),
            level,
        })?;
    let file_name = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}.{level}.{ext}"),
        None => format!("{stem}.{level}"),
    };
    Ok(path.with_file_name(file_name))
}

/// Write a combined peak position. Unless `precise` is set, the coordinates
/// are rounded to whole pixels (ties to even).
pub fn write_peak(path: &Path, position: &PeakPosition, precise: bool) -> Result<(), WriteError> {
    trace!("Writing peak position to {}", path.display());
    let (x, y) = if precise {
        (position.x, position.y)
    } else {
        (position.x.round_ties_even(), position.y.round_ties_even())
    };
    let mut f = File::create(path).map_err(file_error(path))?;
    writeln!(f, "{x} {y}").map_err(file_error(path))?;
    Ok(())
}

/// Append a row describing a classified spectrum to a tab-separated table,
/// creating the table if necessary.
pub fn append_table_row(
    path: &Path,
    name: &str,
    level: f64,
    std: f64,
    num_flagged: usize,
    num_chans: usize,
) -> Result<(), WriteError> {
    let mut f = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(file_error(path))?;
    writeln!(
        f,
        "{name}\t{level:10.6}\t{std:10.6}\t{num_flagged:10}\t{num_chans:10}"
    )
    .map_err(file_error(path))?;
    Ok(())
}
