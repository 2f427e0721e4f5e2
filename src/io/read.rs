// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Parsing of spectrum and peak-position files.
//!
//! Both are plain text with whitespace-separated columns. Lines starting with
//! '#' and blank lines are ignored.

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use log::{debug, trace};
use ndarray::Array1;

use super::{ReadFreqFlagsError, ReadPeaksError, ReadSpectrumError, Spectrum};
use crate::{flagging::FreqRange, peaks::PeakPosition};

/// Is this line something that shouldn't be parsed?
fn is_ignorable(line: &str) -> bool {
    let line = line.trim();
    line.is_empty() || line.starts_with('#')
}

/// Parse a buffer containing a spectrum. With a single column, each line is
/// the flux of the next channel; otherwise the first column is the abscissa
/// (channel or frequency), the second is the flux and any others are ignored.
pub(crate) fn parse_spectrum<T: BufRead>(
    buf: &mut T,
    name: &str,
) -> Result<Spectrum, ReadSpectrumError> {
    let mut line = String::new();
    let mut line_num = 0;
    let mut num_columns = None;
    let mut freq = vec![];
    let mut flux = vec![];

    while buf.read_line(&mut line)? > 0 {
        line_num += 1;
        if is_ignorable(&line) {
            line.clear();
            continue;
        }

        let items: Vec<&str> = line.split_ascii_whitespace().collect();
        let expected = *num_columns.get_or_insert(items.len());
        if items.len() != expected {
            return Err(ReadSpectrumError::InconsistentColumns {
                line_num,
                expected,
                found: items.len(),
            });
        }
        let parse = |string: &str| {
            string
                .parse::<f64>()
                .map_err(|_| ReadSpectrumError::ParseFloat {
                    line_num,
                    string: string.to_string(),
                })
        };
        if expected == 1 {
            flux.push(parse(items[0])?);
        } else {
            freq.push(parse(items[0])?);
            flux.push(parse(items[1])?);
        }
        line.clear();
    }

    if flux.is_empty() {
        return Err(ReadSpectrumError::Empty(name.to_string()));
    }
    trace!(
        "Parsed {} channels from '{name}' ({} columns)",
        flux.len(),
        num_columns.unwrap_or(0)
    );
    Ok(Spectrum {
        name: name.to_string(),
        freq: (!freq.is_empty()).then(|| Array1::from(freq)),
        flux: Array1::from(flux),
    })
}

/// Read a spectrum file. The spectrum is named after the file stem.
pub fn read_spectrum(path: &Path) -> Result<Spectrum, ReadSpectrumError> {
    if !path.exists() {
        return Err(ReadSpectrumError::DoesNotExist(path.to_path_buf()));
    }
    debug!("Reading spectrum {}", path.display());
    let mut buf = BufReader::new(File::open(path)?);
    parse_spectrum(&mut buf, &spectrum_name(path))
}

/// The name given to the spectrum in a file: its stem.
pub(crate) fn spectrum_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Parse a buffer containing peak positions, one `x y` (or `x,y`) pair per
/// line.
pub(crate) fn parse_peaks<T: BufRead>(buf: &mut T) -> Result<Vec<PeakPosition>, ReadPeaksError> {
    let mut line = String::new();
    let mut line_num = 0;
    let mut positions = vec![];

    while buf.read_line(&mut line)? > 0 {
        line_num += 1;
        if is_ignorable(&line) {
            line.clear();
            continue;
        }

        let items: Vec<&str> = line
            .split(|c: char| c.is_ascii_whitespace() || c == ',')
            .filter(|s| !s.is_empty())
            .collect();
        if items.len() != 2 {
            return Err(ReadPeaksError::NotAPair {
                line_num,
                found: items.len(),
            });
        }
        let mut coords = [0.0; 2];
        for (coord, string) in coords.iter_mut().zip(items) {
            *coord = string.parse().map_err(|_| ReadPeaksError::ParseFloat {
                line_num,
                string: string.to_string(),
            })?;
        }
        positions.push(PeakPosition::new(coords[0], coords[1]));
        line.clear();
    }

    Ok(positions)
}

/// Read a peak positions file.
pub fn read_peaks(path: &Path) -> Result<Vec<PeakPosition>, ReadPeaksError> {
    if !path.exists() {
        return Err(ReadPeaksError::DoesNotExist(path.to_path_buf()));
    }
    debug!("Reading peak positions from {}", path.display());
    let mut buf = BufReader::new(File::open(path)?);
    parse_peaks(&mut buf)
}

/// Parse a buffer of frequency ranges like `230.1~230.2GHz`, one per line. The
/// unit is optional on each line, but if present must be `unit`.
pub(crate) fn parse_freq_flags<T: BufRead>(
    buf: &mut T,
    unit: &str,
) -> Result<Vec<FreqRange>, ReadFreqFlagsError> {
    let mut line = String::new();
    let mut line_num = 0;
    let mut ranges = vec![];

    while buf.read_line(&mut line)? > 0 {
        line_num += 1;
        if is_ignorable(&line) {
            line.clear();
            continue;
        }

        let trimmed = line.trim();
        let (low, high) = trimmed
            .split_once('~')
            .ok_or_else(|| ReadFreqFlagsError::Malformed {
                line_num,
                string: trimmed.to_string(),
            })?;
        let high = high.strip_suffix(unit).unwrap_or(high);
        let mut bounds = [0.0; 2];
        for (bound, string) in bounds.iter_mut().zip([low, high]) {
            *bound = string
                .trim()
                .parse()
                .map_err(|_| ReadFreqFlagsError::Malformed {
                    line_num,
                    string: trimmed.to_string(),
                })?;
        }
        ranges.push(FreqRange {
            low: bounds[0],
            high: bounds[1],
        });
        line.clear();
    }

    Ok(ranges)
}

/// Read a frequency flags file written by [`super::write_freq_flags`].
pub fn read_freq_flags(path: &Path, unit: &str) -> Result<Vec<FreqRange>, ReadFreqFlagsError> {
    if !path.exists() {
        return Err(ReadFreqFlagsError::DoesNotExist(path.to_path_buf()));
    }
    debug!("Reading frequency flags from {}", path.display());
    let mut buf = BufReader::new(File::open(path)?);
    parse_freq_flags(&mut buf, unit)
}
