// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Code to plot a classified spectrum and its clip history.

use std::{ops::Range, path::Path};

use log::trace;
use ndarray::ArrayView1;
use plotters::{
    coord::Shift,
    prelude::*,
    style::{Color, RGBAColor},
};
use thiserror::Error;

use super::{levels::LevelMask, ClipState, Continuum};
use crate::flagging::ChannelMask;

/// The number of X pixels on the plots.
const X_PIXELS: u32 = 1600;
/// The number of Y pixels on the plots.
const Y_PIXELS: u32 = 900;
/// The number of Y pixels given to the clip history above the spectrum.
const HISTORY_PIXELS: u32 = 350;

lazy_static::lazy_static! {
    static ref FLAGGED: RGBAColor = RED.mix(0.15);
}

/// One point of the clip history as drawn: the percentage of channels still
/// unflagged, the mean relative to the continuum level and the std. dev.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct HistoryPoint {
    pub(crate) percent_unflagged: f64,
    pub(crate) relative_mean: f64,
    pub(crate) std: f64,
}

/// The clip history of `result` as plot points. Means are divided by the
/// continuum level unless it is zero.
pub(crate) fn history_points(result: &Continuum) -> Vec<HistoryPoint> {
    let num_chans = result.mask.len() as f64;
    let norm = if result.level == 0.0 { 1.0 } else { result.level };
    result
        .steps
        .iter()
        .map(|s: &ClipState| HistoryPoint {
            percent_unflagged: 100.0 * s.num_unflagged as f64 / num_chans,
            relative_mean: s.mean / norm,
            std: s.std,
        })
        .collect()
}

/// The percentage change of the mean between consecutive clipping steps,
/// relative to the larger of the two means.
pub(crate) fn percent_changes(steps: &[ClipState]) -> Vec<f64> {
    steps
        .windows(2)
        .map(|w| {
            let larger = w[0].mean.max(w[1].mean);
            if larger == 0.0 {
                0.0
            } else {
                100.0 * (w[0].mean - w[1].mean).abs() / larger
            }
        })
        .collect()
}

/// A range covering `values` with 5% padding. A constant (or empty) set of
/// values still gets a non-zero range.
fn padded_range<I: IntoIterator<Item = f64>>(values: I) -> Range<f64> {
    let (min, max) = values
        .into_iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(acc_min, acc_max), v| {
            (acc_min.min(v), acc_max.max(v))
        });
    if !min.is_finite() || !max.is_finite() {
        return 0.0..1.0;
    }
    let pad = if (max - min).abs() < f64::EPSILON {
        min.abs().max(1.0) * 0.05
    } else {
        0.05 * (max - min)
    };
    (min - pad)..(max + pad)
}

/// Plot the spectrum `flux` to a PNG at `path`. The top panel shows the clip
/// history (mean relative to the continuum and std. dev. against the
/// percentage of unflagged channels, labelled with the percentage change of
/// the mean). Below it, flagged channels are shaded and the continuum level is
/// drawn with its standard deviation.
pub fn plot_spectrum(
    flux: ArrayView1<f64>,
    result: &Continuum,
    title: &str,
    path: &Path,
) -> Result<(), DrawError> {
    trace!("Plotting '{}' to {}", title, path.display());
    let root_area = BitMapBackend::new(path, (X_PIXELS, Y_PIXELS)).into_drawing_area();
    root_area
        .fill(&WHITE)
        .map_err(|e| DrawError::Plotters(Box::new(e)))?;
    let (history_area, spectrum_area) = root_area.split_vertically(HISTORY_PIXELS);

    draw_history(&history_area, result, title)?;
    draw_spectrum(
        &spectrum_area,
        flux,
        &result.mask,
        result.level,
        result.std,
        None,
    )?;

    root_area
        .present()
        .map_err(|e| DrawError::Plotters(Box::new(e)))?;
    Ok(())
}

/// Plot the spectrum `flux` with the mask and continuum of a single
/// contamination level.
pub fn plot_level(
    flux: ArrayView1<f64>,
    level_mask: &LevelMask,
    title: &str,
    path: &Path,
) -> Result<(), DrawError> {
    trace!(
        "Plotting '{}' level {} to {}",
        title,
        level_mask.level,
        path.display()
    );
    let root_area = BitMapBackend::new(path, (X_PIXELS, Y_PIXELS)).into_drawing_area();
    root_area
        .fill(&WHITE)
        .map_err(|e| DrawError::Plotters(Box::new(e)))?;

    let caption = format!("{title} (level {})", level_mask.level);
    draw_spectrum(
        &root_area,
        flux,
        &level_mask.mask,
        level_mask.continuum,
        level_mask.std,
        Some(&caption),
    )?;

    root_area
        .present()
        .map_err(|e| DrawError::Plotters(Box::new(e)))?;
    Ok(())
}

fn draw_history<DB: DrawingBackend>(
    drawing_area: &DrawingArea<DB, Shift>,
    result: &Continuum,
    title: &str,
) -> Result<(), DrawError> {
    let points = history_points(result);
    let final_percent = 100.0 * result.mask.num_continuum() as f64 / result.mask.len() as f64;
    let x_range = padded_range(
        points
            .iter()
            .map(|p| p.percent_unflagged)
            .chain([final_percent, 100.0]),
    );
    let mean_range = padded_range(points.iter().map(|p| p.relative_mean).chain([1.0]));
    let std_range = padded_range(points.iter().map(|p| p.std).chain([result.std]));

    let mut cc = ChartBuilder::on(drawing_area)
        .caption(
            format!("{title}: continuum = {}", result.level),
            ("sans-serif", 40),
        )
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(90)
        .right_y_label_area_size(90)
        .build_cartesian_2d(x_range.clone(), mean_range)
        .map_err(|e| DrawError::History(e.to_string()))?
        .set_secondary_coord(x_range, std_range);
    cc.configure_mesh()
        .light_line_style(&WHITE)
        .x_desc(format!(
            "% of channels (continuum = {})",
            result.mask.num_continuum()
        ))
        .y_desc("Mean / Continuum")
        .draw()
        .map_err(|e| DrawError::History(e.to_string()))?;
    cc.configure_secondary_axes()
        .y_desc("Standard deviation")
        .draw()
        .map_err(|e| DrawError::History(e.to_string()))?;

    cc.draw_series(PointSeries::of_element(
        points.iter().map(|p| (p.percent_unflagged, p.relative_mean)),
        10,
        BLUE.stroke_width(2),
        &|coord, size, style| EmptyElement::at(coord) + Cross::new((0, 0), size, style),
    ))
    .map_err(|e| DrawError::History(e.to_string()))?;
    cc.draw_series(PointSeries::of_element(
        [(final_percent, 1.0)],
        6,
        BLUE.filled(),
        &|coord, size, style| EmptyElement::at(coord) + Circle::new((0, 0), size, style),
    ))
    .map_err(|e| DrawError::History(e.to_string()))?;

    cc.draw_secondary_series(PointSeries::of_element(
        points.iter().map(|p| (p.percent_unflagged, p.std)),
        10,
        RED.stroke_width(2),
        &|coord, size, style| EmptyElement::at(coord) + Cross::new((0, 0), size, style),
    ))
    .map_err(|e| DrawError::History(e.to_string()))?;
    cc.draw_secondary_series(PointSeries::of_element(
        [(final_percent, result.std)],
        6,
        RED.filled(),
        &|coord, size, style| EmptyElement::at(coord) + Circle::new((0, 0), size, style),
    ))
    .map_err(|e| DrawError::History(e.to_string()))?;

    // Label the change of the mean halfway between consecutive steps.
    cc.draw_series(
        points
            .windows(2)
            .zip(percent_changes(&result.steps))
            .map(|(w, change)| {
                let coord = (
                    0.5 * (w[0].percent_unflagged + w[1].percent_unflagged),
                    0.5 * (w[0].relative_mean + w[1].relative_mean),
                );
                EmptyElement::at(coord)
                    + Text::new(
                        format!("{change:.1}"),
                        (0, -20),
                        ("sans-serif", 18).into_font(),
                    )
            }),
    )
    .map_err(|e| DrawError::History(e.to_string()))?;

    Ok(())
}

fn draw_spectrum<DB: DrawingBackend>(
    drawing_area: &DrawingArea<DB, Shift>,
    flux: ArrayView1<f64>,
    mask: &ChannelMask,
    level: f64,
    std: f64,
    caption: Option<&str>,
) -> Result<(), DrawError> {
    let num_chans = flux.len();
    let y_range = padded_range(flux.iter().copied().chain([level - std, level + std]));
    let (y_min, y_max) = (y_range.start, y_range.end);

    let mut builder = ChartBuilder::on(drawing_area);
    if let Some(caption) = caption {
        builder.caption(caption, ("sans-serif", 40));
    }
    let mut cc = builder
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(90)
        .right_y_label_area_size(90)
        .build_cartesian_2d(0.0..num_chans as f64, y_range)
        .map_err(|e| DrawError::Spectrum(e.to_string()))?;
    cc.configure_mesh()
        .light_line_style(&WHITE)
        .x_desc("Channel")
        .y_desc("Flux")
        .draw()
        .map_err(|e| DrawError::Spectrum(e.to_string()))?;

    // Each flagged channel covers [chan, chan + 1) on the x axis.
    cc.draw_series(mask.flagged_ranges().into_iter().map(|r| {
        Rectangle::new(
            [(r.start as f64, y_min), ((r.end + 1) as f64, y_max)],
            FLAGGED.filled(),
        )
    }))
    .map_err(|e| DrawError::Spectrum(e.to_string()))?;

    cc.draw_series(LineSeries::new(
        flux.iter()
            .enumerate()
            .map(|(i, &f)| (i as f64 + 0.5, f)),
        &BLACK,
    ))
    .map_err(|e| DrawError::Spectrum(e.to_string()))?;

    for (y, style) in [
        (level, BLUE.stroke_width(2)),
        (level + std, BLUE.mix(0.4).stroke_width(1)),
        (level - std, BLUE.mix(0.4).stroke_width(1)),
    ] {
        cc.draw_series(LineSeries::new(
            [(0.0, y), (num_chans as f64, y)],
            style,
        ))
        .map_err(|e| DrawError::Continuum(e.to_string()))?;
    }

    Ok(())
}

#[derive(Error, Debug)]
pub enum DrawError {
    #[error("While plotting the clip history: {0}")]
    History(String),

    #[error("While plotting the spectrum: {0}")]
    Spectrum(String),

    #[error("While plotting the continuum level: {0}")]
    Continuum(String),

    #[error("Error from the plotters library: {0}")]
    Plotters(Box<dyn std::error::Error + Send + Sync>),
}
