// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Some helper mathematics. All statistics here are computed only over the
//! samples selected by a boolean mask (`true` = use the sample).


use ndarray::ArrayView1;

/// Iterate over the selected samples of `values`.
fn selected<'a>(
    values: ArrayView1<'a, f64>,
    selection: &'a [bool],
) -> impl Iterator<Item = f64> + 'a {
    values
        .into_iter()
        .zip(selection.iter())
        .filter(|(_, &s)| s)
        .map(|(&v, _)| v)
}

/// The number of selected samples.
pub(crate) fn num_selected(selection: &[bool]) -> usize {
    selection.iter().filter(|&&s| s).count()
}

/// The arithmetic mean of the selected samples. `None` if nothing is selected.
pub(crate) fn masked_mean(values: ArrayView1<f64>, selection: &[bool]) -> Option<f64> {
    let (n, sum) = selected(values.view(), selection)
        .fold((0_usize, 0.0), |(n, sum), v| (n + 1, sum + v));
    if n == 0 {
        None
    } else {
        Some(sum / n as f64)
    }
}

/// The number of selected samples, their mean and their population standard
/// deviation (i.e. normalised by N, not N - 1). A two-pass algorithm is used to
/// avoid cancellation with large continuum levels. `None` if fewer than
/// `min_samples` (and at least one) samples are selected.
pub(crate) fn masked_mean_std(
    values: ArrayView1<f64>,
    selection: &[bool],
    min_samples: usize,
) -> Option<(usize, f64, f64)> {
    let n = num_selected(selection);
    if n == 0 || n < min_samples {
        return None;
    }
    let mean = masked_mean(values, selection)?;
    let variance = selected(values.view(), selection)
        .map(|v| (v - mean).powi(2))
        .sum::<f64>()
        / n as f64;
    Some((n, mean, variance.sqrt()))
}

/// The median of the selected samples. For an even number of samples the mean
/// of the two middle values is used.
pub(crate) fn masked_median(values: ArrayView1<f64>, selection: &[bool]) -> Option<f64> {
    let mut v: Vec<f64> = selected(values.view(), selection).collect();
    median_in_place(&mut v)
}

/// The median of a scratch buffer; the buffer is reordered.
pub(crate) fn median_in_place(v: &mut [f64]) -> Option<f64> {
    if v.is_empty() {
        return None;
    }
    v.sort_unstable_by(|a, b| a.total_cmp(b));
    let mid = v.len() / 2;
    if v.len() % 2 == 0 {
        Some((v[mid - 1] + v[mid]) / 2.0)
    } else {
        Some(v[mid])
    }
}

/// Fit a least-squares line through the selected samples and return its value
/// at the centre of the band. The abscissa is the sample index shifted by half
/// the total number of samples, so the intercept *is* the band-centre value.
/// `None` if the fit is undetermined (fewer than two distinct abscissae).
pub(crate) fn masked_linregress_intercept(
    values: ArrayView1<f64>,
    selection: &[bool],
) -> Option<f64> {
    let centre = values.len() as f64 / 2.0;
    let points: Vec<(f64, f64)> = values
        .iter()
        .zip(selection.iter())
        .enumerate()
        .filter(|(_, (_, &s))| s)
        .map(|(i, (&v, _))| (i as f64 - centre, v))
        .collect();
    if points.len() < 2 {
        return None;
    }

    let n = points.len() as f64;
    let x_mean = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let y_mean = points.iter().map(|(_, y)| y).sum::<f64>() / n;
    let (sxy, sxx) = points.iter().fold((0.0, 0.0), |(sxy, sxx), (x, y)| {
        let dx = x - x_mean;
        (sxy + dx * (y - y_mean), sxx + dx * dx)
    });
    if sxx == 0.0 {
        return None;
    }
    let slope = sxy / sxx;
    Some(y_mean - slope * x_mean)
}
