// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use approx::assert_abs_diff_eq;

use super::*;

fn positions(coords: &[(f64, f64)]) -> Vec<PeakPosition> {
    coords.iter().map(|&(x, y)| PeakPosition::new(x, y)).collect()
}

#[test]
fn test_far_outlier_is_rejected() {
    let p = positions(&[(10.0, 10.0), (11.0, 9.0), (10.0, 11.0), (50.0, 50.0)]);
    let combined = combine(&p, OutlierPolicy::default()).unwrap();
    assert_eq!(combined.rejected, Some(3));
    assert_abs_diff_eq!(combined.position.x, 31.0 / 3.0, epsilon = 1e-12);
    assert_abs_diff_eq!(combined.position.y, 10.0, epsilon = 1e-12);

    // The order of the positions doesn't matter for a clear outlier.
    let p = positions(&[(50.0, 50.0), (10.0, 10.0), (11.0, 9.0), (10.0, 11.0)]);
    let combined = combine(&p, OutlierPolicy::default()).unwrap();
    assert_eq!(combined.rejected, Some(0));
    assert_abs_diff_eq!(combined.position.x, 31.0 / 3.0, epsilon = 1e-12);
}

#[test]
fn test_tight_cluster_keeps_everything() {
    // A square; every position is as far from the centroid as the others,
    // which is less than 3 times the side length.
    let p = positions(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]);
    let combined = combine(&p, OutlierPolicy::default()).unwrap();
    assert_eq!(combined.rejected, None);
    assert_abs_diff_eq!(combined.position.x, 0.5);
    assert_abs_diff_eq!(combined.position.y, 0.5);
}

#[test]
fn test_ties_reject_the_later_position() {
    let p = positions(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]);
    let combined = combine(&p, OutlierPolicy::Furthest).unwrap();
    assert_eq!(combined.rejected, Some(3));
    assert_abs_diff_eq!(combined.position.x, 2.0 / 3.0, epsilon = 1e-12);
    assert_abs_diff_eq!(combined.position.y, 1.0 / 3.0, epsilon = 1e-12);
}

#[test]
fn test_policies() {
    let p = positions(&[(10.0, 10.0), (11.0, 9.0), (10.0, 11.0), (50.0, 50.0)]);

    let combined = combine(&p, OutlierPolicy::Keep).unwrap();
    assert_eq!(combined.rejected, None);
    assert_abs_diff_eq!(combined.position.x, 20.25);
    assert_abs_diff_eq!(combined.position.y, 20.0);

    let combined = combine(&p, OutlierPolicy::Furthest).unwrap();
    assert_eq!(combined.rejected, Some(3));

    // A huge threshold keeps the outlier.
    let combined = combine(&p, OutlierPolicy::Threshold(1000.0)).unwrap();
    assert_eq!(combined.rejected, None);
}

#[test]
fn test_identical_positions() {
    let p = positions(&[(3.0, 4.0); 4]);
    for policy in [
        OutlierPolicy::default(),
        OutlierPolicy::Furthest,
        OutlierPolicy::Keep,
    ] {
        let combined = combine(&p, policy).unwrap();
        assert_eq!(combined.position, PeakPosition::new(3.0, 4.0));
        assert_eq!(combined.rejected, None);
    }
}

#[test]
fn test_three_positions() {
    // Two identical positions; any different position is "infinitely" far
    // away relative to their spread.
    let p = positions(&[(5.0, 5.0), (5.0, 5.0), (6.0, 5.0)]);
    let combined = combine(&p, OutlierPolicy::default()).unwrap();
    assert_eq!(combined.rejected, Some(2));
    assert_eq!(combined.position, PeakPosition::new(5.0, 5.0));
}

#[test]
fn test_errors() {
    let p = positions(&[(1.0, 1.0), (2.0, 2.0)]);
    assert_eq!(
        combine(&p, OutlierPolicy::default()),
        Err(CombinePeaksError::InsufficientSamples { found: 2 })
    );
    assert_eq!(
        combine(&[], OutlierPolicy::Keep),
        Err(CombinePeaksError::InsufficientSamples { found: 0 })
    );

    let p = positions(&[(1.0, 1.0), (2.0, f64::NAN), (3.0, 3.0)]);
    assert_eq!(
        combine(&p, OutlierPolicy::default()),
        Err(CombinePeaksError::MalformedInput { index: 1 })
    );

    let p = positions(&[(1.0, 1.0), (2.0, 2.0), (3.0, 3.0)]);
    assert_eq!(
        combine(&p, OutlierPolicy::Threshold(-1.0)),
        Err(CombinePeaksError::InvalidThreshold(-1.0))
    );
}
