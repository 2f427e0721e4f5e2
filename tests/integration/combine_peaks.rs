// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tests against the command-line interface for combine-peaks.

use std::fs::read_to_string;

use indoc::indoc;
use tempfile::TempDir;

use crate::*;

const PEAKS: &str = indoc! {"
    # x y, one spectral window per line
    10 10
    11 9
    10 11
    50 50
"};

#[test]
fn test_combine_peaks_rejects_the_outlier() {
    let dir = TempDir::new().unwrap();
    let input = make_file_in_dir("peaks.txt", dir.path(), PEAKS);
    let output = dir.path().join("peak.txt");

    let cmd = goco()
        .args([
            "combine-peaks",
            "-i",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ])
        .ok();
    let ok = cmd.is_ok();
    let (stdout, stderr) = get_cmd_output(cmd);
    assert!(ok, "combine-peaks failed:\n{stdout}\n{stderr}");
    assert!(stdout.contains("Rejected position 3"), "{stdout}");
    assert_eq!(read_to_string(&output).unwrap(), "10 10\n");
}

#[test]
fn test_combine_peaks_keep() {
    let dir = TempDir::new().unwrap();
    let input = make_file_in_dir("peaks.txt", dir.path(), PEAKS);
    let output = dir.path().join("peak.txt");

    let cmd = goco()
        .args([
            "combine-peaks",
            "-i",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--outlier-policy",
            "keep",
            "--precise",
        ])
        .ok();
    let ok = cmd.is_ok();
    let (stdout, stderr) = get_cmd_output(cmd);
    assert!(ok, "combine-peaks failed:\n{stdout}\n{stderr}");
    assert_eq!(read_to_string(&output).unwrap(), "20.25 20\n");
}

#[test]
fn test_combine_peaks_needs_three_positions() {
    let dir = TempDir::new().unwrap();
    let input = make_file_in_dir("peaks.txt", dir.path(), "1 1\n2 2\n");
    let output = dir.path().join("peak.txt");

    let cmd = goco()
        .args([
            "combine-peaks",
            "-i",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.starts_with("Error:"), "{stderr}");
    assert!(stderr.contains("goco combine-peaks --help"), "{stderr}");
    assert!(!output.exists());
}
