// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tests against the command-line interface for afoli.

use std::fs::read_to_string;

use itertools::Itertools;
use tempfile::TempDir;

use crate::*;

/// A 100-channel spectrum of ones with a 3-channel line at 40..=42, as
/// frequency and flux columns.
fn line_spectrum() -> String {
    (0..100)
        .map(|chan| {
            let flux = if (40..43).contains(&chan) { 10.0 } else { 1.0 };
            format!("{:.6} {flux}", 230.0 + chan as f64 * 0.001)
        })
        .join("\n")
}

#[test]
fn test_afoli_help_is_correct() {
    let cmd = goco().args(["afoli", "--help"]).ok();
    assert!(cmd.is_ok());
    let (stdout, stderr) = get_cmd_output(cmd);
    assert!(stderr.is_empty());

    let stdout = stdout.split_ascii_whitespace().join(" ");
    assert!(stdout.contains("--sigma-upper"));
    assert!(
        stdout.contains("Supported: mean, median, linregress"),
        "--censtat did not list the supported statistics: {stdout}"
    );
    assert!(stdout.contains("Supported: linear, nearest, previous, next"));
}

#[test]
fn test_afoli_writes_chanfiles() {
    let dir = TempDir::new().unwrap();
    let spw0 = make_file_in_dir("spw0.txt", dir.path(), &line_spectrum());
    let spw1 = make_file_in_dir("spw1.txt", dir.path(), &"2\n".repeat(50));
    let table = dir.path().join("table.tsv");

    let cmd = goco()
        .args([
            "afoli",
            "--no-progress-bars",
            "-s",
            spw0.to_str().unwrap(),
            spw1.to_str().unwrap(),
            "--table",
            table.to_str().unwrap(),
        ])
        .ok();
    let ok = cmd.is_ok();
    let (stdout, stderr) = get_cmd_output(cmd);
    assert!(ok, "afoli failed:\n{stdout}\n{stderr}");
    assert!(stdout.contains("goco afoli complete."));

    assert_eq!(
        read_to_string(dir.path().join("spw0.chans.txt")).unwrap(),
        "10~39 43~89\n"
    );
    assert_eq!(
        read_to_string(dir.path().join("spw1.chans.txt")).unwrap(),
        "10~39\n"
    );
    let rows: Vec<String> = read_to_string(&table)
        .unwrap()
        .lines()
        .map(|l| l.split_ascii_whitespace().join(" "))
        .collect();
    assert_eq!(
        rows,
        [
            "spw0 1.000000 0.000000 23 100",
            "spw1 2.000000 0.000000 20 50"
        ]
    );
}

#[test]
fn test_afoli_alias_and_dry_run() {
    let dir = TempDir::new().unwrap();
    let spw0 = make_file_in_dir("spw0.txt", dir.path(), &line_spectrum());
    let toml = dir.path().join("afoli.toml");

    let cmd = goco()
        .args([
            "find-continuum",
            "--dry-run",
            "--save-toml",
            toml.to_str().unwrap(),
            "-s",
            spw0.to_str().unwrap(),
            "--sigma-upper",
            "2",
        ])
        .ok();
    let ok = cmd.is_ok();
    let (stdout, stderr) = get_cmd_output(cmd);
    assert!(ok, "afoli failed:\n{stdout}\n{stderr}");
    assert!(!dir.path().join("spw0.chans.txt").exists());
    let saved = read_to_string(&toml).unwrap();
    assert!(saved.contains("sigma_upper = 2.0"), "{saved}");

    // The saved arguments reproduce the run.
    let cmd = goco()
        .args(["afoli", "--no-progress-bars", toml.to_str().unwrap()])
        .ok();
    let ok = cmd.is_ok();
    let (stdout, stderr) = get_cmd_output(cmd);
    assert!(ok, "afoli failed:\n{stdout}\n{stderr}");
    assert_eq!(
        read_to_string(dir.path().join("spw0.chans.txt")).unwrap(),
        "10~39 43~89\n"
    );
}

#[test]
fn test_afoli_errors() {
    let dir = TempDir::new().unwrap();

    let cmd = goco()
        .args([
            "afoli",
            "--no-progress-bars",
            "-s",
            dir.path().join("missing.txt").to_str().unwrap(),
        ])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.starts_with("Error:"), "{stderr}");
    assert!(stderr.contains("doesn't exist"), "{stderr}");

    let spw = make_file_in_dir("short.txt", dir.path(), "1\n2\n3\n");
    let cmd = goco()
        .args(["afoli", "--no-progress-bars", "-s", spw.to_str().unwrap()])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("goco afoli --help"), "{stderr}");
}

#[test]
fn test_afoli_writes_freq_flags() {
    let dir = TempDir::new().unwrap();
    let spw0 = make_file_in_dir("spw0.txt", dir.path(), &line_spectrum());
    let joined = dir.path().join("line_freq_flags.txt");

    let cmd = goco()
        .args([
            "afoli",
            "--no-progress-bars",
            "-s",
            spw0.to_str().unwrap(),
            "--joined-freq-flags",
            joined.to_str().unwrap(),
        ])
        .ok();
    let ok = cmd.is_ok();
    let (stdout, stderr) = get_cmd_output(cmd);
    assert!(ok, "afoli failed:\n{stdout}\n{stderr}");

    // 1 MHz channels; each flagged band grows by half a channel.
    let ranges = [
        "229.9995000000~230.0095000000GHz",
        "230.0395000000~230.0425000000GHz",
        "230.0895000000~230.0995000000GHz",
    ];
    assert_eq!(
        read_to_string(dir.path().join("spw0.line_freq_flags.txt")).unwrap(),
        format!("{}\n", ranges.join("\n"))
    );
    assert_eq!(
        read_to_string(&joined).unwrap(),
        format!("spw0:\n{}\n", ranges.join("\n"))
    );
}
