// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::{io::Cursor, path::PathBuf};

use approx::assert_abs_diff_eq;
use indoc::indoc;
use ndarray::array;
use tempfile::tempdir;

use super::{read::*, write::*, *};
use crate::{
    flagging::{ChannelMask, FreqRange},
    peaks::PeakPosition,
};

#[test]
fn test_parse_single_column_spectrum() {
    let mut buf = Cursor::new(indoc! {"
        # flux only
        1.0
        2.5

        -3e-2
    "});
    let spectrum = parse_spectrum(&mut buf, "spw0").unwrap();
    assert_eq!(spectrum.name, "spw0");
    assert!(spectrum.freq.is_none());
    assert_eq!(spectrum.flux, array![1.0, 2.5, -0.03]);
}

#[test]
fn test_parse_two_column_spectrum() {
    // Frequency and flux, as written by the spectrum extractor.
    let mut buf = Cursor::new(indoc! {"
        230.500000 0.010000
        230.501000 0.012000
        230.502000 0.500000 extra
    "});
    let result = parse_spectrum(&mut buf, "spw1");
    assert!(matches!(
        result,
        Err(ReadSpectrumError::InconsistentColumns {
            line_num: 3,
            expected: 2,
            found: 3
        })
    ));

    let mut buf = Cursor::new(indoc! {"
        0 0.01
        1 0.012
        2 0.5
    "});
    let spectrum = parse_spectrum(&mut buf, "spw1").unwrap();
    assert_eq!(spectrum.freq, Some(array![0.0, 1.0, 2.0]));
    assert_eq!(spectrum.flux, array![0.01, 0.012, 0.5]);

    let mut buf = Cursor::new("230.5 0.01\nchan1 0.02\n");
    assert!(matches!(
        parse_spectrum(&mut buf, "spw1"),
        Err(ReadSpectrumError::ParseFloat { line_num: 2, string }) if string == "chan1"
    ));
}

#[test]
fn test_parse_bad_spectra() {
    let mut buf = Cursor::new("1.0\nabc\n");
    assert!(matches!(
        parse_spectrum(&mut buf, "bad"),
        Err(ReadSpectrumError::ParseFloat { line_num: 2, .. })
    ));

    let mut buf = Cursor::new("# nothing\n\n");
    assert!(matches!(
        parse_spectrum(&mut buf, "empty"),
        Err(ReadSpectrumError::Empty(_))
    ));

    // Non-finite values are parsed here and rejected by the classifier.
    let mut buf = Cursor::new("1.0\nnan\n");
    let spectrum = parse_spectrum(&mut buf, "nan").unwrap();
    assert!(spectrum.flux[1].is_nan());
}

#[test]
fn test_parse_peaks() {
    let mut buf = Cursor::new(indoc! {"
        # x y
        10 10
        11,9
        10.5   11
    "});
    let peaks = parse_peaks(&mut buf).unwrap();
    assert_eq!(
        peaks,
        vec![
            PeakPosition::new(10.0, 10.0),
            PeakPosition::new(11.0, 9.0),
            PeakPosition::new(10.5, 11.0),
        ]
    );

    let mut buf = Cursor::new("10 10\n11 9 8\n");
    assert!(matches!(
        parse_peaks(&mut buf),
        Err(ReadPeaksError::NotAPair {
            line_num: 2,
            found: 3
        })
    ));
    let mut buf = Cursor::new("10 ten\n");
    assert!(matches!(
        parse_peaks(&mut buf),
        Err(ReadPeaksError::ParseFloat { line_num: 1, .. })
    ));
}

#[test]
fn test_read_missing_files() {
    let path = PathBuf::from("/does/not/exist.txt");
    assert!(matches!(
        read_spectrum(&path),
        Err(ReadSpectrumError::DoesNotExist(_))
    ));
    assert!(matches!(
        read_peaks(&path),
        Err(ReadPeaksError::DoesNotExist(_))
    ));
}

#[test]
fn test_level_chanfile_path() {
    assert_eq!(
        level_chanfile_path(&PathBuf::from("out/a.chans.txt"), 0.05).unwrap(),
        PathBuf::from("out/a.chans.0.05.txt")
    );
    assert_eq!(
        level_chanfile_path(&PathBuf::from("chans"), 0.1).unwrap(),
        PathBuf::from("chans.0.1")
    );
}

#[test]
fn test_write_files() {
    let dir = tempdir().unwrap();

    let chanfile = dir.path().join("spw0.chans.txt");
    let mask = ChannelMask::from(vec![false, true, true, false, true]);
    write_chanfile(&chanfile, &mask).unwrap();
    assert_eq!(std::fs::read_to_string(&chanfile).unwrap(), "1~2 4~4\n");

    let peak = dir.path().join("peak.txt");
    write_peak(&peak, &PeakPosition::new(10.5, 11.5), false).unwrap();
    assert_eq!(std::fs::read_to_string(&peak).unwrap(), "10 12\n");
    write_peak(&peak, &PeakPosition::new(10.25, 9.0), true).unwrap();
    assert_eq!(std::fs::read_to_string(&peak).unwrap(), "10.25 9\n");

    let table = dir.path().join("table.tsv");
    append_table_row(&table, "spw0", 1.0, 0.5, 23, 100).unwrap();
    append_table_row(&table, "spw1", 2.0, 0.25, 0, 100).unwrap();
    let contents = std::fs::read_to_string(&table).unwrap();
    let rows: Vec<Vec<&str>> = contents
        .lines()
        .map(|l| l.split('\t').map(str::trim).collect())
        .collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0], ["spw0", "1.000000", "0.500000", "23", "100"]);
    assert_eq!(rows[1][0], "spw1");
    assert_abs_diff_eq!(rows[1][2].parse::<f64>().unwrap(), 0.25);
}

#[test]
fn test_read_spectrum_names_it_after_the_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("field1_spw2.dat");
    std::fs::write(&path, "1\n2\n3\n").unwrap();
    let spectrum = read_spectrum(&path).unwrap();
    assert_eq!(spectrum.name, "field1_spw2");
    assert_eq!(spectrum.flux.len(), 3);
}

#[test]
fn test_freq_flags_files() {
    let dir = tempdir().unwrap();
    let mask = ChannelMask::from(vec![false, false, true, true, true, false]);
    let freq = array![100.0, 100.5, 101.0, 101.5, 102.0, 102.5];
    let ranges = mask.flagged_freq_ranges(freq.view()).unwrap();

    let single = dir.path().join("spw0.line_freq_flags.txt");
    write_freq_flags(&single, &ranges, "GHz").unwrap();
    assert_eq!(
        std::fs::read_to_string(&single).unwrap(),
        indoc! {"
            99.7500000000~100.7500000000GHz
            102.2500000000~102.7500000000GHz
        "}
    );
    assert_eq!(read_freq_flags(&single, "GHz").unwrap(), ranges);

    let joined = dir.path().join("line_freq_flags.txt");
    let flags = vec![
        ("spw0".to_string(), ranges),
        (
            "spw1".to_string(),
            vec![FreqRange {
                low: 1.0,
                high: 2.0,
            }],
        ),
    ];
    write_joined_freq_flags(&joined, &flags, "MHz").unwrap();
    assert_eq!(
        std::fs::read_to_string(&joined).unwrap(),
        indoc! {"
            spw0:
            99.7500000000~100.7500000000MHz
            102.2500000000~102.7500000000MHz
            spw1:
            1.0000000000~2.0000000000MHz
        "}
    );
}

#[test]
fn test_parse_freq_flags() {
    let mut buf = Cursor::new("1.5~2.5GHz\n3~4\n");
    assert_eq!(
        parse_freq_flags(&mut buf, "GHz").unwrap(),
        vec![
            FreqRange {
                low: 1.5,
                high: 2.5
            },
            FreqRange {
                low: 3.0,
                high: 4.0
            },
        ]
    );

    let mut buf = Cursor::new("1.5~2.5GHz\n3-4\n");
    assert!(matches!(
        parse_freq_flags(&mut buf, "GHz"),
        Err(ReadFreqFlagsError::Malformed { line_num: 2, .. })
    ));
    // A different unit isn't silently stripped.
    let mut buf = Cursor::new("1.5~2.5MHz\n");
    assert!(parse_freq_flags(&mut buf, "GHz").is_err());
}
