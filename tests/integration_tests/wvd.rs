// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tests of the `wvd` subcommand.

use tempfile::TempDir;

use crate::{get_cmd_output, wigner, write_raw};

#[test]
fn help_lists_the_options() {
    let cmd = wigner().args(["wvd", "--help"]).ok();
    assert!(cmd.is_ok(), "{:?}", cmd.err());
    let (stdout, _) = get_cmd_output(cmd);
    for option in ["--window-size", "--stride", "--windows-to-average", "--pair", "--outputs"] {
        assert!(stdout.contains(option), "{option} missing from help:\n{stdout}");
    }
}

#[test]
fn spectra_are_written_without_stderr() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let first = write_raw(tmp_dir.path(), "acq_0.raw", 300);
    let second = write_raw(tmp_dir.path(), "acq_1.raw", 200);
    let bin = tmp_dir.path().join("spectra.bin");
    let txt = tmp_dir.path().join("spectra.txt");

    #[rustfmt::skip]
    let cmd = wigner()
        .args([
            "wvd",
            "--inputs", &first, &second,
            "--channels", "2",
            "--record-size", "64",
            "--window-size", "32",
            "--stride", "16",
            "--pair", "0,0",
            "--pair", "0,1",
            "--outputs", &bin.display().to_string(), &txt.display().to_string(),
            "--no-progress-bars",
        ])
        .ok();
    assert!(cmd.is_ok(), "wvd failed on simple test data: {}", cmd.err().unwrap());
    let (stdout, stderr) = get_cmd_output(cmd);
    assert!(stderr.is_empty(), "stderr wasn't empty: {stderr}");
    // 300 samples give 17 windows and 200 samples give 11.
    assert!(stdout.contains("28 spectra written to: "), "{stdout}");

    let text = std::fs::read_to_string(&txt).unwrap();
    assert_eq!(text.lines().filter(|l| l.starts_with("# record")).count(), 28);
    assert!(std::fs::read(&bin).unwrap().starts_with(b"WVD1"));
}

#[test]
fn bad_arguments_fail_with_a_hint() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let input = write_raw(tmp_dir.path(), "acq.raw", 100);
    let output = tmp_dir.path().join("spectra.bin");

    #[rustfmt::skip]
    let cmd = wigner()
        .args([
            "wvd",
            "--inputs", &input,
            "--channels", "2",
            "--pair", "0;1",
            "--outputs", &output.display().to_string(),
        ])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.starts_with("Error: "), "{stderr}");
    assert!(stderr.contains("'0;1'"), "{stderr}");
    assert!(stderr.contains("wigner wvd --help"), "{stderr}");
    assert!(!output.exists());
}

#[test]
fn saved_arguments_can_be_reused() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let input = write_raw(tmp_dir.path(), "acq.raw", 100);
    let output = tmp_dir.path().join("spectra.txt");
    let toml = tmp_dir.path().join("wvd.toml");

    #[rustfmt::skip]
    let cmd = wigner()
        .args([
            "wvd",
            "--inputs", &input,
            "--channels", "2",
            "--window-size", "16",
            "--stride", "16",
            "--outputs", &output.display().to_string(),
            "--save-toml", &toml.display().to_string(),
            "--dry-run",
        ])
        .ok();
    assert!(cmd.is_ok(), "{}", cmd.err().unwrap());
    assert!(toml.exists());
    assert!(!output.exists());

    // The alias works too.
    let cmd = wigner()
        .args(["wigner-ville", &toml.display().to_string(), "--no-progress-bars"])
        .ok();
    assert!(cmd.is_ok(), "{}", cmd.err().unwrap());
    let text = std::fs::read_to_string(&output).unwrap();
    // 100 samples make 6 windows of 16.
    assert_eq!(text.lines().filter(|l| l.starts_with("# record")).count(), 6);
}
