// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Integration tests.
//!
//! Some help for laying out these tests was taken from:
//! https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html

mod engine;
mod wvd;

use std::{path::Path, process::Output, str::from_utf8};

use assert_cmd::{output::OutputError, Command};

fn wigner() -> Command {
    Command::cargo_bin("wigner").unwrap()
}

fn get_cmd_output(result: Result<Output, OutputError>) -> (String, String) {
    let output = match result {
        Ok(o) => o,
        Err(o) => o.as_output().unwrap().clone(),
    };
    (
        from_utf8(&output.stdout).unwrap().to_string(),
        from_utf8(&output.stderr).unwrap().to_string(),
    )
}

/// Write a raw file of `num_frames` frames of 2 channels of u8 samples.
/// Channel 0 is a slow ramp, channel 1 is a faster one.
fn write_raw(dir: &Path, name: &str, num_frames: usize) -> String {
    let path = dir.join(name);
    let bytes = (0..num_frames)
        .flat_map(|i| [(i % 256) as u8, ((3 * i) % 256) as u8])
        .collect::<Vec<u8>>();
    std::fs::write(&path, bytes).unwrap();
    path.display().to_string()
}
