// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors from writing spectra.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpectrumWriteError {
    #[error("Record {sequence} has {got} bins, but earlier records had {expected}")]
    InconsistentBins {
        sequence: u64,
        expected: usize,
        got: usize,
    },

    #[error("Record {sequence} has {got} channel pairs, but earlier records had {expected}")]
    InconsistentPairs {
        sequence: u64,
        expected: usize,
        got: usize,
    },

    #[error(transparent)]
    FileWrite(#[from] FileWriteError),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum FileWriteError {
    #[error("Cannot write to the specified file '{file}'. Do you have write permissions set?")]
    FileNotWritable { file: String },

    #[error(
        "Couldn't create directory '{0}' for output files. Do you have write permissions set?"
    )]
    NewDirectory(PathBuf),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
