// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors from reading raw sample files.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChunkReadError {
    #[error("No raw sample files were supplied")]
    NoInputs,

    #[error("Raw sample file '{}' doesn't contain a single whole frame of {num_channels} channels", file.display())]
    EmptyFile { file: PathBuf, num_channels: usize },

    #[error("The number of channels must be at least 1")]
    ZeroChannels,

    #[error("The record size must be at least 1 sample")]
    ZeroRecordSize,

    #[error("Couldn't read raw sample file '{}': {err}", file.display())]
    IO { file: PathBuf, err: std::io::Error },
}
