// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error type for all errors reported by the `wigner` binary. This should be
//! the *only* error enum that is publicly visible from the CLI.

use thiserror::Error;

use super::wvd::WvdArgsError;
use crate::{
    engine::{ConfigError, ProcessingError},
    io::{
        read::ChunkReadError,
        write::{FileWriteError, SpectrumWriteError},
        GlobError,
    },
    params::WvdError,
    transform::ANALYSIS_WINDOWS_COMMA_SEPARATED,
};

/// The *only* publicly visible error from the `wigner` binary. Each error
/// message should include a hint on where to look, unless it's "generic".
#[derive(Error, Debug)]
pub enum WignerError {
    /// An error related to the wvd arguments.
    #[error("{0}\n\nSee `wigner wvd --help` for the available options.")]
    Wvd(String),

    /// The engine couldn't be configured.
    #[error("{0}\n\nCheck --channels, --window-size, --stride, --sample-rate and --pair.")]
    EngineConfig(String),

    /// An error that happened while correlating.
    #[error("{0}\n\nIf you don't know what this means, try turning up verbosity (-v or -vv) and maybe disabling progress bars.")]
    Processing(String),

    /// An error related to reading raw sample files.
    #[error("{0}\n\nRaw sample files hold interleaved samples of every channel; check --channels and --sample-format.")]
    ChunkRead(String),

    /// An error related to writing spectra.
    #[error("{0}\n\nSpectra are written to .bin and .txt files.")]
    SpectrumWrite(String),

    /// An error related to argument files.
    #[error("{0}\n\nArgument files are toml or json files with the same keys as the long command-line options (with underscores).")]
    ArgFile(String),

    /// A generic error that can't be clarified further, e.g. IO errors.
    #[error("{0}")]
    Generic(String),
}

// When changing the error propagation below, ensure `Self::from(e)` uses the
// correct `e`!

impl From<WvdArgsError> for WignerError {
    fn from(e: WvdArgsError) -> Self {
        let s = e.to_string();
        match e {
            WvdArgsError::ParseAnalysisWindow(_) => Self::Wvd(format!(
                "{s}\nSupported analysis windows: {}",
                *ANALYSIS_WINDOWS_COMMA_SEPARATED
            )),
            WvdArgsError::NoInputs
            | WvdArgsError::NoChannels
            | WvdArgsError::NoOutputs
            | WvdArgsError::ParseSampleFormat(_)
            | WvdArgsError::ParsePair(_)
            | WvdArgsError::OutputFileExtension { .. } => Self::Wvd(s),
        }
    }
}

impl From<ConfigError> for WignerError {
    fn from(e: ConfigError) -> Self {
        Self::EngineConfig(e.to_string())
    }
}

impl From<ProcessingError> for WignerError {
    fn from(e: ProcessingError) -> Self {
        Self::Processing(e.to_string())
    }
}

impl From<ChunkReadError> for WignerError {
    fn from(e: ChunkReadError) -> Self {
        let s = e.to_string();
        match e {
            ChunkReadError::NoInputs => Self::Wvd(s),
            ChunkReadError::ZeroChannels | ChunkReadError::ZeroRecordSize => Self::EngineConfig(s),
            ChunkReadError::EmptyFile { .. } | ChunkReadError::IO { .. } => Self::ChunkRead(s),
        }
    }
}

impl From<SpectrumWriteError> for WignerError {
    fn from(e: SpectrumWriteError) -> Self {
        let s = e.to_string();
        match e {
            SpectrumWriteError::FileWrite(e) => Self::from(e),
            SpectrumWriteError::IO(e) => Self::from(e),
            SpectrumWriteError::InconsistentBins { .. }
            | SpectrumWriteError::InconsistentPairs { .. } => Self::SpectrumWrite(s),
        }
    }
}

impl From<FileWriteError> for WignerError {
    fn from(e: FileWriteError) -> Self {
        Self::SpectrumWrite(e.to_string())
    }
}

impl From<WvdError> for WignerError {
    fn from(e: WvdError) -> Self {
        match e {
            WvdError::ChunkRead(e) => Self::from(e),
            WvdError::Processing(e) => Self::from(e),
            WvdError::SpectrumWrite(e) => Self::from(e),
        }
    }
}

impl From<GlobError> for WignerError {
    fn from(e: GlobError) -> Self {
        Self::Generic(e.to_string())
    }
}

impl From<std::io::Error> for WignerError {
    fn from(e: std::io::Error) -> Self {
        Self::Generic(e.to_string())
    }
}
