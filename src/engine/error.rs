// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors from configuring and driving the engine.

use thiserror::Error;

use super::ChannelPair;
use crate::transform::TransformError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("The window size was 0; this is not permitted")]
    ZeroWindowSize,

    #[error("The window stride was 0; this is not permitted")]
    ZeroStride,

    #[error("The number of channels was 0; this is not permitted")]
    ZeroChannels,

    #[error("The sample rate must be a positive, finite number, but got {0}")]
    BadSampleRate(f64),

    #[error("Channel pair {pair} refers to a channel that doesn't exist; there are only {num_channels} channels")]
    PairOutOfRange {
        pair: ChannelPair,
        num_channels: usize,
    },

    #[error(transparent)]
    Transform(#[from] TransformError),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProcessingError {
    #[error("The engine hasn't been (successfully) initialised")]
    NotInitialised,

    #[error("Chunk has {got} channels, but the engine was configured for {expected}")]
    SizeMismatch { expected: usize, got: usize },

    #[error("Chunk has {got} metadata entries for {what}, but the engine was configured for {expected} channels")]
    HeaderMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("Fourier transform failed; the engine must be re-initialised: {0}")]
    Transform(#[from] TransformError),
}
