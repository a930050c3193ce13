// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Fourier-transform and analysis-window primitives used by the engine.

mod window;

pub use window::{AnalysisWindow, ANALYSIS_WINDOWS_COMMA_SEPARATED};

use std::sync::Arc;

use rustfft::{Fft, FftPlanner};
use thiserror::Error;

use crate::c64;

/// A forward Fourier transform of a fixed length.
pub trait ForwardTransform: Send {
    /// The transform length this instance was planned for.
    fn len(&self) -> usize;

    /// Transform `data` in place. The length of `data` must match
    /// [`ForwardTransform::len`].
    fn forward(&mut self, data: &mut [c64]) -> Result<(), TransformError>;
}

/// A [`ForwardTransform`] backed by `rustfft`. Like `rustfft`, no
/// normalisation is applied.
pub struct RustFftTransform {
    len: usize,
    fft: Arc<dyn Fft<f64>>,
    scratch: Vec<c64>,
}

impl RustFftTransform {
    pub fn new(len: usize) -> Result<RustFftTransform, TransformError> {
        if len == 0 {
            return Err(TransformError::Unsupported { len });
        }
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(len);
        let scratch = vec![c64::default(); fft.get_inplace_scratch_len()];
        Ok(RustFftTransform { len, fft, scratch })
    }
}

impl ForwardTransform for RustFftTransform {
    fn len(&self) -> usize {
        self.len
    }

    fn forward(&mut self, data: &mut [c64]) -> Result<(), TransformError> {
        if data.len() != self.len {
            return Err(TransformError::LengthMismatch {
                expected: self.len,
                got: data.len(),
            });
        }
        self.fft.process_with_scratch(data, &mut self.scratch);
        Ok(())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    #[error("A Fourier transform of length {len} is not supported")]
    Unsupported { len: usize },

    #[error("Fourier transform was planned for {expected} samples, but was given {got}")]
    LengthMismatch { expected: usize, got: usize },
}
