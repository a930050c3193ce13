// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Pairwise instantaneous correlation and Fourier transform of windows.

use ndarray::prelude::*;

use super::{buffer::ChannelBuffers, ChannelPair};
use crate::{
    c64,
    transform::{AnalysisWindow, ForwardTransform, TransformError},
};

/// Form the symmetric-lag instantaneous correlation of two windows:
///
/// `out[k] = a[k] * conj(b[N - 1 - k])`
///
/// This is the kernel of a discrete pseudo Wigner-Ville distribution. All three
/// slices must have the same length.
pub(crate) fn instantaneous_correlation(a: &[c64], b: &[c64], out: &mut [c64]) {
    debug_assert_eq!(a.len(), out.len());
    debug_assert_eq!(b.len(), out.len());
    for ((o, &a), &b) in out.iter_mut().zip(a.iter()).zip(b.iter().rev()) {
        *o = a * b.conj();
    }
}

/// Correlates and transforms windows for all channel pairs. Scratch space is
/// owned here so that no allocation is needed per window beyond the output
/// spectra.
pub(crate) struct Correlator {
    transform: Box<dyn ForwardTransform>,
    weights: Option<Vec<f64>>,
    first: Vec<c64>,
    second: Vec<c64>,
    sequence: Vec<c64>,
}

impl Correlator {
    /// The transform must have been planned for `window_size` samples.
    pub(crate) fn new(
        window_size: usize,
        transform: Box<dyn ForwardTransform>,
        analysis_window: Option<AnalysisWindow>,
    ) -> Result<Correlator, TransformError> {
        if transform.len() != window_size {
            return Err(TransformError::LengthMismatch {
                expected: transform.len(),
                got: window_size,
            });
        }

        Ok(Correlator {
            transform,
            weights: analysis_window.map(|w| w.weights(window_size)),
            first: vec![c64::default(); window_size],
            second: vec![c64::default(); window_size],
            sequence: vec![c64::default(); window_size],
        })
    }

    pub(crate) fn window_size(&self) -> usize {
        self.sequence.len()
    }

    /// Transform the window starting at absolute offset `start` for each of
    /// the `pairs`. The returned array is \[pair\]\[frequency\].
    pub(crate) fn correlate_window(
        &mut self,
        buffers: &ChannelBuffers,
        pairs: &[ChannelPair],
        start: u64,
    ) -> Result<Array2<c64>, TransformError> {
        let mut spectra = Array2::default((pairs.len(), self.window_size()));
        for (pair, mut spectrum) in pairs.iter().zip(spectra.outer_iter_mut()) {
            buffers.channel(pair.first).copy_window(start, &mut self.first);
            if pair.is_auto() {
                instantaneous_correlation(&self.first, &self.first, &mut self.sequence);
            } else {
                buffers
                    .channel(pair.second)
                    .copy_window(start, &mut self.second);
                instantaneous_correlation(&self.first, &self.second, &mut self.sequence);
            }

            if let Some(weights) = self.weights.as_ref() {
                self.sequence
                    .iter_mut()
                    .zip(weights.iter())
                    .for_each(|(s, &w)| *s *= w);
            }

            self.transform.forward(&mut self.sequence)?;
            spectrum.assign(&ArrayView1::from(self.sequence.as_slice()));
        }

        Ok(spectra)
    }
}
