// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Summing consecutive transformed windows before they are emitted.

use std::num::NonZeroUsize;

use ndarray::prelude::*;

use crate::c64;

/// Per-pair running sums of transformed windows. The sums are *not* divided
/// by the number of windows when they are emitted.
#[derive(Debug)]
pub(crate) struct Accumulator {
    windows_to_average: NonZeroUsize,
    sums: Option<Array2<c64>>,
    num_windows: usize,
}

impl Accumulator {
    pub(crate) fn new(windows_to_average: NonZeroUsize) -> Accumulator {
        Accumulator {
            windows_to_average,
            sums: None,
            num_windows: 0,
        }
    }

    /// Has nothing been folded in since the last emission?
    pub(crate) fn is_empty(&self) -> bool {
        self.num_windows == 0
    }

    pub(crate) fn num_windows(&self) -> usize {
        self.num_windows
    }

    pub(crate) fn reset(&mut self) {
        self.sums = None;
        self.num_windows = 0;
    }

    /// Fold in the spectra of one window (\[pair\]\[frequency\]). If this
    /// completes a group, the sums are returned and the accumulator is reset.
    pub(crate) fn fold(&mut self, spectra: Array2<c64>) -> Option<Array2<c64>> {
        match self.sums.as_mut() {
            Some(sums) => *sums += &spectra,
            None => self.sums = Some(spectra),
        }
        self.num_windows += 1;

        if self.num_windows == self.windows_to_average.get() {
            self.num_windows = 0;
            self.sums.take()
        } else {
            None
        }
    }
}
