// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Analysis windows, applied to correlation sequences before they are
//! Fourier transformed.

use std::f64::consts::PI;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

lazy_static::lazy_static! {
    pub static ref ANALYSIS_WINDOWS_COMMA_SEPARATED: String = AnalysisWindow::iter().join(", ");
}

#[derive(
    Debug, Display, EnumIter, EnumString, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisWindow {
    #[strum(serialize = "rectangular")]
    Rectangular,

    #[strum(serialize = "hann")]
    Hann,

    #[strum(serialize = "hamming")]
    Hamming,

    #[strum(serialize = "blackman")]
    Blackman,
}

impl AnalysisWindow {
    /// Get the (symmetric) weights of this window for `len` samples.
    pub fn weights(self, len: usize) -> Vec<f64> {
        if len == 1 {
            return vec![1.0];
        }
        let denom = (len - 1) as f64;
        (0..len)
            .map(|i| {
                let ratio = i as f64 / denom;
                let w = match self {
                    AnalysisWindow::Rectangular => 1.0,
                    AnalysisWindow::Hann => 0.5 * (1.0 - (2.0 * PI * ratio).cos()),
                    AnalysisWindow::Hamming => 0.54 - 0.46 * (2.0 * PI * ratio).cos(),
                    AnalysisWindow::Blackman => {
                        0.42 - 0.5 * (2.0 * PI * ratio).cos() + 0.08 * (4.0 * PI * ratio).cos()
                    }
                };
                // Endpoints of the Blackman window can be very slightly
                // negative.
                w.max(0.0)
            })
            .collect()
    }
}
