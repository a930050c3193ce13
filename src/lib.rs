// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Streaming pseudo Wigner-Ville spectral correlation of multi-channel sample
//! streams.
//!
//! Chunks of samples are fed to a [`WvdEngine`], which slides a window over
//! each channel, forms the instantaneous correlation of every configured
//! channel pair, transforms it to the frequency domain and (optionally) sums
//! consecutive windows before emitting an [`OutputRecord`] to every connected
//! callback.

mod chunk;
mod cli;
pub mod constants;
mod engine;
pub(crate) mod io;
pub(crate) mod params;
mod transform;

use crossbeam_utils::atomic::AtomicCell;

pub use chunk::{Chunk, ChunkHeader, ChunkSamples};
pub use cli::{Wigner, WignerError};
pub use engine::{
    ChannelPair, ConfigError, EngineConfig, EngineStats, OutputCallback, OutputHeader,
    OutputRecord, ProcessingError, WvdEngine,
};
pub use transform::{AnalysisWindow, ForwardTransform, RustFftTransform, TransformError};

/// Double-precision complex numbers. All spectra are in this type.
#[allow(non_camel_case_types)]
pub type c64 = num_complex::Complex<f64>;

lazy_static::lazy_static! {
    /// Are progress bars being drawn? This should only ever be enabled by CLI
    /// code.
    static ref PROGRESS_BARS: AtomicCell<bool> = AtomicCell::new(false);
}
