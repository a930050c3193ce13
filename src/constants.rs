// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Default values used when arguments aren't supplied.

/// The number of samples per channel in a window.
pub const DEFAULT_WINDOW_SIZE: usize = 1024;

/// The number of samples between the starts of consecutive windows.
pub const DEFAULT_STRIDE: usize = 1024;

pub const DEFAULT_WINDOWS_TO_AVERAGE: usize = 1;

/// The number of samples per channel in each record of a raw file.
pub const DEFAULT_RECORD_SIZE: usize = 4096;

/// \[Hz\]
pub const DEFAULT_SAMPLE_RATE: f64 = 100e6;

/// The sample format of raw files, as a string. See `SampleFormat`.
pub const DEFAULT_SAMPLE_FORMAT: &str = "u8";

/// Digitizers write unsigned 8-bit samples offset by this much.
pub const U8_SAMPLE_OFFSET: f64 = 128.0;
