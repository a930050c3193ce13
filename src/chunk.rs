// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Chunks of multi-channel samples, the unit of data delivered by a chunk
//! source (e.g. [`crate::io::read::RawChunkReader`]).

use ndarray::prelude::*;

use crate::c64;

/// The samples of a chunk. Sources may deliver real-valued samples; these are
/// promoted to complex samples when they are ingested. Axis 0 is the channel,
/// axis 1 is the sample.
#[derive(Debug, Clone)]
pub enum ChunkSamples {
    Real(Array2<f64>),
    Complex(Array2<c64>),
}

impl ChunkSamples {
    pub fn num_channels(&self) -> usize {
        match self {
            ChunkSamples::Real(a) => a.len_of(Axis(0)),
            ChunkSamples::Complex(a) => a.len_of(Axis(0)),
        }
    }

    pub fn num_samples(&self) -> usize {
        match self {
            ChunkSamples::Real(a) => a.len_of(Axis(1)),
            ChunkSamples::Complex(a) => a.len_of(Axis(1)),
        }
    }

    /// Get the samples of a single channel as complex numbers. Panics if the
    /// channel doesn't exist.
    pub(crate) fn channel(&self, i_chan: usize) -> ChannelSamples {
        match self {
            ChunkSamples::Real(a) => ChannelSamples::Real(a.row(i_chan)),
            ChunkSamples::Complex(a) => ChannelSamples::Complex(a.row(i_chan)),
        }
    }
}

/// A view of a single channel's samples.
pub(crate) enum ChannelSamples<'a> {
    Real(ArrayView1<'a, f64>),
    Complex(ArrayView1<'a, c64>),
}

impl ChannelSamples<'_> {
    /// Iterate over the samples from `skip` onwards, promoting them to complex
    /// if necessary.
    pub(crate) fn iter_from(&self, skip: usize) -> Box<dyn Iterator<Item = c64> + '_> {
        match self {
            ChannelSamples::Real(a) => Box::new(a.iter().skip(skip).map(|&r| c64::new(r, 0.0))),
            ChannelSamples::Complex(a) => Box::new(a.iter().skip(skip).copied()),
        }
    }
}

/// Metadata attached to every chunk.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkHeader {
    /// The absolute sample number of the first sample of this chunk, counted
    /// from the start of the run.
    pub start_sample_number: u64,

    /// The record number of the first sample of this chunk, counted from the
    /// start of the run.
    pub start_record_number: u64,

    /// The record number of the last sample of this chunk.
    pub end_record_number: u64,

    /// The record ID for each channel.
    pub record_ids: Vec<u64>,

    /// The acquisition ID for each channel.
    pub acquisition_ids: Vec<u64>,

    /// The timestamp of the first sample of this chunk for each channel
    /// \[ns\].
    pub timestamps: Vec<u64>,

    /// Is this the first chunk of an acquisition? If so, the samples are not
    /// contiguous with those of the previous chunk.
    pub is_new_acquisition: bool,

    /// Is this the last chunk of the stream?
    pub is_last: bool,
}

/// A chunk of multi-channel samples.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub header: ChunkHeader,
    pub samples: ChunkSamples,
}

impl Chunk {
    pub fn num_channels(&self) -> usize {
        self.samples.num_channels()
    }

    pub fn num_samples(&self) -> usize {
        self.samples.num_samples()
    }

    /// The absolute sample number of the last sample of this chunk. If the
    /// chunk is empty, this is the sample before the chunk.
    pub fn end_sample_number(&self) -> u64 {
        (self.header.start_sample_number + self.num_samples() as u64).saturating_sub(1)
    }
}
