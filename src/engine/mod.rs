// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The sliding-window pseudo Wigner-Ville engine.
//!
//! Chunks of multi-channel samples are pushed into per-channel buffers. Every
//! time a whole window (which may straddle any number of chunks) is available,
//! the instantaneous correlation of each configured channel pair is formed
//! and Fourier transformed. Transformed windows are summed in groups of
//! `windows_to_average` and each completed group is handed to the connected
//! output callbacks as an [`OutputRecord`].
//!
//! The engine is entirely synchronous; [`WvdEngine::ingest_chunk`] invokes
//! callbacks zero or more times before returning.

mod accumulate;
mod buffer;
mod correlate;
mod error;
mod metadata;
mod scheduler;

pub use error::{ConfigError, ProcessingError};
pub use metadata::{OutputHeader, OutputRecord};

use std::{fmt::Display, num::NonZeroUsize, str::FromStr};

use log::{debug, info, trace, warn};
use serde::{Deserialize, Serialize};

use self::{
    accumulate::Accumulator, buffer::ChannelBuffers, correlate::Correlator,
    metadata::MetadataPropagator, scheduler::WindowScheduler,
};
use crate::{
    chunk::Chunk,
    transform::{AnalysisWindow, ForwardTransform, RustFftTransform},
};

/// Two channel indices whose samples are correlated. If both are the same,
/// this is an autocorrelation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelPair {
    pub first: usize,
    pub second: usize,
}

impl ChannelPair {
    pub fn new(first: usize, second: usize) -> ChannelPair {
        ChannelPair { first, second }
    }

    pub fn is_auto(&self) -> bool {
        self.first == self.second
    }

    /// The highest channel index referenced by this pair.
    pub fn max_channel(&self) -> usize {
        self.first.max(self.second)
    }
}

impl Display for ChannelPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.first, self.second)
    }
}

impl FromStr for ChannelPair {
    type Err = String;

    /// Parse a pair like "0,1".
    fn from_str(s: &str) -> Result<ChannelPair, String> {
        let mut split = s.split(',').map(|c| c.trim().parse::<usize>());
        match (split.next(), split.next(), split.next()) {
            (Some(Ok(first)), Some(Ok(second)), None) => Ok(ChannelPair { first, second }),
            _ => Err(format!(
                "Couldn't parse '{s}' as a channel pair; expected two channel indices separated by a comma, e.g. '0,1'"
            )),
        }
    }
}

/// Everything needed to initialise a [`WvdEngine`].
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// \[Hz\]
    pub sample_rate: f64,
    pub num_channels: usize,

    /// The number of samples per channel expected in each chunk. Bigger chunks
    /// are allowed; the buffers will grow to accommodate them.
    pub expected_chunk_size: usize,

    pub window_size: usize,

    /// The distance between the starts of consecutive windows \[samples\].
    pub stride: usize,

    /// How many windows are summed into each output record. 0 is treated as
    /// 1.
    pub windows_to_average: usize,

    pub pairs: Vec<ChannelPair>,

    /// A window function applied to each correlation sequence before it is
    /// transformed.
    pub analysis_window: Option<AnalysisWindow>,
}

impl EngineConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.window_size == 0 {
            return Err(ConfigError::ZeroWindowSize);
        }
        if self.stride == 0 {
            return Err(ConfigError::ZeroStride);
        }
        if self.num_channels == 0 {
            return Err(ConfigError::ZeroChannels);
        }
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(ConfigError::BadSampleRate(self.sample_rate));
        }
        if let Some(&pair) = self
            .pairs
            .iter()
            .find(|p| p.max_channel() >= self.num_channels)
        {
            return Err(ConfigError::PairOutOfRange {
                pair,
                num_channels: self.num_channels,
            });
        }
        Ok(())
    }
}

/// Counters describing what an engine has done.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub chunks_ingested: u64,
    pub acquisitions: u64,
    pub windows_transformed: u64,
    pub records_emitted: u64,

    /// Windows that were transformed but never emitted because their group
    /// was cut short by an acquisition boundary or the end of the stream.
    pub windows_dropped: u64,
}

pub type OutputCallback = Box<dyn FnMut(OutputRecord) + Send>;

/// All of the state carried between calls to [`WvdEngine::ingest_chunk`].
struct EngineState {
    config: EngineConfig,
    buffers: ChannelBuffers,
    scheduler: WindowScheduler,
    correlator: Correlator,
    accumulator: Accumulator,
    metadata: MetadataPropagator,
}

enum Status {
    Uninitialised,

    /// No channel pairs were configured; chunks are accepted, but nothing is
    /// ever emitted.
    Disabled { num_channels: usize },

    Ready(Box<EngineState>),

    /// A transform failed; the engine must be re-initialised.
    Failed,
}

pub struct WvdEngine {
    status: Status,
    callbacks: Vec<OutputCallback>,
    stats: EngineStats,
}

impl Default for WvdEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl WvdEngine {
    /// Create an uninitialised engine. [`WvdEngine::initialize`] must be
    /// called before any chunks are ingested.
    pub fn new() -> WvdEngine {
        WvdEngine {
            status: Status::Uninitialised,
            callbacks: vec![],
            stats: EngineStats::default(),
        }
    }

    /// (Re-)initialise the engine, using `rustfft` for the Fourier
    /// transforms. Any buffered samples and partially-summed windows are
    /// discarded. Connected callbacks are kept.
    pub fn initialize(&mut self, config: EngineConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let transform = RustFftTransform::new(config.window_size)?;
        self.initialize_with_transform(config, Box::new(transform))
    }

    /// The same as [`WvdEngine::initialize`], but with a caller-supplied
    /// Fourier transform. The transform length must match the window size.
    pub fn initialize_with_transform(
        &mut self,
        config: EngineConfig,
        transform: Box<dyn ForwardTransform>,
    ) -> Result<(), ConfigError> {
        self.status = Status::Uninitialised;
        config.validate()?;
        self.stats = EngineStats::default();

        if config.pairs.is_empty() {
            warn!("No channel pairs were specified; the Wigner-Ville engine is disabled");
            self.status = Status::Disabled {
                num_channels: config.num_channels,
            };
            return Ok(());
        }

        let windows_to_average = NonZeroUsize::new(config.windows_to_average).unwrap_or_else(|| {
            warn!("The number of windows to average was 0; using 1 instead");
            NonZeroUsize::MIN
        });

        let correlator = Correlator::new(config.window_size, transform, config.analysis_window)?;
        let scheduler = WindowScheduler::new(
            config.window_size,
            config.stride,
            config.expected_chunk_size,
        );
        let buffers = ChannelBuffers::new(config.num_channels, scheduler.buffer_capacity());

        info!(
            "Wigner-Ville engine: {} channels, window size {}, stride {}, averaging {} windows, {} pairs",
            config.num_channels,
            config.window_size,
            config.stride,
            windows_to_average,
            config.pairs.len()
        );
        debug!(
            "Channel pairs: {}",
            config
                .pairs
                .iter()
                .map(|p| format!("({p})"))
                .collect::<Vec<_>>()
                .join(" ")
        );
        debug!(
            "Channel buffer capacity: {} samples",
            scheduler.buffer_capacity()
        );

        self.status = Status::Ready(Box::new(EngineState {
            metadata: MetadataPropagator::new(config.sample_rate, config.window_size),
            accumulator: Accumulator::new(windows_to_average),
            config,
            buffers,
            scheduler,
            correlator,
        }));
        Ok(())
    }

    /// Register a callback that receives every emitted [`OutputRecord`].
    pub fn connect_output<F>(&mut self, callback: F)
    where
        F: FnMut(OutputRecord) + Send + 'static,
    {
        self.callbacks.push(Box::new(callback));
    }

    /// Is this engine initialised and configured to produce output?
    pub fn is_enabled(&self) -> bool {
        matches!(self.status, Status::Ready(_))
    }

    pub fn config(&self) -> Option<&EngineConfig> {
        match &self.status {
            Status::Ready(s) => Some(&s.config),
            _ => None,
        }
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    /// Ingest the next chunk of the stream, emitting any records that are
    /// completed by its samples. If an error is returned, no records were
    /// emitted by this call.
    pub fn ingest_chunk(&mut self, chunk: &Chunk) -> Result<(), ProcessingError> {
        let state = match &mut self.status {
            Status::Uninitialised | Status::Failed => return Err(ProcessingError::NotInitialised),
            Status::Disabled { num_channels } => {
                validate_chunk(chunk, *num_channels)?;
                trace!("Engine is disabled; ignoring chunk");
                self.stats.chunks_ingested += 1;
                return Ok(());
            }
            Status::Ready(state) => state,
        };
        validate_chunk(chunk, state.config.num_channels)?;

        match process_chunk(state, chunk, &mut self.stats) {
            Ok(records) => {
                self.stats.records_emitted += records.len() as u64;
                self.dispatch(records);
                Ok(())
            }
            Err(e) => {
                self.status = Status::Failed;
                Err(e)
            }
        }
    }

    fn dispatch(&mut self, records: Vec<OutputRecord>) {
        let num_callbacks = self.callbacks.len();
        for record in records {
            trace!("Emitting record {}", record.header.sequence);
            for (i, callback) in self.callbacks.iter_mut().enumerate() {
                if i + 1 == num_callbacks {
                    callback(record);
                    break;
                }
                callback(record.clone());
            }
        }
    }
}

/// Check a chunk against the configuration. Nothing is mutated if this fails.
fn validate_chunk(chunk: &Chunk, num_channels: usize) -> Result<(), ProcessingError> {
    if chunk.num_channels() != num_channels {
        return Err(ProcessingError::SizeMismatch {
            expected: num_channels,
            got: chunk.num_channels(),
        });
    }
    for (what, len) in [
        ("record IDs", chunk.header.record_ids.len()),
        ("acquisition IDs", chunk.header.acquisition_ids.len()),
        ("timestamps", chunk.header.timestamps.len()),
    ] {
        if len != num_channels {
            return Err(ProcessingError::HeaderMismatch {
                what,
                expected: num_channels,
                got: len,
            });
        }
    }
    Ok(())
}

/// Push a (validated) chunk through the engine and collect the completed
/// records. Records are only handed out once every window has been
/// transformed successfully.
fn process_chunk(
    state: &mut EngineState,
    chunk: &Chunk,
    stats: &mut EngineStats,
) -> Result<Vec<OutputRecord>, ProcessingError> {
    let EngineState {
        config,
        buffers,
        scheduler,
        correlator,
        accumulator,
        metadata,
    } = state;

    stats.chunks_ingested += 1;
    metadata.observe_is_last(chunk.header.is_last);

    if chunk.header.is_new_acquisition {
        stats.acquisitions += 1;
        if !accumulator.is_empty() {
            debug!(
                "New acquisition; dropping {} windows that didn't complete a group",
                accumulator.num_windows()
            );
            stats.windows_dropped += accumulator.num_windows() as u64;
        }
        debug!(
            "New acquisition starting at sample {}; discarding {} buffered samples",
            chunk.header.start_sample_number,
            buffers.len()
        );
        accumulator.reset();
        metadata.reset_group();
        scheduler.reset_acquisition(buffers);
    }

    let slice_break = scheduler.append(buffers, chunk);
    trace!(
        "Chunk at sample {} buffered; slice break at offset {slice_break}, buffered {}..{}",
        chunk.header.start_sample_number,
        buffers.first_abs(),
        buffers.end_abs()
    );

    let mut records = vec![];
    while let Some(start) = scheduler.next_window(buffers) {
        if accumulator.is_empty() {
            // The first window of a group determines the start metadata; it
            // may begin in an earlier chunk than this one.
            if let Some(entry) = scheduler.chunk_containing(start) {
                metadata.begin_group(entry, start);
            }
        }

        let spectra = correlator.correlate_window(buffers, &config.pairs, start)?;
        stats.windows_transformed += 1;
        let num_windows = accumulator.num_windows() + 1;
        if let Some(sums) = accumulator.fold(spectra) {
            if let Some(record) = metadata.finish(
                &chunk.header,
                chunk.end_sample_number(),
                num_windows,
                &config.pairs,
                sums,
            ) {
                records.push(record);
            }
        }

        scheduler.advance();
    }

    scheduler.evict(buffers);

    if chunk.header.is_last && !accumulator.is_empty() {
        debug!(
            "Last chunk seen; {} windows didn't complete a group and won't be emitted",
            accumulator.num_windows()
        );
        stats.windows_dropped += accumulator.num_windows() as u64;
        accumulator.reset();
        metadata.reset_group();
    }

    Ok(records)
}
