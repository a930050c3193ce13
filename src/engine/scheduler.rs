// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Deciding when windows are available and what can be evicted.
//!
//! All positions are absolute sample offsets from the start of the current
//! acquisition. The next window always starts at `pending_offset`, which is a
//! multiple of the stride. A window is available once the buffers extend at
//! least `window_size` samples past it. Samples before `pending_offset` can
//! never be referenced again and are evicted; if the stride is larger than
//! the window size, samples that fall in the gap between windows are never
//! buffered at all.

use log::trace;

use super::{
    buffer::ChannelBuffers,
    metadata::{ChunkHistory, HistoryEntry},
};
use crate::chunk::Chunk;

#[derive(Debug)]
pub(crate) struct WindowScheduler {
    window_size: usize,
    stride: usize,

    /// Where the next window starts.
    pending_offset: u64,

    /// The number of samples per channel delivered in this acquisition so
    /// far, including any that were skipped.
    acq_samples_seen: u64,

    /// The largest chunk seen so far; the buffers are sized from this.
    max_chunk_size: usize,

    history: ChunkHistory,
}

impl WindowScheduler {
    pub(crate) fn new(
        window_size: usize,
        stride: usize,
        expected_chunk_size: usize,
    ) -> WindowScheduler {
        WindowScheduler {
            window_size,
            stride,
            pending_offset: 0,
            acq_samples_seen: 0,
            max_chunk_size: expected_chunk_size,
            history: ChunkHistory::default(),
        }
    }

    /// The capacity each channel buffer needs.
    pub(crate) fn buffer_capacity(&self) -> usize {
        self.window_size + self.max_chunk_size
    }

    #[cfg(test)]
    pub(crate) fn pending_offset(&self) -> u64 {
        self.pending_offset
    }

    #[cfg(test)]
    pub(crate) fn max_chunk_size(&self) -> usize {
        self.max_chunk_size
    }

    /// Forget everything about the current acquisition. Nothing buffered will
    /// be used by a window.
    pub(crate) fn reset_acquisition(&mut self, buffers: &mut ChannelBuffers) {
        self.pending_offset = 0;
        self.acq_samples_seen = 0;
        self.history.clear();
        buffers.reset(0);
    }

    /// Append the samples of `chunk` to the buffers. Returns the "slice
    /// break", the absolute offset of the chunk's first sample; buffered
    /// samples before it came from earlier chunks.
    ///
    /// The chunk must have already been validated against the buffers.
    pub(crate) fn append(&mut self, buffers: &mut ChannelBuffers, chunk: &Chunk) -> u64 {
        let num_samples = chunk.num_samples();
        let slice_break = self.acq_samples_seen;
        debug_assert_eq!(buffers.end_abs(), slice_break);

        if num_samples > self.max_chunk_size {
            self.max_chunk_size = num_samples;
            trace!(
                "Growing channel buffers to {} samples",
                self.buffer_capacity()
            );
            buffers.grow_to(self.buffer_capacity());
        }

        // If the next window starts beyond the end of the buffered data, the
        // samples before it aren't needed.
        let chunk_end = slice_break + num_samples as u64;
        let append_from = self.pending_offset.clamp(slice_break, chunk_end);
        let skip = (append_from - slice_break) as usize;
        if skip > 0 {
            trace!("Skipping {skip} samples that fall between windows");
            buffers.skip_to(append_from);
        }
        for i_chan in 0..buffers.num_channels() {
            buffers.push_chunk(i_chan, chunk.samples.channel(i_chan).iter_from(skip));
        }
        debug_assert!(buffers.len() <= buffers.capacity());
        debug_assert!(buffers.in_lockstep());

        self.acq_samples_seen = chunk_end;
        if num_samples > 0 {
            self.history.push(slice_break, chunk.header.clone());
        }

        slice_break
    }

    /// If a whole window is available, get its start.
    pub(crate) fn next_window(&self, buffers: &ChannelBuffers) -> Option<u64> {
        let start = self.pending_offset;
        if start >= buffers.first_abs() && buffers.end_abs() >= start + self.window_size as u64 {
            Some(start)
        } else {
            None
        }
    }

    /// The header of the chunk a window starting at `start` begins in.
    pub(crate) fn chunk_containing(&self, start: u64) -> Option<&HistoryEntry> {
        self.history.containing(start)
    }

    pub(crate) fn advance(&mut self) {
        self.pending_offset += self.stride as u64;
    }

    /// Evict every sample that no future window can reference.
    pub(crate) fn evict(&mut self, buffers: &mut ChannelBuffers) {
        let through = self.pending_offset.min(buffers.end_abs());
        for i_chan in 0..buffers.num_channels() {
            buffers.evict_through(i_chan, through);
        }
        self.history.prune(self.pending_offset);
        debug_assert!(buffers.in_lockstep());
        debug_assert!(buffers.len() < self.window_size);
    }
}
