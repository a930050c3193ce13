// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Per-channel circular sample buffers.
//!
//! Rather than holding iterators into a circular structure across calls, each
//! buffer tracks the absolute sample offset (relative to the start of the
//! current acquisition) of its oldest sample. All positions handed around by
//! the scheduler are these absolute offsets, so nothing is invalidated when
//! samples are pushed or evicted.

use crate::c64;

/// A fixed-capacity ring of samples for a single channel. The contents are
/// always a contiguous run of the channel's samples, covering absolute offsets
/// `first_abs..first_abs + len`.
#[derive(Debug, Clone)]
pub(crate) struct ChannelBuffer {
    ring: Vec<c64>,
    head: usize,
    len: usize,
    first_abs: u64,
}

impl ChannelBuffer {
    pub(crate) fn new(capacity: usize) -> ChannelBuffer {
        ChannelBuffer {
            ring: vec![c64::default(); capacity],
            head: 0,
            len: 0,
            first_abs: 0,
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.ring.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// The absolute offset of the oldest buffered sample.
    pub(crate) fn first_abs(&self) -> u64 {
        self.first_abs
    }

    /// The absolute offset one past the newest buffered sample.
    pub(crate) fn end_abs(&self) -> u64 {
        self.first_abs + self.len as u64
    }

    /// Drop everything; the next pushed sample will have absolute offset
    /// `start_abs`.
    pub(crate) fn reset(&mut self, start_abs: u64) {
        self.head = 0;
        self.len = 0;
        self.first_abs = start_abs;
    }

    /// Make sure at least `capacity` samples can be held. Existing samples are
    /// kept (and linearised).
    pub(crate) fn grow_to(&mut self, capacity: usize) {
        if capacity <= self.capacity() {
            return;
        }
        let mut ring = Vec::with_capacity(capacity);
        let (a, b) = self.as_slices();
        ring.extend_from_slice(a);
        ring.extend_from_slice(b);
        ring.resize(capacity, c64::default());
        self.ring = ring;
        self.head = 0;
    }

    /// Skip over samples that no window will ever reference; the buffer must
    /// be empty. This moves the absolute offset of the next pushed sample.
    pub(crate) fn skip_to(&mut self, abs: u64) {
        debug_assert_eq!(self.len, 0);
        debug_assert!(abs >= self.first_abs);
        self.head = 0;
        self.first_abs = abs;
    }

    /// Append samples. Panics if the capacity would be exceeded; the caller is
    /// responsible for growing the buffer first.
    pub(crate) fn extend<I: Iterator<Item = c64>>(&mut self, samples: I) {
        let cap = self.capacity();
        for s in samples {
            assert!(self.len < cap, "channel buffer overflow");
            let i = (self.head + self.len) % cap;
            self.ring[i] = s;
            self.len += 1;
        }
    }

    /// Remove all samples strictly before the absolute offset `abs`. Offsets
    /// beyond the end of the buffer empty it.
    pub(crate) fn evict_through(&mut self, abs: u64) {
        if abs <= self.first_abs {
            return;
        }
        let n = ((abs - self.first_abs) as usize).min(self.len);
        if self.capacity() > 0 {
            self.head = (self.head + n) % self.capacity();
        }
        self.len -= n;
        self.first_abs += n as u64;
        debug_assert!(self.len <= self.capacity());
    }

    /// Copy the samples covering `start_abs..start_abs + out.len()` into
    /// `out`. Panics if they aren't all buffered.
    pub(crate) fn copy_window(&self, start_abs: u64, out: &mut [c64]) {
        assert!(
            start_abs >= self.first_abs && start_abs + out.len() as u64 <= self.end_abs(),
            "window {}..{} is not within the buffered samples {}..{}",
            start_abs,
            start_abs + out.len() as u64,
            self.first_abs,
            self.end_abs()
        );
        let cap = self.capacity();
        let offset = (start_abs - self.first_abs) as usize;
        let start = (self.head + offset) % cap;
        let first_len = out.len().min(cap - start);
        out[..first_len].copy_from_slice(&self.ring[start..start + first_len]);
        let rest = out.len() - first_len;
        out[first_len..].copy_from_slice(&self.ring[..rest]);
    }

    fn as_slices(&self) -> (&[c64], &[c64]) {
        let cap = self.capacity();
        if self.head + self.len <= cap {
            (&self.ring[self.head..self.head + self.len], &[])
        } else {
            let wrapped = self.head + self.len - cap;
            (&self.ring[self.head..], &self.ring[..wrapped])
        }
    }
}

/// One [`ChannelBuffer`] per channel. All channels are always kept in
/// lockstep.
#[derive(Debug, Clone)]
pub(crate) struct ChannelBuffers {
    buffers: Vec<ChannelBuffer>,
}

impl ChannelBuffers {
    pub(crate) fn new(num_channels: usize, capacity: usize) -> ChannelBuffers {
        ChannelBuffers {
            buffers: vec![ChannelBuffer::new(capacity); num_channels],
        }
    }

    pub(crate) fn num_channels(&self) -> usize {
        self.buffers.len()
    }

    pub(crate) fn channel(&self, i_chan: usize) -> &ChannelBuffer {
        &self.buffers[i_chan]
    }

    pub(crate) fn capacity(&self) -> usize {
        self.buffers.first().map(|b| b.capacity()).unwrap_or(0)
    }

    pub(crate) fn len(&self) -> usize {
        self.buffers.first().map(|b| b.len()).unwrap_or(0)
    }

    pub(crate) fn first_abs(&self) -> u64 {
        self.buffers.first().map(|b| b.first_abs()).unwrap_or(0)
    }

    pub(crate) fn end_abs(&self) -> u64 {
        self.buffers.first().map(|b| b.end_abs()).unwrap_or(0)
    }

    pub(crate) fn reset(&mut self, start_abs: u64) {
        self.buffers.iter_mut().for_each(|b| b.reset(start_abs));
    }

    pub(crate) fn grow_to(&mut self, capacity: usize) {
        self.buffers.iter_mut().for_each(|b| b.grow_to(capacity));
    }

    pub(crate) fn skip_to(&mut self, abs: u64) {
        self.buffers.iter_mut().for_each(|b| b.skip_to(abs));
    }

    pub(crate) fn push_chunk<I: Iterator<Item = c64>>(&mut self, i_chan: usize, samples: I) {
        self.buffers[i_chan].extend(samples);
    }

    pub(crate) fn evict_through(&mut self, i_chan: usize, abs: u64) {
        self.buffers[i_chan].evict_through(abs);
    }

    /// Check that all channels cover exactly the same absolute offsets.
    pub(crate) fn in_lockstep(&self) -> bool {
        self.buffers
            .iter()
            .all(|b| b.first_abs() == self.first_abs() && b.len() == self.len())
    }
}
