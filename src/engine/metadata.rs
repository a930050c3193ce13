// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Propagation of stream-position metadata from input chunks to output
//! records.

use std::collections::VecDeque;

use hifitime::{Duration, Unit};
use ndarray::prelude::*;

use super::ChannelPair;
use crate::{c64, chunk::ChunkHeader};

/// The metadata of an emitted [`OutputRecord`].
#[derive(Debug, Clone, PartialEq)]
pub struct OutputHeader {
    /// Counts up from 0 for each record emitted by an engine.
    pub sequence: u64,

    /// The absolute sample number of the first sample of the first window in
    /// this record.
    pub start_sample_number: u64,

    /// The last sample number of the most recent chunk when this record was
    /// emitted.
    pub end_sample_number: u64,

    pub start_record_number: u64,
    pub end_record_number: u64,

    /// The offset of the first window's start from the start of its
    /// acquisition \[samples\]. This is always a multiple of the stride.
    pub window_start: u64,

    /// Per-channel record IDs of the chunk the first window started in.
    pub record_ids: Vec<u64>,

    /// Per-channel acquisition IDs of the chunk the first window started in.
    pub acquisition_ids: Vec<u64>,

    /// Per-channel timestamps of the first window's first sample \[ns\].
    pub timestamps: Vec<u64>,

    pub time_in_run: Duration,
    pub time_in_acq: Duration,

    /// The number of windows summed into this record.
    pub num_windows: usize,

    pub window_size: usize,

    /// The width of a frequency bin \[Hz\]. The lag step of the correlation
    /// sequence is two samples, so this is half the usual FFT bin width.
    pub bin_width_hz: f64,

    pub is_last: bool,
}

impl OutputHeader {
    /// The frequency of each bin \[Hz\].
    pub fn frequencies(&self) -> Vec<f64> {
        (0..self.window_size)
            .map(|i| i as f64 * self.bin_width_hz)
            .collect()
    }
}

/// A time-frequency slice produced by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRecord {
    pub header: OutputHeader,

    /// The channel pairs, one per row of `spectra`.
    pub pairs: Vec<ChannelPair>,

    /// The (summed) transformed correlation sequences \[pair\]\[frequency\].
    pub spectra: Array2<c64>,
}

#[derive(Debug, Clone)]
pub(crate) struct HistoryEntry {
    /// The absolute offset of the chunk's first sample within its
    /// acquisition.
    pub(crate) first_abs: u64,
    pub(crate) header: ChunkHeader,
}

/// The headers of the chunks whose samples may still be used by a window.
/// Usually this is just the previous and current chunks, but a window can
/// span any number of small chunks.
#[derive(Debug, Default)]
pub(crate) struct ChunkHistory {
    entries: VecDeque<HistoryEntry>,
}

impl ChunkHistory {
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn push(&mut self, first_abs: u64, header: ChunkHeader) {
        debug_assert!(self
            .entries
            .back()
            .map(|e| e.first_abs <= first_abs)
            .unwrap_or(true));
        self.entries.push_back(HistoryEntry { first_abs, header });
    }

    /// Get the entry of the chunk containing the absolute offset `abs`.
    pub(crate) fn containing(&self, abs: u64) -> Option<&HistoryEntry> {
        self.entries.iter().rev().find(|e| e.first_abs <= abs)
    }

    /// Forget chunks that lie entirely before the absolute offset `abs`.
    pub(crate) fn prune(&mut self, abs: u64) {
        while self.entries.len() > 1 && self.entries[1].first_abs <= abs {
            self.entries.pop_front();
        }
    }
}

/// Start-of-group metadata, set when the first window of a group is
/// scheduled.
#[derive(Debug, Clone)]
struct GroupStart {
    start_sample_number: u64,
    start_record_number: u64,
    window_start: u64,
    record_ids: Vec<u64>,
    acquisition_ids: Vec<u64>,
    timestamps: Vec<u64>,
}

#[derive(Debug)]
pub(crate) struct MetadataPropagator {
    sample_rate: f64,
    window_size: usize,
    group: Option<GroupStart>,
    sequence: u64,
    is_last: bool,
}

impl MetadataPropagator {
    pub(crate) fn new(sample_rate: f64, window_size: usize) -> MetadataPropagator {
        MetadataPropagator {
            sample_rate,
            window_size,
            group: None,
            sequence: 0,
            is_last: false,
        }
    }

    pub(crate) fn observe_is_last(&mut self, is_last: bool) {
        self.is_last = is_last;
    }

    #[cfg(test)]
    pub(crate) fn next_sequence(&self) -> u64 {
        self.sequence
    }

    /// Forget the start of a partially-filled group.
    pub(crate) fn reset_group(&mut self) {
        self.group = None;
    }

    /// Record the start of a group from the chunk the group's first window
    /// starts in. Does nothing if a group has already been started.
    pub(crate) fn begin_group(&mut self, entry: &HistoryEntry, window_start: u64) {
        if self.group.is_some() {
            return;
        }
        let offset = window_start - entry.first_abs;
        let offset_ns = (offset as f64 * 1e9 / self.sample_rate).round() as u64;
        self.group = Some(GroupStart {
            start_sample_number: entry.header.start_sample_number + offset,
            start_record_number: entry.header.start_record_number,
            window_start,
            record_ids: entry.header.record_ids.clone(),
            acquisition_ids: entry.header.acquisition_ids.clone(),
            timestamps: entry
                .header
                .timestamps
                .iter()
                .map(|t| t.saturating_add(offset_ns))
                .collect(),
        });
    }

    /// Build the record for a completed group. The end fields come from
    /// `newest`, the chunk most recently ingested. Returns `None` if no group
    /// was started.
    pub(crate) fn finish(
        &mut self,
        newest: &ChunkHeader,
        newest_end_sample_number: u64,
        num_windows: usize,
        pairs: &[ChannelPair],
        spectra: Array2<c64>,
    ) -> Option<OutputRecord> {
        let group = self.group.take()?;
        let time_in_run = Duration::from_f64(
            group.start_sample_number as f64 / self.sample_rate,
            Unit::Second,
        );
        let time_in_acq =
            Duration::from_f64(group.window_start as f64 / self.sample_rate, Unit::Second);

        let header = OutputHeader {
            sequence: self.sequence,
            start_sample_number: group.start_sample_number,
            end_sample_number: newest_end_sample_number,
            start_record_number: group.start_record_number,
            end_record_number: newest.end_record_number,
            window_start: group.window_start,
            record_ids: group.record_ids,
            acquisition_ids: group.acquisition_ids,
            timestamps: group.timestamps,
            time_in_run,
            time_in_acq,
            num_windows,
            window_size: self.window_size,
            bin_width_hz: self.sample_rate / (2 * self.window_size) as f64,
            is_last: self.is_last,
        };
        self.sequence += 1;

        Some(OutputRecord {
            header,
            pairs: pairs.to_vec(),
            spectra,
        })
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    fn header(start_sample_number: u64, record: u64) -> ChunkHeader {
        ChunkHeader {
            start_sample_number,
            start_record_number: record,
            end_record_number: record,
            record_ids: vec![record, record],
            acquisition_ids: vec![7, 7],
            timestamps: vec![start_sample_number * 10, start_sample_number * 10],
            is_new_acquisition: false,
            is_last: false,
        }
    }

    #[test]
    fn history_finds_the_containing_chunk() {
        let mut h = ChunkHistory::default();
        h.push(0, header(1000, 0));
        h.push(100, header(1100, 1));
        h.push(200, header(1200, 2));
        assert_eq!(h.containing(0).unwrap().header.start_record_number, 0);
        assert_eq!(h.containing(99).unwrap().header.start_record_number, 0);
        assert_eq!(h.containing(100).unwrap().header.start_record_number, 1);
        assert_eq!(h.containing(250).unwrap().header.start_record_number, 2);

        h.prune(150);
        assert_eq!(h.len(), 2);
        assert_eq!(h.containing(150).unwrap().header.start_record_number, 1);
        // The newest chunk is always kept.
        h.prune(1000);
        assert_eq!(h.len(), 1);
        assert!(h.containing(199).is_none());
    }

    #[test]
    fn group_start_is_only_set_once() {
        // 100 MHz; 1 sample is 10 ns.
        let mut m = MetadataPropagator::new(1e8, 64);
        let first = HistoryEntry {
            first_abs: 0,
            header: header(1000, 0),
        };
        let second = HistoryEntry {
            first_abs: 100,
            header: header(1100, 1),
        };
        m.begin_group(&first, 32);
        m.begin_group(&second, 128);

        let newest = header(1100, 1);
        let record = m
            .finish(
                &newest,
                1199,
                2,
                &[ChannelPair::new(0, 1)],
                Array2::default((1, 64)),
            )
            .unwrap();
        let h = record.header;
        assert_eq!(h.sequence, 0);
        assert_eq!(h.start_sample_number, 1032);
        assert_eq!(h.start_record_number, 0);
        assert_eq!(h.end_sample_number, 1199);
        assert_eq!(h.end_record_number, 1);
        assert_eq!(h.window_start, 32);
        assert_eq!(h.timestamps, vec![10320, 10320]);
        assert_eq!(h.num_windows, 2);
        assert_abs_diff_eq!(h.time_in_run.to_seconds(), 1032e-8, epsilon = 1e-15);
        assert_abs_diff_eq!(h.time_in_acq.to_seconds(), 32e-8, epsilon = 1e-15);
        assert_abs_diff_eq!(h.bin_width_hz, 1e8 / 128.0);
        assert_abs_diff_eq!(h.frequencies()[2], 2.0 * 1e8 / 128.0);

        // Without a new group there's nothing to finish.
        assert!(m
            .finish(&newest, 1199, 1, &[], Array2::default((0, 64)))
            .is_none());
        assert_eq!(m.next_sequence(), 1);
    }

    #[test]
    fn start_timestamps_saturate() {
        let mut m = MetadataPropagator::new(1e8, 64);
        let mut h = header(0, 0);
        h.timestamps = vec![u64::MAX - 5, 100];
        let entry = HistoryEntry {
            first_abs: 0,
            header: h.clone(),
        };
        // 10 samples in is 100 ns.
        m.begin_group(&entry, 10);
        let record = m
            .finish(&h, 63, 1, &[ChannelPair::new(0, 0)], Array2::default((1, 64)))
            .unwrap();
        assert_eq!(record.header.timestamps, vec![u64::MAX, 200]);
    }
}
