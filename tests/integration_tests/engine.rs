// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tests of the library's engine API.

use std::{
    f64::consts::TAU,
    sync::{Arc, Mutex},
};

use approx::assert_abs_diff_eq;
use ndarray::prelude::*;

use wigner_stream::{
    c64, ChannelPair, Chunk, ChunkHeader, ChunkSamples, EngineConfig, OutputRecord, WvdEngine,
};

#[test]
fn a_tone_peaks_at_its_frequency() {
    // The lag step of the correlation sequence is two samples, so a bin is
    // sample_rate / (2 * window_size) = 8 Hz wide and a 96 Hz tone lands in
    // bin 12.
    let sample_rate = 1024.0;
    let window_size = 64;
    let tone = 96.0;

    let mut engine = WvdEngine::new();
    engine
        .initialize(EngineConfig {
            sample_rate,
            num_channels: 1,
            expected_chunk_size: 100,
            window_size,
            stride: window_size,
            windows_to_average: 1,
            pairs: vec![ChannelPair::new(0, 0)],
            analysis_window: None,
        })
        .unwrap();
    let records: Arc<Mutex<Vec<OutputRecord>>> = Arc::default();
    let sink = Arc::clone(&records);
    engine.connect_output(move |r| sink.lock().unwrap().push(r));

    let samples = Array2::from_shape_fn((1, 256), |(_, n)| {
        c64::from_polar(1.0, TAU * tone * n as f64 / sample_rate)
    });
    engine
        .ingest_chunk(&Chunk {
            header: ChunkHeader {
                record_ids: vec![0],
                acquisition_ids: vec![0],
                timestamps: vec![0],
                is_new_acquisition: true,
                is_last: true,
                ..Default::default()
            },
            samples: ChunkSamples::Complex(samples),
        })
        .unwrap();

    let records = records.lock().unwrap();
    assert_eq!(records.len(), 4);
    for (i, record) in records.iter().enumerate() {
        assert_eq!(record.header.sequence, i as u64);
        assert_eq!(record.header.start_sample_number, (i * window_size) as u64);
        let powers = record.spectra.row(0).mapv(|v| v.norm());
        let peak = powers
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i_bin, _)| i_bin)
            .unwrap();
        assert_eq!(peak, 12);
        assert_abs_diff_eq!(record.header.frequencies()[peak], tone);
        assert_abs_diff_eq!(powers[peak], window_size as f64, epsilon = 1e-9);
        assert_abs_diff_eq!(powers[peak + 1], 0.0, epsilon = 1e-9);
    }
    assert!(records[3].header.is_last);

    let stats = engine.stats();
    assert_eq!(stats.chunks_ingested, 1);
    assert_eq!(stats.windows_transformed, 4);
    assert_eq!(stats.records_emitted, 4);
}
