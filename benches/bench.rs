// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use criterion::*;
use ndarray::prelude::*;

use wigner_stream::{
    c64, AnalysisWindow, ChannelPair, Chunk, ChunkHeader, ChunkSamples, EngineConfig, WvdEngine,
};

fn chunk(num_samples: usize) -> Chunk {
    let samples = Array2::from_shape_fn((2, num_samples), |(c, n)| {
        c64::from_polar(1.0, 0.01 * (c + 1) as f64 * n as f64)
    });
    Chunk {
        header: ChunkHeader {
            record_ids: vec![0; 2],
            acquisition_ids: vec![0; 2],
            timestamps: vec![0; 2],
            // Every chunk starts afresh, so every iteration does the same
            // work.
            is_new_acquisition: true,
            ..Default::default()
        },
        samples: ChunkSamples::Complex(samples),
    }
}

fn ingest(c: &mut Criterion) {
    let chunk = chunk(4096);
    let mut group = c.benchmark_group("ingest 4096 samples");
    for stride in [1024, 256] {
        let mut engine = WvdEngine::new();
        engine
            .initialize(EngineConfig {
                sample_rate: 100e6,
                num_channels: 2,
                expected_chunk_size: 4096,
                window_size: 1024,
                stride,
                windows_to_average: 4,
                pairs: vec![
                    ChannelPair::new(0, 0),
                    ChannelPair::new(0, 1),
                    ChannelPair::new(1, 1),
                ],
                analysis_window: Some(AnalysisWindow::Hann),
            })
            .unwrap();
        engine.connect_output(|record| {
            black_box(record);
        });

        group.bench_with_input(BenchmarkId::new("stride", stride), &chunk, |b, chunk| {
            b.iter(|| engine.ingest_chunk(chunk).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, ingest);
criterion_main!(benches);
