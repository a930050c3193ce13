// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::{
    path::PathBuf,
    thread::{self, ScopedJoinHandle},
};

use crossbeam_channel::bounded;
use crossbeam_utils::atomic::AtomicCell;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::{debug, info};
use scopeguard::defer_on_unwind;
use vec1::Vec1;

use crate::{
    engine::{EngineStats, ProcessingError, WvdEngine},
    io::{
        read::{ChunkReadError, RawChunkReader},
        write::{write_spectra, SpectrumOutputType, SpectrumWriteError},
    },
    PROGRESS_BARS,
};

/// Everything needed to correlate raw sample files and write out spectra.
/// The reader has checked the input files and the engine has been
/// initialised.
pub(crate) struct WvdParams {
    pub(crate) reader: RawChunkReader,
    pub(crate) engine: WvdEngine,
    pub(crate) outputs: Vec1<(PathBuf, SpectrumOutputType)>,
}

impl WvdParams {
    pub(crate) fn run(self) -> Result<EngineStats, WvdError> {
        let WvdParams {
            reader,
            mut engine,
            outputs,
        } = self;
        let num_chunks = reader.num_chunks();

        // Channel for transferring chunks from the reader to the engine.
        let (tx_chunk, rx_chunk) = bounded(3);
        // Channel for transferring spectra from the engine to the writer.
        let (tx_record, rx_record) = bounded(3);
        engine.connect_output(move |record| {
            // If we can't send the record, it's because the writer has exited
            // due to error; the engine thread will see the error flag soon.
            let _ = tx_record.send(record);
        });

        // Progress bars.
        let multi_progress = MultiProgress::with_draw_target(if PROGRESS_BARS.load() {
            ProgressDrawTarget::stdout()
        } else {
            ProgressDrawTarget::hidden()
        });
        let chunk_style = ProgressStyle::default_bar()
            .template("{msg:18}: [{wide_bar:.blue}] {pos:3}/{len:3} chunks ({elapsed_precise}<{eta_precise})")
            .unwrap()
            .progress_chars("=> ");
        let read_progress = multi_progress.add(
            ProgressBar::new(num_chunks)
                .with_style(chunk_style.clone())
                .with_position(0)
                .with_message("Reading samples"),
        );
        let engine_progress = multi_progress.add(
            ProgressBar::new(num_chunks)
                .with_style(chunk_style)
                .with_position(0)
                .with_message("Correlating"),
        );
        let write_progress = multi_progress.add(
            ProgressBar::new_spinner()
                .with_style(
                    ProgressStyle::default_spinner()
                        .template("{msg:18}: {spinner} {pos} spectra ({elapsed_precise})")
                        .unwrap(),
                )
                .with_message("Writing spectra"),
        );

        // Use a variable to track whether any threads have an issue.
        let error = AtomicCell::new(false);
        let error = &error;

        info!("Reading samples, correlating and writing");
        let scoped_threads_result: Result<(EngineStats, String), WvdError> =
            thread::scope(|scope| {
                // Sample-reading thread.
                let read_handle: ScopedJoinHandle<Result<(), ChunkReadError>> =
                    thread::Builder::new()
                        .name("read".to_string())
                        .spawn_scoped(scope, move || {
                            // If a panic happens, update our atomic error.
                            defer_on_unwind! { error.store(true); }
                            read_progress.tick();

                            for chunk in reader {
                                if error.load() {
                                    break;
                                }
                                let chunk = match chunk {
                                    Ok(c) => c,
                                    Err(e) => {
                                        // Let the other threads see this so
                                        // they can abandon their work early.
                                        error.store(true);
                                        return Err(e);
                                    }
                                };

                                // If the chunk can't be sent, the engine has
                                // exited due to error.
                                if tx_chunk.send(chunk).is_err() {
                                    return Ok(());
                                }
                                read_progress.inc(1);
                            }

                            drop(tx_chunk);
                            debug!("Finished reading");
                            read_progress.abandon_with_message("Finished reading samples");
                            Ok(())
                        })
                        .expect("OS can create threads");

                // Correlation thread. When this thread finishes, the engine
                // (and the sender in its callback) is dropped, which lets the
                // writer finish.
                let engine_handle: ScopedJoinHandle<Result<EngineStats, ProcessingError>> =
                    thread::Builder::new()
                        .name("engine".to_string())
                        .spawn_scoped(scope, move || {
                            defer_on_unwind! { error.store(true); }
                            engine_progress.tick();

                            for chunk in rx_chunk.iter() {
                                if error.load() {
                                    return Ok(engine.stats());
                                }
                                let result = engine.ingest_chunk(&chunk);
                                if result.is_err() {
                                    error.store(true);
                                }
                                result?;
                                engine_progress.inc(1);
                            }

                            debug!("Finished correlating");
                            engine_progress.abandon_with_message("Finished correlating");
                            Ok(engine.stats())
                        })
                        .expect("OS can create threads");

                // Spectrum-writing thread.
                let write_handle = thread::Builder::new()
                    .name("write".to_string())
                    .spawn_scoped(scope, || {
                        defer_on_unwind! { error.store(true); }
                        write_progress.tick();

                        let result = write_spectra(&outputs, rx_record, error, Some(write_progress));
                        if result.is_err() {
                            error.store(true);
                        }
                        result
                    })
                    .expect("OS can create threads");

                // Join all thread handles. This propagates any errors and lets
                // us know if any threads panicked, if panics aren't aborting
                // as per the Cargo.toml.
                read_handle.join().unwrap()?;
                let stats = engine_handle.join().unwrap()?;
                let write_message = write_handle.join().unwrap()?;
                Ok((stats, write_message))
            });

        // Propagate errors and print out the write message.
        let (stats, write_message) = scoped_threads_result?;
        info!("{write_message}");
        info!(
            "{} chunks from {} acquisitions correlated; {} windows transformed into {} spectra",
            stats.chunks_ingested,
            stats.acquisitions,
            stats.windows_transformed,
            stats.records_emitted
        );
        if stats.windows_dropped > 0 {
            info!(
                "{} windows didn't complete a group and were not written",
                stats.windows_dropped
            );
        }

        Ok(stats)
    }
}

#[derive(thiserror::Error, Debug)]
pub(crate) enum WvdError {
    #[error(transparent)]
    ChunkRead(#[from] ChunkReadError),

    #[error(transparent)]
    Processing(#[from] ProcessingError),

    #[error(transparent)]
    SpectrumWrite(#[from] SpectrumWriteError),
}
