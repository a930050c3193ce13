// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Code to read chunks of samples from raw binary files.
//!
//! A raw file is a sequence of frames; each frame holds one sample for every
//! channel. Each file is a single acquisition, and files are read in the
//! order they are given. Every chunk holds one record of samples (the last
//! record of a file may be short).

mod error;

pub(crate) use error::ChunkReadError;

use std::{
    fs::File,
    io::{BufReader, Read},
    path::PathBuf,
};

use byteorder::{ByteOrder, LittleEndian};
use itertools::Itertools;
use log::{debug, trace, warn};
use ndarray::prelude::*;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use crate::{
    c64,
    chunk::{Chunk, ChunkHeader, ChunkSamples},
    constants::U8_SAMPLE_OFFSET,
};

/// All supported raw sample formats.
#[derive(Debug, Display, EnumIter, EnumString, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SampleFormat {
    /// Unsigned 8-bit offset-binary samples, centred at 128.
    #[strum(serialize = "u8")]
    U8,

    #[strum(serialize = "i8")]
    I8,

    /// Little-endian.
    #[strum(serialize = "i16")]
    I16,

    /// Little-endian.
    #[strum(serialize = "f32")]
    F32,

    /// Little-endian (re, im) pairs.
    #[strum(serialize = "cf32")]
    Cf32,
}

lazy_static::lazy_static! {
    pub(crate) static ref SAMPLE_FORMATS_COMMA_SEPARATED: String = SampleFormat::iter().join(", ");
}

impl SampleFormat {
    pub(crate) fn bytes_per_sample(self) -> usize {
        match self {
            SampleFormat::U8 | SampleFormat::I8 => 1,
            SampleFormat::I16 => 2,
            SampleFormat::F32 => 4,
            SampleFormat::Cf32 => 8,
        }
    }

    pub(crate) fn is_complex(self) -> bool {
        matches!(self, SampleFormat::Cf32)
    }

    /// Decode a single sample. `bytes` must be exactly
    /// [`SampleFormat::bytes_per_sample`] long.
    fn decode(self, bytes: &[u8]) -> c64 {
        match self {
            SampleFormat::U8 => c64::new(f64::from(bytes[0]) - U8_SAMPLE_OFFSET, 0.0),
            SampleFormat::I8 => c64::new(f64::from(bytes[0] as i8), 0.0),
            SampleFormat::I16 => c64::new(f64::from(LittleEndian::read_i16(bytes)), 0.0),
            SampleFormat::F32 => c64::new(f64::from(LittleEndian::read_f32(bytes)), 0.0),
            SampleFormat::Cf32 => c64::new(
                f64::from(LittleEndian::read_f32(&bytes[..4])),
                f64::from(LittleEndian::read_f32(&bytes[4..])),
            ),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct RawReadOptions {
    pub(crate) num_channels: usize,

    /// The number of samples per channel in a record.
    pub(crate) record_size: usize,

    pub(crate) sample_format: SampleFormat,

    /// \[Hz\]
    pub(crate) sample_rate: f64,

    /// The timestamp of the first sample of the first file \[ns\].
    pub(crate) run_start_ns: u64,
}

impl RawReadOptions {
    fn frame_bytes(&self) -> usize {
        self.num_channels * self.sample_format.bytes_per_sample()
    }
}

#[derive(Debug)]
struct RawFile {
    path: PathBuf,

    /// The number of whole frames in the file.
    num_frames: u64,
}

/// Produces [`Chunk`]s from raw sample files.
pub(crate) struct RawChunkReader {
    files: Vec<RawFile>,
    options: RawReadOptions,

    i_file: usize,
    current: Option<BufReader<File>>,
    frames_read_in_file: u64,
    records_read_in_file: u64,

    /// Samples per channel read over all files.
    run_samples: u64,
    run_records: u64,

    buffer: Vec<u8>,
}

impl RawChunkReader {
    /// Prepare to read the supplied files. Only the sizes of the files are
    /// inspected here.
    pub(crate) fn new(
        files: &[PathBuf],
        options: RawReadOptions,
    ) -> Result<RawChunkReader, ChunkReadError> {
        if files.is_empty() {
            return Err(ChunkReadError::NoInputs);
        }
        if options.num_channels == 0 {
            return Err(ChunkReadError::ZeroChannels);
        }
        if options.record_size == 0 {
            return Err(ChunkReadError::ZeroRecordSize);
        }

        let frame_bytes = options.frame_bytes() as u64;
        let files = files
            .iter()
            .map(|file| {
                let len = std::fs::metadata(file)
                    .map_err(|err| ChunkReadError::IO {
                        file: file.clone(),
                        err,
                    })?
                    .len();
                let num_frames = len / frame_bytes;
                if num_frames == 0 {
                    return Err(ChunkReadError::EmptyFile {
                        file: file.clone(),
                        num_channels: options.num_channels,
                    });
                }
                let trailing = len % frame_bytes;
                if trailing != 0 {
                    warn!(
                        "'{}' ends with {trailing} bytes that don't make a whole frame; ignoring them",
                        file.display()
                    );
                }
                debug!("'{}' has {num_frames} frames", file.display());
                Ok(RawFile {
                    path: file.clone(),
                    num_frames,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RawChunkReader {
            files,
            options,
            i_file: 0,
            current: None,
            frames_read_in_file: 0,
            records_read_in_file: 0,
            run_samples: 0,
            run_records: 0,
            buffer: vec![],
        })
    }

    /// The total number of chunks that will be produced.
    pub(crate) fn num_chunks(&self) -> u64 {
        let record_size = self.options.record_size as u64;
        self.files
            .iter()
            .map(|f| f.num_frames.div_ceil(record_size))
            .sum()
    }

    /// Read the next chunk. `None` is returned once every file has been
    /// exhausted.
    fn read_chunk(&mut self) -> Result<Option<Chunk>, ChunkReadError> {
        // Find a file with frames left to read.
        let file = loop {
            let Some(file) = self.files.get(self.i_file) else {
                return Ok(None);
            };
            if self.frames_read_in_file < file.num_frames {
                break file;
            }
            self.i_file += 1;
            self.current = None;
            self.frames_read_in_file = 0;
            self.records_read_in_file = 0;
        };
        let reader = match self.current.as_mut() {
            Some(r) => r,
            None => {
                trace!("Opening '{}'", file.path.display());
                let f = File::open(&file.path).map_err(|err| ChunkReadError::IO {
                    file: file.path.clone(),
                    err,
                })?;
                self.current.insert(BufReader::new(f))
            }
        };

        let RawReadOptions {
            num_channels,
            record_size,
            sample_format,
            sample_rate,
            run_start_ns,
        } = self.options;
        let remaining = file.num_frames - self.frames_read_in_file;
        let num_samples = remaining.min(record_size as u64) as usize;
        self.buffer.resize(num_samples * self.options.frame_bytes(), 0);
        reader
            .read_exact(&mut self.buffer)
            .map_err(|err| ChunkReadError::IO {
                file: file.path.clone(),
                err,
            })?;

        let bytes_per_sample = sample_format.bytes_per_sample();
        let frame_bytes = num_channels * bytes_per_sample;
        let buffer = &self.buffer;
        let sample = |(i_chan, i_sample): (usize, usize)| {
            let offset = i_sample * frame_bytes + i_chan * bytes_per_sample;
            sample_format.decode(&buffer[offset..offset + bytes_per_sample])
        };
        let shape = (num_channels, num_samples);
        let samples = if sample_format.is_complex() {
            ChunkSamples::Complex(Array2::from_shape_fn(shape, sample))
        } else {
            ChunkSamples::Real(Array2::from_shape_fn(shape, |i| sample(i).re))
        };

        let timestamp = run_start_ns + (self.run_samples as f64 * 1e9 / sample_rate).round() as u64;
        let header = ChunkHeader {
            start_sample_number: self.run_samples,
            start_record_number: self.run_records,
            end_record_number: self.run_records,
            record_ids: vec![self.records_read_in_file; num_channels],
            acquisition_ids: vec![self.i_file as u64; num_channels],
            timestamps: vec![timestamp; num_channels],
            is_new_acquisition: self.frames_read_in_file == 0,
            is_last: self.i_file + 1 == self.files.len() && remaining == num_samples as u64,
        };

        self.frames_read_in_file += num_samples as u64;
        self.records_read_in_file += 1;
        self.run_samples += num_samples as u64;
        self.run_records += 1;

        Ok(Some(Chunk { header, samples }))
    }
}

impl Iterator for RawChunkReader {
    type Item = Result<Chunk, ChunkReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_chunk().transpose()
    }
}
