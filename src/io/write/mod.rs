// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Code to write out spectra.

mod error;

pub(crate) use error::{FileWriteError, SpectrumWriteError};

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use byteorder::{LittleEndian, WriteBytesExt};
use crossbeam_channel::Receiver;
use crossbeam_utils::atomic::AtomicCell;
use indicatif::ProgressBar;
use itertools::Itertools;
use log::{debug, trace, warn};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};
use vec1::Vec1;

use crate::engine::OutputRecord;

#[derive(Debug, Display, EnumIter, EnumString, Clone, Copy, PartialEq, Eq)]
/// All supported spectrum output formats.
pub(crate) enum SpectrumOutputType {
    #[strum(serialize = "bin")]
    Binary,

    #[strum(serialize = "txt")]
    Text,
}

lazy_static::lazy_static! {
    pub(crate) static ref SPECTRUM_OUTPUT_EXTENSIONS: String = SpectrumOutputType::iter().join(", ");
}

/// The first bytes of every binary spectrum file.
pub(crate) const BINARY_MAGIC: &[u8; 4] = b"WVD1";

trait SpectrumWrite {
    fn write_record(&mut self, record: &OutputRecord) -> Result<(), SpectrumWriteError>;

    fn finalise(&mut self) -> Result<(), SpectrumWriteError>;
}

/// The number of channel pairs and frequency bins of the first record. All
/// later records must have the same layout. Returns `true` for the first
/// record.
fn check_layout(
    layout: &mut Option<(usize, usize)>,
    record: &OutputRecord,
) -> Result<bool, SpectrumWriteError> {
    let (num_pairs, num_bins) = record.spectra.dim();
    match *layout {
        None => {
            *layout = Some((num_pairs, num_bins));
            Ok(true)
        }
        Some((expected, _)) if expected != num_pairs => Err(SpectrumWriteError::InconsistentPairs {
            sequence: record.header.sequence,
            expected,
            got: num_pairs,
        }),
        Some((_, expected)) if expected != num_bins => Err(SpectrumWriteError::InconsistentBins {
            sequence: record.header.sequence,
            expected,
            got: num_bins,
        }),
        Some(_) => Ok(false),
    }
}

/// Little-endian binary spectra. The file starts with [`BINARY_MAGIC`], the
/// number of pairs (u32), the number of bins (u32), the bin width (f64, Hz)
/// and each pair (u32, u32). Each record is then the sequence number, start
/// and end sample numbers, start and end record numbers (all u64), the time
/// in the run (f64, s), the number of windows (u32), the last flag (u8) and
/// every (re, im) value as f64 in \[pair\]\[bin\] order.
pub(crate) struct BinaryWriter<W: Write> {
    out: W,
    layout: Option<(usize, usize)>,
}

impl<W: Write> BinaryWriter<W> {
    pub(crate) fn new(out: W) -> BinaryWriter<W> {
        BinaryWriter { out, layout: None }
    }

    #[cfg(test)]
    pub(crate) fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> SpectrumWrite for BinaryWriter<W> {
    fn write_record(&mut self, record: &OutputRecord) -> Result<(), SpectrumWriteError> {
        let out = &mut self.out;
        let h = &record.header;
        if check_layout(&mut self.layout, record)? {
            out.write_all(BINARY_MAGIC)?;
            out.write_u32::<LittleEndian>(record.pairs.len() as u32)?;
            out.write_u32::<LittleEndian>(h.window_size as u32)?;
            out.write_f64::<LittleEndian>(h.bin_width_hz)?;
            for pair in &record.pairs {
                out.write_u32::<LittleEndian>(pair.first as u32)?;
                out.write_u32::<LittleEndian>(pair.second as u32)?;
            }
        }

        for v in [
            h.sequence,
            h.start_sample_number,
            h.end_sample_number,
            h.start_record_number,
            h.end_record_number,
        ] {
            out.write_u64::<LittleEndian>(v)?;
        }
        out.write_f64::<LittleEndian>(h.time_in_run.to_seconds())?;
        out.write_u32::<LittleEndian>(h.num_windows as u32)?;
        out.write_u8(u8::from(h.is_last))?;
        for v in record.spectra.iter() {
            out.write_f64::<LittleEndian>(v.re)?;
            out.write_f64::<LittleEndian>(v.im)?;
        }
        Ok(())
    }

    fn finalise(&mut self) -> Result<(), SpectrumWriteError> {
        self.out.flush()?;
        Ok(())
    }
}

/// A human-readable table of the power (|X|²) of each pair in each bin.
pub(crate) struct TextWriter<W: Write> {
    out: W,
    layout: Option<(usize, usize)>,
}

impl<W: Write> TextWriter<W> {
    pub(crate) fn new(out: W) -> TextWriter<W> {
        TextWriter { out, layout: None }
    }

    #[cfg(test)]
    pub(crate) fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> SpectrumWrite for TextWriter<W> {
    fn write_record(&mut self, record: &OutputRecord) -> Result<(), SpectrumWriteError> {
        let h = &record.header;
        if check_layout(&mut self.layout, record)? {
            writeln!(
                self.out,
                "# frequency_hz {}",
                record.pairs.iter().map(|p| format!("power({p})")).join(" ")
            )?;
        }

        writeln!(
            self.out,
            "# record {} samples {}-{} records {}-{} time_in_run_s {:e} windows {} last {}",
            h.sequence,
            h.start_sample_number,
            h.end_sample_number,
            h.start_record_number,
            h.end_record_number,
            h.time_in_run.to_seconds(),
            h.num_windows,
            h.is_last,
        )?;
        for (freq, bin) in h.frequencies().into_iter().zip(record.spectra.columns()) {
            write!(self.out, "{freq:e}")?;
            for v in bin {
                write!(self.out, " {:e}", v.norm_sqr())?;
            }
            writeln!(self.out)?;
        }
        Ok(())
    }

    fn finalise(&mut self) -> Result<(), SpectrumWriteError> {
        self.out.flush()?;
        Ok(())
    }
}

/// Write spectra received from a channel to every output until the channel
/// is closed.
///
/// # Arguments
///
/// * `outputs` - the files to write to, each with its type.
/// * `rx` - the channel to receive records from.
/// * `error` - a thread-safe [`bool`] to indicate if an error has occurred.
///   Receiving `true` signals that we should not continue, as another thread
///   has experienced an error.
/// * `progress_bar` - an optional progress bar to increment with each record.
///
/// # Returns
///
/// * A neatly-formatted string reporting all of the files that got written out.
pub(crate) fn write_spectra(
    outputs: &Vec1<(PathBuf, SpectrumOutputType)>,
    rx: Receiver<OutputRecord>,
    error: &AtomicCell<bool>,
    progress_bar: Option<ProgressBar>,
) -> Result<String, SpectrumWriteError> {
    let mut writers: Vec<Box<dyn SpectrumWrite>> = Vec::with_capacity(outputs.len());
    for (output, output_type) in outputs {
        debug!("Setting up {} ({output_type})", output.display());
        let f = BufWriter::new(File::create(output)?);
        let writer: Box<dyn SpectrumWrite> = match output_type {
            SpectrumOutputType::Binary => Box::new(BinaryWriter::new(f)),
            SpectrumOutputType::Text => Box::new(TextWriter::new(f)),
        };
        writers.push(writer);
    }

    let mut num_records = 0;
    for record in rx.iter() {
        // If another thread has had an error, there's no point continuing.
        if error.load() {
            return Ok(String::new());
        }

        trace!("Writing record {}", record.header.sequence);
        for writer in writers.iter_mut() {
            writer.write_record(&record)?;
        }
        num_records += 1;
        if let Some(progress_bar) = progress_bar.as_ref() {
            progress_bar.inc(1);
        }
    }

    if let Some(progress_bar) = progress_bar.as_ref() {
        progress_bar.abandon_with_message("Finished writing spectra");
    }
    for writer in writers.iter_mut() {
        writer.finalise()?;
    }
    debug!("Finished writing");
    if num_records == 0 {
        warn!("No spectra were produced; is the input shorter than a window?");
    }

    let noun = if num_records == 1 {
        "spectrum"
    } else {
        "spectra"
    };
    Ok(if outputs.len() == 1 {
        format!(
            "{num_records} {noun} written to {}",
            outputs.first().0.display()
        )
    } else {
        format!(
            "{num_records} {noun} written to: {}",
            outputs.iter().map(|(o, _)| o.display()).join(", ")
        )
    })
}

/// Check if we are able to write to a file path. If we aren't able to write to
/// the file, it's either because the directory containing the file doesn't
/// exist, or there's another issue (probably bad permissions). In the former
/// case, create the parent directories, otherwise return an error.
/// Additionally, if the file exists, emit a warning that it will be
/// overwritten.
pub(crate) fn can_write_to_file(file: &Path) -> Result<(), FileWriteError> {
    trace!("Testing whether we can write to {}", file.display());

    if file.is_dir() {
        return Err(FileWriteError::FileNotWritable {
            file: file.display().to_string(),
        });
    }

    let exists = file.exists();
    match std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(file)
        .map_err(|e| e.kind())
    {
        Ok(_) => {
            if exists {
                warn!("Will overwrite the existing file '{}'", file.display());
            } else {
                // Don't leave an empty file behind.
                std::fs::remove_file(file)?;
            }
        }

        // Try to make the missing directories leading up to the file.
        Err(std::io::ErrorKind::NotFound) => {
            if let Some(p) = file.parent() {
                match std::fs::DirBuilder::new().recursive(true).create(p) {
                    Ok(()) => (),
                    Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                        return Err(FileWriteError::NewDirectory(p.to_path_buf()))
                    }
                    Err(e) => return Err(FileWriteError::IO(e)),
                }
            }
        }

        Err(std::io::ErrorKind::PermissionDenied) => {
            return Err(FileWriteError::FileNotWritable {
                file: file.display().to_string(),
            })
        }

        Err(e) => return Err(FileWriteError::IO(e.into())),
    }

    Ok(())
}
