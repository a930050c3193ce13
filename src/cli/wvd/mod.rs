// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.


use std::{path::PathBuf, str::FromStr};

use clap::Parser;
use itertools::Itertools;
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};
use vec1::Vec1;

use super::common::{display_warnings, InfoPrinter, Warn, ARG_FILE_HELP};
use crate::{
    constants::{
        DEFAULT_RECORD_SIZE, DEFAULT_SAMPLE_FORMAT, DEFAULT_SAMPLE_RATE, DEFAULT_STRIDE,
        DEFAULT_WINDOWS_TO_AVERAGE, DEFAULT_WINDOW_SIZE,
    },
    engine::{ChannelPair, EngineConfig, WvdEngine},
    io::{
        get_all_matches_from_glob,
        read::{RawChunkReader, RawReadOptions, SampleFormat, SAMPLE_FORMATS_COMMA_SEPARATED},
        write::{can_write_to_file, SpectrumOutputType, SPECTRUM_OUTPUT_EXTENSIONS},
    },
    params::WvdParams,
    transform::{AnalysisWindow, ANALYSIS_WINDOWS_COMMA_SEPARATED},
    WignerError,
};

lazy_static::lazy_static! {
    static ref SAMPLE_FORMAT_HELP: String =
        format!("The format of each sample in the raw files. Supported formats: {}. Default: {DEFAULT_SAMPLE_FORMAT}", *SAMPLE_FORMATS_COMMA_SEPARATED);

    static ref SAMPLE_RATE_HELP: String =
        format!("The rate at which each channel was sampled [Hz]. Default: {DEFAULT_SAMPLE_RATE:e}");

    static ref RECORD_SIZE_HELP: String =
        format!("The number of samples per channel in each record; each record is ingested as one chunk. Default: {DEFAULT_RECORD_SIZE}");

    static ref WINDOW_SIZE_HELP: String =
        format!("The number of samples per channel in a window. This is also the number of frequency bins. Default: {DEFAULT_WINDOW_SIZE}");

    static ref STRIDE_HELP: String =
        format!("The number of samples between the starts of consecutive windows. Windows overlap if this is smaller than the window size, and samples between windows are ignored if it is bigger. Default: {DEFAULT_STRIDE}");

    static ref WINDOWS_TO_AVERAGE_HELP: String =
        format!("The number of consecutive windows summed into each output spectrum. Default: {DEFAULT_WINDOWS_TO_AVERAGE}");

    static ref ANALYSIS_WINDOW_HELP: String =
        format!("A window function to apply to each correlation sequence before it is transformed. Supported windows: {}. Default: none", *ANALYSIS_WINDOWS_COMMA_SEPARATED);

    static ref OUTPUTS_HELP: String =
        format!("Paths to the output spectrum files. Supported formats: {}", *SPECTRUM_OUTPUT_EXTENSIONS);
}

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct WvdArgs {
    #[clap(name = "ARGUMENTS_FILE", help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    pub(super) args_file: Option<PathBuf>,

    /// Paths to raw sample files; globs are accepted. Each file is a separate
    /// acquisition, and files are read in the order given.
    #[clap(short, long, multiple_values(true), help_heading = "INPUT FILES")]
    pub(super) inputs: Option<Vec<String>>,

    /// The number of channels interleaved in the raw files.
    #[clap(short, long, help_heading = "INPUT FILES")]
    pub(super) channels: Option<usize>,

    #[clap(long, help = SAMPLE_FORMAT_HELP.as_str(), help_heading = "INPUT FILES")]
    pub(super) sample_format: Option<String>,

    #[clap(long, help = SAMPLE_RATE_HELP.as_str(), help_heading = "INPUT FILES")]
    pub(super) sample_rate: Option<f64>,

    #[clap(long, help = RECORD_SIZE_HELP.as_str(), help_heading = "INPUT FILES")]
    pub(super) record_size: Option<usize>,

    /// The timestamp of the first sample of the first file [ns]. Default: 0
    #[clap(long, help_heading = "INPUT FILES")]
    pub(super) run_start_ns: Option<u64>,

    #[clap(long, help = WINDOW_SIZE_HELP.as_str(), help_heading = "CORRELATION")]
    pub(super) window_size: Option<usize>,

    #[clap(long, help = STRIDE_HELP.as_str(), help_heading = "CORRELATION")]
    pub(super) stride: Option<usize>,

    #[clap(long, help = WINDOWS_TO_AVERAGE_HELP.as_str(), help_heading = "CORRELATION")]
    pub(super) windows_to_average: Option<usize>,

    /// A pair of channels to correlate, e.g. "0,1". May be given multiple
    /// times. Default: the autocorrelation of every channel
    #[clap(long, multiple_occurrences(true), help_heading = "CORRELATION")]
    pub(super) pair: Option<Vec<String>>,

    #[clap(long, help = ANALYSIS_WINDOW_HELP.as_str(), help_heading = "CORRELATION")]
    pub(super) analysis_window: Option<String>,

    #[clap(
        short = 'o',
        long,
        multiple_values(true),
        help = OUTPUTS_HELP.as_str(),
        help_heading = "OUTPUT FILES"
    )]
    pub(super) outputs: Option<Vec<PathBuf>>,
}

impl WvdArgs {
    /// Both command-line and file arguments overlap in terms of what is
    /// available; this function consolidates everything that was specified into
    /// a single struct. Where applicable, it will prefer CLI parameters over
    /// those in the file.
    ///
    /// This function should only ever merge arguments, and not try to make
    /// sense of them.
    pub(super) fn merge(self) -> Result<WvdArgs, WignerError> {
        debug!("Merging command-line arguments with the argument file");

        let cli_args = self;

        if let Some(arg_file) = cli_args.args_file {
            // Read in the file arguments. Ensure all of the file args are
            // accounted for by pattern matching.
            let WvdArgs {
                args_file: _,
                inputs,
                channels,
                sample_format,
                sample_rate,
                record_size,
                run_start_ns,
                window_size,
                stride,
                windows_to_average,
                pair,
                analysis_window,
                outputs,
            } = unpack_arg_file!(arg_file);

            // Merge all the arguments, preferring the CLI args when available.
            Ok(WvdArgs {
                args_file: None,
                inputs: cli_args.inputs.or(inputs),
                channels: cli_args.channels.or(channels),
                sample_format: cli_args.sample_format.or(sample_format),
                sample_rate: cli_args.sample_rate.or(sample_rate),
                record_size: cli_args.record_size.or(record_size),
                run_start_ns: cli_args.run_start_ns.or(run_start_ns),
                window_size: cli_args.window_size.or(window_size),
                stride: cli_args.stride.or(stride),
                windows_to_average: cli_args.windows_to_average.or(windows_to_average),
                pair: cli_args.pair.or(pair),
                analysis_window: cli_args.analysis_window.or(analysis_window),
                outputs: cli_args.outputs.or(outputs),
            })
        } else {
            Ok(cli_args)
        }
    }

    pub(super) fn parse(self) -> Result<WvdParams, WignerError> {
        debug!("{:#?}", self);

        let Self {
            args_file: _,
            inputs,
            channels,
            sample_format,
            sample_rate,
            record_size,
            run_start_ns,
            window_size,
            stride,
            windows_to_average,
            pair,
            analysis_window,
            outputs,
        } = self;

        // Input files.
        let mut input_files = vec![];
        for input in inputs.unwrap_or_default() {
            input_files.extend(get_all_matches_from_glob(&input)?);
        }
        let input_files = Vec1::try_from_vec(input_files).map_err(|_| WvdArgsError::NoInputs)?;
        let num_channels = channels.ok_or(WvdArgsError::NoChannels)?;
        let sample_format = {
            let s = sample_format.unwrap_or_else(|| DEFAULT_SAMPLE_FORMAT.to_string());
            SampleFormat::from_str(&s.to_lowercase())
                .map_err(|_| WvdArgsError::ParseSampleFormat(s))?
        };
        let sample_rate = sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE);
        let record_size = record_size.unwrap_or(DEFAULT_RECORD_SIZE);
        let run_start_ns = run_start_ns.unwrap_or(0);

        // Correlation.
        let window_size = window_size.unwrap_or(DEFAULT_WINDOW_SIZE);
        let stride = stride.unwrap_or(DEFAULT_STRIDE);
        let windows_to_average = windows_to_average.unwrap_or(DEFAULT_WINDOWS_TO_AVERAGE);
        let pairs = match pair {
            Some(pairs) => {
                let parsed = pairs
                    .iter()
                    .map(|p| ChannelPair::from_str(p).map_err(WvdArgsError::ParsePair))
                    .collect::<Result<Vec<_>, _>>()?;
                let unique = parsed.iter().copied().unique().collect::<Vec<_>>();
                if unique.len() != parsed.len() {
                    "Duplicate channel pairs were specified; each pair is only correlated once"
                        .warn();
                }
                unique
            }
            None => (0..num_channels).map(|c| ChannelPair::new(c, c)).collect(),
        };
        let analysis_window = analysis_window
            .map(|w| {
                AnalysisWindow::from_str(&w.to_lowercase())
                    .map_err(|_| WvdArgsError::ParseAnalysisWindow(w))
            })
            .transpose()?;
        if stride > window_size {
            format!(
                "The stride ({stride}) is bigger than the window size ({window_size}); {} samples between windows are ignored",
                stride - window_size
            )
            .warn();
        }

        // Outputs.
        let outputs = outputs.unwrap_or_default();
        let mut checked_outputs = Vec::with_capacity(outputs.len());
        for file in outputs {
            let output_type = file
                .extension()
                .and_then(|e| e.to_str())
                .and_then(|e| SpectrumOutputType::from_str(&e.to_lowercase()).ok())
                .ok_or_else(|| WvdArgsError::OutputFileExtension {
                    file: file.display().to_string(),
                })?;
            can_write_to_file(&file)?;
            checked_outputs.push((file, output_type));
        }
        let outputs = Vec1::try_from_vec(checked_outputs).map_err(|_| WvdArgsError::NoOutputs)?;

        let reader = RawChunkReader::new(
            &input_files,
            RawReadOptions {
                num_channels,
                record_size,
                sample_format,
                sample_rate,
                run_start_ns,
            },
        )?;
        let mut engine = WvdEngine::new();
        engine.initialize(EngineConfig {
            sample_rate,
            num_channels,
            expected_chunk_size: record_size,
            window_size,
            stride,
            windows_to_average,
            pairs: pairs.clone(),
            analysis_window,
        })?;

        let mut printer = InfoPrinter::new("Wigner-Ville correlation set up".into());
        let mut block = vec![format!("{} input files:", input_files.len()).into()];
        block.extend(input_files.iter().map(|f| f.display().to_string().into()));
        printer.push_block(block);
        printer.push_block(vec![
            format!("{num_channels} channels of {sample_format} samples").into(),
            format!("Sample rate: {} MHz", sample_rate / 1e6).into(),
            format!("Record size: {record_size} samples; {} chunks", reader.num_chunks()).into(),
        ]);
        printer.push_block(vec![
            format!("Window size: {window_size} samples, stride: {stride} samples").into(),
            format!("Summing {} windows per spectrum", windows_to_average.max(1)).into(),
            format!(
                "Bin width: {} kHz",
                sample_rate / (2 * window_size.max(1)) as f64 / 1e3
            )
            .into(),
            match analysis_window {
                Some(w) => format!("Analysis window: {w}").into(),
                None => "No analysis window".into(),
            },
        ]);
        printer.push_line(
            format!(
                "Channel pairs: {}",
                pairs.iter().map(|p| format!("({p})")).join(" ")
            )
            .into(),
        );
        let mut block = vec!["Outputs:".into()];
        block.extend(outputs.iter().map(|(f, _)| f.display().to_string().into()));
        printer.push_block(block);
        printer.display();
        display_warnings();

        Ok(WvdParams {
            reader,
            engine,
            outputs,
        })
    }

    pub(super) fn run(self, dry_run: bool) -> Result<(), WignerError> {
        debug!("Converting arguments into parameters");
        trace!("{:#?}", self);
        let params = self.parse()?;

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        params.run()?;
        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub(super) enum WvdArgsError {
    #[error("No raw sample files were specified")]
    NoInputs,

    #[error("The number of channels in the raw files wasn't specified")]
    NoChannels,

    #[error("No output spectrum files were specified")]
    NoOutputs,

    #[error("Couldn't parse '{0}' as a sample format")]
    ParseSampleFormat(String),

    #[error("{0}")]
    ParsePair(String),

    #[error("Couldn't parse '{0}' as an analysis window")]
    ParseAnalysisWindow(String),

    #[error("Output file '{file}' doesn't have a recognised extension. Supported formats: {}", *SPECTRUM_OUTPUT_EXTENSIONS)]
    OutputFileExtension { file: String },
}
