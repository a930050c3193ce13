// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Things shared by command-line interfaces: argument files and printing.

mod printers;

pub(super) use printers::InfoPrinter;
pub(crate) use printers::{display_warnings, Warn};

use itertools::Itertools;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

lazy_static::lazy_static! {
    pub(super) static ref ARG_FILE_TYPES_COMMA_SEPARATED: String = ArgFileTypes::iter().join(", ");

    pub(super) static ref ARG_FILE_HELP: String =
        format!("All arguments may be specified in a file. Any CLI arguments override arguments set in the file. Supported formats: {}", *ARG_FILE_TYPES_COMMA_SEPARATED);
}

#[derive(Debug, Display, EnumIter, EnumString)]
pub(super) enum ArgFileTypes {
    #[strum(serialize = "toml")]
    Toml,
    #[strum(serialize = "json")]
    Json,
}

/// Read an arguments struct from a toml or json file, returning early with a
/// [`crate::cli::WignerError`] if that isn't possible.
macro_rules! unpack_arg_file {
    ($arg_file:expr) => ({
        use std::str::FromStr;

        use crate::cli::common::{ArgFileTypes, ARG_FILE_TYPES_COMMA_SEPARATED};

        let arg_file: &std::path::Path = &$arg_file;
        debug!("Attempting to parse argument file {}", arg_file.display());

        let arg_file_type = arg_file
            .extension()
            .and_then(|e| e.to_str())
            .and_then(|e| ArgFileTypes::from_str(&e.to_lowercase()).ok());
        let Some(arg_file_type) = arg_file_type else {
            return Err(WignerError::ArgFile(format!(
                "Argument file '{}' doesn't have a recognised file extension! Valid extensions are: {}",
                arg_file.display(),
                *ARG_FILE_TYPES_COMMA_SEPARATED
            )));
        };

        let contents = std::fs::read_to_string(arg_file)?;
        debug!("Parsing {arg_file_type} file...");
        let result = match arg_file_type {
            ArgFileTypes::Toml => toml::from_str(&contents).map_err(|e| e.to_string()),
            ArgFileTypes::Json => serde_json::from_str(&contents).map_err(|e| e.to_string()),
        };
        match result {
            Ok(p) => p,
            Err(err) => {
                return Err(WignerError::ArgFile(format!(
                    "Couldn't decode {arg_file_type} structure from '{}':\n{err}",
                    arg_file.display()
                )))
            }
        }
    });
}
