// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Functions to glob files.

use std::path::PathBuf;

use glob::glob;
use thiserror::Error;

/// Given a glob pattern, get all of the matches from the filesystem, sorted
/// by path. If nothing matches, an error is returned.
pub(crate) fn get_all_matches_from_glob(g: &str) -> Result<Vec<PathBuf>, GlobError> {
    let mut entries = vec![];
    for entry in glob(g)? {
        match entry {
            Ok(e) => entries.push(e),
            Err(e) => return Err(GlobError::GlobCrate(e)),
        }
    }
    if entries.is_empty() {
        return Err(GlobError::NoMatches {
            glob: g.to_string(),
        });
    }
    entries.sort();
    Ok(entries)
}

#[derive(Error, Debug)]
/// Error type associated with glob helper functions.
pub enum GlobError {
    #[error("No glob matches were found for {glob}")]
    NoMatches { glob: String },

    #[error(transparent)]
    GlobCrate(#[from] glob::GlobError),

    #[error(transparent)]
    PatternError(#[from] glob::PatternError),
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn matches_are_sorted() {
        let dir = TempDir::new().unwrap();
        for name in ["acq_2.raw", "acq_10.raw", "acq_1.raw", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        let pattern = dir.path().join("acq_*.raw");
        let entries = get_all_matches_from_glob(pattern.to_str().unwrap()).unwrap();
        assert_eq!(
            entries,
            vec![
                dir.path().join("acq_1.raw"),
                dir.path().join("acq_10.raw"),
                dir.path().join("acq_2.raw"),
            ]
        );

        // A plain path is its own match.
        let plain = dir.path().join("notes.txt");
        assert_eq!(
            get_all_matches_from_glob(plain.to_str().unwrap()).unwrap(),
            vec![plain]
        );
    }

    #[test]
    fn no_matches_is_an_error() {
        let dir = TempDir::new().unwrap();
        let pattern = dir.path().join("*.raw");
        let result = get_all_matches_from_glob(pattern.to_str().unwrap());
        assert!(matches!(result, Err(GlobError::NoMatches { .. })));

        let result = get_all_matches_from_glob("[");
        assert!(matches!(result, Err(GlobError::PatternError(_))));
    }
}
