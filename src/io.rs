//! Loading arrays from and storing them to text files.
//!
//! Input is a stream of whitespace-separated integers; output is one integer per line.

use std::{
    fs::File,
    io::{self, BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use log::debug;

use crate::{
    Element,
    error::{Result, ScanError},
};

/// An array read by [`read_array`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedArray {
    /// Exactly `len` values; positions the source did not supply are zero.
    pub values: Vec<Element>,
    /// How many values the source actually supplied (at most `len`).
    pub provided: usize,
}

impl LoadedArray {
    /// Whether enough values were supplied for a scan: all of them, or all but the last.
    #[inline]
    pub fn is_sufficient(&self) -> bool {
        self.provided + 1 >= self.values.len()
    }
}

/// Reads up to `len` whitespace-separated integers from `reader`.
///
/// Values past `len` are ignored. A token that is not an integer fails the whole read.
pub fn read_array<R: BufRead>(reader: R, len: usize) -> Result<LoadedArray> {
    let mut values = vec![0; len];
    let mut provided = 0;

    'lines: for line in reader.lines() {
        let line = line.map_err(ScanError::Read)?;
        for token in line.split_whitespace() {
            if provided == len {
                break 'lines;
            }
            match token.parse::<Element>() {
                Ok(value) => values[provided] = value,
                Err(source) => {
                    return Err(ScanError::Parse {
                        index: provided,
                        token: token.to_owned(),
                        source,
                    });
                }
            }
            provided += 1;
        }
    }

    Ok(LoadedArray { values, provided })
}

/// Loads a `len`-element array from the file at `path`.
///
/// A file supplying `len - 1` values is accepted and the missing trailing value is zero; any
/// shorter file is a [`ScanError::ShortInput`].
pub fn load_array(path: impl AsRef<Path>, len: usize) -> Result<Vec<Element>> {
    let path = path.as_ref();
    let io_err = |source| ScanError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(io_err)?;
    let loaded = read_array(BufReader::new(file), len).map_err(|err| match err {
        ScanError::Read(source) => io_err(source),
        other => other,
    })?;
    debug!(
        "read {} of {len} values from {}",
        loaded.provided,
        path.display()
    );

    if !loaded.is_sufficient() {
        return Err(ScanError::ShortInput {
            expected: len,
            found: loaded.provided,
        });
    }
    Ok(loaded.values)
}

/// Writes `values` to `writer`, one per line.
pub fn write_array<W: Write>(mut writer: W, values: &[Element]) -> io::Result<()> {
    for value in values {
        writeln!(writer, "{value}")?;
    }
    writer.flush()
}

/// Creates (or truncates) the file at `path` and writes `values` to it, one per line.
pub fn store_array(path: impl AsRef<Path>, values: &[Element]) -> Result<()> {
    let path = path.as_ref();
    File::create(path)
        .and_then(|file| write_array(BufWriter::new(file), values))
        .map_err(|source| ScanError::Io {
            path: path.to_path_buf(),
            source,
        })
}
