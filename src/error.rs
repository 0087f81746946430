use image::ImageError;
use std::collections::TryReserveError;
use std::io;
use thiserror::Error;

use crate::color::MAX_PALETTE_COLORS;

#[derive(Debug, Error)]
pub enum Error {
    /// Query against an index or palette built from zero colors
    #[error("palette is empty")]
    EmptyPalette,
    /// Transient buffer could not be allocated
    #[error("out of memory")]
    OutOfMemory(#[from] TryReserveError),
    #[error("{name} = {value} is out of range [{min}..={max}]")]
    ValueOutOfRange {
        name: &'static str,
        value: usize,
        min: usize,
        max: usize,
    },
    #[error("palette has more than {} colors", MAX_PALETTE_COLORS)]
    TooManyColors,
    #[error("palette line {line}: {reason}")]
    ParsePalette { line: usize, reason: String },
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub(crate) fn check_range(
    name: &'static str,
    value: usize,
    min: usize,
    max: usize,
) -> Result<usize> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(Error::ValueOutOfRange {
            name,
            value,
            min,
            max,
        })
    }
}
