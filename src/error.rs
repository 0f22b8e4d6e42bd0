//! Errors of the conversion pipeline.

use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Can't read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("Can't write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("Can't read CSV {}: {source}", .path.display())]
    Csv { path: PathBuf, source: csv::Error },

    #[error("Invalid configuration {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Unknown timezone: {0}")]
    Timezone(String),

    #[error("Invalid selection '{0}', expected i.e. LOG1810:c2,l4")]
    Selection(String),

    #[error("Invalid day override '{0}', expected i.e. 2024-10-01=LUN")]
    Override(String),

    #[error("The alternance calendar has no valid date, can't find the semester")]
    EmptyAlternance,

    #[error(transparent)]
    Interactive(#[from] dialoguer::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
