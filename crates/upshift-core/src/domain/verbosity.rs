//! Console verbosity levels.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Ordered: `Quiet < Normal < Verbose < Debug`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
    Debug,
}

impl Verbosity {
    /// Build from a signed level: -1 quiet, 0 normal, 1 verbose, 2 debug.
    pub fn from_level(level: i8) -> Result<Self, ConfigError> {
        match level {
            -1 => Ok(Verbosity::Quiet),
            0 => Ok(Verbosity::Normal),
            1 => Ok(Verbosity::Verbose),
            2 => Ok(Verbosity::Debug),
            other => Err(ConfigError::UnsupportedVerbosity(other)),
        }
    }

    /// Level from `-q` / `-v` style flags. Quiet wins over any `-v`;
    /// `-vv` and beyond all mean `Debug`.
    pub fn from_flags(quiet: bool, verbose: u8) -> Self {
        match (quiet, verbose) {
            (true, _) => Verbosity::Quiet,
            (false, 0) => Verbosity::Normal,
            (false, 1) => Verbosity::Verbose,
            (false, _) => Verbosity::Debug,
        }
    }

    pub fn level(self) -> i8 {
        match self {
            Verbosity::Quiet => -1,
            Verbosity::Normal => 0,
            Verbosity::Verbose => 1,
            Verbosity::Debug => 2,
        }
    }
}
