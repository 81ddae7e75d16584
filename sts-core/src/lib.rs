#![doc = include_str!("../README.md")]

use strum::{Display, EnumIter, EnumString};
use thiserror::Error;

#[cfg(test)]
mod unit_tests;

// public exports
pub mod aggregate;
pub mod bitstream;
pub mod driver;
pub mod math;
pub mod params;
pub mod report;

// internal usage only
pub(crate) mod pool;

/// How many bits a byte of packed input expands to.
pub const BYTE_SIZE: usize = 8;

/// The suite every test in this crate belongs to.
pub const SUITE_NAME: &str = "NIST STS";

/// The significance level recommended by SP 800-22 §4.
pub const DEFAULT_SIGNIFICANCE_LEVEL: f64 = 0.01;

/// List of all tests, used e.g. for automatic running and CLI selection.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, EnumIter, EnumString, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Test {
    Frequency,
    FrequencyWithinABlock,
    Runs,
    LongestRunOfOnes,
    BinaryMatrixRank,
    SpectralDft,
    NonOverlappingTemplateMatching,
    OverlappingTemplateMatching,
    MaurersUniversalStatistical,
    LinearComplexity,
    Serial,
    ApproximateEntropy,
    CumulativeSums,
    RandomExcursions,
    RandomExcursionsVariant,
}

/// Static metadata describing one statistical test. Every kernel exposes one
/// program constant of this type; the driver copies it into the report header.
#[derive(Copy, Clone, Debug)]
pub struct TestInfo {
    pub name: &'static str,
    pub suite: &'static str,
    pub description: &'static str,
    pub references: &'static [&'static str],
    /// Rough runtime complexity in the bitstream length.
    pub complexity: &'static str,
    pub version: &'static str,
    pub authors: &'static [&'static str],
    pub maintainers: &'static [&'static str],
}

/// The error type for the whole suite.
#[derive(Error, Debug)]
pub enum Error {
    /// A parameter failed validation before any test ran. Fatal.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    /// A numeric function was evaluated outside its domain, or an
    /// intermediate value degenerated to NaN/infinity. Confined to the
    /// affected statistic evaluation.
    #[error("numeric domain violation: {0}")]
    NumericDomain(String),
    /// A denominator or scale factor vanished. Confined to the affected
    /// statistic evaluation.
    #[error("numeric underflow: {0}")]
    NumericUnderflow(String),
    /// The bitstream source or the output path failed. Fatal, no partial
    /// report is emitted.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the error is confined to a single statistic evaluation.
    /// Such errors mark the affected test failed (probability value 0.0,
    /// explicit failed criterion) instead of aborting the run.
    pub fn is_test_level(&self) -> bool {
        matches!(self, Error::NumericDomain(_) | Error::NumericUnderflow(_))
    }
}
