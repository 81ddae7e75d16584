//! Shared types of the command line application.

use clap::ValueEnum;
use sts_core::Test;

pub mod cmd_args;

/// The supported input file formats.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    /// Packed bytes, 8 bits per byte, most significant bit first.
    Binary,
    /// One ASCII '0' or '1' character per bit, whitespace skipped. The
    /// format of the NIST reference data files.
    Ascii,
}

/// The tests that can be selected on the command line.
// this mirror only exists to keep the clap surface decoupled from the
// library enum; it breaks the build when a test is added to sts_core.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ArgTest {
    /// Frequency (monobit) test
    Frequency,
    /// Frequency test within a block
    FrequencyWithinABlock,
    /// Runs test
    Runs,
    /// Test for the longest run of ones in a block
    LongestRunOfOnes,
    /// Binary matrix rank test
    BinaryMatrixRank,
    /// Discrete Fourier transform (spectral) test
    SpectralDft,
    /// Non-overlapping template matching test
    NonOverlappingTemplateMatching,
    /// Overlapping template matching test
    OverlappingTemplateMatching,
    /// Maurer's universal statistical test
    MaurersUniversalStatistical,
    /// Linear complexity test
    LinearComplexity,
    /// Serial test
    Serial,
    /// Approximate entropy test
    ApproximateEntropy,
    /// Cumulative sums test
    CumulativeSums,
    /// Random excursions test
    RandomExcursions,
    /// Random excursions variant test
    RandomExcursionsVariant,
}

impl From<ArgTest> for Test {
    fn from(value: ArgTest) -> Self {
        match value {
            ArgTest::Frequency => Test::Frequency,
            ArgTest::FrequencyWithinABlock => Test::FrequencyWithinABlock,
            ArgTest::Runs => Test::Runs,
            ArgTest::LongestRunOfOnes => Test::LongestRunOfOnes,
            ArgTest::BinaryMatrixRank => Test::BinaryMatrixRank,
            ArgTest::SpectralDft => Test::SpectralDft,
            ArgTest::NonOverlappingTemplateMatching => Test::NonOverlappingTemplateMatching,
            ArgTest::OverlappingTemplateMatching => Test::OverlappingTemplateMatching,
            ArgTest::MaurersUniversalStatistical => Test::MaurersUniversalStatistical,
            ArgTest::LinearComplexity => Test::LinearComplexity,
            ArgTest::Serial => Test::Serial,
            ArgTest::ApproximateEntropy => Test::ApproximateEntropy,
            ArgTest::CumulativeSums => Test::CumulativeSums,
            ArgTest::RandomExcursions => Test::RandomExcursions,
            ArgTest::RandomExcursionsVariant => Test::RandomExcursionsVariant,
        }
    }
}

impl From<Test> for ArgTest {
    fn from(value: Test) -> Self {
        match value {
            Test::Frequency => ArgTest::Frequency,
            Test::FrequencyWithinABlock => ArgTest::FrequencyWithinABlock,
            Test::Runs => ArgTest::Runs,
            Test::LongestRunOfOnes => ArgTest::LongestRunOfOnes,
            Test::BinaryMatrixRank => ArgTest::BinaryMatrixRank,
            Test::SpectralDft => ArgTest::SpectralDft,
            Test::NonOverlappingTemplateMatching => ArgTest::NonOverlappingTemplateMatching,
            Test::OverlappingTemplateMatching => ArgTest::OverlappingTemplateMatching,
            Test::MaurersUniversalStatistical => ArgTest::MaurersUniversalStatistical,
            Test::LinearComplexity => ArgTest::LinearComplexity,
            Test::Serial => ArgTest::Serial,
            Test::ApproximateEntropy => ArgTest::ApproximateEntropy,
            Test::CumulativeSums => ArgTest::CumulativeSums,
            Test::RandomExcursions => ArgTest::RandomExcursions,
            Test::RandomExcursionsVariant => ArgTest::RandomExcursionsVariant,
        }
    }
}
