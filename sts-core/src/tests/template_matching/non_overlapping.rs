//! Non-overlapping template matching test.
//!
//! This test detects generators that produce too many occurrences of a
//! given aperiodic pattern. An m-bit window slides over each of N
//! independent blocks; after a match the window jumps past the matched
//! pattern. Every template of the library for the chosen length is one
//! configuration of this test, so each gets its own aggregation.

use crate::bitstream::Bitstream;
use crate::driver::StatisticalTest;
use crate::math::{check_f64, igamc};
use crate::params::{CommonParameters, DataType, ParameterInfo, ParameterSet, Value};
use crate::report::{ConfigurationDescriptor, TestResultRecord, ValueSet};
use crate::tests::ResultBuilder;
use crate::{Error, TestInfo};

use super::{aperiodic_templates, count_matches, template_text, TEMPLATE_LENGTH_RANGE};

/// The block count recommended by NIST.
pub const DEFAULT_BLOCK_COUNT: usize = 8;

pub(crate) const INFO: TestInfo = TestInfo {
    name: "non-overlapping template matching",
    suite: crate::SUITE_NAME,
    description: "Counts non-overlapping occurrences of every aperiodic \
                  template of the chosen length within independent blocks of \
                  the bitstream and compares them against the expected \
                  count for a truly random sequence.",
    references: &["NIST SP 800-22 Rev 1a, section 2.7"],
    complexity: "linear per template",
    version: env!("CARGO_PKG_VERSION"),
    authors: &["sts-core contributors"],
    maintainers: &["sts-core contributors"],
};

pub(crate) const PARAMETERS: &[ParameterInfo] = &[
    ParameterInfo {
        name: "template length",
        data_type: DataType::U64,
        units: Some("bits"),
        precision: None,
        default: "9",
        min: Some("2"),
        max: Some("21"),
    },
    ParameterInfo {
        name: "block count",
        data_type: DataType::U64,
        units: Some("blocks"),
        precision: None,
        default: "8",
        min: Some("1"),
        max: Some("99"),
    },
];

/// Non-overlapping template matching test - No. 7.
///
/// See the [module docs](crate::tests::template_matching::non_overlapping).
pub struct NonOverlappingTemplateTest {
    common: CommonParameters,
    templates: Vec<Vec<u8>>,
    template_length: usize,
    block_count: usize,
    block_length: usize,
}

impl NonOverlappingTemplateTest {
    pub fn new(common: &CommonParameters, set: &ParameterSet) -> Result<Self, Error> {
        let template_length = set.usize("template length")?;
        let block_count = set.usize("block count")?;

        if !TEMPLATE_LENGTH_RANGE.contains(&template_length) {
            return Err(Error::InvalidParameter(format!(
                "template length must be within {TEMPLATE_LENGTH_RANGE:?}, is {template_length}"
            )));
        }

        let block_length = common.bitstream_length / block_count;
        if block_length < template_length {
            return Err(Error::InvalidParameter(format!(
                "the derived block length {block_length} is smaller than the template length {template_length}"
            )));
        }

        Ok(Self {
            common: *common,
            templates: aperiodic_templates(template_length),
            template_length,
            block_count,
            block_length,
        })
    }
}

impl StatisticalTest for NonOverlappingTemplateTest {
    fn info(&self) -> &'static TestInfo {
        &INFO
    }

    fn configurations(&self) -> Vec<ConfigurationDescriptor> {
        self.templates
            .iter()
            .enumerate()
            .map(|(idx, template)| {
                ConfigurationDescriptor::with_attribute(
                    idx as u32 + 1,
                    "template",
                    template_text(template),
                )
            })
            .collect()
    }

    fn execute(&mut self, stream: &Bitstream) -> Result<Vec<TestResultRecord>, Error> {
        // Step 1: partition the stream into N independent blocks.
        let blocks = stream
            .bits()
            .chunks_exact(self.block_length)
            .take(self.block_count)
            .collect::<Vec<_>>();

        // Step 3: the theoretical mean and variance are shared by all
        // templates of one length.
        let two_pow_m = f64::powi(2.0, self.template_length as i32);
        let mean = ((self.block_length - self.template_length + 1) as f64) / two_pow_m;
        let variance = (self.block_length as f64)
            * (1.0 / two_pow_m
                - (2.0 * (self.template_length as f64) - 1.0) / f64::powi(two_pow_m, 2));

        // Step 2: count the non-overlapping matches of every template in
        // every block.
        // Step 4 + 5: per template, compute chi^2 = sum((W_j - mean)^2 /
        // variance) and the probability value igamc(N / 2, chi^2 / 2).
        let records = self
            .templates
            .iter()
            .enumerate()
            .map(|(idx, template)| {
                let mut builder = ResultBuilder::new(
                    idx as u32 + 1,
                    stream.id(),
                    self.common.significance_level,
                );
                builder.calc_u64("block length", self.block_length as u64);
                builder.calc_f64("theoretical mean", mean);
                builder.calc_f64("theoretical variance", variance);

                let matches = blocks
                    .iter()
                    .map(|block| count_matches(block, template, true))
                    .collect::<Vec<_>>();

                let mut per_block = ValueSet::new("matches per block", DataType::U64);
                for (block_idx, &count) in matches.iter().enumerate() {
                    per_block.push(format!("{block_idx}"), Value::U64(count as u64));
                }
                builder.value_set(per_block);

                let chi = matches
                    .iter()
                    .map(|&count| f64::powi((count as f64) - mean, 2) / variance)
                    .sum::<f64>();

                match check_f64(chi)
                    .and_then(|()| igamc((self.block_count as f64) / 2.0, chi / 2.0))
                {
                    Ok(p_value) => {
                        builder.calc_f64("chi squared", chi);
                        builder.probability_value(p_value);
                    }
                    Err(error) => builder.numeric_failure(&error),
                }

                builder.finish()
            })
            .collect();

        Ok(records)
    }
}
