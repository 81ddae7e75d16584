//! Overlapping template matching test.
//!
//! Like the [non-overlapping](super::non_overlapping) test this searches
//! for an m-bit pattern with an m-bit window, but the window always slides
//! by one bit, so matches may overlap. The template is the run of m ones,
//! and the per-block match counts are binned into six classes whose
//! probabilities follow the closed-form recurrence over η = λ/2.

use crate::bitstream::Bitstream;
use crate::driver::StatisticalTest;
use crate::math::{check_f64, igamc, lgam};
use crate::params::{CommonParameters, DataType, ParameterInfo, ParameterSet, Value};
use crate::report::{ConfigurationDescriptor, TestResultRecord, ValueSet};
use crate::tests::{require_min_length, ResultBuilder};
use crate::{Error, TestInfo};
use std::f64::consts::LN_2;

use super::{count_matches, TEMPLATE_LENGTH_RANGE};

/// The block length recommended by SP 800-22 §2.8.2, in bits.
pub const DEFAULT_BLOCK_LENGTH: usize = 1032;

/// The degrees of freedom: match counts are binned into K + 1 classes
/// {0, 1, 2, 3, 4, >= 5}.
pub const FREEDOM_DEGREES: usize = 5;

/// The recommended minimum input length, in bits.
pub const MIN_INPUT_LENGTH: usize = DEFAULT_BLOCK_LENGTH;

pub(crate) const INFO: TestInfo = TestInfo {
    name: "overlapping template matching",
    suite: crate::SUITE_NAME,
    description: "Counts overlapping occurrences of the all-ones template \
                  within blocks of the bitstream and compares the class \
                  distribution of the counts against the one expected for a \
                  truly random sequence.",
    references: &["NIST SP 800-22 Rev 1a, section 2.8"],
    complexity: "linear",
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
        name: "block length",
        data_type: DataType::U64,
        units: Some("bits"),
        precision: None,
        default: "1032",
        min: Some("2"),
        max: None,
    },
];

/// Overlapping template matching test - No. 8.
///
/// See the [module docs](crate::tests::template_matching::overlapping).
pub struct OverlappingTemplateTest {
    common: CommonParameters,
    template: Vec<u8>,
    block_length: usize,
    probabilities: [f64; FREEDOM_DEGREES + 1],
}

impl OverlappingTemplateTest {
    pub fn new(common: &CommonParameters, set: &ParameterSet) -> Result<Self, Error> {
        require_min_length(common, MIN_INPUT_LENGTH, "overlapping template matching")?;

        let template_length = set.usize("template length")?;
        let block_length = set.usize("block length")?;

        if !TEMPLATE_LENGTH_RANGE.contains(&template_length) {
            return Err(Error::InvalidParameter(format!(
                "template length must be within {TEMPLATE_LENGTH_RANGE:?}, is {template_length}"
            )));
        }
        if block_length < template_length {
            return Err(Error::InvalidParameter(format!(
                "block length {block_length} is smaller than the template length {template_length}"
            )));
        }
        if block_length > common.bitstream_length {
            return Err(Error::InvalidParameter(format!(
                "block length {block_length} exceeds the bitstream length {}",
                common.bitstream_length
            )));
        }

        // the class probabilities only depend on the run parameters
        let lambda =
            ((block_length - template_length + 1) as f64) / f64::powi(2.0, template_length as i32);
        let eta = lambda / 2.0;

        let mut probabilities = [0.0; FREEDOM_DEGREES + 1];
        let mut sum = 0.0;
        for (class, probability) in probabilities
            .iter_mut()
            .enumerate()
            .take(FREEDOM_DEGREES)
        {
            *probability = class_probability(class, eta)?;
            sum += *probability;
        }
        probabilities[FREEDOM_DEGREES] = 1.0 - sum;

        Ok(Self {
            common: *common,
            template: vec![1_u8; template_length],
            block_length,
            probabilities,
        })
    }
}

impl StatisticalTest for OverlappingTemplateTest {
    fn info(&self) -> &'static TestInfo {
        &INFO
    }

    fn configurations(&self) -> Vec<ConfigurationDescriptor> {
        vec![ConfigurationDescriptor::new(1)]
    }

    fn execute(&mut self, stream: &Bitstream) -> Result<Vec<TestResultRecord>, Error> {
        let block_count = stream.len() / self.block_length;

        let mut builder = ResultBuilder::new(1, stream.id(), self.common.significance_level);
        builder.calc_u64("template length", self.template.len() as u64);
        builder.calc_u64("block length", self.block_length as u64);
        builder.calc_u64("block count", block_count as u64);

        // Step 1 + 2: count the overlapping matches per block and bin the
        // counts into the classes {0, 1, 2, 3, 4, >= 5}.
        let mut classes = [0_u64; FREEDOM_DEGREES + 1];
        for block in stream
            .bits()
            .chunks_exact(self.block_length)
            .take(block_count)
        {
            let matches = count_matches(block, &self.template, false);
            classes[matches.min(FREEDOM_DEGREES)] += 1;
        }

        let mut class_set = ValueSet::new("match class counts", DataType::U64);
        for (class, &count) in classes.iter().enumerate() {
            class_set.push(format!("{class}"), Value::U64(count));
        }
        builder.value_set(class_set);

        // Step 4: compute chi^2 = sum((v_i - N * pi_i)^2 / (N * pi_i))
        let chi = classes
            .iter()
            .zip(&self.probabilities)
            .map(|(&observed, &pi)| {
                let expected = (block_count as f64) * pi;
                f64::powi((observed as f64) - expected, 2) / expected
            })
            .sum::<f64>();

        // Step 5: compute the probability value igamc(K / 2, chi^2 / 2)
        match check_f64(chi).and_then(|()| igamc((FREEDOM_DEGREES as f64) / 2.0, chi / 2.0)) {
            Ok(p_value) => {
                builder.calc_f64("chi squared", chi);
                builder.probability_value(p_value);
            }
            Err(error) => builder.numeric_failure(&error),
        }

        Ok(vec![builder.finish()])
    }
}

/// The probability that the all-ones template occurs exactly `class` times
/// within one block, via the closed-form recurrence of SP 800-22 §3.8 over
/// η. Evaluated through lgam to stay stable for large classes.
pub(crate) fn class_probability(class: usize, eta: f64) -> Result<f64, Error> {
    if class == 0 {
        return Ok(f64::exp(-eta));
    }

    let u = class as f64;
    let mut sum = 0.0;
    for l in 1..=class {
        let l_f = l as f64;
        sum += f64::exp(
            -eta - u * LN_2 + l_f * eta.ln() - lgam(l_f + 1.0)? + lgam(u)?
                - lgam(l_f)?
                - lgam(u - l_f + 1.0)?,
        );
    }
    check_f64(sum)?;

    Ok(sum)
}
