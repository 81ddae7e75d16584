//! The generic test driver.
//!
//! The driver owns the run: it resolves the parameters, builds the kernel,
//! pulls bitstreams from the source in order, dispatches them, merges the
//! returned records into the report it owns exclusively, and finally runs
//! the aggregation pass over every configuration.
//!
//! Kernels never touch the report. They hand their records back as values,
//! and the driver merges them only when the whole execute call succeeded,
//! so a failure inside one bitstream cannot corrupt the state recorded for
//! the others. Record order within the report follows bitstream input
//! order even for kernels that complete work out of order on a pool.

use crate::aggregate;
use crate::bitstream::{Bitstream, BitstreamSource};
use crate::params::{CommonParameters, ParameterBundle, ParameterSet};
use crate::report::{
    ConfigurationDescriptor, ConfigurationReport, Evaluation, Report, ReportHeader,
    TestResultRecord,
};
use crate::{Error, Test, TestInfo};
use log::{debug, info, warn};
use std::io::ErrorKind;

/// The contract every test kernel implements.
///
/// Construction (per kernel) validates the resolved parameters and
/// precomputes the per-run constants; [configurations](Self::configurations)
/// seeds the report; [execute](Self::execute) runs the statistic for every
/// configuration against one bitstream; [finish](Self::finish) joins and
/// drains whatever a pooled kernel still has queued.
pub trait StatisticalTest: Send {
    /// Static metadata for the report header.
    fn info(&self) -> &'static TestInfo;

    /// Descriptors (id and attributes) for every configuration this kernel
    /// runs per bitstream. The ids are 1-based and dense.
    fn configurations(&self) -> Vec<ConfigurationDescriptor>;

    /// How many configurations this kernel runs per bitstream.
    fn configuration_count(&self) -> u32 {
        self.configurations().len() as u32
    }

    /// Run the statistic for every configuration against one bitstream.
    /// A pooled kernel may buffer the stream and return records for earlier
    /// bitstreams instead; records always come back in input order.
    fn execute(&mut self, stream: &Bitstream) -> Result<Vec<TestResultRecord>, Error>;

    /// Join and drain any still-queued work. Called once after the last
    /// bitstream.
    fn finish(&mut self) -> Result<Vec<TestResultRecord>, Error> {
        Ok(Vec::new())
    }

    /// Whether zero probability values are excluded from the uniformity
    /// histogram, as the random excursions tests require.
    fn uniformity_skips_zero(&self) -> bool {
        false
    }
}

/// Per-configuration bookkeeping the driver maintains across the run.
#[derive(Clone, Debug, Default)]
struct ConfigurationState {
    accumulated_ones: u64,
    accumulated_zeros: u64,
    tests_run: u64,
    tests_passed: u64,
    tests_failed: u64,
}

/// One prepared test run: a test, its resolved parameter set and the
/// validated common parameters.
pub struct TestDriver {
    test: Test,
    common: CommonParameters,
    set: ParameterSet,
}

impl TestDriver {
    /// Resolve and validate the parameters for the given test. Rejects
    /// unknown parameter names, out-of-range values and invalid common
    /// parameters before anything runs.
    pub fn new(test: Test, bundle: Option<&ParameterBundle>) -> Result<Self, Error> {
        let set = ParameterSet::resolve(test, bundle)?;
        let common = CommonParameters::from_set(&set)?;

        Ok(Self { test, common, set })
    }

    pub fn test(&self) -> Test {
        self.test
    }

    pub fn common(&self) -> &CommonParameters {
        &self.common
    }

    pub fn parameter_set(&self) -> &ParameterSet {
        &self.set
    }

    /// Process every bitstream of the run and produce the finalized report.
    ///
    /// The source must deliver `bitstream count` streams of `bitstream
    /// length` bits; running dry earlier is an I/O error and no report is
    /// emitted.
    pub fn run(
        &self,
        source: &mut dyn BitstreamSource,
        mut header: ReportHeader,
    ) -> Result<Report, Error> {
        let mut kernel = self.test.build(&self.common, &self.set)?;

        let test_info = kernel.info();
        header.test_name = test_info.name.to_owned();
        header.suite = test_info.suite.to_owned();
        header.description = test_info.description.to_owned();

        let mut configurations = kernel
            .configurations()
            .into_iter()
            .map(|descriptor| ConfigurationReport {
                id: descriptor.id,
                attributes: descriptor.attributes,
                tests: Vec::new(),
                metrics: None,
                criteria: Vec::new(),
                evaluation: Evaluation::Fail,
            })
            .collect::<Vec<_>>();
        let mut states = vec![ConfigurationState::default(); configurations.len()];

        info!(
            "running {} over {} bitstreams of {} bits ({} configurations)",
            test_info.name,
            self.common.bitstream_count,
            self.common.bitstream_length,
            configurations.len()
        );

        // the execution loop: one bitstream at a time, in input order
        for ordinal in 1..=self.common.bitstream_count {
            let stream = source
                .next_bitstream(ordinal, self.common.bitstream_length)?
                .ok_or_else(|| {
                    Error::Io(std::io::Error::new(
                        ErrorKind::UnexpectedEof,
                        format!(
                            "bitstream source exhausted after {} of {} streams",
                            ordinal - 1,
                            self.common.bitstream_count
                        ),
                    ))
                })?;

            if stream.len() != self.common.bitstream_length {
                return Err(Error::InvalidParameter(format!(
                    "bitstream {ordinal} has {} bits, expected {}",
                    stream.len(),
                    self.common.bitstream_length
                )));
            }

            debug!(
                "bitstream {ordinal}: ones = {}, zeros = {}",
                stream.ones(),
                stream.zeros()
            );

            // every configuration sees every bitstream
            for state in &mut states {
                state.accumulated_ones += stream.ones();
                state.accumulated_zeros += stream.zeros();
            }

            let records = kernel.execute(&stream)?;
            merge_records(&mut configurations, &mut states, records)?;
        }

        // join whatever a pooled kernel still holds
        let records = kernel.finish()?;
        merge_records(&mut configurations, &mut states, records)?;

        // the aggregation pass per configuration
        let skip_zero = kernel.uniformity_skips_zero();
        for (configuration, state) in configurations.iter_mut().zip(&states) {
            debug_assert_eq!(state.tests_passed + state.tests_failed, state.tests_run);

            let p_values = configuration
                .tests
                .iter()
                .map(|record| record.p_value)
                .collect::<Vec<_>>();

            let outcome = aggregate::evaluate_configuration(
                self.common.significance_level,
                state.tests_run,
                state.tests_passed,
                state.accumulated_ones,
                state.accumulated_zeros,
                &p_values,
                skip_zero,
            );

            if outcome.evaluation != Evaluation::Pass {
                warn!(
                    "configuration {} failed its aggregate criteria",
                    configuration.id
                );
            }

            configuration.metrics = Some(outcome.metrics);
            configuration.criteria = outcome.criteria;
            configuration.evaluation = outcome.evaluation;
        }

        let evaluation = if configurations
            .iter()
            .all(|configuration| configuration.evaluation == Evaluation::Pass)
        {
            Evaluation::Pass
        } else {
            Evaluation::Fail
        };

        Ok(Report {
            header,
            parameter_set: self.set.to_wire(),
            configurations,
            evaluation,
        })
    }
}

/// Merge records returned by a kernel into the report and the run state.
/// The whole batch belongs to execute calls that already succeeded, so this
/// only routes by configuration id.
fn merge_records(
    configurations: &mut [ConfigurationReport],
    states: &mut [ConfigurationState],
    records: Vec<TestResultRecord>,
) -> Result<(), Error> {
    for record in records {
        let idx = record.configuration_id.checked_sub(1).map(|id| id as usize);
        let (configuration, state) = match idx {
            Some(idx) if idx < configurations.len() => (&mut configurations[idx], &mut states[idx]),
            _ => {
                return Err(Error::InvalidParameter(format!(
                    "kernel emitted a record for unknown configuration {}",
                    record.configuration_id
                )))
            }
        };

        state.tests_run += 1;
        if record.passed {
            state.tests_passed += 1;
        } else {
            state.tests_failed += 1;
        }

        configuration.tests.push(record);
    }

    Ok(())
}
