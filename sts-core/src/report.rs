//! The report model: everything a test run records.
//!
//! The driver owns the report exclusively. Kernels hand their per-bitstream
//! records back as values, and the driver merges them only when the whole
//! execute call succeeded, so a failure inside one bitstream never leaves a
//! half-written configuration behind.
//!
//! All typed values are converted to text at the JSON boundary, matching
//! the parameter encoding.

use crate::params::{DataType, ParameterBundle, Value};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// A named, typed intermediate result of one statistic evaluation.
#[derive(Clone, Debug)]
pub struct Calculation {
    pub name: String,
    pub data_type: DataType,
    pub value: Value,
    pub units: Option<String>,
    pub precision: Option<u32>,
}

impl Serialize for Calculation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Calculation", 5)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("data type", &self.data_type)?;
        if let Some(units) = &self.units {
            state.serialize_field("units", units)?;
        }
        if let Some(precision) = &self.precision {
            state.serialize_field("precision", precision)?;
        }
        state.serialize_field("value", &self.value.to_text(self.precision))?;
        state.end()
    }
}

/// A text predicate together with its observed outcome.
#[derive(Clone, Debug, Serialize)]
pub struct Criterion {
    pub text: String,
    pub passed: bool,
}

/// A labelled key→value distribution, e.g. rank frequencies or excursion
/// state counts.
#[derive(Clone, Debug)]
pub struct ValueSet {
    pub label: String,
    pub data_type: DataType,
    pub units: Option<String>,
    pub precision: Option<u32>,
    pub entries: Vec<(String, Value)>,
}

impl ValueSet {
    pub fn new(label: &str, data_type: DataType) -> Self {
        Self {
            label: label.to_owned(),
            data_type,
            units: None,
            precision: None,
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, key: impl Into<String>, value: Value) {
        self.entries.push((key.into(), value));
    }
}

impl Serialize for ValueSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ValueSet", 5)?;
        state.serialize_field("label", &self.label)?;
        state.serialize_field("data type", &self.data_type)?;
        if let Some(units) = &self.units {
            state.serialize_field("units", units)?;
        }
        if let Some(precision) = &self.precision {
            state.serialize_field("precision", precision)?;
        }
        let entries = self
            .entries
            .iter()
            .map(|(key, value)| (key.clone(), value.to_text(self.precision)))
            .collect::<Vec<_>>();
        state.serialize_field("entries", &entries)?;
        state.end()
    }
}

/// Everything one statistic evaluation produced for one (configuration,
/// bitstream) pair.
#[derive(Clone, Debug, Serialize)]
pub struct TestResultRecord {
    #[serde(rename = "configuration id")]
    pub configuration_id: u32,
    /// The 1-based ordinal of the bitstream within the run.
    #[serde(rename = "test id")]
    pub test_id: u64,
    #[serde(rename = "probability value")]
    pub p_value: f64,
    pub calculations: Vec<Calculation>,
    pub criteria: Vec<Criterion>,
    #[serde(rename = "value sets", skip_serializing_if = "Vec::is_empty")]
    pub value_sets: Vec<ValueSet>,
    /// The conjunction of all criteria outcomes.
    pub passed: bool,
}

/// Per-configuration aggregate metrics, filled after the last bitstream.
#[derive(Clone, Debug, Serialize)]
pub struct ConfigurationMetrics {
    #[serde(rename = "bitstreams tested")]
    pub bitstreams_tested: u64,
    #[serde(rename = "accumulated ones")]
    pub accumulated_ones: u64,
    #[serde(rename = "accumulated zeros")]
    pub accumulated_zeros: u64,
    #[serde(rename = "minimum tests required")]
    pub minimum_tests_required: u64,
    #[serde(rename = "expected passed")]
    pub expected_passed: f64,
    #[serde(rename = "expected failed")]
    pub expected_failed: f64,
    #[serde(rename = "confidence interval lower bound")]
    pub proportion_lower: u64,
    #[serde(rename = "confidence interval upper bound")]
    pub proportion_upper: u64,
    /// 10 equal-width bins over [0, 1].
    #[serde(rename = "probability value frequencies")]
    pub histogram: [u64; 10],
    #[serde(rename = "probability value uniformity")]
    pub uniformity: f64,
    /// How many probability values entered the histogram. Reported next to
    /// the uniformity so a consumer can tell "non-uniform" apart from
    /// "insufficient data".
    #[serde(rename = "probability values considered")]
    pub considered: u64,
}

/// A named attribute of a configuration (direction, template, excursion
/// state).
#[derive(Clone, Debug, Serialize)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// The final verdict for a configuration or the whole test.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Evaluation {
    Pass,
    Fail,
    Error,
}

/// Everything recorded for one configuration across the run.
#[derive(Clone, Debug, Serialize)]
pub struct ConfigurationReport {
    #[serde(rename = "configuration id")]
    pub id: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<Attribute>,
    pub tests: Vec<TestResultRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<ConfigurationMetrics>,
    pub criteria: Vec<Criterion>,
    pub evaluation: Evaluation,
}

/// Descriptor a kernel provides for each of its configurations before the
/// run starts.
#[derive(Clone, Debug)]
pub struct ConfigurationDescriptor {
    pub id: u32,
    pub attributes: Vec<Attribute>,
}

impl ConfigurationDescriptor {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(id: u32, name: &str, value: impl Into<String>) -> Self {
        Self {
            id,
            attributes: vec![Attribute {
                name: name.to_owned(),
                value: value.into(),
            }],
        }
    }
}

/// Provenance carried in the report head. The library fills the test
/// identity; everything else is supplied by the caller.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ReportHeader {
    #[serde(rename = "test name")]
    pub test_name: String,
    pub suite: String,
    #[serde(rename = "schedule id", skip_serializing_if = "Option::is_none")]
    pub schedule_id: Option<u64>,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conductor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(rename = "program name")]
    pub program_name: String,
    #[serde(rename = "program version")]
    pub program_version: String,
    #[serde(rename = "operating system")]
    pub operating_system: String,
    pub architecture: String,
    #[serde(rename = "entropy source", skip_serializing_if = "Option::is_none")]
    pub entropy_source: Option<String>,
    #[serde(rename = "start time", skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
}

/// The complete result document of one run. Append-only while the run is
/// active, frozen once the driver finalized it.
#[derive(Clone, Debug, Serialize)]
pub struct Report {
    pub header: ReportHeader,
    #[serde(rename = "parameter set")]
    pub parameter_set: ParameterBundle,
    pub configurations: Vec<ConfigurationReport>,
    pub evaluation: Evaluation,
}

impl Report {
    /// Whether every configuration passed its aggregate criteria.
    pub fn passed(&self) -> bool {
        self.evaluation == Evaluation::Pass
    }
}
