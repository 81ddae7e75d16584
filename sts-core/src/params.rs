//! Typed test parameters: static descriptions, resolved sets and the JSON
//! wire shape.
//!
//! Values cross the external boundary as strings tagged with a data type;
//! internally they are a typed [Value]. Resolution fills defaults from the
//! kernel's [ParameterInfo] table, enforces the declared ranges and rejects
//! names no kernel declares.

use crate::{Error, Test};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wire tags for parameter and calculation values.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DataType {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Bool,
    Utf8,
}

impl DataType {
    /// The name used on the JSON boundary.
    pub fn wire_name(self) -> &'static str {
        match self {
            DataType::U8 => "unsigned 8 bit integer",
            DataType::U16 => "unsigned 16 bit integer",
            DataType::U32 => "unsigned 32 bit integer",
            DataType::U64 => "unsigned 64 bit integer",
            DataType::I8 => "signed 8 bit integer",
            DataType::I16 => "signed 16 bit integer",
            DataType::I32 => "signed 32 bit integer",
            DataType::I64 => "signed 64 bit integer",
            DataType::F32 => "single precision floating point",
            DataType::F64 => "double precision floating point",
            DataType::Bool => "boolean",
            DataType::Utf8 => "UTF-8 string",
        }
    }

    pub fn from_wire_name(name: &str) -> Option<Self> {
        [
            DataType::U8,
            DataType::U16,
            DataType::U32,
            DataType::U64,
            DataType::I8,
            DataType::I16,
            DataType::I32,
            DataType::I64,
            DataType::F32,
            DataType::F64,
            DataType::Bool,
            DataType::Utf8,
        ]
        .into_iter()
        .find(|data_type| data_type.wire_name() == name)
    }

    /// Parse a text-encoded value of this type.
    pub fn parse(self, text: &str) -> Result<Value, Error> {
        let parse_error =
            |what: &str| Error::InvalidParameter(format!("{text:?} is not a valid {what}"));

        Ok(match self {
            DataType::U8 => Value::U8(text.parse().map_err(|_| parse_error(self.wire_name()))?),
            DataType::U16 => Value::U16(text.parse().map_err(|_| parse_error(self.wire_name()))?),
            DataType::U32 => Value::U32(text.parse().map_err(|_| parse_error(self.wire_name()))?),
            DataType::U64 => Value::U64(text.parse().map_err(|_| parse_error(self.wire_name()))?),
            DataType::I8 => Value::I8(text.parse().map_err(|_| parse_error(self.wire_name()))?),
            DataType::I16 => Value::I16(text.parse().map_err(|_| parse_error(self.wire_name()))?),
            DataType::I32 => Value::I32(text.parse().map_err(|_| parse_error(self.wire_name()))?),
            DataType::I64 => Value::I64(text.parse().map_err(|_| parse_error(self.wire_name()))?),
            DataType::F32 => Value::F32(text.parse().map_err(|_| parse_error(self.wire_name()))?),
            DataType::F64 => Value::F64(text.parse().map_err(|_| parse_error(self.wire_name()))?),
            DataType::Bool => Value::Bool(text.parse().map_err(|_| parse_error(self.wire_name()))?),
            DataType::Utf8 => Value::Utf8(text.to_owned()),
        })
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl Serialize for DataType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.wire_name())
    }
}

/// A typed parameter or calculation value. Conversion to text happens only
/// at the serialization boundary.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Bool(bool),
    Utf8(String),
}

impl Value {
    pub fn data_type(&self) -> DataType {
        match self {
            Value::U8(_) => DataType::U8,
            Value::U16(_) => DataType::U16,
            Value::U32(_) => DataType::U32,
            Value::U64(_) => DataType::U64,
            Value::I8(_) => DataType::I8,
            Value::I16(_) => DataType::I16,
            Value::I32(_) => DataType::I32,
            Value::I64(_) => DataType::I64,
            Value::F32(_) => DataType::F32,
            Value::F64(_) => DataType::F64,
            Value::Bool(_) => DataType::Bool,
            Value::Utf8(_) => DataType::Utf8,
        }
    }

    /// Text encoding for the JSON boundary. Floats honor the optional
    /// decimal precision.
    pub fn to_text(&self, precision: Option<u32>) -> String {
        match self {
            Value::U8(v) => v.to_string(),
            Value::U16(v) => v.to_string(),
            Value::U32(v) => v.to_string(),
            Value::U64(v) => v.to_string(),
            Value::I8(v) => v.to_string(),
            Value::I16(v) => v.to_string(),
            Value::I32(v) => v.to_string(),
            Value::I64(v) => v.to_string(),
            Value::F32(v) => match precision {
                Some(digits) => format!("{v:.*}", digits as usize),
                None => v.to_string(),
            },
            Value::F64(v) => match precision {
                Some(digits) => format!("{v:.*}", digits as usize),
                None => v.to_string(),
            },
            Value::Bool(v) => v.to_string(),
            Value::Utf8(v) => v.clone(),
        }
    }

    /// Widening view of any unsigned integer variant.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::U8(v) => Some(v as u64),
            Value::U16(v) => Some(v as u64),
            Value::U32(v) => Some(v as u64),
            Value::U64(v) => Some(v),
            _ => None,
        }
    }

    /// Widening view of any signed integer variant.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::I8(v) => Some(v as i64),
            Value::I16(v) => Some(v as i64),
            Value::I32(v) => Some(v as i64),
            Value::I64(v) => Some(v),
            _ => None,
        }
    }

    /// Numeric view of every numeric variant, used for range checks.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::F32(v) => Some(v as f64),
            Value::F64(v) => Some(v),
            Value::I8(v) => Some(v as f64),
            Value::I16(v) => Some(v as f64),
            Value::I32(v) => Some(v as f64),
            Value::I64(v) => Some(v as f64),
            Value::U8(v) => Some(v as f64),
            Value::U16(v) => Some(v as f64),
            Value::U32(v) => Some(v as f64),
            Value::U64(v) => Some(v as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(v) => Some(v),
            _ => None,
        }
    }
}

/// Static description of one kernel parameter: name, type, optional units
/// and float precision, a text-encoded default and optional bounds.
#[derive(Copy, Clone, Debug)]
pub struct ParameterInfo {
    pub name: &'static str,
    pub data_type: DataType,
    pub units: Option<&'static str>,
    pub precision: Option<u32>,
    pub default: &'static str,
    pub min: Option<&'static str>,
    pub max: Option<&'static str>,
}

/// The parameters every kernel shares. Kernel tables add their extras on
/// top of these.
pub const COMMON_PARAMETERS: &[ParameterInfo] = &[
    ParameterInfo {
        name: "bitstream count",
        data_type: DataType::U64,
        units: Some("bitstreams"),
        precision: None,
        default: "1",
        min: Some("1"),
        max: None,
    },
    ParameterInfo {
        name: "bitstream length",
        data_type: DataType::U64,
        units: Some("bits"),
        precision: None,
        default: "1000000",
        min: Some("8"),
        max: None,
    },
    ParameterInfo {
        name: "significance level",
        data_type: DataType::F64,
        units: None,
        precision: Some(6),
        default: "0.01",
        min: None,
        max: None,
    },
];

/// One resolved parameter.
#[derive(Clone, Debug)]
pub struct Parameter {
    pub name: String,
    pub data_type: DataType,
    pub units: Option<String>,
    pub precision: Option<u32>,
    pub value: Value,
}

/// A resolved, validated parameter set. Built once at initialization,
/// read-only afterwards.
#[derive(Clone, Debug)]
pub struct ParameterSet {
    pub test_name: String,
    pub set_name: String,
    pub parameters: Vec<Parameter>,
}

impl ParameterSet {
    /// Resolve a (possibly absent) external bundle against the parameter
    /// table of the given test. Missing entries fall back to defaults,
    /// declared bounds are enforced, unknown names are rejected.
    pub fn resolve(test: Test, bundle: Option<&ParameterBundle>) -> Result<Self, Error> {
        let infos = COMMON_PARAMETERS
            .iter()
            .chain(test.extra_parameter_info())
            .collect::<Vec<_>>();

        if let Some(bundle) = bundle {
            if !bundle.test_name.is_empty() && bundle.test_name != test.to_string() {
                return Err(Error::InvalidParameter(format!(
                    "parameter set is for test {:?}, not {:?}",
                    bundle.test_name,
                    test.to_string()
                )));
            }

            if let Some(unknown) = bundle
                .parameters
                .iter()
                .find(|supplied| !infos.iter().any(|info| info.name == supplied.name))
            {
                return Err(Error::InvalidParameter(format!(
                    "unknown parameter {:?} for test {test}",
                    unknown.name
                )));
            }
        }

        let parameters = infos
            .into_iter()
            .map(|info| {
                let supplied = bundle.and_then(|bundle| {
                    bundle
                        .parameters
                        .iter()
                        .find(|supplied| supplied.name == info.name)
                });

                if let Some(supplied) = supplied {
                    // a supplied entry must agree on the declared type
                    match DataType::from_wire_name(&supplied.data_type) {
                        Some(data_type) if data_type == info.data_type => {}
                        _ => {
                            return Err(Error::InvalidParameter(format!(
                                "parameter {:?} must have data type {:?}, got {:?}",
                                info.name,
                                info.data_type.wire_name(),
                                supplied.data_type
                            )))
                        }
                    }
                }

                let text = supplied.map(|p| p.value.as_str()).unwrap_or(info.default);
                let value = info.data_type.parse(text)?;
                check_range(info, &value)?;

                Ok(Parameter {
                    name: info.name.to_owned(),
                    data_type: info.data_type,
                    units: info.units.map(str::to_owned),
                    precision: info.precision,
                    value,
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;

        Ok(Self {
            test_name: test.to_string(),
            set_name: bundle
                .map(|bundle| bundle.set_name.clone())
                .unwrap_or_else(|| "defaults".to_owned()),
            parameters,
        })
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.parameters
            .iter()
            .find(|parameter| parameter.name == name)
            .map(|parameter| &parameter.value)
    }

    pub fn u64(&self, name: &str) -> Result<u64, Error> {
        self.value(name)
            .and_then(Value::as_u64)
            .ok_or_else(|| missing(name))
    }

    pub fn usize(&self, name: &str) -> Result<usize, Error> {
        Ok(self.u64(name)? as usize)
    }

    pub fn f64(&self, name: &str) -> Result<f64, Error> {
        self.value(name)
            .and_then(Value::as_f64)
            .ok_or_else(|| missing(name))
    }

    /// The wire form of this set, for embedding into the report.
    pub fn to_wire(&self) -> ParameterBundle {
        ParameterBundle {
            test_name: self.test_name.clone(),
            set_name: self.set_name.clone(),
            parameters: self
                .parameters
                .iter()
                .map(|parameter| WireParameter {
                    name: parameter.name.clone(),
                    data_type: parameter.data_type.wire_name().to_owned(),
                    precision: parameter.precision,
                    units: parameter.units.clone(),
                    value: parameter.value.to_text(parameter.precision),
                })
                .collect(),
        }
    }
}

fn missing(name: &str) -> Error {
    Error::InvalidParameter(format!("parameter {name:?} is missing from the resolved set"))
}

fn check_range(info: &ParameterInfo, value: &Value) -> Result<(), Error> {
    let Some(numeric) = value.as_f64() else {
        return Ok(());
    };

    if let Some(min) = info.min {
        let min = info.data_type.parse(min)?.as_f64().unwrap_or(f64::MIN);
        if numeric < min {
            return Err(Error::InvalidParameter(format!(
                "parameter {:?} must be >= {min}, is {numeric}",
                info.name
            )));
        }
    }
    if let Some(max) = info.max {
        let max = info.data_type.parse(max)?.as_f64().unwrap_or(f64::MAX);
        if numeric > max {
            return Err(Error::InvalidParameter(format!(
                "parameter {:?} must be <= {max}, is {numeric}",
                info.name
            )));
        }
    }

    Ok(())
}

/// The per-run parameters every kernel shares, extracted from a resolved
/// [ParameterSet] and validated once.
#[derive(Copy, Clone, Debug)]
pub struct CommonParameters {
    /// How many bitstreams the run processes (N).
    pub bitstream_count: u64,
    /// The length of every bitstream in bits (n). Divisible by 8.
    pub bitstream_length: usize,
    /// The significance level α, strictly inside (0, 1).
    pub significance_level: f64,
    /// Decimal digits used when the significance level is printed.
    pub significance_level_precision: u32,
}

impl CommonParameters {
    pub fn from_set(set: &ParameterSet) -> Result<Self, Error> {
        let common = Self {
            bitstream_count: set.u64("bitstream count")?,
            bitstream_length: set.usize("bitstream length")?,
            significance_level: set.f64("significance level")?,
            significance_level_precision: set
                .parameters
                .iter()
                .find(|parameter| parameter.name == "significance level")
                .and_then(|parameter| parameter.precision)
                .unwrap_or(6),
        };
        common.validate()?;
        Ok(common)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.bitstream_count == 0 {
            return Err(Error::InvalidParameter(
                "bitstream count must be at least 1".to_owned(),
            ));
        }
        if self.bitstream_length == 0 || self.bitstream_length % crate::BYTE_SIZE != 0 {
            return Err(Error::InvalidParameter(format!(
                "bitstream length must be a positive multiple of 8, is {}",
                self.bitstream_length
            )));
        }
        if !(self.significance_level > 0.0 && self.significance_level < 1.0) {
            return Err(Error::InvalidParameter(format!(
                "significance level must be strictly between 0 and 1, is {}",
                self.significance_level
            )));
        }

        Ok(())
    }
}

/// The parameter document accepted and produced on the JSON boundary.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParameterFile {
    #[serde(rename = "parameter set")]
    pub parameter_set: ParameterBundle,
}

/// The externally supplied parameter bundle.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ParameterBundle {
    #[serde(rename = "test name", default)]
    pub test_name: String,
    #[serde(rename = "parameter set name", default)]
    pub set_name: String,
    #[serde(default)]
    pub parameters: Vec<WireParameter>,
}

/// One entry of a [ParameterBundle]; the value is text-encoded.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WireParameter {
    pub name: String,
    #[serde(rename = "data type")]
    pub data_type: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub precision: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub units: Option<String>,
    pub value: String,
}
