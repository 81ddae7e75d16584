//! Everything necessary for command line arguments.

use crate::{ArgTest, InputFormat};
use clap::Parser;
use std::path::PathBuf;

/// The command line arguments.
#[derive(Debug, Parser)]
#[command(version, author, about, long_about = None)]
pub struct CmdArgs {
    /// The test to run.
    #[arg(short, long)]
    pub test: ArgTest,
    /// Path to the input file with the bitstream data. Reads stdin when
    /// omitted.
    #[arg(short, long = "input")]
    pub input_file: Option<PathBuf>,
    /// The input file format.
    #[arg(short = 'f', long, value_enum, default_value = "binary")]
    pub input_format: InputFormat,
    /// How many bitstreams to test. Overrides the parameter file.
    #[arg(short = 'c', long)]
    pub bitstream_count: Option<u64>,
    /// The length of each bitstream, in bits (must be divisible by 8).
    /// Overrides the parameter file.
    #[arg(short = 'l', long)]
    pub bitstream_length: Option<u64>,
    /// The significance level for the individual pass decision. Overrides
    /// the parameter file.
    #[arg(short = 's', long)]
    pub significance_level: Option<f64>,
    /// Optional path to a parameter JSON document with test-specific
    /// parameters. Missing parameters fall back to their defaults.
    #[arg(short, long = "parameters")]
    pub parameter_file: Option<PathBuf>,
    /// Path to write the report JSON document to. Writes stdout when
    /// omitted.
    #[arg(short, long = "output")]
    pub output_path: Option<PathBuf>,
    /// Exit with a nonzero status when the statistical evaluation fails
    /// (by default only errors change the exit status).
    #[arg(long)]
    pub fail_on_reject: bool,

    /// Schedule id recorded in the report header.
    #[arg(long)]
    pub schedule_id: Option<u64>,
    /// Conductor recorded in the report header.
    #[arg(long)]
    pub conductor: Option<String>,
    /// Free-form notes recorded in the report header.
    #[arg(long)]
    pub notes: Option<String>,
    /// Test level recorded in the report header.
    #[arg(long)]
    pub level: Option<u32>,
    /// Entropy source label recorded in the report header. Defaults to the
    /// input path.
    #[arg(long)]
    pub entropy_source: Option<String>,
}
