use anyhow::Context;
use clap::Parser;
use log::info;
use std::fs;
use std::io::{BufReader, Read, Write};
use std::time::Instant;
use sts_cmd::cmd_args::CmdArgs;
use sts_cmd::InputFormat;
use sts_core::bitstream::{AsciiSource, BitstreamSource, PackedByteSource};
use sts_core::driver::TestDriver;
use sts_core::params::{DataType, ParameterBundle, ParameterFile, WireParameter};
use sts_core::report::{Report, ReportHeader};
use sts_core::Test;

/// Main function.
///
/// Runs the selected statistical test over the configured bitstreams and
/// writes the report JSON document. The exit code is zero when the run
/// completed; a statistical rejection only changes the exit code with
/// `--fail-on-reject`.
fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = CmdArgs::parse();
    let test = Test::from(args.test);

    // parameter bundle: file first, then command line overrides
    let mut bundle = match &args.parameter_file {
        Some(path) => {
            let json = fs::read_to_string(path).with_context(|| {
                format!("Failed to read parameter file \"{}\"", path.display())
            })?;
            let file: ParameterFile =
                serde_json::from_str(&json).context("Failed to parse the parameter file")?;
            file.parameter_set
        }
        None => ParameterBundle::default(),
    };
    apply_overrides(&mut bundle, &args);

    let driver = TestDriver::new(test, Some(&bundle)).map_err(anyhow::Error::from)?;
    let header = build_header(&args);

    // open the input and run
    let input: Box<dyn Read> = match &args.input_file {
        Some(path) => {
            let file = fs::File::open(path)
                .with_context(|| format!("Failed to open input file \"{}\"", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(std::io::stdin().lock()),
    };
    let mut source: Box<dyn BitstreamSource> = match args.input_format {
        InputFormat::Binary => Box::new(PackedByteSource::new(input)),
        InputFormat::Ascii => Box::new(AsciiSource::new(input)),
    };

    let begin = Instant::now();
    let report = driver.run(source.as_mut(), header)?;
    info!("test run finished in {:?}", begin.elapsed());

    write_report(&report, &args)?;
    print_summary(&report);

    if args.fail_on_reject && !report.passed() {
        std::process::exit(1);
    }

    Ok(())
}

/// Fold the direct command line options into the parameter bundle,
/// replacing entries a parameter file may have supplied.
fn apply_overrides(bundle: &mut ParameterBundle, args: &CmdArgs) {
    let mut upsert = |name: &str, data_type: DataType, value: String| {
        let entry = WireParameter {
            name: name.to_owned(),
            data_type: data_type.wire_name().to_owned(),
            precision: None,
            units: None,
            value,
        };
        match bundle
            .parameters
            .iter_mut()
            .find(|parameter| parameter.name == name)
        {
            Some(existing) => *existing = entry,
            None => bundle.parameters.push(entry),
        }
    };

    if let Some(count) = args.bitstream_count {
        upsert("bitstream count", DataType::U64, count.to_string());
    }
    if let Some(length) = args.bitstream_length {
        upsert("bitstream length", DataType::U64, length.to_string());
    }
    if let Some(level) = args.significance_level {
        upsert("significance level", DataType::F64, level.to_string());
    }
}

/// The report header provenance: program identity, platform, timestamps
/// and the operator-supplied labels.
fn build_header(args: &CmdArgs) -> ReportHeader {
    ReportHeader {
        schedule_id: args.schedule_id,
        conductor: args.conductor.clone(),
        notes: args.notes.clone(),
        level: args.level,
        program_name: env!("CARGO_PKG_NAME").to_owned(),
        program_version: env!("CARGO_PKG_VERSION").to_owned(),
        operating_system: std::env::consts::OS.to_owned(),
        architecture: std::env::consts::ARCH.to_owned(),
        entropy_source: args.entropy_source.clone().or_else(|| {
            args.input_file
                .as_ref()
                .map(|path| path.display().to_string())
        }),
        start_time: Some(chrono::Local::now().to_rfc3339()),
        ..ReportHeader::default()
    }
}

/// Write the report JSON to the output path, or to stdout if none is set.
fn write_report(report: &Report, args: &CmdArgs) -> anyhow::Result<()> {
    match &args.output_path {
        Some(path) => {
            let file = fs::File::create(path).with_context(|| {
                format!("Failed to create output file \"{}\"", path.display())
            })?;
            let mut writer = std::io::BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, report)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            serde_json::to_writer_pretty(&mut lock, report)?;
            lock.write_all(b"\n")?;
        }
    }

    Ok(())
}

/// Print a short human-readable verdict to stderr, so it never mixes with
/// a report written to stdout.
fn print_summary(report: &Report) {
    eprintln!();
    eprintln!("Test:       {}", report.header.test_name);
    for configuration in &report.configurations {
        let Some(metrics) = &configuration.metrics else {
            continue;
        };
        eprintln!(
            "  configuration {}: {:?} ({} bitstreams, uniformity {:.6})",
            configuration.id, configuration.evaluation, metrics.bitstreams_tested, metrics.uniformity
        );
    }
    eprintln!("Evaluation: {:?}", report.evaluation);
}
