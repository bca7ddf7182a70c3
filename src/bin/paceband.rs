//! Paceband CLI - Command-line interface for Paceband
//!
//! Commands:
//! - analyze: Run the cadence pipeline over an export and write the report
//! - validate: Validate export record schema
//! - sources: List distinct source names in an export
//! - schema: Print schema information

use clap::{Parser, Subcommand, ValueEnum};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use paceband::pipeline::CadenceAnalyzer;
use paceband::report::{write_series_csv, ReportEncoder};
use paceband::schema::{ExportAdapter, ExportRecord, RecordKind, SCHEMA_VERSION};
use paceband::types::{
    AnalysisConfig, CadencePayload, DEFAULT_MIN_GAP_SECONDS, DEFAULT_THRESHOLD,
};
use paceband::{AnalysisError, PACEBAND_VERSION};

/// Paceband - per-minute step cadence analysis for personal health exports
#[derive(Parser)]
#[command(name = "paceband")]
#[command(version = PACEBAND_VERSION)]
#[command(about = "Reconstruct per-minute step cadence from a health export", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the cadence pipeline over an export
    Analyze {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Source name to match exactly (e.g. "iPhone")
        #[arg(short, long)]
        device: String,

        /// Write the report payload here (use - for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the ordered series as CSV here
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Report payload format
        #[arg(long, default_value = "json-pretty")]
        format: OutputFormat,

        /// Steps-per-minute cutoff for high-intensity flagging
        #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
        threshold: u32,

        /// Minimum spacing from the preceding series entry (seconds)
        #[arg(long, default_value_t = DEFAULT_MIN_GAP_SECONDS)]
        min_gap: i64,

        /// Intensity-band breakpoints, comma-separated (e.g. 100,150,180,200)
        #[arg(long)]
        breakpoints: Option<String>,

        /// Suppress the summary printed to stdout
        #[arg(long)]
        quiet: bool,
    },

    /// Validate export record schema
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List distinct source names in an export
    Sources {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,

        /// Output as JSON schema
        #[arg(long)]
        json_schema: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// JSON array of export records
    Json,
    /// Newline-delimited JSON (one record per line)
    Ndjson,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input schema (health.step_record.v1)
    Input,
    /// Output schema (cadence.report.v1)
    Output,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), PacebandCliError> {
    match cli.command {
        Commands::Analyze {
            input,
            device,
            output,
            csv,
            input_format,
            format,
            threshold,
            min_gap,
            breakpoints,
            quiet,
        } => cmd_analyze(
            &input,
            &device,
            output.as_deref(),
            csv.as_deref(),
            input_format,
            format,
            threshold,
            min_gap,
            breakpoints.as_deref(),
            quiet,
        ),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Sources {
            input,
            input_format,
            json,
        } => cmd_sources(&input, input_format, json),

        Commands::Schema {
            schema_type,
            json_schema,
        } => cmd_schema(schema_type, json_schema),
    }
}

fn cmd_analyze(
    input: &Path,
    device: &str,
    output: Option<&Path>,
    csv: Option<&Path>,
    input_format: InputFormat,
    format: OutputFormat,
    threshold: u32,
    min_gap: i64,
    breakpoints: Option<&str>,
    quiet: bool,
) -> Result<(), PacebandCliError> {
    let records = read_records(input, &input_format)?;

    let config = AnalysisConfig {
        threshold,
        min_gap_seconds: min_gap,
        category_breakpoints: match breakpoints {
            Some(raw) => parse_breakpoints(raw)?,
            None => AnalysisConfig::default().category_breakpoints,
        },
    };

    let analyzer = CadenceAnalyzer::new(config);
    let report = analyzer.analyze_records(&records, device);

    let encoder = ReportEncoder::new();
    let payload = encoder.encode(&report, device, analyzer.bands());

    if let Some(output) = output {
        let payload_text = match format {
            OutputFormat::Json => serde_json::to_string(&payload)?,
            OutputFormat::JsonPretty => serde_json::to_string_pretty(&payload)?,
        };
        if output.to_string_lossy() == "-" {
            println!("{}", payload_text);
        } else {
            fs::write(output, payload_text)?;
        }
    }

    if let Some(csv_path) = csv {
        let file = fs::File::create(csv_path)?;
        write_series_csv(&report.series, file)?;
    }

    if !quiet {
        print_summary(&payload);
    }

    Ok(())
}

fn print_summary(payload: &CadencePayload) {
    println!("Cadence Report");
    println!("==============");
    println!("Device:         {}", payload.provenance.source_device);
    println!("Records seen:   {}", payload.summary.records_seen);
    println!("Matched:        {}", payload.summary.records_matched);
    println!("Skipped:        {}", payload.summary.records_skipped);
    println!("Series minutes: {}", payload.summary.series_minutes);
    println!("Total steps:    {}", payload.summary.total_steps);
    println!("Anomalies:      {}", payload.summary.anomaly_count);

    println!("\nBands (steps/min):");
    for band in &payload.summary.bands {
        println!("  {:<10} {}", band.band, band.minutes);
    }

    if !payload.anomalies.is_empty() {
        println!("\nAnomalous minutes:");
        for event in &payload.anomalies {
            println!(
                "  {} ({} steps, gap {}s)",
                event.minute, event.steps, event.gap_seconds
            );
        }
    }
}

fn cmd_validate(
    input: &Path,
    input_format: InputFormat,
    json: bool,
) -> Result<(), PacebandCliError> {
    let records = read_records(input, &input_format)?;
    let failures = ExportAdapter::validate_records(&records);

    let report = ValidationReport {
        total_records: records.len(),
        valid_records: records.len() - failures.len(),
        invalid_records: failures.len(),
        errors: failures
            .iter()
            .map(|f| ValidationErrorDetail {
                index: f.index,
                source_name: f.source_name.clone(),
                error: f.error.to_string(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total records:   {}", report.total_records);
        println!("Valid records:   {}", report.valid_records);
        println!("Invalid records: {}", report.invalid_records);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!("  - Record {} ({}): {}", err.index, err.source_name, err.error);
            }
        }
    }

    if report.invalid_records > 0 {
        Err(PacebandCliError::ValidationFailed(report.invalid_records))
    } else {
        Ok(())
    }
}

fn cmd_sources(
    input: &Path,
    input_format: InputFormat,
    json: bool,
) -> Result<(), PacebandCliError> {
    let records = read_records(input, &input_format)?;

    let mut sources: BTreeMap<String, SourceCount> = BTreeMap::new();
    for record in &records {
        let entry = sources
            .entry(record.source_name.clone())
            .or_insert_with(|| SourceCount {
                source_name: record.source_name.clone(),
                records: 0,
                step_records: 0,
            });
        entry.records += 1;
        if record.record_type == RecordKind::StepCount {
            entry.step_records += 1;
        }
    }

    let listing: Vec<&SourceCount> = sources.values().collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&listing)?);
    } else {
        println!("Sources");
        println!("=======");
        for source in listing {
            println!(
                "  {:<30} {} records ({} step_count)",
                source.source_name, source.records, source.step_records
            );
        }
    }

    Ok(())
}

fn cmd_schema(schema_type: SchemaType, json_schema: bool) -> Result<(), PacebandCliError> {
    match schema_type {
        SchemaType::Input => {
            if json_schema {
                println!("{}", get_input_json_schema());
            } else {
                println!("Input Schema: {}", SCHEMA_VERSION);
                println!();
                println!("One record per sampled interval:");
                println!();
                println!("- type: measurement type (step_count rows are analyzed;");
                println!("  other types pass through the filter untouched)");
                println!("- source_name: app or device that produced the row;");
                println!("  matched exactly and case-sensitively against --device");
                println!("- start_date / end_date: RFC 3339 or 'YYYY-MM-DD HH:MM:SS +HHMM'");
                println!("- value: step count as a number or numeric string");
                println!("- unit, device: optional passthrough fields");
            }
        }
        SchemaType::Output => {
            if json_schema {
                println!("{}", get_output_json_schema());
            } else {
                println!("Output Schema: cadence.report.v1");
                println!();
                println!("- payload_version: Schema version (cadence.report.v1)");
                println!("- producer: {{ name, version, instance_id }}");
                println!("- provenance: {{ source_device, computed_at_utc }}");
                println!("- summary: {{ record counts, skips, total_steps, anomaly_count, bands }}");
                println!("- series: per-minute entries {{ minute, steps, band }},");
                println!("  minutes strictly increasing");
                println!("- anomalies: flagged minutes {{ minute, steps, gap_seconds }}");
            }
        }
    }

    Ok(())
}

// Helper functions

fn read_records(
    input: &Path,
    input_format: &InputFormat,
) -> Result<Vec<ExportRecord>, PacebandCliError> {
    let input_data = if input.to_string_lossy() == "-" {
        if atty::is(atty::Stream::Stdin) {
            eprintln!("reading export from terminal; pipe a file or press Ctrl-D to end input");
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    let records = match input_format {
        InputFormat::Json => ExportAdapter::parse_array(&input_data)?,
        InputFormat::Ndjson => ExportAdapter::parse_ndjson(&input_data)?,
    };

    Ok(records)
}

fn parse_breakpoints(raw: &str) -> Result<Vec<u32>, PacebandCliError> {
    raw.split(',')
        .map(|part| part.trim().parse::<u32>())
        .collect::<Result<Vec<u32>, _>>()
        .map_err(|_| PacebandCliError::InvalidBreakpoints(raw.to_string()))
}

fn get_input_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "health.step_record.v1",
        "description": "Flattened health export record",
        "type": "object",
        "required": ["type", "source_name", "start_date", "end_date", "value"],
        "properties": {
            "type": { "type": "string" },
            "source_name": { "type": "string" },
            "start_date": { "type": "string" },
            "end_date": { "type": "string" },
            "value": { "type": ["number", "string"] },
            "unit": { "type": "string" },
            "device": { "type": "string" }
        }
    })
    .to_string()
}

fn get_output_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "cadence.report.v1",
        "description": "Paceband cadence report payload",
        "type": "object",
        "required": ["payload_version", "producer", "provenance", "summary", "series", "anomalies"],
        "properties": {
            "payload_version": { "type": "string" },
            "producer": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "version": { "type": "string" },
                    "instance_id": { "type": "string" }
                }
            },
            "provenance": {
                "type": "object",
                "properties": {
                    "source_device": { "type": "string" },
                    "computed_at_utc": { "type": "string" }
                }
            },
            "summary": {
                "type": "object",
                "properties": {
                    "records_seen": { "type": "integer" },
                    "records_matched": { "type": "integer" },
                    "records_skipped": { "type": "integer" },
                    "series_minutes": { "type": "integer" },
                    "total_steps": { "type": "integer" },
                    "anomaly_count": { "type": "integer" },
                    "bands": { "type": "array", "items": { "type": "object" } }
                }
            },
            "series": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "minute": { "type": "string", "format": "date-time" },
                        "steps": { "type": "integer" },
                        "band": { "type": "string" }
                    }
                }
            },
            "anomalies": {
                "type": "array",
                "items": { "type": "object" }
            }
        }
    })
    .to_string()
}

// Error types

#[derive(Debug)]
enum PacebandCliError {
    Io(io::Error),
    Analysis(AnalysisError),
    Json(serde_json::Error),
    ValidationFailed(usize),
    InvalidBreakpoints(String),
}

impl From<io::Error> for PacebandCliError {
    fn from(e: io::Error) -> Self {
        PacebandCliError::Io(e)
    }
}

impl From<AnalysisError> for PacebandCliError {
    fn from(e: AnalysisError) -> Self {
        PacebandCliError::Analysis(e)
    }
}

impl From<serde_json::Error> for PacebandCliError {
    fn from(e: serde_json::Error) -> Self {
        PacebandCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<PacebandCliError> for CliError {
    fn from(e: PacebandCliError) -> Self {
        match e {
            PacebandCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            PacebandCliError::Analysis(e) => CliError {
                code: "ANALYSIS_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Ensure input matches health.step_record.v1".to_string()),
            },
            PacebandCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            PacebandCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} records failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            PacebandCliError::InvalidBreakpoints(raw) => CliError {
                code: "INVALID_BREAKPOINTS".to_string(),
                message: format!("Cannot parse breakpoints: {}", raw),
                hint: Some("Pass a comma-separated list, e.g. 100,150,180,200".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_records: usize,
    valid_records: usize,
    invalid_records: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    source_name: String,
    error: String,
}

#[derive(serde::Serialize)]
struct SourceCount {
    source_name: String,
    records: usize,
    step_records: usize,
}
