//! Process command - extract stamp metadata from a single scanned image.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use declass_core::models::metadata::{ProcessedDocument, FIELD_NAMES};
use declass_core::{DeclassConfig, MetadataPipeline};

use super::config::load_config;

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input image file
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    #[command(flatten)]
    models: ModelDirArgs,

    /// Show processing duration
    #[arg(long)]
    show_duration: bool,
}

/// Overrides for the model directories in the configuration.
#[derive(Args, Clone, Default)]
pub struct ModelDirArgs {
    /// Directory holding the staged model parts
    #[arg(long)]
    pub import_dir: Option<PathBuf>,

    /// Directory to assemble the models into
    #[arg(short, long)]
    pub model_dir: Option<PathBuf>,
}

impl ModelDirArgs {
    /// Apply the overrides on top of a loaded configuration.
    pub fn apply(&self, config: &mut DeclassConfig) {
        if let Some(ref dir) = self.import_dir {
            config.models.import_dir = dir.clone();
        }
        if let Some(ref dir) = self.model_dir {
            config.models.model_dir = dir.clone();
        }
    }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    args.models.apply(&mut config);

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap(),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    pb.set_message("Reading image...");
    let bytes = fs::read(&args.input)?;

    pb.set_message("Assembling models and running OCR...");
    let pipeline = MetadataPipeline::from_config(config);
    let record = pipeline.process_upload(&file_name(&args.input), &bytes)?;

    pb.finish_and_clear();

    let output = format_record(&record, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if args.show_duration {
        println!();
        println!(
            "{} Duration: {}ms",
            style("ℹ").blue(),
            record.duration_ms
        );
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// File name component of a path, for the record.
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub fn format_record(record: &ProcessedDocument, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(record)?),
        OutputFormat::Csv => format_csv(std::slice::from_ref(record)),
        OutputFormat::Text => Ok(format_text(record)),
    }
}

/// CSV header: image id, file name, the five stamp columns, duration.
pub fn csv_header() -> Vec<&'static str> {
    let mut header = vec!["IMAGE_ID", "FILE_NAME"];
    header.extend(FIELD_NAMES);
    header.push("DURATION_MS");
    header
}

pub fn format_csv(records: &[ProcessedDocument]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(csv_header())?;

    for record in records {
        let mut row = vec![record.image_id.clone(), record.file_name.clone()];
        row.extend(record.metadata.as_row().iter().map(|v| v.to_string()));
        row.push(record.duration_ms.to_string());
        wtr.write_record(&row)?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(record: &ProcessedDocument) -> String {
    let labels = [
        "Executive Order",
        "Section",
        "Project Number",
        "Author",
        "Project Year",
    ];

    let mut output = String::new();
    output.push_str(&format!("Document: {} ({})\n", record.file_name, record.image_id));
    output.push('\n');

    for (label, value) in labels.iter().zip(record.metadata.display_row()) {
        output.push_str(&format!("  {:<16} {}\n", format!("{}:", label), value));
    }

    output.push_str(&format!("\nDuration: {}ms\n", record.duration_ms));
    output
}
