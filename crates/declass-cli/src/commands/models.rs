//! Models command - assemble, split, and inspect the OCR model files.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use declass_core::models::assembly::split_artifact;
use declass_core::models::config::ModelConfig;
use declass_core::{DirectorySource, ModelAssembler};

use super::config::load_config;
use super::process::ModelDirArgs;

/// Arguments for the models command.
#[derive(Args)]
pub struct ModelsArgs {
    #[command(subcommand)]
    command: ModelsCommand,
}

#[derive(Subcommand)]
enum ModelsCommand {
    /// Concatenate the staged parts into the model directory
    Assemble(AssembleArgs),

    /// Split a model file into ordered parts for staging
    Split(SplitArgs),

    /// Check staged parts and assembled models
    Status(StatusArgs),

    /// Remove assembled models
    Clean(CleanArgs),
}

#[derive(Args)]
struct AssembleArgs {
    #[command(flatten)]
    models: ModelDirArgs,
}

#[derive(Args)]
struct SplitArgs {
    /// Model file to split
    #[arg(required = true)]
    input: PathBuf,

    /// Number of parts
    #[arg(short = 'n', long, default_value_t = 3)]
    parts: usize,

    /// Output directory (default: configured import directory)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct StatusArgs {
    #[command(flatten)]
    models: ModelDirArgs,
}

#[derive(Args)]
struct CleanArgs {
    #[command(flatten)]
    models: ModelDirArgs,
}

pub async fn run(args: ModelsArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;

    match args.command {
        ModelsCommand::Assemble(assemble_args) => {
            assemble_args.models.apply(&mut config);
            assemble_models(&config.models)
        }
        ModelsCommand::Split(split_args) => split_model(split_args, &config.models),
        ModelsCommand::Status(status_args) => {
            status_args.models.apply(&mut config);
            check_status(&config.models)
        }
        ModelsCommand::Clean(clean_args) => {
            clean_args.models.apply(&mut config);
            clean_models(&config.models)
        }
    }
}

fn assemble_models(models: &ModelConfig) -> anyhow::Result<()> {
    let start = Instant::now();

    println!(
        "{} Assembling models from {} into {}",
        style("ℹ").blue(),
        models.import_dir.display(),
        models.model_dir.display()
    );

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb.set_message(format!(
        "Concatenating {} parts of {}...",
        models.detection_parts.len(),
        models.detection_model
    ));

    let assembler = ModelAssembler::new(DirectorySource::new(&models.import_dir), models.plan());
    let result = assembler.assemble(&models.model_dir);
    pb.finish_and_clear();
    let assembled = result?;

    for path in std::iter::once(&assembled.artifact).chain(assembled.copies.iter()) {
        let size = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        println!(
            "  {} {:<25} {:>10}",
            style("✓").green(),
            display_name(path),
            format_size(size)
        );
    }

    println!();
    println!(
        "{} Models ready in {:?}",
        style("✓").green(),
        start.elapsed()
    );

    Ok(())
}

fn split_model(args: SplitArgs, models: &ModelConfig) -> anyhow::Result<()> {
    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let out_dir = args.output.unwrap_or_else(|| models.import_dir.clone());
    let parts = split_artifact(&args.input, args.parts, &out_dir)?;

    println!(
        "{} Split {} into {} parts",
        style("✓").green(),
        display_name(&args.input),
        parts.len()
    );
    for path in &parts {
        let size = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        println!("    {:<25} {:>10}", display_name(path), format_size(size));
    }

    Ok(())
}

fn check_status(models: &ModelConfig) -> anyhow::Result<()> {
    println!("{}", style("Model Status").bold());
    println!();

    println!(
        "{} {}",
        style("▸ staged").bold(),
        models.import_dir.display()
    );
    let plan = models.plan();
    let staged_ready = print_files(&models.import_dir, plan.sources())?;
    println!();

    println!(
        "{} {}",
        style("▸ assembled").bold(),
        models.model_dir.display()
    );
    let assembled_names = std::iter::once(plan.artifact.as_str())
        .chain(plan.copies.iter().map(String::as_str));
    let assembled_ready = print_files(&models.model_dir, assembled_names)?;
    println!();

    if assembled_ready {
        println!("{} Ready", style("✓").green());
    } else if staged_ready {
        println!(
            "{} Run 'declass models assemble' to build the model directory",
            style("⚠").yellow()
        );
    } else {
        println!(
            "{} Staged model files are missing from {}",
            style("✗").red(),
            models.import_dir.display()
        );
    }

    Ok(())
}

/// Print one line per file; returns whether every file is present.
fn print_files<'a>(dir: &Path, names: impl Iterator<Item = &'a str>) -> anyhow::Result<bool> {
    let mut all_present = true;
    let mut total_size: u64 = 0;

    for name in names {
        let path = dir.join(name);
        let (status, size_str) = if path.exists() {
            let size = fs::metadata(&path)?.len();
            total_size += size;
            (style("✓").green(), format_size(size))
        } else {
            all_present = false;
            (style("✗").red(), "missing".to_string())
        };

        println!("    {} {:<25} {:>10}", status, name, size_str);
    }

    if all_present {
        println!("    {} total", format_size(total_size));
    }

    Ok(all_present)
}

fn clean_models(models: &ModelConfig) -> anyhow::Result<()> {
    let model_dir = &models.model_dir;

    if !model_dir.exists() {
        println!("{} No model files to remove.", style("ℹ").blue());
        return Ok(());
    }

    let plan = models.plan();
    let mut total_removed = 0;
    let mut total_freed: u64 = 0;

    for name in std::iter::once(&plan.artifact).chain(plan.copies.iter()) {
        let path = model_dir.join(name);
        if path.exists() {
            let size = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
            fs::remove_file(&path)?;
            total_removed += 1;
            total_freed += size;
            println!("  {} Removed {}", style("✓").green(), name);
        }
    }

    // Leftovers from an interrupted assembly
    for entry in fs::read_dir(model_dir)? {
        let path = entry?.path();
        if path.extension().map(|e| e == "tmp").unwrap_or(false) {
            fs::remove_file(&path)?;
            println!("  {} Removed {}", style("✓").green(), display_name(&path));
        }
    }

    if total_removed > 0 {
        println!();
        println!(
            "{} Removed {} files, freed {}",
            style("✓").green(),
            total_removed,
            format_size(total_freed)
        );
    } else {
        println!("{} No model files to remove.", style("ℹ").blue());
    }

    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn format_size(bytes: u64) -> String {
    if bytes >= 1_000_000_000 {
        format!("{:.1}GB", bytes as f64 / 1_000_000_000.0)
    } else if bytes >= 1_000_000 {
        format!("{:.1}MB", bytes as f64 / 1_000_000.0)
    } else if bytes >= 1_000 {
        format!("{:.1}KB", bytes as f64 / 1_000.0)
    } else {
        format!("{}B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512B");
        assert_eq!(format_size(4_500), "4.5KB");
        assert_eq!(format_size(84_000_000), "84.0MB");
    }

    #[test]
    fn test_clean_removes_assembled_and_tmp() {
        let dir = tempfile::tempdir().unwrap();
        let models = ModelConfig {
            model_dir: dir.path().to_path_buf(),
            ..ModelConfig::default()
        };

        fs::write(dir.path().join("det.onnx"), b"det").unwrap();
        fs::write(dir.path().join("en_dict.txt"), b"abc").unwrap();
        fs::write(dir.path().join("det.onnx.tmp"), b"partial").unwrap();
        fs::write(dir.path().join("keep.txt"), b"other").unwrap();

        clean_models(&models).unwrap();

        assert!(!dir.path().join("det.onnx").exists());
        assert!(!dir.path().join("en_dict.txt").exists());
        assert!(!dir.path().join("det.onnx.tmp").exists());
        assert!(dir.path().join("keep.txt").exists());
    }

    #[test]
    fn test_clean_reports_tmp_removal_failure() {
        let dir = tempfile::tempdir().unwrap();
        let models = ModelConfig {
            model_dir: dir.path().to_path_buf(),
            ..ModelConfig::default()
        };

        // A directory cannot be removed with remove_file.
        fs::create_dir(dir.path().join("stale.tmp")).unwrap();

        assert!(clean_models(&models).is_err());
        assert!(dir.path().join("stale.tmp").exists());
    }
}
