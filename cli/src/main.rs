//! mdocx CLI - render markdown and question records to DOCX

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use mdocx::render::{dump_blocks, to_json};
use mdocx::{
    records_from_json, ExportOptions, ExportResult, ExportStats, ImageResolver, ImageSizing,
    JsonFormat, RenderOptions,
};

#[derive(Parser)]
#[command(name = "mdocx")]
#[command(version)]
#[command(about = "Render markdown question records to DOCX", long_about = None)]
struct Cli {
    /// Input markdown file
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output file or directory
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    #[command(flatten)]
    images: ImageArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a markdown file to DOCX
    Convert {
        /// Input markdown file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file or directory
        #[arg(short, long, value_name = "OUT")]
        output: Option<PathBuf>,

        /// Document title (level-1 heading)
        #[arg(long)]
        title: Option<String>,

        #[command(flatten)]
        images: ImageArgs,
    },

    /// Export question records (JSON) to DOCX
    Export {
        /// Records JSON file (array of records or one record)
        #[arg(value_name = "RECORDS")]
        input: PathBuf,

        /// Output file or directory
        #[arg(short, long, value_name = "OUT")]
        output: Option<PathBuf>,

        /// Document title (level-1 heading)
        #[arg(long)]
        title: Option<String>,

        /// Record heading template
        #[arg(long, default_value = "{label} Question {number}")]
        heading: String,

        /// Output file name stem
        #[arg(long, default_value = mdocx::export::DEFAULT_FILENAME_STEM)]
        stem: String,

        /// Do not append a timestamp to the file name
        #[arg(long)]
        no_timestamp: bool,

        /// Print export statistics as JSON instead of a summary
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        images: ImageArgs,
    },

    /// Dump scanned blocks and inline runs as JSON
    Blocks {
        /// Input markdown file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        #[command(flatten)]
        images: ImageArgs,
    },

    /// Show version information
    Version,
}

/// Image lookup and sizing flags shared by all rendering commands.
#[derive(Args, Clone)]
struct ImageArgs {
    /// Root directory for relative image paths and upload URLs
    #[arg(long, env = "MDOCX_STORAGE_ROOT", value_name = "DIR")]
    storage_root: Option<PathBuf>,

    /// Picture display width in points
    #[arg(long, env = "MDOCX_IMAGE_WIDTH", value_name = "PT")]
    image_width: Option<f32>,

    /// Scale picture height by the image aspect ratio
    #[arg(long)]
    keep_aspect: bool,

    /// Only resolve images inside the storage root
    #[arg(long)]
    no_absolute_paths: bool,
}

impl ImageArgs {
    fn apply(&self, mut options: ExportOptions) -> ExportOptions {
        if let Some(root) = &self.storage_root {
            options = options.with_storage_root(root);
        }
        options.resolver = options
            .resolver
            .with_absolute_paths(!self.no_absolute_paths);

        let width = self
            .image_width
            .unwrap_or(mdocx::render::DEFAULT_IMAGE_WIDTH_PT);
        let sizing = if self.keep_aspect {
            ImageSizing::scale_to_width(width)
        } else {
            ImageSizing::fixed(width, mdocx::render::DEFAULT_IMAGE_HEIGHT_PT)
        };
        options.with_render_options(RenderOptions::new().with_image_sizing(sizing))
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Convert {
            input,
            output,
            title,
            images,
        }) => cmd_convert(&input, output.as_deref(), title, &images),
        Some(Commands::Export {
            input,
            output,
            title,
            heading,
            stem,
            no_timestamp,
            json,
            images,
        }) => cmd_export(
            &input,
            output.as_deref(),
            ExportArgs {
                title,
                heading,
                stem,
                timestamp: !no_timestamp,
                json,
            },
            &images,
        ),
        Some(Commands::Blocks {
            input,
            output,
            compact,
            images,
        }) => cmd_blocks(&input, output.as_deref(), compact, &images),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            // Default behavior: convert if input is provided
            if let Some(input) = cli.input {
                cmd_convert(&input, cli.output.as_deref(), None, &cli.images)
            } else {
                println!("{}", "Usage: mdocx <FILE.md> [OUTPUT]".yellow());
                println!("       mdocx --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn progress_bar(steps: u64) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new(steps);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {msg}")?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

/// Resolve the output path: an existing directory receives the suggested
/// file name, anything else is used as the file path.
fn output_path(output: Option<&Path>, filename: &str) -> PathBuf {
    match output {
        Some(path) if path.is_dir() => path.join(filename),
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(filename),
    }
}

fn cmd_convert(
    input: &Path,
    output: Option<&Path>,
    title: Option<String>,
    images: &ImageArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let pb = progress_bar(3)?;

    pb.set_message("Reading markdown...");
    let markdown = fs::read_to_string(input)?;
    pb.inc(1);

    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    let mut options = images
        .apply(ExportOptions::new())
        .with_filename_stem(stem)
        .with_timestamp(false);
    if let Some(title) = title {
        options = options.with_title(title);
    }

    pb.set_message("Rendering document...");
    let result = mdocx::markdown_to_docx(&markdown, &options)?;
    pb.inc(1);

    pb.set_message("Writing package...");
    let path = output_path(output, &result.filename);
    fs::write(&path, &result.bytes)?;
    pb.inc(1);
    pb.finish_with_message("Done!");

    print_summary(&path, &result);
    Ok(())
}

/// Record export settings taken from the `export` subcommand.
struct ExportArgs {
    title: Option<String>,
    heading: String,
    stem: String,
    timestamp: bool,
    json: bool,
}

fn cmd_export(
    input: &Path,
    output: Option<&Path>,
    args: ExportArgs,
    images: &ImageArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let pb = progress_bar(3)?;

    pb.set_message("Reading records...");
    let records = records_from_json(&fs::read_to_string(input)?)?;
    log::debug!("loaded {} records from {}", records.len(), input.display());
    pb.inc(1);

    let mut options = images
        .apply(ExportOptions::new())
        .with_filename_stem(args.stem)
        .with_timestamp(args.timestamp);
    options.layout = options.layout.with_heading_template(args.heading);
    if let Some(title) = args.title {
        options = options.with_title(title);
    }

    pb.set_message(format!("Rendering {} records...", records.len()));
    let result = mdocx::export_records(&records, &options)?;
    pb.inc(1);

    pb.set_message("Writing package...");
    let path = output_path(output, &result.filename);
    fs::write(&path, &result.bytes)?;
    pb.inc(1);
    pb.finish_with_message("Done!");

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result.stats)?);
    } else {
        print_summary(&path, &result);
    }
    Ok(())
}

fn cmd_blocks(
    input: &Path,
    output: Option<&Path>,
    compact: bool,
    images: &ImageArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let markdown = fs::read_to_string(input)?;
    let options = images.apply(ExportOptions::new());
    let resolver = ImageResolver::new(options.resolver);

    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };
    let json = to_json(
        &dump_blocks(&markdown, &resolver, options.render.image),
        format,
    )?;

    if let Some(path) = output {
        fs::write(path, &json)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", json);
    }

    Ok(())
}

fn print_summary(path: &Path, result: &ExportResult) {
    let ExportStats {
        record_count,
        heading_count,
        paragraph_count,
        code_block_count,
        image_count,
        unresolved_image_count,
        ..
    } = result.stats;

    println!("\n{} {}", "Saved to".green().bold(), path.display());
    println!("  {} {} bytes", "├─".dimmed(), result.bytes.len());
    if record_count > 0 {
        println!("  {} {} records", "├─".dimmed(), record_count);
    }
    println!(
        "  {} {} headings, {} paragraphs, {} code blocks",
        "├─".dimmed(),
        heading_count,
        paragraph_count,
        code_block_count
    );
    println!("  {} {} images embedded", "└─".dimmed(), image_count);

    if unresolved_image_count > 0 {
        println!(
            "{} {} image references could not be resolved and were kept as text",
            "Warning:".yellow().bold(),
            unresolved_image_count
        );
    }
}

fn cmd_version() {
    println!("{} {}", "mdocx".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Markdown question records to DOCX");
    println!();
    println!("License: MIT");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_output_path_directory_gets_filename() {
        let dir = TempDir::new().unwrap();
        let path = output_path(Some(dir.path()), "questions_20240101_000000.docx");
        assert_eq!(path, dir.path().join("questions_20240101_000000.docx"));
    }

    #[test]
    fn test_output_path_explicit_file() {
        let path = output_path(Some(Path::new("out/report.docx")), "ignored.docx");
        assert_eq!(path, PathBuf::from("out/report.docx"));
        assert_eq!(output_path(None, "a.docx"), PathBuf::from("a.docx"));
    }

    #[test]
    fn test_image_args_keep_aspect() {
        let args = ImageArgs {
            storage_root: Some(PathBuf::from("/srv/uploads")),
            image_width: Some(240.0),
            keep_aspect: true,
            no_absolute_paths: true,
        };
        let options = args.apply(ExportOptions::new());

        assert_eq!(options.resolver.storage_root, PathBuf::from("/srv/uploads"));
        assert!(!options.resolver.allow_absolute_paths);
        assert_eq!(options.render.image.width_pt, 240.0);
        assert!(options.render.image.keep_aspect);
    }

    #[test]
    fn test_cmd_blocks_applies_image_width() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("dot.md");
        let output = dir.path().join("dot.json");
        fs::write(
            &input,
            "![dot](data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==)",
        )
        .unwrap();
        let args = ImageArgs {
            storage_root: None,
            image_width: Some(150.0),
            keep_aspect: false,
            no_absolute_paths: false,
        };

        cmd_blocks(&input, Some(&output), true, &args).unwrap();
        let json = fs::read_to_string(&output).unwrap();
        assert!(json.contains("\"width_pt\":150.0"));
        assert!(json.contains("\"height_pt\":300.0"));
    }

    #[test]
    fn test_cli_parses_export() {
        let cli = Cli::try_parse_from([
            "mdocx",
            "export",
            "records.json",
            "--stem",
            "exam",
            "--no-timestamp",
            "--json",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Export {
                stem,
                no_timestamp,
                json,
                ..
            }) => {
                assert_eq!(stem, "exam");
                assert!(no_timestamp);
                assert!(json);
            }
            _ => panic!("expected export command"),
        }
    }
}
