//! PhysicianQA CLI tool
//!
//! A command-line tool for filling the PhysicianQA form and bundling,
//! archiving or printing the results.

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use glob::glob;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing_subscriber::EnvFilter;

use physician_qa::archive::BatchArchiver;
use physician_qa::batch::{fill_batch, random_requests};
use physician_qa::config::FormConfig;
use physician_qa::date::{parse_date_expression, resolve_date, today_in};
use physician_qa::document::{DocumentRequest, FilledDocument};
use physician_qa::pdf::{extract_metadata, DocumentFiller};
use physician_qa::print::{BatchPrinter, SystemPrintHost};
use physician_qa::template::TemplateSource;

/// PhysicianQA - Fill, archive and print QA forms
#[derive(Parser)]
#[command(name = "physician-qa")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Fill one form with a random date this month
    physician-qa fill --doctor \"Dr. Wheatley\" --number 4

    # Fill five random forms and bundle them
    physician-qa batch --count 5 --zip

    # Fill a batch and send it to the printer
    physician-qa batch --print

    # Print existing forms as one document
    physician-qa print \"doc-*.pdf\"")]
struct Cli {
    /// JSON configuration file (coordinates, defaults, messages, ...)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Template PDF path or http(s) URL
    #[arg(long, global = true)]
    template: Option<String>,

    /// Draw crosshairs and rulers over the filled form
    #[arg(long, global = true)]
    debug_overlay: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fill the form once
    Fill {
        /// Doctor name
        #[arg(long)]
        doctor: String,

        /// Date: "today", "random", "2024-11-20" or "11/20/2024"
        #[arg(long, default_value = "random")]
        date: String,

        /// Number field (random in the configured range when omitted)
        #[arg(long)]
        number: Option<u32>,

        /// Output file path (defaults to the generated name)
        #[arg(short, long, conflicts_with = "out_dir")]
        output: Option<PathBuf>,

        /// Directory for the generated file
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },

    /// Fill a randomized batch
    Batch {
        /// Number of documents (defaults to the configured count)
        #[arg(long)]
        count: Option<usize>,

        /// Output directory
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,

        /// Bundle into a ZIP archive instead of individual files
        #[arg(long, num_args = 0..=1, value_name = "NAME")]
        zip: Option<Option<String>>,

        /// Combine and print the batch
        #[arg(long)]
        print: bool,

        /// Seed for reproducible batches
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Archive existing PDF files. Supports glob patterns like "*.pdf"
    Zip {
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Archive file name
        #[arg(short, long)]
        output: Option<String>,

        /// Directory for the archive
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// Combine existing PDF files and print them
    Print {
        #[arg(required = true)]
        inputs: Vec<String>,
    },

    /// Show information about a PDF file
    Info {
        /// PDF file to inspect
        input: PathBuf,
    },

    /// Show the field coordinate table
    Coords,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("physician_qa=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => FormConfig::load(path)
            .with_context(|| format!("Loading configuration {}", path.display()))?,
        None => FormConfig::default(),
    };
    if cli.debug_overlay {
        config.debug.enabled = true;
    }
    let config = Arc::new(config);

    let template = cli
        .template
        .as_deref()
        .map(TemplateSource::parse)
        .unwrap_or_default();

    match cli.command {
        Commands::Fill { doctor, date, number, output, out_dir } => {
            cmd_fill(config, template, doctor, date, number, output, out_dir)
        }
        Commands::Batch { count, out_dir, zip, print, seed } => {
            cmd_batch(config, template, count, out_dir, zip, print, seed)
        }
        Commands::Zip { inputs, output, out_dir } => cmd_zip(config, inputs, output, out_dir),
        Commands::Print { inputs } => cmd_print(config, inputs),
        Commands::Info { input } => cmd_info(input),
        Commands::Coords => cmd_coords(&config),
    }
}

/// Expand glob patterns in input paths
fn expand_globs(patterns: Vec<String>) -> anyhow::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for pattern in patterns {
        if pattern.contains('*') || pattern.contains('?') || pattern.contains('[') {
            let mut matched = Vec::new();
            for entry in glob(&pattern)? {
                match entry {
                    Ok(path) => matched.push(path),
                    Err(e) => eprintln!("Warning: glob error for {}: {}", pattern, e),
                }
            }
            if matched.is_empty() {
                bail!("No files matched pattern: {}", pattern);
            }
            matched.sort();
            paths.extend(matched);
        } else {
            paths.push(PathBuf::from(pattern));
        }
    }

    Ok(paths)
}

/// Read existing PDFs as a batch, keeping the order given
fn read_documents(inputs: Vec<String>, config: &FormConfig) -> anyhow::Result<Vec<FilledDocument>> {
    let date = today_in(config.tz()?);

    expand_globs(inputs)?
        .into_iter()
        .map(|path| {
            if !path.exists() {
                bail!("Input file not found: {}", path.display());
            }
            let data = std::fs::read(&path).with_context(|| format!("Reading {}", path.display()))?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            Ok(FilledDocument { name, date, data })
        })
        .collect()
}

fn write_document(document: &FilledDocument, path: &Path) -> anyhow::Result<()> {
    std::fs::write(path, &document.data).with_context(|| format!("Writing {}", path.display()))?;
    eprintln!("Wrote: {}", path.display());
    Ok(())
}

fn print_and_wait(config: Arc<FormConfig>, documents: &[FilledDocument]) -> anyhow::Result<()> {
    let printer = BatchPrinter::new(config, Arc::new(SystemPrintHost));
    let session = printer.print_combined(documents)?;

    eprintln!("Combined PDF: {}", session.path().display());
    if !session.opened() {
        eprintln!("Viewer could not be opened; document displayed without printing");
    }
    session.wait();
    Ok(())
}

/// Fill a single form
fn cmd_fill(
    config: Arc<FormConfig>,
    template: TemplateSource,
    doctor: String,
    date: String,
    number: Option<u32>,
    output: Option<PathBuf>,
    out_dir: Option<PathBuf>,
) -> anyhow::Result<()> {
    let tz = config.tz()?;
    let mut rng = StdRng::from_entropy();

    let date = resolve_date(&parse_date_expression(&date)?, tz, &mut rng);
    let defaults = &config.defaults;
    let number = number.unwrap_or_else(|| rng.gen_range(defaults.number_min..=defaults.number_max));

    let filler = DocumentFiller::new(config, template);
    let document = filler.fill_document(&DocumentRequest::new(doctor, date, number))?;

    let path = match output {
        Some(path) => path,
        None => out_dir.unwrap_or_else(|| PathBuf::from(".")).join(&document.name),
    };
    write_document(&document, &path)
}

/// Fill a randomized batch and deliver it
fn cmd_batch(
    config: Arc<FormConfig>,
    template: TemplateSource,
    count: Option<usize>,
    out_dir: PathBuf,
    zip: Option<Option<String>>,
    print: bool,
    seed: Option<u64>,
) -> anyhow::Result<()> {
    let tz = config.tz()?;
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let count = count.unwrap_or(config.defaults.pdf_count);
    let requests = random_requests(count, &config.defaults, tz, &mut rng);

    eprintln!("Filling {} PDF files...", requests.len());
    let filler = DocumentFiller::new(Arc::clone(&config), template);
    let outcome = fill_batch(&filler, &requests);

    for (request, error) in &outcome.failures {
        eprintln!("Warning: {} ({}): {}", request.doctor, request.date, error);
    }
    if outcome.documents.is_empty() {
        bail!("No documents were filled");
    }

    match &zip {
        Some(name) => {
            let archiver = BatchArchiver::new(Arc::clone(&config));
            let path = archiver.archive_and_download(&outcome.documents, name.as_deref(), &out_dir)?;
            eprintln!("Archived to: {}", path.display());
        }
        None if !print => {
            for document in &outcome.documents {
                write_document(document, &out_dir.join(&document.name))?;
            }
        }
        None => {}
    }

    if print {
        print_and_wait(config, &outcome.documents)?;
    }

    Ok(())
}

/// Archive existing PDFs
fn cmd_zip(
    config: Arc<FormConfig>,
    inputs: Vec<String>,
    output: Option<String>,
    out_dir: PathBuf,
) -> anyhow::Result<()> {
    let documents = read_documents(inputs, &config)?;

    eprintln!("Archiving {} PDF files...", documents.len());
    let archiver = BatchArchiver::new(config);
    let path = archiver.archive_and_download(&documents, output.as_deref(), &out_dir)?;
    eprintln!("Archived to: {}", path.display());

    Ok(())
}

/// Combine existing PDFs and print them
fn cmd_print(config: Arc<FormConfig>, inputs: Vec<String>) -> anyhow::Result<()> {
    let documents = read_documents(inputs, &config)?;

    eprintln!("Combining {} PDF files...", documents.len());
    print_and_wait(config, &documents)
}

/// Show information about a PDF
fn cmd_info(input: PathBuf) -> anyhow::Result<()> {
    let metadata = extract_metadata(&input)?;

    println!("File: {}", input.display());
    println!("Pages: {}", metadata.page_count);
    println!("Size: {} bytes", metadata.size);

    if let Some(title) = metadata.title {
        println!("Title: {}", title);
    }
    if let Some(author) = metadata.author {
        println!("Author: {}", author);
    }

    Ok(())
}

/// Show the coordinate table
fn cmd_coords(config: &FormConfig) -> anyhow::Result<()> {
    println!("{:<10} {:>8} {:>8} {:>6}", "FIELD", "X", "Y", "SIZE");
    for (field, coordinate) in config.coordinates.iter() {
        println!(
            "{:<10} {:>8.1} {:>8.1} {:>6.1}",
            field, coordinate.x, coordinate.y, coordinate.font_size
        );
    }
    Ok(())
}
