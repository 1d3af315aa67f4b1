//! docfill CLI - DOCX template filling and report generation

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, warn};

use docfill::report::{
    hash_secret, slot_label, PhotoSlots, Rotation, DEFAULT_FILENAME_PREFIX, DEFAULT_SALT,
};
use docfill::template::image_slot;
use docfill::{
    detect_format_from_path, Docfill, FieldRecord, FillOptions, ImageAsset, InputKind,
    RecordSource, ReportGenerator, ReportOptions, ReportOutcome, Template, WorkbookSource,
};

/// Exit code when the template needs values that were not supplied.
const EXIT_NEEDS_INPUT: i32 = 2;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "docfill")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Fill DOCX templates and generate acceptance reports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the placeholders of a template
    Scan {
        /// Template file
        #[arg(value_name = "TEMPLATE", env = "DOCFILL_TEMPLATE")]
        template: PathBuf,

        /// Print the names as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Show the structure and text of a template
    Inspect {
        /// Template file
        #[arg(value_name = "TEMPLATE", env = "DOCFILL_TEMPLATE")]
        template: PathBuf,
    },

    /// Fill a template from a JSON object of values
    Fill {
        /// Template file
        #[arg(value_name = "TEMPLATE", env = "DOCFILL_TEMPLATE")]
        template: PathBuf,

        /// Output file
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// JSON file holding a flat object of values
        #[arg(long, value_name = "JSON")]
        values: Option<PathBuf>,

        /// Single value (NAME=VALUE), may be repeated
        #[arg(long = "set", value_name = "NAME=VALUE")]
        sets: Vec<String>,

        /// Picture for an image placeholder (Anh1=photo.jpg), may be repeated
        #[arg(long = "image", value_name = "NAME=PATH")]
        images: Vec<String>,

        /// Picture width in centimetres
        #[arg(long, default_value_t = docfill::template::DEFAULT_IMAGE_WIDTH_CM)]
        width_cm: f64,

        /// Write the output even when placeholders have no value
        #[arg(long)]
        allow_unresolved: bool,

        /// Do not merge split text runs
        #[arg(long)]
        raw: bool,
    },

    /// Generate a station report from a workbook
    Report {
        /// Record workbook (.xlsx)
        #[arg(long, value_name = "XLSX", env = "DOCFILL_WORKBOOK")]
        workbook: PathBuf,

        /// Template file
        #[arg(long, value_name = "DOCX", env = "DOCFILL_TEMPLATE")]
        template: PathBuf,

        /// Station code
        #[arg(long)]
        station: String,

        /// Period (e.g. "11/2024")
        #[arg(long)]
        period: String,

        /// Station password
        #[arg(long)]
        password: String,

        /// Photo for a slot (3=photo.jpg), may be repeated
        #[arg(long = "photo", value_name = "N=PATH")]
        photos: Vec<String>,

        /// Rotate a slot after upload (3=left), may be repeated
        #[arg(long = "rotate", value_name = "N=left|right")]
        rotations: Vec<String>,

        /// Value for a missing field (NAME=VALUE), may be repeated
        #[arg(long = "set", value_name = "NAME=VALUE")]
        sets: Vec<String>,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// File name prefix
        #[arg(long, default_value = DEFAULT_FILENAME_PREFIX)]
        prefix: String,

        /// Picture width in centimetres
        #[arg(long, default_value_t = docfill::template::DEFAULT_IMAGE_WIDTH_CM)]
        width_cm: f64,

        /// Credential salt
        #[arg(long, env = "DOCFILL_SALT", default_value = DEFAULT_SALT, hide_env_values = true)]
        salt: String,
    },

    /// Print the merged record of a station for a period as JSON
    Record {
        /// Record workbook (.xlsx)
        #[arg(long, value_name = "XLSX", env = "DOCFILL_WORKBOOK")]
        workbook: PathBuf,

        /// Station code
        #[arg(long)]
        station: String,

        /// Period (e.g. "11/2024")
        #[arg(long)]
        period: String,

        /// Station password
        #[arg(long)]
        password: String,

        /// Credential salt
        #[arg(long, env = "DOCFILL_SALT", default_value = DEFAULT_SALT, hide_env_values = true)]
        salt: String,
    },

    /// List the periods available in a workbook
    Periods {
        /// Record workbook (.xlsx)
        #[arg(long, value_name = "XLSX", env = "DOCFILL_WORKBOOK")]
        workbook: PathBuf,
    },

    /// Print the salted hash of a secret for the Password column
    Hash {
        /// Secret to hash
        secret: String,

        /// Credential salt
        #[arg(long, env = "DOCFILL_SALT", default_value = DEFAULT_SALT, hide_env_values = true)]
        salt: String,
    },

    /// Show version information
    Version,
}

struct ReportArgs {
    workbook: PathBuf,
    template: PathBuf,
    station: String,
    period: String,
    password: String,
    photos: Vec<String>,
    rotations: Vec<String>,
    sets: Vec<String>,
    output: Option<PathBuf>,
    prefix: String,
    width_cm: f64,
    salt: String,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Scan { template, json } => cmd_scan(&template, json),
        Commands::Inspect { template } => cmd_inspect(&template),
        Commands::Fill {
            template,
            output,
            values,
            sets,
            images,
            width_cm,
            allow_unresolved,
            raw,
        } => cmd_fill(
            &template,
            &output,
            values.as_deref(),
            &sets,
            &images,
            width_cm,
            allow_unresolved,
            raw,
        ),
        Commands::Report {
            workbook,
            template,
            station,
            period,
            password,
            photos,
            rotations,
            sets,
            output,
            prefix,
            width_cm,
            salt,
        } => cmd_report(ReportArgs {
            workbook,
            template,
            station,
            period,
            password,
            photos,
            rotations,
            sets,
            output,
            prefix,
            width_cm,
            salt,
        }),
        Commands::Record {
            workbook,
            station,
            period,
            password,
            salt,
        } => cmd_record(&workbook, &station, &period, &password, &salt),
        Commands::Periods { workbook } => cmd_periods(&workbook),
        Commands::Hash { secret, salt } => {
            println!("{}", hash_secret(&secret, &salt));
            Ok(())
        }
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

/// Split a `KEY=VALUE` argument at the first `=`.
fn parse_assignment(arg: &str) -> CliResult<(String, String)> {
    match arg.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got '{}'", arg).into()),
    }
}

fn parse_slot(arg: &str) -> CliResult<(usize, String)> {
    let (slot, value) = parse_assignment(arg)?;
    let slot = slot
        .parse::<usize>()
        .map_err(|_| format!("invalid slot number '{}'", slot))?;
    Ok((slot, value))
}

/// Load a flat JSON object of values.
fn load_values(path: &Path) -> CliResult<FieldRecord> {
    let text = fs::read_to_string(path)?;
    let record: FieldRecord = serde_json::from_str(&text)
        .map_err(|e| format!("{}: expected a flat JSON object ({})", path.display(), e))?;
    Ok(record)
}

fn manual_values(sets: &[String]) -> CliResult<FieldRecord> {
    let mut record = FieldRecord::new();
    for arg in sets {
        let (name, value) = parse_assignment(arg)?;
        record.insert(name, value);
    }
    Ok(record)
}

fn cmd_scan(template: &Path, json: bool) -> CliResult<()> {
    let names = docfill::scan_file(template)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&names)?);
        return Ok(());
    }

    if names.is_empty() {
        println!("{}", "No placeholders found".yellow());
        return Ok(());
    }

    for name in &names {
        match image_slot(name) {
            Some(slot) => println!(
                "  {} {} {}",
                "▣".cyan(),
                name.bold(),
                format!("(image, slot {}: {})", slot, slot_label(slot)?).dimmed()
            ),
            None => println!(
                "  {} {} {}",
                "$".green(),
                name.bold(),
                format!("({:?})", InputKind::for_name(name)).dimmed()
            ),
        }
    }
    println!("\n{} placeholder(s)", names.len());

    Ok(())
}

fn cmd_inspect(template: &Path) -> CliResult<()> {
    let format = detect_format_from_path(template)?;
    let loaded = Template::open(template, FillOptions::default())?;
    let doc = loaded.document();

    println!("{}", "Template Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "File".bold(), template.display());
    println!("{}: {}", "Format".bold(), format);
    println!("{}: {}", "Paragraphs".bold(), doc.paragraphs().len());
    println!("{}: {}", "Tables".bold(), doc.tables().len());
    println!("{}: {}", "Placeholders".bold(), loaded.placeholders().len());

    println!();
    println!("{}", "Body".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for (i, para) in doc.body_paragraphs().iter().enumerate() {
        let text = para.plain_text();
        if !text.trim().is_empty() {
            println!("{} {}", format!("p{}", i + 1).dimmed(), text);
        }
    }

    for (t, table) in doc.tables().iter().enumerate() {
        println!();
        println!(
            "{} {} ({}x{})",
            "Table".cyan().bold(),
            t + 1,
            table.row_count(),
            table.column_count()
        );
        println!("{}", "─".repeat(40).dimmed());
        for (r, row) in table.rows.iter().enumerate() {
            for (c, cell) in row.cells.iter().enumerate() {
                if !cell.is_empty() {
                    println!(
                        "{} {}",
                        format!("r{}c{}", r + 1, c + 1).dimmed(),
                        cell.plain_text()
                    );
                }
            }
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_fill(
    template: &Path,
    output: &Path,
    values: Option<&Path>,
    sets: &[String],
    images: &[String],
    width_cm: f64,
    allow_unresolved: bool,
    raw: bool,
) -> CliResult<()> {
    let mut builder = Docfill::new().with_image_width(width_cm);
    if let Some(path) = values {
        builder = builder.with_values(load_values(path)?);
    }
    builder = builder.with_values(manual_values(sets)?);
    for arg in images {
        let (name, path) = parse_assignment(arg)?;
        let asset = ImageAsset::from_bytes(fs::read(&path)?)?;
        builder = builder.with_image(name, asset);
    }
    if allow_unresolved {
        builder = builder.allow_unresolved();
    }
    if raw {
        builder = builder.raw();
    }

    let filled = builder.fill(template)?;
    filled.save(output)?;

    println!(
        "{} {} ({} replacement(s), {} image(s))",
        "Saved to".green(),
        output.display(),
        filled.replaced,
        filled.inserted.len()
    );
    for name in &filled.unresolved {
        warn!("{} written without a value", name);
        println!("  {} {} has no value", "!".yellow(), name);
    }

    Ok(())
}

fn cmd_report(args: ReportArgs) -> CliResult<()> {
    let pb = ProgressBar::new(4);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {msg}")?
            .progress_chars("#>-"),
    );

    pb.set_message("Reading workbook...");
    let source = WorkbookSource::open(&args.workbook)?;
    pb.inc(1);

    pb.set_message("Signing in...");
    let options = ReportOptions::new()
        .with_fill(FillOptions::new().with_image_width(args.width_cm))
        .with_filename_prefix(args.prefix)
        .with_salt(args.salt);
    let generator = ReportGenerator::new(options);
    let mut session = generator.login(&source, &args.station, &args.period, &args.password)?;
    debug!(
        "signed in as {} for period {}",
        session.station_code(),
        session.period()
    );
    pb.inc(1);

    pb.set_message("Preparing photos...");
    session.photos = load_photos(&args.photos, &args.rotations)?;
    debug!("{} photo slot(s) filled", session.photos.len());
    pb.inc(1);

    pb.set_message("Filling template...");
    let template = fs::read(&args.template)?;
    let manual = manual_values(&args.sets)?;
    let outcome = generator.generate_for_session(&template, &session, &source, &manual)?;
    pb.inc(1);

    match outcome {
        ReportOutcome::Ready(report) => {
            pb.finish_with_message("Done!");
            let dir = args.output.unwrap_or_else(|| PathBuf::from("."));
            fs::create_dir_all(&dir)?;
            let path = dir.join(&report.filename);
            fs::write(&path, &report.bytes)?;

            println!("\n{} {}", "Saved to".green().bold(), path.display());
            println!("  {} {} replacement(s)", "├─".dimmed(), report.replaced);
            println!(
                "  {} photo slot(s): {:?}",
                "└─".dimmed(),
                report.inserted_slots
            );
            Ok(())
        }
        ReportOutcome::NeedsInput(missing) => {
            pb.abandon_with_message("Waiting for input");
            eprintln!(
                "\n{}",
                "The template needs values that the record does not have:"
                    .yellow()
                    .bold()
            );
            for field in &missing {
                let hint = match field.kind {
                    InputKind::Date => "date, DD/MM/YYYY",
                    InputKind::Text => "text",
                };
                eprintln!("  {} {} {}", "?".yellow(), field.name.bold(), hint.dimmed());
            }
            eprintln!("\nRerun with --set NAME=VALUE for each of them.");
            std::process::exit(EXIT_NEEDS_INPUT);
        }
    }
}

fn load_photos(photos: &[String], rotations: &[String]) -> CliResult<PhotoSlots> {
    let mut slots = PhotoSlots::new();
    for arg in photos {
        let (slot, path) = parse_slot(arg)?;
        slots.upload(slot, &fs::read(&path)?)?;
    }
    for arg in rotations {
        let (slot, direction) = parse_slot(arg)?;
        slots.rotate(slot, direction.parse::<Rotation>()?)?;
    }
    Ok(slots)
}

fn cmd_record(
    workbook: &Path,
    station: &str,
    period: &str,
    password: &str,
    salt: &str,
) -> CliResult<()> {
    let source = WorkbookSource::open(workbook)?;
    let generator = ReportGenerator::new(ReportOptions::new().with_salt(salt));
    let session = generator.login(&source, station, period, password)?;
    let record = session.record(&source)?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

fn cmd_periods(workbook: &Path) -> CliResult<()> {
    let source = WorkbookSource::open(workbook)?;
    let periods = source.periods()?;
    if periods.is_empty() {
        println!("{}", "No periods found".yellow());
    }
    for period in periods {
        println!("{}", period);
    }
    Ok(())
}

fn cmd_version() {
    println!("{} {}", "docfill".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("DOCX template filling and report generation tool");
    println!();
    println!("License: MIT");
}
