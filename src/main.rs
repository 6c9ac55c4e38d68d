//! ARW Reader - inspect Sony ARW raw containers from the command line.

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use arw_reader::{
    config::{Cli, Command},
    format::arw::SonyTag,
    format::tiff::{Directory, TiffTag},
    io::{BlockCache, FileReader},
    DecodeLimits, DecodeSession, FormatError, LocatedAssets,
};

type FileSession = DecodeSession<BlockCache<FileReader>>;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = cli.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }
    let limits = cli.limits();

    let result = match &cli.command {
        Command::Dump { file } => run_dump(file, limits),
        Command::Info { file, json } => run_info(file, limits, *json),
        Command::Thumbnail { file, output } => run_thumbnail(file, output, limits),
        Command::Samples { file, output } => run_samples(file, output, limits),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "arw_reader=debug"
    } else {
        "arw_reader=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Errors surfaced by a subcommand.
#[derive(Debug, thiserror::Error)]
enum CommandError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to encode report: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    NotFound(&'static str),
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), CommandError> {
    fs::write(path, bytes).map_err(|source| CommandError::Write {
        path: path.display().to_string(),
        source,
    })
}

fn open_and_locate(
    file: &Path,
    limits: DecodeLimits,
) -> Result<(FileSession, LocatedAssets), CommandError> {
    let session = DecodeSession::open_path(file, limits)?;
    let assets = session.locate()?;
    for issue in &assets.issues {
        warn!("{}", issue);
    }
    Ok((session, assets))
}

// =============================================================================
// Dump Command
// =============================================================================

fn run_dump(file: &Path, limits: DecodeLimits) -> Result<(), CommandError> {
    let (session, assets) = open_and_locate(file, limits)?;
    let header = session.header();

    println!(
        "{}: {} byte order, magic {}, first directory at {}",
        file.display(),
        header.byte_order.marker(),
        header.magic,
        header.first_directory_offset
    );

    for (label, directory) in assets.labelled_directories() {
        print_directory(&label, directory);
    }
    Ok(())
}

fn print_directory(label: &str, directory: &Directory) {
    println!();
    println!(
        "{} @ {} ({} records, next {})",
        label,
        directory.offset,
        directory.len(),
        directory.next_directory_offset
    );
    for entry in directory.iter() {
        let record = &entry.record;
        let type_name = record
            .field_type
            .map(|t| t.name().to_string())
            .unwrap_or_else(|| format!("type {}", record.field_type_raw));
        println!(
            "  0x{:04X} {:<24} {:<9} x{:<6} {}",
            record.tag,
            tag_label(record.tag),
            type_name,
            record.count,
            entry.value
        );
    }
}

fn tag_label(tag: u16) -> String {
    if let Some(tag) = SonyTag::from_u16(tag) {
        tag.name().to_string()
    } else if let Some(tag) = TiffTag::from_u16(tag) {
        format!("{:?}", tag)
    } else {
        "-".to_string()
    }
}

// =============================================================================
// Info Command
// =============================================================================

fn run_info(file: &Path, limits: DecodeLimits, json: bool) -> Result<(), CommandError> {
    let (_session, assets) = open_and_locate(file, limits)?;
    let report = assets.report();

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let g = &report.geometry;
    let e = &report.exposure;
    println!("Container:   {}", report.kind.name());
    println!(
        "Camera:      {} {}",
        e.make.as_deref().unwrap_or("?"),
        e.model.as_deref().unwrap_or("?")
    );
    if let Some(lens) = &e.lens_model {
        println!("Lens:        {}", lens);
    }
    if let Some(shutter) = e.shutter_speed() {
        println!("Shutter:     {} s", shutter);
    }
    if let Some(aperture) = e.aperture() {
        println!("Aperture:    f/{:.1}", aperture);
    }
    if let Some(iso) = e.iso {
        println!("ISO:         {}", iso);
    }
    if let Some(focal) = e.focal_length_mm() {
        println!("Focal:       {} mm", focal);
    }
    match (g.width, g.height) {
        (Some(w), Some(h)) => println!("Sensor:      {} x {}", w, h),
        _ => println!("Sensor:      not found"),
    }
    println!("Codec:       {}", report.codec.as_deref().unwrap_or("-"));
    if let Some(bits) = g.bit_depth {
        println!("Bit depth:   {}", bits);
    }
    if let Some(cfa) = &g.cfa_pattern {
        println!("CFA:         {}", cfa.describe());
    }
    if let Some(black) = g.black_level {
        println!("Black level: {:?}", black);
    }
    if let Some(wb) = g.white_balance {
        println!("WB (RGGB):   {:?}", wb);
    }
    if let Some(curve) = g.tone_curve {
        println!("Tone curve:  {:?}", curve);
    }
    println!("SR2:         {}", if report.sr2_decrypted { "decrypted" } else { "absent" });
    for t in &report.thumbnails {
        println!("Thumbnail:   IFD{} {} bytes at {}", t.directory_index, t.length, t.offset);
    }
    for issue in &report.issues {
        println!("Issue:       {}", issue);
    }
    Ok(())
}

// =============================================================================
// Thumbnail Command
// =============================================================================

fn run_thumbnail(file: &Path, output: &Path, limits: DecodeLimits) -> Result<(), CommandError> {
    let (session, assets) = open_and_locate(file, limits)?;
    let location = assets
        .largest_thumbnail()
        .ok_or(CommandError::NotFound("No embedded JPEG found"))?;

    let bytes = session.thumbnail_bytes(location)?;
    write_file(output, &bytes)?;
    info!(bytes = bytes.len(), output = %output.display(), "Wrote thumbnail");
    Ok(())
}

// =============================================================================
// Samples Command
// =============================================================================

fn run_samples(file: &Path, output: &Path, limits: DecodeLimits) -> Result<(), CommandError> {
    let (session, assets) = open_and_locate(file, limits)?;
    let samples = session.decode_samples(&assets)?;

    let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
    write_file(output, &bytes)?;
    info!(samples = samples.len(), output = %output.display(), "Wrote sensor samples");
    Ok(())
}
