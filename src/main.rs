mod cli;

use artwork::{
    config::{self, Config},
    Artwork, ArtworkManager, ArtworkRecord, Converter, DeleteReport, FileSystemStorage, SaveReport,
    Size, Storage,
};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, RecordArgs};
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "artwork=trace,artwork_magick=trace".to_string()
        } else {
            "artwork=info,artwork_magick=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Upload { file, record } => upload(&file, &record, config_path),
        Commands::Save { name, record } => save(&name, &record, config_path),
        Commands::Delete { name, record } => delete(&name, &record, config_path),
        Commands::Paths { name, record, json } => paths(&name, &record, config_path, json),
        Commands::Location {
            filename,
            sub_folder,
            folder,
        } => location(&filename, &sub_folder, folder.as_deref(), config_path),
        Commands::CheckTools => check_tools(),
        Commands::Validate { file } => {
            let path = file.or_else(|| config_path.map(Path::to_path_buf));
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("artwork {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn build_record(args: &RecordArgs, config: &Config) -> Result<ArtworkRecord> {
    let folder = args
        .folder
        .clone()
        .unwrap_or_else(|| config.artwork.folder.clone());

    let sizes = if args.no_sizes {
        None
    } else if let Some(ref raw) = args.sizes {
        let sizes = raw
            .iter()
            .map(|s| s.parse::<Size>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Invalid --sizes")?;
        Some(sizes)
    } else {
        config.artwork.sizes.clone()
    };

    Ok(ArtworkRecord::new(folder, args.sub_folder.clone()).with_sizes(sizes)?)
}

fn upload(file: &Path, args: &RecordArgs, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    if !file.exists() {
        anyhow::bail!("Input file does not exist: {:?}", file);
    }

    let manager = ArtworkManager::from_config(&config)?;
    let mut record = build_record(args, &config)?;

    let name = manager.upload(&record, file)?;
    record.set_image(name.clone());
    println!("Stored: {}", name);

    let report = manager.on_save(&record);
    print_save_report(&report);
    finish(args.strict, report.is_success(), "conversion")
}

fn save(name: &str, args: &RecordArgs, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let manager = ArtworkManager::from_config(&config)?;
    let record = build_record(args, &config)?.with_image(name);

    let original = manager.storage().path(name);
    if !original.exists() {
        anyhow::bail!("Stored image does not exist: {:?}", original);
    }

    let report = manager.on_save(&record);
    print_save_report(&report);
    finish(args.strict, report.is_success(), "conversion")
}

fn delete(name: &str, args: &RecordArgs, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let manager = ArtworkManager::new(storage(&config), converter(&config), &config.artwork);
    let record = build_record(args, &config)?.with_image(name);

    let report = manager.on_delete(&record);
    print_delete_report(&report);
    finish(args.strict, report.is_success(), "deletion")
}

fn paths(name: &str, args: &RecordArgs, config_path: Option<&Path>, json: bool) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let manager = ArtworkManager::new(storage(&config), converter(&config), &config.artwork);
    let record = build_record(args, &config)?.with_image(name);

    let mut derivatives = Vec::new();
    for size in record.sizes().unwrap_or_default() {
        let path = manager.image_path(&record, size)?;
        let url = manager.image_url(&record, size)?;
        derivatives.push((size.clone(), path, url));
    }

    let original_path = manager.storage().path(name);
    let original_url = manager.storage().url(name);
    let primary = manager.primary_image_url(&record)?;
    let srcset = manager.srcset(&record)?;

    if json {
        let value = serde_json::json!({
            "original": { "path": original_path, "url": original_url },
            "responsive": record.is_responsive(),
            "primary_url": primary,
            "srcset": srcset,
            "derivatives": derivatives
                .iter()
                .map(|(size, path, url)| serde_json::json!({
                    "size": size,
                    "path": path,
                    "url": url,
                }))
                .collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Original: {}", original_path.display());
    println!("URL: {}", original_url);
    println!("Primary: {}", primary);
    for (size, path, url) in &derivatives {
        println!("  {:>10}  {}  {}", size.to_string(), path.display(), url);
    }
    if !srcset.is_empty() {
        println!("srcset: {}", srcset);
    }

    Ok(())
}

fn location(
    filename: &str,
    sub_folder: &str,
    folder: Option<&str>,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let resolver = artwork::PathResolver::new(config.artwork.filename_max_length);
    let folder = folder.unwrap_or(&config.artwork.folder);
    println!("{}", resolver.upload_location(folder, sub_folder, filename));
    Ok(())
}

fn storage(config: &Config) -> FileSystemStorage {
    FileSystemStorage::new(&config.storage.media_root, &config.storage.media_url)
}

/// Converter for `delete` and `paths`, which never run it.
///
/// A missing ImageMagick is only logged so those commands work without it.
fn converter(config: &Config) -> Converter {
    let converter = Converter::discover(config.tools.convert_path.as_deref()).unwrap_or_else(|e| {
        tracing::debug!("{}; continuing without a converter", e);
        Converter::new("convert")
    });
    match config.tools.convert_subcommand {
        Some(ref sub) => converter.with_subcommand(sub.clone()),
        None => converter,
    }
}

fn print_save_report(report: &SaveReport) {
    if let Some(ref step) = report.normalized {
        match step.outcome {
            Ok(()) => println!("✓ normalized original to {}", step.size),
            Err(ref e) => println!("✗ normalizing original to {}: {}", step.size, e),
        }
    }
    for step in &report.derivatives {
        match (&step.outcome, &step.path) {
            (Ok(()), Some(path)) => println!("✓ {}", path.display()),
            (Ok(()), None) => println!("✓ {}", step.size),
            (Err(e), _) => println!("✗ {}: {}", step.size, e),
        }
    }
}

fn print_delete_report(report: &DeleteReport) {
    for path in &report.deleted {
        println!("✓ deleted {}", path.display());
    }
    for path in &report.missing {
        println!("- missing {}", path.display());
    }
    for (path, e) in &report.failed {
        println!("✗ {}: {}", path.display(), e);
    }
    for (size, e) in &report.unresolved {
        println!("✗ size {}: {}", size, e);
    }
    for dir in &report.removed_dirs {
        println!("✓ removed folder {}", dir.display());
    }
}

fn finish(strict: bool, success: bool, what: &str) -> Result<()> {
    if strict && !success {
        anyhow::bail!("At least one {} failed", what);
    }
    Ok(())
}

fn check_tools() -> Result<()> {
    println!("Checking external tools...\n");

    let tools = artwork_magick::check_tools();
    let any_converter = tools
        .iter()
        .any(|t| t.available && (t.name == "convert" || t.name == "magick"));

    for tool in &tools {
        let status = if tool.available { "✓" } else { "✗" };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if any_converter {
        println!("ImageMagick is available!");
    } else {
        println!("ImageMagick was not found. Install it to generate derivatives.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            config::load_config_or_default(None)?
        }
    };

    let artwork = &config.artwork;
    println!("  Folder: {}", artwork.folder);
    match artwork.sizes {
        Some(ref sizes) => println!(
            "  Sizes: {}",
            sizes.iter().map(Size::to_string).collect::<Vec<_>>().join(", ")
        ),
        None => println!("  Sizes: disabled"),
    }
    println!(
        "  Max size: {}",
        artwork.image_max_size.as_deref().unwrap_or("disabled")
    );
    println!(
        "  Quality: {} (thumbnails <= {}px: {})",
        artwork.jpeg_quality, artwork.thumb_size, artwork.thumb_quality
    );
    println!("  Media root: {}", config.storage.media_root.display());
    println!("  Media URL: {}", config.storage.media_url);

    Ok(())
}
