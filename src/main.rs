use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use xen_rs::{manifest, ArchiveReader, ArchiveWriter, FileRecord, Mode, PackConfig};

#[derive(Parser)]
#[command(name = "xen", version, about = "Pack and unpack XEN asset containers")]
struct Cli {
    /// Log progress to stderr (honours RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all logging
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a container from a text manifest
    Pack {
        manifest: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// TOML file with mode/version/encryption settings
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Override the container mode (simple, encryption-capable)
        #[arg(short, long)]
        mode: Option<Mode>,
        /// Override the format version written to the header
        #[arg(long)]
        format_version: Option<u64>,
    },
    /// Extract every file of a container
    Unpack {
        input: PathBuf,
        #[arg(short = 'C', long, default_value = ".")]
        output_dir: PathBuf,
    },
    /// List container contents
    List { input: PathBuf },
    /// Show container metadata
    Info {
        input: PathBuf,
        /// Print the full model as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write one packaged file to stdout
    Cat {
        input: PathBuf,
        directory: String,
        file: String,
    },
}

fn init_tracing(cli: &Cli) {
    let filter = if cli.quiet {
        tracing_subscriber::EnvFilter::new("off")
    } else if cli.verbose {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "info".into())
    } else {
        tracing_subscriber::EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    match cli.command {
        Commands::Pack {
            manifest: manifest_path,
            output,
            config,
            mode,
            format_version,
        } => {
            let mut container = manifest::parse_file(&manifest_path)
                .with_context(|| format!("reading manifest {}", manifest_path.display()))?;

            let mut settings = match config {
                Some(path) => PackConfig::load(&path)
                    .with_context(|| format!("reading config {}", path.display()))?,
                None => PackConfig::default(),
            };
            if let Some(mode) = mode {
                settings.mode = mode;
            }
            if let Some(version) = format_version {
                settings.version = version;
            }
            settings.apply(&mut container);

            let mut writer = ArchiveWriter::create(&output)
                .with_context(|| format!("creating {}", output.display()))?;
            writer.write_container(&container)?;
            let written = writer.bytes_written();
            writer.finalize()?;

            println!(
                "Created: {} ({} files, {} bytes)",
                output.display(),
                container.file_count(),
                written
            );
        }

        Commands::Unpack { input, output_dir } => {
            let reader = open(&input)?;
            let report = reader.extract_all(&output_dir)?;

            for failure in &report.failures {
                eprintln!(
                    "  failed  {}/{}: {}",
                    failure.directory,
                    failure.file.as_deref().unwrap_or("*"),
                    failure.error
                );
            }
            println!(
                "Unpacked {} files ({} bytes) to: {}",
                report.extracted.len(),
                report.bytes_written,
                output_dir.display()
            );
            if !report.failures.is_empty() {
                bail!("{} entries failed to extract", report.failures.len());
            }
        }

        Commands::List { input } => {
            let reader = open(&input)?;
            println!("Archive: {}", input.display());
            println!("{:<40} {:>12} {:>12}", "Name", "Size", "Offset");
            for (dir, file, record) in reader.container().files() {
                let name = if dir.is_empty() {
                    file.to_string()
                } else {
                    format!("{}/{}", dir, file)
                };
                if let FileRecord::Embedded { offset, size } = record {
                    println!("{:<40} {:>12} {:>12}", name, size, offset);
                }
            }
        }

        Commands::Info { input, json } => {
            let reader = open(&input)?;
            let container = reader.container();

            if json {
                println!("{}", serde_json::to_string_pretty(container)?);
                return Ok(());
            }

            println!("Archive:     {}", input.display());
            println!("Mode:        {}", container.mode());
            println!("Version:     {}", container.version());
            println!("Encryption:  {}", container.encryption());
            println!("Directories: {}", container.directories().len());
            println!("Files:       {}", container.file_count());
            println!("Payload:     {} bytes", container.embedded_size());
            if !container.tags().is_empty() {
                println!("Tags:");
                for (name, value) in container.tags() {
                    println!("  {} = {}", name, value);
                }
            }
            if !container.lists().is_empty() {
                println!("Lists:");
                for (name, values) in container.lists() {
                    println!("  {}: {:?}", name, values);
                }
            }
        }

        Commands::Cat {
            input,
            directory,
            file,
        } => {
            let reader = open(&input)?;
            let mut entry = reader.open_entry(&directory, &file)?;
            let mut stdout = io::stdout().lock();
            io::copy(&mut entry, &mut stdout)?;
            stdout.flush()?;
        }
    }

    Ok(())
}

fn open(path: &Path) -> Result<ArchiveReader> {
    ArchiveReader::open(path).with_context(|| format!("opening {}", path.display()))
}
