//! hostbridge CLI entrypoint
//! Parses command-line arguments and dispatches to the stub generator.
#![deny(unsafe_code)]

// Internal imports (std, crate)
use hostbridge::core::HandlerManifest;
use hostbridge::generation::config::{OptionMap, load_options_file, parse_assignment};
use hostbridge::generation::{GeneratorOptions, StubGenerator};
use hostbridge::infrastructure::{EmbeddedTemplateSource, FileSystemArtifactWriter};
use hostbridge::routing::{RoutePattern, build_route};
use std::path::{Path, PathBuf};
use std::sync::Arc;

// External imports (alphabetized)
use anyhow::Context;
use clap::Parser;
use tracing::{Level, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hostbridge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Generate TypeScript stubs from a handler manifest
    Generate {
        /// Handler manifest (YAML or JSON)
        #[arg(long)]
        manifest: PathBuf,
        /// TOML file with generator options
        #[arg(long)]
        options_file: Option<PathBuf>,
        /// Generator option as key=value, overrides the options file
        #[arg(short = 'O', long = "option", value_parser = parse_assignment)]
        options: Vec<(String, String)>,
    },
    /// Print the compiled route pattern of every operation in a manifest
    Routes {
        /// Handler manifest (YAML or JSON)
        #[arg(long)]
        manifest: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with default level INFO
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Generate {
            manifest,
            options_file,
            options,
        } => generate(&manifest, options_file.as_deref(), options).await?,
        Commands::Routes { manifest } => print_routes(&manifest).await?,
    }
    Ok(())
}

async fn load_manifest(path: &Path) -> anyhow::Result<HandlerManifest> {
    HandlerManifest::from_file(path)
        .await
        .with_context(|| format!("Failed to load handler manifest {}", path.display()))
}

async fn generate(
    manifest_path: &Path,
    options_file: Option<&Path>,
    overrides: Vec<(String, String)>,
) -> anyhow::Result<()> {
    let manifest = load_manifest(manifest_path).await?;

    let mut raw = match options_file {
        Some(path) => load_options_file(path)
            .await
            .with_context(|| format!("Failed to read options file {}", path.display()))?,
        None => OptionMap::new(),
    };
    raw.extend(overrides);
    let options = GeneratorOptions::from_map(&raw).context("Invalid generator options")?;

    info!(
        manifest = %manifest_path.display(),
        output = %options.output_path.display(),
        "Generating stubs"
    );

    let generator = StubGenerator::new(
        Arc::new(EmbeddedTemplateSource::new()),
        Arc::new(FileSystemArtifactWriter::new()),
    );
    let report = generator.generate(&manifest, &options).await?;

    for diagnostic in &report.diagnostics {
        eprintln!("{diagnostic}");
    }
    println!(
        "Wrote {} file(s) to {}",
        report.written.len(),
        options.output_path.display()
    );

    let errors = report.errors().count();
    if errors > 0 {
        anyhow::bail!("Stub generation finished with {errors} error(s)");
    }
    Ok(())
}

async fn print_routes(manifest_path: &Path) -> anyhow::Result<()> {
    let manifest = load_manifest(manifest_path).await?;

    for group in &manifest.groups {
        for op in &group.operations {
            let route = build_route(&group.route, &op.route);
            match RoutePattern::compile(&route) {
                Ok(pattern) => println!(
                    "{}.{}\t{}\t{}",
                    group.name,
                    op.name,
                    pattern.route(),
                    pattern.pattern()
                ),
                Err(e) => warn!(operation = %op.name, group = %group.name, error = %e, "Skipping route"),
            }
        }
    }
    Ok(())
}
