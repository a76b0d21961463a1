//! Point d'entrée CLI pour wildlife-export

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

// Charger .env au démarrage
fn load_env() {
    // Chercher .env dans le répertoire courant ou parent
    if dotenvy::dotenv().is_err() {
        // Essayer depuis le répertoire du binaire
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

mod cli;

use cli::Commands;

/// Exporter des observations de faune vers des shapefiles reprojetés
#[derive(Parser)]
#[command(name = "wildlife-export")]
#[command(author, version)]
#[command(about = "Exporter des observations de faune (GeoJSON) vers une archive de shapefiles")]
struct Cli {
    /// Augmenter la verbosité (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> Result<()> {
    // Charger .env avant tout
    load_env();

    let cli = Cli::parse();

    // Configurer le logging
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Export(args) => {
            info!(input = %args.input.display(), output = %args.output.display(), "Grouped export");
            cli::cmd_export(args, wildlife_export::Layout::Grouped)?;
        }
        Commands::Simple(args) => {
            info!(input = %args.input.display(), output = %args.output.display(), "Simple export");
            cli::cmd_export(args, wildlife_export::Layout::Simple)?;
        }
        Commands::Crs { epsg } => cli::cmd_crs(epsg)?,
    }

    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();
}
