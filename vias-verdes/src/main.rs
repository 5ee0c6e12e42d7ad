//! Point d'entrée CLI `vv`

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

use vias_verdes::cli::{self, Commands, Overrides};
use vias_verdes::{Config, RunOptions};

// Charger .env au démarrage
fn load_env() {
    if dotenvy::dotenv().is_err() {
        // Essayer depuis le répertoire du binaire
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

/// Abscisses et distances à l'axe pour les corridors routiers
#[derive(Parser)]
#[command(name = "vv")]
#[command(author, version)]
#[command(about = "Chainage, offsets and CAD/CSV/GeoJSON outputs for road corridors")]
struct Cli {
    /// Augmenter la verbosité (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Fichier de configuration JSON
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> Result<()> {
    load_env();

    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let config = Config::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            tramo,
            axis,
            sources,
            disposal,
            boreholes,
            out,
            radius,
            interval,
            name_field,
            jobs,
        } => {
            let config = Overrides {
                out,
                radius,
                interval,
                name_field,
                ..Default::default()
            }
            .apply(config)?;
            info!(tramo = %tramo, axis = %axis.display(), "Corridor run");
            let options = RunOptions {
                tramo,
                axis,
                sources,
                disposal,
                boreholes,
                parallel: true,
            };
            cli::cmd_run(options, &config, jobs)?;
        }
        Commands::Chainage {
            axis,
            interval,
            start,
            out,
        } => {
            let config = Overrides {
                interval,
                start,
                ..Default::default()
            }
            .apply(config)?;
            cli::cmd_chainage(&axis, &config, out.as_deref())?;
        }
        Commands::ExportDxf {
            tramo,
            axis,
            sources,
            disposal,
            out,
            interval,
        } => {
            let config = Overrides {
                out,
                interval,
                ..Default::default()
            }
            .apply(config)?;
            let options = RunOptions {
                tramo,
                axis,
                sources,
                disposal,
                boreholes: None,
                parallel: false,
            };
            cli::cmd_export_dxf(options, &config)?;
        }
        Commands::Info { axis } => cli::cmd_info(&axis, &config)?,
        Commands::Version => cli::cmd_version(),
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
        .init();
}
