//! DepViz CLI entry point

use clap::{Parser, Subcommand, ValueEnum};
use depviz_core::Direction;
use depviz_interact::ExportKind;
use depviz_layout::ArrangeMode;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "depviz")]
#[command(about = "Interactive dependency canvas for modules, classes and functions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Layout constants (TOML); unset keys keep their defaults
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve a canvas session over HTTP and WebSocket
    Serve {
        /// Artifacts or snapshot JSON to start from
        input: Option<PathBuf>,

        /// Port to listen on
        #[arg(short, long, default_value = "7878")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Directory of front-end assets
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },
    /// Lay out a graph and print the draw list as JSON
    Layout {
        input: PathBuf,

        /// Auto-arrange modules before layout
        #[arg(short, long)]
        arrange: Option<ArrangeArg>,
    },
    /// Print the impact summary for one node
    Slice {
        input: PathBuf,

        /// Seed node id
        id: String,

        #[arg(short, long, value_enum, default_value = "outbound")]
        direction: DirectionArg,
    },
    /// Write an export payload (json, dv, svg, png)
    Export {
        input: PathBuf,

        #[arg(short, long, default_value = "svg")]
        kind: ExportKind,

        /// Output file; defaults to the suggested name
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show version
    Version,
}

#[derive(Clone, Copy, ValueEnum)]
enum DirectionArg {
    Outbound,
    Inbound,
}

impl From<DirectionArg> for Direction {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Outbound => Direction::Outbound,
            DirectionArg::Inbound => Direction::Inbound,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ArrangeArg {
    Folder,
    Balanced,
}

impl From<ArrangeArg> for ArrangeMode {
    fn from(arg: ArrangeArg) -> Self {
        match arg {
            ArrangeArg::Folder => ArrangeMode::ByFolder,
            ArrangeArg::Balanced => ArrangeMode::Balanced,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!("depviz={}", log_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve {
            input,
            port,
            host,
            static_dir,
        } => commands::serve(config, input, host, port, static_dir).await,
        Commands::Layout { input, arrange } => {
            commands::layout(config, &input, arrange.map(ArrangeMode::from))
        }
        Commands::Slice { input, id, direction } => {
            commands::slice(config, &input, &id, direction.into())
        }
        Commands::Export {
            input,
            kind,
            output,
        } => commands::export(config, &input, kind, output),
        Commands::Version => {
            println!("DepViz v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
