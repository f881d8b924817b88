use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "photo-capture-demo")]
#[command(about = "Sample RAW photo capture app backed by a virtual camera")]
#[command(version)]
struct Cli {
    /// Photo library location (default: ~/Pictures/PhotoCaptureKit Library)
    #[arg(long)]
    library: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available cameras
    Devices,

    /// Capture RAW+JPEG photos into the library
    Capture {
        /// Number of photos to take
        #[arg(short, long, default_value = "1")]
        count: u32,
    },

    /// List the assets saved in the library
    List,

    /// Export the newest RAW capture and hand it to the share sheet
    Share {
        /// Export directory (default: ~/Documents/PhotoCaptureKit Exports)
        #[arg(long)]
        export_dir: Option<PathBuf>,
    },

    /// Delete an asset from the library
    Delete {
        /// Asset identifier (from 'list')
        asset_id: String,
    },
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Devices => commands::devices(),
        Commands::Capture { count } => commands::capture(cli.library, count),
        Commands::List => commands::list(cli.library),
        Commands::Share { export_dir } => commands::share(cli.library, export_dir),
        Commands::Delete { asset_id } => commands::delete(cli.library, asset_id),
    };

    if let Err(message) = result {
        eprintln!("error: {}", message);
        std::process::exit(1);
    }
}
