use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;
mod config;
mod plugins;
mod site;

#[derive(Parser)]
#[command(version, about = "A static site generator with a staged plugin pipeline")]
struct Args {
    /// Log every loaded file, template and written output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// The command to execute
    #[command(subcommand)]
    command: SsgCommand,
}

#[derive(Parser)]
struct InitArgs {
    /// Directory to create the site in (defaults to the current directory)
    name: Option<PathBuf>,
}

#[derive(Parser)]
struct BuildArgs {
    /// Run the pipeline and list the outputs without writing anything
    #[arg(short, long)]
    dry_run: bool,

    /// The path to the configuration file
    #[arg(short, long)]
    config_file: Option<PathBuf>,
}

#[derive(Parser)]
struct ServeArgs {
    /// The port to bind to
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Open the site in the default browser
    #[arg(long)]
    open: bool,

    /// The path to the configuration file
    #[arg(short, long)]
    config_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum SsgCommand {
    /// Create a new site skeleton
    Init(InitArgs),

    /// Build the site into `output/`
    Build(BuildArgs),

    /// Build the site and serve it on a local port
    Serve(ServeArgs),
}

fn init_tracing(verbose: bool) {
    tracing_subscriber::fmt()
        .with_max_level(if verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();
    init_tracing(args.verbose);

    match args.command {
        SsgCommand::Init(args) => {
            commands::init::run(&args).await?;
        }
        SsgCommand::Build(args) => {
            commands::build::run(&args).await?;
        }
        SsgCommand::Serve(args) => {
            commands::serve::run(&args).await?;
        }
    }

    Ok(())
}
