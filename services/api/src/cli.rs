use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use spa_loyalty::error::AppError;

use crate::demo::{run_catalog_validation, run_demo, CatalogValidateArgs, DemoArgs};
use crate::server;

#[derive(Parser, Debug)]
#[command(
    name = "Spa Loyalty Service",
    about = "Run and exercise the loyalty tier and promotion service from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Work with admin-portal promotion catalog exports
    Promotions {
        #[command(subcommand)]
        command: PromotionsCommand,
    },
    /// Run an end-to-end CLI demo covering tiers and promotions
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum PromotionsCommand {
    /// Parse a catalog CSV export and report what it contains
    Validate(CatalogValidateArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Seed the promotion store from a catalog CSV export at startup
    #[arg(long)]
    pub(crate) promotions_file: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Promotions {
            command: PromotionsCommand::Validate(args),
        } => run_catalog_validation(args),
        Command::Demo(args) => run_demo(args),
    }
}
