use crate::demo::{run_demo, run_report, run_requirements, DemoArgs, ReportArgs, RequirementsArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use dscr_docs::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "DSCR Document Tracker",
    about = "Resolve funder document requirements and track loan package completeness",
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
    /// Print the resolved requirement list for a funder
    Requirements(RequirementsArgs),
    /// Print a completeness report for a funder and a document manifest
    Report(ReportArgs),
    /// Walk a synthetic loan through the upload wizard
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Requirements(args) => run_requirements(args),
        Command::Report(args) => run_report(args),
        Command::Demo(args) => run_demo(args),
    }
}
