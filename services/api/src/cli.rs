use crate::demo::{run_demo, run_resolve, DemoArgs, ResolveArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use sitekit::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "sitekit",
    about = "Serve and inspect the multi-tenant site pipeline from the command line",
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
    /// Walk through tenant resolution and idle-session expiry with sample data
    Demo(DemoArgs),
    /// Show which tenant a host resolves to under the current configuration
    Resolve(ResolveArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Register the sample tenants before serving
    #[arg(long)]
    pub(crate) seed_demo: bool,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Demo(args) => run_demo(args),
        Command::Resolve(args) => run_resolve(args),
    }
}
