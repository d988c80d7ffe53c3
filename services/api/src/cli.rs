use crate::commands::{
    run_grid, run_inverse, run_model, run_predict, GridArgs, InverseArgs, ModelArgs, PredictArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use paygrid::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "paygrid",
    about = "Estimate AI job salaries, search for target salaries and tabulate variants",
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
    /// Estimate the salary for a single job payload
    Predict(PredictArgs),
    /// Find attribute combinations whose estimate is closest to a target salary
    Inverse(InverseArgs),
    /// Estimate every combination of the supplied attribute values
    Grid(GridArgs),
    /// Describe the trained model and its training leaderboard
    Model(ModelArgs),
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
        Command::Predict(args) => run_predict(args),
        Command::Inverse(args) => run_inverse(args),
        Command::Grid(args) => run_grid(args),
        Command::Model(args) => run_model(args),
    }
}
