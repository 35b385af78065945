use clap::Parser;
use std::io;
use std::process;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use planwork::cli;
use planwork::cli::commands::{Cli, Commands};

const LOG_ENV: &str = "PLANWORK_LOG";

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr).with_target(false))
        .init();
}

fn main() {
    init_tracing();

    let cli_args = Cli::parse();
    let json_output = cli_args.json;
    let user_flag = cli_args.user.clone();

    let exit_code = match cli_args.command {
        Commands::Init => cli::init::run(json_output),
        Commands::User(cmd) => cli::user::run(cmd, json_output),
        Commands::List(cmd) => cli::list::run(cmd, json_output, user_flag.as_deref()),
        Commands::Task(cmd) => cli::task::run(cmd, json_output, user_flag.as_deref()),
        Commands::Archive { limit, page } => {
            cli::status::run_archive(limit, page, json_output, user_flag.as_deref())
        }
        Commands::Stats { days, weeks } => {
            cli::status::run_stats(days, weeks, json_output, user_flag.as_deref())
        }
        Commands::Status => cli::status::run_status(json_output, user_flag.as_deref()),
        Commands::Cleanup { retention_days } => cli::maintenance::run_cleanup(retention_days, json_output),
        Commands::Config(cmd) => cli::maintenance::run_config(cmd, json_output),
    };

    process::exit(exit_code);
}
