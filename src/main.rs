mod account;
mod classifier;
mod cli;
mod db;
mod error;
mod fmt;
mod jobs;
mod keywords;
mod models;
mod parser;
mod sections;
mod settings;
mod summary;
mod text;
mod trainer;

use clap::Parser;

use cli::{Cli, Commands, ExportCommands, ReportCommands, RulesCommands};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Parse {
            file,
            user,
            json,
            debug,
        } => cli::parse::run(&file, user.as_deref(), json, debug),
        Commands::Classify { user } => cli::classify::run(user.as_deref()),
        Commands::Review {
            id,
            category,
            user,
            make_rule,
        } => cli::review::run(id, &category, user.as_deref(), make_rule),
        Commands::Train { user } => cli::train::run(user.as_deref()),
        Commands::Rules { command } => match command {
            RulesCommands::Add {
                keyword,
                category,
                amount_min,
                amount_max,
                user,
            } => cli::rules::add(
                &keyword,
                &category,
                amount_min.as_deref(),
                amount_max.as_deref(),
                user.as_deref(),
            ),
            RulesCommands::List { user } => cli::rules::list(user.as_deref()),
        },
        Commands::Report { command } => match command {
            ReportCommands::Summary { user, detail } => {
                cli::report::summary(user.as_deref(), detail)
            }
        },
        Commands::Export { command } => match command {
            ExportCommands::Transactions { user, output } => {
                cli::export::transactions(user.as_deref(), output.as_deref())
            }
        },
        Commands::Status => cli::status::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
