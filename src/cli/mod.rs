pub mod classify;
pub mod export;
pub mod init;
pub mod parse;
pub mod report;
pub mod review;
pub mod rules;
pub mod status;
pub mod train;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "teller", about = "Bank statement parser and transaction classifier.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up Teller: choose a data directory and initialize the database.
    Init {
        /// Path for Teller data (default: ~/Documents/teller)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Parse a statement text file, classify its transactions, and store them.
    Parse {
        /// Path to the statement text file
        file: String,
        /// User the transactions belong to
        #[arg(long)]
        user: Option<String>,
        /// Emit the full parse result as JSON instead of tables
        #[arg(long)]
        json: bool,
        /// Print extraction diagnostics (per-section counts, scan log)
        #[arg(long)]
        debug: bool,
    },
    /// Re-run classification on stored uncategorized transactions.
    Classify {
        #[arg(long)]
        user: Option<String>,
    },
    /// Assign a category to a transaction and mark it reviewed.
    Review {
        /// Transaction ID (shown in `teller report summary --detail`)
        id: i64,
        /// Category name to assign
        #[arg(long)]
        category: String,
        #[arg(long)]
        user: Option<String>,
        /// Also create a rule matching this transaction's payee
        #[arg(long = "make-rule")]
        make_rule: bool,
    },
    /// Promote recurring reviewed payee/category pairs into rules.
    Train {
        #[arg(long)]
        user: Option<String>,
    },
    /// Manage classification rules.
    Rules {
        #[command(subcommand)]
        command: RulesCommands,
    },
    /// Generate reports.
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
    /// Export stored data.
    Export {
        #[command(subcommand)]
        command: ExportCommands,
    },
    /// Show current database and summary statistics.
    Status,
}

#[derive(Subcommand)]
pub enum RulesCommands {
    /// Add a classification rule.
    Add {
        /// Keyword matched against payee and description
        keyword: String,
        /// Category name to assign
        #[arg(long)]
        category: String,
        /// Minimum amount in dollars (e.g. 10.00)
        #[arg(long = "min")]
        amount_min: Option<String>,
        /// Maximum amount in dollars
        #[arg(long = "max")]
        amount_max: Option<String>,
        #[arg(long)]
        user: Option<String>,
    },
    /// List all classification rules.
    List {
        #[arg(long)]
        user: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Income/expense summary with category and section breakdowns.
    Summary {
        #[arg(long)]
        user: Option<String>,
        /// Also list individual transactions
        #[arg(long)]
        detail: bool,
    },
}

#[derive(Subcommand)]
pub enum ExportCommands {
    /// Export stored transactions to CSV.
    Transactions {
        #[arg(long)]
        user: Option<String>,
        /// Output file path (default: stdout)
        #[arg(long)]
        output: Option<String>,
    },
}
