use std::path::Path;

use colored::Colorize;
use sha2::{Digest, Sha256};

use crate::classifier::{self, apply};
use crate::db;
use crate::error::Result;
use crate::jobs::JobTracker;
use crate::keywords::KeywordTable;
use crate::parser::{parse_statement, ParseConfig};
use crate::settings::load_settings;
use crate::summary::summarize;
use crate::text::format_mm_dd;

fn compute_checksum(file_path: &Path) -> Result<String> {
    let data = std::fs::read(file_path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

pub fn run(file: &str, user: Option<&str>, json: bool, debug: bool) -> Result<()> {
    let settings = load_settings();
    let user = user.unwrap_or(&settings.default_user);
    let conn = db::get_connection(&settings.db_path())?;

    let path = Path::new(file);
    let checksum = compute_checksum(path)?;
    if db::statement_is_imported(&conn, user, &checksum)? {
        println!("This statement has already been imported (duplicate checksum).");
        return Ok(());
    }

    let mut tracker = JobTracker::new();
    let job = tracker.start(file);

    let text = std::fs::read_to_string(path)?;
    let config = ParseConfig {
        fallback_min_transactions: settings.fallback_min_transactions,
    };
    let mut parsed = match parse_statement(&text, &config) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracker.fail(job);
            return Err(e);
        }
    };
    tracker.update(job, 50);
    if let Some(period) = &parsed.account_info.period {
        parsed.debug.log.push(format!(
            "statement period: {} - {} ({})",
            format_mm_dd(period.start),
            format_mm_dd(period.end),
            period.end.format("%Y")
        ));
    }

    let table = KeywordTable::builtin();
    for txn in &mut parsed.transactions {
        let decision =
            classifier::classify_stored(&conn, user, txn, &table, settings.history_limit);
        apply(txn, &decision);
    }
    parsed.summary = summarize(&parsed.transactions);
    tracker.update(job, 90);

    let counts = db::insert_transactions(&conn, user, &parsed.transactions)?;
    db::record_statement(
        &conn,
        user,
        &path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_else(|| file.to_string()),
        &checksum,
        counts.inserted,
        parsed
            .account_info
            .period
            .as_ref()
            .map(|p| (&p.start, &p.end)),
    )?;
    tracker.complete(job);

    if json {
        println!("{}", serde_json::to_string_pretty(&parsed)?);
        return Ok(());
    }

    println!(
        "{} parsed, {} stored, {} skipped (duplicates)",
        parsed.transactions.len(),
        counts.inserted,
        counts.skipped
    );
    if parsed.summary.needs_review_count > 0 {
        println!(
            "{}",
            format!("{} transactions need review", parsed.summary.needs_review_count).yellow()
        );
    }
    super::report::print_summary(&parsed.summary);

    if debug {
        println!();
        println!("Extraction diagnostics");
        for diag in &parsed.debug.sections {
            println!(
                "  {:<24} {:<9} {} transactions",
                diag.section,
                if diag.found { "found" } else { "missing" },
                diag.count
            );
        }
        if parsed.debug.fallback_used {
            println!("  fallback scan added {} transactions", parsed.debug.fallback_added);
        }
        for line in &parsed.debug.log {
            println!("  {line}");
        }
    }

    Ok(())
}
