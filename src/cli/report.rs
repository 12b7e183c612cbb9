use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::db;
use crate::error::Result;
use crate::fmt::money;
use crate::settings::load_settings;
use crate::summary::{summarize, Summary};

pub fn print_summary(summary: &Summary) {
    let mut table = Table::new();
    table.set_header(vec!["Category", "Count", "Amount"]);
    for cat in &summary.categories {
        table.add_row(vec![
            Cell::new(&cat.category),
            Cell::new(cat.count),
            Cell::new(money(cat.total_cents)),
        ]);
    }
    println!("Categories\n{table}");

    let mut table = Table::new();
    table.set_header(vec!["Section", "Count", "Amount"]);
    for sec in &summary.sections {
        table.add_row(vec![
            Cell::new(&sec.label),
            Cell::new(sec.count),
            Cell::new(money(sec.total_cents)),
        ]);
    }
    println!("Sections\n{table}");

    println!(
        "Income: {}   Expenses: {}   Net: {}",
        money(summary.total_income_cents).green(),
        money(summary.total_expenses_cents).red(),
        if summary.net_income_cents >= 0 {
            money(summary.net_income_cents).green()
        } else {
            money(summary.net_income_cents).red()
        }
    );
}

pub fn summary(user: Option<&str>, detail: bool) -> Result<()> {
    let settings = load_settings();
    let user = user.unwrap_or(&settings.default_user);
    let conn = db::get_connection(&settings.db_path())?;

    let transactions = db::get_transactions(&conn, user)?;
    if transactions.is_empty() {
        println!("No transactions stored for user '{user}'.");
        return Ok(());
    }

    if detail {
        let mut table = Table::new();
        table.set_header(vec![
            "ID", "Date", "Payee", "Amount", "Type", "Category", "Conf", "Review",
        ]);
        for txn in &transactions {
            table.add_row(vec![
                Cell::new(txn.id.unwrap_or_default()),
                Cell::new(txn.date.format("%Y-%m-%d")),
                Cell::new(&txn.payee),
                Cell::new(money(txn.amount_cents)),
                Cell::new(txn.txn_type.code()),
                Cell::new(txn.category.as_deref().unwrap_or("-")),
                Cell::new(format!("{:.2}", txn.confidence)),
                Cell::new(if txn.needs_review { "!" } else { "" }),
            ]);
        }
        println!("Transactions\n{table}");
    }

    let summary = summarize(&transactions);
    print_summary(&summary);
    if summary.needs_review_count > 0 {
        println!(
            "{}",
            format!("{} transactions need review", summary.needs_review_count).yellow()
        );
    }
    Ok(())
}
