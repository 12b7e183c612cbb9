use std::io::Write;

use crate::db;
use crate::error::Result;
use crate::fmt::money;
use crate::settings::load_settings;

pub fn transactions(user: Option<&str>, output: Option<&str>) -> Result<()> {
    let settings = load_settings();
    let user = user.unwrap_or(&settings.default_user);
    let conn = db::get_connection(&settings.db_path())?;

    let transactions = db::get_transactions(&conn, user)?;

    let out: Box<dyn Write> = match output {
        Some(path) => Box::new(std::fs::File::create(path)?),
        None => Box::new(std::io::stdout()),
    };
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record([
        "id",
        "date",
        "description",
        "payee",
        "amount",
        "type",
        "category",
        "section",
        "confidence",
        "needs_review",
    ])?;
    let count = transactions.len();
    for txn in transactions {
        writer.write_record([
            txn.id.unwrap_or_default().to_string(),
            txn.date.format("%Y-%m-%d").to_string(),
            txn.description,
            txn.payee,
            money(txn.amount_cents),
            txn.txn_type.code().to_string(),
            txn.category.unwrap_or_default(),
            txn.section.code().to_string(),
            format!("{:.2}", txn.confidence),
            if txn.needs_review { "yes" } else { "no" }.to_string(),
        ])?;
    }
    writer.flush()?;

    if let Some(path) = output {
        println!("Exported {count} transactions to {path}");
    }
    Ok(())
}
