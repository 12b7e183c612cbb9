use crate::db;
use crate::error::Result;
use crate::settings::load_settings;
use crate::trainer::train;

pub fn run(user: Option<&str>) -> Result<()> {
    let settings = load_settings();
    let user = user.unwrap_or(&settings.default_user);
    let conn = db::get_connection(&settings.db_path())?;

    let transactions = db::get_transactions(&conn, user)?;
    let report = train(&conn, user, &transactions)?;

    println!(
        "{} rules created, {} strengthened ({} reviewed transactions, {} payees)",
        report.rules_created,
        report.rules_updated,
        report.transactions_processed,
        report.payees_analyzed
    );
    Ok(())
}
