use crate::classifier;
use crate::db;
use crate::error::Result;
use crate::keywords::KeywordTable;
use crate::settings::load_settings;

pub fn run(user: Option<&str>) -> Result<()> {
    let settings = load_settings();
    let user = user.unwrap_or(&settings.default_user);
    let conn = db::get_connection(&settings.db_path())?;

    let pending = db::get_uncategorized(&conn, user)?;
    if pending.is_empty() {
        println!("No uncategorized transactions.");
        return Ok(());
    }

    let table = KeywordTable::builtin();
    let mut categorized = 0usize;
    let mut still_flagged = 0usize;
    for txn in &pending {
        let decision =
            classifier::classify_stored(&conn, user, txn, &table, settings.history_limit);
        let needs_review = decision.category.is_none() || txn.payee.is_empty();
        if decision.category.is_some() {
            categorized += 1;
        } else {
            still_flagged += 1;
        }
        if let Some(id) = txn.id {
            db::update_classification(
                &conn,
                user,
                id,
                decision.category.as_deref(),
                decision.confidence,
                needs_review,
            )?;
        }
    }

    println!("{categorized} categorized, {still_flagged} still flagged");
    Ok(())
}
