use crate::classifier::MANUAL_RULE_CONFIDENCE;
use crate::db;
use crate::error::{Result, TellerError};
use crate::keywords::{category_type, is_known_category};
use crate::models::Rule;
use crate::settings::load_settings;

pub fn run(id: i64, category: &str, user: Option<&str>, make_rule: bool) -> Result<()> {
    let settings = load_settings();
    let user = user.unwrap_or(&settings.default_user);
    let conn = db::get_connection(&settings.db_path())?;

    if !is_known_category(category) {
        return Err(TellerError::UnknownCategory(category.to_string()));
    }

    let txn = db::get_transaction(&conn, user, id)?;
    db::mark_reviewed(&conn, user, id, category)?;
    println!("Transaction {id} \u{2192} {category}");

    if make_rule {
        let payee = txn.payee.trim().to_lowercase();
        if payee.is_empty() {
            return Err(TellerError::Other(
                "transaction has no payee to build a rule from".to_string(),
            ));
        }
        let rule = Rule {
            id: None,
            user_id: user.to_string(),
            keywords: vec![payee.clone()],
            payee_contains: Vec::new(),
            description_contains: Vec::new(),
            amount_min_cents: None,
            amount_max_cents: None,
            target_category: category.to_string(),
            target_type: category_type(category).unwrap_or(txn.txn_type),
            confidence: MANUAL_RULE_CONFIDENCE,
            training_count: 1,
            success_rate: 1.0,
            is_system_generated: false,
        };
        let rule_id = db::create_rule(&conn, &rule)?;
        println!("Added rule {rule_id}: '{payee}' \u{2192} {category}");
    }

    Ok(())
}
