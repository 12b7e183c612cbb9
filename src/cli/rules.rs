use comfy_table::{Cell, Table};

use crate::classifier::MANUAL_RULE_CONFIDENCE;
use crate::db;
use crate::error::{Result, TellerError};
use crate::keywords::{category_type, is_known_category};
use crate::models::Rule;
use crate::settings::load_settings;
use crate::text::parse_amount_cents;

fn parse_bound(raw: Option<&str>, flag: &str) -> Result<Option<i64>> {
    match raw {
        None => Ok(None),
        Some(s) => parse_amount_cents(s)
            .map(Some)
            .ok_or_else(|| TellerError::Other(format!("invalid --{flag} amount: {s}"))),
    }
}

pub fn add(
    keyword: &str,
    category: &str,
    amount_min: Option<&str>,
    amount_max: Option<&str>,
    user: Option<&str>,
) -> Result<()> {
    let settings = load_settings();
    let user = user.unwrap_or(&settings.default_user);
    let conn = db::get_connection(&settings.db_path())?;

    if !is_known_category(category) {
        return Err(TellerError::UnknownCategory(category.to_string()));
    }
    let target_type = category_type(category)
        .ok_or_else(|| TellerError::UnknownCategory(category.to_string()))?;

    let keyword = keyword.trim().to_lowercase();
    if keyword.is_empty() {
        return Err(TellerError::Other("rule keyword cannot be empty".to_string()));
    }

    let rule = Rule {
        id: None,
        user_id: user.to_string(),
        keywords: vec![keyword.clone()],
        payee_contains: Vec::new(),
        description_contains: Vec::new(),
        amount_min_cents: parse_bound(amount_min, "min")?,
        amount_max_cents: parse_bound(amount_max, "max")?,
        target_category: category.to_string(),
        target_type,
        confidence: MANUAL_RULE_CONFIDENCE,
        training_count: 0,
        success_rate: 1.0,
        is_system_generated: false,
    };
    let id = db::create_rule(&conn, &rule)?;
    println!("Added rule {id}: '{keyword}' \u{2192} {category}");
    Ok(())
}

pub fn list(user: Option<&str>) -> Result<()> {
    let settings = load_settings();
    let user = user.unwrap_or(&settings.default_user);
    let conn = db::get_connection(&settings.db_path())?;

    let rules = db::get_rules(&conn, user)?;
    let mut table = Table::new();
    table.set_header(vec![
        "ID", "Keywords", "Category", "Type", "Confidence", "Trained", "Source",
    ]);
    for rule in rules {
        let mut terms = rule.keywords.clone();
        terms.extend(rule.payee_contains.iter().cloned());
        terms.extend(rule.description_contains.iter().cloned());
        table.add_row(vec![
            Cell::new(rule.id.unwrap_or_default()),
            Cell::new(terms.join(", ")),
            Cell::new(&rule.target_category),
            Cell::new(rule.target_type.code()),
            Cell::new(format!("{:.2}", rule.confidence)),
            Cell::new(rule.training_count),
            Cell::new(if rule.is_system_generated { "trained" } else { "manual" }),
        ]);
    }
    println!("Rules\n{table}");
    Ok(())
}
